//! Test-first bookkeeping
//!
//! A test file and its implementation are paired by stem and directory:
//! `Cart.test.ts`, `__tests__/Cart.test.ts`, `CartTests.swift` and
//! `cart_test.go` cover `Cart` in the same directory. A test directory next to
//! the file, a top-level `tests/` tree, or a mirrored tree such as
//! `src/test/java/...` for `src/main/java/...` also pair.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const TEST_DIRS: &[&str] = &["__tests__", "tests", "test", "spec"];
const TEST_INFIXES: &[&str] = &[".spec.", ".test."];
const TEST_SUFFIXES: &[&str] = &[
    ".spec",
    ".test",
    "Test.swift",
    "Tests.swift",
    "Test.kt",
    "Tests.kt",
    "Test.java",
];
const STEM_SUFFIXES: &[&str] = &["Tests", "Test", "Spec", "_test", "_spec"];

fn file_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(path)
}

fn directories(path: &str) -> impl Iterator<Item = &str> {
    let mut segments: Vec<&str> = path.split(|c: char| c == '/' || c == '\\').collect();
    segments.pop();
    segments.into_iter()
}

fn is_test_dir(segment: &str) -> bool {
    TEST_DIRS.iter().any(|dir| dir.eq_ignore_ascii_case(segment))
}

fn lowercase_dirs(path: &str) -> Vec<String> {
    directories(path)
        .filter(|d| !d.is_empty() && *d != ".")
        .map(str::to_lowercase)
        .collect()
}

/// Equal, or one a non-empty trailing part of the other (relative vs absolute)
fn same_directory(a: &[String], b: &[String]) -> bool {
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    a.ends_with(b) || b.ends_with(a)
}

/// Whether `test` is a test for `implementation`
pub fn covers(test: &str, implementation: &str) -> bool {
    let stem = implementation_stem(implementation);
    if stem.is_empty() || tested_stem(test) != stem {
        return false;
    }
    let test_dirs = lowercase_dirs(test);
    let impl_dirs = lowercase_dirs(implementation);
    match test_dirs.iter().rposition(|d| is_test_dir(d)) {
        None => same_directory(&test_dirs, &impl_dirs),
        Some(k) if k + 1 == test_dirs.len() => {
            let parent = &test_dirs[..k];
            parent.is_empty() || same_directory(parent, &impl_dirs)
        }
        Some(k) => impl_dirs.ends_with(&test_dirs[k + 1..]),
    }
}

fn name_before_extension(name: &str) -> &str {
    let name = name.trim_start_matches('.');
    name.split('.').next().unwrap_or(name)
}

/// Whether a path looks like a test file
pub fn is_test_path(path: &str) -> bool {
    let name = file_name(path);
    if name.is_empty() {
        return false;
    }
    if directories(path).any(|dir| TEST_DIRS.contains(&dir)) {
        return true;
    }
    if TEST_INFIXES.iter().any(|infix| name.contains(infix))
        || TEST_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    {
        return true;
    }
    let base = name_before_extension(name);
    base.ends_with("_test") || base.ends_with("_spec") || (name.ends_with(".py") && base.starts_with("test_"))
}

/// Stem an implementation file is known by
pub fn implementation_stem(path: &str) -> String {
    name_before_extension(file_name(path)).to_lowercase()
}

/// Stem of the implementation a test file covers
pub fn tested_stem(path: &str) -> String {
    let mut base = name_before_extension(file_name(path));
    if let Some(rest) = base.strip_prefix("test_") {
        base = rest;
    }
    for suffix in STEM_SUFFIXES {
        if let Some(rest) = base.strip_suffix(suffix) {
            if !rest.is_empty() {
                base = rest;
                break;
            }
        }
    }
    base.to_lowercase()
}

/// Where a test for `path` would conventionally live
pub fn candidate_test_paths(path: &str) -> Vec<String> {
    let name = file_name(path);
    let dir = &path[..path.len() - name.len()];
    let base = name_before_extension(name);
    let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");

    match ext {
        "swift" => vec![format!("{}{}Tests.swift", dir, base)],
        "kt" | "java" => vec![format!("{}{}Test.{}", dir, base, ext)],
        "go" => vec![format!("{}{}_test.go", dir, base)],
        "py" => vec![
            format!("{}test_{}.py", dir, base),
            format!("tests/test_{}.py", base),
        ],
        "" => vec![format!("{}{}.spec", dir, base), format!("{}{}.test", dir, base)],
        _ => vec![
            format!("{}{}.test.{}", dir, base, ext),
            format!("{}{}.spec.{}", dir, base, ext),
            format!("{}__tests__/{}.test.{}", dir, base, ext),
        ],
    }
}

/// Tests registered in the current session; grows until reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TddState {
    pub tests_created_this_session: BTreeSet<String>,
}

impl TddState {
    /// Returns false if the path was already registered
    pub fn register(&mut self, test_path: &str) -> bool {
        self.tests_created_this_session.insert(test_path.to_string())
    }

    pub fn has_test_for(&self, implementation: &str) -> bool {
        self.tests_created_this_session
            .iter()
            .any(|test| covers(test, implementation))
    }

    pub fn len(&self) -> usize {
        self.tests_created_this_session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests_created_this_session.is_empty()
    }

    pub fn reset(&mut self) -> usize {
        let cleared = self.len();
        self.tests_created_this_session.clear();
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_path_heuristics() {
        for path in [
            "src/__tests__/Cart.ts",
            "tests/api.rs",
            "src/cart/Cart.test.ts",
            "src/cart/Cart.spec.tsx",
            "foo.spec",
            "App/CartViewModelTests.swift",
            "app/src/CartRepositoryTest.kt",
            "pkg/cart/cart_test.go",
            "tools/test_cart.py",
        ] {
            assert!(is_test_path(path), "{} should be a test path", path);
        }
        for path in [
            "src/cart/Cart.ts",
            "foo",
            "src/latest/Contest.swift",
            "src/testing_utils.py",
            "",
        ] {
            assert!(!is_test_path(path), "{} should not be a test path", path);
        }
    }

    #[test]
    fn test_stems_pair_tests_with_implementations() {
        assert_eq!(tested_stem("foo.spec"), "foo");
        assert_eq!(implementation_stem("foo"), "foo");
        assert_eq!(tested_stem("src/__tests__/Cart.test.ts"), "cart");
        assert_eq!(implementation_stem("src/cart/Cart.ts"), "cart");
        assert_eq!(tested_stem("CartViewModelTests.swift"), "cartviewmodel");
        assert_eq!(tested_stem("cart_test.go"), "cart");
        assert_eq!(tested_stem("test_cart.py"), "cart");
    }

    #[test]
    fn test_pairing_respects_directories() {
        assert!(covers("src/cart/Cart.test.ts", "src/cart/Cart.ts"));
        assert!(covers("src/cart/__tests__/Cart.test.ts", "src/cart/Cart.ts"));
        assert!(covers("src/cart/Cart.test.ts", "/repo/src/cart/Cart.ts"));
        assert!(covers("tests/test_cart.py", "pkg/shop/cart.py"));
        assert!(covers(
            "src/test/java/com/shop/CartTest.java",
            "src/main/java/com/shop/Cart.java"
        ));
        assert!(covers("spec/models/user_spec.rb", "app/models/user.rb"));

        assert!(!covers("src/cart/index.test.ts", "src/orders/index.ts"));
        assert!(!covers("src/cart/__tests__/index.test.ts", "src/orders/index.ts"));
        assert!(!covers("index.test.ts", "src/orders/index.ts"));
        assert!(!covers("spec/models/user_spec.rb", "app/views/user.rb"));
        assert!(!covers("src/cart/Cart.test.ts", "src/cart/Checkout.ts"));
    }

    #[test]
    fn test_registered_test_unlocks_only_its_directory() {
        let mut state = TddState::default();
        state.register("src/cart/index.test.ts");
        assert!(state.has_test_for("src/cart/index.ts"));
        assert!(!state.has_test_for("src/orders/index.ts"));
        assert!(!state.has_test_for("index.ts"));
    }

    #[test]
    fn test_candidate_paths() {
        assert_eq!(
            candidate_test_paths("src/cart/Cart.ts"),
            vec![
                "src/cart/Cart.test.ts",
                "src/cart/Cart.spec.ts",
                "src/cart/__tests__/Cart.test.ts"
            ]
        );
        assert_eq!(
            candidate_test_paths("App/Cart.swift"),
            vec!["App/CartTests.swift"]
        );
        assert_eq!(candidate_test_paths("foo"), vec!["foo.spec", "foo.test"]);
        let implementations = ["pkg/cart/cart.go", "src/cart/Cart.ts", "pkg/cart.py", "App/Cart.swift"];
        for implementation in implementations {
            for candidate in candidate_test_paths(implementation) {
                assert!(is_test_path(&candidate), "{} should be a test path", candidate);
                assert!(
                    covers(&candidate, implementation),
                    "{} should cover {}",
                    candidate,
                    implementation
                );
            }
        }
    }

    #[test]
    fn test_tdd_state() {
        let mut state = TddState::default();
        assert!(!state.has_test_for("foo"));
        assert!(state.register("foo.spec"));
        assert!(!state.register("foo.spec"));
        assert!(state.has_test_for("foo"));
        assert!(!state.has_test_for("bar"));
        assert_eq!(state.reset(), 1);
        assert!(state.is_empty());
    }
}
