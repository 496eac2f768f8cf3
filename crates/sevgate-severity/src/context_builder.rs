//! Decision context derivation
//!
//! Turns a violation's path, message and metrics, plus what version control
//! and the file content say, into a [`DecisionContext`]. Never fails: every
//! query that errors degrades to its neutral default.

use crate::classifier::{ContentClassifier, ContentSignals};
use crate::vcs::VersionControl;
use sevgate_core::{DecisionContext, Layer, Violation};
use std::sync::Arc;

/// Window used for commit-frequency queries
pub const ACTIVITY_WINDOW_DAYS: u32 = 30;

const MAIN_THREAD_MARKERS: &[&str] = &[
    "@MainActor",
    "DispatchQueue.main",
    "runOnUiThread",
    "withContext(Dispatchers.Main)",
    "UI thread",
    "main thread",
];
const MAIN_THREAD_DIRS: &[&str] = &["/presentation/", "/views/", "/ui/"];
const TEST_MARKERS: &[&str] = &[
    "/test/",
    "/__tests__/",
    ".test.",
    ".spec.",
    "/Tests/",
    "/androidTest/",
    "/testDebug/",
];
const USER_FACING_DIRS: &[&str] = &["/views/", "/ui/", "/components/", "/pages/", "/screens/"];
const CRITICAL_DIRS: &[&str] = &[
    "/payment/",
    "/checkout/",
    "/auth/",
    "/signup/",
    "/login/",
    "/order/",
    "/transaction/",
];
const HOT_PATH_DIRS: &[&str] = &["/render/", "/animation/", "/scroll/"];
const PAYMENT_DIRS: &[&str] = &["/payment/", "/checkout/", "/billing/", "/stripe/", "/paypal/"];
const USER_CONTENT_DIRS: &[&str] = &["/comments/", "/posts/", "/reviews/", "/messages/"];
const SHARED_KERNEL_DIRS: &[&str] = &["/shared/", "/common/", "/core/"];
const PUBLIC_API_DIRS: &[&str] = &["/api/", "/public/"];
// Message markers are case-sensitive
const SHARED_STATE_MARKERS: &[&str] = &["shared", "global"];
const MULTI_STEP_MARKERS: &[&str] = &["transaction", "multi-step", "atomic"];
const NIL_MARKERS: &[&str] = &["optional", "nullable", "?", "nil"];

fn any_of(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn detect_layer(path: &str) -> Layer {
    if path.contains("/domain/") || path.contains("/Domain/") {
        Layer::Domain
    } else if path.contains("/application/") || path.contains("/Application/") {
        Layer::Application
    } else if path.contains("/infrastructure/")
        || path.contains("/Infrastructure/")
        || path.contains("/data/")
    {
        Layer::Infrastructure
    } else if path.contains("/presentation/")
        || path.contains("/Presentation/")
        || path.contains("/ui/")
    {
        Layer::Presentation
    } else {
        Layer::Unknown
    }
}

pub fn is_test_code(path: &str) -> bool {
    any_of(path, TEST_MARKERS)
}

pub fn is_main_thread(message: &str, path: &str) -> bool {
    any_of(message, MAIN_THREAD_MARKERS) || any_of(path, MAIN_THREAD_DIRS)
}

pub fn is_critical_path(path: &str, message: &str) -> bool {
    let path = path.to_lowercase();
    let message = message.to_lowercase();
    any_of(&path, CRITICAL_DIRS) || message.contains("payment") || message.contains("auth")
}

pub fn handles_payments(path: &str) -> bool {
    any_of(&path.to_lowercase(), PAYMENT_DIRS)
}

/// Fixed frequency for well-known screens, if the path names one
pub fn known_call_frequency(path: &str) -> Option<u32> {
    if path.contains("/dashboard/") || path.contains("/home/") {
        Some(5000)
    } else if path.contains("/payment/") || path.contains("/checkout/") {
        Some(1000)
    } else if path.contains("/admin/") {
        Some(100)
    } else if path.contains("/settings/") {
        Some(50)
    } else {
        None
    }
}

/// Frequency estimate from recent commit activity
pub fn frequency_from_commits(commits: u32) -> u32 {
    if commits > 10 {
        2000
    } else if commits > 5 {
        500
    } else {
        100
    }
}

/// Builds a [`DecisionContext`] per violation
pub struct ContextBuilder {
    vcs: Arc<dyn VersionControl>,
    classifier: Arc<dyn ContentClassifier>,
}

impl ContextBuilder {
    pub fn new(vcs: Arc<dyn VersionControl>, classifier: Arc<dyn ContentClassifier>) -> Self {
        Self { vcs, classifier }
    }

    pub fn vcs(&self) -> &Arc<dyn VersionControl> {
        &self.vcs
    }

    /// Warm VCS answers for a batch of paths
    pub fn prefetch(&self, paths: &[String]) {
        self.vcs.prefetch(paths);
    }

    pub fn build(&self, violation: &Violation) -> DecisionContext {
        let path = violation.file_path.as_str();
        let message = violation.message.as_str();
        let content: ContentSignals = self.classifier.classify(path);

        let commits = self.commits(path);
        let layer = detect_layer(path);
        let test_code = is_test_code(path);

        DecisionContext {
            is_main_thread: is_main_thread(message, path),
            is_user_facing: any_of(path, USER_FACING_DIRS),
            in_hot_path: any_of(path, HOT_PATH_DIRS),

            is_production_code: !test_code,
            is_test_code: test_code,
            layer,

            is_critical_path: is_critical_path(path, message),
            handles_payments: handles_payments(path),
            handles_pii: content.mentions_pii,
            handles_credentials: content.mentions_credentials,
            user_generated_content: any_of(path, USER_CONTENT_DIRS),

            has_error_boundary: content.has_error_boundary,
            has_fallback: content.has_fallback,
            has_retry_logic: content.has_retry_logic,

            dependency_count: self.dependents(path),
            is_public_api: content.declares_public_api || any_of(path, PUBLIC_API_DIRS),
            is_shared_kernel: any_of(path, SHARED_KERNEL_DIRS),

            call_frequency: known_call_frequency(path)
                .unwrap_or_else(|| frequency_from_commits(commits)),
            modification_frequency: commits,
            last_modified: self.vcs.last_modified(path).unwrap_or_else(|e| {
                tracing::debug!(path, error = %e, "last-modified lookup failed");
                None
            }),

            is_shared_state: any_of(message, SHARED_STATE_MARKERS)
                || path.contains("/store/")
                || path.contains("/state/"),
            is_multi_step_operation: any_of(message, MULTI_STEP_MARKERS),
            value_can_be_nil: any_of(message, NIL_MARKERS),
            has_business_logic: matches!(layer, Layer::Domain | Layer::Application)
                || path.contains("/use-case/")
                || path.contains("/UseCase/"),
            data_size: violation.metrics.data_size,
            list_size: violation.metrics.list_size,
        }
    }

    fn commits(&self, path: &str) -> u32 {
        self.vcs
            .commit_count_since(path, ACTIVITY_WINDOW_DAYS)
            .unwrap_or_else(|e| {
                tracing::debug!(path, error = %e, "commit count lookup failed");
                0
            })
    }

    fn dependents(&self, path: &str) -> u32 {
        self.vcs.dependents_count(path).unwrap_or_else(|e| {
            tracing::debug!(path, error = %e, "fan-in lookup failed");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryVcs, StaticClassifier};

    fn builder(vcs: InMemoryVcs, classifier: StaticClassifier) -> ContextBuilder {
        ContextBuilder::new(Arc::new(vcs), Arc::new(classifier))
    }

    #[test]
    fn test_layer_detection() {
        assert_eq!(detect_layer("src/domain/Order.ts"), Layer::Domain);
        assert_eq!(detect_layer("Sources/Domain/Order.swift"), Layer::Domain);
        assert_eq!(detect_layer("src/application/PlaceOrder.ts"), Layer::Application);
        assert_eq!(detect_layer("src/data/OrderRepo.kt"), Layer::Infrastructure);
        assert_eq!(detect_layer("src/ui/Button.tsx"), Layer::Presentation);
        assert_eq!(detect_layer("/src/infra/config.go"), Layer::Unknown);
    }

    #[test]
    fn test_call_frequency_heuristics() {
        assert_eq!(known_call_frequency("app/dashboard/Widget.tsx"), Some(5000));
        assert_eq!(known_call_frequency("app/checkout/Cart.tsx"), Some(1000));
        assert_eq!(known_call_frequency("app/admin/Users.tsx"), Some(100));
        assert_eq!(known_call_frequency("app/settings/Prefs.tsx"), Some(50));
        assert_eq!(known_call_frequency("app/misc/Thing.tsx"), None);

        assert_eq!(frequency_from_commits(11), 2000);
        assert_eq!(frequency_from_commits(6), 500);
        assert_eq!(frequency_from_commits(5), 100);
    }

    #[test]
    fn test_critical_path_from_path_or_message() {
        assert!(is_critical_path("src/Payment/Charge.ts", "x"));
        assert!(is_critical_path("src/util.ts", "Auth token leaked"));
        assert!(!is_critical_path("src/util.ts", "unused import"));
    }

    #[test]
    fn test_payment_paths_ignore_case() {
        assert!(handles_payments("src/Payment/Charge.ts"));
        assert!(handles_payments("app/Billing/Invoice.swift"));
        assert!(!handles_payments("src/payments-docs/readme.md"));

        let v = Violation::new("backend.sql.raw", "src/Payment/Charge.ts", "x");
        let ctx = builder(InMemoryVcs::new(), StaticClassifier::new()).build(&v);
        assert!(ctx.handles_payments);
        assert!(ctx.is_critical_path);
    }

    #[test]
    fn test_message_markers_are_case_sensitive() {
        let build = |message: &str| {
            let v = Violation::new("x.y", "src/util.ts", message);
            builder(InMemoryVcs::new(), StaticClassifier::new()).build(&v)
        };
        assert!(!build("Global counter mutated").is_shared_state);
        assert!(build("global counter mutated").is_shared_state);
        assert!(!build("Transaction spans two writes").is_multi_step_operation);
        assert!(build("non-atomic update").is_multi_step_operation);
        assert!(!build("Optional Binding").value_can_be_nil);
        assert!(build("value may be nil").value_can_be_nil);
    }

    #[test]
    fn test_main_thread_detection() {
        assert!(is_main_thread("call on @MainActor", "src/a.swift"));
        assert!(is_main_thread("", "app/views/Home.swift"));
        assert!(!is_main_thread("background work", "app/services/Sync.swift"));
    }

    #[test]
    fn test_build_uses_vcs_and_content() {
        let vcs = InMemoryVcs::new()
            .with_commit_count("src/domain/Order.ts", 12)
            .with_dependents("src/domain/Order.ts", 15);
        let classifier = StaticClassifier::new().with(
            "src/domain/Order.ts",
            ContentSignals {
                has_error_boundary: true,
                has_fallback: true,
                mentions_pii: true,
                ..Default::default()
            },
        );
        let v = Violation::new(
            "backend.solid.srp.god_object",
            "src/domain/Order.ts",
            "shared optional state",
        );
        let ctx = builder(vcs, classifier).build(&v);

        assert_eq!(ctx.layer, Layer::Domain);
        assert!(ctx.has_business_logic);
        assert_eq!(ctx.call_frequency, 2000);
        assert_eq!(ctx.modification_frequency, 12);
        assert_eq!(ctx.dependency_count, 15);
        assert!(ctx.has_error_boundary && ctx.has_fallback);
        assert!(ctx.handles_pii);
        assert!(ctx.is_shared_state);
        assert!(ctx.value_can_be_nil);
        assert!(ctx.is_production_code);
    }

    #[test]
    fn test_build_degrades_without_repository() {
        let v = Violation::new("ios.force_unwrap", "/src/infra/config.go", "boom");
        let ctx = builder(InMemoryVcs::not_a_repository(), StaticClassifier::new()).build(&v);
        assert_eq!(ctx.dependency_count, 0);
        assert_eq!(ctx.modification_frequency, 0);
        assert_eq!(ctx.call_frequency, 100);
        assert!(ctx.last_modified.is_none());
        assert!(!ctx.has_error_boundary);
    }

    #[test]
    fn test_test_paths_are_not_production() {
        let v = Violation::new("x.y", "src/__tests__/order.test.ts", "");
        let ctx = builder(InMemoryVcs::new(), StaticClassifier::new()).build(&v);
        assert!(ctx.is_test_code);
        assert!(!ctx.is_production_code);
    }
}
