//! Gate service scenarios over in-memory collaborators

use sevgate_api::{GateService, StaticSource};
use sevgate_core::{BlockingMode, GateConfig, GateScope, Severity, Violation, ViolationMetrics};
use sevgate_session::{
    ActionKind, GateSessionStore, GateStatus, ManualClock, PreflightRequest, RequiredAction,
};
use sevgate_severity::testing::{InMemoryVcs, StaticClassifier};
use sevgate_severity::SeverityEvaluator;
use sevgate_trend::Trend;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Negative metrics force the fallback path, so the scanner hint decides the tier
fn hinted(rule: &str, path: &str, severity: Severity) -> Violation {
    Violation::new(rule, path, "finding")
        .with_severity_hint(severity)
        .with_metrics(ViolationMetrics {
            cyclomatic_complexity: -1.0,
            ..Default::default()
        })
}

fn config(history: &Path, mode: BlockingMode, scope: GateScope) -> GateConfig {
    GateConfig {
        mode,
        scope,
        history_dir: history.to_path_buf(),
        ..GateConfig::default()
    }
}

fn service(config: GateConfig, vcs: InMemoryVcs, violations: Vec<Violation>) -> GateService {
    let evaluator = SeverityEvaluator::new(Arc::new(vcs), Arc::new(StaticClassifier::new()));
    let clock = Arc::new(ManualClock::default());
    let session = GateSessionStore::new(config.gate_validity()).with_clock(clock);
    GateService::new(config, evaluator, Arc::new(StaticSource(violations)))
        .unwrap()
        .with_session(session)
}

// ============================================================================
// Gate check
// ============================================================================

#[test]
fn test_empty_scan_allows_and_opens_window() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(
        config(dir.path(), BlockingMode::Normal, GateScope::Repo),
        InMemoryVcs::new(),
        vec![],
    );

    let response = svc.gate_check().unwrap();
    assert_eq!(response.status, GateStatus::Allowed);
    assert_eq!(response.reason, "No violations found");
    assert_eq!(response.check_count, 1);
    assert_eq!(response.valid_for, 600_000);
    assert!(response.violations.is_empty());
    assert!(response.warnings.is_empty());
    assert!(svc.session().is_gate_valid());

    let history = std::fs::read_to_string(dir.path().join("severity-history.jsonl")).unwrap();
    assert_eq!(history.lines().count(), 1);
    assert!(dir.path().join("token-usage.jsonl").exists());
}

#[test]
fn test_staging_scope_ignores_unstaged_files() {
    let dir = tempfile::tempdir().unwrap();
    let violations = vec![
        hinted("backend.sql.raw", "/repo/src/legacy/old.ts", Severity::Critical),
        hinted("frontend.style", "/repo/src/cart/Cart.ts", Severity::Low),
    ];
    let vcs = || InMemoryVcs::new().with_staged(&["src/cart/Cart.ts"]);

    let staged = service(
        config(dir.path(), BlockingMode::Normal, GateScope::Staging),
        vcs(),
        violations.clone(),
    );
    let response = staged.gate_check().unwrap();
    assert_eq!(response.status, GateStatus::Allowed);
    assert_eq!(response.decision.violation_counts.total(), 1);
    assert_eq!(response.violations.len(), 1);
    assert_eq!(response.violations[0].severity, Severity::Low);

    let repo = service(
        config(dir.path(), BlockingMode::Normal, GateScope::Repo),
        vcs(),
        violations,
    );
    let response = repo.gate_check().unwrap();
    assert_eq!(response.status, GateStatus::Blocked);
    assert_eq!(response.valid_for, 0);
    assert_eq!(response.violations.len(), 1);
    assert_eq!(response.violations[0].rule_id, "backend.sql.raw");
    assert!(response.message.starts_with("COMMIT BLOCKED"));
}

#[test]
fn test_out_of_scope_paths_are_never_queried() {
    let dir = tempfile::tempdir().unwrap();
    let vcs = Arc::new(InMemoryVcs::new().with_staged(&["src/cart/Cart.ts"]));
    let evaluator = SeverityEvaluator::new(vcs.clone(), Arc::new(StaticClassifier::new()));
    let violations = vec![
        Violation::new("frontend.style", "/repo/src/cart/Cart.ts", "finding"),
        Violation::new("backend.sql.raw", "/repo/src/legacy/old.ts", "finding"),
        Violation::new("backend.sql.raw", "/repo/src/legacy/older.ts", "finding"),
    ];
    let svc = GateService::new(
        config(dir.path(), BlockingMode::Normal, GateScope::Staging),
        evaluator,
        Arc::new(StaticSource(violations)),
    )
    .unwrap();

    let response = svc.gate_check().unwrap();
    assert_eq!(response.decision.violation_counts.total(), 1);
    assert_eq!(vcs.queried_paths(), vec!["/repo/src/cart/Cart.ts".to_string()]);
}

#[test]
fn test_staging_falls_back_to_repo_without_git() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(
        config(dir.path(), BlockingMode::Strict, GateScope::Staging),
        InMemoryVcs::not_a_repository(),
        vec![hinted("ios.style", "App/View.swift", Severity::Low)],
    );
    let response = svc.gate_check().unwrap();
    assert_eq!(response.status, GateStatus::Blocked);
    assert!(response.reason.starts_with("Strict mode: 1 violation(s)"));
}

#[test]
fn test_violation_list_is_capped() {
    let dir = tempfile::tempdir().unwrap();
    let violations = (0..60)
        .map(|i| hinted(&format!("backend.rule_{}", i), "src/a.ts", Severity::High))
        .collect();
    let svc = service(
        config(dir.path(), BlockingMode::Normal, GateScope::Repo),
        InMemoryVcs::new(),
        violations,
    );
    let response = svc.gate_check().unwrap();
    assert_eq!(response.decision.violation_counts.high, 60);
    assert_eq!(response.violations.len(), 50);
    assert!(response.violations.iter().all(|v| !v.intelligent));
}

#[test]
fn test_persistence_failure_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("history");
    std::fs::write(&not_a_dir, "occupied").unwrap();

    let svc = service(
        config(&not_a_dir, BlockingMode::Normal, GateScope::Repo),
        InMemoryVcs::new(),
        vec![hinted("backend.sql.raw", "src/db.ts", Severity::Critical)],
    );
    let response = svc.gate_check().unwrap();
    assert_eq!(response.status, GateStatus::Blocked);
    assert!(response.warnings.iter().any(|w| w.starts_with("PERSIST/")));
}

// ============================================================================
// Pre-flight and trend
// ============================================================================

#[test]
fn test_blocked_gate_refuses_writes_until_clean() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(
        config(dir.path(), BlockingMode::Normal, GateScope::Repo),
        InMemoryVcs::new(),
        vec![hinted("backend.sql.raw", "src/db.ts", Severity::High)],
    );
    svc.gate_check().unwrap();

    let refused = svc.preflight(&PreflightRequest::new(ActionKind::Edit, "src/db.test.ts"));
    assert!(!refused.allowed);
    assert_eq!(refused.required_action, Some(RequiredAction::RunGateCheck));

    let text = svc.metrics().encode().unwrap();
    assert!(text.contains("sevgate_gate_checks_total{status=\"BLOCKED\"} 1"));
    assert!(text.contains("sevgate_preflight_total{outcome=\"refused_gate\"} 1"));
}

#[test]
fn test_test_first_flow_through_service() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(
        config(dir.path(), BlockingMode::Normal, GateScope::Repo),
        InMemoryVcs::new(),
        vec![],
    );
    svc.gate_check().unwrap();

    assert!(!svc.preflight(&PreflightRequest::new(ActionKind::Write, "foo")).allowed);
    let registration = svc.register_test("foo.spec");
    assert!(registration.registered);
    assert_eq!(registration.session_test_count, 1);
    assert!(svc.preflight(&PreflightRequest::new(ActionKind::Write, "foo")).allowed);

    assert_eq!(svc.reset_tdd(), 1);
    assert!(!svc.preflight(&PreflightRequest::new(ActionKind::Write, "foo")).allowed);
}

#[test]
fn test_trend_after_runs() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(
        config(dir.path(), BlockingMode::Normal, GateScope::Repo),
        InMemoryVcs::new(),
        vec![],
    );
    assert_eq!(svc.trend(10).unwrap().trend, Trend::InsufficientData);

    svc.run(vec![], None);
    let many = (0..10)
        .map(|i| hinted(&format!("frontend.r{}", i), "src/a.ts", Severity::Low))
        .collect();
    let run = svc.run(many, None);
    assert!(!run.decision.should_block);

    let report = svc.trend(10).unwrap();
    assert_eq!(report.trend, Trend::Worsening);
    assert_eq!(report.count_delta, 10);
    assert_eq!(report.latest.unwrap().branch.as_deref(), Some("main"));
}

#[test]
fn test_gate_window_expires() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::default());
    let cfg = config(dir.path(), BlockingMode::Normal, GateScope::Repo);
    let session = GateSessionStore::new(Duration::from_millis(cfg.gate_validity_ms))
        .with_clock(clock.clone());
    let evaluator =
        SeverityEvaluator::new(Arc::new(InMemoryVcs::new()), Arc::new(StaticClassifier::new()));
    let svc = GateService::new(cfg, evaluator, Arc::new(StaticSource::default()))
        .unwrap()
        .with_session(session);

    svc.gate_check().unwrap();
    clock.advance(chrono::Duration::minutes(9));
    assert!(svc.enforcement_status().is_allowed());
    clock.advance(chrono::Duration::minutes(2));
    assert!(!svc.enforcement_status().is_allowed());
}
