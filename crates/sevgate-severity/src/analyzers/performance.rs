//! Performance impact: UI blocking, memory, algorithmic cost, missed optimizations

use super::{ImpactAnalyzer, ImpactAssessment, RuleId, SubScore};
use once_cell::sync::Lazy;
use regex::Regex;
use sevgate_core::{DecisionContext, Violation};

pub struct PerformanceAnalyzer;

/// Keyword families matched at word starts, so "thread" is not a read
static BLOCKING_KINDS: Lazy<Vec<(Regex, u32)>> = Lazy::new(|| {
    [
        (r"(?i)\b(?:network|http|fetch|request)", 1000),
        (r"(?i)\b(?:database|query|sql)", 50),
        (r"(?i)\b(?:file|disk|read|write)", 30),
        (r"(?i)\b(?:computation|algorithm|compute|sort|loop)", 20),
    ]
    .into_iter()
    .filter_map(|(pattern, ms)| Regex::new(pattern).ok().map(|re| (re, ms)))
    .collect()
});

/// Rough duration in milliseconds of the blocking work a message describes
pub fn estimate_blocking_ms(message: &str) -> u32 {
    BLOCKING_KINDS
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, ms)| *ms)
        .unwrap_or(10)
}

fn ui_blocking(rule: &RuleId, violation: &Violation, ctx: &DecisionContext) -> u32 {
    let blocks_main = rule.has("ui_on_background")
        || rule.has("main_thread_block")
        || rule.has("blocking_main");
    if blocks_main && ctx.is_main_thread {
        return match estimate_blocking_ms(&violation.message) {
            ms if ms >= 1000 => 40,
            ms if ms >= 50 => 30,
            ms if ms >= 30 => 20,
            ms if ms >= 20 => 10,
            _ => 5,
        };
    }
    if (rule.mentions("sync") && rule.mentions("network")) || rule.has("synchronous_network") {
        return 35;
    }
    0
}

fn memory(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.has("context_leak") {
        25
    } else if rule.has("retain_cycle") || rule.has("memory_leak") {
        if ctx.call_frequency > 100 {
            30
        } else {
            20
        }
    } else if rule.has("cancellable") {
        25
    } else if rule.has("allocation") {
        if ctx.in_hot_path {
            15
        } else {
            0
        }
    } else {
        0
    }
}

fn algorithmic(rule: &RuleId, violation: &Violation, ctx: &DecisionContext) -> u32 {
    let loops = violation.metrics.nested_loops;
    if rule.has("n_plus_one") {
        20
    } else if loops >= 3.0 {
        18
    } else if loops >= 2.0 {
        10
    } else if rule.has("pagination") {
        if ctx.data_size > 1000.0 {
            15
        } else {
            0
        }
    } else {
        0
    }
}

fn optimization(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.mentions("memo") || rule.has("memoization") || rule.has("usememo") {
        if ctx.call_frequency > 100 {
            10
        } else {
            3
        }
    } else if rule.has("virtualization") {
        if ctx.list_size > 1000.0 {
            8
        } else {
            2
        }
    } else if rule.has("code_splitting") {
        4
    } else {
        0
    }
}

impl ImpactAnalyzer for PerformanceAnalyzer {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn assess(&self, violation: &Violation, context: &DecisionContext) -> ImpactAssessment {
        let rule = RuleId::new(&violation.rule_id);
        ImpactAssessment::new(vec![
            SubScore::new("uiBlocking", ui_blocking(&rule, violation, context), 40),
            SubScore::new("memory", memory(&rule, context), 30),
            SubScore::new("algorithmic", algorithmic(&rule, violation, context), 20),
            SubScore::new("optimization", optimization(&rule, context), 10),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sevgate_core::ViolationMetrics;

    fn main_thread() -> DecisionContext {
        DecisionContext {
            is_main_thread: true,
            ..Default::default()
        }
    }

    fn ui_score(message: &str) -> u32 {
        let v = Violation::new("ios.ui_on_background", "app/ui/Home.swift", message);
        PerformanceAnalyzer.assess(&v, &main_thread()).factor("uiBlocking").unwrap_or(0)
    }

    #[test]
    fn test_blocking_duration_estimates() {
        assert_eq!(estimate_blocking_ms("network request"), 1000);
        assert_eq!(estimate_blocking_ms("database query"), 50);
        assert_eq!(estimate_blocking_ms("file read"), 30);
        assert_eq!(estimate_blocking_ms("computation algorithm"), 20);
        assert_eq!(estimate_blocking_ms("unknown operation"), 10);
    }

    #[test]
    fn test_blocking_keywords_match_at_word_start() {
        assert_eq!(estimate_blocking_ms("Heavy computation on main thread"), 20);
        assert_eq!(estimate_blocking_ms("Work already spread over main thread"), 10);
        assert_eq!(estimate_blocking_ms("Reads config Files synchronously"), 30);
        assert_eq!(ui_score("Heavy computation on main thread"), 10);
    }

    #[test]
    fn test_ui_blocking_tiers() {
        assert_eq!(ui_score("network request"), 40);
        assert_eq!(ui_score("database query"), 30);
        assert_eq!(ui_score("file read"), 20);
        assert_eq!(ui_score("computation algorithm"), 10);
        assert_eq!(ui_score("unknown operation"), 5);
    }

    #[test]
    fn test_ui_blocking_requires_main_thread() {
        let v = Violation::new("ios.ui_on_background", "a.swift", "network request");
        assert_eq!(PerformanceAnalyzer.analyze(&v, &DecisionContext::default()), 0);
    }

    #[test]
    fn test_sync_network() {
        let v = Violation::new("sync.network.violation", "a.ts", "");
        assert_eq!(PerformanceAnalyzer.analyze(&v, &DecisionContext::default()), 35);
    }

    #[test]
    fn test_memory() {
        let busy = DecisionContext {
            call_frequency: 500,
            ..Default::default()
        };
        let v = |id: &str| Violation::new(id, "a.swift", "");
        assert_eq!(PerformanceAnalyzer.analyze(&v("ios.retain_cycle"), &busy), 30);
        assert_eq!(
            PerformanceAnalyzer.analyze(&v("ios.retain_cycle"), &DecisionContext::default()),
            20
        );
        assert_eq!(
            PerformanceAnalyzer.analyze(&v("ios.missing_cancellable"), &busy),
            25
        );
        assert_eq!(PerformanceAnalyzer.analyze(&v("android.context_leak"), &busy), 25);

        let hot = DecisionContext {
            in_hot_path: true,
            ..Default::default()
        };
        assert_eq!(PerformanceAnalyzer.analyze(&v("frontend.allocation"), &hot), 15);
        assert_eq!(
            PerformanceAnalyzer.analyze(&v("frontend.allocation"), &DecisionContext::default()),
            0
        );
    }

    #[test]
    fn test_algorithmic() {
        let ctx = DecisionContext::default();
        let n1 = Violation::new("backend.n_plus_one", "a.ts", "");
        assert_eq!(PerformanceAnalyzer.analyze(&n1, &ctx), 20);

        let nested = Violation::new("test.rule", "a.ts", "").with_metrics(ViolationMetrics {
            nested_loops: 3.0,
            ..Default::default()
        });
        assert_eq!(PerformanceAnalyzer.analyze(&nested, &ctx), 18);

        let big = DecisionContext {
            data_size: 5000.0,
            ..Default::default()
        };
        let page = Violation::new("backend.missing_pagination", "a.ts", "");
        assert_eq!(PerformanceAnalyzer.analyze(&page, &big), 15);
        assert_eq!(PerformanceAnalyzer.analyze(&page, &ctx), 0);
    }

    #[test]
    fn test_optimizations() {
        let busy = DecisionContext {
            call_frequency: 5000,
            list_size: 2000.0,
            ..Default::default()
        };
        let idle = DecisionContext::default();
        let memo = Violation::new("frontend.missing_memo", "a.tsx", "");
        let virt = Violation::new("frontend.virtualization", "a.tsx", "");
        let split = Violation::new("frontend.code_splitting", "a.tsx", "");
        assert_eq!(PerformanceAnalyzer.analyze(&memo, &busy), 10);
        assert_eq!(PerformanceAnalyzer.analyze(&memo, &idle), 3);
        assert_eq!(PerformanceAnalyzer.analyze(&virt, &busy), 8);
        assert_eq!(PerformanceAnalyzer.analyze(&virt, &idle), 2);
        assert_eq!(PerformanceAnalyzer.analyze(&split, &idle), 4);
    }
}
