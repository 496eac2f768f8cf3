//! Prometheus counters for gate activity, served at `/metrics`
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct GateMetrics {
    registry: Registry,
    gate_checks: IntCounterVec,
    preflights: IntCounterVec,
    evaluations: IntCounterVec,
}

impl GateMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let gate_checks = IntCounterVec::new(
            Opts::new("sevgate_gate_checks_total", "Gate checks by resulting status"),
            &["status"],
        )?;
        let preflights = IntCounterVec::new(
            Opts::new("sevgate_preflight_total", "Pre-flight write checks by outcome"),
            &["outcome"],
        )?;
        let evaluations = IntCounterVec::new(
            Opts::new("sevgate_evaluations_total", "Severity evaluations by origin"),
            &["origin"],
        )?;
        registry.register(Box::new(gate_checks.clone()))?;
        registry.register(Box::new(preflights.clone()))?;
        registry.register(Box::new(evaluations.clone()))?;
        Ok(Self {
            registry,
            gate_checks,
            preflights,
            evaluations,
        })
    }

    pub fn gate_check(&self, status: &str) {
        self.gate_checks.with_label_values(&[status]).inc();
    }

    pub fn preflight(&self, outcome: &str) {
        self.preflights.with_label_values(&[outcome]).inc();
    }

    pub fn evaluations(&self, computed: usize, fallback: usize) {
        self.evaluations
            .with_label_values(&["computed"])
            .inc_by(computed as u64);
        self.evaluations
            .with_label_values(&["fallback"])
            .inc_by(fallback as u64);
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_exported() {
        let metrics = GateMetrics::new().unwrap();
        metrics.gate_check("ALLOWED");
        metrics.preflight("refused_tdd");
        metrics.evaluations(3, 1);
        let text = metrics.encode().unwrap();
        assert!(text.contains("sevgate_gate_checks_total{status=\"ALLOWED\"} 1"));
        assert!(text.contains("sevgate_preflight_total{outcome=\"refused_tdd\"} 1"));
        assert!(text.contains("sevgate_evaluations_total{origin=\"computed\"} 3"));
    }
}
