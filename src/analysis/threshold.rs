use std::fmt;

use serde::Serialize;

use crate::{
    analysis::{AuditReport, GapPriority},
    domain::Thresholds,
};

/// A quality metric checked by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// A layer's isolation percentage.
    IsolationPercentage,
    /// A layer's relationships per node type.
    Density,
    /// Number of high-priority gaps.
    HighPriorityGaps,
    /// Number of duplicate candidates.
    DuplicateCandidates,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IsolationPercentage => "isolation-percentage",
            Self::Density => "density",
            Self::HighPriorityGaps => "high-priority-gaps",
            Self::DuplicateCandidates => "duplicate-candidates",
        })
    }
}

/// A metric outside its limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdBreach {
    /// The metric.
    pub metric: Metric,
    /// The layer id, or `model` for whole-model metrics.
    pub subject: String,
    /// The measured value.
    pub actual: f64,
    /// The configured limit.
    pub limit: f64,
}

impl fmt::Display for ThresholdBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = match self.metric {
            Metric::Density => "below minimum",
            _ => "above maximum",
        };
        write!(
            f,
            "{} {}: {:.2} is {relation} {:.2}",
            self.subject, self.metric, self.actual, self.limit
        )
    }
}

/// Turns audit metrics into pass/fail for CI.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    thresholds: Thresholds,
}

impl ThresholdPolicy {
    /// Creates a policy enforcing `thresholds`.
    #[must_use]
    pub const fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Every breach in `report`; empty when the report passes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(&self, report: &AuditReport) -> Vec<ThresholdBreach> {
        let limits = &self.thresholds;
        let mut breaches = Vec::new();

        for layer in &report.coverage {
            if layer.isolation_percentage > limits.max_isolation_percentage {
                breaches.push(ThresholdBreach {
                    metric: Metric::IsolationPercentage,
                    subject: layer.layer.clone(),
                    actual: layer.isolation_percentage,
                    limit: limits.max_isolation_percentage,
                });
            }
            if layer.relationships_per_node_type < limits.min_density {
                breaches.push(ThresholdBreach {
                    metric: Metric::Density,
                    subject: layer.layer.clone(),
                    actual: layer.relationships_per_node_type,
                    limit: limits.min_density,
                });
            }
        }

        let high_gaps = report.gap_count(GapPriority::High);
        if high_gaps > limits.max_high_priority_gaps {
            breaches.push(ThresholdBreach {
                metric: Metric::HighPriorityGaps,
                subject: "model".to_string(),
                actual: high_gaps as f64,
                limit: limits.max_high_priority_gaps as f64,
            });
        }

        if report.duplicates.len() > limits.max_duplicate_candidates {
            breaches.push(ThresholdBreach {
                metric: Metric::DuplicateCandidates,
                subject: "model".to_string(),
                actual: report.duplicates.len() as f64,
                limit: limits.max_duplicate_candidates as f64,
            });
        }

        breaches
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::analysis::{
        ConnectivityReport, ConnectivityStats, DuplicateCandidate, DuplicateReason, Gap,
        LayerCoverage, ModelInfo,
    };

    fn report(coverage: Vec<LayerCoverage>, high_gaps: usize, duplicates: usize) -> AuditReport {
        let gap = Gap {
            source_type: "business.service".parse().unwrap(),
            destination_type: "motivation.goal".parse().unwrap(),
            predicate: "supports".to_string(),
            priority: GapPriority::High,
        };
        let duplicate = DuplicateCandidate {
            source: "a".to_string(),
            destination: "b".to_string(),
            predicates: vec!["uses".to_string()],
            reason: DuplicateReason::IdenticalTriple,
        };

        AuditReport {
            timestamp: String::new(),
            model: ModelInfo {
                name: "m".to_string(),
                version: "1".to_string(),
            },
            layer: None,
            coverage,
            duplicates: vec![duplicate; duplicates],
            gaps: vec![gap; high_gaps],
            balance: Vec::new(),
            connectivity: ConnectivityReport {
                components: Vec::new(),
                degrees: BTreeMap::new(),
                transitive_chains: Vec::new(),
                stats: ConnectivityStats {
                    node_count: 0,
                    edge_count: 0,
                    connected_components: 0,
                    largest_component_size: 0,
                    isolated_nodes: 0,
                    average_degree: 0.0,
                    transitive_chain_count: 0,
                },
            },
        }
    }

    fn coverage(layer: &str, isolation: f64, density: f64) -> LayerCoverage {
        LayerCoverage {
            layer: layer.to_string(),
            isolation_percentage: isolation,
            relationships_per_node_type: density,
            predicate_utilization: 1.0,
        }
    }

    #[test]
    fn healthy_report_passes() {
        let policy = ThresholdPolicy::new(Thresholds::default());
        let report = report(vec![coverage("business", 20.0, 1.5)], 10, 5);
        assert!(policy.evaluate(&report).is_empty());
    }

    #[test]
    fn each_breach_is_reported() {
        let policy = ThresholdPolicy::new(Thresholds::default());
        let report = report(
            vec![coverage("business", 25.0, 1.0), coverage("api", 0.0, 3.0)],
            11,
            6,
        );
        let metrics: Vec<_> = policy.evaluate(&report).iter().map(|b| b.metric).collect();
        assert_eq!(
            metrics,
            [
                Metric::IsolationPercentage,
                Metric::Density,
                Metric::HighPriorityGaps,
                Metric::DuplicateCandidates
            ]
        );
    }

    #[test]
    fn breach_display_names_subject_and_limit() {
        let breach = ThresholdBreach {
            metric: Metric::Density,
            subject: "business".to_string(),
            actual: 1.0,
            limit: 1.5,
        };
        assert_eq!(
            breach.to_string(),
            "business density: 1.00 is below minimum 1.50"
        );
    }
}
