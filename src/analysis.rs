//! Relationship quality analysis.
//!
//! An audit builds a [`RelationshipCatalog`] and a [`RelationshipGraph`] from
//! one model snapshot, runs four analyzers over them and the connectivity
//! pass over the graph, and assembles the results into an [`AuditReport`]:
//!
//! - [`CoverageAnalyzer`]: per-layer isolation, density and predicate use
//! - [`DuplicateDetector`]: element pairs linked redundantly
//! - [`GapAnalyzer`]: specified relationships the model never instantiates
//! - [`BalanceAssessor`]: node types far more or less connected than their
//!   layer
//! - [`ConnectivityAnalyzer`]: components, degrees and transitive chains
//!
//! The analyzers share no mutable state and may run in any order.

mod audit;
mod balance;
mod catalog;
mod coverage;
mod duplicates;
mod gaps;
pub mod graph;
mod threshold;

pub use audit::{AuditError, AuditOrchestrator, AuditReport, ModelInfo};
pub use balance::{BalanceAssessor, Classification, NodeTypeBalance};
pub use catalog::{RelationshipCatalog, RelationshipInstance};
pub use coverage::{CoverageAnalyzer, LayerCoverage};
pub use duplicates::{DuplicateCandidate, DuplicateDetector, DuplicateReason};
pub use gaps::{Gap, GapAnalyzer, GapPriority};
pub use graph::{
    ConnectivityAnalyzer, ConnectivityReport, ConnectivityStats, RelationshipGraph,
    TransitiveChain,
};
pub use threshold::{Metric, ThresholdBreach, ThresholdPolicy};
