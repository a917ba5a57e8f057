//! Layered Architecture Model Conformance
//!
//! Architecture models are sets of elements spread over twelve ordered
//! layers. This crate checks a model against a versioned specification of
//! node types and relationship rules, and measures the quality of its
//! relationship structure.

pub mod analysis;
pub use analysis::{AuditOrchestrator, AuditReport, ThresholdPolicy};

pub mod domain;
pub use domain::{Config, Finding, ModelElement, SpecNodeId};

pub mod registry;
pub use registry::SpecRegistry;

pub mod storage;
pub use storage::{Directory, ModelSnapshot, ModelSource};

pub mod validation;
pub use validation::{ValidationReport, ValidationRunner, ValidationScope};
