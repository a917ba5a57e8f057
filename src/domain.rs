//! Domain models for architecture models.
//!
//! This module contains the core value types: node type identifiers, model
//! elements, validation findings and run configuration.

mod config;
pub use config::{Config, ConfigError, Thresholds};

/// Model element instances and their references and relationships.
pub mod element;
pub use element::{ModelElement, Reference, Relationship};

/// Validation findings.
pub mod finding;
pub use finding::{Finding, Severity, Validator};

/// Node type identifiers (`{layer}.{type}`) and parsing.
pub mod spec_node_id;
pub use spec_node_id::{Error as SpecNodeIdError, SpecNodeId, is_kebab_case};
