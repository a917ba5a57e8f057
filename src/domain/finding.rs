use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a finding is.
///
/// Only errors affect the outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A conformance violation.
    Error,
    /// Reported for visibility; never fails a run.
    Warning,
}

/// The validation pass that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validator {
    /// Structural checks: node type, required attributes, attribute
    /// constraints.
    Schema,
    /// Identifier naming convention.
    Naming,
    /// Broken or mis-directed references.
    Reference,
    /// Duplicate ids and relationship predicates.
    Semantic,
}

impl Validator {
    /// All validators in pipeline order.
    pub const ALL: [Self; 4] = [Self::Schema, Self::Naming, Self::Reference, Self::Semantic];

    /// The lowercase name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Naming => "naming",
            Self::Reference => "reference",
            Self::Semantic => "semantic",
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

/// One reported validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Error or warning.
    pub severity: Severity,
    /// The pass that produced this finding.
    pub validator: Validator,
    /// The element the finding is attributed to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl Finding {
    /// An error attributed to an element.
    pub fn error(validator: Validator, element_id: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            validator,
            element_id: Some(element_id.to_string()).filter(|id| !id.is_empty()),
            message: message.into(),
        }
    }

    /// A warning attributed to an element.
    pub fn warning(validator: Validator, element_id: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(validator, element_id, message)
        }
    }

    /// Whether this finding is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element_id {
            Some(id) => write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.validator, id, self.message
            ),
            None => write!(f, "{} [{}] {}", self.severity, self.validator, self.message),
        }
    }
}
