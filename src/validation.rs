//! Model validation.
//!
//! Four independent passes check a [`ModelSnapshot`] against a
//! [`SpecRegistry`]:
//!
//! - **schema**: node types exist, required attributes are present and
//!   attribute values satisfy their constraints
//! - **naming**: element ids follow `{layer}-{type}-{kebab-name}`
//! - **reference**: reference targets exist and never point up the layer
//!   stack
//! - **semantic**: ids are globally unique and relationships use predicates
//!   the registry permits
//!
//! Every pass runs over the whole scope; nothing short-circuits, so a single
//! run reports every problem at once.

mod naming;
mod reference;
mod schema;
mod semantic;

use std::{collections::BTreeSet, fmt};

use serde::Serialize;
use tracing::instrument;

use crate::{
    domain::{Finding, ModelElement, Severity, Validator},
    registry::SpecRegistry,
    storage::ModelSnapshot,
};

/// A validation pass: a pure function from model and registry to findings.
type Pass = fn(&ModelSnapshot, &SpecRegistry, &ValidationScope) -> Vec<Finding>;

const PASSES: [(Validator, Pass); 4] = [
    (Validator::Schema, schema::validate),
    (Validator::Naming, naming::validate),
    (Validator::Reference, reference::validate),
    (Validator::Semantic, semantic::validate),
];

/// Which elements a validation run checks.
///
/// The scope only selects the elements whose findings are reported. Lookups
/// such as "does this reference target exist" always consult the whole
/// model, so references across the scope boundary are not broken.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationScope {
    /// Every element.
    #[default]
    All,
    /// Only elements declared in these layers.
    Layers(BTreeSet<String>),
}

/// A `--layers` entry that names no layer in the registry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown layer '{0}'")]
pub struct UnknownLayerError(pub String);

impl ValidationScope {
    /// Restricts validation to the given layer ids.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first layer the registry does not define.
    pub fn layers<I, S>(registry: &SpecRegistry, layers: I) -> Result<Self, UnknownLayerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let layers = layers
            .into_iter()
            .map(Into::into)
            .map(|layer: String| {
                if registry.layer(&layer).is_some() {
                    Ok(layer)
                } else {
                    Err(UnknownLayerError(layer))
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self::Layers(layers))
    }

    /// Whether an element is checked under this scope.
    #[must_use]
    pub fn includes(&self, element: &ModelElement) -> bool {
        match self {
            Self::All => true,
            Self::Layers(layers) => layers.contains(&element.layer),
        }
    }

    /// The in-scope elements of a snapshot, in scan order.
    pub fn elements<'a>(
        &'a self,
        snapshot: &'a ModelSnapshot,
    ) -> impl Iterator<Item = &'a ModelElement> + 'a {
        snapshot
            .elements()
            .iter()
            .filter(move |element| self.includes(element))
    }
}

impl fmt::Display for ValidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all layers"),
            Self::Layers(layers) => {
                let layers: Vec<&str> = layers.iter().map(String::as_str).collect();
                f.write_str(&layers.join(","))
            }
        }
    }
}

/// The outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Findings ordered by pass, then by scan order.
    pub findings: Vec<Finding>,
    /// Number of error findings.
    pub error_count: usize,
    /// Number of warning findings.
    pub warning_count: usize,
}

impl ValidationReport {
    fn new(findings: Vec<Finding>) -> Self {
        let error_count = findings.iter().filter(|f| f.is_error()).count();
        Self {
            warning_count: findings.len() - error_count,
            error_count,
            findings,
        }
    }

    /// Whether the model passed: no errors, regardless of warnings.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.error_count == 0
    }

    /// Findings with the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }
}

/// Runs every validation pass over a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRunner<'r> {
    registry: &'r SpecRegistry,
}

impl<'r> ValidationRunner<'r> {
    /// Creates a runner checking against `registry`.
    #[must_use]
    pub const fn new(registry: &'r SpecRegistry) -> Self {
        Self { registry }
    }

    /// Validates the in-scope elements of `snapshot`.
    #[instrument(skip_all, fields(scope = %scope, elements = snapshot.len()))]
    pub fn run(&self, snapshot: &ModelSnapshot, scope: &ValidationScope) -> ValidationReport {
        let mut findings = Vec::new();
        for (validator, pass) in PASSES {
            let produced = pass(snapshot, self.registry, scope);
            tracing::debug!(%validator, findings = produced.len(), "Validation pass complete");
            findings.extend(produced);
        }

        let report = ValidationReport::new(findings);
        tracing::info!(
            errors = report.error_count,
            warnings = report.warning_count,
            "Validation complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ModelMetadata;

    pub(super) fn snapshot(elements: Vec<ModelElement>) -> ModelSnapshot {
        ModelSnapshot::new(ModelMetadata::default(), elements)
    }

    fn service(id: &str) -> ModelElement {
        ModelElement::new(id, "business", "service", "Service")
    }

    #[test]
    fn clean_model_is_valid() {
        let registry = SpecRegistry::builtin().unwrap();
        let model = snapshot(vec![
            service("business-service-orders"),
            service("business-service-billing").with_relationship("uses", "business-service-orders"),
        ]);

        let report = ValidationRunner::new(&registry).run(&model, &ValidationScope::All);
        assert!(report.is_valid(), "{:#?}", report.findings);
    }

    #[test]
    fn reports_all_categories_in_one_run() {
        let registry = SpecRegistry::builtin().unwrap();
        let model = snapshot(vec![
            ModelElement::new("business-service-a", "business", "service", ""),
            service("Business_Service_B"),
            service("business-service-c").with_reference("business-service-gone", "uses"),
            service("business-service-a"),
        ]);

        let report = ValidationRunner::new(&registry).run(&model, &ValidationScope::All);
        let validators: BTreeSet<_> = report.findings.iter().map(|f| f.validator).collect();
        assert_eq!(validators.len(), 4);
        assert!(!report.is_valid());
    }

    #[test]
    fn findings_are_ordered_by_pass() {
        let registry = SpecRegistry::builtin().unwrap();
        let model = snapshot(vec![
            service("business-service-a").with_reference("business-service-gone", "uses"),
            ModelElement::new("BAD", "business", "service", ""),
        ]);

        let report = ValidationRunner::new(&registry).run(&model, &ValidationScope::All);
        assert!(report.findings.len() > 2);
        assert!(
            report
                .findings
                .windows(2)
                .all(|pair| pair[0].validator <= pair[1].validator)
        );
    }

    #[test]
    fn validation_is_deterministic() {
        let registry = SpecRegistry::builtin().unwrap();
        let model = snapshot(vec![
            service("business-service-a").with_relationship("flies-to", "business-service-b"),
            service("business-service-a"),
            service("bad id"),
        ]);
        let runner = ValidationRunner::new(&registry);

        let first = serde_json::to_string(&runner.run(&model, &ValidationScope::All)).unwrap();
        let second = serde_json::to_string(&runner.run(&model, &ValidationScope::All)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn scope_limits_checked_elements_but_not_lookups() {
        let registry = SpecRegistry::builtin().unwrap();
        let model = snapshot(vec![
            service("business-service-a"),
            ModelElement::new("application-component-x", "application", "component", "X")
                .with_property("version", "1.0.0")
                .with_reference("business-service-a", "realizes"),
            service("Bad_Business_Id"),
        ]);

        let scope = ValidationScope::layers(&registry, ["application"]).unwrap();
        let report = ValidationRunner::new(&registry).run(&model, &scope);
        assert!(report.is_valid(), "{:#?}", report.findings);
    }

    #[test]
    fn unknown_scope_layer_is_rejected() {
        let registry = SpecRegistry::builtin().unwrap();
        let err = ValidationScope::layers(&registry, ["business", "marketing"]).unwrap_err();
        assert_eq!(err, UnknownLayerError("marketing".to_string()));
    }

    #[test]
    fn warnings_do_not_fail_validation() {
        let report = ValidationReport::new(vec![Finding::warning(
            Validator::Semantic,
            "business-service-a",
            "advisory",
        )]);
        assert!(report.is_valid());
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.with_severity(Severity::Warning).count(), 1);
    }
}
