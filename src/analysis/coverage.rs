use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::{
    analysis::RelationshipCatalog,
    domain::SpecNodeId,
    registry::{LayerSpec, SpecRegistry},
};

/// How well a layer's node types are connected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerCoverage {
    /// Layer id.
    pub layer: String,
    /// Share of the layer's node types with no relationship instances in
    /// either direction, as a percentage.
    pub isolation_percentage: f64,
    /// Relationship instances declared by the layer's elements per node type.
    pub relationships_per_node_type: f64,
    /// Share of the predicates registered for the layer that are in use.
    pub predicate_utilization: f64,
}

/// Computes per-layer coverage metrics.
#[derive(Debug)]
pub struct CoverageAnalyzer<'c, 'a> {
    registry: &'c SpecRegistry,
    catalog: &'c RelationshipCatalog<'a>,
    /// Node types with at least one incoming or outgoing instance.
    touched: HashSet<&'c SpecNodeId>,
}

impl<'c, 'a> CoverageAnalyzer<'c, 'a> {
    /// Prepares the analyzer.
    #[must_use]
    pub fn new(registry: &'c SpecRegistry, catalog: &'c RelationshipCatalog<'a>) -> Self {
        let touched = catalog
            .all()
            .flat_map(|instance| [&instance.source_type, &instance.destination_type])
            .flatten()
            .collect();

        Self {
            registry,
            catalog,
            touched,
        }
    }

    /// Coverage of every layer, in layer order.
    #[must_use]
    pub fn analyze(&self) -> Vec<LayerCoverage> {
        self.registry
            .layers()
            .iter()
            .map(|layer| self.analyze_layer(layer))
            .collect()
    }

    /// Coverage of one layer.
    ///
    /// A layer without node types reports zero for every metric.
    #[must_use]
    pub fn analyze_layer(&self, layer: &LayerSpec) -> LayerCoverage {
        let node_types = layer.node_type_ids.len();
        let isolated = layer
            .node_type_ids
            .iter()
            .filter(|id| !self.touched.contains(id))
            .count();

        let mut instances = 0usize;
        let mut used = BTreeSet::new();
        for instance in self.catalog.all().filter(|i| i.source_layer == layer.id) {
            instances += 1;
            used.insert(instance.predicate);
        }

        let registered = self.registry.predicates_for_layer(&layer.id);
        let utilized = used.iter().filter(|p| registered.contains(*p)).count();

        LayerCoverage {
            layer: layer.id.clone(),
            isolation_percentage: ratio(isolated, node_types) * 100.0,
            relationships_per_node_type: ratio(instances, node_types),
            predicate_utilization: ratio(utilized, registered.len()),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        domain::ModelElement,
        registry::tests::fake_registry,
        storage::{ModelMetadata, ModelSnapshot},
    };

    fn snapshot(elements: Vec<ModelElement>) -> ModelSnapshot {
        ModelSnapshot::new(ModelMetadata::default(), elements)
    }

    #[test]
    fn computes_layer_metrics() {
        let registry = fake_registry();
        let model = snapshot(vec![
            ModelElement::new("business-service-a", "business", "service", "A")
                .with_relationship("supports", "motivation-goal-g")
                .with_relationship("uses", "business-service-b"),
            ModelElement::new("business-service-b", "business", "service", "B")
                .with_relationship("uses", "business-service-a"),
            ModelElement::new("motivation-goal-g", "motivation", "goal", "G"),
        ]);
        let catalog = RelationshipCatalog::build(&model);
        let analyzer = CoverageAnalyzer::new(&registry, &catalog);

        let business = analyzer.analyze_layer(registry.layer("business").unwrap());
        // process is isolated, service is not
        assert!((business.isolation_percentage - 50.0).abs() < 1e-9);
        assert!((business.relationships_per_node_type - 1.5).abs() < 1e-9);
        // supports and uses out of supports, realizes, uses, depends-on
        assert!((business.predicate_utilization - 0.5).abs() < 1e-9);

        let motivation = analyzer.analyze_layer(registry.layer("motivation").unwrap());
        assert!(motivation.isolation_percentage.abs() < f64::EPSILON);
        assert!(motivation.relationships_per_node_type.abs() < f64::EPSILON);
        assert!(motivation.predicate_utilization.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_layer_reports_zero_not_nan() {
        let registry = fake_registry();
        let model = snapshot(Vec::new());
        let catalog = RelationshipCatalog::build(&model);
        let analyzer = CoverageAnalyzer::new(&registry, &catalog);

        let empty = LayerSpec {
            id: "empty".to_string(),
            number: 4,
            name: "Empty".to_string(),
            node_type_ids: BTreeSet::new(),
        };
        let coverage = analyzer.analyze_layer(&empty);
        assert!(coverage.isolation_percentage.abs() < f64::EPSILON);
        assert!(coverage.relationships_per_node_type.abs() < f64::EPSILON);
        assert!(!coverage.predicate_utilization.is_nan());
    }

    #[test]
    fn analyze_covers_every_layer() {
        let registry = fake_registry();
        let model = snapshot(Vec::new());
        let catalog = RelationshipCatalog::build(&model);
        let coverage = CoverageAnalyzer::new(&registry, &catalog).analyze();
        let layers: Vec<_> = coverage.iter().map(|c| c.layer.as_str()).collect();
        assert_eq!(layers, ["motivation", "business", "application"]);
        assert!(coverage.iter().all(|c| (c.isolation_percentage - 100.0).abs() < 1e-9));
    }
}
