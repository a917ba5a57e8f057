use std::collections::HashSet;

use serde::Serialize;

use crate::{
    analysis::RelationshipCatalog,
    domain::SpecNodeId,
    registry::{RelationshipSpec, SpecRegistry},
};

/// Priority of a missing relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPriority {
    /// A required relationship has no instance.
    High,
    /// An optional relationship has no instance.
    Low,
}

/// A specified relationship with no instance in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    /// Source node type.
    pub source_type: SpecNodeId,
    /// Destination node type.
    pub destination_type: SpecNodeId,
    /// The missing predicate.
    pub predicate: String,
    /// High for required relationships, low otherwise.
    pub priority: GapPriority,
}

/// Checks which specified relationships the model never instantiates.
#[derive(Debug)]
pub struct GapAnalyzer<'c> {
    registry: &'c SpecRegistry,
    /// `(source type, predicate, destination type)` triples with at least one
    /// instance.
    realized: HashSet<(&'c SpecNodeId, &'c str, &'c SpecNodeId)>,
}

impl<'c> GapAnalyzer<'c> {
    /// Prepares the analyzer.
    #[must_use]
    pub fn new(registry: &'c SpecRegistry, catalog: &'c RelationshipCatalog<'_>) -> Self {
        let realized = catalog
            .all()
            .filter_map(|instance| {
                Some((
                    instance.source_type.as_ref()?,
                    instance.predicate,
                    instance.destination_type.as_ref()?,
                ))
            })
            .collect();

        Self { registry, realized }
    }

    /// Gaps across the whole specification: high priority first, then in
    /// declaration order.
    #[must_use]
    pub fn analyze(&self) -> Vec<Gap> {
        self.collect(|_| true)
    }

    /// Gaps for relationships with either end in `layer`, including
    /// cross-layer relationships.
    #[must_use]
    pub fn analyze_layer(&self, layer: &str) -> Vec<Gap> {
        self.collect(|spec| {
            spec.source_spec_node_id.layer() == layer
                || spec.destination_spec_node_id.layer() == layer
        })
    }

    fn collect(&self, include: impl Fn(&RelationshipSpec) -> bool) -> Vec<Gap> {
        let mut gaps: Vec<Gap> = self
            .registry
            .relationships()
            .iter()
            .filter(|spec| include(spec))
            .filter(|spec| !self.is_realized(spec))
            .map(|spec| Gap {
                source_type: spec.source_spec_node_id.clone(),
                destination_type: spec.destination_spec_node_id.clone(),
                predicate: spec.predicate.clone(),
                priority: if spec.required {
                    GapPriority::High
                } else {
                    GapPriority::Low
                },
            })
            .collect();

        // stable, so declaration order survives within a priority
        gaps.sort_by_key(|gap| gap.priority);
        gaps
    }

    fn is_realized(&self, spec: &RelationshipSpec) -> bool {
        self.realized.contains(&(
            &spec.source_spec_node_id,
            spec.predicate.as_str(),
            &spec.destination_spec_node_id,
        ))
    }
}
