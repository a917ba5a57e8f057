use std::collections::HashMap;

use crate::{
    domain::{ModelElement, SpecNodeId},
    storage::ModelSnapshot,
};

/// One declared relationship, resolved against the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipInstance<'a> {
    /// Id of the declaring element.
    pub source_id: &'a str,
    /// Layer id of the declaring element.
    pub source_layer: &'a str,
    /// Node type of the declaring element, if well-formed.
    pub source_type: Option<SpecNodeId>,
    /// Id of the target element.
    pub destination_id: &'a str,
    /// Layer id of the target, if it exists in the model.
    pub destination_layer: Option<&'a str>,
    /// Node type of the target, if it exists and is well-formed.
    pub destination_type: Option<SpecNodeId>,
    /// The relationship verb.
    pub predicate: &'a str,
}

impl RelationshipInstance<'_> {
    /// Whether either end lies in `layer`.
    #[must_use]
    pub fn touches_layer(&self, layer: &str) -> bool {
        self.source_layer == layer || self.destination_layer == Some(layer)
    }
}

/// Every relationship instance in a model, indexed for lookup by source,
/// destination and predicate.
///
/// Built once per audit from a snapshot and borrowed from it.
#[derive(Debug, Default)]
pub struct RelationshipCatalog<'a> {
    instances: Vec<RelationshipInstance<'a>>,
    by_source: HashMap<&'a str, Vec<usize>>,
    by_destination: HashMap<&'a str, Vec<usize>>,
    by_predicate: HashMap<&'a str, Vec<usize>>,
}

impl<'a> RelationshipCatalog<'a> {
    /// Indexes every relationship declared in `snapshot`, in scan order.
    #[must_use]
    pub fn build(snapshot: &'a ModelSnapshot) -> Self {
        let mut catalog = Self::default();
        for source in snapshot.elements() {
            let source_type = source.spec_node_id();
            for relationship in &source.relationships {
                let destination = snapshot.find(&relationship.target);
                catalog.insert(RelationshipInstance {
                    source_id: &source.id,
                    source_layer: &source.layer,
                    source_type: source_type.clone(),
                    destination_id: &relationship.target,
                    destination_layer: destination.map(|d| d.layer.as_str()),
                    destination_type: destination.and_then(ModelElement::spec_node_id),
                    predicate: &relationship.predicate,
                });
            }
        }

        tracing::debug!(relationships = catalog.len(), "Built relationship catalog");
        catalog
    }

    fn insert(&mut self, instance: RelationshipInstance<'a>) {
        let index = self.instances.len();
        self.by_source
            .entry(instance.source_id)
            .or_default()
            .push(index);
        self.by_destination
            .entry(instance.destination_id)
            .or_default()
            .push(index);
        self.by_predicate
            .entry(instance.predicate)
            .or_default()
            .push(index);
        self.instances.push(instance);
    }

    /// All instances in scan order.
    pub fn all(&self) -> impl Iterator<Item = &RelationshipInstance<'a>> {
        self.instances.iter()
    }

    /// Instances declared by element `id`.
    pub fn relationships_for_source(
        &self,
        id: &str,
    ) -> impl Iterator<Item = &RelationshipInstance<'a>> {
        self.lookup(self.by_source.get(id))
    }

    /// Instances targeting element `id`.
    pub fn relationships_for_destination(
        &self,
        id: &str,
    ) -> impl Iterator<Item = &RelationshipInstance<'a>> {
        self.lookup(self.by_destination.get(id))
    }

    /// Instances using `predicate`.
    pub fn relationships_for_predicate(
        &self,
        predicate: &str,
    ) -> impl Iterator<Item = &RelationshipInstance<'a>> {
        self.lookup(self.by_predicate.get(predicate))
    }

    fn lookup<'s>(
        &'s self,
        indices: Option<&'s Vec<usize>>,
    ) -> impl Iterator<Item = &'s RelationshipInstance<'a>> + use<'s, 'a> {
        indices
            .into_iter()
            .flatten()
            .map(|&index| &self.instances[index])
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the model declares no relationships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ModelMetadata;

    #[test]
    fn indexes_by_source_destination_and_predicate() {
        let snapshot = ModelSnapshot::new(
            ModelMetadata::default(),
            vec![
                ModelElement::new("business-service-a", "business", "service", "A")
                    .with_relationship("uses", "business-service-b")
                    .with_relationship("supports", "motivation-goal-g"),
                ModelElement::new("business-service-b", "business", "service", "B")
                    .with_relationship("uses", "business-service-a"),
                ModelElement::new("motivation-goal-g", "motivation", "goal", "G"),
            ],
        );

        let catalog = RelationshipCatalog::build(&snapshot);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.relationships_for_source("business-service-a").count(), 2);
        assert_eq!(catalog.relationships_for_destination("motivation-goal-g").count(), 1);
        assert_eq!(catalog.relationships_for_predicate("uses").count(), 2);
        assert_eq!(catalog.relationships_for_predicate("realizes").count(), 0);

        let supports = catalog.relationships_for_predicate("supports").next().unwrap();
        assert_eq!(supports.destination_type, Some("motivation.goal".parse().unwrap()));
        assert!(supports.touches_layer("motivation"));
    }

    #[test]
    fn unresolved_targets_keep_their_id() {
        let snapshot = ModelSnapshot::new(
            ModelMetadata::default(),
            vec![
                ModelElement::new("business-service-a", "business", "service", "A")
                    .with_relationship("uses", "business-service-ghost"),
            ],
        );
        let catalog = RelationshipCatalog::build(&snapshot);
        let instance = catalog.all().next().unwrap();
        assert_eq!(instance.destination_id, "business-service-ghost");
        assert!(instance.destination_type.is_none());
    }
}
