//! The specification registry.
//!
//! [`SpecRegistry`] is an immutable catalog of layers, node types, predicates
//! and relationship rules. It is built once from a [`SpecBundle`] and then
//! shared by reference with every validator and analyzer; there is no global
//! instance. All lookups go through maps precomputed at build time.

mod bundle;
mod constraint;
mod types;

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    path::Path,
};

pub use bundle::{LayerEntry, LoadError, NodeTypeEntry, SpecBundle};
pub use constraint::{ConstraintSpec, ConstraintViolation, Format, TypeConstraint};
use tracing::instrument;
pub use types::{
    Cardinality, LayerKey, LayerSpec, NodeTypeSpec, PredicateCategory, PredicateDef,
    RelationshipSpec, Strength,
};

use crate::domain::SpecNodeId;

/// The largest number of layers a specification may declare.
pub const MAX_LAYERS: usize = 12;

/// Immutable lookup surface over a loaded specification.
#[derive(Debug)]
pub struct SpecRegistry {
    version: String,

    /// Layers in number order; `layers[n - 1]` has number `n`.
    layers: Vec<LayerSpec>,
    layer_by_id: HashMap<String, usize>,

    node_types: HashMap<SpecNodeId, NodeTypeSpec>,

    /// Relationship rules in declaration order.
    relationships: Vec<RelationshipSpec>,
    by_source: HashMap<SpecNodeId, Vec<usize>>,
    by_destination: HashMap<SpecNodeId, Vec<usize>>,
    by_predicate: HashMap<String, Vec<usize>>,

    /// Sorted, distinct predicates usable from each source node type.
    predicates_for_source: HashMap<SpecNodeId, Vec<String>>,

    predicates: HashMap<String, PredicateDef>,
    categories: HashMap<String, PredicateCategory>,
}

impl SpecRegistry {
    /// Builds the registry from the specification compiled into this crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the builtin specification is inconsistent.
    #[instrument]
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_bundle(SpecBundle::builtin()?)
    }

    /// Builds the registry from a specification directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the files cannot be read or are inconsistent.
    #[instrument]
    pub fn from_dir(dir: &Path) -> Result<Self, LoadError> {
        Self::from_bundle(SpecBundle::from_dir(dir)?)
    }

    /// Validates and indexes a bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle does not declare exactly
    /// [`MAX_LAYERS`] layers numbered contiguously from 1, any identifier is
    /// duplicated or malformed, a pattern fails to compile, or a rule refers
    /// to an unknown node type, predicate or category.
    pub fn from_bundle(bundle: SpecBundle) -> Result<Self, LoadError> {
        if bundle.layers.len() != MAX_LAYERS {
            return Err(LoadError::LayerCount(bundle.layers.len()));
        }
        Self::index(bundle)
    }

    /// Checks the internal consistency of a bundle of any size and builds the
    /// lookup indexes.
    fn index(bundle: SpecBundle) -> Result<Self, LoadError> {
        let SpecBundle {
            version,
            mut layers,
            categories,
            predicates,
            relationships,
        } = bundle;

        layers.sort_by_key(|layer| layer.number);
        let numbers: Vec<u8> = layers.iter().map(|layer| layer.number).collect();
        if numbers.iter().zip(1u8..).any(|(&number, expected)| number != expected) {
            return Err(LoadError::LayerNumbering(numbers));
        }

        let mut layer_specs = Vec::with_capacity(layers.len());
        let mut layer_by_id = HashMap::with_capacity(layers.len());
        let mut node_types = HashMap::new();

        for (index, layer) in layers.into_iter().enumerate() {
            if layer_by_id.insert(layer.id.clone(), index).is_some() {
                return Err(LoadError::DuplicateLayer(layer.id));
            }

            let mut node_type_ids = BTreeSet::new();
            for entry in layer.node_types {
                let spec = build_node_type(&layer.id, entry)?;
                let id = spec.spec_node_id.clone();
                if node_types.insert(id.clone(), spec).is_some() {
                    return Err(LoadError::DuplicateNodeType(id.to_string()));
                }
                node_type_ids.insert(id);
            }

            layer_specs.push(LayerSpec {
                id: layer.id,
                number: layer.number,
                name: layer.name,
                node_type_ids,
            });
        }

        let categories: HashMap<String, PredicateCategory> = categories
            .into_iter()
            .map(|category| (category.name.clone(), category))
            .collect();

        let mut predicate_map = HashMap::with_capacity(predicates.len());
        for predicate in predicates {
            if !categories.contains_key(&predicate.category) {
                return Err(LoadError::UnknownCategory {
                    predicate: predicate.predicate,
                    category: predicate.category,
                });
            }
            let name = predicate.predicate.clone();
            if predicate_map.insert(name.clone(), predicate).is_some() {
                return Err(LoadError::DuplicatePredicate(name));
            }
        }

        let mut by_source: HashMap<SpecNodeId, Vec<usize>> = HashMap::new();
        let mut by_destination: HashMap<SpecNodeId, Vec<usize>> = HashMap::new();
        let mut by_predicate: HashMap<String, Vec<usize>> = HashMap::new();
        let mut source_predicates: HashMap<SpecNodeId, BTreeSet<String>> = HashMap::new();

        for (index, rule) in relationships.iter().enumerate() {
            for node_type in [&rule.source_spec_node_id, &rule.destination_spec_node_id] {
                if !node_types.contains_key(node_type) {
                    return Err(LoadError::UnknownNodeType {
                        id: rule.id.clone(),
                        node_type: node_type.to_string(),
                    });
                }
            }
            if !predicate_map.contains_key(&rule.predicate) {
                return Err(LoadError::UnknownPredicate {
                    id: rule.id.clone(),
                    predicate: rule.predicate.clone(),
                });
            }

            by_source
                .entry(rule.source_spec_node_id.clone())
                .or_default()
                .push(index);
            by_destination
                .entry(rule.destination_spec_node_id.clone())
                .or_default()
                .push(index);
            by_predicate
                .entry(rule.predicate.clone())
                .or_default()
                .push(index);
            source_predicates
                .entry(rule.source_spec_node_id.clone())
                .or_default()
                .insert(rule.predicate.clone());
        }

        let predicates_for_source = source_predicates
            .into_iter()
            .map(|(source, predicates)| (source, predicates.into_iter().collect()))
            .collect();

        tracing::debug!(
            layers = layer_specs.len(),
            node_types = node_types.len(),
            relationships = relationships.len(),
            "Loaded specification {version}"
        );

        Ok(Self {
            version,
            layers: layer_specs,
            layer_by_id,
            node_types,
            relationships,
            by_source,
            by_destination,
            by_predicate,
            predicates_for_source,
            predicates: predicate_map,
            categories,
        })
    }

    /// The specification version.
    #[must_use]
    pub fn spec_version(&self) -> &str {
        &self.version
    }

    /// All layers in number order.
    #[must_use]
    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Looks up a layer by number or id.
    pub fn layer<'k>(&self, key: impl Into<LayerKey<'k>>) -> Option<&LayerSpec> {
        match key.into() {
            LayerKey::Number(number) => self
                .layers
                .get(usize::from(number).checked_sub(1)?)
                .filter(|layer| layer.number == number),
            LayerKey::Id(id) => self.layer_by_id.get(id).map(|&index| &self.layers[index]),
        }
    }

    /// The number of the layer with the given id.
    #[must_use]
    pub fn layer_number(&self, layer_id: &str) -> Option<u8> {
        self.layer(layer_id).map(|layer| layer.number)
    }

    /// Infers the layer number of an element from its id alone.
    ///
    /// Picks the longest layer id `L` such that the element id starts with
    /// `L-`, so `data-model-entity-x` resolves to `data-model` rather than to
    /// a hypothetical `data` layer.
    #[must_use]
    pub fn layer_number_of_id(&self, element_id: &str) -> Option<u8> {
        self.layers
            .iter()
            .filter(|layer| {
                element_id
                    .strip_prefix(layer.id.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
            })
            .max_by_key(|layer| layer.id.len())
            .map(|layer| layer.number)
    }

    /// Looks up a node type.
    #[must_use]
    pub fn node_type(&self, spec_node_id: &SpecNodeId) -> Option<&NodeTypeSpec> {
        self.node_types.get(spec_node_id)
    }

    /// Node types registered in a layer, in id order.
    pub fn node_types_in_layer<'a>(
        &'a self,
        layer_id: &str,
    ) -> impl Iterator<Item = &'a NodeTypeSpec> + 'a {
        self.layer(layer_id)
            .into_iter()
            .flat_map(|layer| layer.node_type_ids.iter())
            .filter_map(|id| self.node_types.get(id))
    }

    /// All relationship rules in declaration order.
    #[must_use]
    pub fn relationships(&self) -> &[RelationshipSpec] {
        &self.relationships
    }

    /// Relationship rules whose source is `source`, optionally narrowed by
    /// predicate and destination.
    #[must_use]
    pub fn valid_relationships(
        &self,
        source: &SpecNodeId,
        predicate: Option<&str>,
        destination: Option<&SpecNodeId>,
    ) -> Vec<&RelationshipSpec> {
        self.rules(self.by_source.get(source))
            .filter(|rule| predicate.is_none_or(|p| rule.predicate == p))
            .filter(|rule| destination.is_none_or(|d| &rule.destination_spec_node_id == d))
            .collect()
    }

    /// Relationship rules whose destination is `destination`.
    pub fn relationships_to<'a>(
        &'a self,
        destination: &SpecNodeId,
    ) -> impl Iterator<Item = &'a RelationshipSpec> + 'a {
        self.rules(self.by_destination.get(destination))
    }

    /// Relationship rules using `predicate`.
    pub fn relationships_with_predicate<'a>(
        &'a self,
        predicate: &str,
    ) -> impl Iterator<Item = &'a RelationshipSpec> + 'a {
        self.rules(self.by_predicate.get(predicate))
    }

    /// Whether `source --predicate--> destination` is permitted.
    #[must_use]
    pub fn is_valid_relationship(
        &self,
        source: &SpecNodeId,
        predicate: &str,
        destination: &SpecNodeId,
    ) -> bool {
        !self
            .valid_relationships(source, Some(predicate), Some(destination))
            .is_empty()
    }

    /// The distinct predicates any rule permits from `source`, sorted.
    #[must_use]
    pub fn valid_predicates_for_source(&self, source: &SpecNodeId) -> &[String] {
        self.predicates_for_source
            .get(source)
            .map_or(&[], Vec::as_slice)
    }

    /// Looks up a predicate definition.
    #[must_use]
    pub fn predicate(&self, predicate: &str) -> Option<&PredicateDef> {
        self.predicates.get(predicate)
    }

    /// Looks up a predicate category.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&PredicateCategory> {
        self.categories.get(name)
    }

    /// Whether out-of-spec uses of `predicate` are tolerated as warnings.
    ///
    /// Only predicates defined in an advisory category qualify; an unknown
    /// predicate is never advisory.
    #[must_use]
    pub fn is_advisory(&self, predicate: &str) -> bool {
        self.predicate(predicate)
            .and_then(|def| self.category(&def.category))
            .is_some_and(|category| category.advisory)
    }

    /// How strongly two distinct predicates restate one another, in `[0, 1]`.
    ///
    /// Same category scores 0.5, plus 0.25 when that category is marked
    /// overlapping. Inverse-compatible predicates (one is the other's
    /// inverse, or both share an inverse) score a further 0.25. Unknown
    /// predicates score 0.
    #[must_use]
    pub fn predicate_overlap(&self, a: &str, b: &str) -> f64 {
        let (Some(a), Some(b)) = (self.predicate(a), self.predicate(b)) else {
            return 0.0;
        };

        let mut score = 0.0;
        if a.category == b.category {
            score += 0.5;
            if self.category(&a.category).is_some_and(|c| c.overlapping) {
                score += 0.25;
            }
        }
        if a.inverse == b.predicate || b.inverse == a.predicate || a.inverse == b.inverse {
            score += 0.25;
        }
        score
    }

    fn rules<'a>(
        &'a self,
        indices: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a RelationshipSpec> + 'a {
        indices
            .into_iter()
            .flatten()
            .map(|&index| &self.relationships[index])
    }

    /// All distinct predicates that rules permit from node types of a layer.
    #[must_use]
    pub fn predicates_for_layer(&self, layer_id: &str) -> HashSet<&str> {
        self.node_types_in_layer(layer_id)
            .flat_map(|node_type| self.valid_predicates_for_source(&node_type.spec_node_id))
            .map(String::as_str)
            .collect()
    }
}

fn build_node_type(layer: &str, entry: NodeTypeEntry) -> Result<NodeTypeSpec, LoadError> {
    let spec_node_id =
        SpecNodeId::from_parts(layer, &entry.node_type).map_err(|source| LoadError::NodeType {
            layer: layer.to_string(),
            node_type: entry.node_type.clone(),
            source,
        })?;

    let attribute_constraints = entry
        .constraints
        .into_iter()
        .map(|(attribute, spec)| {
            TypeConstraint::try_from(spec)
                .map(|constraint| (attribute.clone(), constraint))
                .map_err(|source| LoadError::Pattern {
                    node_type: spec_node_id.to_string(),
                    attribute,
                    source,
                })
        })
        .collect::<Result<_, _>>()?;

    Ok(NodeTypeSpec {
        spec_node_id,
        required_attributes: entry.required,
        optional_attributes: entry.optional,
        attribute_constraints,
    })
}
