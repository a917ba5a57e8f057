use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{ModelElement, SpecNodeId};

/// Identifying information from a model's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name.
    pub name: String,
    /// Model version.
    pub version: String,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An immutable view of a whole model for the duration of one run.
///
/// Elements are kept in scan order and duplicates are preserved, so callers
/// can tell which occurrence of a repeated id came first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelSnapshot {
    metadata: ModelMetadata,
    elements: Vec<ModelElement>,
    /// Id to index of its first occurrence.
    first_index: HashMap<String, usize>,
}

impl ModelSnapshot {
    /// Creates a snapshot from elements in scan order. Elements without an
    /// id are kept but can never be found by id.
    #[must_use]
    pub fn new(metadata: ModelMetadata, elements: Vec<ModelElement>) -> Self {
        let mut first_index = HashMap::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            if !element.id.is_empty() {
                first_index.entry(element.id.clone()).or_insert(index);
            }
        }

        Self {
            metadata,
            elements,
            first_index,
        }
    }

    /// The model's manifest data.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// All elements in scan order, duplicates included.
    #[must_use]
    pub fn elements(&self) -> &[ModelElement] {
        &self.elements
    }

    /// Elements declared in any of the given layers, in scan order.
    pub fn elements_in_layers<'a, S: AsRef<str>>(
        &'a self,
        layers: &'a [S],
    ) -> impl Iterator<Item = &'a ModelElement> + 'a {
        self.elements
            .iter()
            .filter(|element| layers.iter().any(|layer| layer.as_ref() == element.layer))
    }

    /// Whether any element has the given id.
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.first_index.contains_key(id)
    }

    /// The first element with the given id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ModelElement> {
        self.first_index.get(id).map(|&index| &self.elements[index])
    }

    /// Number of elements per node type. Elements whose layer or type is not
    /// a well-formed identifier are not counted.
    #[must_use]
    pub fn count_by_node_type(&self) -> HashMap<SpecNodeId, usize> {
        let mut counts = HashMap::new();
        for id in self.elements.iter().filter_map(ModelElement::spec_node_id) {
            *counts.entry(id).or_default() += 1;
        }
        counts
    }

    /// Number of elements per declared layer id.
    #[must_use]
    pub fn count_by_layer(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for element in &self.elements {
            *counts.entry(element.layer.as_str()).or_default() += 1;
        }
        counts
    }

    /// Total number of declared relationship instances.
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.elements.iter().map(|e| e.relationships.len()).sum()
    }

    /// Number of elements, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the model has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
