use std::{collections::HashMap, fmt};

use serde::Serialize;

use crate::{
    analysis::RelationshipCatalog,
    domain::SpecNodeId,
    registry::{LayerSpec, SpecRegistry},
    storage::ModelSnapshot,
};

/// How a node type's relationship density compares with its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Density above the layer median times the balance factor.
    OverConnected,
    /// Density below the layer median divided by the balance factor.
    UnderConnected,
    /// Within the factor of the median.
    Balanced,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OverConnected => "over-connected",
            Self::UnderConnected => "under-connected",
            Self::Balanced => "balanced",
        })
    }
}

/// Relationship density of one node type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeBalance {
    /// The node type.
    pub node_type: SpecNodeId,
    /// Relationship instances touching the type per element of the type.
    pub density: f64,
    /// Median density of the layer's populated node types.
    pub layer_median: f64,
    /// How the density compares with the median.
    pub classification: Classification,
}

/// Flags node types whose relationship density strays from their layer's.
#[derive(Debug)]
pub struct BalanceAssessor<'c> {
    registry: &'c SpecRegistry,
    factor: f64,
    element_counts: HashMap<SpecNodeId, usize>,
    /// Instances touching each node type; a self-relationship counts once.
    touching: HashMap<SpecNodeId, usize>,
}

impl<'c> BalanceAssessor<'c> {
    /// Prepares the assessor. `factor` is the permitted multiplicative
    /// deviation from the median.
    #[must_use]
    pub fn new(
        registry: &'c SpecRegistry,
        snapshot: &ModelSnapshot,
        catalog: &RelationshipCatalog<'_>,
        factor: f64,
    ) -> Self {
        let mut touching: HashMap<SpecNodeId, usize> = HashMap::new();
        for instance in catalog.all() {
            if let Some(source) = &instance.source_type {
                *touching.entry(source.clone()).or_default() += 1;
            }
            if let Some(destination) = &instance.destination_type {
                if instance.source_type.as_ref() != Some(destination) {
                    *touching.entry(destination.clone()).or_default() += 1;
                }
            }
        }

        Self {
            registry,
            factor,
            element_counts: snapshot.count_by_node_type(),
            touching,
        }
    }

    /// Balance of every populated node type, in layer then id order.
    #[must_use]
    pub fn assess(&self) -> Vec<NodeTypeBalance> {
        self.registry
            .layers()
            .iter()
            .flat_map(|layer| self.assess_layer(layer))
            .collect()
    }

    /// Balance of the populated node types in one layer.
    #[must_use]
    pub fn assess_layer(&self, layer: &LayerSpec) -> Vec<NodeTypeBalance> {
        let densities: Vec<(&SpecNodeId, f64)> = layer
            .node_type_ids
            .iter()
            .filter_map(|id| {
                let count = *self.element_counts.get(id).filter(|&&n| n > 0)?;
                let touching = self.touching.get(id).copied().unwrap_or_default();
                Some((id, density(touching, count)))
            })
            .collect();

        let median = median(densities.iter().map(|&(_, d)| d).collect());

        densities
            .into_iter()
            .map(|(id, density)| NodeTypeBalance {
                node_type: id.clone(),
                density,
                layer_median: median,
                classification: self.classify(density, median),
            })
            .collect()
    }

    fn classify(&self, density: f64, median: f64) -> Classification {
        if density > median * self.factor {
            Classification::OverConnected
        } else if density < median / self.factor {
            Classification::UnderConnected
        } else {
            Classification::Balanced
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn density(touching: usize, count: usize) -> f64 {
    touching as f64 / count as f64
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        f64::midpoint(values[mid - 1], values[mid])
    } else {
        values[mid]
    }
}
