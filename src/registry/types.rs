use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::{domain::SpecNodeId, registry::TypeConstraint};

/// One of the ordered architectural layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    /// Layer id as used in element ids and spec node ids (e.g. `data-model`).
    pub id: String,
    /// Position in the stack, starting at 1.
    pub number: u8,
    /// Display name.
    pub name: String,
    /// Node types registered in this layer.
    pub node_type_ids: BTreeSet<SpecNodeId>,
}

/// A registered element kind and its attribute rules.
#[derive(Debug, Clone)]
pub struct NodeTypeSpec {
    /// `{layer}.{type}`.
    pub spec_node_id: SpecNodeId,
    /// Attributes every instance must carry.
    pub required_attributes: BTreeSet<String>,
    /// Attributes instances may carry.
    pub optional_attributes: BTreeSet<String>,
    /// Value constraints, keyed by attribute name.
    pub attribute_constraints: BTreeMap<String, TypeConstraint>,
}

impl NodeTypeSpec {
    /// The layer this node type belongs to.
    #[must_use]
    pub fn layer(&self) -> &str {
        self.spec_node_id.layer()
    }

    /// The type name within the layer.
    #[must_use]
    pub fn node_type(&self) -> &str {
        self.spec_node_id.node_type()
    }
}

/// Declared multiplicity of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// `1:1`
    OneToOne,
    /// `1:n`
    OneToMany,
    /// `n:1`
    ManyToOne,
    /// `n:m`
    ManyToMany,
}

/// How important a relationship is to the model's traceability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    /// Must never be missing.
    Critical,
    /// Expected in any complete model.
    High,
    /// Commonly present.
    Medium,
    /// Nice to have.
    Low,
}

/// A permitted relationship between two node types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    /// Stable identifier of the rule.
    pub id: String,
    /// Node type at the source end.
    #[serde(rename = "source")]
    pub source_spec_node_id: SpecNodeId,
    /// Node type at the destination end.
    #[serde(rename = "destination")]
    pub destination_spec_node_id: SpecNodeId,
    /// The relationship verb.
    pub predicate: String,
    /// Declared multiplicity.
    pub cardinality: Cardinality,
    /// Declared importance.
    pub strength: Strength,
    /// Whether a complete model must contain at least one instance.
    #[serde(default)]
    pub required: bool,
}

/// A relationship verb and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateDef {
    /// The verb (e.g. `realizes`).
    pub predicate: String,
    /// The verb read in the opposite direction (e.g. `realized-by`).
    pub inverse: String,
    /// Category name.
    pub category: String,
    /// What the predicate means.
    #[serde(default)]
    pub description: String,
}

/// A family of predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateCategory {
    /// Category name.
    pub name: String,
    /// Out-of-spec uses of these predicates are tolerated as warnings.
    #[serde(default)]
    pub advisory: bool,
    /// Predicates in this category commonly restate one another.
    #[serde(default)]
    pub overlapping: bool,
}

/// Key for looking up a layer either by number or by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKey<'a> {
    /// Position in the stack (1-based).
    Number(u8),
    /// Layer id.
    Id(&'a str),
}

impl From<u8> for LayerKey<'_> {
    fn from(number: u8) -> Self {
        Self::Number(number)
    }
}

impl<'a> From<&'a str> for LayerKey<'a> {
    fn from(id: &'a str) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a String> for LayerKey<'a> {
    fn from(id: &'a String) -> Self {
        Self::Id(id.as_str())
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}
