use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::SpecNodeId;

/// One element instance of an architecture model.
///
/// Elements are owned by the model store and are never mutated by the
/// validation or analysis passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelElement {
    /// Globally unique identifier, `{layer}-{type}-{kebab-name}`.
    #[serde(default)]
    pub id: String,

    /// Id of the layer the element was declared in (e.g. `business`).
    #[serde(default)]
    pub layer: String,

    /// Node type within the layer (e.g. `service`).
    #[serde(rename = "type", default)]
    pub element_type: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Additional attributes. Scalar values are normalised to strings.
    #[serde(
        default,
        deserialize_with = "scalar_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub properties: BTreeMap<String, String>,

    /// Cross-element references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    /// Typed relationships to other elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
}

/// A reference from one element to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Id of the referenced element.
    pub target: String,
    /// Kind of reference (free-form, e.g. `implements`).
    #[serde(rename = "type", default)]
    pub reference_type: String,
}

/// A predicate-labelled relationship from one element to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Id of the destination element.
    pub target: String,
    /// The relationship verb (e.g. `realizes`).
    pub predicate: String,
}

impl ModelElement {
    /// Creates an element with the given identity and no attributes.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        layer: impl Into<String>,
        element_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            layer: layer.into(),
            element_type: element_type.into(),
            name: name.into(),
            description: None,
            properties: BTreeMap::new(),
            references: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Adds a property, returning the element.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Adds a reference, returning the element.
    #[must_use]
    pub fn with_reference(
        mut self,
        target: impl Into<String>,
        reference_type: impl Into<String>,
    ) -> Self {
        self.references.push(Reference {
            target: target.into(),
            reference_type: reference_type.into(),
        });
        self
    }

    /// Adds a relationship, returning the element.
    #[must_use]
    pub fn with_relationship(
        mut self,
        predicate: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.relationships.push(Relationship {
            target: target.into(),
            predicate: predicate.into(),
        });
        self
    }

    /// The node type this element claims to be, if its layer and type are
    /// well-formed.
    #[must_use]
    pub fn spec_node_id(&self) -> Option<SpecNodeId> {
        SpecNodeId::from_parts(&self.layer, &self.element_type).ok()
    }

    /// Looks up an attribute by name.
    ///
    /// `name` and `description` resolve to the element fields (empty values
    /// count as absent); everything else is read from `properties`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(self.name.as_str()).filter(|s| !s.trim().is_empty()),
            "description" => self.description.as_deref().filter(|s| !s.trim().is_empty()),
            other => self.properties.get(other).map(String::as_str),
        }
    }
}

/// Deserialise a map whose values may be any YAML/JSON scalar.
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    let raw = Option::<BTreeMap<String, Scalar>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Text(s) => s,
            };
            (key, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialises_scalar_properties_as_strings() {
        let yaml = r"
id: technology-node-web-01
type: node
name: Web 01
properties:
  cpu: 4
  memory-gb: 7.5
  managed: true
  region: eu-west-1
";
        let element: ModelElement = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(element.properties["cpu"], "4");
        assert_eq!(element.properties["memory-gb"], "7.5");
        assert_eq!(element.properties["managed"], "true");
        assert_eq!(element.properties["region"], "eu-west-1");
        assert!(element.layer.is_empty(), "layer is assigned by the store");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let element: ModelElement = serde_yaml::from_str("type: service").unwrap();
        assert!(element.id.is_empty());
        assert!(element.name.is_empty());
        assert!(element.relationships.is_empty());
    }

    #[test]
    fn attribute_lookup_covers_fields_and_properties() {
        let mut element = ModelElement::new("business-service-a", "business", "service", "A")
            .with_property("owner", "ops@example.com");
        assert_eq!(element.attribute("name"), Some("A"));
        assert_eq!(element.attribute("owner"), Some("ops@example.com"));
        assert_eq!(element.attribute("description"), None);

        element.description = Some("   ".to_string());
        assert_eq!(element.attribute("description"), None);
    }

    #[test]
    fn spec_node_id_combines_layer_and_type() {
        let element = ModelElement::new("data-model-entity-order", "data-model", "entity", "Order");
        assert_eq!(
            element.spec_node_id().map(|id| id.to_string()).as_deref(),
            Some("data-model.entity")
        );

        let bad = ModelElement::new("x", "Business", "service", "X");
        assert!(bad.spec_node_id().is_none());
    }
}
