//! The serialized form of an architecture specification.
//!
//! A bundle is three YAML documents: the layer catalog (with node types and
//! attribute rules), the predicate catalog, and the relationship rules. The
//! builtin bundle is compiled into the binary; alternative bundles can be
//! read from a directory holding files with the same names.

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    domain::SpecNodeIdError,
    registry::{ConstraintSpec, PredicateCategory, PredicateDef, RelationshipSpec},
};

const LAYERS_FILE: &str = "layers.yaml";
const PREDICATES_FILE: &str = "predicates.yaml";
const RELATIONSHIPS_FILE: &str = "relationships.yaml";

const BUILTIN_LAYERS: &str = include_str!("../../spec/layers.yaml");
const BUILTIN_PREDICATES: &str = include_str!("../../spec/predicates.yaml");
const BUILTIN_RELATIONSHIPS: &str = include_str!("../../spec/relationships.yaml");

/// Raw, unvalidated specification data.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecBundle {
    /// Specification version.
    pub version: String,
    /// Layer catalog.
    pub layers: Vec<LayerEntry>,
    /// Predicate categories.
    pub categories: Vec<PredicateCategory>,
    /// Predicate catalog.
    pub predicates: Vec<PredicateDef>,
    /// Relationship rules.
    pub relationships: Vec<RelationshipSpec>,
}

/// A layer as written in the layer catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerEntry {
    /// Layer id.
    pub id: String,
    /// Position in the stack.
    pub number: u8,
    /// Display name.
    pub name: String,
    /// Node types in this layer.
    #[serde(default)]
    pub node_types: Vec<NodeTypeEntry>,
}

/// A node type as written in the layer catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeTypeEntry {
    /// Type name within the layer.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Required attributes.
    #[serde(default)]
    pub required: BTreeSet<String>,
    /// Optional attributes.
    #[serde(default)]
    pub optional: BTreeSet<String>,
    /// Attribute constraints.
    #[serde(default)]
    pub constraints: BTreeMap<String, ConstraintSpec>,
}

#[derive(Debug, Deserialize)]
struct LayersDocument {
    version: String,
    layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
struct PredicatesDocument {
    #[serde(default)]
    categories: Vec<PredicateCategory>,
    predicates: Vec<PredicateDef>,
}

#[derive(Debug, Deserialize)]
struct RelationshipsDocument {
    #[serde(default)]
    relationships: Vec<RelationshipSpec>,
}

/// Errors that prevent a specification from loading.
///
/// These are fatal: a registry is either complete or not constructed at all.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A bundle file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A bundle document is not valid YAML for its schema.
    #[error("failed to parse {document}: {source}")]
    Parse {
        /// Which document failed.
        document: &'static str,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// The bundle does not declare the full layer stack.
    #[error("expected exactly 12 layers, found {0}")]
    LayerCount(usize),

    /// Layer numbers are not exactly `1..=n`.
    #[error("layer numbers must run contiguously from 1, found {0:?}")]
    LayerNumbering(Vec<u8>),

    /// Two layers share an id.
    #[error("duplicate layer id '{0}'")]
    DuplicateLayer(String),

    /// A layer or node type name is not kebab-case.
    #[error("invalid node type '{node_type}' in layer '{layer}': {source}")]
    NodeType {
        /// Layer id.
        layer: String,
        /// Type name.
        node_type: String,
        /// The underlying error.
        source: SpecNodeIdError,
    },

    /// Two node types share an id.
    #[error("duplicate node type '{0}'")]
    DuplicateNodeType(String),

    /// An attribute constraint pattern is not a valid regular expression.
    #[error("invalid pattern for attribute '{attribute}' of '{node_type}': {source}")]
    Pattern {
        /// The node type.
        node_type: String,
        /// The attribute.
        attribute: String,
        /// The underlying error.
        source: regex::Error,
    },

    /// Two predicates share a name.
    #[error("duplicate predicate '{0}'")]
    DuplicatePredicate(String),

    /// A predicate names a category that does not exist.
    #[error("predicate '{predicate}' has unknown category '{category}'")]
    UnknownCategory {
        /// The predicate.
        predicate: String,
        /// The missing category.
        category: String,
    },

    /// A relationship rule names a node type that does not exist.
    #[error("relationship '{id}' references unknown node type '{node_type}'")]
    UnknownNodeType {
        /// The rule id.
        id: String,
        /// The missing node type.
        node_type: String,
    },

    /// A relationship rule names a predicate that does not exist.
    #[error("relationship '{id}' uses unknown predicate '{predicate}'")]
    UnknownPredicate {
        /// The rule id.
        id: String,
        /// The missing predicate.
        predicate: String,
    },
}

impl SpecBundle {
    /// The specification compiled into this crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded documents do not parse.
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_yaml(BUILTIN_LAYERS, BUILTIN_PREDICATES, BUILTIN_RELATIONSHIPS)
    }

    /// Reads `layers.yaml`, `predicates.yaml` and `relationships.yaml` from a
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if any file is missing, unreadable or malformed.
    pub fn from_dir(dir: &Path) -> Result<Self, LoadError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })
        };

        Self::from_yaml(
            &read(LAYERS_FILE)?,
            &read(PREDICATES_FILE)?,
            &read(RELATIONSHIPS_FILE)?,
        )
    }

    /// Parses the three bundle documents from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if any document does not match its schema.
    pub fn from_yaml(layers: &str, predicates: &str, relationships: &str) -> Result<Self, LoadError> {
        let layers: LayersDocument = parse(LAYERS_FILE, layers)?;
        let predicates: PredicatesDocument = parse(PREDICATES_FILE, predicates)?;
        let relationships: RelationshipsDocument = parse(RELATIONSHIPS_FILE, relationships)?;

        Ok(Self {
            version: layers.version,
            layers: layers.layers,
            categories: predicates.categories,
            predicates: predicates.predicates,
            relationships: relationships.relationships,
        })
    }
}

fn parse<T: for<'de> Deserialize<'de>>(document: &'static str, source: &str) -> Result<T, LoadError> {
    serde_yaml::from_str(source).map_err(|source| LoadError::Parse { document, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bundle_parses() {
        let bundle = SpecBundle::builtin().unwrap();
        assert_eq!(bundle.layers.len(), 12);
        assert!(!bundle.predicates.is_empty());
        assert!(bundle.relationships.iter().any(|r| r.required));
    }

    #[test]
    fn parse_errors_name_the_document() {
        let err = SpecBundle::from_yaml("version: '1'\nlayers: []", "predicates: 3", "").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse {
                document: PREDICATES_FILE,
                ..
            }
        ));
    }

    #[test]
    fn from_dir_reports_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SpecBundle::from_dir(tmp.path()).unwrap_err();
        match err {
            LoadError::Io { path, .. } => assert!(path.ends_with(LAYERS_FILE)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_dir_reads_the_same_layout_as_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(LAYERS_FILE), BUILTIN_LAYERS).unwrap();
        std::fs::write(tmp.path().join(PREDICATES_FILE), BUILTIN_PREDICATES).unwrap();
        std::fs::write(tmp.path().join(RELATIONSHIPS_FILE), BUILTIN_RELATIONSHIPS).unwrap();

        let bundle = SpecBundle::from_dir(tmp.path()).unwrap();
        assert_eq!(bundle.version, SpecBundle::builtin().unwrap().version);
    }
}
