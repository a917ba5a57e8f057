//! A filesystem backed, read-only model store.
//!
//! A model root holds a `manifest.yaml` and any number of layer files under
//! `layers/`:
//!
//! ```text
//! model/
//! ├── manifest.yaml
//! └── layers/
//!     ├── 02-business.yaml
//!     └── application/
//!         └── components.yaml
//! ```
//!
//! Each layer file is a document of the form `{ layer, elements }`. File
//! names carry no meaning; the `layer` key decides where elements belong.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Deserialize;
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::ModelElement,
    registry::SpecRegistry,
    storage::{ModelMetadata, ModelSnapshot, ModelSource},
};

const MANIFEST_FILE: &str = "manifest.yaml";
const LAYERS_DIR: &str = "layers";

/// Errors that prevent a model from loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The model root does not exist or is not a directory.
    #[error("model root {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The layers directory could not be walked.
    #[error("failed to scan {}: {source}", path.display())]
    Walk {
        /// The entry being visited when the walk failed.
        path: PathBuf,
        /// The underlying error.
        source: walkdir::Error,
    },

    /// A file is not valid YAML for its schema.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The file that could not be parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// A layer file names a layer the specification does not define.
    #[error("{} declares unknown layer '{layer}'", path.display())]
    UnknownLayer {
        /// The layer file.
        path: PathBuf,
        /// The unrecognised layer id.
        layer: String,
    },
}

#[derive(Debug, Deserialize)]
struct LayerFile {
    layer: String,
    #[serde(default)]
    elements: Vec<ModelElement>,
}

/// A model stored in a directory.
#[derive(Debug, Clone)]
pub struct Directory<'r> {
    root: PathBuf,
    registry: &'r SpecRegistry,
}

impl<'r> Directory<'r> {
    /// Opens the model rooted at `root`. Nothing is read until
    /// [`Directory::load`] is called.
    #[must_use]
    pub const fn new(root: PathBuf, registry: &'r SpecRegistry) -> Self {
        Self { root, registry }
    }

    /// The model root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the manifest and every layer file.
    ///
    /// Layer files are parsed in parallel and then ordered by layer number
    /// and path, so the resulting scan order does not depend on the
    /// filesystem. Elements that omit `layer` inherit it from their file.
    ///
    /// # Errors
    ///
    /// Fails if the root or manifest is missing, `layers/` cannot be fully
    /// scanned, any file cannot be read or parsed, or a file names an unknown
    /// layer. A missing `layers/` directory is an empty model.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn load(&self) -> Result<ModelSnapshot, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::MissingRoot(self.root.clone()));
        }

        let metadata: ModelMetadata = read_yaml(&self.root.join(MANIFEST_FILE))?;
        let paths = collect_layer_paths(&self.root.join(LAYERS_DIR))?;

        let mut files = paths
            .par_iter()
            .map(|path| self.load_layer_file(path))
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;

        files.sort_by(|(a_number, a_path, _), (b_number, b_path, _)| {
            a_number.cmp(b_number).then_with(|| a_path.cmp(b_path))
        });

        let elements: Vec<ModelElement> = files
            .into_iter()
            .flat_map(|(_, _, elements)| elements)
            .collect();

        tracing::debug!(
            model = %metadata.name,
            elements = elements.len(),
            "Loaded model"
        );

        Ok(ModelSnapshot::new(metadata, elements))
    }

    /// Parses one layer file. Empty files are skipped.
    fn load_layer_file(
        &self,
        path: &Path,
    ) -> Result<Option<(u8, PathBuf, Vec<ModelElement>)>, LoadError> {
        let content = read(path)?;
        if content.trim().is_empty() {
            tracing::warn!("Skipping empty layer file {}", path.display());
            return Ok(None);
        }

        let file: LayerFile = parse_yaml(path, &content)?;
        let number =
            self.registry
                .layer_number(&file.layer)
                .ok_or_else(|| LoadError::UnknownLayer {
                    path: path.to_path_buf(),
                    layer: file.layer.clone(),
                })?;

        let elements = file
            .elements
            .into_iter()
            .map(|mut element| {
                if element.layer.is_empty() {
                    element.layer.clone_from(&file.layer);
                }
                element
            })
            .collect();

        Ok(Some((number, path.to_path_buf(), elements)))
    }
}

impl ModelSource for Directory<'_> {
    fn snapshot(&self) -> Result<ModelSnapshot, LoadError> {
        self.load()
    }
}

/// Every `.yaml`/`.yml` file under `dir`, following symlinks. Any entry that
/// cannot be visited fails the whole scan.
fn collect_layer_paths(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: source.path().unwrap_or(dir).to_path_buf(),
            source,
        })?;
        let is_layer_file = entry.file_type().is_file()
            && matches!(
                entry.path().extension().and_then(OsStr::to_str),
                Some("yaml" | "yml")
            );
        if is_layer_file {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_yaml<T: for<'de> Deserialize<'de>>(path: &Path, content: &str) -> Result<T, LoadError> {
    serde_yaml::from_str(content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, LoadError> {
    parse_yaml(path, &read(path)?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const MANIFEST: &str = "name: shop\nversion: 1.0.0\n";

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn model_dir(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().expect("failed to create temp dir");
        write(tmp.path(), MANIFEST_FILE, MANIFEST);
        for (path, content) in files {
            write(tmp.path(), path, content);
        }
        tmp
    }

    #[test]
    fn loads_manifest_and_layers_in_layer_order() {
        let registry = SpecRegistry::builtin().unwrap();
        let tmp = model_dir(&[
            (
                "layers/a-application.yaml",
                "layer: application\nelements:\n  - id: application-component-x\n    type: component\n    name: X\n",
            ),
            (
                "layers/z-business.yaml",
                "layer: business\nelements:\n  - id: business-service-a\n    type: service\n    name: A\n    properties:\n      owner: ops@example.com\n      tier: 2\n",
            ),
        ]);

        let snapshot = Directory::new(tmp.path().to_path_buf(), &registry)
            .load()
            .unwrap();

        assert_eq!(snapshot.metadata().name, "shop");
        let ids: Vec<_> = snapshot.elements().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["business-service-a", "application-component-x"]);

        let service = snapshot.find("business-service-a").unwrap();
        assert_eq!(service.layer, "business");
        assert_eq!(service.properties["tier"], "2");
    }

    #[test]
    fn preserves_duplicates_across_files() {
        let registry = SpecRegistry::builtin().unwrap();
        let element = "  - id: business-service-dup\n    type: service\n    name: Dup\n";
        let tmp = model_dir(&[
            ("layers/one.yaml", format!("layer: business\nelements:\n{element}").as_str()),
            ("layers/nested/two.yml", format!("layer: business\nelements:\n{element}").as_str()),
        ]);

        let snapshot = Directory::new(tmp.path().to_path_buf(), &registry)
            .snapshot()
            .unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn skips_empty_layer_files() {
        let registry = SpecRegistry::builtin().unwrap();
        let tmp = model_dir(&[("layers/empty.yaml", "")]);
        let snapshot = Directory::new(tmp.path().to_path_buf(), &registry)
            .load()
            .unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn rejects_unknown_layers() {
        let registry = SpecRegistry::builtin().unwrap();
        let tmp = model_dir(&[("layers/x.yaml", "layer: marketing\nelements: []\n")]);
        let err = Directory::new(tmp.path().to_path_buf(), &registry)
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::UnknownLayer { layer, .. } if layer == "marketing"));
    }

    #[test]
    fn missing_root_and_manifest_are_fatal() {
        let registry = SpecRegistry::builtin().unwrap();
        let tmp = TempDir::new().unwrap();

        let missing = Directory::new(tmp.path().join("nope"), &registry).load();
        assert!(matches!(missing, Err(LoadError::MissingRoot(_))));

        let no_manifest = Directory::new(tmp.path().to_path_buf(), &registry).load();
        assert!(matches!(no_manifest, Err(LoadError::Io { .. })));
    }

    #[test]
    fn malformed_layer_file_is_fatal() {
        let registry = SpecRegistry::builtin().unwrap();
        let tmp = model_dir(&[("layers/bad.yaml", "layer: [unterminated")]);
        let err = Directory::new(tmp.path().to_path_buf(), &registry)
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn missing_layers_directory_is_an_empty_model() {
        let registry = SpecRegistry::builtin().unwrap();
        let tmp = model_dir(&[]);
        let snapshot = Directory::new(tmp.path().to_path_buf(), &registry)
            .load()
            .unwrap();
        assert!(snapshot.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreachable_layer_entry_is_fatal() {
        let registry = SpecRegistry::builtin().unwrap();
        let tmp = model_dir(&[(
            "layers/business.yaml",
            "layer: business\nelements:\n  - id: business-service-a\n    type: service\n    name: A\n",
        )]);
        std::os::unix::fs::symlink(
            tmp.path().join("gone"),
            tmp.path().join("layers/application"),
        )
        .unwrap();

        let err = Directory::new(tmp.path().to_path_buf(), &registry)
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Walk { path, .. } if path.ends_with("layers/application")));
    }
}
