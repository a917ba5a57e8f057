use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for validation and audit runs.
///
/// Loaded from `.archm/config.toml` in the model root. Every setting has a
/// default, so an absent or empty file yields [`Config::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Limits applied by `audit --threshold`.
    pub thresholds: Thresholds,

    /// Multiplicative factor by which a node type's relationship density may
    /// deviate from its layer's median before it is flagged.
    balance_factor: f64,

    /// Minimum overlap score for two distinct predicates between the same
    /// pair of elements to be reported as duplicates.
    duplicate_similarity: f64,

    /// Maximum number of edges followed when searching for transitive chains.
    max_chain_depth: usize,

    /// Maximum number of transitive chains reported.
    max_transitive_chains: usize,
}

/// Quality gate limits for the audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    /// A layer whose isolation percentage exceeds this fails the gate.
    pub max_isolation_percentage: f64,
    /// A layer whose relationships-per-node-type falls below this fails the
    /// gate.
    pub min_density: f64,
    /// More high-priority gaps than this fails the gate.
    pub max_high_priority_gaps: usize,
    /// More duplicate candidates than this fails the gate.
    pub max_duplicate_candidates: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_isolation_percentage: 20.0,
            min_density: 1.5,
            max_high_priority_gaps: 10,
            max_duplicate_candidates: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            balance_factor: default_balance_factor(),
            duplicate_similarity: default_duplicate_similarity(),
            max_chain_depth: default_max_chain_depth(),
            max_transitive_chains: default_max_transitive_chains(),
        }
    }
}

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the configuration from `<root>/.archm/config.toml`, falling back
    /// to the defaults only when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(root: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(root);
        match Self::load(&path) {
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}; using defaults", path.display());
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Location of the configuration file for the model at `root`.
    #[must_use]
    pub fn path(root: &Path) -> std::path::PathBuf {
        root.join(".archm").join("config.toml")
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the balance deviation factor (always greater than 1).
    #[must_use]
    pub const fn balance_factor(&self) -> f64 {
        self.balance_factor
    }

    /// Returns the duplicate overlap threshold.
    #[must_use]
    pub const fn duplicate_similarity(&self) -> f64 {
        self.duplicate_similarity
    }

    /// Returns the transitive-chain depth bound in edges (at least 2).
    #[must_use]
    pub const fn max_chain_depth(&self) -> usize {
        self.max_chain_depth
    }

    /// Returns the cap on reported transitive chains.
    #[must_use]
    pub const fn max_transitive_chains(&self) -> usize {
        self.max_transitive_chains
    }

    /// Sets the transitive-chain depth bound, clamped to at least 2 edges.
    pub fn set_max_chain_depth(&mut self, depth: usize) {
        self.max_chain_depth = depth.max(MIN_CHAIN_DEPTH);
    }

    /// Sets the balance deviation factor; values not greater than 1 are
    /// ignored.
    pub fn set_balance_factor(&mut self, factor: f64) {
        if factor > 1.0 {
            self.balance_factor = factor;
        }
    }
}

/// A transitive chain has at least three nodes.
const MIN_CHAIN_DEPTH: usize = 2;

const fn default_balance_factor() -> f64 {
    2.0
}

const fn default_duplicate_similarity() -> f64 {
    0.75
}

const fn default_max_chain_depth() -> usize {
    4
}

const fn default_max_transitive_chains() -> usize {
    10_000
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        thresholds: Thresholds,

        #[serde(default = "default_balance_factor")]
        balance_factor: f64,

        #[serde(default = "default_duplicate_similarity")]
        duplicate_similarity: f64,

        #[serde(default = "default_max_chain_depth")]
        max_chain_depth: usize,

        #[serde(default = "default_max_transitive_chains")]
        max_transitive_chains: usize,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                thresholds,
                balance_factor,
                duplicate_similarity,
                max_chain_depth,
                max_transitive_chains,
            } => {
                let mut config = Self {
                    thresholds,
                    balance_factor: default_balance_factor(),
                    duplicate_similarity,
                    max_chain_depth: default_max_chain_depth(),
                    max_transitive_chains,
                };
                config.set_balance_factor(balance_factor);
                config.set_max_chain_depth(max_chain_depth);
                config
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            thresholds: config.thresholds,
            balance_factor: config.balance_factor,
            duplicate_similarity: config.duplicate_similarity,
            max_chain_depth: config.max_chain_depth,
            max_transitive_chains: config.max_transitive_chains,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nbalance_factor = 3.0\nmax_chain_depth = 6\n\n[thresholds]\nmin_density = 2.5\nmax_high_priority_gaps = 0\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!((config.balance_factor() - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.max_chain_depth(), 6);
        assert!((config.thresholds.min_density - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.thresholds.max_high_priority_gaps, 0);
        assert_eq!(config.thresholds.max_duplicate_candidates, 5);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        assert!(matches!(Config::load(&missing), Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmax_chain_depth = \"deep\"\n")
            .unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config: Config =
            toml::from_str("_version = \"1\"\nmax_chain_depth = 0\nbalance_factor = 0.5\n")
                .unwrap();
        assert_eq!(config.max_chain_depth(), 2);
        assert!((config.balance_factor() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_or_default(tmp.path()).unwrap(), Config::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Config::path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        std::fs::write(&path, "[thresholds]\nmin_density = 0.0\n").unwrap();
        assert!(matches!(
            Config::load_or_default(tmp.path()),
            Err(ConfigError::Parse(_))
        ));

        std::fs::write(&path, "_version = \"1\"\n[thresholds]\nmin_densty = 0.0\n").unwrap();
        assert!(matches!(
            Config::load_or_default(tmp.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = Config::default();
        config.thresholds.max_duplicate_candidates = 1;
        config.set_max_chain_depth(3);

        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
