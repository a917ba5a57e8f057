use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::{
    analysis::{
        BalanceAssessor, ConnectivityAnalyzer, ConnectivityReport, CoverageAnalyzer,
        DuplicateCandidate, DuplicateDetector, Gap, GapAnalyzer, GapPriority, LayerCoverage,
        NodeTypeBalance, RelationshipCatalog, RelationshipGraph,
    },
    domain::Config,
    registry::SpecRegistry,
    storage::{self, ModelSnapshot, ModelSource},
};

/// Name and version of the audited model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model name.
    pub name: String,
    /// Model version.
    pub version: String,
}

/// The complete result of an audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// RFC 3339 UTC time the report was produced.
    pub timestamp: String,
    /// The audited model.
    pub model: ModelInfo,
    /// The layer the audit was restricted to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Per-layer coverage.
    pub coverage: Vec<LayerCoverage>,
    /// Redundant relationships.
    pub duplicates: Vec<DuplicateCandidate>,
    /// Specified but unrealised relationships.
    pub gaps: Vec<Gap>,
    /// Per-node-type relationship density.
    pub balance: Vec<NodeTypeBalance>,
    /// Whole-graph structure.
    pub connectivity: ConnectivityReport,
}

impl AuditReport {
    /// Number of gaps with the given priority.
    #[must_use]
    pub fn gap_count(&self, priority: GapPriority) -> usize {
        self.gaps.iter().filter(|gap| gap.priority == priority).count()
    }
}

/// Errors that abort an audit before any report is produced.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The model could not be read.
    #[error(transparent)]
    Load(#[from] storage::LoadError),

    /// The requested layer does not exist.
    #[error("unknown layer '{0}'")]
    UnknownLayer(String),
}

/// Runs every analysis over one model snapshot and assembles the report.
#[derive(Debug, Clone, Copy)]
pub struct AuditOrchestrator<'r> {
    registry: &'r SpecRegistry,
    config: &'r Config,
}

impl<'r> AuditOrchestrator<'r> {
    /// Creates an orchestrator using `config` for analyzer tuning.
    #[must_use]
    pub const fn new(registry: &'r SpecRegistry, config: &'r Config) -> Self {
        Self { registry, config }
    }

    /// Loads a snapshot from `source` and audits it, optionally restricted to
    /// one layer.
    ///
    /// # Errors
    ///
    /// Fails without a report if the layer is unknown or the model cannot be
    /// loaded.
    #[instrument(skip(self, source))]
    pub fn run(
        &self,
        source: &impl ModelSource,
        layer: Option<&str>,
    ) -> Result<AuditReport, AuditError> {
        if let Some(layer) = layer {
            if self.registry.layer(layer).is_none() {
                return Err(AuditError::UnknownLayer(layer.to_string()));
            }
        }
        let snapshot = source.snapshot()?;
        Ok(self.audit(&snapshot, layer))
    }

    /// Audits an already loaded snapshot.
    ///
    /// An unknown `layer` matches nothing, yielding empty layer sections.
    #[must_use]
    pub fn audit(&self, snapshot: &ModelSnapshot, layer: Option<&str>) -> AuditReport {
        let catalog = RelationshipCatalog::build(snapshot);
        let graph = RelationshipGraph::build(snapshot);

        let coverage = CoverageAnalyzer::new(self.registry, &catalog);
        let duplicates = DuplicateDetector::new(self.registry, self.config.duplicate_similarity());
        let gaps = GapAnalyzer::new(self.registry, &catalog);
        let balance = BalanceAssessor::new(
            self.registry,
            snapshot,
            &catalog,
            self.config.balance_factor(),
        );

        let (coverage, duplicates, gaps, balance) = match layer {
            None => (
                coverage.analyze(),
                duplicates.detect(&catalog),
                gaps.analyze(),
                balance.assess(),
            ),
            Some(layer) => {
                let spec = self.registry.layer(layer);
                (
                    spec.map(|spec| coverage.analyze_layer(spec))
                        .into_iter()
                        .collect(),
                    duplicates.detect_in_layer(&catalog, layer),
                    gaps.analyze_layer(layer),
                    spec.map(|spec| balance.assess_layer(spec))
                        .unwrap_or_default(),
                )
            }
        };

        let connectivity = ConnectivityAnalyzer::new(
            &graph,
            self.config.max_chain_depth(),
            self.config.max_transitive_chains(),
        )
        .analyze();

        tracing::info!(
            duplicates = duplicates.len(),
            gaps = gaps.len(),
            components = connectivity.stats.connected_components,
            "Audit complete"
        );

        let metadata = snapshot.metadata();
        AuditReport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            model: ModelInfo {
                name: metadata.name.clone(),
                version: metadata.version.clone(),
            },
            layer: layer.map(str::to_string),
            coverage,
            duplicates,
            gaps,
            balance,
            connectivity,
        }
    }
}
