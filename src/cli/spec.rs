use archmodel::SpecNodeId;
use clap::Parser;
use tracing::instrument;

use super::{
    Context,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, clap::Subcommand)]
pub enum Spec {
    /// List the layers and their node types
    Layers(Layers),

    /// List the predicates a node type may use as a relationship source
    Predicates(Predicates),
}

impl Spec {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Self::Layers(command) => command.run(context),
            Self::Predicates(command) => command.run(context),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Parser)]
pub struct Layers {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    format: OutputFormat,
}

impl Layers {
    #[instrument(level = "debug", skip_all)]
    fn run(self, context: &Context) -> anyhow::Result<()> {
        let registry = &context.registry;

        match self.format {
            OutputFormat::Json => {
                use serde_json::json;

                let layers: Vec<_> = registry
                    .layers()
                    .iter()
                    .map(|layer| {
                        let node_types: Vec<_> = layer
                            .node_type_ids
                            .iter()
                            .map(SpecNodeId::node_type)
                            .collect();
                        json!({
                            "number": layer.number,
                            "id": layer.id,
                            "name": layer.name,
                            "nodeTypes": node_types,
                        })
                    })
                    .collect();
                let output = json!({ "version": registry.spec_version(), "layers": layers });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!(
                    "{} {}",
                    "Specification".info(),
                    registry.spec_version().dim()
                );
                let narrow = is_narrow();
                for layer in registry.layers() {
                    let node_types: Vec<_> = layer
                        .node_type_ids
                        .iter()
                        .map(SpecNodeId::node_type)
                        .collect();
                    if narrow {
                        println!("{:>2} {}", layer.number, layer.id);
                        for node_type in node_types {
                            println!("     {node_type}");
                        }
                    } else {
                        println!(
                            "{:>2}  {:<14} {}",
                            layer.number,
                            layer.id,
                            node_types.join(", ").dim()
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Predicates {
    /// Source node type, as `{layer}.{type}`
    node_type: SpecNodeId,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    format: OutputFormat,
}

impl Predicates {
    #[instrument(level = "debug", skip_all, fields(node_type = %self.node_type))]
    fn run(self, context: &Context) -> anyhow::Result<()> {
        let registry = &context.registry;
        if registry.node_type(&self.node_type).is_none() {
            anyhow::bail!("unknown node type '{}'", self.node_type);
        }

        let rules = registry.valid_relationships(&self.node_type, None, None);

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            }
            OutputFormat::Table => {
                if rules.is_empty() {
                    println!("{} has no outgoing relationships.", self.node_type);
                    return Ok(());
                }
                for predicate in registry.valid_predicates_for_source(&self.node_type) {
                    println!("{}", predicate.info());
                    for rule in rules.iter().filter(|rule| &rule.predicate == predicate) {
                        let marker = if rule.required { " (required)" } else { "" };
                        println!(
                            "  → {} {}{}",
                            rule.destination_spec_node_id,
                            rule.strength.to_string().dim(),
                            marker.warning()
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
