use clap::Parser;
use tracing::instrument;

use super::{
    Context,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show element counts per layer and the relationship total")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    format: OutputFormat,

    /// Print a single summary line for scripting
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

struct LayerCount<'a> {
    number: u8,
    id: &'a str,
    count: usize,
}

impl Status {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let snapshot = context.directory().load()?;

        let per_layer = snapshot.count_by_layer();
        let counts: Vec<LayerCount> = context
            .registry
            .layers()
            .iter()
            .map(|layer| LayerCount {
                number: layer.number,
                id: &layer.id,
                count: per_layer.get(layer.id.as_str()).copied().unwrap_or_default(),
            })
            .collect();
        let total = snapshot.len();
        let relationships = snapshot.relationship_count();
        let model = snapshot.metadata();

        match self.format {
            OutputFormat::Json => {
                use serde_json::json;

                let layers: Vec<_> = counts
                    .iter()
                    .map(|c| json!({ "layer": c.id, "number": c.number, "count": c.count }))
                    .collect();
                let output = json!({
                    "model": { "name": model.name, "version": model.version },
                    "layers": layers,
                    "elements": total,
                    "relationships": relationships,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table if self.quiet => {
                println!("elements={total} relationships={relationships}");
            }
            OutputFormat::Table => {
                if total == 0 {
                    println!("No elements found under {}.", context.root.display());
                    return Ok(());
                }
                Self::output_table(&model.name, &model.version, &counts, total, relationships);
            }
        }

        Ok(())
    }

    fn output_table(
        name: &str,
        version: &str,
        counts: &[LayerCount],
        total: usize,
        relationships: usize,
    ) {
        println!("{} {}", name.info(), version.dim());
        println!("{}", "──────────────────────────".dim());

        if is_narrow() {
            for c in counts {
                println!("{}: {}", c.id, c.count);
            }
        } else {
            println!("{:>2}  {:<14} {:>8}", "#", "Layer", "Elements");
            for c in counts {
                let count = format!("{:>8}", c.count);
                let count = if c.count == 0 { count.dim() } else { count };
                println!("{:>2}  {:<14} {count}", c.number, c.id);
            }
        }

        println!("{}", "──────────────────────────".dim());
        println!("Elements:      {total}");
        println!("Relationships: {relationships}");
    }
}
