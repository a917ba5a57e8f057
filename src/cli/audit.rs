use std::{
    fmt::{self, Write as _},
    path::PathBuf,
    process,
};

use anyhow::Context as _;
use archmodel::{
    AuditOrchestrator, AuditReport, ThresholdPolicy,
    analysis::{Classification, GapPriority, ThresholdBreach},
};
use clap::Parser;
use tracing::instrument;

use super::{Context, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Audit relationship coverage, duplication, gaps, balance and connectivity")]
pub struct Audit {
    /// Restrict the per-layer sections to one layer
    #[arg(long, value_name = "LAYER")]
    layer: Option<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Exit with 1 if any quality threshold is breached
    #[arg(long)]
    threshold: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl Audit {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let report = AuditOrchestrator::new(&context.registry, &context.config)
            .run(&context.directory(), self.layer.as_deref())?;

        let rendered = match self.format {
            OutputFormat::Text => render_text(&report)?,
            OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
            OutputFormat::Markdown => render_markdown(&report)?,
        };

        match &self.output {
            Some(path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                eprintln!("Report written to {}", path.display());
            }
            None => print!("{rendered}"),
        }

        if self.threshold {
            let breaches = ThresholdPolicy::new(context.config.thresholds.clone()).evaluate(&report);
            report_breaches(&breaches);
            if !breaches.is_empty() {
                process::exit(1);
            }
        }

        Ok(())
    }
}

fn report_breaches(breaches: &[ThresholdBreach]) {
    if breaches.is_empty() {
        eprintln!("{} all quality thresholds met", "✓".success());
        return;
    }
    eprintln!(
        "{} {} quality threshold(s) breached",
        "✗".failure(),
        breaches.len()
    );
    for breach in breaches {
        eprintln!("  {breach}");
    }
}

fn render_text(report: &AuditReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let stats = &report.connectivity.stats;

    writeln!(
        out,
        "Audit of {} {} ({})",
        report.model.name, report.model.version, report.timestamp
    )?;
    if let Some(layer) = &report.layer {
        writeln!(out, "Layer: {layer}")?;
    }

    writeln!(out, "\nCoverage")?;
    writeln!(
        out,
        "  {:<14} {:>10} {:>8} {:>12}",
        "Layer", "Isolation", "Density", "Utilization"
    )?;
    for c in &report.coverage {
        writeln!(
            out,
            "  {:<14} {:>9.1}% {:>8.2} {:>11.1}%",
            c.layer,
            c.isolation_percentage,
            c.relationships_per_node_type,
            c.predicate_utilization * 100.0
        )?;
    }

    writeln!(out, "\nDuplicates: {}", report.duplicates.len())?;
    for d in &report.duplicates {
        writeln!(
            out,
            "  {} → {} [{}] {}",
            d.source,
            d.destination,
            d.predicates.join(", "),
            d.reason
        )?;
    }

    writeln!(
        out,
        "\nGaps: {} high, {} low",
        report.gap_count(GapPriority::High),
        report.gap_count(GapPriority::Low)
    )?;
    for gap in report.gaps.iter().filter(|g| g.priority == GapPriority::High) {
        writeln!(
            out,
            "  {} --{}--> {}",
            gap.source_type, gap.predicate, gap.destination_type
        )?;
    }

    let flagged: Vec<_> = report
        .balance
        .iter()
        .filter(|b| b.classification != Classification::Balanced)
        .collect();
    writeln!(out, "\nImbalanced node types: {}", flagged.len())?;
    for b in flagged {
        writeln!(
            out,
            "  {} {:.2} (layer median {:.2}) {}",
            b.node_type, b.density, b.layer_median, b.classification
        )?;
    }

    writeln!(out, "\nConnectivity")?;
    writeln!(out, "  Nodes:              {}", stats.node_count)?;
    writeln!(out, "  Edges:              {}", stats.edge_count)?;
    writeln!(out, "  Components:         {}", stats.connected_components)?;
    writeln!(out, "  Largest component:  {}", stats.largest_component_size)?;
    writeln!(out, "  Isolated nodes:     {}", stats.isolated_nodes)?;
    writeln!(out, "  Average degree:     {:.2}", stats.average_degree)?;
    writeln!(out, "  Transitive chains:  {}", stats.transitive_chain_count)?;

    Ok(out)
}

fn render_markdown(report: &AuditReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let stats = &report.connectivity.stats;

    writeln!(
        out,
        "# Architecture audit: {} {}\n",
        report.model.name, report.model.version
    )?;
    writeln!(out, "Generated {}", report.timestamp)?;
    if let Some(layer) = &report.layer {
        writeln!(out, "\nScoped to layer `{layer}`.")?;
    }

    writeln!(out, "\n## Coverage\n")?;
    writeln!(
        out,
        "| Layer | Isolation % | Relationships / node type | Predicate utilization |"
    )?;
    writeln!(out, "|---|---:|---:|---:|")?;
    for c in &report.coverage {
        writeln!(
            out,
            "| {} | {:.1} | {:.2} | {:.1}% |",
            c.layer,
            c.isolation_percentage,
            c.relationships_per_node_type,
            c.predicate_utilization * 100.0
        )?;
    }

    writeln!(out, "\n## Gaps\n")?;
    for (priority, title) in [(GapPriority::High, "High priority"), (GapPriority::Low, "Low priority")] {
        let gaps: Vec<_> = report.gaps.iter().filter(|g| g.priority == priority).collect();
        writeln!(out, "### {title} ({})\n", gaps.len())?;
        for gap in gaps {
            writeln!(
                out,
                "- `{}` --{}--> `{}`",
                gap.source_type, gap.predicate, gap.destination_type
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Duplicates\n")?;
    if report.duplicates.is_empty() {
        writeln!(out, "None found.")?;
    }
    for d in &report.duplicates {
        writeln!(
            out,
            "- `{}` → `{}`: {} ({})",
            d.source,
            d.destination,
            d.predicates.join(", "),
            d.reason
        )?;
    }

    writeln!(out, "\n## Balance\n")?;
    let flagged: Vec<_> = report
        .balance
        .iter()
        .filter(|b| b.classification != Classification::Balanced)
        .collect();
    if flagged.is_empty() {
        writeln!(out, "All node types are balanced.")?;
    } else {
        writeln!(out, "| Node type | Density | Layer median | Classification |")?;
        writeln!(out, "|---|---:|---:|---|")?;
        for b in flagged {
            writeln!(
                out,
                "| `{}` | {:.2} | {:.2} | {} |",
                b.node_type, b.density, b.layer_median, b.classification
            )?;
        }
    }

    writeln!(out, "\n## Connectivity\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|---|---:|")?;
    writeln!(out, "| Nodes | {} |", stats.node_count)?;
    writeln!(out, "| Edges | {} |", stats.edge_count)?;
    writeln!(out, "| Connected components | {} |", stats.connected_components)?;
    writeln!(out, "| Largest component | {} |", stats.largest_component_size)?;
    writeln!(out, "| Isolated nodes | {} |", stats.isolated_nodes)?;
    writeln!(out, "| Average degree | {:.2} |", stats.average_degree)?;
    writeln!(out, "| Transitive chains | {} |", stats.transitive_chain_count)?;

    Ok(out)
}
