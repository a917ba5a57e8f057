use std::process;

use archmodel::{
    ValidationReport, ValidationRunner, ValidationScope,
    domain::{Finding, Severity},
};
use clap::Parser;
use tracing::instrument;

use super::{Context, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Validate the model against the specification")]
pub struct Validate {
    /// Only check elements in these layers (comma-separated layer ids)
    #[arg(long, value_name = "LAYERS", value_delimiter = ',')]
    layers: Vec<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: OutputFormat,

    /// Only print the summary line
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Validate {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let scope = if self.layers.is_empty() {
            ValidationScope::All
        } else {
            ValidationScope::layers(&context.registry, self.layers.iter().map(String::as_str))?
        };

        let snapshot = context.directory().load()?;
        let report = ValidationRunner::new(&context.registry).run(&snapshot, &scope);

        match self.format {
            OutputFormat::Text => self.output_text(&report, &scope),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        if !report.is_valid() {
            process::exit(1);
        }

        Ok(())
    }

    fn output_text(&self, report: &ValidationReport, scope: &ValidationScope) {
        if !self.quiet {
            for finding in &report.findings {
                println!("{}", format_finding(finding));
            }
            if !report.findings.is_empty() {
                println!();
            }
        }

        let summary = format!(
            "{} error(s), {} warning(s) in {scope}",
            report.error_count, report.warning_count
        );
        if report.is_valid() {
            println!("{} {summary}", "✓".success());
        } else {
            println!("{} {summary}", "✗".failure());
        }
    }
}

fn format_finding(finding: &Finding) -> String {
    let severity = match finding.severity {
        Severity::Error => "error".failure(),
        Severity::Warning => "warning".warning(),
    };
    let validator = format!("[{}]", finding.validator).dim();
    match &finding.element_id {
        Some(id) => format!("{severity} {validator} {id}: {}", finding.message),
        None => format!("{severity} {validator} {}", finding.message),
    }
}
