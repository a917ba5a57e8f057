use std::path::PathBuf;

mod audit;
mod spec;
mod status;
mod terminal;
mod validate;

use anyhow::Context as _;
use archmodel::{Config, Directory, SpecRegistry};
use audit::Audit;
use clap::ArgAction;
use spec::Spec;
use status::Status;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the model directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Load the specification from this directory instead of the builtin one
    #[arg(long = "spec", value_name = "DIR", global = true)]
    spec_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let context = Context::load(self.root, self.spec_dir.as_deref())?;

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(&context)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show element counts per layer (default)
    Status(Status),

    /// Check the model against the specification
    ///
    /// Exits with 1 if any errors are found. Warnings are reported but never
    /// fail the run.
    Validate(Validate),

    /// Analyse the quality of the model's relationships
    Audit(Audit),

    /// Inspect the specification
    #[command(subcommand)]
    Spec(Spec),
}

impl Command {
    fn run(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(context)?,
            Self::Validate(command) => command.run(context)?,
            Self::Audit(command) => command.run(context)?,
            Self::Spec(command) => command.run(context)?,
        }
        Ok(())
    }
}

/// Everything a command needs: the model root, the loaded specification and
/// the model's configuration.
#[derive(Debug)]
pub struct Context {
    root: PathBuf,
    registry: SpecRegistry,
    config: Config,
}

impl Context {
    fn load(root: PathBuf, spec: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let registry = match spec {
            Some(dir) => SpecRegistry::from_dir(dir)
                .with_context(|| format!("failed to load specification from {}", dir.display()))?,
            None => SpecRegistry::builtin().context("failed to load builtin specification")?,
        };
        let config = Config::load_or_default(&root).with_context(|| {
            format!("failed to load config from {}", Config::path(&root).display())
        })?;

        Ok(Self {
            root,
            registry,
            config,
        })
    }

    fn directory(&self) -> Directory<'_> {
        Directory::new(self.root.clone(), &self.registry)
    }
}
