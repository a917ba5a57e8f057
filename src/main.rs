//! Command-line interface for checking and auditing architecture models.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() {
    if let Err(e) = Cli::parse().run() {
        eprintln!("Error: {e:#}");
        std::process::exit(2);
    }
}
