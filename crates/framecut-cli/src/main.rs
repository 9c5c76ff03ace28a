// crates/framecut-cli/src/main.rs
//
// `framecut` binary. Exit codes: 0 success, 1 failure, 130 cancelled.

mod cli;
mod commands;
mod helpers;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::Outcome;

/// RUST_LOG when set, otherwise a level picked from --verbose / --quiet.
/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging(verbose: bool, quiet: bool) {
    let fallback = match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _         => "warn",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Export(args)  => commands::export::run(args, cli.quiet),
        Command::Preview(args) => commands::preview::run(args),
        Command::Probe(args)   => commands::probe::run(args),
        Command::Filters       => Ok(commands::filters::run()),
    };

    let outcome = result.unwrap_or_else(|e| {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        Outcome::Failed
    });
    std::process::exit(outcome.exit_code());
}
