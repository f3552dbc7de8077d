//! gh-bootstrap-repository binary entry point.

use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

use gh_bootstrap::cli::{self, Cli};
use gh_bootstrap::ui::output::{self, Verbosity};

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "GH_BOOTSTRAP_LOG";

fn main() {
    let cli = Cli::parse_args();
    init_tracing(Verbosity::from_flags(cli.quiet, cli.debug));

    if let Err(err) = cli::run(cli) {
        output::error(cli::format_error(&err));
        eprintln!();
        let _ = Cli::command().write_help(&mut std::io::stderr());
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
