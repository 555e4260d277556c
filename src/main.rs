// Main entry point for testomat-reporter

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use testomat_reporter::cli::Cli;
use testomat_reporter::commands::{
    handle_completion, handle_init_config, handle_show_config, run_relay,
};
use testomat_reporter::config;
use testomat_reporter::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose);
    debug!("Starting testomat-reporter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from file (if exists)
    let config = config::Config::load();

    if cli.config {
        handle_show_config(config.as_ref());
        return Ok(());
    }

    if let Some(config_file) = &cli.init_config {
        return handle_init_config(config_file);
    }

    if let Some(shell_type) = &cli.completion {
        return handle_completion(shell_type);
    }

    let config = config.unwrap_or_default();
    let results = run_relay(cli.get_relay_args(), &config, cli.verbose)?;
    info!(
        "Relayed {} test(s): {} passed, {} failed, {} skipped",
        results.total(),
        results.passed(),
        results.failed(),
        results.skipped()
    );

    if !results.all_passed() {
        std::process::exit(1);
    }

    Ok(())
}
