// Relay command - feed an event stream to the reporters

use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::adapter::{MetadataRegistry, Relay};
use crate::api::{Credential, HttpTransport, ReportingClient};
use crate::cli::RelayArgs;
use crate::config::Config;
use crate::report::{ConsoleReporter, Reporter, TestomatReporter};
use crate::session::ReportingSession;
use crate::state::TestResults;

/// Relay one stream; returns the tally of relayed tests
pub fn run_relay(args: &RelayArgs, config: &Config, verbose: bool) -> Result<TestResults> {
    let format = args.input_format().map_err(|e| anyhow!(e))?;
    let scope = args
        .run_scope()
        .map_err(|e| anyhow!(e))?
        .unwrap_or(config.reporter.scope);
    let strict = args.strict || config.reporter.strict;

    let credential = if args.dry_run {
        info!("Dry-run mode enabled, nothing is sent to Testomat.io");
        None
    } else {
        Credential::from_env()
    };

    let client = ReportingClient::new(
        &config.service_url(),
        credential,
        HttpTransport::new(Duration::from_secs(config.reporter.timeout)),
    )
    .context("Invalid Testomat.io service url")?;
    let session = Arc::new(
        ReportingSession::new(client).with_title_prefix(config.reporter.title_prefix.clone()),
    );

    // Setup Reporters
    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
    reporters.push(Box::new(
        TestomatReporter::new(session)
            .with_scope(scope)
            .with_strict(strict)
            .with_run_title(args.title.clone().or_else(|| config.run.title.clone())),
    ));
    if !args.quiet {
        reporters.push(Box::new(ConsoleReporter::new(verbose)));
    }

    let metadata = MetadataRegistry::new(config.tests.clone());
    if !metadata.is_empty() {
        info!("Loaded metadata for {} test(s)", metadata.len());
    }

    let mut relay = Relay::new(reporters).with_metadata(metadata);
    if args.echo {
        relay = relay.with_echo(Box::new(io::stdout()));
    }

    let mut parser = format.parser();
    let results = match args.input_path() {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open event stream {}", path.display()))?;
            relay.run(BufReader::new(file), parser.as_mut())?
        }
        None => relay.run(io::stdin().lock(), parser.as_mut())?,
    };

    if results.total() == 0 {
        warn!("No test results found in the input stream");
    }

    Ok(results)
}
