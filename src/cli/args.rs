// CLI argument definitions using Clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::adapter::InputFormat;
use crate::config::RunScope;

/// Relay Rust test results to Testomat.io
#[derive(Parser, Debug)]
#[command(name = "testomat-reporter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Relay test lifecycle events to Testomat.io",
    long_about = "Reads a test event stream and reports every test to Testomat.io.\n\n\
                  cargo test -- -Z unstable-options --format json | testomat-reporter --echo\n\n\
                  Reporting is enabled by the TESTOMATIO environment variable."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // Flattened so that `testomat-reporter results.json` relays directly
    #[command(flatten)]
    pub relay_args: RelayArgs,

    /// Enable verbose debug output
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Show current configuration and exit
    #[arg(long, default_value_t = false)]
    pub config: bool,

    /// Create default configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,

    /// Print shell completion (bash, zsh, fish, elvish, powershell)
    #[arg(long, value_name = "SHELL_TYPE", value_parser = ["bash", "zsh", "fish", "elvish", "powershell"])]
    pub completion: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relay a test event stream (default)
    Relay(RelayArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RelayArgs {
    /// Event stream to read; stdin when omitted or `-`
    #[arg(required = false)]
    pub input: Option<PathBuf>,

    /// Input format (libtest, events)
    #[arg(short = 'f', long, default_value = "libtest")]
    pub format: String,

    /// Run title (overrides suite titles and the generated title)
    #[arg(short = 't', long)]
    pub title: Option<String>,

    /// How suites map to runs (suite, invocation)
    #[arg(long)]
    pub scope: Option<String>,

    /// Fail when a reporting call fails
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Copy the input stream to stdout
    #[arg(short = 'e', long, default_value_t = false)]
    pub echo: bool,

    /// Do not print per-test lines and the summary
    #[arg(short = 'q', long, default_value_t = false)]
    pub quiet: bool,

    /// Parse and summarize without contacting Testomat.io
    #[arg(short = 'd', long, default_value_t = false)]
    pub dry_run: bool,
}

impl Cli {
    /// Helper to get effective RelayArgs
    pub fn get_relay_args(&self) -> &RelayArgs {
        match &self.command {
            Some(Commands::Relay(args)) => args,
            None => &self.relay_args,
        }
    }
}

impl RelayArgs {
    pub fn input_format(&self) -> Result<InputFormat, String> {
        self.format.parse()
    }

    /// Scope from the command line, if given
    pub fn run_scope(&self) -> Result<Option<RunScope>, String> {
        self.scope.as_deref().map(str::parse).transpose()
    }

    /// Input path, `None` for stdin
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }
}
