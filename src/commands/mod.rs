// Commands module - handles CLI command execution

use anyhow::Result;

pub mod relay;

pub use relay::run_relay;

use crate::api::{Credential, ENV_TESTOMATIO};
use crate::config::{self, Config};

/// Handle shell completion
pub fn handle_completion(shell_type: &str) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{Shell, generate};

    let shell = match shell_type.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" => Shell::PowerShell,
        _ => {
            anyhow::bail!(
                "Unsupported shell: {}. Supported: bash, zsh, fish, elvish, powershell",
                shell_type
            );
        }
    };

    let mut cmd = crate::cli::Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout();

    generate(shell, &mut cmd, name, &mut stdout);

    Ok(())
}

/// Print the effective configuration
pub fn handle_show_config(loaded: Option<&Config>) {
    let effective = loaded.cloned().unwrap_or_default();

    println!("Current configuration:");
    match loaded {
        Some(_) => println!("\n  Configuration file loaded:"),
        None => {
            println!("\n  No configuration file loaded, using defaults");
            println!(
                "  Create one with: testomat-reporter --init-config {}",
                config::CONFIG_FILE_NAME
            );
        }
    }
    println!("    Service url: {}", effective.service_url());
    println!("    Title prefix: {}", effective.reporter.title_prefix);
    println!("    Timeout: {}s", effective.reporter.timeout);
    println!("    Strict: {}", effective.reporter.strict);
    println!("    Scope: {:?}", effective.reporter.scope);
    if let Some(ref title) = effective.run.title {
        println!("    Run title: {}", title);
    }
    if !effective.tests.is_empty() {
        println!("    Test metadata entries: {}", effective.tests.len());
    }

    println!("\n  Environment variables:");
    match Credential::from_env() {
        Some(credential) => println!("    {}: {}", ENV_TESTOMATIO, credential.masked()),
        None => println!("    {}: not set (reporting disabled)", ENV_TESTOMATIO),
    }
    match std::env::var(config::ENV_TESTOMATIO_URL) {
        Ok(url) => println!("    {}: {}", config::ENV_TESTOMATIO_URL, url),
        Err(_) => println!(
            "    {}: not set (default: {})",
            config::ENV_TESTOMATIO_URL,
            config::default_url()
        ),
    }

    print_precedence();
}

/// Write a default configuration file
pub fn handle_init_config(path: &std::path::Path) -> Result<()> {
    let toml_content = Config::default().to_toml();
    std::fs::write(path, toml_content)?;
    println!("Configuration file created: {}", path.display());
    println!("\nYou can now edit the file to customize your settings.");
    print_precedence();
    Ok(())
}

fn print_precedence() {
    println!("\nConfiguration precedence:");
    println!("  1. Command-line arguments (highest)");
    println!("  2. Configuration file");
    println!("  3. Environment variables");
    println!("  4. Built-in defaults (lowest)");
}
