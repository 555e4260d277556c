// Configuration file handling

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::state::TestMeta;

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = ".testomatrc.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reporter: ReporterConfig,

    #[serde(default)]
    pub run: RunConfig,

    /// Per-test metadata keyed by full test name
    #[serde(default)]
    pub tests: BTreeMap<String, TestMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Testomat.io service url
    #[serde(default)]
    pub url: Option<String>,

    /// Prefix of generated run titles
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Fail the relay when a reporting call fails
    #[serde(default)]
    pub strict: bool,

    /// How suites map to runs
    #[serde(default)]
    pub scope: RunScope,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            url: None,
            title_prefix: default_title_prefix(),
            timeout: default_timeout(),
            strict: false,
            scope: RunScope::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunConfig {
    /// Run title, overrides the generated one
    #[serde(default)]
    pub title: Option<String>,
}

/// How suites map to Testomat.io runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunScope {
    /// Every suite creates and finishes its own run
    #[default]
    Suite,
    /// One run spans the whole input stream
    Invocation,
}

impl std::str::FromStr for RunScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suite" => Ok(Self::Suite),
            "invocation" => Ok(Self::Invocation),
            other => Err(format!(
                "unknown scope '{}', expected 'suite' or 'invocation'",
                other
            )),
        }
    }
}

// Default values
pub const ENV_TESTOMATIO_URL: &str = "TESTOMATIO_URL";

pub fn default_url() -> String {
    String::from("https://app.testomat.io")
}

pub fn default_title_prefix() -> String {
    String::from("Rust Test Run")
}

pub fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Option<Self> {
        // Check locations in order:
        // 1. .testomatrc.toml (current directory)
        // 2. ~/.testomatrc.toml (home directory)

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }

        paths
            .iter()
            .find(|path| path.exists())
            .and_then(|path| Self::load_from_file(path))
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };
        let config = Self::parse(&content);
        if config.is_none() {
            warn!("Ignoring invalid configuration file {}", path.display());
        }
        config
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }

    /// Generate default configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }

    /// Service url: config file, then `TESTOMATIO_URL`, then the public service
    pub fn service_url(&self) -> String {
        self.reporter
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| {
                std::env::var(ENV_TESTOMATIO_URL)
                    .ok()
                    .filter(|u| !u.trim().is_empty())
            })
            .unwrap_or_else(default_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[reporter]
url = "http://localhost:3000"
title_prefix = "Nightly"
timeout = 5
strict = true
scope = "invocation"

[run]
title = "Release 1.2"

[tests."math::tests::addition"]
title = "Verify basic addition operation"
id = "T12345"

[tests."math::tests::untitled"]
id = "T12346"
"#;

        let config = Config::parse(toml).expect("Failed to parse config");
        assert_eq!(
            config.reporter.url.as_deref(),
            Some("http://localhost:3000")
        );
        assert_eq!(config.reporter.title_prefix, "Nightly");
        assert_eq!(config.reporter.timeout, 5);
        assert!(config.reporter.strict);
        assert_eq!(config.reporter.scope, RunScope::Invocation);
        assert_eq!(config.run.title.as_deref(), Some("Release 1.2"));
        assert_eq!(
            config.tests["math::tests::addition"].id.as_deref(),
            Some("T12345")
        );
        assert!(config.tests["math::tests::untitled"].title.is_none());
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(Config::parse("[reporter]\nscope = \"sometimes\"").is_none());
    }

    #[test]
    fn test_service_url_from_file_wins() {
        let mut config = Config::default();
        config.reporter.url = Some("http://localhost:3000".to_string());
        assert_eq!(config.service_url(), "http://localhost:3000");
    }

    #[test]
    fn test_run_scope_from_str() {
        assert_eq!("suite".parse::<RunScope>(), Ok(RunScope::Suite));
        assert_eq!("invocation".parse::<RunScope>(), Ok(RunScope::Invocation));
        assert!("global".parse::<RunScope>().is_err());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config::default();
        let parsed = Config::parse(&config.to_toml()).expect("default config must parse");
        assert_eq!(parsed.reporter.timeout, 30);
        assert_eq!(parsed.reporter.scope, RunScope::Suite);
    }
}
