use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::InspectorError;
use crate::scanner::{fingerprint::FingerprintDepth, scanner_model::ScannerConfig};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-inspector",
    version,
    about = "Extract form state from a page's render tree and relay it to an inspector"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-inspector.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a page fixture once and print the discovered forms
    Scan {
        /// Page fixture (JSON)
        #[arg(long)]
        page: String,

        /// Change detection depth: shallow, deep or off
        #[arg(long)]
        fingerprint: Option<String>,
    },

    /// Run the full relay over a page fixture and a sequence of commits
    Simulate {
        /// Page fixture (JSON)
        #[arg(long)]
        page: String,

        /// Render tree committed after the initial scan (JSON node list); repeatable
        #[arg(long = "commit")]
        commits: Vec<String>,

        /// Tab id the page is observed under
        #[arg(long, default_value_t = 1)]
        tab: u32,

        /// Change detection depth: shallow, deep or off
        #[arg(long)]
        fingerprint: Option<String>,

        /// Append coordinator transitions to this JSONL file
        #[arg(long)]
        trace: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-inspector.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Delay before the Relay-Source reconnects after losing its channel.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    pub trace_file: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            trace_file: None,
        }
    }
}

fn default_retry_delay_ms() -> u64 { 1000 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("form-inspector.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_fingerprint(raw: &str) -> Result<FingerprintDepth, InspectorError> {
    match raw.to_lowercase().as_str() {
        "shallow" => Ok(FingerprintDepth::Shallow),
        "deep" => Ok(FingerprintDepth::Deep),
        "off" | "none" => Ok(FingerprintDepth::Off),
        other => Err(InspectorError::Config(format!(
            "unknown fingerprint depth '{}' (expected shallow, deep or off)",
            other
        ))),
    }
}

/// CLI flags win over the config file.
pub fn resolve_scanner_config(
    config: &AppConfig,
    fingerprint: Option<&str>,
) -> Result<ScannerConfig, InspectorError> {
    let mut scanner = config.scanner.clone();
    if let Some(raw) = fingerprint {
        scanner.fingerprint = parse_fingerprint(raw)?;
    }
    Ok(scanner)
}
