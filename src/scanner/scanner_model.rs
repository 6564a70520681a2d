use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scanner::fingerprint::FingerprintDepth;
use crate::scanner::matcher::DEFAULT_NAME_PATTERN;
use crate::scanner::traverse::DEFAULT_MAX_VISITED;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTrigger {
    /// First scan after injection, once mounting settled.
    Settle,
    /// Coalesced framework commit notifications.
    Commit,
    /// Coalesced DOM mutations.
    DomMutation,
    /// Explicit refresh from the inspector; bypasses change suppression.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_settle_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_commit_debounce_ms")]
    pub commit_debounce_ms: u64,

    #[serde(default = "default_mutation_debounce_ms")]
    pub mutation_debounce_ms: u64,

    /// Upper bound on how long a burst can postpone its scan.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,

    #[serde(default = "default_max_visited")]
    pub max_visited_nodes: usize,

    #[serde(default)]
    pub fingerprint: FingerprintDepth,

    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_ms(),
            commit_debounce_ms: default_commit_debounce_ms(),
            mutation_debounce_ms: default_mutation_debounce_ms(),
            max_wait_ms: default_max_wait_ms(),
            max_visited_nodes: default_max_visited(),
            fingerprint: FingerprintDepth::default(),
            name_pattern: default_name_pattern(),
        }
    }
}

impl ScannerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn commit_debounce(&self) -> Duration {
        Duration::from_millis(self.commit_debounce_ms)
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

// Serde default helpers
fn default_settle_ms() -> u64 { 400 }
fn default_commit_debounce_ms() -> u64 { 100 }
fn default_mutation_debounce_ms() -> u64 { 200 }
fn default_max_wait_ms() -> u64 { 500 }
fn default_max_visited() -> usize { DEFAULT_MAX_VISITED }
fn default_name_pattern() -> String { DEFAULT_NAME_PATTERN.to_string() }
