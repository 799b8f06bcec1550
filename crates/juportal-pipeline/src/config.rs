use std::path::{Path, PathBuf};
use std::time::Duration;

use juportal_ai::{BatchConfig, RetryPolicy, RuleValidator};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Run configuration. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// CSV label table; the built-in table is used when absent or unreadable.
    pub mapping_table: Option<PathBuf>,
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub accept_threshold: f32,
    pub min_text_chars: usize,
    pub confident_threshold: f32,
    /// ECLI decision types that are dropped instead of emitted.
    pub skip_decision_types: Vec<String>,
    /// Stage-1 worker threads; the rayon default when unset.
    pub workers: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mapping_table: None,
            batch_size: 10,
            max_concurrency: 5,
            request_timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
            accept_threshold: 0.8,
            min_text_chars: 30,
            confident_threshold: 0.7,
            skip_decision_types: vec!["CONC".into()],
            workers: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path).map_err(|source| PipelineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&bytes).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            batch_size: self.batch_size.max(1),
            max_concurrency: self.max_concurrency.max(1),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry: RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            ),
            accept_threshold: self.accept_threshold,
        }
    }

    pub fn rule_validator(&self) -> RuleValidator {
        RuleValidator::new(self.min_text_chars, self.confident_threshold)
    }
}
