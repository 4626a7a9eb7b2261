//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.contact-digest.toml` files. The API credential is deliberately not
//! part of the file format.

use crate::analysis::{DEFAULT_BUCKET_LABEL, DEFAULT_BUCKET_THRESHOLD};
use crate::fetch::{RetryPolicy, DEFAULT_PAGE_SIZE};
use crate::pipeline::{DatasetOptions, OutputOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".contact-digest.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

/// CRM API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the CRM API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Per-request transport timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.brevo.com/v3".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

/// Page retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries per page on HTTP 429 or 5xx.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit in milliseconds; retry n waits n times this.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    300
}

/// Artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the datasets document is written.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Pretty-print the JSON.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            pretty: true,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("public/datasets.json")
}

fn default_true() -> bool {
    true
}

/// Dataset derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Groups smaller than this are folded into the bucket.
    #[serde(default = "default_bucket_threshold")]
    pub bucket_threshold: u64,

    #[serde(default = "default_bucket_label")]
    pub bucket_label: String,

    #[serde(default = "default_institution_attribute")]
    pub institution_attribute: String,

    #[serde(default = "default_course_attribute")]
    pub course_attribute: String,

    #[serde(default = "default_birth_date_attribute")]
    pub birth_date_attribute: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            bucket_threshold: default_bucket_threshold(),
            bucket_label: default_bucket_label(),
            institution_attribute: default_institution_attribute(),
            course_attribute: default_course_attribute(),
            birth_date_attribute: default_birth_date_attribute(),
        }
    }
}

fn default_bucket_threshold() -> u64 {
    DEFAULT_BUCKET_THRESHOLD
}

fn default_bucket_label() -> String {
    DEFAULT_BUCKET_LABEL.to_string()
}

fn default_institution_attribute() -> String {
    "ATENEO".to_string()
}

fn default_course_attribute() -> String {
    "CORSO_ACQUISTATO".to_string()
}

fn default_birth_date_attribute() -> String {
    "DATA_DI_NASCITA".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must load. Without one, `default_path` is used when
    /// present and defaults otherwise. A file that exists but does not parse
    /// is always an error, never a silent fallback to defaults.
    pub fn resolve(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config from: {}", path.display());
            return Self::load(path);
        }

        if default_path.exists() {
            info!("Loaded default config from {}", default_path.display());
            Self::load(default_path)
        } else {
            debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.source.api_url = url.clone();
        }
        if let Some(page_size) = args.page_size {
            self.source.page_size = page_size;
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if let Some(max_retries) = args.max_retries {
            self.retry.max_retries = max_retries;
        }
        if let Some(delay) = args.base_delay_ms {
            self.retry.base_delay_ms = delay;
        }
        if let Some(ref output) = args.output {
            self.output.path = output.clone();
        }
        if let Some(threshold) = args.bucket_threshold {
            self.aggregation.bucket_threshold = threshold;
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
        }
    }

    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            bucket_threshold: self.aggregation.bucket_threshold,
            bucket_label: self.aggregation.bucket_label.clone(),
            institution_attribute: self.aggregation.institution_attribute.clone(),
            course_attribute: self.aggregation.course_attribute.clone(),
            birth_date_attribute: self.aggregation.birth_date_attribute.clone(),
        }
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            path: self.output.path.clone(),
            pretty: self.output.pretty,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
