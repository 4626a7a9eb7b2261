//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Contact Digest - PII-free CRM statistics for a static dashboard
///
/// Downloads every contact from the CRM, keeps only institution, course,
/// birth date and list memberships, and writes aggregate counts to a
/// single JSON file.
///
/// Examples:
///   BREVO_API_KEY=... contact-digest
///   contact-digest --output site/datasets.json --bucket-threshold 10
///   contact-digest --dry-run
///   contact-digest --show
///   contact-digest --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CRM API key
    ///
    /// Required for every mode that contacts the CRM.
    #[arg(long, env = "BREVO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output file for the datasets document [default: public/datasets.json]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// CRM API base URL [default: https://api.brevo.com/v3]
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Contacts requested per page [default: 1000]
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<usize>,

    /// Retries per page on rate limiting or server errors [default: 5]
    #[arg(long, value_name = "COUNT")]
    pub max_retries: Option<u32>,

    /// Backoff unit in milliseconds; retry n waits n times this [default: 300]
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Groups smaller than this are folded into the "other" bucket [default: 5]
    #[arg(long, value_name = "COUNT")]
    pub bucket_threshold: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .contact-digest.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Build the datasets and print them instead of writing the file
    #[arg(long, conflicts_with = "show")]
    pub dry_run: bool,

    /// Print the dashboard view of the existing output file
    ///
    /// Does not contact the CRM and needs no API key.
    #[arg(long)]
    pub show: bool,

    /// Entries per dataset in the dashboard view
    #[arg(long, default_value = "10", value_name = "COUNT")]
    pub top: usize,

    /// Generate a default .contact-digest.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.top == 0 {
            return Err("--top must be at least 1".to_string());
        }

        Ok(())
    }

    /// The API credential, required before any network call.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(ConfigError::MissingCredential),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            api_key: Some("xkeysib-test".to_string()),
            output: None,
            api_url: None,
            page_size: None,
            max_retries: None,
            base_delay_ms: None,
            timeout: None,
            bucket_threshold: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            show: false,
            top: 10,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.api_url = Some("ftp://crm".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.page_size = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_require_api_key() {
        let mut args = make_args();
        assert_eq!(args.require_api_key().unwrap(), "xkeysib-test");

        args.api_key = Some("   ".to_string());
        assert!(matches!(
            args.require_api_key(),
            Err(ConfigError::MissingCredential)
        ));

        args.api_key = None;
        assert!(args.require_api_key().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
