//! # Domain Sweep Library
//!
//! Expands a bracket pattern into candidate domain names, looks each one up
//! over WHOIS and writes the ones that look unregistered to stdout or a
//! `;`-delimited file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_sweep_lib::{OutputSink, OutputTarget, SweepConfig, Sweeper, WhoisClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(OutputSink::new(OutputTarget::from_path(Some("free.csv"))));
//!     sink.reset().await?;
//!
//!     let sweeper = Sweeper::new(Arc::new(WhoisClient::new()), sink, SweepConfig::default());
//!     let summary = sweeper.run_pattern("(a,b)(1,2).com", |_| {}).await?;
//!
//!     println!("{} of {} free", summary.free, summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bracket patterns**: `(a,b)x(1,2).com` expands to the cartesian product
//! - **Batched concurrency**: one task per domain, batches joined before the next starts
//! - **Retry with backoff**: transient lookup failures retried with exponential waits
//! - **Serialized output**: free domains written by one writer at a time

// Re-export main public API types and functions
pub use classify::{classify, classify_lookup};
pub use config::{
    load_env_config, load_env_config_from, parse_duration_string, parse_literal_mode,
    ConfigManager, DefaultsConfig, EnvConfig, FileConfig, OutputConfig,
};
pub use error::DomainSweepError;
pub use protocols::{
    is_whois_available, parse_registration, parse_whois_date, RegistrationLookup, WhoisClient,
};
pub use retry::{check_with_retry, RetryOutcome, RetryPolicy};
pub use scheduler::Sweeper;
pub use sink::{OutputSink, FILE_DELIMITER};
pub use types::{
    LiteralMode, OutputTarget, Progress, RegistrationRecord, SweepConfig, SweepSummary, Verdict,
};

// Public modules
pub mod pattern;

pub use pattern::{estimate_pattern_count, expand_pattern};

// Internal modules
mod classify;
mod config;
mod error;
mod protocols;
mod retry;
mod scheduler;
mod sink;
mod types;

/// Convenience alias for results carrying [`DomainSweepError`].
pub type Result<T> = std::result::Result<T, DomainSweepError>;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reexports_resolve() {
        let candidates = expand_pattern("(a,b).com", LiteralMode::default()).unwrap();
        assert_eq!(candidates, vec!["a.com", "b.com"]);
        assert_eq!(estimate_pattern_count("(a,b)(1,2,3).com").unwrap(), 6);
        assert_eq!(FILE_DELIMITER, ';');
    }
}
