//! Core data types for domain sweeps.
//!
//! This module defines the data structures shared by the expander, the
//! lookup seam, the classifier, the output sink and the batch scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Registration data extracted from one WHOIS lookup.
///
/// Owned by the call that produced it; never shared across workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationRecord {
    /// Every expiration timestamp the registry reported (some report several)
    pub expiration_dates: Vec<DateTime<Utc>>,

    /// Registrant contact, `None` when the record carries no registrant
    pub registrant: Option<String>,

    /// The sponsoring registrar, when present
    pub registrar: Option<String>,
}

impl RegistrationRecord {
    /// Whether the record carries a non-blank registrant contact.
    pub fn has_registrant(&self) -> bool {
        self.registrant
            .as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Availability classification for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// No active registration, the domain can be registered
    Free,
    /// Registered (future expiration or a registrant on file)
    Taken,
    /// The lookup failed in a way that retrying would not fix
    Unknown,
}

/// How literal text outside `( )` groups is treated during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralMode {
    /// Literal segments stay in place on every candidate: `(a,b).com` -> `a.com`, `b.com`
    #[default]
    Affix,
    /// Only the chosen alternatives are joined: `(a,b).com` -> `a`, `b`
    Discard,
}

/// Where free domains are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// One line per free domain on standard output
    Stdout,
    /// A single `;`-joined line in the given file
    File(PathBuf),
}

impl OutputTarget {
    /// Build a target from an optional CLI path (`None` or `"-"` means stdout).
    pub fn from_path(path: Option<&str>) -> Self {
        match path {
            None | Some("-") => OutputTarget::Stdout,
            Some(p) => OutputTarget::File(PathBuf::from(p)),
        }
    }
}

/// Configuration for a sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Number of candidates dispatched together before a join barrier
    /// Default: 50
    pub batch_size: usize,

    /// Total lookup attempts per domain (initial + retries)
    /// Default: 3
    pub max_attempts: u32,

    /// Backoff unit; the wait after attempt `n` is `backoff_unit * 2^n`
    /// Default: 1 second
    pub backoff_unit: Duration,

    /// Time budget for a single lookup attempt
    /// Default: 10 seconds
    pub lookup_timeout: Duration,

    /// Treatment of literal text outside groups
    /// Default: Affix
    pub literal_mode: LiteralMode,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
            lookup_timeout: Duration::from_secs(10),
            literal_mode: LiteralMode::Affix,
        }
    }
}

impl SweepConfig {
    /// Set the batch size, clamped to 1..=500.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, 500);
        self
    }

    /// Set the attempt budget, clamped to 1..=10.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.clamp(1, 10);
        self
    }

    /// Set the backoff unit.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Set the per-attempt lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the literal handling mode.
    pub fn with_literal_mode(mut self, mode: LiteralMode) -> Self {
        self.literal_mode = mode;
        self
    }
}

/// Snapshot handed to the progress callback after each batch drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Domains dispatched so far, through the batch that just drained
    pub dispatched: usize,
    /// Size of the full candidate list
    pub total: usize,
    /// 1-based index of the batch that just drained
    pub batch: usize,
}

/// Totals for a finished sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub batches: usize,
    pub free: usize,
    pub taken: usize,
    pub unknown: usize,
    /// Domains whose retries were exhausted, or whose worker died
    pub abandoned: usize,
    /// Free domains the sink failed to write
    pub write_failures: usize,
    pub elapsed: Duration,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Free => write!(f, "free"),
            Verdict::Taken => write!(f, "taken"),
            Verdict::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputTarget::Stdout => write!(f, "stdout"),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}
