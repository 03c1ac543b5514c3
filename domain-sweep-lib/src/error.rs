//! Error handling for domain sweeps.
//!
//! One enum covers every way a sweep can fail, from a malformed pattern
//! (fatal, before any lookup) to per-domain lookup and output failures
//! (never fatal, the scheduler absorbs them).

use std::fmt;
use std::time::Duration;

/// Main error type for domain sweep operations.
#[derive(Debug, Clone)]
pub enum DomainSweepError {
    /// Malformed bracket pattern (unbalanced or nested parentheses, empty group)
    PatternSyntax { pattern: String, reason: String },

    /// Network-level failure expected to clear up on retry (connection reset/dropped)
    TransientLookup { domain: String, message: String },

    /// The lookup returned bytes that could not be decoded
    Decode { domain: String, message: String },

    /// The lookup provider reported an error or had no data for the domain
    Provider { domain: String, message: String },

    /// A lookup attempt ran past its time budget
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Writing a free domain to the output target failed
    Output { path: String, message: String },

    /// Configuration errors (invalid settings, unparsable TOML, etc.)
    ConfigError { message: String },

    /// File I/O errors outside the output sink (config files, resets)
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl DomainSweepError {
    /// Create a new pattern syntax error.
    pub fn pattern_syntax<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        Self::PatternSyntax {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a new transient lookup error.
    pub fn transient<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::TransientLookup {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new decode error.
    pub fn decode<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::Decode {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new provider error.
    pub fn provider<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::Provider {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new output error.
    pub fn output<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Output {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is a transient lookup failure worth retrying.
    ///
    /// Only connection-level failures qualify. Decode and provider errors
    /// will fail the same way on every attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientLookup { .. } | Self::Timeout { .. })
    }

    /// Check if this error is a lookup failure that resolves to an unknown verdict.
    pub fn is_unrecoverable_lookup(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Provider { .. })
    }
}

impl fmt::Display for DomainSweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PatternSyntax { pattern, reason } => {
                write!(f, "Invalid pattern '{}': {}", pattern, reason)
            }
            Self::TransientLookup { domain, message } => {
                write!(f, "Transient lookup failure for '{}': {}", domain, message)
            }
            Self::Decode { domain, message } => {
                write!(f, "Could not decode lookup response for '{}': {}", domain, message)
            }
            Self::Provider { domain, message } => {
                write!(f, "Lookup provider error for '{}': {}", domain, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Output { path, message } => {
                write!(f, "Output error at '{}': {}", path, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DomainSweepError {}

impl From<std::io::Error> for DomainSweepError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
