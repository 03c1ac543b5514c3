//! Registration lookup protocols.
//!
//! The sweep only needs one capability from a registry source: turn a domain
//! into a [`RegistrationRecord`] or fail. [`RegistrationLookup`] is that
//! seam; [`WhoisClient`] is the implementation shipped with the library.

use crate::error::DomainSweepError;
use crate::types::RegistrationRecord;
use async_trait::async_trait;

/// WHOIS protocol implementation
pub mod whois;

pub use whois::{is_whois_available, parse_registration, parse_whois_date, WhoisClient};

/// A source of registration records.
///
/// Implementations report failures through the error variant:
/// - [`DomainSweepError::TransientLookup`] / [`DomainSweepError::Timeout`]
///   for connection-level trouble (retried)
/// - [`DomainSweepError::Decode`] for undecodable responses
/// - [`DomainSweepError::Provider`] for provider-side errors or "no data"
#[async_trait]
pub trait RegistrationLookup: Send + Sync {
    /// Look up the registration record for one domain.
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DomainSweepError>;
}
