//! Availability decision rule.
//!
//! Expiration evidence outranks registrant evidence: a registration that
//! expires in the future means the domain is taken no matter what the
//! contact section says.

use crate::error::DomainSweepError;
use crate::types::{RegistrationRecord, Verdict};
use chrono::{DateTime, Utc};

/// Classify a registration record as of `now`.
pub fn classify(record: &RegistrationRecord, now: DateTime<Utc>) -> Verdict {
    if record.expiration_dates.iter().any(|expires| *expires > now) {
        return Verdict::Taken;
    }

    if record.has_registrant() {
        Verdict::Taken
    } else {
        Verdict::Free
    }
}

/// Classify the result of a lookup that did not fail transiently.
///
/// Decode and provider failures become [`Verdict::Unknown`]. Transient
/// failures should have been handled by the retry controller; if one
/// reaches this point it is also treated as unknown.
pub fn classify_lookup(
    result: &Result<RegistrationRecord, DomainSweepError>,
    now: DateTime<Utc>,
) -> Verdict {
    match result {
        Ok(record) => classify(record, now),
        Err(_) => Verdict::Unknown,
    }
}
