//! WHOIS protocol implementation for registration lookups.
//!
//! This module drives the system's `whois` command and turns its free-form
//! text into a [`RegistrationRecord`]. WHOIS output differs between
//! registries, so the parser looks for the common field spellings and
//! ignores everything else.

use super::RegistrationLookup;
use crate::error::DomainSweepError;
use crate::types::RegistrationRecord;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;

lazy_static::lazy_static! {
    static ref EXPIRATION_FIELD: Regex = Regex::new(
        r"(?im)^[ \t]*(?:registry expiry date|registrar registration expiration date|expiration date|expiry date|expiration time|expires on|expires|expire|paid-till|renewal date)[ \t]*:[ \t]*(.*)$"
    ).expect("expiration regex is valid");

    static ref REGISTRANT_FIELD: Regex = Regex::new(
        r"(?im)^[ \t]*(?:registrant|registrant name|registrant organization|registrant organisation|registrant contact name)[ \t]*:[ \t]*(.*)$"
    ).expect("registrant regex is valid");

    static ref REGISTRAR_FIELD: Regex = Regex::new(
        r"(?im)^[ \t]*(?:registrar|registrar name|sponsoring registrar)[ \t]*:[ \t]*(.*)$"
    ).expect("registrar regex is valid");
}

/// Substrings of whois diagnostics that indicate a dropped or reset connection.
const TRANSIENT_MARKERS: &[&str] = &[
    "connection reset",
    "reset by peer",
    "broken pipe",
    "connection closed",
    "connection aborted",
    "connection timed out",
    "timed out",
    "temporarily unavailable",
    "temporary failure",
];

/// Substrings that mean the provider cannot answer for this domain at all.
const PROVIDER_ERROR_MARKERS: &[&str] = &[
    "no whois server is known",
    "no whois server",
    "invalid tld",
    "unknown tld",
    "tld not found",
    "no such tld",
    "invalid domain extension",
    "this tld has no whois server",
];

/// Substrings that mean the server throttled us.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "query rate exceeded",
    "quota exceeded",
    "limit exceeded",
    "throttled",
    "try again later",
];

/// WHOIS client backed by the system's `whois` command.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// Program to run, `whois` outside of tests
    program: String,
    /// Timeout for a single WHOIS query
    timeout: Duration,
    /// Explicit WHOIS server (`whois -h <server>`), if any
    server: Option<String>,
}

impl WhoisClient {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create a new WHOIS client with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            program: "whois".to_string(),
            timeout,
            server: None,
        }
    }

    /// Query a specific WHOIS server instead of letting `whois` pick one.
    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = Some(server.into());
        self
    }

    #[cfg(test)]
    fn with_program<P: Into<String>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Timeout applied to each query.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Run the whois command and return its decoded stdout.
    async fn execute_whois_command(&self, domain: &str) -> Result<String, DomainSweepError> {
        let mut command = Command::new(&self.program);
        if let Some(server) = &self.server {
            command.arg("-h").arg(server);
        }
        command.arg(domain).kill_on_drop(true);

        let output = command
            .output()
            .await
            .map_err(|e| io_failure(domain, &e))?;

        interpret_output(
            domain,
            output.status.success(),
            output.stdout,
            &output.stderr,
        )
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationLookup for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DomainSweepError> {
        let response =
            match tokio::time::timeout(self.timeout, self.execute_whois_command(domain)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(DomainSweepError::timeout(
                        format!("WHOIS query for {}", domain),
                        self.timeout,
                    ))
                }
            };

        let lowered = response.to_lowercase();
        if let Some(marker) = find_marker(&lowered, RATE_LIMIT_MARKERS) {
            return Err(DomainSweepError::transient(
                domain,
                format!("rate limited ({})", marker),
            ));
        }
        if let Some(marker) = find_marker(&lowered, PROVIDER_ERROR_MARKERS) {
            return Err(DomainSweepError::provider(domain, marker));
        }

        Ok(parse_registration(&response))
    }
}

fn find_marker<'a>(text: &str, markers: &[&'a str]) -> Option<&'a str> {
    markers.iter().copied().find(|m| text.contains(m))
}

/// Map an I/O error from spawning or talking to `whois`.
fn io_failure(domain: &str, err: &std::io::Error) -> DomainSweepError {
    match err.kind() {
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::TimedOut
        | ErrorKind::Interrupted => DomainSweepError::transient(domain, err.to_string()),
        ErrorKind::NotFound => DomainSweepError::provider(
            domain,
            "failed to execute whois command. Make sure 'whois' is installed.",
        ),
        _ => DomainSweepError::provider(domain, format!("failed to execute whois: {}", err)),
    }
}

/// Turn a finished whois run into its response text.
///
/// A non-zero exit with a transient diagnostic on stderr is transient even
/// when stdout holds a partial response. Other non-zero exits are accepted
/// as long as something was printed.
fn interpret_output(
    domain: &str,
    success: bool,
    stdout: Vec<u8>,
    stderr: &[u8],
) -> Result<String, DomainSweepError> {
    if !success {
        let stderr = String::from_utf8_lossy(stderr).to_lowercase();
        if find_marker(&stderr, TRANSIENT_MARKERS).is_some() {
            return Err(DomainSweepError::transient(domain, stderr.trim()));
        }
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(process_failure(domain, &stderr));
        }
    }

    String::from_utf8(stdout)
        .map_err(|e| DomainSweepError::decode(domain, format!("response is not UTF-8: {}", e)))
}

/// Map a failed whois run (non-zero exit, nothing on stdout) from its stderr.
fn process_failure(domain: &str, stderr: &str) -> DomainSweepError {
    let message = stderr.trim();
    if find_marker(stderr, TRANSIENT_MARKERS).is_some() {
        DomainSweepError::transient(domain, message)
    } else if message.is_empty() {
        DomainSweepError::provider(domain, "whois exited with an error and no output")
    } else {
        DomainSweepError::provider(domain, message)
    }
}

/// Extract the fields the classifier needs from raw WHOIS text.
///
/// Expiration values that cannot be parsed are skipped. Responses that say
/// "no match" simply have none of these fields and parse to an empty record.
pub fn parse_registration(raw: &str) -> RegistrationRecord {
    let expiration_dates = EXPIRATION_FIELD
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| {
            let value = m.as_str().trim();
            let parsed = parse_whois_date(value);
            if parsed.is_none() && !value.is_empty() {
                tracing::debug!(value, "unparsed expiration date");
            }
            parsed
        })
        .collect();

    RegistrationRecord {
        expiration_dates,
        registrant: first_field(&REGISTRANT_FIELD, raw),
        registrar: first_field(&REGISTRAR_FIELD, raw),
    }
}

fn first_field(re: &Regex, raw: &str) -> Option<String> {
    re.captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .find(|v| !v.is_empty())
}

/// Parse the date formats registries commonly use.
///
/// Accepts RFC 3339 (`2026-08-13T04:00:00Z`), `YYYY-MM-DD[ HH:MM:SS]`,
/// dotted and slashed variants, and `DD-Mon-YYYY`. A trailing `UTC` or
/// `(UTC)` is ignored; naive values are taken as UTC.
pub fn parse_whois_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value
        .trim()
        .trim_end_matches("(UTC)")
        .trim_end_matches("UTC")
        .trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y.%m.%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%d-%b-%Y %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d-%b-%Y", "%d.%m.%Y", "%d/%m/%Y",
    ];
    // Date-only values, possibly followed by a time we could not read
    let date_part = value.split_whitespace().next().unwrap_or(value);
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Check if the system has a whois command.
///
/// Some builds reject `--version`; a successful spawn is enough.
pub async fn is_whois_available() -> bool {
    Command::new("whois").arg("--version").output().await.is_ok()
}
