//! Serialized output of free domains.
//!
//! Workers finish in any order, so every write goes through one async mutex.
//! The guard is dropped on every exit path, including a failed write.

use crate::error::DomainSweepError;
use crate::types::OutputTarget;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Separator between entries in file output.
pub const FILE_DELIMITER: char = ';';

/// Destination for free domains, one writer at a time.
#[derive(Debug)]
pub struct OutputSink {
    target: OutputTarget,
    lock: Mutex<()>,
}

impl OutputSink {
    /// Create a sink for the given target. Nothing is touched on disk yet.
    pub fn new(target: OutputTarget) -> Self {
        Self {
            target,
            lock: Mutex::new(()),
        }
    }

    /// Shorthand for a stdout sink.
    pub fn stdout() -> Self {
        Self::new(OutputTarget::Stdout)
    }

    /// The configured target.
    pub fn target(&self) -> &OutputTarget {
        &self.target
    }

    /// Remove a leftover output file so the run starts from an empty target.
    ///
    /// A missing file is fine. Stdout targets are a no-op.
    pub async fn reset(&self) -> Result<(), DomainSweepError> {
        let OutputTarget::File(path) = &self.target else {
            return Ok(());
        };

        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed previous output file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainSweepError::file_error(
                path.display().to_string(),
                format!("Failed to remove previous output: {}", e),
            )),
        }
    }

    /// Write one free domain.
    ///
    /// Stdout gets one line per domain, flushed immediately. A file gets the
    /// domain alone when it is missing or empty, otherwise `;` + domain
    /// appended to the single line.
    pub async fn record(&self, domain: &str) -> Result<(), DomainSweepError> {
        let _guard = self.lock.lock().await;
        match &self.target {
            OutputTarget::Stdout => write_line(domain).await,
            OutputTarget::File(path) => append_entry(path, domain).await,
        }
    }
}

async fn write_line(domain: &str) -> Result<(), DomainSweepError> {
    let mut stdout = tokio::io::stdout();
    let line = format!("{}\n", domain);
    stdout
        .write_all(line.as_bytes())
        .await
        .map_err(|e| DomainSweepError::output("stdout", e.to_string()))?;
    stdout
        .flush()
        .await
        .map_err(|e| DomainSweepError::output("stdout", e.to_string()))
}

async fn append_entry(path: &Path, domain: &str) -> Result<(), DomainSweepError> {
    let display = path.display().to_string();

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| DomainSweepError::output(&display, e.to_string()))?;

    // An empty file, fresh or left by a failed write, takes the entry bare
    let first_entry = file
        .metadata()
        .await
        .map_err(|e| DomainSweepError::output(&display, e.to_string()))?
        .len()
        == 0;

    let entry = if first_entry {
        domain.to_string()
    } else {
        format!("{}{}", FILE_DELIMITER, domain)
    };

    file.write_all(entry.as_bytes())
        .await
        .map_err(|e| DomainSweepError::output(&display, e.to_string()))?;
    file.flush()
        .await
        .map_err(|e| DomainSweepError::output(&display, e.to_string()))
}
