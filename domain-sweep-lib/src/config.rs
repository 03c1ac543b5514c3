//! Configuration file parsing and management.
//!
//! This module loads sweep settings from TOML files and `DS_*` environment
//! variables. Merging with CLI arguments happens in the CLI crate; the
//! precedence is CLI > environment > local file > global file > XDG file >
//! built-in defaults.

use crate::error::DomainSweepError;
use crate::types::LiteralMode;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for sweep options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default sweep settings that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Candidates per batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Lookup attempts per domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Backoff unit (as string, e.g. "1s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<String>,

    /// Per-lookup timeout (as string, e.g. "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// "affix" or "discard"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal_mode: Option<LiteralMode>,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// File to collect free domains in; stdout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainSweepError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainSweepError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainSweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainSweepError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that exist but fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        // Lowest precedence first
        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                }
            }
        }

        if loaded_files.len() > 1 {
            tracing::info!(
                files = ?loaded_files,
                "multiple config files found, later files take precedence"
            );
        }

        merged_config
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-sweep.toml", "./.domain-sweep.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-sweep.toml", "domain-sweep.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-sweep").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.batch_size.is_some() {
                        lower_defaults.batch_size = higher_defaults.batch_size;
                    }
                    if higher_defaults.max_attempts.is_some() {
                        lower_defaults.max_attempts = higher_defaults.max_attempts;
                    }
                    if higher_defaults.backoff.is_some() {
                        lower_defaults.backoff = higher_defaults.backoff;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.literal_mode.is_some() {
                        lower_defaults.literal_mode = higher_defaults.literal_mode;
                    }
                    Some(lower_defaults)
                }
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            output: match (lower.output, higher.output) {
                (Some(lower_output), Some(higher_output)) => Some(OutputConfig {
                    file: higher_output.file.or(lower_output.file),
                }),
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainSweepError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(batch_size) = defaults.batch_size {
            if batch_size == 0 || batch_size > 500 {
                return Err(DomainSweepError::config(
                    "Batch size must be between 1 and 500",
                ));
            }
        }

        if let Some(attempts) = defaults.max_attempts {
            if attempts == 0 || attempts > 10 {
                return Err(DomainSweepError::config(
                    "Max attempts must be between 1 and 10",
                ));
            }
        }

        for (name, value) in [("backoff", &defaults.backoff), ("timeout", &defaults.timeout)] {
            if let Some(value) = value {
                if parse_duration_string(value).is_none() {
                    return Err(DomainSweepError::config(format!(
                        "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
                        name, value
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub batch_size: Option<usize>,
    pub max_attempts: Option<u32>,
    pub backoff: Option<Duration>,
    pub timeout: Option<Duration>,
    pub literal_mode: Option<LiteralMode>,
    pub output: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from `DS_*` environment variables.
///
/// Invalid values are ignored with a warning.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`], reading variables through `get`.
pub fn load_env_config_from<F>(get: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = get("DS_BATCH_SIZE") {
        match val.trim().parse::<usize>() {
            Ok(size) if (1..=500).contains(&size) => {
                tracing::debug!(batch_size = size, "using DS_BATCH_SIZE");
                env_config.batch_size = Some(size);
            }
            _ => tracing::warn!(value = %val, "invalid DS_BATCH_SIZE, must be 1-500"),
        }
    }

    if let Some(val) = get("DS_ATTEMPTS") {
        match val.trim().parse::<u32>() {
            Ok(attempts) if (1..=10).contains(&attempts) => {
                tracing::debug!(attempts, "using DS_ATTEMPTS");
                env_config.max_attempts = Some(attempts);
            }
            _ => tracing::warn!(value = %val, "invalid DS_ATTEMPTS, must be 1-10"),
        }
    }

    if let Some(val) = get("DS_BACKOFF") {
        match parse_duration_string(&val) {
            Some(backoff) => env_config.backoff = Some(backoff),
            None => tracing::warn!(value = %val, "invalid DS_BACKOFF, use '500ms', '1s', '2m'"),
        }
    }

    if let Some(val) = get("DS_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => tracing::warn!(value = %val, "invalid DS_TIMEOUT, use '5s', '30s', '2m'"),
        }
    }

    if let Some(val) = get("DS_LITERAL_MODE") {
        match parse_literal_mode(&val) {
            Some(mode) => env_config.literal_mode = Some(mode),
            None => tracing::warn!(value = %val, "invalid DS_LITERAL_MODE, use affix/discard"),
        }
    }

    if let Some(path) = get("DS_OUTPUT") {
        if !path.trim().is_empty() {
            env_config.output = Some(path.trim().to_string());
        }
    }

    if let Some(path) = get("DS_CONFIG") {
        if !path.trim().is_empty() {
            env_config.config = Some(path.trim().to_string());
        }
    }

    env_config
}

/// Parse "affix" / "discard" (case-insensitive).
pub fn parse_literal_mode(value: &str) -> Option<LiteralMode> {
    match value.trim().to_lowercase().as_str() {
        "affix" => Some(LiteralMode::Affix),
        "discard" | "legacy" => Some(LiteralMode::Discard),
        _ => None,
    }
}

/// Parse a duration string like "500ms", "5s", "2m"; bare numbers are seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m.saturating_mul(60)))
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_duration_string() {
        assert_eq!(parse_duration_string("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration_string("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration_string("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_duration_string(" 3S "), Some(Duration::from_secs(3)));
        assert_eq!(parse_duration_string("soon"), None);
    }

    #[test]
    fn test_parse_literal_mode() {
        assert_eq!(parse_literal_mode("AFFIX"), Some(LiteralMode::Affix));
        assert_eq!(parse_literal_mode("discard"), Some(LiteralMode::Discard));
        assert_eq!(parse_literal_mode("keep"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
batch_size = 25
max_attempts = 5
backoff = "500ms"
timeout = "20s"
literal_mode = "discard"

[output]
file = "free.csv"
"#,
        );

        let config = ConfigManager::new().load_file(temp_file.path()).unwrap();
        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.batch_size, Some(25));
        assert_eq!(defaults.max_attempts, Some(5));
        assert_eq!(defaults.backoff.as_deref(), Some("500ms"));
        assert_eq!(defaults.timeout.as_deref(), Some("20s"));
        assert_eq!(defaults.literal_mode, Some(LiteralMode::Discard));
        assert_eq!(config.output.unwrap().file.as_deref(), Some("free.csv"));
    }

    #[test]
    fn test_invalid_batch_size() {
        let temp_file = write_config("[defaults]\nbatch_size = 0\n");
        assert!(ConfigManager::new().load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_backoff_format() {
        let temp_file = write_config("[defaults]\nbackoff = \"whenever\"\n");
        let err = ConfigManager::new().load_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("backoff"));
    }

    #[test]
    fn test_unknown_literal_mode_rejected() {
        let temp_file = write_config("[defaults]\nliteral_mode = \"keep\"\n");
        assert!(ConfigManager::new().load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigManager::new()
            .load_file("/definitely/not/here/domain-sweep.toml")
            .unwrap_err();
        assert!(matches!(err, DomainSweepError::FileError { .. }));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new();

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                batch_size: Some(10),
                backoff: Some("1s".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                file: Some("lower.csv".to_string()),
            }),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                batch_size: Some(40),
                literal_mode: Some(LiteralMode::Discard),
                ..Default::default()
            }),
            output: Some(OutputConfig { file: None }),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.batch_size, Some(40)); // Higher wins
        assert_eq!(defaults.backoff.as_deref(), Some("1s")); // Lower preserved
        assert_eq!(defaults.literal_mode, Some(LiteralMode::Discard));
        assert_eq!(merged.output.unwrap().file.as_deref(), Some("lower.csv"));
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DS_BATCH_SIZE", "20"),
            ("DS_ATTEMPTS", "4"),
            ("DS_BACKOFF", "250ms"),
            ("DS_TIMEOUT", "3s"),
            ("DS_LITERAL_MODE", "discard"),
            ("DS_OUTPUT", "found.csv"),
        ]);
        let env_config = load_env_config_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(env_config.batch_size, Some(20));
        assert_eq!(env_config.max_attempts, Some(4));
        assert_eq!(env_config.backoff, Some(Duration::from_millis(250)));
        assert_eq!(env_config.timeout, Some(Duration::from_secs(3)));
        assert_eq!(env_config.literal_mode, Some(LiteralMode::Discard));
        assert_eq!(env_config.output.as_deref(), Some("found.csv"));
        assert_eq!(env_config.config, None);
    }

    #[test]
    fn test_env_config_ignores_invalid_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DS_BATCH_SIZE", "0"),
            ("DS_ATTEMPTS", "lots"),
            ("DS_BACKOFF", "later"),
            ("DS_OUTPUT", "   "),
        ]);
        let env_config = load_env_config_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(env_config.batch_size, None);
        assert_eq!(env_config.max_attempts, None);
        assert_eq!(env_config.backoff, None);
        assert_eq!(env_config.output, None);
    }
}
