//! Domain Sweep CLI Application
//!
//! Expands a bracket pattern into candidate domains, checks each one over
//! WHOIS and prints (or saves) the ones that look unregistered.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_sweep_lib::{
    estimate_pattern_count, expand_pattern, is_whois_available, load_env_config,
    parse_duration_string, ConfigManager, EnvConfig, FileConfig, LiteralMode, OutputSink,
    OutputTarget, SweepConfig, Sweeper, WhoisClient,
};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-sweep
#[derive(Parser, Debug)]
#[command(name = "domain-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Sweep bracket-pattern domain candidates and list the free ones")]
#[command(
    long_about = "Expand a bracket pattern such as '(get,try)acme.(com,io)' into candidate domains,\nlook each one up over WHOIS in concurrent batches and report the ones that look unregistered.\n\nFree domains go to stdout one per line, or to a ';'-delimited file with --output."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Bracket pattern, e.g. "(a,b)(1,2).com"
    #[arg(value_name = "PATTERN", help_heading = "Pattern")]
    pub pattern: String,

    /// Drop literal text outside groups (legacy expansion)
    #[arg(long = "legacy-literals", help_heading = "Pattern")]
    pub legacy_literals: bool,

    /// Print the expanded candidates without looking them up
    #[arg(long = "dry-run", help_heading = "Pattern")]
    pub dry_run: bool,

    /// Write free domains to FILE (';'-delimited) instead of stdout
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output"
    )]
    pub output: Option<String>,

    /// Print dry-run candidates as a JSON array
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Candidates checked concurrently per batch (default: 50, max: 500)
    #[arg(
        short = 'b',
        long = "batch-size",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub batch_size: Option<usize>,

    /// Allow patterns that expand past the 5000 candidate limit
    #[arg(long = "force", help_heading = "Performance")]
    pub force: bool,

    /// Lookup attempts per domain (default: 3, max: 10)
    #[arg(long = "attempts", value_name = "N", help_heading = "Performance")]
    pub attempts: Option<u32>,

    /// Backoff unit between retries, e.g. "1s", "500ms" (default: 1s)
    #[arg(long = "backoff", value_name = "DURATION", help_heading = "Performance")]
    pub backoff: Option<String>,

    /// Per-lookup timeout, e.g. "10s", "1m" (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Query this WHOIS server instead of the registry default
    #[arg(long = "whois-server", value_name = "HOST", help_heading = "Performance")]
    pub whois_server: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging for every lookup attempt
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging and run header
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything a sweep needs after config files, env vars and CLI args are merged.
#[derive(Debug, Clone)]
struct RunSettings {
    config: SweepConfig,
    output: OutputTarget,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            config: SweepConfig::default(),
            output: OutputTarget::Stdout,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);

    if let Err(e) = run_sweep(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.pattern.trim().is_empty() {
        return Err("Pattern must not be empty".to_string());
    }

    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 || batch_size > 500 {
            return Err("Batch size must be between 1 and 500".to_string());
        }
    }

    if let Some(attempts) = args.attempts {
        if attempts == 0 || attempts > 10 {
            return Err("Attempts must be between 1 and 10".to_string());
        }
    }

    for (flag, value) in [("--backoff", &args.backoff), ("--timeout", &args.timeout)] {
        if let Some(value) = value {
            if parse_duration_string(value).is_none() {
                return Err(format!(
                    "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
                    flag, value
                ));
            }
        }
    }

    if args.json && !args.dry_run {
        return Err("--json only applies to --dry-run output".to_string());
    }

    Ok(())
}

/// Install the stderr tracing subscriber; `RUST_LOG` overrides the flags.
fn init_logging(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(args.debug)
        .try_init();
}

/// Main sweep logic
async fn run_sweep(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_config(&args)?;
    let config = settings.config;

    // Syntax errors surface here, before anything is looked up or reset
    let estimated = estimate_pattern_count(&args.pattern)?;
    check_run_size(estimated, args.force)?;
    if estimated > ui::LARGE_RUN_THRESHOLD {
        ui::print_large_run_warning(estimated);
    }
    let candidates = expand_pattern(&args.pattern, config.literal_mode)?;

    if args.dry_run {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&candidates)?);
        } else {
            for candidate in &candidates {
                println!("{}", candidate);
            }
        }
        return Ok(());
    }

    if !is_whois_available().await {
        tracing::warn!("'whois' command not found; every lookup will resolve to unknown");
    }

    let sink = Arc::new(OutputSink::new(settings.output));
    sink.reset().await?;

    let lookup = Arc::new(build_whois_client(&args, config.lookup_timeout));
    let sweeper = Sweeper::new(lookup, Arc::clone(&sink), config);

    if args.verbose {
        ui::print_header(
            candidates.len(),
            sweeper.batch_count(candidates.len()),
            sweeper.config(),
            sink.target(),
        );
    }

    let summary = sweeper
        .run(&candidates, |progress| ui::print_progress(&progress))
        .await;

    ui::print_summary(&summary);
    Ok(())
}

/// Refuse oversized patterns before they are expanded, unless forced.
fn check_run_size(estimated: usize, force: bool) -> Result<(), String> {
    if estimated > ui::LARGE_RUN_THRESHOLD && !force {
        return Err(format!(
            "Pattern expands to {} candidates (limit: {}). Use --force to proceed",
            estimated,
            ui::LARGE_RUN_THRESHOLD
        ));
    }
    Ok(())
}

fn build_whois_client(args: &Args, timeout: Duration) -> WhoisClient {
    let client = WhoisClient::with_timeout(timeout);
    match &args.whois_server {
        Some(server) => client.with_server(server.clone()),
        None => client,
    }
}

/// Resolve settings: defaults < config file < DS_* env < CLI args.
fn build_config(args: &Args) -> Result<RunSettings, Box<dyn std::error::Error>> {
    let mut settings = RunSettings::default();
    let config_manager = ConfigManager::new();
    let env_config = load_env_config();

    // Step 1: Config file (explicit path replaces discovery)
    if let Some(explicit_config_path) = &args.config {
        tracing::info!(path = %explicit_config_path, "using config file from --config");
        let file_config = config_manager
            .load_file(explicit_config_path)
            .map_err(|e| {
                format!(
                    "Failed to load config file '{}': {}",
                    explicit_config_path, e
                )
            })?;
        settings = merge_file_config(settings, file_config);
    } else if let Some(env_config_path) = &env_config.config {
        tracing::info!(path = %env_config_path, "using config file from DS_CONFIG");
        let file_config = config_manager
            .load_file(env_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", env_config_path, e))?;
        settings = merge_file_config(settings, file_config);
    } else {
        settings = merge_file_config(settings, config_manager.discover_and_load());
    }

    // Step 2: Environment variables (DS_*)
    settings = apply_environment_config(settings, &env_config);

    // Step 3: CLI arguments (highest precedence)
    Ok(apply_cli_args(settings, args))
}

/// Merge FileConfig into the run settings
fn merge_file_config(mut settings: RunSettings, file_config: FileConfig) -> RunSettings {
    if let Some(defaults) = file_config.defaults {
        if let Some(batch_size) = defaults.batch_size {
            settings.config = settings.config.with_batch_size(batch_size);
        }
        if let Some(attempts) = defaults.max_attempts {
            settings.config = settings.config.with_max_attempts(attempts);
        }
        if let Some(backoff) = defaults.backoff.as_deref().and_then(parse_duration_string) {
            settings.config = settings.config.with_backoff_unit(backoff);
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
            settings.config = settings.config.with_lookup_timeout(timeout);
        }
        if let Some(mode) = defaults.literal_mode {
            settings.config = settings.config.with_literal_mode(mode);
        }
    }

    if let Some(file) = file_config.output.and_then(|output| output.file) {
        settings.output = OutputTarget::from_path(Some(&file));
    }

    settings
}

/// Apply validated DS_* values to the run settings
fn apply_environment_config(mut settings: RunSettings, env_config: &EnvConfig) -> RunSettings {
    if let Some(batch_size) = env_config.batch_size {
        settings.config = settings.config.with_batch_size(batch_size);
    }
    if let Some(attempts) = env_config.max_attempts {
        settings.config = settings.config.with_max_attempts(attempts);
    }
    if let Some(backoff) = env_config.backoff {
        settings.config = settings.config.with_backoff_unit(backoff);
    }
    if let Some(timeout) = env_config.timeout {
        settings.config = settings.config.with_lookup_timeout(timeout);
    }
    if let Some(mode) = env_config.literal_mode {
        settings.config = settings.config.with_literal_mode(mode);
    }
    if let Some(output) = &env_config.output {
        settings.output = OutputTarget::from_path(Some(output));
    }

    settings
}

/// Apply CLI arguments; only flags the user actually passed override.
fn apply_cli_args(mut settings: RunSettings, args: &Args) -> RunSettings {
    if let Some(batch_size) = args.batch_size {
        settings.config = settings.config.with_batch_size(batch_size);
    }
    if let Some(attempts) = args.attempts {
        settings.config = settings.config.with_max_attempts(attempts);
    }
    if let Some(backoff) = args.backoff.as_deref().and_then(parse_duration_string) {
        settings.config = settings.config.with_backoff_unit(backoff);
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration_string) {
        settings.config = settings.config.with_lookup_timeout(timeout);
    }
    if args.legacy_literals {
        settings.config = settings.config.with_literal_mode(LiteralMode::Discard);
    }
    if let Some(output) = &args.output {
        settings.output = OutputTarget::from_path(Some(output));
    }

    settings
}
