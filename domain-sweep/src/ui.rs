//! Display logic for the domain-sweep CLI.
//!
//! Everything here writes to stderr so stdout stays reserved for the
//! free-domain stream.

use console::{style, Term};
use domain_sweep_lib::{OutputTarget, Progress, SweepConfig, SweepSummary};
use std::time::Duration;

/// Candidate counts above this need `--force`.
pub const LARGE_RUN_THRESHOLD: usize = 5_000;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a verbose run.
pub fn print_header(total: usize, batches: usize, config: &SweepConfig, target: &OutputTarget) {
    let term = Term::stderr();
    let _ = term.write_line(&format!(
        "{} {} {}",
        style("domain-sweep").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!("- Sweeping {} in {}", plural(total, "domain"), plural(batches, "batch"))).dim(),
    ));
    let _ = term.write_line(
        &style(format!(
            "Batch size: {} | Attempts: {} | Backoff: {} | Timeout: {} | Output: {}",
            config.batch_size,
            config.max_attempts,
            format_duration(config.backoff_unit),
            format_duration(config.lookup_timeout),
            target
        ))
        .dim()
        .to_string(),
    );
}

/// Warn before expanding a forced, very large pattern.
pub fn print_large_run_warning(total: usize) {
    let _ = Term::stderr().write_line(&format!(
        "{} pattern expands to {} candidates, this will take a while",
        style("Warning:").yellow().bold(),
        total
    ));
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Plain progress line, e.g. `Progress: 50 / 120`.
pub fn format_progress(progress: &Progress) -> String {
    format!("Progress: {} / {}", progress.dispatched, progress.total)
}

/// Print one progress line after a batch drains.
pub fn print_progress(progress: &Progress) {
    let _ = Term::stderr().write_line(&format_progress(progress));
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Summary line without styling.
pub fn format_summary(summary: &SweepSummary) -> String {
    let mut line = format!(
        "{} checked in {} | {} free | {} taken | {} unknown | {} abandoned",
        plural(summary.total, "domain"),
        format_duration(summary.elapsed),
        summary.free,
        summary.taken,
        summary.unknown,
        summary.abandoned,
    );
    if summary.write_failures > 0 {
        line.push_str(&format!(" | {} not written", summary.write_failures));
    }
    line
}

/// Print the final summary; styled with a divider on a terminal, plain otherwise.
pub fn print_summary(summary: &SweepSummary) {
    let term = Term::stderr();
    if !term.is_term() {
        let _ = term.write_line(&format_summary(summary));
        return;
    }

    let _ = term.write_line(&style("─".repeat(52)).dim().to_string());
    let _ = term.write_line(&format!(
        "{} {} {} {} {} {} {} {} {}",
        style(plural(summary.total, "domain")).bold(),
        style(format!("in {}", format_duration(summary.elapsed))).dim(),
        style("|").dim(),
        style(format!("{} free", summary.free)).green(),
        style("|").dim(),
        style(format!("{} taken", summary.taken)).red(),
        style("|").dim(),
        style(format!("{} unknown", summary.unknown)).yellow(),
        style(format!("({} abandoned)", summary.abandoned)).dim(),
    ));
    if summary.write_failures > 0 {
        let _ = term.write_line(&format!(
            "{} {} free domains could not be written",
            style("Warning:").yellow().bold(),
            summary.write_failures
        ));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn plural(count: usize, noun: &str) -> String {
    match (count, noun) {
        (1, _) => format!("1 {}", noun),
        (_, "batch") => format!("{} batches", count),
        _ => format!("{} {}s", count, noun),
    }
}

/// Human duration: `850ms`, `4.2s`, `3m 05s`.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
