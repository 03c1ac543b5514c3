//! Bracket-pattern expansion engine.
//!
//! Turns a compact combinatorial expression into the full list of candidate
//! domains.
//!
//! # Pattern Syntax
//!
//! - `(a,b,c)`: a group, each candidate takes exactly one alternative
//! - Any other character: literal text
//! - Whitespace anywhere is ignored
//!
//! Groups cannot nest. Alternatives may be empty: `(,www.)example.com`
//! yields `example.com` and `www.example.com`.
//!
//! # Examples
//!
//! ```
//! use domain_sweep_lib::pattern::expand_pattern;
//! use domain_sweep_lib::LiteralMode;
//!
//! let names = expand_pattern("(a,b)(1,2)", LiteralMode::Affix).unwrap();
//! assert_eq!(names, vec!["a1", "a2", "b1", "b2"]);
//!
//! let names = expand_pattern("(get,try)app.(com,io)", LiteralMode::Affix).unwrap();
//! assert_eq!(names.len(), 4);
//! assert_eq!(names[0], "getapp.com");
//! ```

use crate::error::DomainSweepError;
use crate::types::LiteralMode;

/// A parsed piece of a pattern: fixed text or a set of alternatives.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Group(Vec<String>),
}

/// Remove every whitespace character from the raw pattern.
fn strip_whitespace(pattern: &str) -> String {
    pattern.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse a whitespace-free pattern into literal and group segments.
///
/// Single left-to-right scan. Rejects unbalanced parentheses, nested
/// groups and empty groups.
fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, DomainSweepError> {
    if pattern.is_empty() {
        return Err(DomainSweepError::pattern_syntax(
            pattern,
            "pattern cannot be empty",
        ));
    }

    let mut segments = Vec::new();
    let mut buffer = String::new();
    // Byte offset of the currently open '(' if we are inside a group
    let mut open_at: Option<usize> = None;

    for (pos, ch) in pattern.char_indices() {
        match ch {
            '(' => {
                if let Some(start) = open_at {
                    return Err(DomainSweepError::pattern_syntax(
                        pattern,
                        format!(
                            "nested group at position {} (group opened at {})",
                            pos, start
                        ),
                    ));
                }
                if !buffer.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut buffer)));
                }
                open_at = Some(pos);
            }
            ')' => {
                let Some(start) = open_at.take() else {
                    return Err(DomainSweepError::pattern_syntax(
                        pattern,
                        format!("unmatched ')' at position {}", pos),
                    ));
                };
                if buffer.is_empty() {
                    return Err(DomainSweepError::pattern_syntax(
                        pattern,
                        format!("empty group at position {}", start),
                    ));
                }
                let alternatives = buffer.split(',').map(str::to_string).collect();
                buffer.clear();
                segments.push(Segment::Group(alternatives));
            }
            _ => buffer.push(ch),
        }
    }

    if let Some(start) = open_at {
        return Err(DomainSweepError::pattern_syntax(
            pattern,
            format!("unclosed group at position {}", start),
        ));
    }

    if !buffer.is_empty() {
        segments.push(Segment::Literal(buffer));
    }

    Ok(segments)
}

/// Estimate how many candidates a pattern will produce.
///
/// The product of every group's alternative count, saturating on overflow.
/// A pattern without groups counts as one candidate. Rejects the same
/// malformed patterns as [`expand_pattern`].
pub fn estimate_pattern_count(pattern: &str) -> Result<usize, DomainSweepError> {
    let segments = parse_pattern(&strip_whitespace(pattern))?;
    let count = segments
        .iter()
        .filter_map(|s| match s {
            Segment::Group(alternatives) => Some(alternatives.len()),
            Segment::Literal(_) => None,
        })
        .fold(1usize, |acc, n| acc.saturating_mul(n));
    Ok(count)
}

/// Expand a pattern into its ordered candidate list.
///
/// Candidates follow the Cartesian product of the groups, first group
/// slowest. Duplicates are kept. A pattern without groups yields itself.
///
/// With [`LiteralMode::Discard`] only the chosen alternatives are joined and
/// literal text between groups is dropped.
///
/// # Errors
///
/// [`DomainSweepError::PatternSyntax`] for an empty or whitespace-only
/// pattern, an empty group `()`, a nested group or unbalanced parentheses.
/// An empty alternative inside a group, as in `(,www.)`, is allowed.
pub fn expand_pattern(pattern: &str, mode: LiteralMode) -> Result<Vec<String>, DomainSweepError> {
    let stripped = strip_whitespace(pattern);
    let segments = parse_pattern(&stripped)?;

    if !segments.iter().any(|s| matches!(s, Segment::Group(_))) {
        return Ok(vec![stripped]);
    }

    // Option list per output position
    let options: Vec<Vec<String>> = segments
        .into_iter()
        .filter_map(|s| match s {
            Segment::Group(alternatives) => Some(alternatives),
            Segment::Literal(text) => match mode {
                LiteralMode::Affix => Some(vec![text]),
                LiteralMode::Discard => None,
            },
        })
        .collect();

    // Odometer iteration
    let total = options
        .iter()
        .map(|o| o.len())
        .fold(1usize, |acc, n| acc.saturating_mul(n));
    let mut results = Vec::with_capacity(total.min(1_000_000));
    let mut counters = vec![0usize; options.len()];

    for _ in 0..total {
        let name: String = counters
            .iter()
            .enumerate()
            .map(|(i, &c)| options[i][c].as_str())
            .collect();
        results.push(name);

        // Increment odometer (rightmost first)
        for i in (0..counters.len()).rev() {
            counters[i] += 1;
            if counters[i] < options[i].len() {
                break;
            }
            counters[i] = 0;
        }
    }

    Ok(results)
}
