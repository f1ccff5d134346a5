//! Date normalization to canonical `MM/DD/YYYY`.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Accepted textual formats, tried in order after the numeric forms.
const TEXTUAL_FORMATS: &[&str] = &[
    "%B %d, %Y", // January 15, 1990
    "%b %d, %Y", // Jan 15, 1990
    "%B %d %Y",  // January 15 1990
    "%b %d %Y",  // Jan 15 1990
    "%d %B %Y",  // 15 January 1990
    "%d %b %Y",  // 15 Jan 1990
];

/// Parse and reformat a date to `MM/DD/YYYY`.
///
/// Numeric forms accept `/`, `-` or `.` separators in M/D/Y, D/M/Y and
/// Y/M/D order; textual forms accept full and abbreviated month names.
/// A two-digit year expands to `20YY`; any parsed year above the century
/// cutoff is shifted back 100 years, so with the default cutoff of 2027,
/// `01/15/35` resolves to 1935 and `01/15/20` to 2020.
///
/// Returns `None` when the input cannot be parsed; the caller passes the
/// raw value through and flags the record instead of raising.
pub fn clean_date(raw: &str, century_cutoff: i32) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = parse_numeric(trimmed).or_else(|| parse_textual(trimmed))?;
    let adjusted = apply_century_cutoff(parsed, century_cutoff)?;

    if adjusted != parsed {
        debug!(raw, year = adjusted.year(), "applied century cutoff");
    }

    Some(format!(
        "{:02}/{:02}/{:04}",
        adjusted.month(),
        adjusted.day(),
        adjusted.year()
    ))
}

/// Parse already-canonical `MM/DD/YYYY` values (used by the validator).
pub fn parse_canonical(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%m/%d/%Y").ok()
}

fn parse_numeric(text: &str) -> Option<NaiveDate> {
    // Normalize the separator variants to '/'.
    let normalized: String = text
        .chars()
        .map(|c| if c == '-' || c == '.' { '/' } else { c })
        .collect();

    let parts: Vec<&str> = normalized.split('/').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let (a, b, c) = (parts[0], parts[1], parts[2]);

    // Interpretations in fallback order: M/D/Y, D/M/Y, Y/M/D. The first
    // combination that forms a real calendar date wins.
    let candidates = [
        (expand_year(c), parse_u32(a), parse_u32(b)), // M/D/Y
        (expand_year(c), parse_u32(b), parse_u32(a)), // D/M/Y
        (expand_year(a), parse_u32(b), parse_u32(c)), // Y/M/D
    ];

    for (year, month, day) in candidates {
        if let Some(date) = NaiveDate::from_ymd_opt(year?, month?, day?) {
            return Some(date);
        }
    }
    None
}

fn parse_textual(text: &str) -> Option<NaiveDate> {
    // Collapse whitespace runs so "Jan  15,  1990" still parses.
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    TEXTUAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&collapsed, fmt).ok())
}

/// Two-digit years always expand into the 2000s; the cutoff pass decides
/// whether they really belong to the prior century.
fn expand_year(part: &str) -> Option<i32> {
    let value: i32 = part.parse().ok()?;
    if part.len() == 2 {
        Some(2000 + value)
    } else if part.len() == 4 {
        Some(value)
    } else {
        None
    }
}

fn parse_u32(part: &str) -> Option<u32> {
    if part.len() > 2 {
        return None;
    }
    part.parse().ok()
}

fn apply_century_cutoff(date: NaiveDate, cutoff: i32) -> Option<NaiveDate> {
    if date.year() > cutoff {
        NaiveDate::from_ymd_opt(date.year() - 100, date.month(), date.day())
    } else {
        Some(date)
    }
}
