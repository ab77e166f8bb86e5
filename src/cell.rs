//! Coercion of raw spreadsheet cells into typed values.
//!
//! A cell is `None` when the row is shorter than the header row. None of these
//! helpers fail: every coercion has a fixed fallback.

use crate::config::ChooserConfig;
use regex::Regex;

/// A raw cell: present text, or absent.
pub type Cell<'a> = Option<&'a str>;

/// Fetch cell `idx` from a row, absent if the row is too short.
pub fn cell_at(row: &[String], idx: usize) -> Cell<'_> {
    row.get(idx).map(String::as_str)
}

/// Trimmed, lower-cased token. Absent cells become the empty string.
pub fn token(cell: Cell<'_>) -> String {
    cell.map(|s| s.trim().to_lowercase()).unwrap_or_default()
}

/// Whether a cell holds non-whitespace text.
pub fn is_filled(cell: Cell<'_>) -> bool {
    cell.is_some_and(|s| !s.trim().is_empty())
}

/// Boolean coercion: truthy token membership, otherwise `false`.
pub fn coerce_bool(cell: Cell<'_>, config: &ChooserConfig) -> bool {
    config.is_truthy(&token(cell))
}

/// Parse the leading unsigned integer of a cell ("60", " 45 min", "7+").
pub fn parse_leading_int(cell: Cell<'_>) -> Option<u32> {
    lazy_static::lazy_static! {
        static ref LEADING_INT: Regex = Regex::new(r"^\s*\+?(\d+)").unwrap();
    }

    let text = cell?;
    let caps = LEADING_INT.captures(text)?;
    caps[1].parse().ok()
}

/// Integer coercion with a `0` fallback.
pub fn coerce_int(cell: Cell<'_>) -> u32 {
    parse_leading_int(cell).unwrap_or(0)
}

/// Split a combined cell on `,` or `;`, trimming and dropping empty pieces.
pub fn split_combined(text: &str) -> Vec<&str> {
    text.split([',', ';'])
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}
