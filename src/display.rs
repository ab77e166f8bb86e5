//! Text rendering of results, query summaries and the raw library table.

use crate::catalog::RawTable;
use crate::config::{ChooserConfig, SortPreference};
use crate::filter::{AudienceMode, FilterQuery, ResultEntry, TimeRange};
use crate::order::Pick;
use anyhow::Result;
use std::cmp::Ordering;
use std::fmt::Write;

pub const NO_MATCHES: &str = "No games match your criteria.";

/// "~60 min" for a fixed length, "30-45 min" for a span.
pub fn time_label(entry: &ResultEntry<'_>) -> String {
    if entry.min_play_time == entry.max_play_time {
        format!("~{} min", entry.min_play_time)
    } else {
        format!("{}-{} min", entry.min_play_time, entry.max_play_time)
    }
}

/// "Any" when unbounded on both sides, else e.g. "30 - Any min".
pub fn range_label(range: &TimeRange, config: &ChooserConfig) -> String {
    if range.is_any(config) {
        return "Any".to_string();
    }
    let lo = if range.min == config.any_min {
        "Any".to_string()
    } else {
        range.min.to_string()
    };
    let hi = if range.max == config.any_max {
        "Any".to_string()
    } else {
        range.max.to_string()
    };
    format!("{} - {} min", lo, hi)
}

/// The top of the player slider reads "7+".
pub fn players_label(players: u32, config: &ChooserConfig) -> String {
    if players == config.max_players {
        format!("{}+", players)
    } else {
        players.to_string()
    }
}

/// "Anyone", or "Include: Kids, Family • Exclude: Gamers".
pub fn audience_label(query: &FilterQuery) -> String {
    let includes = query.tags(AudienceMode::Include);
    let excludes = query.tags(AudienceMode::Exclude);
    if includes.is_empty() && excludes.is_empty() {
        return "Anyone".to_string();
    }

    let mut parts = Vec::new();
    if !includes.is_empty() {
        parts.push(format!("Include: {}", includes.join(", ")));
    }
    if !excludes.is_empty() {
        parts.push(format!("Exclude: {}", excludes.join(", ")));
    }
    parts.join(" • ")
}

/// One-line summary of a query.
pub fn query_summary(query: &FilterQuery, config: &ChooserConfig) -> String {
    format!(
        "Players: {} | Play time: {} | Audience: {}",
        players_label(query.players, config),
        range_label(&query.time_range, config),
        audience_label(query)
    )
}

fn entry_line(entry: &ResultEntry<'_>, show_time: bool) -> String {
    if show_time {
        format!("{} ({})", entry.game.name, time_label(entry))
    } else {
        entry.game.name.clone()
    }
}

/// Heading for a non-random list.
pub fn list_title(preference: SortPreference) -> &'static str {
    match preference {
        SortPreference::Alphabetical => "All games matching criteria:",
        SortPreference::LongestFirst => "Games sorted from longest to shortest:",
        SortPreference::ShortestFirst | SortPreference::Random => {
            "Games sorted from shortest to longest:"
        }
    }
}

/// Render an already ordered result list.
pub fn render_results(
    ordered: &[ResultEntry<'_>],
    preference: SortPreference,
    show_time: bool,
) -> Result<String> {
    let mut out = String::new();

    if preference == SortPreference::Random {
        let Some(pick) = Pick::from_ordered(ordered) else {
            writeln!(out, "{}", NO_MATCHES)?;
            return Ok(out);
        };
        writeln!(out, "You should play:")?;
        writeln!(out, "  {}", entry_line(&pick.primary, show_time))?;
        if !pick.alternates.is_empty() {
            writeln!(out, "\nNo? How about:")?;
            for entry in &pick.alternates {
                writeln!(out, "  {}", entry_line(entry, show_time))?;
            }
        }
        return Ok(out);
    }

    if ordered.is_empty() {
        writeln!(out, "{}", NO_MATCHES)?;
        return Ok(out);
    }

    writeln!(out, "{}", list_title(preference))?;
    for entry in ordered {
        writeln!(out, "  {}", entry_line(entry, show_time))?;
    }
    Ok(out)
}

// ============================================================================
// Library table
// ============================================================================

/// Sort direction for the library view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// The raw sheet as a table, optionally sorted by one column.
pub struct LibraryTable<'a> {
    raw: &'a RawTable,
    sort: Option<(usize, SortDirection)>,
}

/// Compare two cells numerically when both parse as numbers, else as text.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    let as_number = |s: &str| -> Option<f64> {
        let t = s.trim();
        if t.is_empty() {
            Some(0.0)
        } else {
            t.parse::<f64>().ok().filter(|n| n.is_finite())
        }
    };

    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

impl<'a> LibraryTable<'a> {
    pub fn new(raw: &'a RawTable) -> Self {
        Self { raw, sort: None }
    }

    /// Clicking a column: same column flips direction, a new column sorts ascending.
    pub fn click_column(&mut self, column: usize) {
        self.sort = match self.sort {
            Some((col, SortDirection::Ascending)) if col == column => {
                Some((col, SortDirection::Descending))
            }
            Some((col, SortDirection::Descending)) if col == column => {
                Some((col, SortDirection::Ascending))
            }
            _ => Some((column, SortDirection::Ascending)),
        };
    }

    pub fn sorted_by(mut self, column: usize, direction: SortDirection) -> Self {
        self.sort = Some((column, direction));
        self
    }

    pub fn sort(&self) -> Option<(usize, SortDirection)> {
        self.sort
    }

    /// Data rows in display order.
    pub fn rows(&self) -> Vec<&'a [String]> {
        let mut rows: Vec<&'a [String]> = self.raw.data_rows().iter().map(Vec::as_slice).collect();
        if let Some((col, direction)) = self.sort {
            let cell = |r: &[String]| r.get(col).map(String::as_str).unwrap_or("").to_string();
            rows.sort_by(|a, b| {
                let ord = compare_cells(&cell(a), &cell(b));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn row_count(&self) -> usize {
        self.raw.row_count()
    }

    /// Render as aligned plain text. Short rows are padded with empty cells.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        let headers = self.raw.headers();
        if headers.is_empty() {
            writeln!(out, "No sheet data loaded yet.")?;
            return Ok(out);
        }

        let rows = self.rows();
        let widths: Vec<usize> = (0..headers.len())
            .map(|i| {
                rows.iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(headers[i].chars().count() + 2))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        writeln!(out, "Rows: {}", self.row_count())?;
        let mut line = String::new();
        for (i, h) in headers.iter().enumerate() {
            let marker = match self.sort {
                Some((col, SortDirection::Ascending)) if col == i => " ▲",
                Some((col, SortDirection::Descending)) if col == i => " ▼",
                _ => "",
            };
            write!(line, "{:<w$} | ", format!("{}{}", h, marker), w = widths[i])?;
        }
        writeln!(out, "{}", line.trim_end())?;
        writeln!(out, "{:-<w$}", "", w = line.trim_end().chars().count())?;

        for row in rows {
            let mut line = String::new();
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                write!(line, "{:<w$} | ", cell, w = *width)?;
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(out)
    }
}
