//! Catalog building: raw table in, ordered list of game records out.

use crate::config::ChooserConfig;
use crate::headers::{classify_headers, normalize_header, HeaderMap};
use crate::normalize::{normalize_row, GameRecord};
use chrono::{DateTime, Utc};

/// A raw spreadsheet: row 0 is the header row. Data rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a table from string slices, mostly for tests and fixtures.
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// No header row at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Number of data rows, excluding the header.
    pub fn row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

/// An immutable catalog snapshot with its ingestion metadata.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub games: Vec<GameRecord>,
    /// Raw values as fetched, kept for inspection
    pub raw: RawTable,
    /// Trimmed, lower-cased header strings
    pub headers: Vec<String>,
    pub roles: HeaderMap,
    pub last_sync: Option<DateTime<Utc>>,
    /// Number of successful syncs committed so far
    pub sync_count: u64,
    pub last_error: Option<String>,
}

impl Catalog {
    /// Normalize every data row of `raw`, dropping rows with no usable name.
    ///
    /// Sync metadata is left empty; `CatalogStore` stamps it when committing.
    pub fn from_table(raw: RawTable, config: &ChooserConfig) -> Self {
        let roles = classify_headers(raw.headers(), config);
        let headers: Vec<String> = raw.headers().iter().map(|h| normalize_header(h)).collect();

        let mut games = Vec::with_capacity(raw.row_count());
        for (row_idx, row) in raw.data_rows().iter().enumerate() {
            match normalize_row(row, &roles, config) {
                Some(game) => games.push(game),
                None => log::debug!("Row {}: no name, skipping", row_idx + 2),
            }
        }

        log::debug!(
            "Built catalog: {} games from {} rows",
            games.len(),
            raw.row_count()
        );

        Self {
            games,
            raw,
            headers,
            roles,
            last_sync: None,
            sync_count: 0,
            last_error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&GameRecord> {
        self.games.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }
}
