//! Pipeline functions for programmatic use by the CLI.
//!
//! Each operation loads the catalog, runs the pure stages and returns the
//! output as a `String` instead of printing it.

use crate::catalog::Catalog;
use crate::config::{ChooserConfig, SortPreference};
use crate::display::{query_summary, render_results, LibraryTable, SortDirection};
use crate::filter::{filter_catalog, FilterQuery};
use crate::order::order_results_with;
use crate::source::{write_csv_table, CsvSource, RowSource, SheetsSource};
use crate::sync::{CatalogStore, SyncOutcome, SyncTrigger};
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Sources
// ============================================================================

/// Where the catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Csv(PathBuf),
    Sheets { sheet_id: String, api_key: String },
}

impl SourceSpec {
    pub fn build(&self) -> Result<Arc<dyn RowSource>> {
        let source: Arc<dyn RowSource> = match self {
            SourceSpec::Csv(path) => Arc::new(CsvSource::new(path)),
            SourceSpec::Sheets { sheet_id, api_key } => Arc::new(SheetsSource::new(sheet_id, api_key)?),
        };
        Ok(source)
    }
}

/// Fetch once and return the committed catalog, or the fetch error.
pub fn load_catalog(source: &SourceSpec, config: Arc<ChooserConfig>) -> Result<Arc<Catalog>> {
    let store = CatalogStore::new(config);
    let row_source = source.build()?;
    match store.sync_now(row_source.as_ref(), SyncTrigger::Refresh) {
        SyncOutcome::Committed(_) | SyncOutcome::Empty => Ok(store.snapshot()),
        SyncOutcome::Failed(message) => Err(anyhow::anyhow!(message))
            .with_context(|| format!("Failed to load games from {}", row_source.describe())),
        SyncOutcome::Stale => anyhow::bail!("Sync superseded"),
    }
}

// ============================================================================
// Choose
// ============================================================================

/// Options for the choose operation.
pub struct ChooseOptions {
    pub query: FilterQuery,
    pub preference: SortPreference,
    pub show_play_time: bool,
    /// Seed for a reproducible random order
    pub seed: Option<u64>,
    /// Emit JSON instead of text
    pub json: bool,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    name: &'a str,
    min_play_time: u32,
    max_play_time: u32,
    player_counts: Vec<u32>,
    audience_options: &'a [String],
}

#[derive(Serialize)]
struct JsonReport<'a> {
    sort: &'static str,
    adjusted_min_time: u32,
    adjusted_max_time: u32,
    results: Vec<JsonEntry<'a>>,
}

/// Filter and order the catalog, returning the rendered results.
pub fn choose(catalog: &Catalog, options: &ChooseOptions, config: &ChooserConfig) -> Result<String> {
    options.query.validate(config)?;

    let outcome = filter_catalog(&catalog.games, &options.query, config);
    let mut rng = match options.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let ordered = order_results_with(&outcome.entries, options.preference, &mut rng);

    if options.json {
        let report = JsonReport {
            sort: options.preference.label(),
            adjusted_min_time: outcome.adjusted_min,
            adjusted_max_time: outcome.adjusted_max,
            results: ordered
                .iter()
                .map(|e| JsonEntry {
                    name: &e.game.name,
                    min_play_time: e.min_play_time,
                    max_play_time: e.max_play_time,
                    player_counts: e.game.player_counts.iter().copied().collect(),
                    audience_options: &e.game.audience_options,
                })
                .collect(),
        };
        return serde_json::to_string_pretty(&report).context("Failed to serialize results");
    }

    let mut out = String::new();
    writeln!(out, "{}", query_summary(&options.query, config))?;
    writeln!(
        out,
        "Matched {} of {} games",
        outcome.len(),
        catalog.len()
    )?;
    if !outcome.is_empty() {
        writeln!(
            out,
            "Adjusted play time: {}-{} min",
            outcome.adjusted_min, outcome.adjusted_max
        )?;
    }
    writeln!(out)?;
    out.push_str(&render_results(&ordered, options.preference, options.show_play_time)?);
    Ok(out)
}

// ============================================================================
// Library
// ============================================================================

/// Render the raw sheet, optionally sorted by a column (by index or header name).
pub fn library_report(catalog: &Catalog, sort_col: Option<&str>, descending: bool) -> Result<String> {
    let mut table = LibraryTable::new(&catalog.raw);

    if let Some(col) = sort_col {
        let idx = match col.parse::<usize>() {
            Ok(i) => i,
            Err(_) => {
                let wanted = col.trim().to_lowercase();
                catalog
                    .headers
                    .iter()
                    .position(|h| *h == wanted)
                    .ok_or_else(|| anyhow::anyhow!("Column '{}' not found", col))?
            }
        };
        if idx >= catalog.headers.len() {
            anyhow::bail!(
                "Column {} out of range (sheet has {} columns)",
                idx,
                catalog.headers.len()
            );
        }
        let direction = if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        table = table.sorted_by(idx, direction);
    }

    let mut out = String::new();
    if let Some(synced) = catalog.last_sync {
        let local: chrono::DateTime<chrono::Local> = synced.into();
        writeln!(out, "Last sync: {}", local.format("%Y-%m-%d %H:%M:%S"))?;
    }
    writeln!(out, "Games: {}", catalog.len())?;
    out.push_str(&table.render()?);
    Ok(out)
}

// ============================================================================
// Export
// ============================================================================

/// Fetch the raw table and write it to a CSV file.
pub fn export_table(source: &SourceSpec, output: &Path) -> Result<String> {
    let row_source = source.build()?;
    let table = row_source
        .fetch()
        .with_context(|| format!("Failed to fetch from {}", row_source.describe()))?;
    write_csv_table(&table, output)?;
    Ok(format!(
        "Wrote {} rows to {}",
        table.row_count(),
        output.display()
    ))
}
