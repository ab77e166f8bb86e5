//! Row-fetch providers: where the raw table comes from.

use crate::catalog::RawTable;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Google Sheets REST endpoint.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Columns fetched from the first sheet.
pub const SHEET_COLUMNS: &str = "A:Z";

/// Something that can produce a raw table, or fail.
pub trait RowSource: Send + Sync {
    fn fetch(&self) -> Result<RawTable>;

    /// Short human-readable description for log lines.
    fn describe(&self) -> String;
}

// ============================================================================
// Google Sheets
// ============================================================================

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: Option<SheetProperties>,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Reads the first sheet of a Google Sheets document with an API key.
pub struct SheetsSource {
    sheet_id: String,
    api_key: String,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl SheetsSource {
    pub fn new(sheet_id: &str, api_key: &str) -> Result<Self> {
        Self::with_base_url(sheet_id, api_key, SHEETS_API_BASE)
    }

    /// Point at a different API root (used for testing against a local server).
    pub fn with_base_url(sheet_id: &str, api_key: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            sheet_id: sheet_id.to_string(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn metadata_url(&self) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API URL cannot be a base"))?
            .push(&self.sheet_id);
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title")
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    fn values_url(&self, title: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API URL cannot be a base"))?
            .push(&self.sheet_id)
            .push("values")
            .push(&format!("{}!{}", title, SHEET_COLUMNS));
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Title of the first sheet in the document.
    fn first_sheet_title(&self) -> Result<String> {
        let resp = self
            .client
            .get(self.metadata_url()?)
            .send()
            .context("Failed to fetch sheet metadata")?;
        if !resp.status().is_success() {
            anyhow::bail!("Failed to fetch sheet metadata: HTTP {}", resp.status());
        }
        let meta: SpreadsheetMeta = resp.json().context("Invalid sheet metadata")?;
        first_title(&meta).ok_or_else(|| anyhow::anyhow!("No sheet title found"))
    }
}

fn first_title(meta: &SpreadsheetMeta) -> Option<String> {
    meta.sheets
        .first()
        .and_then(|s| s.properties.as_ref())
        .and_then(|p| p.title.clone())
        .filter(|t| !t.is_empty())
}

/// Render a JSON cell as text. Sheets normally returns strings, but be lenient.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn table_from_values(range: ValueRange) -> RawTable {
    RawTable::from_rows(
        range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect(),
    )
}

impl RowSource for SheetsSource {
    fn fetch(&self) -> Result<RawTable> {
        let title = self.first_sheet_title()?;
        log::debug!("Fetching values from sheet '{}'", title);

        let resp = self
            .client
            .get(self.values_url(&title)?)
            .send()
            .context("Failed to fetch sheet values")?;
        if !resp.status().is_success() {
            anyhow::bail!("Failed to fetch sheet values: HTTP {}", resp.status());
        }
        let range: ValueRange = resp.json().context("Invalid sheet values")?;
        Ok(table_from_values(range))
    }

    fn describe(&self) -> String {
        format!("Google Sheet {}", self.sheet_id)
    }
}

// ============================================================================
// Local CSV
// ============================================================================

/// Reads a local CSV export. Row 0 is the header row; short rows stay short.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Read every record of a CSV file without treating any row specially.
pub fn read_csv_table(path: &Path) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV row")?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(RawTable::from_rows(rows))
}

/// Write a raw table to CSV so it can later be read back with `CsvSource`.
pub fn write_csv_table(table: &RawTable, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

impl RowSource for CsvSource {
    fn fetch(&self) -> Result<RawTable> {
        read_csv_table(&self.path)
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}
