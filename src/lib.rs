//! Board Game Chooser
//!
//! Picks games from a loosely-structured spreadsheet by player count, play time
//! and audience.
//!
//! This library provides:
//! - `headers` / `normalize` / `catalog`: turn a raw table with inconsistent column
//!   names into canonical `GameRecord`s
//! - `filter` / `order`: evaluate a `FilterQuery` and order the matches for display
//! - `sync`: single-flight catalog refresh from a `RowSource`
//!
//! Binaries:
//! - `bgchooser`: command-line picker, library viewer and sheet exporter

pub mod catalog;
pub mod cell;
pub mod config;
pub mod display;
pub mod filter;
pub mod headers;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod source;
pub mod sync;

pub use catalog::{Catalog, RawTable};
pub use config::{ChooserConfig, Settings, SortPreference};
pub use filter::{filter_catalog, AudienceMode, FilterOutcome, FilterQuery, ResultEntry, TimeRange};
pub use headers::{classify_headers, ColumnRole, HeaderMap};
pub use normalize::{normalize_row, GameRecord};
pub use order::{order_results, order_results_with, Pick};
pub use source::{CsvSource, RowSource, SheetsSource};
pub use sync::{CatalogStore, SyncOutcome, SyncSession, SyncTicket, SyncTrigger};
