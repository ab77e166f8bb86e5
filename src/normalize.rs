//! Row normalization: one raw data row into a canonical `GameRecord`.

use crate::cell::{cell_at, coerce_bool, coerce_int, is_filled, parse_leading_int, split_combined};
use crate::config::ChooserConfig;
use crate::headers::HeaderMap;
use std::collections::BTreeSet;
use uuid::Uuid;

/// A canonical catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Unique for the lifetime of the in-memory catalog; regenerated on every sync
    pub id: Uuid,
    /// Never empty
    pub name: String,
    pub min_play_time: u32,
    pub max_play_time: u32,
    /// Stored times are already totals
    pub total_time: bool,
    /// Stored times are per player and scale with the selected player count
    pub time_by_player: bool,
    /// Never empty
    pub player_counts: BTreeSet<u32>,
    /// Canonical-cased where the tag is in the vocabulary, verbatim otherwise
    pub audience_options: Vec<String>,
}

impl GameRecord {
    /// Whether the data fields match, ignoring `id`.
    pub fn same_content(&self, other: &GameRecord) -> bool {
        self.name == other.name
            && self.min_play_time == other.min_play_time
            && self.max_play_time == other.max_play_time
            && self.total_time == other.total_time
            && self.time_by_player == other.time_by_player
            && self.player_counts == other.player_counts
            && self.audience_options == other.audience_options
    }
}

/// Normalize one data row. Returns `None` when the row has no usable name.
pub fn normalize_row(row: &[String], headers: &HeaderMap, config: &ChooserConfig) -> Option<GameRecord> {
    let get = |col: Option<usize>| col.and_then(|i| cell_at(row, i));

    let name = get(headers.name).map(str::trim).unwrap_or("");
    if name.is_empty() {
        return None;
    }

    let min_play_time = coerce_int(get(headers.min_time));
    let max_play_time = coerce_int(get(headers.max_time));
    let total_time = coerce_bool(get(headers.total_time), config);
    let time_by_player = coerce_bool(get(headers.time_by_player), config);

    Some(GameRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        min_play_time,
        max_play_time,
        total_time,
        time_by_player,
        player_counts: resolve_player_counts(row, headers, config),
        audience_options: resolve_audience(row, headers, config),
    })
}

fn resolve_player_counts(row: &[String], headers: &HeaderMap, config: &ChooserConfig) -> BTreeSet<u32> {
    let combined = headers.player_counts.and_then(|i| cell_at(row, i));

    let mut counts: BTreeSet<u32> = if is_filled(combined) {
        split_combined(combined.unwrap_or(""))
            .into_iter()
            .filter_map(|piece| parse_leading_int(Some(piece)))
            .filter(|&n| n > 0)
            .collect()
    } else {
        headers
            .numeric_player_counts
            .iter()
            .filter(|&&(idx, n)| n > 0 && coerce_bool(cell_at(row, idx), config))
            .map(|&(_, n)| n)
            .collect()
    };

    if counts.is_empty() {
        counts.insert(config.default_player_count);
    }
    counts
}

fn resolve_audience(row: &[String], headers: &HeaderMap, config: &ChooserConfig) -> Vec<String> {
    let combined = headers.audience.and_then(|i| cell_at(row, i));

    let tokens: Vec<&str> = if is_filled(combined) {
        split_combined(combined.unwrap_or(""))
    } else {
        headers
            .audience_options
            .iter()
            .filter(|(idx, _)| coerce_bool(cell_at(row, *idx), config))
            .map(|(_, tag)| tag.as_str())
            .collect()
    };

    let mut options: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let canonical = config.canonical_audience(token).unwrap_or(token).to_string();
        if !options.contains(&canonical) {
            options.push(canonical);
        }
    }
    options
}
