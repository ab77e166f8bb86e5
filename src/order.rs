//! Result ordering for presentation.

use crate::config::SortPreference;
use crate::filter::ResultEntry;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Adjusted max time, or the game's own when the adjusted value is zero.
fn longest_key(entry: &ResultEntry<'_>) -> u32 {
    if entry.max_play_time != 0 {
        entry.max_play_time
    } else {
        entry.game.max_play_time
    }
}

/// Adjusted min time, or the game's own when the adjusted value is zero.
fn shortest_key(entry: &ResultEntry<'_>) -> u32 {
    if entry.min_play_time != 0 {
        entry.min_play_time
    } else {
        entry.game.min_play_time
    }
}

/// Primary collation key: decomposed, diacritics stripped, lower-cased.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Name comparison approximating a locale collation. Accents and case only break ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Order entries with an explicit random source. The input slice is not modified.
pub fn order_results_with<'a, R: Rng + ?Sized>(
    entries: &[ResultEntry<'a>],
    preference: SortPreference,
    rng: &mut R,
) -> Vec<ResultEntry<'a>> {
    let mut ordered = entries.to_vec();
    match preference {
        SortPreference::Random => ordered.shuffle(rng),
        SortPreference::Alphabetical => {
            ordered.sort_by(|a, b| compare_names(&a.game.name, &b.game.name))
        }
        SortPreference::LongestFirst => ordered.sort_by_key(|e| std::cmp::Reverse(longest_key(e))),
        SortPreference::ShortestFirst => ordered.sort_by_key(shortest_key),
    }
    ordered
}

/// Order entries, shuffling with the thread-local generator in `Random` mode.
pub fn order_results<'a>(entries: &[ResultEntry<'a>], preference: SortPreference) -> Vec<ResultEntry<'a>> {
    order_results_with(entries, preference, &mut rand::thread_rng())
}

/// Random-mode split: one primary pick and the remaining alternates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick<'a> {
    pub primary: ResultEntry<'a>,
    pub alternates: Vec<ResultEntry<'a>>,
}

impl<'a> Pick<'a> {
    /// Split an already shuffled list. `None` when nothing matched.
    pub fn from_ordered(ordered: &[ResultEntry<'a>]) -> Option<Self> {
        let (primary, alternates) = ordered.split_first()?;
        Some(Self {
            primary: *primary,
            alternates: alternates.to_vec(),
        })
    }
}
