//! Header classification: decide what each spreadsheet column means.

use crate::config::ChooserConfig;
use regex::Regex;

/// Semantic role of one header column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    Name,
    MinTime,
    MaxTime,
    TotalTimeFlag,
    TimeByPlayerFlag,
    /// One delimited cell listing supported player counts
    CombinedPlayerCounts,
    /// One delimited cell listing audience tags
    CombinedAudience,
    /// Boolean column for a single player count ("3", "7+")
    NumericPlayerCount(u32),
    /// Boolean column for one vocabulary tag, canonical casing
    AudienceOption(String),
    Unrecognized,
}

/// Classified header row: a role per column plus the resolved single-role indices.
///
/// Each single-valued role points at the first column that matched it; later
/// duplicates are kept in `roles` as `Unrecognized`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    pub roles: Vec<ColumnRole>,
    pub name: Option<usize>,
    pub min_time: Option<usize>,
    pub max_time: Option<usize>,
    pub total_time: Option<usize>,
    pub time_by_player: Option<usize>,
    pub player_counts: Option<usize>,
    pub audience: Option<usize>,
    /// (column index, player count)
    pub numeric_player_counts: Vec<(usize, u32)>,
    /// (column index, canonical tag)
    pub audience_options: Vec<(usize, String)>,
}

impl HeaderMap {
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Normalize a header for matching and inspection: trimmed, lower-cased.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Classify a single header without regard to duplicates.
pub fn classify_header(header: &str, config: &ChooserConfig) -> ColumnRole {
    lazy_static::lazy_static! {
        static ref NUMERIC_HEADER: Regex = Regex::new(r"^(\d+)\+?$").unwrap();
    }

    let h = normalize_header(header);
    let is_in = |set: &[String]| set.iter().any(|s| *s == h);

    if is_in(&config.name_headers) {
        ColumnRole::Name
    } else if is_in(&config.min_time_headers) {
        ColumnRole::MinTime
    } else if is_in(&config.max_time_headers) {
        ColumnRole::MaxTime
    } else if is_in(&config.total_time_headers) {
        ColumnRole::TotalTimeFlag
    } else if is_in(&config.time_by_player_headers) {
        ColumnRole::TimeByPlayerFlag
    } else if is_in(&config.player_counts_headers) {
        ColumnRole::CombinedPlayerCounts
    } else if is_in(&config.audience_headers) {
        ColumnRole::CombinedAudience
    } else if let Some(n) = NUMERIC_HEADER
        .captures(&h)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        ColumnRole::NumericPlayerCount(n)
    } else if let Some(tag) = config.canonical_audience(&h) {
        ColumnRole::AudienceOption(tag.to_string())
    } else {
        ColumnRole::Unrecognized
    }
}

/// Classify a full header row. The first column matching a single-valued role wins.
pub fn classify_headers<S: AsRef<str>>(headers: &[S], config: &ChooserConfig) -> HeaderMap {
    let mut map = HeaderMap::default();

    for (idx, header) in headers.iter().enumerate() {
        let role = classify_header(header.as_ref(), config);
        let slot = match role {
            ColumnRole::Name => Some(&mut map.name),
            ColumnRole::MinTime => Some(&mut map.min_time),
            ColumnRole::MaxTime => Some(&mut map.max_time),
            ColumnRole::TotalTimeFlag => Some(&mut map.total_time),
            ColumnRole::TimeByPlayerFlag => Some(&mut map.time_by_player),
            ColumnRole::CombinedPlayerCounts => Some(&mut map.player_counts),
            ColumnRole::CombinedAudience => Some(&mut map.audience),
            ColumnRole::NumericPlayerCount(n) => {
                map.numeric_player_counts.push((idx, n));
                None
            }
            ColumnRole::AudienceOption(ref tag) => {
                map.audience_options.push((idx, tag.clone()));
                None
            }
            ColumnRole::Unrecognized => None,
        };

        let role = match slot {
            Some(slot) if slot.is_some() => {
                log::debug!(
                    "Column {} ('{}') duplicates {:?}; ignoring",
                    idx,
                    header.as_ref(),
                    role
                );
                ColumnRole::Unrecognized
            }
            Some(slot) => {
                *slot = Some(idx);
                role
            }
            None => role,
        };
        map.roles.push(role);
    }

    log::debug!("Classified headers: {:?}", map.roles);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(h: &str) -> ColumnRole {
        classify_header(h, &ChooserConfig::default())
    }

    #[test]
    fn test_classify_synonyms() {
        assert_eq!(classify("Name"), ColumnRole::Name);
        assert_eq!(classify(" objectname "), ColumnRole::Name);
        assert_eq!(classify("GAME"), ColumnRole::Name);
        assert_eq!(classify("Min Play Time"), ColumnRole::MinTime);
        assert_eq!(classify("min"), ColumnRole::MinTime);
        assert_eq!(classify("MaxPlayTime"), ColumnRole::MaxTime);
        assert_eq!(classify("Total Time"), ColumnRole::TotalTimeFlag);
        assert_eq!(classify("time_by_player"), ColumnRole::TimeByPlayerFlag);
        assert_eq!(classify("Players"), ColumnRole::CombinedPlayerCounts);
        assert_eq!(classify("Player Options"), ColumnRole::CombinedAudience);
        assert_eq!(classify("audience"), ColumnRole::CombinedAudience);
    }

    #[test]
    fn test_classify_numeric_and_audience() {
        assert_eq!(classify("3"), ColumnRole::NumericPlayerCount(3));
        assert_eq!(classify("7+"), ColumnRole::NumericPlayerCount(7));
        assert_eq!(classify(" 12 "), ColumnRole::NumericPlayerCount(12));
        assert_eq!(classify("3-4"), ColumnRole::Unrecognized);
        assert_eq!(classify("+3"), ColumnRole::Unrecognized);
        assert_eq!(classify("kids"), ColumnRole::AudienceOption("Kids".to_string()));
        assert_eq!(classify("REID"), ColumnRole::AudienceOption("Reid".to_string()));
        assert_eq!(classify("Publisher"), ColumnRole::Unrecognized);
    }

    #[test]
    fn test_first_match_wins() {
        let config = ChooserConfig::default();
        let map = classify_headers(&["Title", "Name", "min", "MinPlayTime", "2", "3"], &config);
        assert_eq!(map.name, Some(0));
        assert_eq!(map.min_time, Some(2));
        assert_eq!(map.roles[1], ColumnRole::Unrecognized);
        assert_eq!(map.roles[3], ColumnRole::Unrecognized);
        assert_eq!(map.numeric_player_counts, vec![(4, 2), (5, 3)]);
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn test_combined_and_per_column_coexist() {
        let config = ChooserConfig::default();
        let map = classify_headers(&["name", "players", "2", "audience", "Kids"], &config);
        assert_eq!(map.player_counts, Some(1));
        assert_eq!(map.numeric_player_counts, vec![(2, 2)]);
        assert_eq!(map.audience, Some(3));
        assert_eq!(map.audience_options, vec![(4, "Kids".to_string())]);
    }
}
