//! Fixed configuration for ingestion and filtering, plus persisted CLI settings.
//!
//! `ChooserConfig` carries every constant the pipeline depends on (audience
//! vocabulary, header synonyms, truthy tokens, time sentinels) so that the
//! classifier and filter take it as an explicit argument instead of reading
//! ambient globals. `Settings` is the small user-facing preference file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Canonical audience tags, in display order.
pub const AUDIENCE_VOCABULARY: [&str; 8] = [
    "Gamers",
    "Family",
    "Kids",
    "Campaign",
    "Party",
    "Cooperative",
    "Nolan",
    "Reid",
];

/// Lower time bound meaning "no lower bound".
pub const ANY_MIN: u32 = 0;
/// Upper time bound meaning "no upper bound".
pub const ANY_MAX: u32 = 190;

/// Immutable configuration shared by the classifier, normalizer and filter.
#[derive(Debug, Clone)]
pub struct ChooserConfig {
    /// Closed audience vocabulary, canonical casing
    pub audience_vocabulary: Vec<String>,
    /// Cell values (lower-cased) that coerce to `true`
    pub truthy: Vec<String>,
    pub name_headers: Vec<String>,
    pub min_time_headers: Vec<String>,
    pub max_time_headers: Vec<String>,
    pub total_time_headers: Vec<String>,
    pub time_by_player_headers: Vec<String>,
    pub player_counts_headers: Vec<String>,
    pub audience_headers: Vec<String>,
    /// Lower time sentinel ("Any")
    pub any_min: u32,
    /// Upper time sentinel ("Any")
    pub any_max: u32,
    /// Smallest selectable player count
    pub min_players: u32,
    /// Largest selectable player count; displayed as "N+"
    pub max_players: u32,
    /// Player count assumed when a row carries no player-count signal
    pub default_player_count: u32,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for ChooserConfig {
    fn default() -> Self {
        Self {
            audience_vocabulary: strings(&AUDIENCE_VOCABULARY),
            truthy: strings(&["true", "1", "x", "yes", "y"]),
            name_headers: strings(&["name", "title", "objectname", "game"]),
            min_time_headers: strings(&["minplaytime", "min", "min play time"]),
            max_time_headers: strings(&["maxplaytime", "max", "max play time"]),
            total_time_headers: strings(&["totaltime", "total time"]),
            time_by_player_headers: strings(&["time by player", "time_by_player", "timebyplayer"]),
            player_counts_headers: strings(&["playercounts", "players"]),
            audience_headers: strings(&["playeroptions", "player options", "audience"]),
            any_min: ANY_MIN,
            any_max: ANY_MAX,
            min_players: 1,
            max_players: 7,
            default_player_count: 2,
        }
    }
}

impl ChooserConfig {
    /// Return the canonical-cased vocabulary entry matching `token` case-insensitively.
    pub fn canonical_audience(&self, token: &str) -> Option<&str> {
        let lower = token.trim().to_lowercase();
        self.audience_vocabulary
            .iter()
            .find(|tag| tag.to_lowercase() == lower)
            .map(|tag| tag.as_str())
    }

    /// Whether an already lower-cased, trimmed token is one of the truthy values.
    pub fn is_truthy(&self, token: &str) -> bool {
        self.truthy.iter().any(|t| t == token)
    }
}

// ============================================================================
// Sort preference
// ============================================================================

/// How a result list is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPreference {
    /// Shuffle; the first entry is the primary pick
    #[default]
    Random,
    Alphabetical,
    LongestFirst,
    ShortestFirst,
}

impl SortPreference {
    pub const ALL: [SortPreference; 4] = [
        SortPreference::Random,
        SortPreference::LongestFirst,
        SortPreference::ShortestFirst,
        SortPreference::Alphabetical,
    ];

    /// Label used in the settings file and the picker.
    pub fn label(self) -> &'static str {
        match self {
            SortPreference::Random => "Random",
            SortPreference::Alphabetical => "Alphabetically",
            SortPreference::LongestFirst => "Longest to shortest",
            SortPreference::ShortestFirst => "Shortest to longest",
        }
    }
}

impl std::fmt::Display for SortPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortPreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "random" => Ok(SortPreference::Random),
            "alphabetical" | "alphabetically" | "az" => Ok(SortPreference::Alphabetical),
            "longesttoshortest" | "longestfirst" | "longest" => Ok(SortPreference::LongestFirst),
            "shortesttolongest" | "shortestfirst" | "shortest" => {
                Ok(SortPreference::ShortestFirst)
            }
            _ => Err(anyhow::anyhow!(
                "Unknown sort preference '{}' (expected random, alphabetical, longest or shortest)",
                s
            )),
        }
    }
}

// ============================================================================
// Persisted settings
// ============================================================================

/// User settings persisted between CLI runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub sort_preference: SortPreference,
    pub show_play_time: bool,
    pub sheet_id: Option<String>,
    pub api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sort_preference: SortPreference::Random,
            show_play_time: true,
            sheet_id: None,
            api_key: None,
        }
    }
}

/// Default location of the settings file.
pub fn settings_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".bgchooser.conf"))
}

impl Settings {
    /// Parse `key=value` lines. Unknown keys and bad values are ignored.
    pub fn parse(content: &str) -> Self {
        let mut settings = Settings::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim();
                match key.trim() {
                    "sort_preference" => {
                        if let Ok(pref) = value.parse() {
                            settings.sort_preference = pref;
                        }
                    }
                    "show_play_time" => settings.show_play_time = value == "true",
                    "sheet_id" if !value.is_empty() => settings.sheet_id = Some(value.to_string()),
                    "api_key" if !value.is_empty() => settings.api_key = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        settings
    }

    /// Load settings from `path`, falling back to defaults if the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                log::debug!("No settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn to_file_string(&self) -> String {
        let mut out = format!(
            "sort_preference={}\nshow_play_time={}\n",
            self.sort_preference.label(),
            self.show_play_time
        );
        if let Some(id) = &self.sheet_id {
            out.push_str(&format!("sheet_id={}\n", id));
        }
        if let Some(key) = &self.api_key {
            out.push_str(&format!("api_key={}\n", key));
        }
        out
    }

    /// Same layout as the settings file, with the API key masked for echoing.
    pub fn to_display_string(&self) -> String {
        let mut masked = self.clone();
        masked.api_key = self.api_key.as_deref().map(mask_secret);
        masked.to_file_string()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_file_string())
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

/// Keep the last four characters of a long secret, hide the rest.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_audience() {
        let config = ChooserConfig::default();
        assert_eq!(config.canonical_audience("kids"), Some("Kids"));
        assert_eq!(config.canonical_audience("  COOPERATIVE "), Some("Cooperative"));
        assert_eq!(config.canonical_audience("Solo"), None);
        assert_eq!(config.audience_vocabulary.len(), 8);
    }

    #[test]
    fn test_default_bounds() {
        let config = ChooserConfig::default();
        assert_eq!((config.any_min, config.any_max), (ANY_MIN, ANY_MAX));
        assert_eq!((config.min_players, config.max_players), (1, 7));
        assert_eq!(config.default_player_count, 2);
    }

    #[test]
    fn test_sort_preference_parse() {
        assert_eq!("Random".parse::<SortPreference>().unwrap(), SortPreference::Random);
        assert_eq!(
            "Longest to shortest".parse::<SortPreference>().unwrap(),
            SortPreference::LongestFirst
        );
        assert_eq!(
            "shortest".parse::<SortPreference>().unwrap(),
            SortPreference::ShortestFirst
        );
        assert_eq!(
            "Alphabetically".parse::<SortPreference>().unwrap(),
            SortPreference::Alphabetical
        );
        assert!("sideways".parse::<SortPreference>().is_err());
        for pref in SortPreference::ALL {
            assert_eq!(pref.label().parse::<SortPreference>().unwrap(), pref);
        }
    }

    #[test]
    fn test_settings_parse() {
        let settings = Settings::parse(
            "# comment\nsort_preference=Alphabetically\nshow_play_time=false\nsheet_id=abc\nbogus=1\n",
        );
        assert_eq!(settings.sort_preference, SortPreference::Alphabetical);
        assert!(!settings.show_play_time);
        assert_eq!(settings.sheet_id.as_deref(), Some("abc"));
        assert_eq!(settings.api_key, None);
    }

    #[test]
    fn test_settings_bad_sort_keeps_default() {
        let settings = Settings::parse("sort_preference=upside down\n");
        assert_eq!(settings.sort_preference, SortPreference::Random);
        assert!(settings.show_play_time);
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.conf");
        let settings = Settings {
            sort_preference: SortPreference::ShortestFirst,
            show_play_time: false,
            sheet_id: Some("sheet".to_string()),
            api_key: Some("key".to_string()),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn test_settings_display_masks_api_key() {
        let settings = Settings {
            api_key: Some("AIzaSyExampleSecret1234".to_string()),
            sheet_id: Some("sheet".to_string()),
            ..Settings::default()
        };
        let shown = settings.to_display_string();
        assert!(!shown.contains("AIzaSyExampleSecret1234"));
        assert!(shown.contains("api_key=****1234\n"));
        assert!(shown.contains("sheet_id=sheet\n"));

        let short = Settings {
            api_key: Some("abc".to_string()),
            ..Settings::default()
        };
        assert!(short.to_display_string().contains("api_key=****\n"));
        assert!(!Settings::default().to_display_string().contains("api_key"));
    }

    #[test]
    fn test_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(&dir.path().join("nope")), Settings::default());
    }
}
