//! Constraint filter: player count, play time range and audience selection.

use crate::config::ChooserConfig;
use crate::normalize::GameRecord;
use anyhow::Result;
use std::collections::BTreeMap;

/// Whether an audience tag is required or forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceMode {
    Include,
    Exclude,
}

/// Inclusive play-time bounds in minutes. A bound equal to its sentinel is not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min: u32,
    pub max: u32,
}

impl TimeRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Both bounds at their sentinels.
    pub fn any(config: &ChooserConfig) -> Self {
        Self {
            min: config.any_min,
            max: config.any_max,
        }
    }

    pub fn is_any(&self, config: &ChooserConfig) -> bool {
        self.min == config.any_min && self.max == config.any_max
    }

    /// Whether adjusted times fall within the applied bounds.
    pub fn admits(&self, adj_min: u32, adj_max: u32, config: &ChooserConfig) -> bool {
        if self.min != config.any_min && adj_min < self.min {
            return false;
        }
        if self.max != config.any_max && adj_max > self.max {
            return false;
        }
        true
    }
}

/// One filter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    /// 1..=7; the top value is labelled "7+" but still matches exactly
    pub players: u32,
    pub time_range: TimeRange,
    /// Tags absent from the map are unconstrained
    pub audience: BTreeMap<String, AudienceMode>,
}

impl FilterQuery {
    /// Default query: two players, any time, anyone.
    pub fn new(config: &ChooserConfig) -> Self {
        Self {
            players: config.default_player_count,
            time_range: TimeRange::any(config),
            audience: BTreeMap::new(),
        }
    }

    pub fn with_players(mut self, players: u32) -> Self {
        self.players = players;
        self
    }

    pub fn with_time_range(mut self, min: u32, max: u32) -> Self {
        self.time_range = TimeRange::new(min, max);
        self
    }

    pub fn include(mut self, tag: &str) -> Self {
        self.audience.insert(tag.to_string(), AudienceMode::Include);
        self
    }

    pub fn exclude(mut self, tag: &str) -> Self {
        self.audience.insert(tag.to_string(), AudienceMode::Exclude);
        self
    }

    /// Toggle a tag the way the picker buttons do: selecting the active mode again clears it.
    pub fn toggle(&mut self, tag: &str, mode: AudienceMode) {
        if self.audience.get(tag) == Some(&mode) {
            self.audience.remove(tag);
        } else {
            self.audience.insert(tag.to_string(), mode);
        }
    }

    /// Tags with the given mode, in map order.
    pub fn tags(&self, mode: AudienceMode) -> Vec<&str> {
        self.audience
            .iter()
            .filter(|(_, m)| **m == mode)
            .map(|(tag, _)| tag.as_str())
            .collect()
    }

    /// Reject queries the picker could never produce. Filtering works on any query regardless.
    pub fn validate(&self, config: &ChooserConfig) -> Result<()> {
        if self.players < config.min_players || self.players > config.max_players {
            anyhow::bail!(
                "Player count must be between {} and {}, got {}",
                config.min_players,
                config.max_players,
                self.players
            );
        }
        if self.time_range.max != config.any_max && self.time_range.min > self.time_range.max {
            anyhow::bail!(
                "Minimum play time {} is above maximum {}",
                self.time_range.min,
                self.time_range.max
            );
        }
        Ok(())
    }
}

/// A matching game with play times adjusted for the query's player count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEntry<'a> {
    pub game: &'a GameRecord,
    pub min_play_time: u32,
    pub max_play_time: u32,
}

/// Filtered entries plus the overall adjusted time span, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome<'a> {
    pub entries: Vec<ResultEntry<'a>>,
    /// Smallest adjusted minimum, or 0 when empty
    pub adjusted_min: u32,
    /// Largest adjusted maximum, or 0 when empty
    pub adjusted_max: u32,
}

impl FilterOutcome<'_> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Play times scaled by player count when the game's times are per player.
pub fn adjusted_times(game: &GameRecord, players: u32) -> (u32, u32) {
    if game.time_by_player {
        (
            game.min_play_time.saturating_mul(players),
            game.max_play_time.saturating_mul(players),
        )
    } else {
        (game.min_play_time, game.max_play_time)
    }
}

fn audience_admits(game: &GameRecord, query: &FilterQuery) -> bool {
    let tags: Vec<String> = game
        .audience_options
        .iter()
        .map(|t| t.trim().to_lowercase())
        .collect();

    query.audience.iter().all(|(tag, mode)| {
        let present = tags.contains(&tag.trim().to_lowercase());
        match mode {
            AudienceMode::Include => present,
            AudienceMode::Exclude => !present,
        }
    })
}

/// Evaluate a query for one game, returning its adjusted entry if it matches.
pub fn evaluate<'a>(game: &'a GameRecord, query: &FilterQuery, config: &ChooserConfig) -> Option<ResultEntry<'a>> {
    if !game.player_counts.contains(&query.players) {
        return None;
    }

    let (adj_min, adj_max) = adjusted_times(game, query.players);
    if !query.time_range.admits(adj_min, adj_max, config) {
        return None;
    }

    if !audience_admits(game, query) {
        return None;
    }

    Some(ResultEntry {
        game,
        min_play_time: adj_min,
        max_play_time: adj_max,
    })
}

/// Filter a catalog, preserving catalog order.
pub fn filter_catalog<'a>(games: &'a [GameRecord], query: &FilterQuery, config: &ChooserConfig) -> FilterOutcome<'a> {
    let entries: Vec<ResultEntry<'a>> = games
        .iter()
        .filter_map(|game| evaluate(game, query, config))
        .collect();

    let adjusted_min = entries.iter().map(|e| e.min_play_time).min().unwrap_or(0);
    let adjusted_max = entries.iter().map(|e| e.max_play_time).max().unwrap_or(0);

    log::debug!(
        "Filter {:?}: {} of {} games match",
        query,
        entries.len(),
        games.len()
    );

    FilterOutcome {
        entries,
        adjusted_min,
        adjusted_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn game(name: &str, min: u32, max: u32, counts: &[u32]) -> GameRecord {
        GameRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            min_play_time: min,
            max_play_time: max,
            total_time: false,
            time_by_player: false,
            player_counts: counts.iter().copied().collect::<BTreeSet<u32>>(),
            audience_options: Vec::new(),
        }
    }

    fn query() -> FilterQuery {
        FilterQuery::new(&ChooserConfig::default())
    }

    #[test]
    fn test_player_count_exact() {
        let config = ChooserConfig::default();
        let games = vec![game("Catan", 60, 120, &[3, 4])];
        assert_eq!(filter_catalog(&games, &query().with_players(3), &config).len(), 1);
        assert!(filter_catalog(&games, &query().with_players(5), &config).is_empty());
    }

    #[test]
    fn test_seven_plus_is_exact() {
        let config = ChooserConfig::default();
        let games = vec![game("Party", 10, 20, &[8]), game("Big", 10, 20, &[7])];
        let outcome = filter_catalog(&games, &query().with_players(7), &config);
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.entries[0].game.name, "Big");
    }

    #[test]
    fn test_time_by_player_scaling() {
        let config = ChooserConfig::default();
        let mut g = game("Slow", 10, 15, &[4]);
        g.time_by_player = true;
        let games = vec![g];
        let outcome = filter_catalog(&games, &query().with_players(4), &config);
        assert_eq!(outcome.entries[0].min_play_time, 40);
        assert_eq!(outcome.entries[0].max_play_time, 60);
        assert_eq!(games[0].min_play_time, 10);
    }

    #[test]
    fn test_scaling_ignores_total_time() {
        let mut g = game("Both", 10, 20, &[3]);
        g.time_by_player = true;
        g.total_time = true;
        assert_eq!(adjusted_times(&g, 3), (30, 60));

        g.time_by_player = false;
        assert_eq!(adjusted_times(&g, 3), (10, 20));
    }

    #[test]
    fn test_sentinel_bounds() {
        let config = ChooserConfig::default();
        let games = vec![game("Epic", 500, 600, &[2]), game("Quick", 5, 8, &[2])];
        let matched = |lo, hi| -> Vec<String> {
            filter_catalog(&games, &query().with_time_range(lo, hi), &config)
                .entries
                .iter()
                .map(|e| e.game.name.clone())
                .collect()
        };
        assert_eq!(matched(0, 190), vec!["Epic", "Quick"]);
        // A lower bound only rejects games shorter than it.
        assert_eq!(matched(10, 190), vec!["Epic"]);
        assert_eq!(matched(0, 180), vec!["Quick"]);
        assert!(matched(10, 180).is_empty());
    }

    #[test]
    fn test_time_bounds_inclusive() {
        let config = ChooserConfig::default();
        let games = vec![game("Exact", 30, 60, &[2])];
        assert_eq!(filter_catalog(&games, &query().with_time_range(30, 60), &config).len(), 1);
        assert!(filter_catalog(&games, &query().with_time_range(40, 60), &config).is_empty());
        assert!(filter_catalog(&games, &query().with_time_range(30, 50), &config).is_empty());
    }

    #[test]
    fn test_audience_include_exclude() {
        let config = ChooserConfig::default();
        let mut kids = game("Kids game", 10, 20, &[2]);
        kids.audience_options = vec!["KIDS".to_string(), "Family".to_string()];
        let mut gamers = game("Heavy", 90, 120, &[2]);
        gamers.audience_options = vec!["Gamers".to_string()];
        let games = vec![kids, gamers];

        let outcome = filter_catalog(&games, &query().exclude("Kids"), &config);
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.entries[0].game.name, "Heavy");

        let outcome = filter_catalog(&games, &query().include("family").include("Kids"), &config);
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.entries[0].game.name, "Kids game");

        let outcome = filter_catalog(&games, &query().include("Family").include("Party"), &config);
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_order_preserved_and_span() {
        let config = ChooserConfig::default();
        let games = vec![
            game("C", 45, 90, &[2]),
            game("Skip", 10, 20, &[4]),
            game("A", 20, 30, &[2]),
            game("B", 60, 150, &[2]),
        ];
        let outcome = filter_catalog(&games, &query(), &config);
        let names: Vec<&str> = outcome.entries.iter().map(|e| e.game.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(outcome.adjusted_min, 20);
        assert_eq!(outcome.adjusted_max, 150);
    }

    #[test]
    fn test_empty_outcome_span_zero() {
        let config = ChooserConfig::default();
        let outcome = filter_catalog(&[], &query(), &config);
        assert!(outcome.is_empty());
        assert_eq!(outcome.adjusted_min, 0);
        assert_eq!(outcome.adjusted_max, 0);
    }

    #[test]
    fn test_toggle() {
        let mut q = query();
        q.toggle("Kids", AudienceMode::Include);
        assert_eq!(q.tags(AudienceMode::Include), vec!["Kids"]);
        q.toggle("Kids", AudienceMode::Exclude);
        assert_eq!(q.tags(AudienceMode::Exclude), vec!["Kids"]);
        assert!(q.tags(AudienceMode::Include).is_empty());
        q.toggle("Kids", AudienceMode::Exclude);
        assert!(q.audience.is_empty());
    }

    #[test]
    fn test_validate() {
        let config = ChooserConfig::default();
        assert!(query().validate(&config).is_ok());
        assert!(query().with_players(0).validate(&config).is_err());
        assert!(query().with_players(8).validate(&config).is_err());
        assert!(query().with_time_range(120, 60).validate(&config).is_err());
        assert!(query().with_time_range(120, 190).validate(&config).is_ok());
    }
}
