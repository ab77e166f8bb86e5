//! Board Game Chooser CLI
//!
//! Loads the game catalog from a Google Sheet or a local CSV export, then picks
//! games matching a player count, play time range and audience selection.

use anyhow::{Context, Result};
use boardgame_chooser::config::{settings_path, Settings};
use boardgame_chooser::pipeline::{self, ChooseOptions, SourceSpec};
use boardgame_chooser::{ChooserConfig, FilterQuery, SortPreference};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bgchooser")]
#[command(about = "Pick a board game by players, play time and audience")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to read games from. Falls back to the saved sheet settings.
#[derive(Args)]
struct SourceArgs {
    /// Local CSV export (first row is the header row)
    #[arg(long, conflicts_with = "sheet_id")]
    csv: Option<PathBuf>,

    /// Google Sheets document id
    #[arg(long)]
    sheet_id: Option<String>,

    /// Google Sheets API key
    #[arg(long, env = "BGCHOOSER_API_KEY")]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the catalog and suggest games
    Choose {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of players (7 means "7+", but only matches games listing 7)
        #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=7))]
        players: u32,

        /// Minimum play time in minutes (0 = any)
        #[arg(long, default_value = "0")]
        min_time: u32,

        /// Maximum play time in minutes (190 = any)
        #[arg(long, default_value = "190")]
        max_time: u32,

        /// Audience tag that games must have (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Audience tag that games must not have (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Result order: random, alphabetical, longest, shortest (default: saved setting)
        #[arg(short, long)]
        sort: Option<SortPreference>,

        /// Seed for a reproducible random pick
        #[arg(long)]
        seed: Option<u64>,

        /// Hide play times
        #[arg(long)]
        hide_time: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the raw sheet for inspection
    Library {
        #[command(flatten)]
        source: SourceArgs,

        /// Column to sort by (index or header name)
        #[arg(long)]
        sort_col: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Fetch the sheet and save it as CSV for offline use
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show or update saved settings
    Settings {
        /// Default result order
        #[arg(long)]
        sort: Option<SortPreference>,

        /// Show play times in results
        #[arg(long)]
        show_time: Option<bool>,

        /// Default Google Sheets document id
        #[arg(long)]
        sheet_id: Option<String>,

        /// Default Google Sheets API key
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn resolve_source(args: SourceArgs, settings: &Settings) -> Result<SourceSpec> {
    if let Some(path) = args.csv {
        return Ok(SourceSpec::Csv(path));
    }
    let sheet_id = args
        .sheet_id
        .or_else(|| settings.sheet_id.clone())
        .context("No source given: pass --csv or --sheet-id (or save one with `settings --sheet-id`)")?;
    let api_key = args
        .api_key
        .or_else(|| settings.api_key.clone())
        .context("No API key: pass --api-key, set BGCHOOSER_API_KEY, or save one with `settings --api-key`")?;
    Ok(SourceSpec::Sheets { sheet_id, api_key })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings_file = settings_path();
    let settings = settings_file
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();
    let config = Arc::new(ChooserConfig::default());

    match cli.command {
        Commands::Choose {
            source,
            players,
            min_time,
            max_time,
            include,
            exclude,
            sort,
            seed,
            hide_time,
            json,
        } => {
            let source = resolve_source(source, &settings)?;
            let catalog = pipeline::load_catalog(&source, config.clone())?;

            let mut query = FilterQuery::new(&config)
                .with_players(players)
                .with_time_range(min_time, max_time);
            for tag in &include {
                query = query.include(tag);
            }
            for tag in &exclude {
                query = query.exclude(tag);
            }

            let options = ChooseOptions {
                query,
                preference: sort.unwrap_or(settings.sort_preference),
                show_play_time: settings.show_play_time && !hide_time,
                seed,
                json,
            };
            print!("{}", pipeline::choose(&catalog, &options, &config)?);
        }
        Commands::Library {
            source,
            sort_col,
            desc,
        } => {
            let source = resolve_source(source, &settings)?;
            let catalog = pipeline::load_catalog(&source, config)?;
            print!(
                "{}",
                pipeline::library_report(&catalog, sort_col.as_deref(), desc)?
            );
        }
        Commands::Export { source, output } => {
            let source = resolve_source(source, &settings)?;
            println!("{}", pipeline::export_table(&source, &output)?);
        }
        Commands::Settings {
            sort,
            show_time,
            sheet_id,
            api_key,
        } => {
            let mut updated = settings.clone();
            if let Some(sort) = sort {
                updated.sort_preference = sort;
            }
            if let Some(show) = show_time {
                updated.show_play_time = show;
            }
            if let Some(id) = sheet_id {
                updated.sheet_id = Some(id);
            }
            if let Some(key) = api_key {
                updated.api_key = Some(key);
            }

            if updated != settings {
                let path = settings_file.context("HOME is not set; cannot save settings")?;
                updated.save(&path)?;
                eprintln!("Saved settings to {}", path.display());
            }
            print!("{}", updated.to_display_string());
        }
    }

    Ok(())
}
