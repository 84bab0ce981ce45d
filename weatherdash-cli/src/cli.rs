use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use std::path::PathBuf;

use weatherdash_core::{
    Config, LocationQuery, OpenWeatherClient, UnitSystem, WeatherProvider, WeatherSnapshot,
    WeatherStore, location, parse_location_input, provider::provider_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather lookups with favorites and history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Unit system: metric, imperial or standard. Defaults to the configured value.
    #[arg(long, global = true)]
    pub units: Option<UnitSystem>,

    /// Show debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key and defaults interactively.
    Configure,

    /// Current weather for a location (defaults to the configured city).
    Current { location: Option<String> },

    /// 5-day forecast in 3-hour steps.
    Forecast { location: Option<String> },

    /// Daily summaries built from the 5-day forecast.
    Daily {
        location: Option<String>,

        #[arg(long, default_value_t = 5)]
        days: usize,
    },

    /// 7-day forecast.
    Weekly { location: Option<String> },

    /// Hourly forecast.
    Hourly {
        location: Option<String>,

        #[arg(long, default_value_t = 24)]
        hours: usize,
    },

    /// Compare current weather across several locations.
    Compare {
        #[arg(required = true)]
        locations: Vec<String>,
    },

    /// Popular cities, optionally filtered by a name fragment.
    Cities { fragment: Option<String> },

    /// Manage favorite locations.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Show or clear search history.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Saved weather records.
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },

    /// Item counts for each stored collection.
    Stats,

    /// Write favorites, history and records to a JSON file.
    Export { path: PathBuf },

    /// Restore collections from a JSON file produced by `export`.
    Import { path: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    Add { name: String, query: String },
    Remove { query: String },
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum RecordsAction {
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Only records for this location label, e.g. "Seoul, KR".
        #[arg(long)]
        location: Option<String>,
    },
    /// Fetch current weather and save a snapshot of it.
    Save {
        location: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },
    /// Delete the record with this exact timestamp (as shown by `list`).
    Delete { timestamp: String },
}

/// Everything a command needs, built once in `run`.
struct App {
    config: Config,
    client: OpenWeatherClient,
    store: WeatherStore,
    units: UnitSystem,
}

impl App {
    fn build(units: Option<UnitSystem>) -> Result<Self> {
        let config = Config::load()?;
        let client = provider_from_config(&config)?;
        let store = WeatherStore::new(config.data_dir()?);
        let units = units.unwrap_or(config.units);

        if !client.has_api_key() {
            tracing::warn!("no API key configured; weather requests will fail");
        }

        Ok(Self {
            config,
            client,
            store,
            units,
        })
    }

    fn location(&self, input: Option<String>) -> Result<LocationQuery> {
        let input = input.unwrap_or_else(|| self.config.default_location());
        Ok(parse_location_input(&input)?)
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            // Must work before any config or API key exists.
            Command::Configure => configure(),
            command => App::build(self.units)?.execute(command).await,
        }
    }
}

impl App {
    async fn execute(&self, command: Command) -> Result<()> {
        let ctx = self;

        match command {
            Command::Configure => configure()?,
            Command::Current { location } => {
                let query = ctx.location(location)?;
                let result = ctx.client.current_weather(&query, ctx.units).await;

                if let Some(city) = query.as_city() {
                    ctx.store.add_search_history(city, result.is_ok());
                }

                output::current(&result?, ctx.units);
            }
            Command::Forecast { location } => {
                let query = ctx.location(location)?;
                let entries = ctx.client.forecast(&query, ctx.units).await?;
                output::forecast(&entries, ctx.units);
            }
            Command::Daily { location, days } => {
                let query = ctx.location(location)?;
                let days = ctx.client.daily_forecast(&query, ctx.units, Some(days)).await?;
                output::daily(&days, ctx.units);
            }
            Command::Weekly { location } => {
                let query = ctx.location(location)?;
                let weekly = ctx.client.weekly_forecast(&query, ctx.units).await?;
                output::weekly(&weekly, ctx.units);
            }
            Command::Hourly { location, hours } => {
                let query = ctx.location(location)?;
                let hourly = ctx.client.hourly_forecast(&query, ctx.units, Some(hours)).await?;
                output::hourly(&hourly, ctx.units);
            }
            Command::Compare { locations } => {
                let mut queries = Vec::with_capacity(locations.len());
                for input in &locations {
                    match parse_location_input(input) {
                        Ok(q) => queries.push(q),
                        Err(err) => tracing::warn!(input = %input, "skipping: {err}"),
                    }
                }
                let results = ctx.client.current_weather_many(&queries, ctx.units).await;
                output::comparison(&results, ctx.units);
            }
            Command::Cities { fragment } => match fragment {
                Some(fragment) => output::city_matches(&location::search_korean_cities(&fragment)),
                None => output::city_groups(location::popular_cities()),
            },
            Command::Favorites { action } => favorites(ctx, action)?,
            Command::History { action } => match action {
                HistoryAction::List { limit } => output::history(&ctx.store.search_history(limit)),
                HistoryAction::Clear => report(ctx.store.clear_search_history(), "History cleared.")?,
            },
            Command::Records { action } => records(ctx, action).await?,
            Command::Stats => output::stats(&ctx.store.storage_stats(), ctx.store.dir()),
            Command::Export { path } => {
                let bundle = ctx.store.export_data();
                let json = serde_json::to_string_pretty(&bundle)
                    .context("Failed to serialize export data")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write export file: {}", path.display()))?;
                println!("Exported data to {}", path.display());
            }
            Command::Import { path } => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read import file: {}", path.display()))?;
                report(ctx.store.import_json(&json), "Import complete.")?;
            }
        }

        Ok(())
    }
}

fn report(ok: bool, message: &str) -> Result<()> {
    if ok {
        println!("{message}");
        Ok(())
    } else {
        Err(anyhow!("Storage operation failed; see log output for details."))
    }
}

fn favorites(ctx: &App, action: FavoritesAction) -> Result<()> {
    match action {
        FavoritesAction::List => output::favorites(&ctx.store.favorites()),
        FavoritesAction::Add { name, query } => {
            let parsed = parse_location_input(&query)?;
            if ctx.store.is_favorite(&query) {
                println!("'{query}' is already a favorite.");
                return Ok(());
            }
            let (lat, lon) = parsed.as_coordinates().unzip();
            report(
                ctx.store.add_favorite(&name, &query, lat, lon),
                &format!("Added '{name}' ({query}) to favorites."),
            )?;
        }
        FavoritesAction::Remove { query } => {
            if !ctx.store.remove_favorite(&query) {
                return Err(anyhow!("'{query}' is not a favorite."));
            }
            println!("Removed '{query}' from favorites.");
        }
    }
    Ok(())
}

async fn records(ctx: &App, action: RecordsAction) -> Result<()> {
    match action {
        RecordsAction::List { limit, location } => {
            let records = match location {
                Some(label) => {
                    let mut records = ctx.store.weather_records_by_location(&label);
                    records.truncate(limit);
                    records
                }
                None => ctx.store.saved_weather(limit),
            };
            output::records(&records, ctx.units);
        }
        RecordsAction::Save { location, note } => {
            let query = ctx.location(location)?;
            let weather = ctx.client.current_weather(&query, ctx.units).await?;
            report(
                ctx.store.save_weather_record(
                    &weather.location_label(),
                    WeatherSnapshot::from(&weather),
                    note,
                ),
                &format!("Saved weather for {}.", weather.location_label()),
            )?;
        }
        RecordsAction::Delete { timestamp } => {
            let ts: DateTime<Utc> = timestamp
                .parse()
                .with_context(|| format!("Invalid timestamp '{timestamp}'"))?;
            if !ctx.store.delete_weather_record(&ts) {
                return Err(anyhow!("No record with timestamp {timestamp}."));
            }
            println!("Deleted record {timestamp}.");
        }
    }
    Ok(())
}

fn configure() -> Result<()> {
    let path = Config::config_file_path()?;
    let mut cfg = Config::load_from(&path)?;

    let key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()
        .context("Failed to read API key")?;
    if !key.trim().is_empty() {
        cfg.set_api_key(key.trim().to_string());
    }

    let units = Select::new("Unit system:", UnitSystem::all().to_vec())
        .prompt()
        .context("Failed to read unit system")?;
    cfg.units = units;

    cfg.default_city = Text::new("Default city:")
        .with_default(&cfg.default_city)
        .prompt()
        .context("Failed to read default city")?;
    cfg.default_country = Text::new("Default country code:")
        .with_default(&cfg.default_country)
        .prompt()
        .context("Failed to read default country")?;

    cfg.save_to(&path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_parses_without_other_arguments() {
        let cli = Cli::try_parse_from(["weatherdash", "configure"]).unwrap();
        assert!(matches!(cli.command, Command::Configure));
        assert_eq!(cli.units, None);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli =
            Cli::try_parse_from(["weatherdash", "hourly", "서울", "--hours", "12", "--units", "imperial", "-q"])
                .unwrap();

        assert_eq!(cli.units, Some(UnitSystem::Imperial));
        assert!(cli.quiet);
        match cli.command {
            Command::Hourly { location, hours } => {
                assert_eq!(location.as_deref(), Some("서울"));
                assert_eq!(hours, 12);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["weatherdash", "-v", "-q", "stats"]).is_err());
    }

    #[test]
    fn unknown_units_are_rejected() {
        assert!(Cli::try_parse_from(["weatherdash", "--units", "kelvin", "current"]).is_err());
    }
}
