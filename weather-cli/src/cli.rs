use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use weather_core::{
    Config, HistoryStore, Location, ProviderId, SqliteHistory, WeatherRequest, WeatherService,
    provider::default_provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather". Prompted for when omitted.
        provider: Option<String>,
    },

    /// Show weather for a city or a coordinate.
    Show {
        /// City name. Mutually exclusive with --coordinate.
        city: Option<String>,

        /// Coordinate as "lat,lon", e.g. "51.5,-0.12".
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        coordinate: Option<Location>,

        /// Date of interest; defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Print the canonical JSON response instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// List previously recorded lookups, newest first.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(provider.as_deref()),
            Command::Show {
                city,
                coordinate,
                date,
                json,
            } => {
                let config = Config::load()?;
                let provider = default_provider_from_config(&config)?;
                let history = open_history(&config)?;
                let service = WeatherService::new(provider).with_history(history);

                let request = WeatherRequest {
                    city: city.unwrap_or_default(),
                    coordinate: coordinate.unwrap_or_default(),
                    datetime: date.unwrap_or_else(today),
                };

                let weather = service.get_weather(&request).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&weather)?);
                } else {
                    print!("{}", render::weather(&request, &weather));
                }
                Ok(())
            }
            Command::History { limit, json } => {
                let config = Config::load()?;
                let history = open_history(&config)?;
                let entries = history.recent_queries(limit)?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else {
                    print!("{}", render::history(&entries));
                }
                Ok(())
            }
        }
    }
}

fn configure(provider: Option<&str>) -> anyhow::Result<()> {
    let id = match provider {
        Some(name) => ProviderId::try_from(name)?,
        None => inquire::Select::new("Provider:", ProviderId::all().to_vec())
            .prompt()
            .context("Failed to select provider")?,
    };
    let mut config = Config::load()?;

    if config.is_provider_configured(id) {
        println!("An API key for {id} is already configured; it will be replaced.");
    }

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let other_default = config
        .default_provider_id()
        .ok()
        .filter(|current| *current != id);
    let make_default = match other_default {
        Some(current) => inquire::Confirm::new(&format!(
            "Make {id} the default provider instead of {current}?"
        ))
        .with_default(true)
        .prompt()
        .context("Failed to read answer")?,
        None => false,
    };

    store_credentials(&mut config, id, &api_key, make_default)?;
    config.save()?;

    println!(
        "Saved credentials for {id} to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

/// Records `api_key` for `id`. The first configured provider becomes the
/// default; `make_default` switches the default explicitly.
fn store_credentials(
    config: &mut Config,
    id: ProviderId,
    api_key: &str,
    make_default: bool,
) -> anyhow::Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    config.upsert_provider_api_key(id, api_key.to_string());
    if make_default || config.default_provider_id().is_err() {
        config.set_default_provider(id);
    }
    Ok(())
}

fn open_history(config: &Config) -> anyhow::Result<Arc<dyn HistoryStore>> {
    let path = config.history_db_path()?;
    Ok(Arc::new(SqliteHistory::open(&path)?))
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Parses "lat,lon", tolerating spaces around either number. Both parts
/// must be finite and within ±90 / ±180 degrees.
fn parse_coordinate(value: &str) -> Result<Location, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{value}\""))?;

    let lat = parse_degrees("latitude", lat, 90.0)?;
    let lon = parse_degrees("longitude", lon, 180.0)?;

    Ok(Location::new(lat, lon))
}

fn parse_degrees(name: &str, raw: &str, limit: f64) -> Result<f64, String> {
    let raw = raw.trim();
    let value: f64 = raw
        .parse()
        .map_err(|e| format!("invalid {name} \"{raw}\": {e}"))?;

    if !value.is_finite() || value.abs() > limit {
        return Err(format!("{name} must be between -{limit} and {limit}, got \"{raw}\""));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pair() {
        assert_eq!(parse_coordinate("51.5,-0.12").unwrap(), Location::new(51.5, -0.12));
        assert_eq!(parse_coordinate(" 48.8 , 2.3 ").unwrap(), Location::new(48.8, 2.3));
    }

    #[test]
    fn rejects_malformed_coordinate() {
        assert!(parse_coordinate("51.5").unwrap_err().contains("lat,lon"));
        assert!(parse_coordinate("north,-0.12").unwrap_err().contains("latitude"));
        assert!(parse_coordinate("51.5,west").unwrap_err().contains("longitude"));
        assert!(parse_coordinate("1,2,3").is_err());
    }

    #[test]
    fn rejects_non_finite_coordinate() {
        assert!(parse_coordinate("NaN,0").unwrap_err().contains("latitude"));
        assert!(parse_coordinate("0,inf").unwrap_err().contains("longitude"));
        assert!(parse_coordinate("-infinity,1").is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinate() {
        assert!(parse_coordinate("90.5,0").unwrap_err().contains("between -90 and 90"));
        assert!(parse_coordinate("0,-180.01").unwrap_err().contains("between -180 and 180"));
        assert_eq!(parse_coordinate("-90,180").unwrap(), Location::new(-90.0, 180.0));
    }

    #[test]
    fn first_credentials_become_default() {
        let mut config = Config::default();
        store_credentials(&mut config, ProviderId::OpenWeather, "  KEY \n", false).unwrap();

        assert_eq!(config.provider_api_key(ProviderId::OpenWeather), Some("KEY"));
        assert_eq!(config.default_provider_id().unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn make_default_replaces_unusable_default() {
        let mut config = Config {
            default_provider: Some("retired-provider".into()),
            ..Default::default()
        };

        store_credentials(&mut config, ProviderId::OpenWeather, "KEY", true).unwrap();
        assert_eq!(config.default_provider_id().unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let mut config = Config::default();
        let err = store_credentials(&mut config, ProviderId::OpenWeather, "   ", true).unwrap_err();

        assert!(err.to_string().contains("must not be empty"));
        assert!(!config.is_provider_configured(ProviderId::OpenWeather));
        assert!(config.default_provider.is_none());
    }

    #[test]
    fn configure_provider_is_optional() {
        let cli = Cli::try_parse_from(["weather", "configure"]).unwrap();
        assert!(matches!(cli.command, Command::Configure { provider: None }));
    }

    #[test]
    fn show_accepts_negative_coordinate() {
        let cli = Cli::try_parse_from(["weather", "show", "--coordinate", "-33.9,151.2"]).unwrap();
        match cli.command {
            Command::Show { city, coordinate, .. } => {
                assert!(city.is_none());
                assert_eq!(coordinate, Some(Location::new(-33.9, 151.2)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn history_limit_defaults() {
        let cli = Cli::try_parse_from(["weather", "history"]).unwrap();
        assert!(matches!(cli.command, Command::History { limit: 20, json: false }));
    }

    #[test]
    fn today_is_iso_date() {
        let date = today();
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }
}
