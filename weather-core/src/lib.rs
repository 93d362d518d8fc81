//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Request validation and the canonical weather model
//! - Abstraction over weather providers, with an OpenWeather implementation
//! - The lookup service tying geocoding, forecast and query history together
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod service;

pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use history::{HistoryEntry, HistoryStore, SqliteHistory};
pub use model::{Location, Weather, WeatherRequest, WeatherResponse};
pub use provider::{ProviderId, WeatherProvider};
pub use service::WeatherService;
