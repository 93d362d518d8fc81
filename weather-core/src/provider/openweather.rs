use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::WeatherError,
    model::{Location, WeatherResponse},
};

use super::WeatherProvider;

mod normalize;

pub use normalize::{HOURS_LIMIT, normalize};

pub const DEFAULT_GEOCODING_URL: &str =
    "https://api.openweathermap.org/geo/1.0/direct?q={city}&limit=5&appid={api_key}";
pub const DEFAULT_FORECAST_URL: &str =
    "https://api.openweathermap.org/data/3.0/onecall?lat={lat}&lon={lon}&appid={api_key}";

const GEOCODING: &str = "geocoding";
const FORECAST: &str = "forecast";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_client(api_key, Client::new())
    }

    pub fn with_client(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            http,
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
        }
    }

    /// Overrides the geocoding URL template (`{city}`, `{api_key}`).
    pub fn geocoding_url(mut self, template: impl Into<String>) -> Self {
        self.geocoding_url = template.into();
        self
    }

    /// Overrides the forecast URL template (`{lat}`, `{lon}`, `{api_key}`).
    pub fn forecast_url(mut self, template: impl Into<String>) -> Self {
        self.forecast_url = template.into();
        self
    }

    pub fn geocoding_request_url(&self, city: &str) -> String {
        let city: String = url::form_urlencoded::byte_serialize(city.as_bytes()).collect();
        render(&self.geocoding_url, &[("city", &city), ("api_key", &self.api_key)])
    }

    pub fn forecast_request_url(&self, lat: f64, lon: f64) -> String {
        render(
            &self.forecast_url,
            &[
                ("lat", &format!("{lat:.6}")),
                ("lon", &format!("{lon:.6}")),
                ("api_key", &self.api_key),
            ],
        )
    }

    /// Raw One Call payload for a coordinate. No unit conversion happens here.
    pub async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<OneCallResponse, WeatherError> {
        let url = self.forecast_request_url(lat, lon);
        self.get_json(FORECAST, &url).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        call: &'static str,
        url: &str,
    ) -> Result<T, WeatherError> {
        tracing::info!(call, url = %redact(url, &self.api_key), "Calling OpenWeather");

        let res = self.http.get(url).send().await.map_err(|source| {
            tracing::error!(call, error = %source, "OpenWeather request failed");
            WeatherError::Transport { call, source }
        })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Transport { call, source })?;

        if status != StatusCode::OK {
            tracing::error!(call, %status, "Unexpected OpenWeather status");
            return Err(WeatherError::ProviderStatus {
                call,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| {
            tracing::error!(call, error = %source, "Error decoding OpenWeather JSON");
            WeatherError::Decode { call, source }
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwGeocode {
    lat: f64,
    lon: f64,
}

/// Precipitation sub-object of current and hourly entries. Absent means zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwPrecip {
    #[serde(rename = "1h", default)]
    pub one_hour: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrent {
    pub dt: i64,
    pub temp: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub rain: Option<OwPrecip>,
    #[serde(default)]
    pub snow: Option<OwPrecip>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwDailyTemp {
    pub min: f64,
    pub max: f64,
    pub day: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwDaily {
    pub dt: i64,
    pub temp: OwDailyTemp,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub rain: Option<f64>,
    #[serde(default)]
    pub snow: Option<f64>,
}

/// The subset of the One Call response this crate uses.
#[derive(Debug, Clone, Deserialize)]
pub struct OneCallResponse {
    pub current: OwCurrent,
    #[serde(default)]
    pub hourly: Vec<OwCurrent>,
    #[serde(default)]
    pub daily: Vec<OwDaily>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, city: &str) -> Result<Location, WeatherError> {
        let url = self.geocoding_request_url(city);
        let results: Vec<OwGeocode> = self.get_json(GEOCODING, &url).await?;

        let first = results.first().ok_or_else(|| {
            tracing::error!(city, "No geocoding results found");
            WeatherError::NotFound { city: city.to_string() }
        })?;

        tracing::debug!(city, matches = results.len(), lat = first.lat, lon = first.lon, "Geocoded city");
        Ok(Location::new(first.lat, first.lon))
    }

    async fn forecast(&self, location: Location) -> Result<WeatherResponse, WeatherError> {
        let raw = self.fetch_forecast(location.latitude, location.longitude).await?;
        Ok(normalize(raw))
    }
}

fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

fn redact(url: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        url.to_string()
    } else {
        url.replace(api_key, "***")
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geocoding_url_escapes_city() {
        let provider = OpenWeatherProvider::new("KEY".into());
        let url = provider.geocoding_request_url("São Paulo & Co");

        assert!(url.starts_with("https://api.openweathermap.org/geo/1.0/direct?q="));
        assert!(url.contains("q=S%C3%A3o+Paulo+%26+Co&"));
        assert!(url.ends_with("appid=KEY"));
    }

    #[test]
    fn forecast_url_uses_six_decimals() {
        let provider = OpenWeatherProvider::new("KEY".into())
            .forecast_url("http://localhost:1234/onecall?lat={lat}&lon={lon}&appid={api_key}");

        assert_eq!(
            provider.forecast_request_url(51.5, -0.12),
            "http://localhost:1234/onecall?lat=51.500000&lon=-0.120000&appid=KEY"
        );
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        assert_eq!(render("{a}/{b}", &[("a", "1")]), "1/{b}");
    }

    #[test]
    fn redact_hides_api_key() {
        assert_eq!(redact("http://x?appid=SECRET", "SECRET"), "http://x?appid=***");
        assert_eq!(redact("http://x", ""), "http://x");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(250);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn one_call_defaults_optional_blocks() {
        let raw: OneCallResponse = serde_json::from_str(
            r#"{"current": {"dt": 1717243200, "temp": 290.0, "humidity": 70, "wind_speed": 3.5}}"#,
        )
        .unwrap();

        assert!(raw.hourly.is_empty());
        assert!(raw.daily.is_empty());
        assert!(raw.current.rain.is_none());
        assert!(raw.current.snow.is_none());
    }

    #[test]
    fn one_call_reads_precip_sub_objects() {
        let raw: OneCallResponse = serde_json::from_str(
            r#"{
                "current": {"dt": 0, "temp": 273.15, "rain": {"1h": 0.4}, "snow": {}},
                "daily": [{"dt": 0, "temp": {"min": 1, "max": 2, "day": 3}, "rain": 5.5}]
            }"#,
        )
        .unwrap();

        assert_eq!(raw.current.rain.as_ref().map(|r| r.one_hour), Some(0.4));
        assert_eq!(raw.current.snow.as_ref().map(|s| s.one_hour), Some(0.0));
        assert_eq!(raw.daily[0].rain, Some(5.5));
        assert_eq!(raw.daily[0].snow, None);
    }
}
