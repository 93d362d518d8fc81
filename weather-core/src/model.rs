use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// A coordinate pair. `(0.0, 0.0)` means "not set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_set(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// A lookup by city name or by coordinate, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherRequest {
    pub city: String,
    pub coordinate: Location,
    pub datetime: String,
}

impl WeatherRequest {
    pub fn for_city(city: impl Into<String>, datetime: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            coordinate: Location::default(),
            datetime: datetime.into(),
        }
    }

    pub fn for_coordinate(coordinate: Location, datetime: impl Into<String>) -> Self {
        Self {
            city: String::new(),
            coordinate,
            datetime: datetime.into(),
        }
    }

    /// Checks that `datetime` is present and that exactly one of city or
    /// coordinate is given. Supplying neither fails the same way as both.
    pub fn validate(&self) -> Result<(), WeatherError> {
        if self.datetime.is_empty() {
            return Err(WeatherError::Validation("datetime field required".into()));
        }

        let has_city = !self.city.is_empty();
        let has_location = self.coordinate.is_set();

        if has_city == has_location {
            return Err(WeatherError::Validation(
                "either city or location coordinates must be provided, but not both".into(),
            ));
        }

        Ok(())
    }
}

/// One time slice of weather. Temperatures in Celsius, precipitation in mm,
/// wind in m/s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub datetime: String,
    pub tempmin: f32,
    pub tempmax: f32,
    pub temp: f32,
    pub humidity: f32,
    pub precip: f32,
    pub snow: f32,
    pub snowdepth: f32,
    pub windspeed: f32,
    /// Only filled on the current entry.
    pub hours: Vec<Weather>,
}

/// Canonical response: `days[0]` is the current observation with its hourly
/// samples, `days[1..]` the daily forecasts in provider order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub days: Vec<Weather>,
}

impl WeatherResponse {
    pub fn current(&self) -> Option<&Weather> {
        self.days.first()
    }

    pub fn forecast(&self) -> &[Weather] {
        self.days.get(1..).unwrap_or_default()
    }
}
