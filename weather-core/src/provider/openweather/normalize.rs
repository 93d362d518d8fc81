//! Maps One Call payloads into the canonical [`WeatherResponse`].

use chrono::{DateTime, Utc};

use super::{OneCallResponse, OwCurrent, OwDaily};
use crate::model::{Weather, WeatherResponse};

/// Hourly samples kept on the current entry.
pub const HOURS_LIMIT: usize = 24;

const KELVIN_OFFSET: f64 = 273.15;
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Builds `days[0]` from `current` plus up to [`HOURS_LIMIT`] hourly
/// samples, followed by the daily entries in provider order.
///
/// Shorter hourly lists are taken whole.
pub fn normalize(raw: OneCallResponse) -> WeatherResponse {
    let mut days = Vec::with_capacity(raw.daily.len() + 1);

    let mut current = instant(&raw.current);
    current.hours = raw.hourly.iter().take(HOURS_LIMIT).map(instant).collect();
    days.push(current);

    days.extend(raw.daily.iter().map(daily));

    tracing::debug!(
        daily = raw.daily.len(),
        hourly_in = raw.hourly.len(),
        hourly_kept = days[0].hours.len(),
        "Normalized OpenWeather forecast"
    );

    WeatherResponse { days }
}

/// Current and hourly entries have a single temperature, so min and max
/// collapse onto it.
fn instant(entry: &OwCurrent) -> Weather {
    let temp = celsius(entry.temp);
    Weather {
        datetime: format_timestamp(entry.dt),
        tempmin: temp,
        tempmax: temp,
        temp,
        humidity: entry.humidity as f32,
        precip: entry.rain.as_ref().map_or(0.0, |r| r.one_hour) as f32,
        snow: entry.snow.as_ref().map_or(0.0, |s| s.one_hour) as f32,
        snowdepth: 0.0,
        windspeed: entry.wind_speed as f32,
        hours: Vec::new(),
    }
}

fn daily(entry: &OwDaily) -> Weather {
    Weather {
        datetime: format_timestamp(entry.dt),
        tempmin: celsius(entry.temp.min),
        tempmax: celsius(entry.temp.max),
        temp: celsius(entry.temp.day),
        humidity: entry.humidity as f32,
        precip: entry.rain.unwrap_or(0.0) as f32,
        snow: entry.snow.unwrap_or(0.0) as f32,
        snowdepth: 0.0,
        windspeed: entry.wind_speed as f32,
        hours: Vec::new(),
    }
}

fn celsius(kelvin: f64) -> f32 {
    (kelvin - KELVIN_OFFSET) as f32
}

fn format_timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_default()
        .format(DATETIME_FORMAT)
        .to_string()
}
