//! Plain-text rendering for terminal output.

use weather_core::{HistoryEntry, Weather, WeatherRequest, WeatherResponse};

pub fn weather(request: &WeatherRequest, response: &WeatherResponse) -> String {
    let mut lines = vec![format!("Weather for {} ({})", place(request), request.datetime)];

    if let Some(current) = response.current() {
        lines.push(String::new());
        lines.push(format!("Now, {} UTC", current.datetime));
        lines.push(format!("  {}", conditions(current)));

        if !current.hours.is_empty() {
            lines.push(String::new());
            lines.push("Next hours:".to_string());
            lines.extend(current.hours.iter().map(|hour| {
                format!("  {}  {:>6.1}°C  {}", hour.datetime, hour.temp, precipitation(hour))
            }));
        }
    }

    let forecast = response.forecast();
    if !forecast.is_empty() {
        lines.push(String::new());
        lines.push("Forecast:".to_string());
        lines.extend(forecast.iter().map(|day| {
            format!(
                "  {}  {:>6.1}°C .. {:>6.1}°C  (day {:.1}°C)  {}",
                date_part(&day.datetime),
                day.tempmin,
                day.tempmax,
                day.temp,
                precipitation(day)
            )
        }));
    }

    lines.join("\n") + "\n"
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No recorded lookups yet.\n".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            let city = if entry.city.is_empty() { "(coordinates)" } else { entry.city.as_str() };
            let temp = entry
                .weather
                .current()
                .map(|c| format!("{:.1}°C", c.temp))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "#{:<5} {}  {:<20} {:>8}  {} days\n",
                entry.id,
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                city,
                temp,
                entry.weather.forecast().len()
            )
        })
        .collect()
}

fn place(request: &WeatherRequest) -> String {
    if request.city.is_empty() {
        format!(
            "{:.4}, {:.4}",
            request.coordinate.latitude, request.coordinate.longitude
        )
    } else {
        request.city.clone()
    }
}

fn conditions(w: &Weather) -> String {
    format!(
        "{:.1}°C, humidity {:.0}%, wind {:.1} m/s, {}",
        w.temp,
        w.humidity,
        w.windspeed,
        precipitation(w)
    )
}

fn precipitation(w: &Weather) -> String {
    if w.snow > 0.0 {
        format!("rain {:.1} mm, snow {:.1} mm", w.precip, w.snow)
    } else {
        format!("rain {:.1} mm", w.precip)
    }
}

fn date_part(datetime: &str) -> &str {
    datetime.split_once(' ').map_or(datetime, |(date, _)| date)
}
