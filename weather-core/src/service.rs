//! Orchestrates a single weather lookup: validate, geocode when needed,
//! fetch and normalize, then record the query.

use std::sync::Arc;

use crate::{
    error::WeatherError,
    history::HistoryStore,
    model::{WeatherRequest, WeatherResponse},
    provider::WeatherProvider,
};

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            history: None,
        }
    }

    /// Records every successful lookup in `history`.
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Runs one lookup. Failing to record the query is logged and does not
    /// affect the result.
    pub async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherResponse, WeatherError> {
        if let Err(err) = request.validate() {
            tracing::warn!(error = %err, ?request, "Invalid weather request");
            return Err(err);
        }

        let location = if request.city.is_empty() {
            request.coordinate
        } else {
            self.provider.geocode(&request.city).await?
        };

        let weather = self.provider.forecast(location).await?;

        tracing::info!(
            city = %request.city,
            lat = location.latitude,
            lon = location.longitude,
            days = weather.days.len(),
            "Weather retrieved"
        );

        if let Some(history) = &self.history {
            record(Arc::clone(history), request.city.clone(), weather.clone()).await;
        }

        Ok(weather)
    }
}

/// Saves on the blocking pool; stores may do synchronous I/O.
async fn record(history: Arc<dyn HistoryStore>, city: String, weather: WeatherResponse) {
    let saved =
        tokio::task::spawn_blocking(move || history.save_weather_query(&city, &weather)).await;

    match saved {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(error = %err, "Failed to save weather query"),
        Err(err) => tracing::error!(error = %err, "History writer task failed"),
    }
}
