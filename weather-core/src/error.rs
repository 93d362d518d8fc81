use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a single weather lookup.
///
/// None of these are retried; the first failure ends the lookup.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Contradictory or incomplete request. Correctable by the caller.
    #[error("{0}")]
    Validation(String),

    #[error("{call} request failed")]
    Transport {
        call: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected {call} status: {status}: {body}")]
    ProviderStatus {
        call: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("error decoding {call} JSON")]
    Decode {
        call: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no geocoding results for city: {city}")]
    NotFound { city: String },
}

impl WeatherError {
    /// True for errors the caller caused and can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, WeatherError::Validation(_) | WeatherError::NotFound { .. })
    }
}
