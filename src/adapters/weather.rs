//! Current weather (Seniverse `now` endpoint).
//!
//! Response contract: `results[0].now.text` and `results[0].now.temperature`.
//! The flat `{"text": .., "temperature": ..}` shape is not accepted.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Secret;

pub const WEATHER_URL: &str = "https://api.seniverse.com/v3/weather/now.json";

/// Returned whenever the weather service cannot be used
pub const DEFAULT_WEATHER: &str = "今天天气:晴";

/// A current weather reading
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherReading {
    pub text: String,
    pub temperature: String,
}

impl WeatherReading {
    /// Caption line, e.g. `今天天气:晴,温度:20度`
    pub fn line(&self) -> String {
        format!("今天天气:{},温度:{}度", self.text, self.temperature)
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    results: Vec<WeatherResult>,
}

#[derive(Debug, Deserialize)]
struct WeatherResult {
    now: WeatherReading,
}

/// Client for the weather endpoint
pub struct WeatherClient {
    endpoint: String,
    api_key: Option<Secret>,
    location: String,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(client: reqwest::Client, api_key: Option<Secret>, location: impl Into<String>) -> Self {
        Self {
            endpoint: WEATHER_URL.to_string(),
            api_key,
            location: location.into(),
            client,
        }
    }

    /// Use another endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetch the weather line, falling back to [`DEFAULT_WEATHER`]
    pub async fn fetch_weather(&self) -> String {
        match self.try_fetch().await {
            Ok(reading) => {
                debug!(text = %reading.text, temperature = %reading.temperature, "Fetched weather");
                reading.line()
            }
            Err(e) => {
                warn!(error = %e, "Weather unavailable, using default");
                DEFAULT_WEATHER.to_string()
            }
        }
    }

    async fn try_fetch(&self) -> Result<WeatherReading> {
        let api_key = self
            .api_key
            .as_ref()
            .context("No weather API key configured")?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", api_key.expose()),
                ("location", self.location.as_str()),
                ("language", "zh-Hans"),
                ("unit", "c"),
            ])
            .send()
            .await
            // The URL carries the key
            .map_err(|e| e.without_url())
            .context("Failed to reach weather service")?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("Weather service returned {}", status);
        }

        let body = response
            .text()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to read weather body")?;
        parse_weather(&body)
    }
}

/// Extract the first reading from a weather response body
pub fn parse_weather(body: &str) -> Result<WeatherReading> {
    let parsed: WeatherResponse =
        serde_json::from_str(body).context("Unexpected weather response shape")?;
    parsed
        .results
        .into_iter()
        .next()
        .map(|r| r.now)
        .context("Weather response has no results")
}
