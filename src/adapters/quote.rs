//! Quote of the moment (今日诗词).

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

pub const QUOTE_URL: &str = "https://v2.jinrishici.com/one.json";

/// Returned whenever the quote service cannot be used
pub const DEFAULT_QUOTE: &str = "早上好";

/// Client for the quote endpoint
pub struct QuoteClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    data: QuoteData,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    content: String,
}

impl QuoteClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            endpoint: QUOTE_URL.to_string(),
            client,
        }
    }

    /// Use another endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetch today's quote, falling back to [`DEFAULT_QUOTE`]
    pub async fn fetch_quote(&self) -> String {
        match self.try_fetch().await {
            Ok(quote) => {
                debug!(%quote, "Fetched quote");
                quote
            }
            Err(e) => {
                warn!(error = %e, "Quote unavailable, using default");
                DEFAULT_QUOTE.to_string()
            }
        }
    }

    async fn try_fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .context("Failed to reach quote service")?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("Quote service returned {}", status);
        }

        let body = response.text().await.context("Failed to read quote body")?;
        parse_quote(&body)
    }
}

/// Extract `data.content` from a quote response body
pub fn parse_quote(body: &str) -> Result<String> {
    let parsed: QuoteResponse =
        serde_json::from_str(body).context("Unexpected quote response shape")?;
    let content = parsed.data.content.trim().to_string();
    if content.is_empty() {
        anyhow::bail!("Quote response has empty content");
    }
    Ok(content)
}
