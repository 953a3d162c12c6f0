//! Bing Image Creator provider (cookie authenticated).
//!
//! Protocol:
//! 1. POST /images/create with the prompt; a 302 redirect carries the request id
//! 2. Poll /images/create/async/results/<id> until the result page is ready
//!    (an empty body or an `errorMessage` body means still rendering)
//! 3. Scrape image URLs from the page and download them into the working directory

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{COOKIE, LOCATION, REFERER, USER_AGENT};
use reqwest::{redirect, StatusCode};
use tracing::{debug, info, instrument};

use super::{persist_images, shape_result, ImageProvider, ProviderError, ProviderOutcome};
use crate::config::{BingCredentials, ImageSettings};

pub const BING_URL: &str = "https://www.bing.com";

const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";

const BLOCKED_MARKER: &str = "this prompt has been blocked";

/// Present in result-poll bodies while images are still rendering
const PENDING_MARKER: &str = "errorMessage";

const IMAGE_SRC_PATTERN: &str = r#"src="([^"]+)""#;

/// Submission modes tried in order; the site answers one or the other with a redirect
const SUBMIT_MODES: [&str; 2] = ["4", "3"];

/// Cookie-authenticated image generator
pub struct BingImageCreator {
    credentials: BingCredentials,
    base_url: String,
    work_dir: PathBuf,
    settings: ImageSettings,
    image_src: Regex,
    /// HTTP client (redirects disabled so the request id can be read)
    client: reqwest::Client,
}

impl BingImageCreator {
    /// Create a new provider writing images to `work_dir`
    pub fn new(
        credentials: BingCredentials,
        work_dir: impl Into<PathBuf>,
        settings: ImageSettings,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to build Bing HTTP client")?;
        let image_src = Regex::new(IMAGE_SRC_PATTERN).context("Invalid image src pattern")?;

        Ok(Self {
            credentials,
            base_url: BING_URL.to_string(),
            work_dir: work_dir.into(),
            settings,
            image_src,
            client,
        })
    }

    /// Point the provider at another host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn cookie_header(&self) -> String {
        let mut cookie = format!("_U={}", self.credentials.auth_cookie.expose());
        if let Some(identity) = &self.credentials.identity_cookie {
            cookie.push_str("; SRCHHPGUSR=");
            cookie.push_str(identity.expose());
        }
        cookie
    }

    /// Submit the prompt and return the request id
    async fn submit(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        let encoded = urlencoding::encode(prompt);
        let mut last_error = None;

        for mode in SUBMIT_MODES {
            let url = format!(
                "{}/images/create?q={}&rt={}&FORM=GENCRE",
                self.base_url, encoded, mode
            );

            let response = self
                .client
                .post(&url)
                .header(COOKIE, self.cookie_header())
                .header(USER_AGENT, BROWSER_AGENT)
                .header(REFERER, format!("{}/images/create", self.base_url))
                .form(&[("q", prompt), ("qs", "ds")])
                .send()
                .await
                .map_err(ProviderError::network)?;

            if response.status() == StatusCode::FOUND {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| ProviderError::MalformedResponse("redirect without location".into()))?;

                return request_id_from_location(location).ok_or_else(|| {
                    ProviderError::MalformedResponse(format!("no request id in redirect: {}", location))
                });
            }

            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            if body.to_lowercase().contains(BLOCKED_MARKER) {
                return Err(ProviderError::Rejected("prompt has been blocked".into()));
            }

            debug!(mode, status, "Submission was not redirected");
            last_error = Some(ProviderError::Status {
                status,
                body: truncate(&body, 200),
            });
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::MalformedResponse("no submission attempted".into())
        }))
    }

    /// Poll the result page until it has content
    async fn poll_results(
        &self,
        request_id: &str,
        prompt: &str,
    ) -> std::result::Result<String, ProviderError> {
        let url = format!(
            "{}/images/create/async/results/{}?q={}",
            self.base_url,
            request_id,
            urlencoding::encode(prompt)
        );

        for attempt in 1..=self.settings.max_polls {
            let response = self
                .client
                .get(&url)
                .header(COOKIE, self.cookie_header())
                .header(USER_AGENT, BROWSER_AGENT)
                .send()
                .await
                .map_err(ProviderError::network)?;

            let status = response.status();
            let body = response.text().await.map_err(ProviderError::network)?;
            if !status.is_success() {
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: truncate(&body, 200),
                });
            }

            if is_pending(&body) {
                debug!(attempt, "Images still rendering");
            } else {
                debug!(attempt, "Result page ready");
                return Ok(body);
            }

            if attempt < self.settings.max_polls {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }

        Err(ProviderError::TimedOut(self.settings.max_polls))
    }

    async fn download(&self, urls: &[String]) -> std::result::Result<Vec<Vec<u8>>, ProviderError> {
        let mut images = Vec::with_capacity(urls.len());
        for url in urls {
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, BROWSER_AGENT)
                .send()
                .await
                .map_err(ProviderError::network)?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: format!("image download failed: {}", url),
                });
            }

            let bytes = response.bytes().await.map_err(ProviderError::network)?;
            images.push(bytes.to_vec());
        }
        Ok(images)
    }
}

#[async_trait]
impl ImageProvider for BingImageCreator {
    fn name(&self) -> &str {
        "bing"
    }

    #[instrument(skip(self, prompt), fields(provider = "bing"))]
    async fn generate(&self, prompt: &str) -> ProviderOutcome {
        let request_id = self.submit(prompt).await?;
        let page = self.poll_results(&request_id, prompt).await?;

        if page.to_lowercase().contains(BLOCKED_MARKER) {
            return Err(ProviderError::Rejected("prompt has been blocked".into()));
        }

        let urls = extract_image_urls(&self.image_src, &page);
        if urls.is_empty() {
            return Err(ProviderError::EmptyResult);
        }
        info!(count = urls.len(), "Bing returned images");

        let images = self.download(&urls).await?;
        let files = persist_images(&self.work_dir, &images, "jpeg").await?;
        shape_result(self.settings.delivery, images, files)
    }
}

/// Extract the request id from the submission redirect
pub fn request_id_from_location(location: &str) -> Option<String> {
    let (_, tail) = location.rsplit_once("id=")?;
    let id = tail.split('&').next().unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// A poll body that is empty or carries `errorMessage` is not the result page yet
fn is_pending(body: &str) -> bool {
    body.trim().is_empty() || body.contains(PENDING_MARKER)
}

/// Scrape generated image URLs from a result page.
///
/// Query strings (thumbnail sizing) are dropped, duplicates removed in
/// order, and the site's own static assets skipped.
pub fn extract_image_urls(pattern: &Regex, page: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for capture in pattern.captures_iter(page) {
        let src = &capture[1];
        let url = src.split('?').next().unwrap_or(src);

        if !url.starts_with("http") || url.ends_with(".svg") || url.contains("/rp/") {
            continue;
        }
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
