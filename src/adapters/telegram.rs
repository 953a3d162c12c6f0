//! Telegram Bot API adapter.
//!
//! Uploads photos, albums and audio files to the configured chat.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::MessageChannel;
use crate::config::Secret;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Uploads are larger than the other calls, so they get a longer bound
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Telegram accepts at most this many items per album
pub const MAX_MEDIA_GROUP: usize = 10;

/// Telegram Bot API client
pub struct TelegramClient {
    /// Bot token
    bot_token: Secret,
    /// Target chat ID
    chat_id: String,
    api_base: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response from Telegram API
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Message result from sendPhoto/sendAudio
#[derive(Debug, Deserialize)]
struct MessageResult {
    message_id: i64,
}

/// Configuration for Telegram client
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Secret,
    pub chat_id: String,
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(bot_token: Secret, chat_id: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            bot_token,
            chat_id,
            api_base: TELEGRAM_API.to_string(),
            client,
        })
    }

    /// Create from config
    pub fn from_config(config: TelegramConfig) -> Result<Self> {
        Self::new(config.bot_token, config.chat_id)
    }

    /// Point the client at another Bot API server
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Build API URL
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token.expose(), method)
    }

    /// POST a multipart form and unwrap the Bot API envelope
    async fn post_form<T>(&self, method: &str, form: Form) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.api_url(method))
            .multipart(form)
            .send()
            .await
            // The URL carries the bot token
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to call Telegram {}", method))?;

        let result: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to parse Telegram response")?;

        if !result.ok {
            anyhow::bail!(
                "Telegram API error: {}",
                result.description.unwrap_or_default()
            );
        }

        result
            .result
            .context("Telegram response without result")
    }
}

/// `media` field for sendMediaGroup: photos attached as `photoN`, caption on the first only
pub fn media_group_manifest(count: usize, caption: &str) -> serde_json::Value {
    let items: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let mut item = serde_json::json!({
                "type": "photo",
                "media": format!("attach://photo{}", i),
            });
            if i == 0 {
                item["caption"] = serde_json::Value::String(caption.to_string());
            }
            item
        })
        .collect();
    serde_json::Value::Array(items)
}

fn file_name_of(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl MessageChannel for TelegramClient {
    #[instrument(skip(self, caption), fields(path = %photo_path.display()))]
    async fn send_photo(&self, photo_path: &Path, caption: &str) -> Result<i64> {
        let file_bytes = tokio::fs::read(photo_path)
            .await
            .with_context(|| format!("Failed to read image file: {}", photo_path.display()))?;

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name_of(photo_path, "photo.jpeg"))
            .mime_str("image/jpeg")?;

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", file_part);

        let message: MessageResult = self.post_form("sendPhoto", form).await?;
        debug!(message_id = message.message_id, "Photo sent");
        Ok(message.message_id)
    }

    #[instrument(skip(self, images, caption), fields(count = images.len()))]
    async fn send_media_group(&self, images: &[Vec<u8>], caption: &str) -> Result<Vec<i64>> {
        if images.is_empty() {
            anyhow::bail!("Refusing to send an empty media group");
        }
        let images = &images[..images.len().min(MAX_MEDIA_GROUP)];

        let mut form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("media", media_group_manifest(images.len(), caption).to_string());

        for (i, bytes) in images.iter().enumerate() {
            let part = Part::bytes(bytes.clone())
                .file_name(format!("photo{}.jpeg", i))
                .mime_str("image/jpeg")?;
            form = form.part(format!("photo{}", i), part);
        }

        let messages: Vec<MessageResult> = self.post_form("sendMediaGroup", form).await?;
        Ok(messages.into_iter().map(|m| m.message_id).collect())
    }

    #[instrument(skip(self, caption), fields(path = %audio_path.display()))]
    async fn send_audio(&self, audio_path: &Path, caption: &str, title: &str) -> Result<i64> {
        let file_bytes = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file: {}", audio_path.display()))?;

        let file_part = Part::bytes(file_bytes)
            .file_name(title.to_string())
            .mime_str("audio/mpeg")?;

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("title", title.to_string())
            .text("parse_mode", "Markdown")
            .part("audio", file_part);

        let message: MessageResult = self.post_form("sendAudio", form).await?;
        debug!(message_id = message.message_id, "Audio sent");
        Ok(message.message_id)
    }
}
