//! Adapter interfaces for external systems.
//!
//! Image providers share one capability, `generate(prompt)`, so the
//! fallback chain can treat Bing, DashScope and the default asset alike.
//! The messaging side is abstracted by `MessageChannel`.

pub mod bing;
pub mod dashscope;
pub mod default_asset;
pub mod quote;
pub mod telegram;
pub mod tts;
pub mod weather;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use crate::config::{paths, ImageDelivery};
use crate::domain::{ImageFile, ImageGroup, ImageResult};

// Re-export the adapters
pub use bing::BingImageCreator;
pub use dashscope::DashScopeWanx;
pub use default_asset::DefaultAsset;
pub use quote::QuoteClient;
pub use telegram::{TelegramClient, TelegramConfig};
pub use tts::EdgeTts;
pub use weather::WeatherClient;

/// Why a single image provider attempt failed
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Network(reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("provider returned no images")]
    EmptyResult,

    #[error("generation rejected: {0}")]
    Rejected(String),

    #[error("no result after {0} polls")]
    TimedOut(u32),

    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Network error with the request URL stripped (URLs may carry credentials)
    pub fn network(err: reqwest::Error) -> Self {
        ProviderError::Network(err.without_url())
    }
}

/// Result of one provider attempt
pub type ProviderOutcome = std::result::Result<ImageResult, ProviderError>;

/// Trait for image generation backends
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Produce image(s) for `prompt`. Success always carries at least one image.
    async fn generate(&self, prompt: &str) -> ProviderOutcome;
}

/// Trait for the chat the post is delivered to
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Send one image file with a caption
    async fn send_photo(&self, photo_path: &Path, caption: &str) -> Result<i64>;

    /// Send images as one album, caption attached to the first item
    async fn send_media_group(&self, images: &[Vec<u8>], caption: &str) -> Result<Vec<i64>>;

    /// Send an audio file with caption and title
    async fn send_audio(&self, audio_path: &Path, caption: &str, title: &str) -> Result<i64>;
}

/// Build an HTTP client with a bounded per-request timeout
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Write image blobs to `work_dir` as `<index>.<extension>`, in order
pub(crate) async fn persist_images(
    work_dir: &Path,
    images: &[Vec<u8>],
    extension: &str,
) -> std::result::Result<Vec<PathBuf>, ProviderError> {
    tokio::fs::create_dir_all(work_dir).await?;

    let mut written = Vec::with_capacity(images.len());
    for (index, bytes) in images.iter().enumerate() {
        let path = paths::generated_image(work_dir, index, extension);
        tokio::fs::write(&path, bytes).await?;
        written.push(path);
    }
    Ok(written)
}

/// Uniformly random index into `count` items
pub(crate) fn select_index<R: Rng + ?Sized>(count: usize, rng: &mut R) -> usize {
    rng.gen_range(0..count)
}

/// Shape stored images into the configured delivery form
pub(crate) fn shape_result(
    delivery: ImageDelivery,
    images: Vec<Vec<u8>>,
    files: Vec<PathBuf>,
) -> ProviderOutcome {
    if files.is_empty() {
        return Err(ProviderError::EmptyResult);
    }

    match delivery {
        // An album needs at least two items
        ImageDelivery::Group if files.len() == 1 => {
            Ok(ImageResult::Single(ImageFile::new(files[0].clone())))
        }
        ImageDelivery::Group => ImageGroup::new(images)
            .map(ImageResult::Group)
            .ok_or(ProviderError::EmptyResult),
        ImageDelivery::RandomOne => {
            let index = select_index(files.len(), &mut rand::thread_rng());
            Ok(ImageResult::Single(ImageFile::new(files[index].clone())))
        }
    }
}
