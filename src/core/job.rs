//! The two scheduled jobs.
//!
//! - `wake_up`: quote + weather + illustration, posted as a photo or album
//! - `read_yesterday`: a narrated summary, posted as audio
//!
//! `Jobs` holds every collaborator, so the jobs can run against any
//! endpoints and any `MessageChannel`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::adapters::{
    http_client, EdgeTts, MessageChannel, QuoteClient, TelegramClient, WeatherClient,
};
use crate::config::{paths, Config, ConfigError};
use crate::domain::{compose_caption, format_timestamp, AudioClip, Payload};

use super::{ChannelDispatcher, Delivery, FallbackChain};

/// Caption, title and file name of the voice post
pub const VOICE_TITLE: &str = "What I Read Yesterday";

/// Fatal job errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error("usage: daybreak read-yesterday <SUMMARY>")]
    Usage,

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Collaborators shared by both jobs
pub struct Jobs<C> {
    pub quotes: QuoteClient,
    pub weather: WeatherClient,
    pub chain: FallbackChain,
    pub tts: EdgeTts,
    pub dispatcher: ChannelDispatcher<C>,
    pub time_zone: Tz,
    /// Where the per-day voice files are written
    pub voice_dir: PathBuf,
}

impl Jobs<TelegramClient> {
    /// Wire the production services from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client(config.http_timeout).context("Failed to build HTTP client")?;

        Ok(Self {
            quotes: QuoteClient::new(client.clone()),
            weather: WeatherClient::new(
                client,
                config.weather_api_key.clone(),
                config.weather_location.clone(),
            ),
            chain: FallbackChain::from_config(config)?,
            tts: EdgeTts::new(config.voice.clone()),
            dispatcher: ChannelDispatcher::new(TelegramClient::from_config(
                config.telegram.clone(),
            )?),
            time_zone: config.time_zone,
            voice_dir: config.paths.voice_dir.clone(),
        })
    }
}

impl<C: MessageChannel> Jobs<C> {
    /// Post the morning message
    #[instrument(skip_all, fields(invocation = %Uuid::new_v4()))]
    pub async fn wake_up(&self) -> Result<Delivery> {
        let now = Utc::now().with_timezone(&self.time_zone);
        let timestamp = format_timestamp(&now);
        info!(%timestamp, "Starting wake-up job");

        let (quote, weather_line) =
            tokio::join!(self.quotes.fetch_quote(), self.weather.fetch_weather());

        let image = self.chain.acquire_image(&quote).await;
        let caption = compose_caption(&timestamp, &weather_line, &quote);

        self.dispatcher.send(&Payload::Image(image), &caption).await
    }

    /// Narrate `summary` and post it as audio
    #[instrument(skip_all, fields(invocation = %Uuid::new_v4()))]
    pub async fn read_yesterday(&self, summary: &str) -> Result<Delivery> {
        let today = Utc::now().with_timezone(&self.time_zone).date_naive();

        paths::ensure_dir(&self.voice_dir).await?;
        let voice_path = paths::daily_voice_file(&self.voice_dir, today);

        self.tts.synthesize(summary, &voice_path).await?;

        let clip = AudioClip {
            path: voice_path,
            title: VOICE_TITLE.to_string(),
        };
        self.dispatcher.send(&Payload::Audio(clip), VOICE_TITLE).await
    }
}

/// Post the morning message using the production services
pub async fn wake_up(config: &Config) -> Result<Delivery> {
    Jobs::from_config(config)?.wake_up().await
}

/// Narrate `summary` and post it as audio using the production services
pub async fn read_yesterday(config: &Config, summary: &str) -> Result<Delivery> {
    Jobs::from_config(config)?.read_yesterday(summary).await
}
