//! Payload delivery.
//!
//! One payload, one decision: albums go out as a media group, single
//! images as a photo, clips as audio.

use anyhow::Result;
use tracing::{info, instrument};

use crate::adapters::MessageChannel;
use crate::domain::{ImageResult, Payload};

/// How a payload was delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Photo { message_id: i64 },
    MediaGroup { message_ids: Vec<i64> },
    Audio { message_id: i64 },
}

/// Routes payloads to the matching channel call
pub struct ChannelDispatcher<C> {
    channel: C,
}

impl<C: MessageChannel> ChannelDispatcher<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Deliver `payload` with `caption`
    #[instrument(skip_all)]
    pub async fn send(&self, payload: &Payload, caption: &str) -> Result<Delivery> {
        let delivery = match payload {
            Payload::Image(ImageResult::Group(group)) => {
                let message_ids = self.channel.send_media_group(group.images(), caption).await?;
                Delivery::MediaGroup { message_ids }
            }
            Payload::Image(ImageResult::Single(file)) => {
                let message_id = self.channel.send_photo(&file.path, caption).await?;
                Delivery::Photo { message_id }
            }
            Payload::Image(ImageResult::Default(path)) => {
                let message_id = self.channel.send_photo(path, caption).await?;
                Delivery::Photo { message_id }
            }
            Payload::Audio(clip) => {
                let message_id = self
                    .channel
                    .send_audio(&clip.path, caption, &clip.title)
                    .await?;
                Delivery::Audio { message_id }
            }
        };

        info!(?delivery, "Payload delivered");
        Ok(delivery)
    }
}
