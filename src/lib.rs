//! daybreak - Daily wake-up post for a Telegram channel
//!
//! Gathers a quote and a weather reading, obtains an illustration for the
//! quote from a chain of image providers, and posts the result to a chat.
//!
//! # Architecture
//!
//! The only interesting part is the image fallback chain:
//! - Providers are tried in a fixed order, one attempt each
//! - A failed provider hands over to the next one
//! - When every provider fails, a local default image is used
//!
//! # Modules
//!
//! - `adapters`: External services (image providers, quote, weather, TTS, Telegram)
//! - `core`: Fallback chain, channel dispatch and the two jobs
//! - `domain`: Data structures (ImageResult, Payload, Caption)
//! - `config`: Environment and file configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Post the morning message
//! daybreak wake-up
//!
//! # Narrate a summary and post it as audio
//! daybreak read-yesterday "..."
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{ChannelDispatcher, FallbackChain};
pub use domain::{compose_caption, AudioClip, ImageFile, ImageResult, Payload};

// Telegram integration
pub use adapters::{TelegramClient, TelegramConfig};
