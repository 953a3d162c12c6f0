//! Core job logic.
//!
//! This module contains:
//! - FallbackChain: Ordered image providers ending in the default asset
//! - ChannelDispatcher: Picks the delivery method for a payload
//! - Jobs: The wake-up post and the voice summary

pub mod dispatch;
pub mod fallback;
pub mod job;

// Re-export commonly used types
pub use dispatch::{ChannelDispatcher, Delivery};
pub use fallback::FallbackChain;
pub use job::{read_yesterday, wake_up, JobError, Jobs, VOICE_TITLE};
