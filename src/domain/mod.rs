//! Domain types for the daybreak job.
//!
//! This module contains the core data structures:
//! - Media: ImageResult, ImageGroup, AudioClip and the dispatch Payload
//! - Caption: the composed message text

pub mod caption;
pub mod media;

// Re-export commonly used types
pub use caption::{compose_caption, format_timestamp, QUOTE_LABEL, WAKE_UP_LABEL};
pub use media::{AudioClip, ImageFile, ImageGroup, ImageResult, Payload};
