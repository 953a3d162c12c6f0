//! Media produced by the image providers and the voice synthesizer.
//!
//! Exactly one `ImageResult` leaves the fallback chain per invocation.

use std::path::{Path, PathBuf};

/// A generated image persisted in the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Location of the image on disk
    pub path: PathBuf,
}

impl ImageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Ordered, non-empty sequence of image blobs for a media-group send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGroup(Vec<Vec<u8>>);

impl ImageGroup {
    /// Build a group, refusing an empty set of images
    pub fn new(images: Vec<Vec<u8>>) -> Option<Self> {
        if images.is_empty() {
            None
        } else {
            Some(Self(images))
        }
    }

    pub fn images(&self) -> &[Vec<u8>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The image delivered with the morning post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResult {
    /// One image picked from a provider's results
    Single(ImageFile),

    /// Every image a provider returned, in order
    Group(ImageGroup),

    /// The static local image used when every provider failed
    Default(PathBuf),
}

impl ImageResult {
    /// Whether this is the terminal default asset
    pub fn is_default(&self) -> bool {
        matches!(self, ImageResult::Default(_))
    }

    /// Number of images carried
    pub fn image_count(&self) -> usize {
        match self {
            ImageResult::Single(_) | ImageResult::Default(_) => 1,
            ImageResult::Group(group) => group.len(),
        }
    }

    /// Path on disk, if this result is backed by a single file
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageResult::Single(file) => Some(&file.path),
            ImageResult::Default(path) => Some(path),
            ImageResult::Group(_) => None,
        }
    }
}

/// A synthesized speech clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub path: PathBuf,
    /// Shown as caption, title and file name in the chat
    pub title: String,
}

/// What the channel dispatcher is asked to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Image(ImageResult),
    Audio(AudioClip),
}

impl From<ImageResult> for Payload {
    fn from(image: ImageResult) -> Self {
        Payload::Image(image)
    }
}

impl From<AudioClip> for Payload {
    fn from(clip: AudioClip) -> Self {
        Payload::Audio(clip)
    }
}
