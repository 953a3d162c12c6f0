//! The terminal fallback: a pre-existing local image.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ImageProvider, ProviderOutcome};
use crate::domain::ImageResult;

/// Pseudo-provider returning a fixed image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAsset {
    path: PathBuf,
}

impl DefaultAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The default image result. Infallible; the file is only read at send time.
    pub fn result(&self) -> ImageResult {
        ImageResult::Default(self.path.clone())
    }
}

#[async_trait]
impl ImageProvider for DefaultAsset {
    fn name(&self) -> &str {
        "default"
    }

    async fn generate(&self, _prompt: &str) -> ProviderOutcome {
        Ok(self.result())
    }
}
