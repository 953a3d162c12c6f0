//! Image acquisition with provider fallback.
//!
//! Providers are tried once each, in a fixed order. The first success
//! wins; when all fail the default asset is returned. `acquire_image`
//! never fails.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::adapters::{BingImageCreator, DashScopeWanx, DefaultAsset, ImageProvider};
use crate::config::{paths, Config};
use crate::domain::ImageResult;

/// Fixed-priority chain of image providers
pub struct FallbackChain {
    providers: Vec<Box<dyn ImageProvider>>,
    default: DefaultAsset,
    /// Created before the first provider runs
    work_dir: Option<PathBuf>,
}

impl FallbackChain {
    /// Create a chain trying `providers` in order
    pub fn new(providers: Vec<Box<dyn ImageProvider>>, default: DefaultAsset) -> Self {
        Self {
            providers,
            default,
            work_dir: None,
        }
    }

    /// Ensure `work_dir` exists before providers write to it
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    /// Build the production chain: Bing, then DashScope, for whichever has credentials
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut providers: Vec<Box<dyn ImageProvider>> = Vec::new();

        if let Some(credentials) = &config.bing {
            let bing = BingImageCreator::new(
                credentials.clone(),
                &config.paths.work_dir,
                config.images.clone(),
                config.http_timeout,
            )
            .context("Failed to build Bing client")?;
            providers.push(Box::new(bing));
        }

        if let Some(api_key) = &config.dashscope_api_key {
            let wanx = DashScopeWanx::new(
                api_key.clone(),
                &config.paths.work_dir,
                config.images.clone(),
                config.http_timeout,
            )
            .context("Failed to build DashScope client")?;
            providers.push(Box::new(wanx));
        }

        if providers.is_empty() {
            warn!("No image provider configured, the default image will be sent");
        }

        Ok(Self::new(providers, DefaultAsset::new(&config.paths.default_image))
            .with_work_dir(&config.paths.work_dir))
    }

    /// Provider names in the order they are tried
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Obtain an image for `prompt`
    #[instrument(skip(self, prompt), fields(providers = self.providers.len()))]
    pub async fn acquire_image(&self, prompt: &str) -> ImageResult {
        if let Some(dir) = &self.work_dir {
            if let Err(e) = paths::ensure_dir(dir).await {
                warn!(error = %e, "Working directory unavailable");
            }
        }

        for provider in &self.providers {
            match provider.generate(prompt).await {
                Ok(image) => {
                    info!(
                        provider = provider.name(),
                        images = image.image_count(),
                        "Image acquired"
                    );
                    return image;
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Image provider failed");
                }
            }
        }

        warn!(path = %self.default.path().display(), "All image providers failed, using default image");
        self.default.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ProviderError, ProviderOutcome};
    use crate::domain::ImageFile;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct Fixed(&'static str, bool);

    #[async_trait]
    impl ImageProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn generate(&self, _prompt: &str) -> ProviderOutcome {
            if self.1 {
                Ok(ImageResult::Single(ImageFile::new(format!("{}.jpeg", self.0))))
            } else {
                Err(ProviderError::EmptyResult)
            }
        }
    }

    #[tokio::test]
    async fn test_empty_chain_returns_default() {
        let chain = FallbackChain::new(Vec::new(), DefaultAsset::new("default.jpeg"));
        assert_eq!(
            chain.acquire_image("早上好").await,
            ImageResult::Default(PathBuf::from("default.jpeg"))
        );
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let chain = FallbackChain::new(
            vec![Box::new(Fixed("a", false)), Box::new(Fixed("b", true)), Box::new(Fixed("c", true))],
            DefaultAsset::new("default.jpeg"),
        );
        assert_eq!(chain.provider_names(), vec!["a", "b", "c"]);
        assert_eq!(
            chain.acquire_image("p").await,
            ImageResult::Single(ImageFile::new("b.jpeg"))
        );
    }

    #[tokio::test]
    async fn test_missing_work_dir_is_created() {
        let temp = TempDir::new().unwrap();
        let work_dir = temp.path().join("tmp");
        let chain = FallbackChain::new(Vec::new(), DefaultAsset::new("default.jpeg"))
            .with_work_dir(&work_dir);

        chain.acquire_image("p").await;
        assert!(work_dir.is_dir());
    }
}
