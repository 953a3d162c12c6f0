//! Fallback Chain Integration Tests
//!
//! Provider ordering, error injection and the default-asset guarantee.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use daybreak::adapters::{DefaultAsset, ImageProvider, ProviderError, ProviderOutcome};
use daybreak::domain::ImageGroup;
use daybreak::{FallbackChain, ImageFile, ImageResult};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// How a scripted provider behaves
#[derive(Clone)]
enum Behaviour {
    Succeed(ImageResult),
    Fail(fn() -> ProviderError),
}

/// Provider with a fixed behaviour that counts its calls
struct ScriptedProvider {
    name: &'static str,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    fn new(name: &'static str, behaviour: Behaviour) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                behaviour,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, _prompt: &str) -> ProviderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Succeed(result) => Ok(result.clone()),
            Behaviour::Fail(make) => Err(make()),
        }
    }
}

fn network_failure() -> ProviderError {
    ProviderError::Status {
        status: 503,
        body: "unavailable".into(),
    }
}

fn auth_failure() -> ProviderError {
    ProviderError::Status {
        status: 401,
        body: "cookie expired".into(),
    }
}

fn single(name: &str) -> ImageResult {
    ImageResult::Single(ImageFile::new(format!("tmp/{}.jpeg", name)))
}

#[tokio::test]
async fn test_primary_success_skips_secondary() {
    let (primary, primary_calls) = ScriptedProvider::new("bing", Behaviour::Succeed(single("0")));
    let (secondary, secondary_calls) =
        ScriptedProvider::new("dashscope", Behaviour::Succeed(single("wanx")));

    let chain = FallbackChain::new(
        vec![Box::new(primary), Box::new(secondary)],
        DefaultAsset::new("tmp/default.jpeg"),
    );

    assert_eq!(chain.acquire_image("早上好").await, single("0"));
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_primary_failure_returns_secondary_result() {
    let failures: [fn() -> ProviderError; 5] = [
        network_failure,
        auth_failure,
        || ProviderError::EmptyResult,
        || ProviderError::MalformedResponse("not json".into()),
        || ProviderError::TimedOut(60),
    ];

    for failure in failures {
        let (primary, primary_calls) = ScriptedProvider::new("bing", Behaviour::Fail(failure));
        let (secondary, _) = ScriptedProvider::new("dashscope", Behaviour::Succeed(single("wanx")));

        let chain = FallbackChain::new(
            vec![Box::new(primary), Box::new(secondary)],
            DefaultAsset::new("tmp/default.jpeg"),
        );

        let result = chain.acquire_image("早上好").await;
        assert_eq!(result, single("wanx"));
        assert!(!result.is_default());
        // One attempt per provider, no retries
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_group_result_passes_through() {
    let group = ImageResult::Group(ImageGroup::new(vec![vec![1], vec![2], vec![3], vec![4]]).unwrap());
    let (primary, _) = ScriptedProvider::new("bing", Behaviour::Succeed(group.clone()));

    let chain = FallbackChain::new(vec![Box::new(primary)], DefaultAsset::new("tmp/default.jpeg"));
    assert_eq!(chain.acquire_image("p").await, group);
}

#[tokio::test]
async fn test_all_failures_return_default_asset_every_time() {
    let temp = TempDir::new().unwrap();
    let default_path = temp.path().join("default.jpeg");
    std::fs::write(&default_path, b"default image bytes").unwrap();
    let expected_hash = hex::encode(Sha256::digest(b"default image bytes"));

    let (primary, primary_calls) = ScriptedProvider::new("bing", Behaviour::Fail(auth_failure));
    let (secondary, secondary_calls) =
        ScriptedProvider::new("dashscope", Behaviour::Fail(network_failure));

    let chain = FallbackChain::new(
        vec![Box::new(primary), Box::new(secondary)],
        DefaultAsset::new(&default_path),
    );

    for round in 1..=3 {
        let result = chain.acquire_image("早上好").await;
        assert_eq!(result, ImageResult::Default(default_path.clone()));

        let bytes = std::fs::read(result.path().unwrap()).unwrap();
        assert_eq!(hex::encode(Sha256::digest(&bytes)), expected_hash);

        assert_eq!(primary_calls.load(Ordering::SeqCst), round);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), round);
    }
}

#[tokio::test]
async fn test_any_prompt_yields_an_image() {
    let (primary, _) = ScriptedProvider::new("bing", Behaviour::Fail(network_failure));
    let chain = FallbackChain::new(vec![Box::new(primary)], DefaultAsset::new("tmp/default.jpeg"));

    for prompt in ["", "早上好", "\n\n", "a very long prompt ".repeat(100).as_str()] {
        let result = chain.acquire_image(prompt).await;
        assert!(result.image_count() >= 1);
    }
}

#[tokio::test]
async fn test_stale_files_do_not_rescue_a_failed_provider() {
    let temp = TempDir::new().unwrap();
    let work_dir = temp.path().join("tmp");
    std::fs::create_dir_all(&work_dir).unwrap();
    // Left over from an earlier run
    std::fs::write(work_dir.join("default.jpeg"), b"stale").unwrap();
    std::fs::write(work_dir.join("0.jpeg"), b"stale").unwrap();

    let (primary, _) = ScriptedProvider::new("bing", Behaviour::Fail(auth_failure));
    let default_path = PathBuf::from("assets/default.jpeg");
    let chain = FallbackChain::new(vec![Box::new(primary)], DefaultAsset::new(&default_path))
        .with_work_dir(&work_dir);

    assert_eq!(chain.acquire_image("p").await, ImageResult::Default(default_path));
}
