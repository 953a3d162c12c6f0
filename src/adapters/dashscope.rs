//! DashScope Wanx text-to-image provider.
//!
//! Submits an asynchronous synthesis task, polls the task until it settles,
//! then downloads the hosted result image.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{ImageProvider, ProviderError, ProviderOutcome};
use crate::config::{paths, ImageSettings, Secret};
use crate::domain::{ImageFile, ImageResult};

pub const DASHSCOPE_URL: &str = "https://dashscope.aliyuncs.com";

pub const DEFAULT_MODEL: &str = "wanx-v1";
pub const DEFAULT_SIZE: &str = "1024*1024";

/// Programmatic text-to-image generator
pub struct DashScopeWanx {
    api_key: Secret,
    base_url: String,
    model: String,
    size: String,
    work_dir: PathBuf,
    settings: ImageSettings,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    output: Option<TaskOutput>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskOutput {
    task_id: String,
    task_status: String,
    #[serde(default)]
    results: Vec<TaskResult>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskResult {
    #[serde(default)]
    url: Option<String>,
}

/// Where a polled task stands
#[derive(Debug, PartialEq, Eq)]
enum TaskState {
    Running,
    Succeeded(String),
    Failed(String),
}

impl DashScopeWanx {
    /// Create a new provider writing its image to `work_dir`
    pub fn new(
        api_key: Secret,
        work_dir: impl Into<PathBuf>,
        settings: ImageSettings,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            api_key,
            base_url: DASHSCOPE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            size: DEFAULT_SIZE.to_string(),
            work_dir: work_dir.into(),
            settings,
            client: super::http_client(timeout)?,
        })
    }

    /// Point the provider at another host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use another synthesis model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": { "prompt": prompt },
            "parameters": { "size": self.size, "n": 1 },
        })
    }

    async fn submit(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/api/v1/services/aigc/text2image/image-synthesis",
            self.base_url
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .header("X-DashScope-Async", "enable")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(ProviderError::network)?;

        let status = response.status();
        let body = response.text().await.map_err(ProviderError::network)?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let task: TaskResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        task.output.map(|o| o.task_id).ok_or_else(|| {
            ProviderError::MalformedResponse(format!(
                "no task id ({})",
                task.message.or(task.code).unwrap_or_default()
            ))
        })
    }

    async fn wait_for_task(&self, task_id: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/v1/tasks/{}", self.base_url, task_id);

        for attempt in 1..=self.settings.max_polls {
            let response = self
                .client
                .get(&url)
                .bearer_auth(self.api_key.expose())
                .send()
                .await
                .map_err(ProviderError::network)?;

            let status = response.status();
            let body = response.text().await.map_err(ProviderError::network)?;
            if !status.is_success() {
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            match task_state(&body)? {
                TaskState::Succeeded(image_url) => return Ok(image_url),
                TaskState::Failed(reason) => return Err(ProviderError::Rejected(reason)),
                TaskState::Running => {
                    debug!(attempt, task_id, "Task still running");
                    if attempt < self.settings.max_polls {
                        tokio::time::sleep(self.settings.poll_interval).await;
                    }
                }
            }
        }

        Err(ProviderError::TimedOut(self.settings.max_polls))
    }

    async fn download(&self, image_url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(ProviderError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: "result download failed".into(),
            });
        }

        Ok(response.bytes().await.map_err(ProviderError::network)?.to_vec())
    }
}

/// Interpret a task status body
fn task_state(body: &str) -> Result<TaskState, ProviderError> {
    let task: TaskResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
    let output = task
        .output
        .ok_or_else(|| ProviderError::MalformedResponse("task without output".into()))?;

    match output.task_status.as_str() {
        "SUCCEEDED" => output
            .results
            .into_iter()
            .find_map(|r| r.url)
            .map(TaskState::Succeeded)
            .ok_or(ProviderError::EmptyResult),
        "FAILED" | "CANCELED" | "UNKNOWN" => Ok(TaskState::Failed(
            output
                .message
                .unwrap_or_else(|| format!("task {}", output.task_status.to_lowercase())),
        )),
        _ => Ok(TaskState::Running),
    }
}

#[async_trait]
impl ImageProvider for DashScopeWanx {
    fn name(&self) -> &str {
        "dashscope"
    }

    #[instrument(skip(self, prompt), fields(provider = "dashscope", model = %self.model))]
    async fn generate(&self, prompt: &str) -> ProviderOutcome {
        let task_id = self.submit(prompt).await?;
        info!(%task_id, "Synthesis task submitted");

        let image_url = self.wait_for_task(&task_id).await?;
        let image = self.download(&image_url).await?;

        if image.is_empty() {
            return Err(ProviderError::EmptyResult);
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let path = paths::generated_image(&self.work_dir, "wanx", "png");
        tokio::fs::write(&path, &image).await?;
        Ok(ImageResult::Single(ImageFile::new(path)))
    }
}
