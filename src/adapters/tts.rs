//! Speech synthesis backend.
//!
//! Shells out to the `edge-tts` command-line tool.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, instrument};

pub const DEFAULT_VOICE: &str = "zh-CN-XiaoxiaoNeural";

/// Synthesis of long summaries can take a while
pub const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(120);

/// `edge-tts` subprocess wrapper
pub struct EdgeTts {
    /// Path to the edge-tts binary (default: "edge-tts")
    binary_path: String,
    voice: String,
    timeout: Duration,
}

impl Default for EdgeTts {
    fn default() -> Self {
        Self::new(DEFAULT_VOICE)
    }
}

impl EdgeTts {
    /// Create a synthesizer for `voice`, honouring EDGE_TTS_PATH
    pub fn new(voice: impl Into<String>) -> Self {
        let binary_path = std::env::var("EDGE_TTS_PATH").unwrap_or_else(|_| "edge-tts".to_string());
        Self {
            binary_path,
            voice: voice.into(),
            timeout: SYNTHESIS_TIMEOUT,
        }
    }

    /// Use a custom binary path
    pub fn with_binary_path(mut self, binary_path: impl Into<String>) -> Self {
        self.binary_path = binary_path.into();
        self
    }

    /// Synthesize `text` into an mp3 at `output`, replacing any existing file
    #[instrument(skip(self, text), fields(voice = %self.voice, chars = text.chars().count()))]
    pub async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        let child = Command::new(&self.binary_path)
            .arg("--voice")
            .arg(&self.voice)
            .arg("--text")
            .arg(text)
            .arg("--write-media")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary_path))?;

        let result = timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("edge-tts timed out after {:?}", self.timeout))?
            .context("Failed to wait for edge-tts")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let exit_code = result.status.code().unwrap_or(-1);
            anyhow::bail!("edge-tts failed with exit code {}: {}", exit_code, stderr.trim());
        }

        let size = tokio::fs::metadata(output)
            .await
            .with_context(|| format!("edge-tts produced no file at {}", output.display()))?
            .len();
        if size == 0 {
            anyhow::bail!("edge-tts produced an empty file at {}", output.display());
        }

        info!(path = %output.display(), size, "Voice synthesized");
        Ok(())
    }
}
