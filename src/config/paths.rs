//! Canonical file names inside the configured directories.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use daybreak::config::paths;
//!
//! let image = paths::generated_image(&config.paths.work_dir, 0, "jpeg");
//! let voice = paths::daily_voice_file(&config.paths.voice_dir, today);
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Path of the `index`-th generated image in the working directory
pub fn generated_image(work_dir: &Path, index: impl std::fmt::Display, extension: &str) -> PathBuf {
    work_dir.join(format!("{}.{}", index, extension))
}

/// Path of the voice file for `date` (`<voice_dir>/YYYY-MM-DD.mp3`)
pub fn daily_voice_file(voice_dir: &Path, date: NaiveDate) -> PathBuf {
    voice_dir.join(format!("{}.mp3", date.format("%Y-%m-%d")))
}

/// Create a directory (and parents) if it does not exist yet
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}
