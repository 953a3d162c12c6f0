//! Command-line interface for daybreak.
//!
//! Provides the morning post, the voice summary post, and a
//! configuration dump for debugging.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::core::{read_yesterday, wake_up, Delivery, FallbackChain, JobError};

/// daybreak - Daily wake-up post for a Telegram channel
#[derive(Parser, Debug)]
#[command(name = "daybreak")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Post today's quote, weather and an illustration
    WakeUp,

    /// Narrate a summary and post it as audio
    ReadYesterday {
        /// Text to narrate
        summary: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::WakeUp => {
                let config = Config::from_env().map_err(JobError::from)?;
                let delivery = wake_up(&config).await?;
                report(&delivery);
                Ok(())
            }
            Commands::ReadYesterday { summary } => {
                // Checked before anything else touches the network
                let summary = require_summary(summary)?;
                let config = Config::from_env().map_err(JobError::from)?;
                let delivery = read_yesterday(&config, &summary).await?;
                report(&delivery);
                Ok(())
            }
            Commands::Config => show_config(),
        }
    }
}

/// The summary argument, or a usage error when absent or blank
pub fn require_summary(summary: Option<String>) -> Result<String, JobError> {
    summary
        .filter(|s| !s.trim().is_empty())
        .ok_or(JobError::Usage)
}

fn report(delivery: &Delivery) {
    match delivery {
        Delivery::Photo { message_id } => eprintln!("[Photo sent: message {}]", message_id),
        Delivery::MediaGroup { message_ids } => {
            eprintln!("[Album of {} sent]", message_ids.len())
        }
        Delivery::Audio { message_id } => eprintln!("[Audio sent: message {}]", message_id),
    }
}

/// Show resolved configuration, secrets redacted
fn show_config() -> Result<()> {
    let cfg = Config::from_env().map_err(JobError::from)?;
    let chain = FallbackChain::from_config(&cfg)?;

    println!("daybreak configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Telegram:");
    println!("  Bot token: {}", cfg.telegram.bot_token);
    println!("  Chat:      {}", cfg.telegram.chat_id);
    println!();
    println!("Paths:");
    println!("  Work dir:      {}", cfg.paths.work_dir.display());
    println!("  Default image: {}", cfg.paths.default_image.display());
    println!("  Voice dir:     {}", cfg.paths.voice_dir.display());
    println!();
    println!("Image providers (in order):");
    let names = chain.provider_names();
    if names.is_empty() {
        println!("  (none - default image only)");
    } else {
        for name in names {
            println!("  {}", name);
        }
    }
    println!("  Delivery:      {:?}", cfg.images.delivery);
    println!();
    println!("Time zone:       {}", cfg.time_zone);
    println!(
        "Weather:         {} (key {})",
        cfg.weather_location,
        if cfg.weather_api_key.is_some() { "set" } else { "missing" }
    );
    println!("HTTP timeout:    {}s", cfg.http_timeout.as_secs());
    println!("Voice:           {}", cfg.voice);

    Ok(())
}
