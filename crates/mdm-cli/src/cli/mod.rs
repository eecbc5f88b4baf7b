//! CLI for the MDM media job client.

pub(crate) mod commands;
mod display;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdm_core::config;
use mdm_core::job::GifQuality;
use std::path::PathBuf;

use commands::{
    run_batch, run_clear_history, run_download, run_gif, run_history, run_playlist, run_search,
};

/// Top-level CLI for the MDM media job client.
#[derive(Debug, Parser)]
#[command(name = "mdm")]
#[command(about = "MDM: submit and track media download jobs on a processing backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one media URL and save the result.
    Download {
        /// Source media URL.
        url: String,
        /// Output format (e.g. mp4, mp3); defaults to the configured one.
        #[arg(long)]
        format: Option<String>,
        /// Quality hint (e.g. 720p, best); defaults to the configured one.
        #[arg(long)]
        quality: Option<String>,
    },

    /// Download every URL listed in a file, one per line.
    Batch {
        /// Path to the URL list.
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        quality: Option<String>,
    },

    /// Turn a clip of a video into a GIF.
    Gif {
        /// Source media URL.
        url: String,
        /// Clip start, in seconds.
        #[arg(long, default_value_t = 0)]
        start: u32,
        /// Clip length, in seconds.
        #[arg(long, default_value_t = 5)]
        duration: u32,
        /// Preset: high (20 fps, 640px), medium (15 fps, 480px) or low (10 fps, 320px).
        #[arg(long, default_value = "medium")]
        quality: GifQuality,
    },

    /// Search for media; with --pick, download the chosen results.
    Search {
        /// Search terms.
        query: String,
        /// 1-based result numbers to download, comma separated (e.g. 1,3).
        #[arg(long, value_delimiter = ',', value_name = "N,M")]
        pick: Vec<usize>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        quality: Option<String>,
    },

    /// Download every item of a playlist or other collection.
    Playlist {
        /// Collection URL.
        url: String,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        quality: Option<String>,
    },

    /// Show recently completed downloads.
    History,

    /// Delete the download history.
    ClearHistory {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let download_dir = match &cfg.download_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let format = |f: Option<String>| f.unwrap_or_else(|| cfg.default_format.clone());
        let quality = |q: Option<String>| q.unwrap_or_else(|| cfg.default_quality.clone());

        match cli.command {
            CliCommand::Download {
                url,
                format: f,
                quality: q,
            } => run_download(&cfg, &download_dir, &url, &format(f), &quality(q)).await?,
            CliCommand::Batch {
                file,
                format: f,
                quality: q,
            } => run_batch(&cfg, &download_dir, &file, &format(f), &quality(q)).await?,
            CliCommand::Gif {
                url,
                start,
                duration,
                quality: q,
            } => run_gif(&cfg, &download_dir, &url, start, duration, q).await?,
            CliCommand::Search {
                query,
                pick,
                format: f,
                quality: q,
            } => run_search(&cfg, &download_dir, &query, &pick, &format(f), &quality(q)).await?,
            CliCommand::Playlist {
                url,
                format: f,
                quality: q,
            } => run_playlist(&cfg, &download_dir, &url, &format(f), &quality(q)).await?,
            CliCommand::History => run_history(&cfg)?,
            CliCommand::ClearHistory { yes } => run_clear_history(&cfg, yes)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
