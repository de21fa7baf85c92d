//! Reprise CLI - headless client for a transmuxing media server
//!
//! Features:
//! - Wait for a file's manifest to be generated
//! - Read and write saved progress
//! - List subtitle and audio tracks
//! - Simulate a resumed playback session

use clap::{Parser, Subcommand};
use reprise_core::PlayerConfig;
use std::path::PathBuf;
use url::Url;

mod commands;
mod output;

use output::OutputFormat;

/// Reprise CLI - resumable DASH playback toolkit
#[derive(Parser)]
#[command(name = "reprise")]
#[command(version)]
#[command(about = "Headless client for the Reprise media server", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Media server base URL (overrides the config file)
    #[arg(short, long)]
    server: Option<Url>,

    /// JSON player config
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until the server has produced a file's manifest
    Wait {
        /// File name as known to the server
        file: String,

        /// Give up after this many checks
        #[arg(short, long)]
        max_attempts: Option<u32>,
    },

    /// Read or write saved progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// List a file's subtitle tracks
    Subtitles {
        /// File name as known to the server
        file: String,
    },

    /// List the audio tracks in a file's manifest
    Tracks {
        /// File name as known to the server
        file: String,
    },

    /// Wait, load tracks, and apply saved progress like the browser player does
    Resume {
        /// File name as known to the server
        file: String,

        /// Audio language to select when the stream starts
        #[arg(short, long)]
        lang: Option<String>,

        /// Simulate this many seconds of playback afterwards
        #[arg(short, long, default_value = "0")]
        play: f64,
    },
}

#[derive(Subcommand)]
enum ProgressAction {
    /// Show the saved record
    Get {
        /// File name as known to the server
        file: String,
    },

    /// Overwrite the saved record
    Set {
        /// File name as known to the server
        file: String,

        /// Position in seconds
        #[arg(short, long)]
        position: f64,

        /// Audio language
        #[arg(short, long)]
        audio: Option<String>,

        /// Subtitle language
        #[arg(short, long)]
        subtitle: Option<String>,
    },
}

fn player_config(cli: &Cli) -> anyhow::Result<PlayerConfig> {
    let mut config = match &cli.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = player_config(&cli)?;
    let format = OutputFormat::from(cli.format.as_str());

    match cli.command {
        Commands::Wait { file, max_attempts } => {
            if max_attempts.is_some() {
                config.max_poll_attempts = max_attempts;
            }
            commands::wait(&config, &file, format).await?;
        }
        Commands::Progress { action } => match action {
            ProgressAction::Get { file } => {
                commands::progress_get(&config, &file, format).await?;
            }
            ProgressAction::Set { file, position, audio, subtitle } => {
                commands::progress_set(&config, &file, position, audio, subtitle, format).await?;
            }
        },
        Commands::Subtitles { file } => {
            commands::subtitles(&config, &file, format).await?;
        }
        Commands::Tracks { file } => {
            commands::tracks(&config, &file, format).await?;
        }
        Commands::Resume { file, lang, play } => {
            if let Some(lang) = lang {
                config.default_audio_language = lang;
            }
            commands::resume(&config, &file, play, format).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_progress_set_args() {
        let cli = Cli::try_parse_from([
            "reprise",
            "--server",
            "http://media.local:9000/",
            "progress",
            "set",
            "movie.mkv",
            "--position",
            "42.5",
            "--audio",
            "de",
        ])
        .unwrap();

        let config = player_config(&cli).unwrap();
        assert_eq!(config.server_url.as_str(), "http://media.local:9000/");

        match cli.command {
            Commands::Progress {
                action: ProgressAction::Set { file, position, audio, subtitle },
            } => {
                assert_eq!(file, "movie.mkv");
                assert_eq!(position, 42.5);
                assert_eq!(audio.as_deref(), Some("de"));
                assert!(subtitle.is_none());
            }
            _ => panic!("expected progress set"),
        }
    }

    #[test]
    fn test_resume_defaults() {
        let cli = Cli::try_parse_from(["reprise", "resume", "show.mkv"]).unwrap();
        match cli.command {
            Commands::Resume { file, lang, play } => {
                assert_eq!(file, "show.mkv");
                assert!(lang.is_none());
                assert_eq!(play, 0.0);
            }
            _ => panic!("expected resume"),
        }
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_rejects_bad_server_url() {
        assert!(Cli::try_parse_from(["reprise", "--server", "not a url", "wait", "a.mkv"]).is_err());
    }
}
