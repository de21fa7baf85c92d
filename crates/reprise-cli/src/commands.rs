//! CLI command implementations

use crate::output::{self, AudioRow, OutputFormat, ProgressRow, ResumeRow, SubtitleRow};
use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use reprise_core::{
    format_time, MediaServerClient, PlayerConfig, PlayerSession, ProgressRecord, ProgressStore,
    SubtitleSource,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Simulated playback advances by this much per tick
const PLAYBACK_TICK: Duration = Duration::from_millis(250);

fn spinner(message: String) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    Ok(bar)
}

/// Poll the manifest with a spinner mirroring the session status
async fn wait_ready(session: &Arc<PlayerSession>, client: &MediaServerClient) -> anyhow::Result<()> {
    let bar = spinner(session.status_message().await)?;

    let mut states = session.subscribe_state();
    let watcher = {
        let bar = bar.clone();
        let session = Arc::clone(session);
        tokio::spawn(async move {
            while states.changed().await.is_ok() {
                bar.set_message(session.status_message().await);
            }
        })
    };

    let result = session.wait_until_ready(client).await;
    watcher.abort();

    match result {
        Ok(()) => {
            bar.finish_and_clear();
            info!(file = %session.file(), elapsed = session.elapsed(), "Manifest ready");
            Ok(())
        }
        Err(e) => {
            bar.finish_and_clear();
            Err(e).with_context(|| format!("waiting for {}", session.file()))
        }
    }
}

/// Wait until a file can be streamed
pub async fn wait(config: &PlayerConfig, file: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = MediaServerClient::new(config)?;
    let session = Arc::new(PlayerSession::new(config.clone(), file));

    wait_ready(&session, &client).await?;

    let manifest = client.endpoints().manifest(file)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "file": file, "state": session.state().await, "manifest": manifest })
        ),
        _ => println!("{}", output::success(&format!("{} is ready: {}", file, manifest))),
    }
    Ok(())
}

/// Show the saved progress of a file
pub async fn progress_get(
    config: &PlayerConfig,
    file: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let client = MediaServerClient::new(config)?;
    let record = client.load_progress(file).await?;
    println!("{}", output::render_one(&ProgressRow::new(file, &record), format)?);
    Ok(())
}

/// Overwrite the saved progress of a file
pub async fn progress_set(
    config: &PlayerConfig,
    file: &str,
    position: f64,
    audio: Option<String>,
    subtitle: Option<String>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !position.is_finite() || position < 0.0 {
        bail!("position must be a non-negative number of seconds, got {}", position);
    }

    let record = ProgressRecord {
        position,
        subtitle_language: subtitle,
        audio_language: audio,
    };
    let client = MediaServerClient::new(config)?;
    client.save_progress(file, &record).await?;

    match format {
        OutputFormat::Text => println!(
            "{}",
            output::success(&format!("Saved {} for {}", record, file))
        ),
        _ => println!("{}", output::render_one(&ProgressRow::new(file, &record), format)?),
    }
    Ok(())
}

/// List subtitle tracks advertised for a file
pub async fn subtitles(config: &PlayerConfig, file: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = MediaServerClient::new(config)?;
    let descriptors = client.subtitle_descriptors(file).await?;

    if descriptors.is_empty() && format == OutputFormat::Text {
        println!("{}", output::notice(&format!("No subtitles for {}", file)));
        return Ok(());
    }

    let rows: Vec<SubtitleRow> = descriptors.iter().map(SubtitleRow::from).collect();
    if format == OutputFormat::Text {
        println!("Subtitles for {}:", file);
    }
    println!("{}", output::render_rows(&rows, format)?);
    Ok(())
}

/// List the audio tracks of a file's manifest
pub async fn tracks(config: &PlayerConfig, file: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = MediaServerClient::new(config)?;
    let summary = client
        .manifest_summary(file)
        .await
        .with_context(|| format!("reading the manifest of {}", file))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let rows: Vec<AudioRow> = summary.audio_tracks.iter().map(AudioRow::from).collect();
    if format == OutputFormat::Text {
        println!("Manifest for {}:", file);
        println!("  Dynamic: {}", summary.is_dynamic);
        match summary.duration {
            Some(duration) => println!("  Duration: {}", format_time(duration.as_secs_f64())),
            None => println!("  Duration: unknown"),
        }
        println!("\nAudio tracks:");
    }
    if rows.is_empty() {
        println!("{}", output::notice("No audio adaptation sets"));
    } else {
        println!("{}", output::render_rows(&rows, format)?);
    }
    Ok(())
}

/// Resume a file the way the browser player does, optionally playing on
pub async fn resume(
    config: &PlayerConfig,
    file: &str,
    play: f64,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !play.is_finite() || play < 0.0 {
        bail!("play must be a non-negative number of seconds, got {}", play);
    }

    let client = Arc::new(MediaServerClient::new(config)?);
    let session = Arc::new(PlayerSession::new(config.clone(), file));

    wait_ready(&session, &client).await?;

    let audio = match client.manifest_summary(file).await {
        Ok(summary) => summary.audio_tracks,
        Err(e) => {
            warn!(error = %e, "Could not read audio tracks");
            Vec::new()
        }
    };
    let subtitles = client.subtitle_descriptors(file).await.unwrap_or_else(|e| {
        warn!(error = %e, "Could not read subtitle listing");
        Vec::new()
    });
    session.load_tracks(audio, &subtitles).await;

    let plan = session.restore(client.as_ref()).await;
    let selected_audio = session
        .selection()
        .await
        .current_audio()
        .map(|t| t.display_label());
    let report = ResumeRow::new(file, &plan, selected_audio);
    println!("{}", output::render_one(&report, format)?);

    if play > 0.0 {
        simulate_playback(&session, &client, plan.seek_to.unwrap_or(0.0), play).await?;
    }
    Ok(())
}

/// Advance a fake playhead, feeding time updates through the session throttle
async fn simulate_playback(
    session: &PlayerSession,
    client: &Arc<MediaServerClient>,
    start: f64,
    seconds: f64,
) -> anyhow::Result<()> {
    let bar = ProgressBar::new((seconds * 1000.0) as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40.cyan/blue} {msg}")?);

    let end = start + seconds;
    let step = PLAYBACK_TICK.as_secs_f64();
    let mut position = start;
    let mut writes = 0u32;
    let mut ticker = tokio::time::interval(PLAYBACK_TICK);

    while position < end {
        ticker.tick().await;
        position = (position + step).min(end);
        if let Some(record) = session.on_time_update(client, position).await {
            info!(record = %record, "Progress saved");
            writes += 1;
        }
        bar.set_position(((position - start) * 1000.0) as u64);
        bar.set_message(format_time(position));
    }
    bar.finish_and_clear();

    // Background writes may still be in flight; store the final position directly
    let selection = session.selection().await;
    let record = ProgressRecord {
        position,
        subtitle_language: selection.active_subtitle_language().map(str::to_string),
        audio_language: selection.active_audio_language().map(str::to_string),
    };
    client.save_progress(session.file(), &record).await?;

    println!(
        "{}",
        output::success(&format!(
            "Played to {} ({} throttled writes, final {})",
            format_time(position),
            writes,
            record
        ))
    );
    Ok(())
}
