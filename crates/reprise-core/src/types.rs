//! Core types for Reprise

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a playback session (one per page load)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display mode of a text track, mirroring `TextTrack.mode` in the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    Showing,
    Hidden,
    #[default]
    Disabled,
}

impl std::fmt::Display for TrackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackMode::Showing => write!(f, "showing"),
            TrackMode::Hidden => write!(f, "hidden"),
            TrackMode::Disabled => write!(f, "disabled"),
        }
    }
}

/// An audio rendition exposed by the streaming engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Engine-assigned index, stable for the lifetime of the stream
    pub index: u32,
    /// Language code (e.g. "en", "fr")
    pub language: Option<String>,
    /// Human-readable label from the manifest
    pub label: Option<String>,
}

impl AudioTrack {
    pub fn new(index: u32, language: impl Into<String>) -> Self {
        Self {
            index,
            language: Some(language.into()),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Menu label: the manifest label, falling back to the upper-cased language
    pub fn display_label(&self) -> String {
        match (&self.label, &self.language) {
            (Some(label), _) if !label.is_empty() => label.clone(),
            (_, Some(lang)) => lang.to_uppercase(),
            _ => format!("Track {}", self.index + 1),
        }
    }
}

/// A subtitle track registered on the media element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTrack {
    /// Language code (`srclang`)
    pub language: String,
    /// Display label
    pub label: String,
    /// Source path of the cue file
    pub src: String,
    /// Current display mode
    pub mode: TrackMode,
}

impl TextTrack {
    pub fn new(language: impl Into<String>, label: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            label: label.into(),
            src: src.into(),
            mode: TrackMode::Disabled,
        }
    }

    pub fn is_showing(&self) -> bool {
        self.mode == TrackMode::Showing
    }
}

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Base URL of the media server
    pub server_url: Url,
    /// Delay between manifest readiness checks (milliseconds)
    pub poll_interval_ms: u64,
    /// Give up waiting after this many checks (None = wait indefinitely)
    pub max_poll_attempts: Option<u32>,
    /// Minimum delay between progress writes (milliseconds)
    pub save_interval_ms: u64,
    /// Saved positions at or below this many seconds are not resumed
    pub resume_threshold: f64,
    /// Audio language selected when the stream starts
    pub default_audio_language: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Playback rate change per `+`/`-` key press
    pub rate_step: f64,
    /// Lowest reachable playback rate
    pub min_rate: f64,
    /// Highest reachable playback rate
    pub max_rate: f64,
    /// Delay before idle controls are hidden (milliseconds)
    pub controls_hide_delay_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse("http://localhost:8080/").expect("static URL is valid"),
            poll_interval_ms: 3000,
            max_poll_attempts: None,
            save_interval_ms: 5000,
            resume_threshold: 5.0,
            default_audio_language: "en".to_string(),
            request_timeout_ms: 10000,
            rate_step: 0.25,
            min_rate: 0.25,
            max_rate: 2.0,
            controls_hide_delay_ms: 500,
        }
    }
}

impl PlayerConfig {
    /// Config pointed at a different server, other values default
    pub fn with_server(server_url: Url) -> Self {
        Self {
            server_url,
            ..Default::default()
        }
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(crate::Error::InvalidConfig(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.rate_step <= 0.0 || self.min_rate <= 0.0 || self.min_rate > self.max_rate {
            return Err(crate::Error::InvalidConfig(format!(
                "invalid playback rate range {}..{} step {}",
                self.min_rate, self.max_rate, self.rate_step
            )));
        }
        if self.resume_threshold < 0.0 {
            return Err(crate::Error::InvalidConfig(
                "resume_threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_track_label_fallback() {
        let labelled = AudioTrack::new(0, "en").with_label("English 5.1");
        assert_eq!(labelled.display_label(), "English 5.1");

        let bare = AudioTrack::new(1, "fr");
        assert_eq!(bare.display_label(), "FR");

        let unknown = AudioTrack {
            index: 2,
            language: None,
            label: None,
        };
        assert_eq!(unknown.display_label(), "Track 3");
    }

    #[test]
    fn test_config_partial_json() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"poll_interval_ms": 1000, "default_audio_language": "ja"}"#)
                .unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.default_audio_language, "ja");
        assert_eq!(config.save_interval_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_rates() {
        let config = PlayerConfig {
            min_rate: 3.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
