//! Progress records and write throttling
//!
//! The progress endpoint stores, per file, the last playback position and
//! the chosen subtitle/audio languages. On the wire a record is the triple
//! `"<position> <subtitle> <audio>"` where `-` marks an absent language.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use tracing::debug;

/// Sentinel for an absent language on the wire
pub const ABSENT: &str = "-";

/// Saved playback state for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Position in seconds
    pub position: f64,
    /// Language of the showing subtitle track
    pub subtitle_language: Option<String>,
    /// Language of the selected audio track
    pub audio_language: Option<String>,
}

impl ProgressRecord {
    pub fn new(position: f64) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_subtitle(mut self, language: impl Into<String>) -> Self {
        self.subtitle_language = Some(language.into());
        self
    }

    pub fn with_audio(mut self, language: impl Into<String>) -> Self {
        self.audio_language = Some(language.into());
        self
    }

    /// Parse a response body; a garbled position still keeps the languages
    pub fn from_response(body: &str) -> Self {
        body.parse().unwrap_or_default()
    }

    /// Query pairs for a write request, in endpoint order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("position", self.position.to_string())];
        if let Some(ref audio) = self.audio_language {
            pairs.push(("audio", audio.clone()));
        }
        if let Some(ref subtitle) = self.subtitle_language {
            pairs.push(("subtitle", subtitle.clone()));
        }
        pairs
    }
}

fn language_field(field: Option<&str>) -> Option<String> {
    match field {
        None | Some(ABSENT) | Some("") => None,
        Some(lang) => Some(lang.to_string()),
    }
}

/// A missing, unparsable, negative or non-finite position means "no resume"
fn position_field(field: Option<&str>) -> f64 {
    let Some(raw) = field else {
        return 0.0;
    };
    match raw.parse::<f64>() {
        Ok(position) if position.is_finite() && position >= 0.0 => position,
        _ => {
            debug!(position = raw, "Ignoring unusable saved position");
            0.0
        }
    }
}

impl FromStr for ProgressRecord {
    type Err = Infallible;

    /// Language fields are read even when the position is unusable
    fn from_str(s: &str) -> std::result::Result<Self, Infallible> {
        let mut fields = s.split_whitespace();
        Ok(Self {
            position: position_field(fields.next()),
            subtitle_language: language_field(fields.next()),
            audio_language: language_field(fields.next()),
        })
    }
}

impl std::fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.position,
            self.subtitle_language.as_deref().unwrap_or(ABSENT),
            self.audio_language.as_deref().unwrap_or(ABSENT)
        )
    }
}

/// Rate limiter for progress writes
///
/// Timestamps are wall-clock milliseconds (`Date.now()` in the browser,
/// `chrono::Utc::now()` natively). A write is allowed only when strictly more
/// than `interval_ms` passed since the last allowed one.
#[derive(Debug, Clone)]
pub struct SaveThrottle {
    interval_ms: f64,
    last_save_ms: Option<f64>,
}

impl SaveThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms as f64,
            last_save_ms: None,
        }
    }

    /// Claim the write slot at `now_ms`; returns false if too soon
    pub fn try_acquire(&mut self, now_ms: f64) -> bool {
        let due = match self.last_save_ms {
            None => true,
            Some(last) => now_ms - last > self.interval_ms,
        };
        if due {
            self.last_save_ms = Some(now_ms);
        }
        due
    }

    pub fn last_save_ms(&self) -> Option<f64> {
        self.last_save_ms
    }

    pub fn reset(&mut self) {
        self.last_save_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let record: ProgressRecord = "42.5 fr en".parse().unwrap();
        assert_eq!(record.position, 42.5);
        assert_eq!(record.subtitle_language.as_deref(), Some("fr"));
        assert_eq!(record.audio_language.as_deref(), Some("en"));
    }

    #[test]
    fn test_parse_absent_languages() {
        let record: ProgressRecord = "120 - -\n".parse().unwrap();
        assert_eq!(record, ProgressRecord::new(120.0));

        let record: ProgressRecord = "7.25 - ja".parse().unwrap();
        assert_eq!(record.subtitle_language, None);
        assert_eq!(record.audio_language.as_deref(), Some("ja"));
    }

    #[test]
    fn test_parse_short_and_empty() {
        assert_eq!("".parse::<ProgressRecord>().unwrap(), ProgressRecord::default());
        assert_eq!("15".parse::<ProgressRecord>().unwrap(), ProgressRecord::new(15.0));
    }

    #[test]
    fn test_unusable_position_keeps_languages() {
        let record = ProgressRecord::from_response("abc fr en");
        assert_eq!(record.position, 0.0);
        assert_eq!(record.subtitle_language.as_deref(), Some("fr"));
        assert_eq!(record.audio_language.as_deref(), Some("en"));

        assert_eq!(ProgressRecord::from_response("NaN - de").position, 0.0);
        assert_eq!(ProgressRecord::from_response("inf - -").position, 0.0);
        let record = ProgressRecord::from_response("-3 ja -");
        assert_eq!(record.position, 0.0);
        assert_eq!(record.subtitle_language.as_deref(), Some("ja"));
        assert_eq!(ProgressRecord::from_response("<html>"), ProgressRecord::default());
    }

    #[test]
    fn test_wire_format() {
        let record = ProgressRecord::new(42.5).with_subtitle("fr").with_audio("en");
        assert_eq!(record.to_string(), "42.5 fr en");
        assert_eq!(ProgressRecord::new(10.0).to_string(), "10 - -");
    }

    #[test]
    fn test_query_pairs_omit_absent() {
        let pairs = ProgressRecord::new(61.0).with_audio("de").query_pairs();
        assert_eq!(
            pairs,
            vec![("position", "61".to_string()), ("audio", "de".to_string())]
        );
    }

    #[test]
    fn test_throttle_window() {
        let mut throttle = SaveThrottle::new(5000);
        assert!(throttle.try_acquire(1_000.0));
        assert!(!throttle.try_acquire(1_250.0));
        assert!(!throttle.try_acquire(6_000.0)); // exactly 5s is still too soon
        assert!(throttle.try_acquire(6_001.0));
        assert_eq!(throttle.last_save_ms(), Some(6_001.0));

        throttle.reset();
        assert!(throttle.try_acquire(6_002.0));
    }
}
