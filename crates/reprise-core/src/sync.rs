//! Progress synchronization
//!
//! Restores a saved position and track choices when a stream starts, then
//! decides when the live position is pushed back to the progress endpoint.

use crate::progress::{ProgressRecord, SaveThrottle};
use crate::tracks::TrackSelection;
use crate::types::{AudioTrack, PlayerConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What the player must do to apply a saved record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestorePlan {
    /// Seek here once metadata is available
    pub seek_to: Option<f64>,
    /// Switch the engine to this audio track
    pub audio: Option<AudioTrack>,
    /// Subtitle language that was applied to the text tracks
    pub subtitle: Option<String>,
}

impl RestorePlan {
    pub fn is_empty(&self) -> bool {
        self.seek_to.is_none() && self.audio.is_none() && self.subtitle.is_none()
    }
}

/// Per-session progress synchronizer
#[derive(Debug, Clone)]
pub struct ProgressSynchronizer {
    throttle: SaveThrottle,
    resume_threshold: f64,
}

impl ProgressSynchronizer {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            throttle: SaveThrottle::new(config.save_interval_ms),
            resume_threshold: config.resume_threshold,
        }
    }

    /// Apply `record` to `selection` and return the engine-side actions
    pub fn plan_restore(&self, record: &ProgressRecord, selection: &mut TrackSelection) -> RestorePlan {
        let mut plan = RestorePlan::default();

        if record.position > self.resume_threshold {
            plan.seek_to = Some(record.position);
        }

        if let Some(ref lang) = record.audio_language {
            plan.audio = selection.select_audio_language(lang).cloned();
        }

        if let Some(ref lang) = record.subtitle_language {
            selection.show_subtitle(lang);
            plan.subtitle = Some(lang.clone());
        }

        info!(
            seek_to = ?plan.seek_to,
            audio = ?plan.audio.as_ref().and_then(|t| t.language.as_deref()),
            subtitle = ?plan.subtitle,
            "Restore plan"
        );
        plan
    }

    /// Handle a time update; returns the record to write if one is due
    pub fn on_time_update(
        &mut self,
        now_ms: f64,
        current_time: f64,
        selection: &TrackSelection,
    ) -> Option<ProgressRecord> {
        if current_time <= 0.0 || !current_time.is_finite() {
            return None;
        }
        if !self.throttle.try_acquire(now_ms) {
            return None;
        }

        let record = ProgressRecord {
            position: current_time,
            subtitle_language: selection.active_subtitle_language().map(str::to_string),
            audio_language: selection.active_audio_language().map(str::to_string),
        };
        debug!(record = %record, "Progress write due");
        Some(record)
    }

    pub fn last_save_ms(&self) -> Option<f64> {
        self.throttle.last_save_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextTrack;

    fn selection() -> TrackSelection {
        let mut s = TrackSelection::new(vec![AudioTrack::new(0, "ja"), AudioTrack::new(1, "en")], Some(0));
        s.add_text_track(TextTrack::new("en", "EN", "/en.vtt"));
        s.add_text_track(TextTrack::new("fr", "FR", "/fr.vtt"));
        s
    }

    #[test]
    fn test_restore_full_record() {
        let sync = ProgressSynchronizer::new(&PlayerConfig::default());
        let mut s = selection();
        let plan = sync.plan_restore(&"42.5 fr en".parse().unwrap(), &mut s);

        assert_eq!(plan.seek_to, Some(42.5));
        assert_eq!(plan.audio.map(|t| t.index), Some(1));
        assert_eq!(plan.subtitle.as_deref(), Some("fr"));
        assert_eq!(s.active_subtitle_language(), Some("fr"));
    }

    #[test]
    fn test_short_position_not_resumed() {
        let sync = ProgressSynchronizer::new(&PlayerConfig::default());
        let mut s = selection();
        let plan = sync.plan_restore(&ProgressRecord::new(5.0), &mut s);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unknown_audio_language_keeps_current() {
        let sync = ProgressSynchronizer::new(&PlayerConfig::default());
        let mut s = selection();
        let plan = sync.plan_restore(&ProgressRecord::new(60.0).with_audio("de"), &mut s);
        assert!(plan.audio.is_none());
        assert_eq!(s.active_audio_language(), Some("ja"));
    }

    #[test]
    fn test_time_update_throttled() {
        let mut sync = ProgressSynchronizer::new(&PlayerConfig::default());
        let mut s = selection();
        s.show_subtitle("en");

        let first = sync.on_time_update(10_000.0, 12.0, &s).unwrap();
        assert_eq!(first.to_string(), "12 en ja");

        // Time updates fire roughly every 250ms
        let mut now = 10_000.0;
        let mut writes = 0;
        while now < 15_000.0 {
            now += 250.0;
            if sync.on_time_update(now, 12.0 + (now - 10_000.0) / 1000.0, &s).is_some() {
                writes += 1;
            }
        }
        assert_eq!(writes, 0);
        assert!(sync.on_time_update(15_250.0, 17.25, &s).is_some());
    }

    #[test]
    fn test_zero_time_does_not_claim_slot() {
        let mut sync = ProgressSynchronizer::new(&PlayerConfig::default());
        let s = selection();
        assert!(sync.on_time_update(1_000.0, 0.0, &s).is_none());
        assert!(sync.last_save_ms().is_none());
        assert!(sync.on_time_update(1_100.0, 0.1, &s).is_some());
    }
}
