//! Audio and subtitle track selection

use crate::types::{AudioTrack, TextTrack, TrackMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tracks available on the current stream and which ones are active
///
/// At most one text track is ever in [`TrackMode::Showing`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackSelection {
    audio: Vec<AudioTrack>,
    current_audio: Option<u32>,
    text: Vec<TextTrack>,
}

impl TrackSelection {
    pub fn new(audio: Vec<AudioTrack>, current_audio: Option<u32>) -> Self {
        Self {
            audio,
            current_audio,
            text: Vec::new(),
        }
    }

    pub fn audio_tracks(&self) -> &[AudioTrack] {
        &self.audio
    }

    pub fn text_tracks(&self) -> &[TextTrack] {
        &self.text
    }

    pub fn set_audio_tracks(&mut self, tracks: Vec<AudioTrack>, current: Option<u32>) {
        self.audio = tracks;
        self.current_audio = current;
    }

    /// Register a text track; a showing track demotes any other showing one
    pub fn add_text_track(&mut self, track: TextTrack) {
        if track.is_showing() {
            self.hide_showing();
        }
        self.text.push(track);
    }

    pub fn current_audio(&self) -> Option<&AudioTrack> {
        let index = self.current_audio?;
        self.audio.iter().find(|t| t.index == index)
    }

    /// Select an audio track by engine index
    pub fn select_audio(&mut self, index: u32) -> Option<&AudioTrack> {
        let found = self.audio.iter().position(|t| t.index == index)?;
        self.current_audio = Some(index);
        self.audio.get(found)
    }

    /// Select the first audio track in `language`; no change if none matches
    pub fn select_audio_language(&mut self, language: &str) -> Option<&AudioTrack> {
        let index = self
            .audio
            .iter()
            .find(|t| t.language.as_deref() == Some(language))?
            .index;
        debug!(language, index, "Selecting audio track");
        self.select_audio(index)
    }

    /// Show the tracks in `language`, hiding every other one
    ///
    /// Only the first matching track is shown. Returns whether any matched.
    pub fn show_subtitle(&mut self, language: &str) -> bool {
        let mut shown = false;
        for track in &mut self.text {
            if !shown && track.language == language {
                track.mode = TrackMode::Showing;
                shown = true;
            } else {
                track.mode = TrackMode::Hidden;
            }
        }
        debug!(language, shown, "Applied subtitle selection");
        shown
    }

    /// Show the track at `position` in registration order, or turn subtitles off with `None`
    pub fn show_subtitle_at(&mut self, position: Option<usize>) {
        for (i, track) in self.text.iter_mut().enumerate() {
            track.mode = if Some(i) == position {
                TrackMode::Showing
            } else {
                TrackMode::Hidden
            };
        }
    }

    pub fn hide_subtitles(&mut self) {
        self.show_subtitle_at(None);
    }

    fn hide_showing(&mut self) {
        for track in self.text.iter_mut().filter(|t| t.is_showing()) {
            track.mode = TrackMode::Hidden;
        }
    }

    /// The showing text track, if any
    pub fn showing_subtitle(&self) -> Option<&TextTrack> {
        self.text.iter().find(|t| t.is_showing())
    }

    pub fn active_audio_language(&self) -> Option<&str> {
        self.current_audio()?.language.as_deref()
    }

    pub fn active_subtitle_language(&self) -> Option<&str> {
        self.showing_subtitle().map(|t| t.language.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> TrackSelection {
        let mut s = TrackSelection::new(
            vec![AudioTrack::new(0, "ja"), AudioTrack::new(1, "en"), AudioTrack::new(2, "fr")],
            Some(0),
        );
        s.add_text_track(TextTrack::new("en", "EN", "/en.vtt"));
        s.add_text_track(TextTrack::new("fr", "FR", "/fr.vtt"));
        s.add_text_track(TextTrack::new("fr", "FR - Forced", "/fr.forced.vtt"));
        s
    }

    #[test]
    fn test_select_audio_language() {
        let mut s = selection();
        assert_eq!(s.select_audio_language("en").map(|t| t.index), Some(1));
        assert_eq!(s.active_audio_language(), Some("en"));

        assert!(s.select_audio_language("de").is_none());
        assert_eq!(s.active_audio_language(), Some("en"));
    }

    #[test]
    fn test_single_showing_subtitle() {
        let mut s = selection();
        assert!(s.show_subtitle("fr"));
        let showing: Vec<_> = s.text_tracks().iter().filter(|t| t.is_showing()).collect();
        assert_eq!(showing.len(), 1);
        assert_eq!(showing[0].src, "/fr.vtt");
        assert_eq!(s.text_tracks()[0].mode, TrackMode::Hidden);
        assert_eq!(s.active_subtitle_language(), Some("fr"));
    }

    #[test]
    fn test_unmatched_subtitle_hides_all() {
        let mut s = selection();
        s.show_subtitle("en");
        assert!(!s.show_subtitle("de"));
        assert!(s.showing_subtitle().is_none());
        assert!(s.text_tracks().iter().all(|t| t.mode == TrackMode::Hidden));
    }

    #[test]
    fn test_adding_showing_track_demotes_previous() {
        let mut s = selection();
        s.show_subtitle("en");
        let mut extra = TextTrack::new("de", "DE", "/de.vtt");
        extra.mode = TrackMode::Showing;
        s.add_text_track(extra);
        assert_eq!(s.active_subtitle_language(), Some("de"));
        assert_eq!(s.text_tracks().iter().filter(|t| t.is_showing()).count(), 1);
    }

    #[test]
    fn test_show_by_position_and_off() {
        let mut s = selection();
        s.show_subtitle_at(Some(2));
        assert_eq!(s.showing_subtitle().map(|t| t.src.as_str()), Some("/fr.forced.vtt"));
        s.hide_subtitles();
        assert!(s.showing_subtitle().is_none());
    }
}
