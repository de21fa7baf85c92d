//! Control surface model
//!
//! Everything the on-screen controls need to decide, without touching the
//! DOM: play/pause state, seek and volume geometry, the playback-rate menu,
//! keyboard shortcuts, auto-hide, and the audio/subtitle menus. The wasm
//! crate owns the elements and applies what this model returns.

use crate::tracks::TrackSelection;
use crate::types::PlayerConfig;
use serde::{Deserialize, Serialize};

/// Rates offered in the speed menu
pub const PLAYBACK_RATES: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Touch must be held this long before horizontal movement scrubs
pub const TOUCH_SCRUB_DELAY_MS: f64 = 500.0;

/// Scrub distance per pixel of finger movement
pub const TOUCH_SCRUB_SENSITIVITY: f64 = 0.2;

/// Format seconds as `MM:SS`, or `HH:MM:SS` from one hour up
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Fraction of a horizontal track under the pointer, clamped to `[0, 1]`
pub fn pointer_fraction(client_x: f64, left: f64, width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (client_x - left).clamp(0.0, width) / width
}

/// Share of the content that is buffered
pub fn buffered_fraction(buffered_end: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    (buffered_end / duration).clamp(0.0, 1.0)
}

/// Hover tooltip over the progress track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverPreview {
    /// Width of the hover highlight in pixels
    pub width_px: f64,
    /// Formatted time under the pointer
    pub label: String,
}

impl HoverPreview {
    pub fn at(client_x: f64, left: f64, width: f64, duration: f64) -> Self {
        let width_px = (client_x - left).clamp(0.0, width.max(0.0));
        let fraction = pointer_fraction(client_x, left, width);
        Self {
            width_px,
            label: format_time(duration * fraction),
        }
    }
}

/// Which kind of element has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusKind {
    Input,
    Button,
    Other,
}

impl FocusKind {
    pub fn from_tag(tag_name: &str) -> Self {
        match tag_name.to_lowercase().as_str() {
            "input" => FocusKind::Input,
            "button" => FocusKind::Button,
            _ => FocusKind::Other,
        }
    }
}

/// Keyboard shortcut actions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    /// Digit keys jump to tenths of the duration
    SeekToFraction(f64),
    TogglePlay,
    ToggleFullscreen,
    ToggleMute,
    RateUp,
    RateDown,
}

impl KeyCommand {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key(key: &str, focus: FocusKind) -> Option<Self> {
        if focus == FocusKind::Input {
            return None;
        }
        let mut chars = key.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(digit) = c.to_digit(10) {
                return Some(KeyCommand::SeekToFraction(digit as f64 / 10.0));
            }
        }
        match key.to_lowercase().as_str() {
            " " if focus == FocusKind::Button => None,
            " " => Some(KeyCommand::TogglePlay),
            "f" => Some(KeyCommand::ToggleFullscreen),
            "m" => Some(KeyCommand::ToggleMute),
            "+" => Some(KeyCommand::RateUp),
            "-" => Some(KeyCommand::RateDown),
            _ => None,
        }
    }
}

/// Playback request produced by a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
}

/// Icon flashed in the center of the player after an action
#[derive(Debug, Clone, PartialEq)]
pub enum Indicator {
    Play,
    Pause,
    Muted,
    Unmuted,
    EnterFullscreen,
    ExitFullscreen,
    Rate(f64),
}

impl Indicator {
    /// ionicons name, or `None` for text indicators
    pub fn icon_name(&self) -> Option<&'static str> {
        match self {
            Indicator::Play => Some("play-outline"),
            Indicator::Pause => Some("pause-outline"),
            Indicator::Muted => Some("volume-mute-outline"),
            Indicator::Unmuted => Some("volume-high-outline"),
            Indicator::EnterFullscreen => Some("scan-outline"),
            Indicator::ExitFullscreen => Some("contract-outline"),
            Indicator::Rate(_) => None,
        }
    }

    pub fn text(&self) -> Option<String> {
        match self {
            Indicator::Rate(rate) => Some(format!("{}x", rate)),
            _ => None,
        }
    }
}

/// Long-press touch scrubbing
#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchScrub {
    start_x: f64,
    start_width: f64,
    start_ms: f64,
}

/// Transient state of the on-screen controls
#[derive(Debug, Clone)]
pub struct ControlSurface {
    playing: bool,
    muted: bool,
    volume: f64,
    playback_rate: f64,
    fullscreen: bool,
    speed_menu_open: bool,
    controls_visible: bool,
    cursor_on_controls: bool,
    seek_dragging: bool,
    volume_dragging: bool,
    hovering_track: bool,
    touch: Option<TouchScrub>,
    rate_step: f64,
    min_rate: f64,
    max_rate: f64,
}

impl ControlSurface {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            playing: false,
            muted: false,
            volume: 1.0,
            playback_rate: 1.0,
            fullscreen: false,
            speed_menu_open: false,
            controls_visible: true,
            cursor_on_controls: false,
            seek_dragging: false,
            volume_dragging: false,
            hovering_track: false,
            touch: None,
            rate_step: config.rate_step,
            min_rate: config.min_rate,
            max_rate: config.max_rate,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Volume to apply to the media element
    pub fn effective_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn speed_menu_open(&self) -> bool {
        self.speed_menu_open
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn is_seek_dragging(&self) -> bool {
        self.seek_dragging
    }

    pub fn is_volume_dragging(&self) -> bool {
        self.volume_dragging
    }

    pub fn is_hovering_track(&self) -> bool {
        self.hovering_track
    }

    // Playback

    pub fn toggle_play(&mut self) -> PlaybackCommand {
        if self.playing {
            PlaybackCommand::Pause
        } else {
            PlaybackCommand::Play
        }
    }

    /// Record a media `play`/`pause` event; pausing reveals the controls
    pub fn set_playing(&mut self, playing: bool) -> Indicator {
        self.playing = playing;
        if playing {
            Indicator::Pause
        } else {
            self.controls_visible = true;
            Indicator::Play
        }
    }

    // Volume

    /// Flip mute; returns the volume to apply
    pub fn toggle_mute(&mut self) -> (f64, Indicator) {
        self.muted = !self.muted;
        let indicator = if self.muted {
            Indicator::Muted
        } else {
            Indicator::Unmuted
        };
        (self.effective_volume(), indicator)
    }

    /// Sync with the element's muted flag after metadata loads
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Set volume from a pointer on the volume track; returns the volume to apply
    pub fn volume_from_pointer(&mut self, client_x: f64, left: f64, width: f64) -> f64 {
        self.volume = pointer_fraction(client_x, left, width);
        self.muted = false;
        self.volume
    }

    pub fn begin_volume_drag(&mut self) {
        self.volume_dragging = true;
    }

    // Seeking

    pub fn begin_seek_drag(&mut self) {
        self.seek_dragging = true;
    }

    /// `mouseup` anywhere ends both drags
    pub fn end_drags(&mut self) {
        self.seek_dragging = false;
        self.volume_dragging = false;
    }

    pub fn set_hovering_track(&mut self, hovering: bool) {
        self.hovering_track = hovering;
    }

    pub fn touch_start(&mut self, client_x: f64, played_width: f64, time_ms: f64) {
        self.controls_visible = true;
        self.touch = Some(TouchScrub {
            start_x: client_x,
            start_width: played_width,
            start_ms: time_ms,
        });
    }

    /// Fraction to seek to for a touch move, once the long-press delay passed
    pub fn touch_move(&self, client_x: f64, time_ms: f64, track_width: f64) -> Option<f64> {
        let touch = self.touch?;
        if time_ms - touch.start_ms <= TOUCH_SCRUB_DELAY_MS || track_width <= 0.0 {
            return None;
        }
        let value = (touch.start_width + (client_x - touch.start_x) * TOUCH_SCRUB_SENSITIVITY)
            .clamp(0.0, track_width);
        Some(value / track_width)
    }

    pub fn touch_end(&mut self) {
        self.touch = None;
    }

    // Playback rate

    /// Select a rate from the speed menu; closes the menu
    pub fn select_rate(&mut self, rate: f64) -> f64 {
        self.playback_rate = rate.clamp(self.min_rate, self.max_rate);
        self.speed_menu_open = false;
        self.playback_rate
    }

    /// Step the rate by one increment within bounds
    pub fn step_rate(&mut self, up: bool) -> (f64, Indicator) {
        if up && self.playback_rate < self.max_rate {
            self.playback_rate = (self.playback_rate + self.rate_step).min(self.max_rate);
        } else if !up && self.playback_rate > self.min_rate {
            self.playback_rate = (self.playback_rate - self.rate_step).max(self.min_rate);
        }
        (self.playback_rate, Indicator::Rate(self.playback_rate))
    }

    /// Sync with the element's rate (e.g. changed by the engine)
    pub fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate;
    }

    /// Whether `rate` should carry the active mark in the speed menu
    pub fn is_active_rate(&self, rate: f64) -> bool {
        (self.playback_rate - rate).abs() < f64::EPSILON
    }

    pub fn toggle_speed_menu(&mut self) -> bool {
        self.speed_menu_open = !self.speed_menu_open;
        self.speed_menu_open
    }

    // Fullscreen

    /// Indicator for a fullscreen toggle, given whether we are currently fullscreen
    pub fn toggle_fullscreen(&self) -> Indicator {
        if self.fullscreen {
            Indicator::ExitFullscreen
        } else {
            Indicator::EnterFullscreen
        }
    }

    /// Record a `fullscreenchange` event
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    // Visibility

    /// Pointer moved over the player
    pub fn show_controls(&mut self) {
        self.controls_visible = true;
    }

    pub fn set_cursor_on_controls(&mut self, on: bool) {
        self.cursor_on_controls = on;
        if on {
            self.controls_visible = true;
        }
    }

    /// Called when the hide delay elapses; returns true if the controls hid
    pub fn hide_if_idle(&mut self) -> bool {
        if self.playing && !self.cursor_on_controls {
            self.controls_visible = false;
            self.speed_menu_open = false;
            true
        } else {
            false
        }
    }
}

/// Entry in the audio-track context menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMenuItem {
    pub index: u32,
    pub label: String,
    pub checked: bool,
}

impl AudioMenuItem {
    /// Menu text with a checkmark column
    pub fn text(&self) -> String {
        format!("{}{}", if self.checked { "\u{2713} " } else { "  " }, self.label)
    }
}

/// Items for the audio context menu; `None` when there is nothing to choose
pub fn audio_menu(selection: &TrackSelection) -> Option<Vec<AudioMenuItem>> {
    let tracks = selection.audio_tracks();
    if tracks.len() <= 1 {
        return None;
    }
    let current = selection.current_audio().map(|t| t.index);
    Some(
        tracks
            .iter()
            .map(|t| AudioMenuItem {
                index: t.index,
                label: t.display_label(),
                checked: current == Some(t.index),
            })
            .collect(),
    )
}

/// Entry in the subtitle menu; `position: None` is the "Off" entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleMenuItem {
    pub position: Option<usize>,
    pub label: String,
    pub checked: bool,
}

/// Items for the subtitle menu, "Off" first; empty without text tracks
pub fn subtitle_menu(selection: &TrackSelection) -> Vec<SubtitleMenuItem> {
    let tracks = selection.text_tracks();
    if tracks.is_empty() {
        return Vec::new();
    }
    let mut items = vec![SubtitleMenuItem {
        position: None,
        label: "Off".to_string(),
        checked: selection.showing_subtitle().is_none(),
    }];
    items.extend(tracks.iter().enumerate().map(|(i, t)| SubtitleMenuItem {
        position: Some(i),
        label: t.label.clone(),
        checked: t.is_showing(),
    }));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AudioTrack, TextTrack};

    fn surface() -> ControlSurface {
        ControlSurface::new(&PlayerConfig::default())
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(65.9), "01:05");
        assert_eq!(format_time(3599.0), "59:59");
        assert_eq!(format_time(3600.0), "01:00:00");
        assert_eq!(format_time(3.0 * 3600.0 + 7.0 * 60.0 + 9.0), "03:07:09");
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(-4.0), "00:00");
    }

    #[test]
    fn test_pointer_fraction_clamps() {
        assert_eq!(pointer_fraction(150.0, 100.0, 200.0), 0.25);
        assert_eq!(pointer_fraction(50.0, 100.0, 200.0), 0.0);
        assert_eq!(pointer_fraction(400.0, 100.0, 200.0), 1.0);
        assert_eq!(pointer_fraction(10.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_hover_preview() {
        let preview = HoverPreview::at(200.0, 100.0, 400.0, 600.0);
        assert_eq!(preview.width_px, 100.0);
        assert_eq!(preview.label, "02:30");
    }

    #[test]
    fn test_key_commands() {
        assert_eq!(
            KeyCommand::from_key("7", FocusKind::Other),
            Some(KeyCommand::SeekToFraction(0.7))
        );
        assert_eq!(
            KeyCommand::from_key("0", FocusKind::Button),
            Some(KeyCommand::SeekToFraction(0.0))
        );
        assert_eq!(KeyCommand::from_key(" ", FocusKind::Other), Some(KeyCommand::TogglePlay));
        assert_eq!(KeyCommand::from_key(" ", FocusKind::Button), None);
        assert_eq!(KeyCommand::from_key("F", FocusKind::Other), Some(KeyCommand::ToggleFullscreen));
        assert_eq!(KeyCommand::from_key("m", FocusKind::Other), Some(KeyCommand::ToggleMute));
        assert_eq!(KeyCommand::from_key("+", FocusKind::Other), Some(KeyCommand::RateUp));
        assert_eq!(KeyCommand::from_key("-", FocusKind::Other), Some(KeyCommand::RateDown));
        assert_eq!(KeyCommand::from_key("f", FocusKind::Input), None);
        assert_eq!(KeyCommand::from_key("F5", FocusKind::Other), None);
        assert_eq!(FocusKind::from_tag("INPUT"), FocusKind::Input);
    }

    #[test]
    fn test_rate_steps_within_bounds() {
        let mut s = surface();
        for _ in 0..10 {
            s.step_rate(true);
        }
        assert_eq!(s.playback_rate(), 2.0);
        for _ in 0..10 {
            s.step_rate(false);
        }
        assert_eq!(s.playback_rate(), 0.25);

        let (rate, indicator) = s.step_rate(true);
        assert_eq!(rate, 0.5);
        assert_eq!(indicator.text().as_deref(), Some("0.5x"));
        assert!(s.is_active_rate(0.5));
    }

    #[test]
    fn test_select_rate_closes_menu() {
        let mut s = surface();
        assert!(s.toggle_speed_menu());
        assert_eq!(s.select_rate(1.75), 1.75);
        assert!(!s.speed_menu_open());
    }

    #[test]
    fn test_mute_restores_volume() {
        let mut s = surface();
        s.volume_from_pointer(160.0, 100.0, 100.0);
        let (volume, indicator) = s.toggle_mute();
        assert_eq!(volume, 0.0);
        assert_eq!(indicator, Indicator::Muted);
        let (volume, _) = s.toggle_mute();
        assert!((volume - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_play_toggle_and_pause_reveals_controls() {
        let mut s = surface();
        assert_eq!(s.toggle_play(), PlaybackCommand::Play);
        s.set_playing(true);
        assert_eq!(s.toggle_play(), PlaybackCommand::Pause);
        assert!(s.hide_if_idle());
        assert!(!s.controls_visible());
        s.set_playing(false);
        assert!(s.controls_visible());
    }

    #[test]
    fn test_hide_respects_cursor_on_controls() {
        let mut s = surface();
        s.set_playing(true);
        s.toggle_speed_menu();
        s.set_cursor_on_controls(true);
        assert!(!s.hide_if_idle());
        s.set_cursor_on_controls(false);
        assert!(s.hide_if_idle());
        assert!(!s.speed_menu_open());
    }

    #[test]
    fn test_touch_scrub_after_long_press() {
        let mut s = surface();
        s.touch_start(100.0, 50.0, 1_000.0);
        assert_eq!(s.touch_move(200.0, 1_200.0, 500.0), None);
        let fraction = s.touch_move(200.0, 1_600.0, 500.0).unwrap();
        assert!((fraction - 70.0 / 500.0).abs() < 1e-9);
        s.touch_end();
        assert_eq!(s.touch_move(200.0, 9_000.0, 500.0), None);
    }

    #[test]
    fn test_audio_menu() {
        let single = TrackSelection::new(vec![AudioTrack::new(0, "en")], Some(0));
        assert!(audio_menu(&single).is_none());

        let s = TrackSelection::new(
            vec![AudioTrack::new(0, "en").with_label("English"), AudioTrack::new(1, "fr")],
            Some(1),
        );
        let items = audio_menu(&s).unwrap();
        assert_eq!(items[0].text(), "  English");
        assert_eq!(items[1].text(), "\u{2713} FR");
    }

    #[test]
    fn test_subtitle_menu() {
        let mut s = TrackSelection::default();
        assert!(subtitle_menu(&s).is_empty());

        s.add_text_track(TextTrack::new("en", "EN - English", "/en.vtt"));
        s.show_subtitle("en");
        let items = subtitle_menu(&s);
        assert_eq!(items.len(), 2);
        assert!(!items[0].checked);
        assert!(items[1].checked);
    }

    #[test]
    fn test_buffered_fraction() {
        assert_eq!(buffered_fraction(30.0, 120.0), 0.25);
        assert_eq!(buffered_fraction(30.0, f64::NAN), 0.0);
    }
}
