//! Integration tests for Reprise Core

#![cfg(feature = "native")]

use async_trait::async_trait;
use reprise_core::{
    controls::{audio_menu, ControlSurface, KeyCommand},
    subtitles::parse_descriptors,
    AudioTrack, DescriptorFormat, ManifestProbe, ManifestStatus, PlayerConfig, PlayerSession,
    ProgressRecord, ProgressStore, ReadinessState, Result, TrackMode,
};
use std::sync::{Arc, Mutex};
use tokio_test::assert_ok;

// =============================================================================
// Fakes
// =============================================================================

/// Answers manifest checks from a script and records when each was made
struct ScriptedProbe {
    statuses: Mutex<Vec<u16>>,
    checks: Mutex<u32>,
}

impl ScriptedProbe {
    fn new(statuses: &[u16]) -> Self {
        Self {
            statuses: Mutex::new(statuses.to_vec()),
            checks: Mutex::new(0),
        }
    }

    fn checks(&self) -> u32 {
        *self.checks.lock().unwrap()
    }
}

#[async_trait]
impl ManifestProbe for ScriptedProbe {
    async fn check_manifest(&self, _file: &str) -> Result<ManifestStatus> {
        *self.checks.lock().unwrap() += 1;
        let status = self.statuses.lock().unwrap().remove(0);
        Ok(ManifestStatus::from_status(status))
    }
}

/// In-memory progress endpoint
#[derive(Default)]
struct MemoryStore {
    body: String,
    writes: Mutex<Vec<(String, ProgressRecord)>>,
}

impl MemoryStore {
    fn with_body(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Default::default()
        }
    }

    fn writes(&self) -> Vec<(String, ProgressRecord)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load_progress(&self, _file: &str) -> Result<ProgressRecord> {
        Ok(ProgressRecord::from_response(&self.body))
    }

    async fn save_progress(&self, file: &str, record: &ProgressRecord) -> Result<()> {
        self.writes.lock().unwrap().push((file.to_string(), record.clone()));
        Ok(())
    }
}

fn fast_config() -> PlayerConfig {
    PlayerConfig {
        poll_interval_ms: 1,
        ..Default::default()
    }
}

fn audio_tracks() -> Vec<AudioTrack> {
    vec![
        AudioTrack::new(0, "ja").with_label("Japanese"),
        AudioTrack::new(1, "en").with_label("English"),
    ]
}

// =============================================================================
// Readiness
// =============================================================================

#[tokio::test]
async fn test_playback_starts_only_after_ready() {
    let session = PlayerSession::new(fast_config(), "show/ep1.mkv");
    let probe = ScriptedProbe::new(&[202, 202, 202, 200]);
    let mut states = session.subscribe_state();

    assert_ok!(session.wait_until_ready(&probe).await);

    assert_eq!(probe.checks(), 4);
    assert_eq!(session.state().await, ReadinessState::Ready);
    assert_eq!(*states.borrow_and_update(), ReadinessState::Ready);
}

#[tokio::test]
async fn test_missing_manifest_is_terminal() {
    let session = PlayerSession::new(fast_config(), "gone.mkv");
    let probe = ScriptedProbe::new(&[202, 404, 200]);

    let err = session.wait_until_ready(&probe).await.unwrap_err();

    assert_eq!(err.error_code(), "MANIFEST_NOT_FOUND");
    assert_eq!(probe.checks(), 2);
    assert_eq!(session.status_message().await, "Error: Manifest not found");
}

#[tokio::test]
async fn test_incomplete_manifest_resumes_polling() {
    let session = PlayerSession::new(fast_config(), "a.mkv");
    let probe = ScriptedProbe::new(&[200, 202, 200]);

    assert_ok!(session.wait_until_ready(&probe).await);
    assert_ok!(session.recover_incomplete_manifest(&probe).await);

    assert_eq!(probe.checks(), 3);
    assert_eq!(session.state().await, ReadinessState::Ready);
}

// =============================================================================
// Progress restore and writes
// =============================================================================

#[tokio::test]
async fn test_restore_position_and_tracks() {
    let session = PlayerSession::new(fast_config(), "a.mkv");
    let subtitles = parse_descriptors(
        "en\tEnglish\t/media/a.mkv/subtitle.en.vtt\nfr\tFrench\t/media/a.mkv/subtitle.fr.vtt\n",
        DescriptorFormat::Tabs,
    );
    session.load_tracks(audio_tracks(), &subtitles).await;

    let store = MemoryStore::with_body("42.5 fr en");
    let plan = session.restore(&store).await;

    assert_eq!(plan.seek_to, Some(42.5));
    assert_eq!(plan.audio.as_ref().map(|t| t.index), Some(1));
    assert_eq!(session.position().await, 42.5);

    let selection = session.selection().await;
    assert_eq!(selection.active_audio_language(), Some("en"));
    let modes: Vec<_> = selection
        .text_tracks()
        .iter()
        .map(|t| (t.language.as_str(), t.mode))
        .collect();
    assert_eq!(modes, vec![("en", TrackMode::Hidden), ("fr", TrackMode::Showing)]);
}

#[tokio::test]
async fn test_empty_progress_restores_nothing() {
    let session = PlayerSession::new(fast_config(), "a.mkv");
    session.load_tracks(audio_tracks(), &[]).await;

    let plan = session.restore(&MemoryStore::with_body("\n")).await;

    assert!(plan.is_empty());
    assert_eq!(session.position().await, 0.0);
}

#[tokio::test]
async fn test_unusable_position_still_restores_tracks() {
    let session = PlayerSession::new(fast_config(), "a.mkv");
    let subtitles = parse_descriptors(
        "en\tEnglish\t/media/a.mkv/subtitle.en.vtt\nfr\tFrench\t/media/a.mkv/subtitle.fr.vtt\n",
        DescriptorFormat::Tabs,
    );
    session.load_tracks(audio_tracks(), &subtitles).await;

    let plan = session.restore(&MemoryStore::with_body("abc fr en")).await;

    assert_eq!(plan.seek_to, None);
    assert_eq!(plan.subtitle.as_deref(), Some("fr"));
    assert_eq!(plan.audio.as_ref().map(|t| t.index), Some(1));
    assert_eq!(session.position().await, 0.0);
    assert_eq!(session.selection().await.active_subtitle_language(), Some("fr"));
}

#[tokio::test]
async fn test_writes_rate_limited() {
    let session = PlayerSession::new(fast_config(), "a.mkv");
    session.load_tracks(audio_tracks(), &[]).await;
    let store = Arc::new(MemoryStore::default());

    // 20 seconds of time updates every 250ms
    let mut issued = Vec::new();
    for tick in 0..80u32 {
        let now_ms = 1_000_000.0 + f64::from(tick) * 250.0;
        let current_time = 30.0 + f64::from(tick) * 0.25;
        if session.on_time_update_at(&store, current_time, now_ms).await.is_some() {
            issued.push(now_ms);
        }
    }

    assert!(!issued.is_empty());
    for pair in issued.windows(2) {
        assert!(pair[1] - pair[0] > 5_000.0);
    }

    // Background writes land with the session's current languages
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let writes = store.writes();
    assert_eq!(writes.len(), issued.len());
    assert!(writes.iter().all(|(file, r)| file == "a.mkv" && r.audio_language.as_deref() == Some("en")));
}

// =============================================================================
// Subtitles and controls
// =============================================================================

#[test]
fn test_single_descriptor_single_track() {
    let tracks = parse_descriptors("en\tEnglish\t/path.vtt", DescriptorFormat::Tabs);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].to_text_track().language, "en");
}

#[test]
fn test_keyboard_decile_seek() {
    let duration = 1200.0;
    for digit in 0..=9u32 {
        let key = digit.to_string();
        match KeyCommand::from_key(&key, reprise_core::controls::FocusKind::Other) {
            Some(KeyCommand::SeekToFraction(f)) => {
                assert!((duration * f - 120.0 * f64::from(digit)).abs() < 1e-9)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

#[test]
fn test_context_menu_marks_active_track() {
    let mut selection = reprise_core::TrackSelection::new(audio_tracks(), Some(0));
    selection.select_audio_language("en");
    let items = audio_menu(&selection).unwrap();
    assert_eq!(items.len(), 2);
    assert!(!items[0].checked);
    assert!(items[1].checked);
    assert_eq!(items[1].text(), "\u{2713} English");

    let surface = ControlSurface::new(&PlayerConfig::default());
    assert_eq!(surface.playback_rate(), 1.0);
}
