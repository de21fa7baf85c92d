//! Player Session - per-file orchestrator
//!
//! Owns everything one playback needs between page load and unload:
//! - Readiness polling until the manifest exists
//! - Track selection (audio rendition, showing subtitle)
//! - Progress restore and throttled progress writes
//!
//! One session is constructed per file and handed by reference to whatever
//! drives it (the CLI here, the DOM event handlers in the wasm crate).

use crate::{
    client::{ManifestProbe, ProgressStore},
    progress::ProgressRecord,
    readiness::{ManifestStatus, PollAction, ReadinessEvent, ReadinessPoller, ReadinessState},
    subtitles::SubtitleDescriptor,
    sync::{ProgressSynchronizer, RestorePlan},
    tracks::TrackSelection,
    types::*,
    Error, Result,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Current wall-clock time in milliseconds
fn now_ms() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

/// Player session managing a single file
pub struct PlayerSession {
    /// Unique session ID
    id: SessionId,
    /// Session configuration
    config: PlayerConfig,
    /// Media path relative to the server's library root
    file: String,
    /// Readiness state machine
    poller: Mutex<ReadinessPoller>,
    /// Readiness change broadcaster
    state_tx: watch::Sender<ReadinessState>,
    /// Available and active tracks
    selection: RwLock<TrackSelection>,
    /// Restore and write throttling
    sync: Mutex<ProgressSynchronizer>,
    /// Last known playback position
    position: RwLock<f64>,
    /// Session start time
    start_time: Instant,
}

impl PlayerSession {
    /// Create a new player session
    pub fn new(config: PlayerConfig, file: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(ReadinessState::Polling);

        Self {
            id: SessionId::new(),
            poller: Mutex::new(ReadinessPoller::new(config.poll_interval())),
            sync: Mutex::new(ProgressSynchronizer::new(&config)),
            config,
            file: file.into(),
            state_tx,
            selection: RwLock::new(TrackSelection::default()),
            position: RwLock::new(0.0),
            start_time: Instant::now(),
        }
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Get current readiness state
    pub async fn state(&self) -> ReadinessState {
        self.poller.lock().await.state()
    }

    /// Current status banner text
    pub async fn status_message(&self) -> String {
        self.poller.lock().await.message().to_string()
    }

    /// Subscribe to readiness changes
    pub fn subscribe_state(&self) -> watch::Receiver<ReadinessState> {
        self.state_tx.subscribe()
    }

    async fn handle(&self, event: ReadinessEvent) -> Result<PollAction> {
        let mut poller = self.poller.lock().await;
        let action = poller.handle(event)?;
        let _ = self.state_tx.send(poller.state());
        Ok(action)
    }

    /// Poll the manifest until it is ready, fails, or the attempt cap is hit
    #[instrument(skip(self, probe), fields(file = %self.file, session_id = %self.id))]
    pub async fn wait_until_ready<P>(&self, probe: &P) -> Result<()>
    where
        P: ManifestProbe + ?Sized,
    {
        match self.state().await {
            ReadinessState::Ready => return Ok(()),
            ReadinessState::Error => {
                self.handle(ReadinessEvent::Restart).await?;
            }
            _ => {}
        }

        loop {
            let status = match probe.check_manifest(&self.file).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, "Manifest check failed");
                    ManifestStatus::Unreachable
                }
            };

            match self.handle(ReadinessEvent::Checked(status)).await? {
                PollAction::StartPlayback => return Ok(()),
                PollAction::CheckNow => continue,
                PollAction::Retry(delay) => {
                    let checks = self.poller.lock().await.checks();
                    if let Some(max) = self.config.max_poll_attempts {
                        if checks >= max {
                            return Err(Error::PollAttemptsExhausted { attempts: checks });
                        }
                    }
                    debug!(checks, delay_ms = delay.as_millis() as u64, "Waiting for manifest");
                    tokio::time::sleep(delay).await;
                }
                PollAction::Stop => {
                    let poller = self.poller.lock().await;
                    return Err(poller
                        .failure(status)
                        .unwrap_or_else(|| Error::Internal(poller.message().to_string())));
                }
            }
        }
    }

    /// The engine found the manifest truncated; wait for it again
    #[instrument(skip(self, probe), fields(file = %self.file))]
    pub async fn recover_incomplete_manifest<P>(&self, probe: &P) -> Result<()>
    where
        P: ManifestProbe + ?Sized,
    {
        if let PollAction::Retry(delay) = self.handle(ReadinessEvent::ManifestIncomplete).await? {
            tokio::time::sleep(delay).await;
        }
        self.wait_until_ready(probe).await
    }

    /// Register the stream's tracks and apply the default audio language
    pub async fn load_tracks(&self, audio: Vec<AudioTrack>, subtitles: &[SubtitleDescriptor]) {
        let mut selection = self.selection.write().await;
        let first = audio.first().map(|t| t.index);
        selection.set_audio_tracks(audio, first);
        for descriptor in subtitles {
            selection.add_text_track(descriptor.to_text_track());
        }
        if selection
            .select_audio_language(&self.config.default_audio_language)
            .is_none()
        {
            debug!(
                language = %self.config.default_audio_language,
                "Default audio language not available"
            );
        }
        info!(
            audio = selection.audio_tracks().len(),
            subtitles = selection.text_tracks().len(),
            "Tracks loaded"
        );
    }

    /// Fetch the saved record and apply it; read failures mean "nothing to restore"
    #[instrument(skip(self, store), fields(file = %self.file))]
    pub async fn restore<S>(&self, store: &S) -> RestorePlan
    where
        S: ProgressStore + ?Sized,
    {
        let record = match store.load_progress(&self.file).await {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Progress read failed");
                return RestorePlan::default();
            }
        };

        let mut selection = self.selection.write().await;
        let plan = self.sync.lock().await.plan_restore(&record, &mut selection);
        if let Some(position) = plan.seek_to {
            *self.position.write().await = position;
        }
        plan
    }

    /// Handle a time update; a due write is sent in the background
    pub async fn on_time_update<S>(&self, store: &Arc<S>, current_time: f64) -> Option<ProgressRecord>
    where
        S: ProgressStore + ?Sized + 'static,
    {
        self.on_time_update_at(store, current_time, now_ms()).await
    }

    /// [`Self::on_time_update`] with an explicit clock
    pub async fn on_time_update_at<S>(
        &self,
        store: &Arc<S>,
        current_time: f64,
        now_ms: f64,
    ) -> Option<ProgressRecord>
    where
        S: ProgressStore + ?Sized + 'static,
    {
        *self.position.write().await = current_time;

        let record = {
            let selection = self.selection.read().await;
            self.sync.lock().await.on_time_update(now_ms, current_time, &selection)?
        };

        let store = Arc::clone(store);
        let file = self.file.clone();
        let write = record.clone();
        tokio::spawn(async move {
            if let Err(e) = store.save_progress(&file, &write).await {
                debug!(error = %e, "Progress write dropped");
            }
        });

        Some(record)
    }

    /// Switch audio by engine index
    pub async fn select_audio(&self, index: u32) -> Option<AudioTrack> {
        self.selection.write().await.select_audio(index).cloned()
    }

    /// Show subtitles in `language`, hiding all others
    pub async fn show_subtitle(&self, language: &str) -> bool {
        self.selection.write().await.show_subtitle(language)
    }

    /// Snapshot of the track selection
    pub async fn selection(&self) -> TrackSelection {
        self.selection.read().await.clone()
    }

    /// Get last known position
    pub async fn position(&self) -> f64 {
        *self.position.read().await
    }

    /// Seconds since the session was created
    pub fn elapsed(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}
