//! Manifest readiness polling
//!
//! The media server transmuxes on first request and answers the manifest
//! check with `202 Accepted` until the manifest exists. This module holds the
//! I/O-free state machine; the native driver lives in [`crate::session`] and
//! the browser driver in the wasm crate.
//!
//! ```text
//!   Polling ──202──▶ Processing ──202──┐
//!      │                 │  ▲──────────┘
//!      │200              │200
//!      ▼                 ▼
//!    Ready ◀─────────────┘       Polling/Processing ──other/net──▶ Error
//!      │
//!      └──manifest incomplete──▶ Processing
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Player error code dash.js raises when the manifest is truncated
pub const MANIFEST_INCOMPLETE_CODE: i32 = 10;

/// Outcome of a single manifest check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestStatus {
    /// 200: manifest is complete
    Ready,
    /// 202: transmuxing in progress
    Processing,
    /// Any other HTTP status
    Missing(u16),
    /// The request itself failed
    Unreachable,
}

impl ManifestStatus {
    /// Classify an HTTP status code
    pub fn from_status(code: u16) -> Self {
        match code {
            200 => ManifestStatus::Ready,
            202 => ManifestStatus::Processing,
            other => ManifestStatus::Missing(other),
        }
    }
}

/// Readiness states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadinessState {
    /// First check not answered yet
    Polling,
    /// Server is still producing the manifest
    Processing,
    /// Manifest available, playback may start
    Ready,
    /// Terminal failure
    Error,
}

impl ReadinessState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: ReadinessState) -> bool {
        use ReadinessState::*;
        matches!(
            (self, target),
            (Polling, Processing) | (Polling, Ready) | (Polling, Error) |
            (Processing, Processing) | (Processing, Ready) | (Processing, Error) |
            (Ready, Processing) |
            (Error, Polling)
        )
    }

    /// Terminal states stop the polling loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReadinessState::Ready | ReadinessState::Error)
    }

    /// CSS class applied to the status banner
    pub fn css_class(&self) -> &'static str {
        match self {
            ReadinessState::Polling | ReadinessState::Processing => "transmuxing",
            ReadinessState::Ready => "",
            ReadinessState::Error => "error",
        }
    }
}

impl std::fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadinessState::Polling => write!(f, "polling"),
            ReadinessState::Processing => write!(f, "processing"),
            ReadinessState::Ready => write!(f, "ready"),
            ReadinessState::Error => write!(f, "error"),
        }
    }
}

/// Inputs to the readiness machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessEvent {
    /// A manifest check completed
    Checked(ManifestStatus),
    /// The streaming engine found the manifest truncated after start
    ManifestIncomplete,
    /// User asked to try again after an error
    Restart,
}

/// What the driver should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Check again after the delay
    Retry(Duration),
    /// Hide the status banner and start the player
    StartPlayback,
    /// Check immediately
    CheckNow,
    /// Stop polling; the status message explains why
    Stop,
}

/// Readiness state machine
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    state: ReadinessState,
    interval: Duration,
    checks: u32,
    message: String,
}

impl ReadinessPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: ReadinessState::Polling,
            interval,
            checks: 0,
            message: "Checking manifest...".to_string(),
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    /// Text for the status banner
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Manifest checks answered so far
    pub fn checks(&self) -> u32 {
        self.checks
    }

    /// Feed an event and get the next action
    pub fn handle(&mut self, event: ReadinessEvent) -> Result<PollAction> {
        match event {
            ReadinessEvent::Checked(status) => {
                self.checks += 1;
                match status {
                    ManifestStatus::Ready => {
                        self.transition(ReadinessState::Ready, "")?;
                        info!(checks = self.checks, "Manifest ready");
                        Ok(PollAction::StartPlayback)
                    }
                    ManifestStatus::Processing => {
                        self.transition(ReadinessState::Processing, "Transmuxing video...")?;
                        debug!(checks = self.checks, "Manifest still processing");
                        Ok(PollAction::Retry(self.interval))
                    }
                    ManifestStatus::Missing(status) => {
                        self.transition(ReadinessState::Error, "Error: Manifest not found")?;
                        warn!(status, "Manifest check failed");
                        Ok(PollAction::Stop)
                    }
                    ManifestStatus::Unreachable => {
                        self.transition(ReadinessState::Error, "Error: Failed to check manifest")?;
                        warn!("Manifest check request failed");
                        Ok(PollAction::Stop)
                    }
                }
            }
            ReadinessEvent::ManifestIncomplete => {
                self.transition(ReadinessState::Processing, "Manifest incomplete, retrying...")?;
                info!("Manifest incomplete, resuming polling");
                Ok(PollAction::Retry(self.interval))
            }
            ReadinessEvent::Restart => {
                self.transition(ReadinessState::Polling, "Checking manifest...")?;
                self.checks = 0;
                Ok(PollAction::CheckNow)
            }
        }
    }

    /// Error describing why polling stopped, if it did
    pub fn failure(&self, last: ManifestStatus) -> Option<Error> {
        if self.state != ReadinessState::Error {
            return None;
        }
        Some(match last {
            ManifestStatus::Missing(status) => Error::ManifestNotFound { status },
            _ => Error::ManifestUnreachable(self.message.clone()),
        })
    }

    fn transition(&mut self, to: ReadinessState, message: &str) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        debug!(from = %self.state, to = %to, "Readiness transition");
        self.state = to;
        self.message = message.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poller() -> ReadinessPoller {
        ReadinessPoller::new(Duration::from_secs(3))
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(ManifestStatus::from_status(200), ManifestStatus::Ready);
        assert_eq!(ManifestStatus::from_status(202), ManifestStatus::Processing);
        assert_eq!(ManifestStatus::from_status(404), ManifestStatus::Missing(404));
        assert_eq!(ManifestStatus::from_status(204), ManifestStatus::Missing(204));
    }

    #[test]
    fn test_processing_then_ready() {
        let mut p = poller();
        for _ in 0..3 {
            let action = p.handle(ReadinessEvent::Checked(ManifestStatus::Processing)).unwrap();
            assert_eq!(action, PollAction::Retry(Duration::from_secs(3)));
            assert_eq!(p.state(), ReadinessState::Processing);
            assert_eq!(p.message(), "Transmuxing video...");
        }
        let action = p.handle(ReadinessEvent::Checked(ManifestStatus::Ready)).unwrap();
        assert_eq!(action, PollAction::StartPlayback);
        assert_eq!(p.checks(), 4);
        assert!(p.state().is_terminal());
    }

    #[test]
    fn test_missing_is_terminal() {
        let mut p = poller();
        let action = p.handle(ReadinessEvent::Checked(ManifestStatus::Missing(404))).unwrap();
        assert_eq!(action, PollAction::Stop);
        assert_eq!(p.state(), ReadinessState::Error);
        assert_eq!(p.message(), "Error: Manifest not found");
        assert!(matches!(
            p.failure(ManifestStatus::Missing(404)),
            Some(Error::ManifestNotFound { status: 404 })
        ));

        // Further checks are rejected until restart
        assert!(p.handle(ReadinessEvent::Checked(ManifestStatus::Ready)).is_err());
        assert_eq!(p.handle(ReadinessEvent::Restart).unwrap(), PollAction::CheckNow);
        assert_eq!(p.state(), ReadinessState::Polling);
    }

    #[test]
    fn test_network_failure_message() {
        let mut p = poller();
        p.handle(ReadinessEvent::Checked(ManifestStatus::Unreachable)).unwrap();
        assert_eq!(p.message(), "Error: Failed to check manifest");
        assert_eq!(p.state().css_class(), "error");
    }

    #[test]
    fn test_manifest_incomplete_reenters_processing() {
        let mut p = poller();
        p.handle(ReadinessEvent::Checked(ManifestStatus::Ready)).unwrap();
        let action = p.handle(ReadinessEvent::ManifestIncomplete).unwrap();
        assert_eq!(action, PollAction::Retry(Duration::from_secs(3)));
        assert_eq!(p.state(), ReadinessState::Processing);
        assert_eq!(p.message(), "Manifest incomplete, retrying...");
    }

    #[test]
    fn test_ready_ignores_second_check() {
        let mut p = poller();
        p.handle(ReadinessEvent::Checked(ManifestStatus::Ready)).unwrap();
        assert!(!ReadinessState::Ready.can_transition_to(ReadinessState::Ready));
        assert!(p.handle(ReadinessEvent::Checked(ManifestStatus::Ready)).is_err());
    }
}
