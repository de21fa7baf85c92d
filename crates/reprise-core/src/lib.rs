//! Reprise Core - resumable DASH playback client library
//!
//! This crate provides the logic behind the Reprise player:
//! - Manifest readiness polling (the server transmuxes on demand)
//! - Progress records: resume position plus audio/subtitle languages
//! - Throttled progress writes
//! - Subtitle descriptor parsing and track selection
//! - The control surface model (seek, volume, rate, shortcuts, menus)
//!
//! Everything except [`client`] and [`session`] is I/O-free and builds for
//! `wasm32`; those two need the default `native` feature.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Reprise Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │  Readiness   │  │   Progress   │  │    Track     │           │
//! │  │   Poller     │  │ Synchronizer │  │  Selection   │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐       ┌──────────────┐       │
//! │                    │   Player    │       │   Control    │       │
//! │                    │   Session   │       │   Surface    │       │
//! │                    └──────┬──────┘       └──────────────┘       │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │ Media Server│                              │
//! │                    │   Client    │                              │
//! │                    └─────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod readiness;
pub mod progress;
pub mod subtitles;
pub mod tracks;
pub mod sync;
pub mod controls;
pub mod endpoints;
pub mod manifest;
#[cfg(feature = "native")]
pub mod client;
#[cfg(feature = "native")]
pub mod session;

pub use error::{Error, Result};
pub use types::*;
pub use readiness::{ManifestStatus, PollAction, ReadinessEvent, ReadinessPoller, ReadinessState};
pub use progress::{ProgressRecord, SaveThrottle};
pub use subtitles::{DescriptorFormat, SubtitleDescriptor};
pub use tracks::TrackSelection;
pub use sync::{ProgressSynchronizer, RestorePlan};
pub use controls::{format_time, ControlSurface, KeyCommand, PLAYBACK_RATES};
pub use endpoints::Endpoints;
pub use manifest::ManifestSummary;
#[cfg(feature = "native")]
pub use client::{ManifestProbe, MediaServerClient, ProgressStore, SubtitleSource};
#[cfg(feature = "native")]
pub use session::PlayerSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Reprise Core initialized");
}
