//! Reprise WASM - browser front-end for the Reprise player
//!
//! Wires the `reprise-core` models to the page:
//! - Manifest readiness polling with a status banner
//! - dash.js player setup and audio track switching
//! - Progress restore on stream start, throttled progress writes
//! - Hand-built DOM controls (seek, volume, speed, fullscreen, menus)
//!
//! ## Page integration
//!
//! ```javascript
//! import init, { ReprisePlayer, WasmConfig } from '@reprise/wasm';
//!
//! await init();
//! // reads ?file= and ?lang= from the page URL
//! const player = ReprisePlayer.from_page(document.getElementById('player'), new WasmConfig());
//! player.start();
//! ```
//!
//! `dash.all.js` must be loaded first so that `window.dashjs` exists.

use reprise_core::PlayerConfig;
use serde::{Deserialize, Serialize};
use url::Url;
use wasm_bindgen::prelude::*;

mod controls;
mod dash;
mod dom;
mod menus;
mod net;
mod player;
mod text_tracks;

pub use player::ReprisePlayer;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    log("Initialized");
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn log(message: &str) {
    web_sys::console::log_1(&format!("[Reprise] {}", message).into());
}

pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&format!("[Reprise] {}", message).into());
}

pub(crate) fn debug(message: &str) {
    web_sys::console::debug_1(&format!("[Reprise] {}", message).into());
}

/// Convert a Rust error into an exception value
pub(crate) fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Configuration for the WASM player
#[wasm_bindgen]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WasmConfig {
    /// Delay between manifest checks (ms)
    pub poll_interval_ms: u32,
    /// Minimum gap between progress writes (ms)
    pub save_interval_ms: u32,
    /// Saved positions at or below this are not resumed (seconds)
    pub resume_threshold: f64,
    /// Idle time before the controls hide (ms)
    pub controls_hide_delay_ms: u32,
    /// Audio language used when the page URL has no `lang`
    default_audio_language: String,
}

#[wasm_bindgen]
impl WasmConfig {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::from(&PlayerConfig::default())
    }

    /// Build from a plain JS object; missing fields keep their defaults
    #[wasm_bindgen]
    pub fn from_object(value: JsValue) -> Result<WasmConfig, JsValue> {
        serde_wasm_bindgen::from_value(value).map_err(js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn default_audio_language(&self) -> String {
        self.default_audio_language.clone()
    }

    #[wasm_bindgen(setter)]
    pub fn set_default_audio_language(&mut self, language: String) {
        self.default_audio_language = language;
    }

    /// Convert to JSON string
    #[wasm_bindgen]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl WasmConfig {
    /// Full player config against the page's origin
    pub fn to_player_config(&self, server_url: Url) -> PlayerConfig {
        PlayerConfig {
            server_url,
            poll_interval_ms: u64::from(self.poll_interval_ms),
            save_interval_ms: u64::from(self.save_interval_ms),
            resume_threshold: self.resume_threshold,
            controls_hide_delay_ms: u64::from(self.controls_hide_delay_ms),
            default_audio_language: self.default_audio_language.clone(),
            ..PlayerConfig::default()
        }
    }
}

impl From<&PlayerConfig> for WasmConfig {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            poll_interval_ms: config.poll_interval_ms as u32,
            save_interval_ms: config.save_interval_ms as u32,
            resume_threshold: config.resume_threshold,
            controls_hide_delay_ms: config.controls_hide_delay_ms as u32,
            default_audio_language: config.default_audio_language.clone(),
        }
    }
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_match_core() {
        let config = WasmConfig::new();
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.save_interval_ms, 5000);
        assert_eq!(config.default_audio_language(), "en");
    }

    #[test]
    fn test_config_to_player_config() {
        let mut config = WasmConfig::new();
        config.poll_interval_ms = 1000;
        config.set_default_audio_language("ja".to_string());

        let base = Url::parse("https://media.example/").unwrap();
        let player = config.to_player_config(base.clone());
        assert_eq!(player.server_url, base);
        assert_eq!(player.poll_interval_ms, 1000);
        assert_eq!(player.default_audio_language, "ja");
        assert_eq!(player.max_rate, 2.0);
    }

    #[test]
    fn test_config_json_partial() {
        let config: WasmConfig = serde_json::from_str(r#"{"save_interval_ms": 10000}"#).unwrap();
        assert_eq!(config.save_interval_ms, 10000);
        assert_eq!(config.poll_interval_ms, 3000);
        assert!(config.to_json().contains("\"default_audio_language\":\"en\""));
    }
}
