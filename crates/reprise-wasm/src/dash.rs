//! dash.js bindings
//!
//! Only the slice of the `MediaPlayer` API the page uses. Track objects are
//! kept as opaque `JsValue`s so they can be handed back to `setCurrentTrack`.

use reprise_core::AudioTrack;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlVideoElement;

/// `dashjs.MediaPlayer.events.ERROR`
pub const EVENT_ERROR: &str = "error";
/// `dashjs.MediaPlayer.events.STREAM_INITIALIZED`
pub const EVENT_STREAM_INITIALIZED: &str = "streamInitialized";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = dashjs, js_name = MediaPlayer)]
    fn media_player_factory() -> MediaPlayerFactory;

    type MediaPlayerFactory;

    #[wasm_bindgen(method)]
    fn create(this: &MediaPlayerFactory) -> MediaPlayer;

    /// A dash.js `MediaPlayer` instance
    #[derive(Clone, Debug)]
    pub type MediaPlayer;

    #[wasm_bindgen(method)]
    fn initialize(this: &MediaPlayer, view: &HtmlVideoElement, url: &str, auto_play: bool);

    #[wasm_bindgen(method, js_name = attachSource)]
    fn attach_source(this: &MediaPlayer, url: &str);

    #[wasm_bindgen(method)]
    fn on(this: &MediaPlayer, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = getTracksFor)]
    fn get_tracks_for(this: &MediaPlayer, media_type: &str) -> js_sys::Array;

    #[wasm_bindgen(method, js_name = getCurrentTrackFor)]
    fn get_current_track_for(this: &MediaPlayer, media_type: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = setCurrentTrack)]
    fn set_current_track(this: &MediaPlayer, track: &JsValue);

    #[wasm_bindgen(method, js_name = updateSettings)]
    fn update_settings(this: &MediaPlayer, settings: &JsValue);
}

/// The fields of a dash.js `MediaInfo` we read
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashTrack {
    pub index: u32,
    pub lang: Option<String>,
    pub labels: Vec<DashLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashLabel {
    pub text: Option<String>,
}

impl DashTrack {
    pub fn to_audio_track(&self) -> AudioTrack {
        AudioTrack {
            index: self.index,
            language: self.lang.clone().filter(|l| !l.is_empty()),
            label: self
                .labels
                .first()
                .and_then(|l| l.text.clone())
                .filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Settings<'a> {
    streaming: StreamingSettings<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamingSettings<'a> {
    initial_settings: InitialSettings<'a>,
}

#[derive(Serialize)]
struct InitialSettings<'a> {
    audio: AudioSettings<'a>,
}

#[derive(Serialize)]
struct AudioSettings<'a> {
    lang: &'a str,
}

impl MediaPlayer {
    /// `dashjs.MediaPlayer().create()`
    pub fn create_player() -> MediaPlayer {
        media_player_factory().create()
    }

    /// Prefer `language` when the stream starts
    pub fn set_initial_audio_language(&self, language: &str) -> Result<(), JsValue> {
        let settings = Settings {
            streaming: StreamingSettings {
                initial_settings: InitialSettings {
                    audio: AudioSettings { lang: language },
                },
            },
        };
        let value = serde_wasm_bindgen::to_value(&settings).map_err(crate::js_error)?;
        self.update_settings(&value);
        Ok(())
    }

    /// Attach to the video element and start loading with autoplay
    pub fn load(&self, video: &HtmlVideoElement, manifest_url: &str) {
        self.initialize(video, manifest_url, true);
    }

    /// Reload the manifest on an already-initialized player
    pub fn reload(&self, manifest_url: &str) {
        self.attach_source(manifest_url);
    }

    pub fn listen(&self, event: &str, listener: &Closure<dyn FnMut(JsValue)>) {
        self.on(event, listener.as_ref().unchecked_ref());
    }

    /// Audio tracks with their raw dash.js objects
    pub fn audio_tracks(&self) -> Vec<(JsValue, AudioTrack)> {
        self.get_tracks_for("audio")
            .iter()
            .filter_map(|raw| {
                let track: DashTrack = serde_wasm_bindgen::from_value(raw.clone()).ok()?;
                Some((raw, track.to_audio_track()))
            })
            .collect()
    }

    /// Engine index of the current audio track
    pub fn current_audio_index(&self) -> Option<u32> {
        let raw = self.get_current_track_for("audio");
        if raw.is_null() || raw.is_undefined() {
            return None;
        }
        serde_wasm_bindgen::from_value::<DashTrack>(raw)
            .ok()
            .map(|t| t.index)
    }

    /// Switch audio to the track with engine index `index`
    pub fn select_audio(&self, index: u32) -> bool {
        match self
            .audio_tracks()
            .into_iter()
            .find(|(_, track)| track.index == index)
        {
            Some((raw, _)) => {
                self.set_current_track(&raw);
                true
            }
            None => false,
        }
    }
}

/// `event.error.code` from an ERROR event
pub fn error_code(event: &JsValue) -> Option<i32> {
    let error = js_sys::Reflect::get(event, &JsValue::from_str("error")).ok()?;
    let code = js_sys::Reflect::get(&error, &JsValue::from_str("code")).ok()?;
    code.as_f64().map(|c| c as i32)
}
