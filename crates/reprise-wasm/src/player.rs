//! Page-level player session
//!
//! [`ReprisePlayer`] is the object the page holds. Internally everything
//! lives in one [`Session`]: fixed page elements plus a `RefCell` of the
//! mutable state. DOM and dash.js callbacks hold weak handles to it, so
//! dropping the player unregisters them.

use crate::controls::ControlBar;
use crate::dash::{self, MediaPlayer};
use crate::menus::AudioMenu;
use crate::{dom, js_error, net, text_tracks, WasmConfig};
use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use reprise_core::readiness::MANIFEST_INCOMPLETE_CODE;
use reprise_core::subtitles::parse_descriptors;
use reprise_core::{
    ControlSurface, DescriptorFormat, Endpoints, ManifestStatus, PlayerConfig, PollAction,
    ProgressRecord, ProgressSynchronizer, ReadinessEvent, ReadinessPoller, ReadinessState,
    TrackSelection,
};
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event, EventTarget, HtmlElement, HtmlVideoElement, UrlSearchParams};

/// `HTMLMediaElement.HAVE_METADATA`
const HAVE_METADATA: u16 = 1;

/// Content attributes of the created `<video>` (`disablePictureInPicture`)
const VIDEO_ATTRIBUTES: &[(&str, &str)] = &[("disablepictureinpicture", "")];

/// Mutable per-page state
pub(crate) struct PageState {
    pub config: PlayerConfig,
    pub poller: ReadinessPoller,
    pub sync: ProgressSynchronizer,
    pub selection: TrackSelection,
    pub surface: ControlSurface,
    pub dash: Option<MediaPlayer>,
    pub hide_timer: Option<Timeout>,
    pub audio_menu: Option<AudioMenu>,
    pub subtitle_listeners: Vec<EventListener>,
    /// A poll loop is running
    pub polling: bool,
    /// Saved subtitle language that arrived before the subtitle list
    pub pending_subtitle: Option<String>,
}

/// Elements and request targets fixed for the page's lifetime
pub(crate) struct Page {
    pub document: Document,
    pub status: HtmlElement,
    pub status_text: HtmlElement,
    pub stage: HtmlElement,
    pub video: HtmlVideoElement,
    pub file: String,
    pub audio_language: String,
    pub endpoints: Endpoints,
    pub manifest_url: String,
    pub subtitles_url: String,
    pub progress_url: String,
}

pub(crate) struct Session {
    pub page: Page,
    pub controls: ControlBar,
    pub state: RefCell<PageState>,
    listeners: RefCell<Vec<EventListener>>,
    dash_callbacks: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl Session {
    fn build(
        root: &HtmlElement,
        file: String,
        audio_language: String,
        config: PlayerConfig,
    ) -> Result<Rc<Self>, JsValue> {
        let document = dom::document()?;
        let endpoints = Endpoints::new(config.server_url.clone()).map_err(js_error)?;
        let manifest_url = endpoints.manifest(&file).map_err(js_error)?.to_string();
        let subtitles_url = endpoints.subtitles(&file).map_err(js_error)?.to_string();
        let progress_url = endpoints.progress(&file).map_err(js_error)?.to_string();

        let status = dom::elem_class(&document, "div", "")?;
        status.set_id("status");
        let status_text = dom::elem_class(&document, "span", "status-text")?;
        status.append_child(&status_text)?;

        let stage = dom::elem_class(&document, "div", "player-container")?;
        let video: HtmlVideoElement = dom::elem_class(&document, "video", "video")?.unchecked_into();
        for (name, value) in VIDEO_ATTRIBUTES {
            video.set_attribute(name, value)?;
        }
        let controls = ControlBar::build(&document)?;
        stage.append_child(&video)?;
        stage.append_child(&controls.player_state)?;
        stage.append_child(&controls.root)?;
        root.append_child(&status)?;
        root.append_child(&stage)?;

        let state = PageState {
            poller: ReadinessPoller::new(config.poll_interval()),
            sync: ProgressSynchronizer::new(&config),
            selection: TrackSelection::default(),
            surface: ControlSurface::new(&config),
            config,
            dash: None,
            hide_timer: None,
            audio_menu: None,
            subtitle_listeners: Vec::new(),
            polling: false,
            pending_subtitle: None,
        };

        let session = Rc::new(Self {
            page: Page {
                document,
                status,
                status_text,
                stage,
                video,
                file,
                audio_language,
                endpoints,
                manifest_url,
                subtitles_url,
                progress_url,
            },
            controls,
            state: RefCell::new(state),
            listeners: RefCell::new(Vec::new()),
            dash_callbacks: RefCell::new(Vec::new()),
        });

        session.wire_controls();
        session.wire_menus();
        session.on(&session.page.video, "timeupdate", |s, _| s.sync_progress());
        session.render_status();
        Ok(session)
    }

    /// Register a passive DOM listener for the session's lifetime
    pub(crate) fn on<F>(self: &Rc<Self>, target: &EventTarget, event: &'static str, handler: F)
    where
        F: Fn(&Rc<Session>, &Event) + 'static,
    {
        let weak = Rc::downgrade(self);
        let listener = EventListener::new(target, event, move |e| {
            if let Some(session) = weak.upgrade() {
                handler(&session, e);
            }
        });
        self.listeners.borrow_mut().push(listener);
    }

    /// Like [`Self::on`], but the handler may call `preventDefault`
    pub(crate) fn on_active<F>(self: &Rc<Self>, target: &EventTarget, event: &'static str, handler: F)
    where
        F: Fn(&Rc<Session>, &Event) + 'static,
    {
        let weak = Rc::downgrade(self);
        let options = EventListenerOptions::enable_prevent_default();
        let listener = EventListener::new_with_options(target, event, options, move |e| {
            if let Some(session) = weak.upgrade() {
                handler(&session, e);
            }
        });
        self.listeners.borrow_mut().push(listener);
    }

    /// Mirror the readiness state into the status banner
    fn render_status(&self) {
        let state = self.state.borrow();
        let readiness = state.poller.state();
        self.page.status.set_class_name(readiness.css_class());
        dom::set_text(&self.page.status_text, state.poller.message());
        dom::set_visible(&self.page.status, readiness != ReadinessState::Ready);
        dom::toggle_class(&self.page.stage, "ready", readiness == ReadinessState::Ready);
    }

    /// Check the manifest until it is ready or fails
    async fn poll_until_ready(self: Rc<Self>) {
        if std::mem::replace(&mut self.state.borrow_mut().polling, true) {
            return;
        }

        loop {
            let status = match net::head_status(&self.page.manifest_url).await {
                Ok(code) => ManifestStatus::from_status(code),
                Err(e) => {
                    crate::debug(&format!("Manifest check failed: {:?}", e));
                    ManifestStatus::Unreachable
                }
            };
            let action = self
                .state
                .borrow_mut()
                .poller
                .handle(ReadinessEvent::Checked(status));
            self.render_status();

            match action {
                Ok(PollAction::Retry(delay)) => {
                    TimeoutFuture::new(delay.as_millis() as u32).await;
                }
                Ok(PollAction::CheckNow) => {}
                Ok(PollAction::StartPlayback) => {
                    self.state.borrow_mut().polling = false;
                    if let Err(e) = self.start_player() {
                        crate::warn(&format!("Player start failed: {:?}", e));
                    }
                    return;
                }
                Ok(PollAction::Stop) => {
                    crate::warn(self.state.borrow().poller.message());
                    break;
                }
                Err(e) => {
                    crate::warn(&e.to_string());
                    break;
                }
            }
        }
        self.state.borrow_mut().polling = false;
    }

    /// Create the dash.js player, or reload it after a manifest re-check
    fn start_player(self: &Rc<Self>) -> Result<(), JsValue> {
        let existing = self.state.borrow().dash.clone();
        if let Some(player) = existing {
            crate::log("Reloading manifest");
            player.reload(&self.page.manifest_url);
            return Ok(());
        }

        spawn_local(Rc::clone(self).load_subtitles());

        let player = MediaPlayer::create_player();

        let weak = Rc::downgrade(self);
        let on_error = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(session) = weak.upgrade() {
                session.on_engine_error(&event);
            }
        });
        player.listen(dash::EVENT_ERROR, &on_error);

        let weak = Rc::downgrade(self);
        let on_initialized = Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| {
            if let Some(session) = weak.upgrade() {
                session.on_stream_initialized();
            }
        });
        player.listen(dash::EVENT_STREAM_INITIALIZED, &on_initialized);
        self.dash_callbacks
            .borrow_mut()
            .extend([on_error, on_initialized]);

        player.set_initial_audio_language(&self.page.audio_language)?;
        player.load(&self.page.video, &self.page.manifest_url);
        self.state.borrow_mut().dash = Some(player);
        crate::log(&format!("Playing {}", self.page.file));
        Ok(())
    }

    /// A truncated manifest sends the page back to polling
    fn on_engine_error(self: &Rc<Self>, event: &JsValue) {
        let Some(code) = dash::error_code(event) else {
            return;
        };
        if code != MANIFEST_INCOMPLETE_CODE {
            crate::warn(&format!("Player error code {}", code));
            return;
        }

        let action = self
            .state
            .borrow_mut()
            .poller
            .handle(ReadinessEvent::ManifestIncomplete);
        self.render_status();
        match action {
            Ok(PollAction::Retry(delay)) => {
                let session = Rc::clone(self);
                spawn_local(async move {
                    TimeoutFuture::new(delay.as_millis() as u32).await;
                    session.poll_until_ready().await;
                });
            }
            Ok(_) => {}
            Err(e) => crate::debug(&e.to_string()),
        }
    }

    async fn load_subtitles(self: Rc<Self>) {
        let body = match net::get_text(&self.page.subtitles_url).await {
            Ok((status, body)) if (200..300).contains(&status) => body,
            Ok((status, _)) => {
                crate::debug(&format!("No subtitle listing (status {})", status));
                return;
            }
            Err(e) => {
                crate::debug(&format!("Subtitle listing failed: {:?}", e));
                return;
            }
        };

        let descriptors = parse_descriptors(&body, DescriptorFormat::detect(&body));
        {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;
            if let Err(e) = text_tracks::attach(
                &self.page.document,
                &self.page.video,
                &descriptors,
                &mut state.selection,
            ) {
                crate::warn(&format!("Could not add subtitle tracks: {:?}", e));
            }
            if let Some(language) = state.pending_subtitle.take() {
                state.selection.show_subtitle(&language);
                text_tracks::apply_modes(&self.page.video, &state.selection);
            }
        }
        crate::log(&format!("{} subtitle track(s)", descriptors.len()));
        self.refresh_subtitle_button();
    }

    /// Pick the requested audio language, then restore saved progress
    fn on_stream_initialized(self: &Rc<Self>) {
        let Some(player) = self.state.borrow().dash.clone() else {
            return;
        };
        let tracks: Vec<_> = player.audio_tracks().into_iter().map(|(_, t)| t).collect();
        let current = player.current_audio_index();

        let requested = {
            let mut state = self.state.borrow_mut();
            state.selection.set_audio_tracks(tracks, current);
            state
                .selection
                .select_audio_language(&self.page.audio_language)
                .map(|t| t.index)
        };
        if let Some(index) = requested {
            player.select_audio(index);
        }

        spawn_local(Rc::clone(self).restore_progress());
    }

    async fn restore_progress(self: Rc<Self>) {
        let body = match net::get_text(&self.page.progress_url).await {
            Ok((_, body)) => body,
            Err(e) => {
                crate::debug(&format!("Progress read failed: {:?}", e));
                return;
            }
        };
        let record = ProgressRecord::from_response(&body);

        let plan = {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;
            let plan = state.sync.plan_restore(&record, &mut state.selection);
            if let Some(language) = &plan.subtitle {
                if state.selection.text_tracks().is_empty() {
                    state.pending_subtitle = Some(language.clone());
                } else {
                    text_tracks::apply_modes(&self.page.video, &state.selection);
                }
            }
            plan
        };

        if let Some(position) = plan.seek_to {
            let video = &self.page.video;
            if video.ready_state() >= HAVE_METADATA {
                video.set_current_time(position);
            } else {
                let target = video.clone();
                let listener = EventListener::once(video, "loadedmetadata", move |_| {
                    target.set_current_time(position);
                });
                self.listeners.borrow_mut().push(listener);
            }
        }

        if let Some(track) = &plan.audio {
            let player = self.state.borrow().dash.clone();
            if let Some(player) = player {
                player.select_audio(track.index);
            }
        }

        if !plan.is_empty() {
            crate::log(&format!("Restored {}", record));
        }
    }

    /// Push position and tracks at most once per save interval
    fn sync_progress(&self) {
        let current_time = self.page.video.current_time();
        let now = js_sys::Date::now();
        let current_audio = self
            .state
            .borrow()
            .dash
            .as_ref()
            .and_then(|p| p.current_audio_index());

        let record = {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;
            if let Some(index) = current_audio {
                state.selection.select_audio(index);
            }
            state.sync.on_time_update(now, current_time, &state.selection)
        };

        if let Some(record) = record {
            match self.page.endpoints.progress_write(&self.page.file, &record) {
                Ok(url) => net::fire_and_forget(url.to_string()),
                Err(e) => crate::debug(&e.to_string()),
            }
        }
    }
}

/// Reprise player bound to one file on the page
#[wasm_bindgen]
pub struct ReprisePlayer {
    session: Rc<Session>,
}

#[wasm_bindgen]
impl ReprisePlayer {
    /// Build the player inside `root` for `file`
    ///
    /// `lang` picks the initial audio language; it falls back to the
    /// config's default.
    #[wasm_bindgen(constructor)]
    pub fn new(
        root: HtmlElement,
        file: String,
        lang: Option<String>,
        config: Option<WasmConfig>,
    ) -> Result<ReprisePlayer, JsValue> {
        let config = config.unwrap_or_default();
        let origin = dom::window()?.location().origin()?;
        let base = Url::parse(&origin).map_err(js_error)?;
        let config = config.to_player_config(base);
        config.validate().map_err(js_error)?;

        let audio_language = lang
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| config.default_audio_language.clone());
        let session = Session::build(&root, file, audio_language, config)?;
        Ok(Self { session })
    }

    /// Build from the page URL's `file` and `lang` parameters
    #[wasm_bindgen]
    pub fn from_page(root: HtmlElement, config: Option<WasmConfig>) -> Result<ReprisePlayer, JsValue> {
        let search = dom::window()?.location().search()?;
        let params = UrlSearchParams::new_with_str(&search)?;
        let file = params
            .get("file")
            .ok_or_else(|| JsValue::from_str("missing file parameter"))?;
        Self::new(root, file, params.get("lang"), config)
    }

    /// Start checking the manifest; playback begins once it is ready
    #[wasm_bindgen]
    pub fn start(&self) {
        spawn_local(Rc::clone(&self.session).poll_until_ready());
    }

    /// Try again after an error
    #[wasm_bindgen]
    pub fn restart(&self) -> Result<(), JsValue> {
        let action = self
            .session
            .state
            .borrow_mut()
            .poller
            .handle(ReadinessEvent::Restart)
            .map_err(js_error)?;
        self.session.render_status();
        if action == PollAction::CheckNow {
            self.start();
        }
        Ok(())
    }

    /// Readiness state: "polling", "processing", "ready" or "error"
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.session.state.borrow().poller.state().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn status_message(&self) -> String {
        self.session.state.borrow().poller.message().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn file(&self) -> String {
        self.session.page.file.clone()
    }

    /// Current track selection as a plain object
    #[wasm_bindgen]
    pub fn tracks(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.state.borrow().selection).map_err(js_error)
    }

    /// Show subtitles in `language`, or turn them off with `null`
    #[wasm_bindgen]
    pub fn select_subtitle(&self, language: Option<String>) -> bool {
        let mut state = self.session.state.borrow_mut();
        let shown = match language {
            Some(language) => state.selection.show_subtitle(&language),
            None => {
                state.selection.hide_subtitles();
                true
            }
        };
        text_tracks::apply_modes(&self.session.page.video, &state.selection);
        shown
    }

    /// Switch audio by dash.js track index
    #[wasm_bindgen]
    pub fn select_audio(&self, index: u32) -> bool {
        let player = self.session.state.borrow().dash.clone();
        let switched = player.map(|p| p.select_audio(index)).unwrap_or(false);
        if switched {
            self.session.state.borrow_mut().selection.select_audio(index);
        }
        switched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_disables_picture_in_picture() {
        assert!(VIDEO_ATTRIBUTES
            .iter()
            .any(|(name, _)| *name == "disablepictureinpicture"));
    }
}
