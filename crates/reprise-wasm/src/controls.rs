//! On-screen controls
//!
//! [`ControlBar`] builds the elements; the `Session` methods below apply
//! what the core [`reprise_core::ControlSurface`] decides to them.

use crate::dom::{
    add_class, append_icon, elem_class, remove_class, set_icon, set_text, set_visible,
    set_width_percent, set_width_px, toggle_class,
};
use crate::player::Session;
use gloo_timers::callback::Timeout;
use reprise_core::controls::{
    buffered_fraction, pointer_fraction, FocusKind, HoverPreview, Indicator, PlaybackCommand,
};
use reprise_core::{format_time, KeyCommand, PLAYBACK_RATES};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, EventTarget, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent};

fn append_all(parent: &Element, children: &[&Element]) -> Result<(), JsValue> {
    for child in children {
        parent.append_child(child)?;
    }
    Ok(())
}

/// Elements of the control bar and the center state indicator
pub(crate) struct ControlBar {
    pub root: HtmlElement,
    pub player_state: HtmlElement,
    pub main_state: HtmlElement,
    pub duration: HtmlElement,
    pub current_time: HtmlElement,
    pub hover_time: HtmlElement,
    pub hover_duration: HtmlElement,
    pub buffer: HtmlElement,
    pub play_pause: HtmlElement,
    pub volume: HtmlElement,
    pub mute_unmute: HtmlElement,
    pub max_vol: HtmlElement,
    pub current_vol: HtmlElement,
    pub current_duration: HtmlElement,
    pub total_duration: HtmlElement,
    pub setting_btn: HtmlElement,
    pub setting_menu: HtmlElement,
    pub speed_items: Vec<(f64, HtmlElement)>,
    pub subtitles: HtmlElement,
    pub subtitle_btn: HtmlElement,
    pub subtitle_menu: HtmlElement,
    pub fullscreen: HtmlElement,
}

impl ControlBar {
    pub fn build(doc: &Document) -> Result<Self, JsValue> {
        let player_state = elem_class(doc, "div", "player-state")?;
        let main_state = elem_class(doc, "span", "main-state state-btn")?;
        append_icon(doc, &main_state, "play-outline")?;
        player_state.append_child(&main_state)?;

        // Progress track
        let duration = elem_class(doc, "div", "duration")?;
        let current_time = elem_class(doc, "div", "current-time")?;
        let hover_time = elem_class(doc, "div", "hover-time")?;
        let hover_duration = elem_class(doc, "span", "hover-duration")?;
        let buffer = elem_class(doc, "div", "buffer")?;
        hover_time.append_child(&hover_duration)?;
        append_all(&duration, &[&current_time, &hover_time, &buffer])?;

        // Left: play, volume, time
        let play_pause = elem_class(doc, "span", "play-pause control-btn")?;
        append_icon(doc, &play_pause, "play-outline")?;

        let volume = elem_class(doc, "span", "volume")?;
        let mute_unmute = elem_class(doc, "span", "mute-unmute control-btn")?;
        append_icon(doc, &mute_unmute, "volume-high-outline")?;
        let max_vol = elem_class(doc, "div", "max-vol")?;
        let current_vol = elem_class(doc, "div", "current-vol")?;
        max_vol.append_child(&current_vol)?;
        append_all(&volume, &[&mute_unmute, &max_vol])?;
        set_width_percent(&current_vol, 1.0);

        let time = elem_class(doc, "span", "time-container")?;
        let current_duration = elem_class(doc, "span", "current-duration")?;
        set_text(&current_duration, "00:00");
        let divider = doc.create_element("span")?;
        set_text(&divider, " / ");
        let total_duration = elem_class(doc, "span", "total-duration")?;
        set_text(&total_duration, "00:00");
        append_all(&time, &[&current_duration, &divider, &total_duration])?;

        let left = elem_class(doc, "div", "btn-con")?;
        append_all(&left, &[&play_pause, &volume, &time])?;

        // Right: subtitles, speed, fullscreen
        let subtitles = elem_class(doc, "span", "subtitles control-btn")?;
        let subtitle_btn = elem_class(doc, "span", "subtitle-btn")?;
        append_icon(doc, &subtitle_btn, "text-outline")?;
        let subtitle_menu = elem_class(doc, "ul", "subtitle-menu")?;
        append_all(&subtitles, &[&subtitle_btn, &subtitle_menu])?;
        set_visible(&subtitles, false);

        let settings = elem_class(doc, "span", "settings control-btn")?;
        let setting_btn = elem_class(doc, "span", "setting-btn")?;
        append_icon(doc, &setting_btn, "options-outline")?;
        let setting_menu = elem_class(doc, "ul", "setting-menu")?;
        let mut speed_items = Vec::with_capacity(PLAYBACK_RATES.len());
        for rate in PLAYBACK_RATES {
            let item = elem_class(doc, "li", if rate == 1.0 { "speed-active" } else { "" })?;
            item.set_attribute("data-value", &rate.to_string())?;
            set_text(&item, &format!("{}x", rate));
            setting_menu.append_child(&item)?;
            speed_items.push((rate, item));
        }
        append_all(&settings, &[&setting_btn, &setting_menu])?;

        let fullscreen = elem_class(doc, "span", "fullscreen-btn control-btn")?;
        fullscreen.set_title("fullscreen");
        let full = elem_class(doc, "span", "full")?;
        append_icon(doc, &full, "scan-outline")?;
        let contract = elem_class(doc, "span", "contract")?;
        append_icon(doc, &contract, "contract-outline")?;
        append_all(&fullscreen, &[&full, &contract])?;

        let right = elem_class(doc, "div", "right-controls")?;
        append_all(&right, &[&subtitles, &settings, &fullscreen])?;

        let buttons = elem_class(doc, "div", "btn-controls")?;
        append_all(&buttons, &[&left, &right])?;

        let root = elem_class(doc, "div", "controls")?;
        append_all(&root, &[&duration, &buttons])?;

        Ok(Self {
            root,
            player_state,
            main_state,
            duration,
            current_time,
            hover_time,
            hover_duration,
            buffer,
            play_pause,
            volume,
            mute_unmute,
            max_vol,
            current_vol,
            current_duration,
            total_duration,
            setting_btn,
            setting_menu,
            speed_items,
            subtitles,
            subtitle_btn,
            subtitle_menu,
            fullscreen,
        })
    }
}

impl Session {
    pub(crate) fn wire_controls(self: &Rc<Self>) {
        let c = &self.controls;
        let video: &EventTarget = &self.page.video;
        let stage: &EventTarget = &self.page.stage;
        let doc: &EventTarget = &self.page.document;

        // Media element
        self.on(video, "loadedmetadata", |s, _| s.on_metadata());
        self.on(video, "play", |s, _| s.on_play_state(true));
        self.on(video, "pause", |s, _| s.on_play_state(false));
        self.on(video, "timeupdate", |s, _| s.render_progress());
        self.on(video, "progress", |s, _| s.render_buffered());
        self.on(video, "ratechange", |s, _| {
            let rate = s.page.video.playback_rate();
            s.state.borrow_mut().surface.set_playback_rate(rate);
            s.render_speed_marks();
        });

        // Play/pause
        self.on(stage, "click", |s, e| s.toggle_main_state(e));
        self.on(&c.main_state, "click", |s, e| s.toggle_main_state(e));
        self.on(&c.main_state, "animationend", |s, _| s.on_indicator_done());
        self.on(&c.play_pause, "click", |s, _| s.toggle_play());

        // Fullscreen
        self.on(&c.fullscreen, "click", |s, _| s.toggle_fullscreen());
        self.on(stage, "fullscreenchange", |s, _| {
            let fullscreen = s.page.document.fullscreen_element().is_some();
            s.state.borrow_mut().surface.set_fullscreen(fullscreen);
            toggle_class(&s.page.stage, "fullscreen", fullscreen);
        });

        // Seeking and volume
        self.on(&c.duration, "click", |s, e| s.seek_to_pointer(e.unchecked_ref()));
        self.on(&c.duration, "mousedown", |s, e| {
            s.state.borrow_mut().surface.begin_seek_drag();
            s.seek_to_pointer(e.unchecked_ref());
        });
        self.on(&c.max_vol, "mousedown", |s, e| {
            s.state.borrow_mut().surface.begin_volume_drag();
            s.volume_to_pointer(e.unchecked_ref());
        });
        self.on(doc, "mouseup", |s, _| s.state.borrow_mut().surface.end_drags());
        self.on_active(doc, "mousemove", |s, e| s.on_mouse_move(e.unchecked_ref()));
        self.on(&c.duration, "mouseenter", |s, _| {
            s.state.borrow_mut().surface.set_hovering_track(true)
        });
        self.on(&c.duration, "mouseleave", |s, _| {
            s.state.borrow_mut().surface.set_hovering_track(false);
            set_width_px(&s.controls.hover_time, 0.0);
            set_text(&s.controls.hover_duration, "");
        });

        // Visibility
        self.on(stage, "mouseleave", |s, _| s.schedule_hide());
        self.on(stage, "mousemove", |s, _| {
            s.state.borrow_mut().surface.show_controls();
            add_class(&s.controls.root, "show-controls");
            s.schedule_hide();
        });
        self.on(&c.root, "mouseenter", |s, _| {
            s.state.borrow_mut().surface.set_cursor_on_controls(true);
            add_class(&s.controls.root, "show-controls");
        });
        self.on(&c.root, "mouseleave", |s, _| {
            s.state.borrow_mut().surface.set_cursor_on_controls(false)
        });

        // Touch scrubbing
        self.on(stage, "touchstart", |s, e| s.on_touch_start(e.unchecked_ref()));
        self.on(stage, "touchmove", |s, e| s.on_touch_move(e.unchecked_ref()));
        self.on(stage, "touchend", |s, _| {
            s.schedule_hide();
            s.state.borrow_mut().surface.touch_end();
        });

        // Mute
        self.on(&c.mute_unmute, "click", |s, _| s.toggle_mute());
        self.on(&c.mute_unmute, "mouseenter", |s, _| {
            let muted = s.state.borrow().surface.is_muted();
            toggle_class(&s.controls.max_vol, "show", !muted);
        });
        self.on(&c.mute_unmute, "mouseleave", |s, e| {
            let related = e.unchecked_ref::<MouseEvent>().related_target().map(JsValue::from);
            let volume: &JsValue = s.controls.volume.as_ref();
            if related.as_ref() != Some(volume) {
                remove_class(&s.controls.max_vol, "show");
            }
        });

        // Speed
        self.on(&c.setting_btn, "click", |s, _| {
            let open = s.state.borrow_mut().surface.toggle_speed_menu();
            toggle_class(&s.controls.setting_menu, "show-setting-menu", open);
        });
        for (rate, item) in &c.speed_items {
            let rate = *rate;
            self.on(item, "click", move |s, _| s.select_rate(rate));
        }

        self.on(doc, "keydown", |s, e| s.on_key(e.unchecked_ref()));
    }

    fn on_metadata(&self) {
        let video = &self.page.video;
        set_text(&self.controls.total_duration, &format_time(video.duration()));
        {
            let mut state = self.state.borrow_mut();
            video.set_volume(state.surface.effective_volume());
            state.surface.set_muted(video.muted());
        }
        if video.paused() {
            add_class(&self.controls.root, "show-controls");
            add_class(&self.controls.main_state, "show-state");
            self.flash(&Indicator::Play);
        }
    }

    fn on_play_state(&self, playing: bool) {
        let indicator = self.state.borrow_mut().surface.set_playing(playing);
        let c = &self.controls;
        if playing {
            set_icon(&c.play_pause, "pause-outline");
            remove_class(&c.main_state, "show-state");
        } else {
            set_icon(&c.play_pause, "play-outline");
            add_class(&c.root, "show-controls");
            add_class(&c.main_state, "show-state");
            if self.page.video.ended() {
                set_width_percent(&c.current_time, 1.0);
            }
        }
        self.flash(&indicator);
    }

    fn toggle_play(&self) {
        let command = self.state.borrow_mut().surface.toggle_play();
        let video = &self.page.video;
        let result = match command {
            PlaybackCommand::Play => video.play().map(|_| ()),
            PlaybackCommand::Pause => video.pause(),
        };
        if let Err(e) = result {
            crate::debug(&format!("Playback toggle failed: {:?}", e));
        }
    }

    /// Clicks on the video area toggle playback; clicks on the controls do not
    fn toggle_main_state(&self, event: &web_sys::Event) {
        event.stop_propagation();
        if !crate::dom::event_within(event, &self.controls.root) {
            self.toggle_play();
        }
    }

    fn on_indicator_done(&self) {
        remove_class(&self.controls.main_state, "animate-state");
        if !self.state.borrow().surface.is_playing() {
            set_icon(&self.controls.main_state, "play-outline");
        }
    }

    /// Flash an icon or text in the center of the player
    fn flash(&self, indicator: &Indicator) {
        let main_state = &self.controls.main_state;
        add_class(main_state, "animate-state");
        if let Some(icon) = indicator.icon_name() {
            set_icon(main_state, icon);
        } else if let Some(text) = indicator.text() {
            main_state.set_inner_html(&format!(
                r#"<span style="font-size: 1.4rem">{}</span>"#,
                text
            ));
        }
    }

    fn render_progress(&self) {
        let video = &self.page.video;
        let (current, duration) = (video.current_time(), video.duration());
        if duration.is_finite() && duration > 0.0 {
            set_width_percent(&self.controls.current_time, current / duration);
        }
        set_text(&self.controls.current_duration, &format_time(current));
        set_text(&self.controls.total_duration, &format_time(duration));
    }

    fn render_buffered(&self) {
        let video = &self.page.video;
        let ranges = video.buffered();
        if ranges.length() == 0 {
            return;
        }
        if let Ok(end) = ranges.end(0) {
            set_width_percent(
                &self.controls.buffer,
                buffered_fraction(end, video.duration()),
            );
        }
    }

    fn seek_to_fraction(&self, fraction: f64) {
        let video = &self.page.video;
        let duration = video.duration();
        if duration.is_finite() {
            video.set_current_time(fraction * duration);
        }
    }

    fn seek_to_pointer(&self, event: &MouseEvent) {
        let rect = self.controls.duration.get_bounding_client_rect();
        let fraction = pointer_fraction(f64::from(event.client_x()), rect.x(), rect.width());
        set_width_percent(&self.controls.current_time, fraction);
        self.seek_to_fraction(fraction);
    }

    fn volume_to_pointer(&self, event: &MouseEvent) {
        let rect = self.controls.max_vol.get_bounding_client_rect();
        let volume = self.state.borrow_mut().surface.volume_from_pointer(
            f64::from(event.client_x()),
            rect.x(),
            rect.width(),
        );
        set_width_percent(&self.controls.current_vol, volume);
        set_icon(&self.controls.mute_unmute, "volume-high-outline");
        self.page.video.set_volume(volume);
    }

    fn on_mouse_move(&self, event: &MouseEvent) {
        let (seeking, adjusting_volume, hovering) = {
            let state = self.state.borrow();
            (
                state.surface.is_seek_dragging(),
                state.surface.is_volume_dragging(),
                state.surface.is_hovering_track(),
            )
        };
        if seeking {
            event.prevent_default();
            self.seek_to_pointer(event);
        }
        if adjusting_volume {
            self.volume_to_pointer(event);
        }
        if hovering {
            let rect = self.controls.duration.get_bounding_client_rect();
            let preview = HoverPreview::at(
                f64::from(event.client_x()),
                rect.x(),
                rect.width(),
                self.page.video.duration(),
            );
            set_width_px(&self.controls.hover_time, preview.width_px);
            set_text(&self.controls.hover_duration, &preview.label);
        }
    }

    fn on_touch_start(&self, event: &TouchEvent) {
        let Some(touch) = event.changed_touches().get(0) else {
            return;
        };
        let played = self.controls.current_time.get_bounding_client_rect().width();
        self.state.borrow_mut().surface.touch_start(
            f64::from(touch.client_x()),
            played,
            event.time_stamp(),
        );
        add_class(&self.controls.root, "show-controls");
    }

    fn on_touch_move(self: &Rc<Self>, event: &TouchEvent) {
        self.schedule_hide();
        let Some(touch) = event.changed_touches().get(0) else {
            return;
        };
        let rect = self.controls.duration.get_bounding_client_rect();
        let fraction = self.state.borrow().surface.touch_move(
            f64::from(touch.client_x()),
            event.time_stamp(),
            rect.width(),
        );
        if let Some(fraction) = fraction {
            set_width_px(&self.controls.current_time, fraction * rect.width());
            self.seek_to_fraction(fraction);
            set_text(
                &self.controls.current_duration,
                &format_time(self.page.video.current_time()),
            );
        }
    }

    fn toggle_mute(&self) {
        let (volume, indicator) = self.state.borrow_mut().surface.toggle_mute();
        self.page.video.set_volume(volume);
        if let Some(icon) = indicator.icon_name() {
            set_icon(&self.controls.mute_unmute, icon);
        }
        toggle_class(&self.controls.max_vol, "show", indicator == Indicator::Unmuted);
        self.flash(&indicator);
    }

    fn toggle_fullscreen(&self) {
        let indicator = self.state.borrow().surface.toggle_fullscreen();
        let doc = &self.page.document;
        if doc.fullscreen_element().is_none() {
            if let Err(e) = self.page.stage.request_fullscreen() {
                crate::debug(&format!("Fullscreen request refused: {:?}", e));
            }
        } else {
            let _ = doc.exit_fullscreen();
        }
        self.flash(&indicator);
    }

    fn select_rate(&self, rate: f64) {
        let rate = self.state.borrow_mut().surface.select_rate(rate);
        self.page.video.set_playback_rate(rate);
        self.render_speed_marks();
        remove_class(&self.controls.setting_menu, "show-setting-menu");
    }

    fn step_rate(&self, up: bool) {
        let (rate, indicator) = self.state.borrow_mut().surface.step_rate(up);
        self.page.video.set_playback_rate(rate);
        self.flash(&indicator);
        self.render_speed_marks();
    }

    fn render_speed_marks(&self) {
        let state = self.state.borrow();
        for (rate, item) in &self.controls.speed_items {
            toggle_class(item, "speed-active", state.surface.is_active_rate(*rate));
        }
    }

    fn on_key(self: &Rc<Self>, event: &KeyboardEvent) {
        let focus = FocusKind::from_tag(&crate::dom::active_tag(&self.page.document));
        let Some(command) = KeyCommand::from_key(&event.key(), focus) else {
            return;
        };
        match command {
            KeyCommand::SeekToFraction(fraction) => {
                self.seek_to_fraction(fraction);
                set_width_percent(&self.controls.current_time, fraction);
            }
            KeyCommand::TogglePlay => self.toggle_play(),
            KeyCommand::ToggleFullscreen => self.toggle_fullscreen(),
            KeyCommand::ToggleMute => self.toggle_mute(),
            KeyCommand::RateUp => self.step_rate(true),
            KeyCommand::RateDown => self.step_rate(false),
        }
    }

    /// Restart the idle timer; replacing the previous timer cancels it
    fn schedule_hide(self: &Rc<Self>) {
        let delay = self.state.borrow().config.controls_hide_delay_ms as u32;
        let weak = Rc::downgrade(self);
        let timer = Timeout::new(delay, move || {
            if let Some(session) = weak.upgrade() {
                session.hide_if_idle();
            }
        });
        self.state.borrow_mut().hide_timer = Some(timer);
    }

    fn hide_if_idle(&self) {
        if self.state.borrow_mut().surface.hide_if_idle() {
            remove_class(&self.controls.root, "show-controls");
            remove_class(&self.controls.setting_menu, "show-setting-menu");
            remove_class(&self.controls.subtitle_menu, "show-subtitle-menu");
        }
    }
}
