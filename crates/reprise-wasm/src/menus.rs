//! Audio track context menu and subtitle menu

use crate::dom::{add_class, elem_class, remove_class, set_text, set_visible};
use crate::player::Session;
use crate::text_tracks;
use gloo_events::EventListener;
use reprise_core::controls::{audio_menu, subtitle_menu, AudioMenuItem};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, MouseEvent};

const AUDIO_MENU_STYLE: &str = "position:fixed;background:#1a1a1a;border:1px solid #333;\
    border-radius:4px;padding:4px 0;font:14px sans-serif;z-index:10000;min-width:150px;\
    box-shadow:0 2px 8px rgba(0,0,0,0.5)";
const AUDIO_ITEM_STYLE: &str = "padding:8px 16px;cursor:pointer;color:#ededed";

/// An open audio context menu; dropping it removes its listeners
pub(crate) struct AudioMenu {
    element: HtmlElement,
    _listeners: Vec<EventListener>,
}

impl Drop for AudioMenu {
    fn drop(&mut self) {
        self.element.remove();
    }
}

impl Session {
    pub(crate) fn wire_menus(self: &Rc<Self>) {
        self.on_active(&self.page.video, "contextmenu", |s, e| {
            s.open_audio_menu(e.unchecked_ref())
        });
        self.on(&self.controls.subtitle_btn, "click", |s, _| s.toggle_subtitle_menu());
    }

    /// Show or hide the subtitle button depending on available tracks
    pub(crate) fn refresh_subtitle_button(&self) {
        let available = !self.state.borrow().selection.text_tracks().is_empty();
        set_visible(&self.controls.subtitles, available);
    }

    /// Replace the browser menu with the audio track list, if there is a choice
    fn open_audio_menu(self: &Rc<Self>, event: &MouseEvent) {
        let Some(player) = self.state.borrow().dash.clone() else {
            return;
        };
        let current = player.current_audio_index();
        let items = {
            let mut state = self.state.borrow_mut();
            if let Some(index) = current {
                state.selection.select_audio(index);
            }
            audio_menu(&state.selection)
        };
        let Some(items) = items else {
            return;
        };

        event.prevent_default();
        self.close_audio_menu();
        match self.build_audio_menu(&items, event.client_x(), event.client_y()) {
            Ok(menu) => self.state.borrow_mut().audio_menu = Some(menu),
            Err(e) => crate::warn(&format!("Could not open audio menu: {:?}", e)),
        }
    }

    fn build_audio_menu(
        self: &Rc<Self>,
        items: &[AudioMenuItem],
        x: i32,
        y: i32,
    ) -> Result<AudioMenu, JsValue> {
        let doc = &self.page.document;
        let element = elem_class(doc, "div", "audio-menu")?;
        element
            .style()
            .set_css_text(&format!("{};left:{}px;top:{}px", AUDIO_MENU_STYLE, x, y));

        let mut listeners = Vec::with_capacity(items.len() * 3 + 1);
        for item in items {
            let entry = elem_class(doc, "div", "audio-menu-item")?;
            set_text(&entry, &item.text());
            entry.style().set_css_text(AUDIO_ITEM_STYLE);

            let hovered = entry.clone();
            listeners.push(EventListener::new(&entry, "mouseover", move |_| {
                let _ = hovered.style().set_property("background", "#2a2a2a");
            }));
            let hovered = entry.clone();
            listeners.push(EventListener::new(&entry, "mouseout", move |_| {
                let _ = hovered.style().set_property("background", "transparent");
            }));

            let index = item.index;
            let weak = Rc::downgrade(self);
            listeners.push(EventListener::new(&entry, "click", move |_| {
                if let Some(session) = weak.upgrade() {
                    session.choose_audio(index);
                }
            }));
            element.append_child(&entry)?;
        }

        // Any later click closes the menu
        let weak = Rc::downgrade(self);
        listeners.push(EventListener::once(doc, "click", move |_| {
            if let Some(session) = weak.upgrade() {
                session.close_audio_menu();
            }
        }));

        doc.body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&element)?;
        Ok(AudioMenu {
            element,
            _listeners: listeners,
        })
    }

    fn close_audio_menu(&self) {
        let menu = self.state.borrow_mut().audio_menu.take();
        drop(menu);
    }

    fn choose_audio(&self, index: u32) {
        let player = self.state.borrow().dash.clone();
        if let Some(player) = player {
            if !player.select_audio(index) {
                crate::warn(&format!("Audio track {} is gone", index));
            }
        }
        let label = self
            .state
            .borrow_mut()
            .selection
            .select_audio(index)
            .map(|t| t.display_label());
        if let Some(label) = label {
            crate::log(&format!("Audio track: {}", label));
        }
        self.close_audio_menu();
    }

    fn toggle_subtitle_menu(self: &Rc<Self>) {
        let menu = &self.controls.subtitle_menu;
        if menu.class_list().contains("show-subtitle-menu") {
            remove_class(menu, "show-subtitle-menu");
            return;
        }
        if let Err(e) = self.render_subtitle_menu() {
            crate::warn(&format!("Could not build subtitle menu: {:?}", e));
            return;
        }
        add_class(menu, "show-subtitle-menu");
    }

    fn render_subtitle_menu(self: &Rc<Self>) -> Result<(), JsValue> {
        let items = subtitle_menu(&self.state.borrow().selection);
        let menu = &self.controls.subtitle_menu;
        menu.set_inner_html("");

        let mut listeners = Vec::with_capacity(items.len());
        for item in items {
            let entry = elem_class(
                &self.page.document,
                "li",
                if item.checked { "subtitle-active" } else { "" },
            )?;
            set_text(&entry, &item.label);
            let position = item.position;
            let weak = Rc::downgrade(self);
            listeners.push(EventListener::new(&entry, "click", move |_| {
                if let Some(session) = weak.upgrade() {
                    session.choose_subtitle(position);
                }
            }));
            menu.append_child(&entry)?;
        }
        self.state.borrow_mut().subtitle_listeners = listeners;
        Ok(())
    }

    fn choose_subtitle(&self, position: Option<usize>) {
        {
            let mut state = self.state.borrow_mut();
            state.selection.show_subtitle_at(position);
            text_tracks::apply_modes(&self.page.video, &state.selection);
        }
        remove_class(&self.controls.subtitle_menu, "show-subtitle-menu");
    }
}
