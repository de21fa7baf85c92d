//! Small DOM helpers shared by the control bar and menus

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Window};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// Create an element with a class attribute
pub fn elem_class(doc: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let elem = doc.create_element(tag)?;
    elem.set_class_name(class);
    Ok(elem.unchecked_into())
}

/// Append `<ion-icon name="...">` to `parent`
pub fn append_icon(doc: &Document, parent: &Element, name: &str) -> Result<(), JsValue> {
    let icon = doc.create_element("ion-icon")?;
    icon.set_attribute("name", name)?;
    parent.append_child(&icon)?;
    Ok(())
}

/// Replace an element's content with a single icon
pub fn set_icon(target: &Element, name: &str) {
    target.set_inner_html(&format!(r#"<ion-icon name="{}"></ion-icon>"#, name));
}

pub fn set_text(target: &Element, text: &str) {
    target.set_text_content(Some(text));
}

/// Set `style.width` as a percentage of the parent
pub fn set_width_percent(target: &HtmlElement, fraction: f64) {
    let _ = target
        .style()
        .set_property("width", &format!("{}%", fraction * 100.0));
}

pub fn set_width_px(target: &HtmlElement, px: f64) {
    let _ = target.style().set_property("width", &format!("{}px", px));
}

pub fn set_visible(target: &HtmlElement, visible: bool) {
    let _ = target
        .style()
        .set_property("display", if visible { "" } else { "none" });
}

pub fn add_class(target: &Element, class: &str) {
    let _ = target.class_list().add_1(class);
}

pub fn remove_class(target: &Element, class: &str) {
    let _ = target.class_list().remove_1(class);
}

pub fn toggle_class(target: &Element, class: &str, on: bool) {
    let _ = target.class_list().toggle_with_force(class, on);
}

/// Whether `event`'s target is inside `container`
pub fn event_within(event: &web_sys::Event, container: &Element) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Node>().ok())
        .map(|node| container.contains(Some(&node)))
        .unwrap_or(false)
}

/// Tag name of the focused element
pub fn active_tag(doc: &Document) -> String {
    doc.active_element()
        .map(|e| e.tag_name())
        .unwrap_or_default()
}
