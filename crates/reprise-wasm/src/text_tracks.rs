//! `<track>` elements and the video's `TextTrackList`

use reprise_core::{SubtitleDescriptor, TextTrack, TrackMode, TrackSelection};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlTrackElement, HtmlVideoElement, TextTrackMode};

fn web_mode(mode: TrackMode) -> TextTrackMode {
    match mode {
        TrackMode::Showing => TextTrackMode::Showing,
        TrackMode::Hidden => TextTrackMode::Hidden,
        TrackMode::Disabled => TextTrackMode::Disabled,
    }
}

/// Append a subtitle `<track>` for each descriptor and register it
pub fn attach(
    doc: &Document,
    video: &HtmlVideoElement,
    descriptors: &[SubtitleDescriptor],
    selection: &mut TrackSelection,
) -> Result<(), JsValue> {
    for descriptor in descriptors {
        let track: TextTrack = descriptor.to_text_track();
        let elem = doc.create_element("track")?.unchecked_into::<HtmlTrackElement>();
        elem.set_kind("subtitles");
        elem.set_src(&track.src);
        elem.set_srclang(&track.language);
        elem.set_label(&track.label);
        video.append_child(&elem)?;
        selection.add_text_track(track);
    }
    Ok(())
}

/// Push the selection's modes onto the video's text tracks
///
/// Tracks are matched by registration order. Tracks the selection does
/// not know about (in-band ones) are hidden.
pub fn apply_modes(video: &HtmlVideoElement, selection: &TrackSelection) {
    let Some(list) = video.text_tracks() else {
        return;
    };
    let known = selection.text_tracks();
    for i in 0..list.length() {
        if let Some(track) = list.get(i) {
            let mode = known
                .get(i as usize)
                .map(|t| t.mode)
                .unwrap_or(TrackMode::Hidden);
            track.set_mode(web_mode(mode));
        }
    }
}
