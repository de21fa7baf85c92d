//! DASH manifest inspection
//!
//! The streaming engine does the real MPD handling in the browser. Natively
//! we only need the audio adaptation sets (to restore an audio language in a
//! headless session) and the presentation duration.

use crate::types::AudioTrack;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of an MPD
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestSummary {
    /// `type="dynamic"` manifests are still being written
    pub is_dynamic: bool,
    /// `mediaPresentationDuration`
    pub duration: Option<Duration>,
    /// Audio adaptation sets, indexed in document order
    pub audio_tracks: Vec<AudioTrack>,
}

/// Summarize MPD text
pub fn summarize(content: &str) -> Result<ManifestSummary> {
    // Simple MPD scanning using string operations
    let mpd_start = content
        .find("<MPD")
        .ok_or_else(|| Error::ManifestParse("missing <MPD> element".to_string()))?;
    let mpd_attrs = element_attrs(&content[mpd_start + 4..]);

    let is_dynamic = extract_attr(mpd_attrs, "type").as_deref() == Some("dynamic");
    let duration =
        extract_attr(mpd_attrs, "mediaPresentationDuration").and_then(|d| parse_iso8601_duration(&d));

    Ok(ManifestSummary {
        is_dynamic,
        duration,
        audio_tracks: extract_audio_tracks(content),
    })
}

fn extract_audio_tracks(content: &str) -> Vec<AudioTrack> {
    let mut tracks = Vec::new();

    for set in content.split("<AdaptationSet").skip(1) {
        let body = match set.find("</AdaptationSet>") {
            Some(end) => &set[..end],
            None => set,
        };
        let attrs = element_attrs(body);

        let content_type = extract_attr(attrs, "contentType");
        let mime_type = extract_attr(attrs, "mimeType")
            .or_else(|| {
                body.split("<Representation")
                    .nth(1)
                    .and_then(|rep| extract_attr(element_attrs(rep), "mimeType"))
            });
        let is_audio = content_type.as_deref() == Some("audio")
            || mime_type.as_deref().map(|m| m.starts_with("audio/")).unwrap_or(false);
        if !is_audio {
            continue;
        }

        tracks.push(AudioTrack {
            index: tracks.len() as u32,
            language: extract_attr(attrs, "lang"),
            label: extract_element_text(body, "Label"),
        });
    }

    tracks
}

/// Attribute section of an element whose name has already been consumed
fn element_attrs(rest: &str) -> &str {
    match rest.find('>') {
        Some(end) => rest[..end].trim_end_matches('/'),
        None => rest,
    }
}

/// Extract attribute value from XML attributes string
fn extract_attr(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!(" {}=\"", name);
    let padded = format!(" {}", attrs);
    let start = padded.find(&pattern)? + pattern.len();
    let end = padded[start..].find('"')?;
    Some(padded[start..start + end].to_string())
}

fn extract_element_text(body: &str, name: &str) -> Option<String> {
    let open = format!("<{}", name);
    let close = format!("</{}>", name);
    let start = body.find(&open)?;
    let text_start = start + body[start..].find('>')? + 1;
    let text_end = text_start + body[text_start..].find(&close)?;
    let text = body[text_start..text_end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Parse ISO 8601 duration (PT...S format)
fn parse_iso8601_duration(s: &str) -> Option<Duration> {
    let s = s.trim_start_matches('P').trim_start_matches('T');

    let mut total_seconds = 0.0;
    let mut current = String::new();

    for c in s.chars() {
        match c {
            'H' => {
                total_seconds += current.parse::<f64>().unwrap_or(0.0) * 3600.0;
                current.clear();
            }
            'M' => {
                total_seconds += current.parse::<f64>().unwrap_or(0.0) * 60.0;
                current.clear();
            }
            'S' => {
                total_seconds += current.parse::<f64>().unwrap_or(0.0);
                current.clear();
            }
            'T' => current.clear(),
            _ => current.push(c),
        }
    }

    if total_seconds > 0.0 {
        Duration::try_from_secs_f64(total_seconds).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MPD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static" mediaPresentationDuration="PT1H2M3.5S">
  <Period id="0">
    <AdaptationSet id="0" contentType="video" mimeType="video/mp4">
      <Representation id="0" bandwidth="4000000" width="1920" height="1080"/>
    </AdaptationSet>
    <AdaptationSet id="1" contentType="audio" lang="ja">
      <Label>Japanese 5.1</Label>
      <Representation id="1" mimeType="audio/mp4" bandwidth="128000"/>
    </AdaptationSet>
    <AdaptationSet id="2" lang="en">
      <Representation id="2" mimeType="audio/mp4" bandwidth="128000"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

    #[test]
    fn test_summarize_audio_sets() {
        let summary = summarize(MPD).unwrap();
        assert!(!summary.is_dynamic);
        assert_eq!(summary.duration, Some(Duration::from_secs_f64(3723.5)));
        assert_eq!(summary.audio_tracks.len(), 2);
        assert_eq!(summary.audio_tracks[0].language.as_deref(), Some("ja"));
        assert_eq!(summary.audio_tracks[0].label.as_deref(), Some("Japanese 5.1"));
        assert_eq!(summary.audio_tracks[1].index, 1);
        assert_eq!(summary.audio_tracks[1].label, None);
    }

    #[test]
    fn test_dynamic_manifest() {
        let summary = summarize(r#"<MPD type="dynamic"></MPD>"#).unwrap();
        assert!(summary.is_dynamic);
        assert!(summary.audio_tracks.is_empty());
    }

    #[test]
    fn test_not_an_mpd() {
        assert!(summarize("#EXTM3U").is_err());
    }

    #[test]
    fn test_out_of_range_duration_is_unknown() {
        let summary = summarize(r#"<MPD type="static" mediaPresentationDuration="PT1e20S"></MPD>"#).unwrap();
        assert_eq!(summary.duration, None);
        assert_eq!(parse_iso8601_duration("PT1e400S"), None);
        assert_eq!(parse_iso8601_duration("PT90S"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT1H30M"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_iso8601_duration("PT45.5S"), Some(Duration::from_secs_f64(45.5)));
        assert_eq!(parse_iso8601_duration("PT0S"), None);
    }
}
