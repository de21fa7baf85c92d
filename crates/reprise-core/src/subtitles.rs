//! Subtitle track descriptors
//!
//! The server lists extracted subtitle files in `subtitles.txt`, one track
//! per line: language code, label, path. Older servers separate fields with
//! arbitrary whitespace, newer ones with tabs so labels may contain spaces.
//!
//! # Example
//!
//! ```rust
//! use reprise_core::subtitles::{parse_descriptors, DescriptorFormat};
//!
//! let tracks = parse_descriptors("en\tEnglish\t/media/a.mkv/subtitle.en.vtt\n", DescriptorFormat::Tabs);
//! assert_eq!(tracks.len(), 1);
//! assert_eq!(tracks[0].display_label(), "EN - English");
//! ```

use crate::error::{Error, Result};
use crate::types::TextTrack;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Field separator used by a `subtitles.txt` listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorFormat {
    /// `lang\tlabel\tpath`
    Tabs,
    /// `lang label... path`
    Whitespace,
}

impl DescriptorFormat {
    /// Guess the format from a listing body
    pub fn detect(body: &str) -> Self {
        if body.contains('\t') {
            DescriptorFormat::Tabs
        } else {
            DescriptorFormat::Whitespace
        }
    }
}

/// One subtitle track advertised by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleDescriptor {
    pub language: String,
    pub label: Option<String>,
    pub path: String,
}

impl SubtitleDescriptor {
    /// Parse one line; blank lines and lines with fewer than three fields yield `None`
    ///
    /// A language of `-` is read from the file name instead.
    pub fn parse_line(line: &str, format: DescriptorFormat) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (language, label, path) = match format {
            DescriptorFormat::Tabs => {
                let parts: Vec<&str> = line.split('\t').collect();
                if parts.len() < 3 {
                    return None;
                }
                (parts[0].trim(), parts[1].trim().to_string(), parts[2].trim())
            }
            DescriptorFormat::Whitespace => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return None;
                }
                let last = parts.len() - 1;
                (parts[0], parts[1..last].join(" "), parts[last])
            }
        };

        if path.is_empty() {
            return None;
        }
        // `-` defers to the cache naming, `subtitle.<lang>.vtt`
        let language = match language {
            "" => return None,
            "-" => language_from_filename(path.rsplit('/').next().unwrap_or(path))?,
            lang => lang,
        };

        Some(Self {
            language: language.to_string(),
            label: if label.is_empty() || label == "-" { None } else { Some(label) },
            path: path.to_string(),
        })
    }

    /// `"EN - English"`, or just `"EN"` without a label
    pub fn display_label(&self) -> String {
        match self.label {
            Some(ref label) => format!("{} - {}", self.language.to_uppercase(), label),
            None => self.language.to_uppercase(),
        }
    }

    /// Text track to register on the media element
    pub fn to_text_track(&self) -> TextTrack {
        TextTrack::new(self.language.clone(), self.display_label(), self.path.clone())
    }
}

impl FromStr for SubtitleDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_line(s, DescriptorFormat::detect(s))
            .ok_or_else(|| Error::InvalidDescriptor(s.trim().to_string()))
    }
}

/// Parse a whole listing, skipping unusable lines
pub fn parse_descriptors(body: &str, format: DescriptorFormat) -> Vec<SubtitleDescriptor> {
    body.lines()
        .filter_map(|line| SubtitleDescriptor::parse_line(line, format))
        .collect()
}

/// Language of a cached subtitle file named `subtitle.<lang>.vtt`
pub fn language_from_filename(filename: &str) -> Option<&str> {
    let parts: Vec<&str> = filename.split('.').collect();
    if parts.len() >= 3 {
        let lang = parts[parts.len() - 2];
        if !lang.is_empty() {
            return Some(lang);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_descriptor_single_track() {
        let tracks = parse_descriptors("en\tEnglish\t/path.vtt", DescriptorFormat::Tabs);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language, "en");
        assert_eq!(tracks[0].path, "/path.vtt");

        let track = tracks[0].to_text_track();
        assert_eq!(track.language, "en");
        assert_eq!(track.label, "EN - English");
    }

    #[test]
    fn test_tab_label_with_spaces() {
        let d = SubtitleDescriptor::parse_line(
            "pt\tPortuguese (Brazil) SDH\t/m/sub.pt.vtt",
            DescriptorFormat::Tabs,
        )
        .unwrap();
        assert_eq!(d.label.as_deref(), Some("Portuguese (Brazil) SDH"));
    }

    #[test]
    fn test_dash_label_omitted() {
        let d = SubtitleDescriptor::parse_line("fr\t-\t/fr.vtt", DescriptorFormat::Tabs).unwrap();
        assert_eq!(d.label, None);
        assert_eq!(d.display_label(), "FR");
    }

    #[test]
    fn test_whitespace_variant() {
        let body = "en English /a.vtt\n\n  de   German Forced   /b.vtt  \nbroken line\n";
        let tracks = parse_descriptors(body, DescriptorFormat::Whitespace);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].language, "de");
        assert_eq!(tracks[1].label.as_deref(), Some("German Forced"));
        assert_eq!(tracks[1].path, "/b.vtt");
    }

    #[test]
    fn test_short_lines_skipped() {
        let tracks = parse_descriptors("en\tEnglish\n\n\t\t\n", DescriptorFormat::Tabs);
        assert!(tracks.is_empty());
        assert!("en".parse::<SubtitleDescriptor>().is_err());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(DescriptorFormat::detect("en\tEnglish\t/a.vtt"), DescriptorFormat::Tabs);
        assert_eq!(DescriptorFormat::detect("en English /a.vtt"), DescriptorFormat::Whitespace);
    }

    #[test]
    fn test_language_from_filename() {
        assert_eq!(language_from_filename("subtitle.eng.vtt"), Some("eng"));
        assert_eq!(language_from_filename("movie.part1.fr.vtt"), Some("fr"));
        assert_eq!(language_from_filename("subtitle.vtt"), None);
    }

    #[test]
    fn test_absent_language_taken_from_path() {
        let body = "-\tCommentary\t/media/a.mkv/subtitle.de.vtt\n-\tUnknown\t/media/a.mkv/subs.vtt\n";
        let tracks = parse_descriptors(body, DescriptorFormat::Tabs);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language, "de");
        assert_eq!(tracks[0].display_label(), "DE - Commentary");
    }
}
