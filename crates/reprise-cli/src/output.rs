//! Output formatting for CLI

use console::style;
use reprise_core::{format_time, AudioTrack, ProgressRecord, RestorePlan, SubtitleDescriptor};
use serde::Serialize;
use std::fmt;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

fn display_option(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn display_position(value: &Option<f64>) -> String {
    value.map(format_time).unwrap_or_else(|| "-".to_string())
}

/// Saved progress of one file
#[derive(Debug, Serialize, Tabled)]
pub struct ProgressRow {
    pub file: String,
    pub position: f64,
    #[serde(skip)]
    pub time: String,
    #[tabled(display_with = "display_option")]
    pub audio: Option<String>,
    #[tabled(display_with = "display_option")]
    pub subtitle: Option<String>,
}

impl ProgressRow {
    pub fn new(file: &str, record: &ProgressRecord) -> Self {
        Self {
            file: file.to_string(),
            position: record.position,
            time: format_time(record.position),
            audio: record.audio_language.clone(),
            subtitle: record.subtitle_language.clone(),
        }
    }
}

impl fmt::Display for ProgressRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {} ({:.1}s)  audio: {}  subtitle: {}",
            style(&self.file).bold(),
            self.time,
            self.position,
            display_option(&self.audio),
            display_option(&self.subtitle)
        )
    }
}

/// One advertised subtitle file
#[derive(Debug, Serialize, Tabled)]
pub struct SubtitleRow {
    pub language: String,
    #[tabled(display_with = "display_option")]
    pub label: Option<String>,
    pub path: String,
}

impl From<&SubtitleDescriptor> for SubtitleRow {
    fn from(descriptor: &SubtitleDescriptor) -> Self {
        Self {
            language: descriptor.language.clone(),
            label: descriptor.label.clone(),
            path: descriptor.path.clone(),
        }
    }
}

impl fmt::Display for SubtitleRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {:<6} {:<24} {}",
            self.language,
            display_option(&self.label),
            style(&self.path).dim()
        )
    }
}

/// One audio adaptation set
#[derive(Debug, Serialize, Tabled)]
pub struct AudioRow {
    pub index: u32,
    #[tabled(display_with = "display_option")]
    pub language: Option<String>,
    pub label: String,
}

impl From<&AudioTrack> for AudioRow {
    fn from(track: &AudioTrack) -> Self {
        Self {
            index: track.index,
            language: track.language.clone(),
            label: track.display_label(),
        }
    }
}

impl fmt::Display for AudioRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {}. {:<6} {}",
            self.index,
            display_option(&self.language),
            self.label
        )
    }
}

/// What a resumed session applied
#[derive(Debug, Serialize, Tabled)]
pub struct ResumeRow {
    pub file: String,
    #[tabled(rename = "resume at", display_with = "display_position")]
    pub seek_to: Option<f64>,
    #[tabled(display_with = "display_option")]
    pub audio: Option<String>,
    #[tabled(display_with = "display_option")]
    pub subtitle: Option<String>,
}

impl ResumeRow {
    /// `audio` is the selected track's label when the plan did not change it
    pub fn new(file: &str, plan: &RestorePlan, audio: Option<String>) -> Self {
        Self {
            file: file.to_string(),
            seek_to: plan.seek_to,
            audio: plan.audio.as_ref().map(|t| t.display_label()).or(audio),
            subtitle: plan.subtitle.clone(),
        }
    }
}

impl fmt::Display for ResumeRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seek_to {
            Some(position) => write!(f, "Resuming {} at {}", self.file, format_time(position))?,
            None => write!(f, "Starting {} from the beginning", self.file)?,
        }
        write!(
            f,
            "\n  audio: {}\n  subtitle: {}",
            display_option(&self.audio),
            display_option(&self.subtitle)
        )
    }
}

/// Render a list of rows
pub fn render_rows<T>(rows: &[T], format: OutputFormat) -> anyhow::Result<String>
where
    T: Serialize + Tabled + fmt::Display,
{
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
        OutputFormat::Table => Table::new(rows).with(Style::rounded()).to_string(),
        OutputFormat::Text => rows
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

/// Render a single row; JSON output is an object rather than a list
pub fn render_one<T>(row: &T, format: OutputFormat) -> anyhow::Result<String>
where
    T: Serialize + Tabled + fmt::Display,
{
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(row)?),
        _ => render_rows(std::slice::from_ref(row), format),
    }
}

pub fn success(message: &str) -> String {
    format!("{} {}", style("✓").green().bold(), message)
}

pub fn notice(message: &str) -> String {
    format!("{} {}", style("!").yellow().bold(), message)
}
