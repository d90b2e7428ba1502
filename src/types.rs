//! Core data types, enums, and reports for manuscript generation.
//!
//! This module defines the fundamental data structures used throughout the crate:
//! - Run settings (`PageFormat`, `BookMetadata`, `Palette`)
//! - Intermediate data (`ChapterSource`)
//! - Reporting types (`CorpusReport`, `GenerationReport`)
//! - The staged entry point selector (`ExecutionMode`)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Datelike;

use crate::analyzer::{CorpusFacts, EpisodeKey};
use crate::error::{Error, Result};

/// Page geometry passed to the template as the `geometry` variable.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum PageFormat {
    #[default]
    A4,
    A5,
}

impl PageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageFormat::A4 => "a4",
            PageFormat::A5 => "a5",
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            other => Err(Error::Unsupported(format!(
                "Page format '{}' (expected a4 or a5)",
                other
            ))),
        }
    }
}

/// Title page and colophon metadata handed to the template.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub author_full: String,
    pub publisher: String,
    pub email: String,
    pub year: String,
}

impl Default for BookMetadata {
    fn default() -> Self {
        Self {
            title: "Echoes".to_string(),
            author: "Zweer".to_string(),
            author_full: "Niccolò Olivieri Achille".to_string(),
            publisher: "Echoes".to_string(),
            email: String::new(),
            year: chrono::Local::now().year().to_string(),
        }
    }
}

impl BookMetadata {
    /// Creates default metadata with a specified title.
    pub fn default_with_title(title: String) -> Self {
        Self {
            title,
            ..Default::default()
        }
    }
}

/// Three hex colors (without `#`) used by the template for a timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl Palette {
    pub fn new(primary: &str, secondary: &str, accent: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            accent: accent.to_string(),
        }
    }

    /// Looks up the palette for a known timeline, falling back to `bloom`.
    pub fn for_timeline(timeline: &str) -> Self {
        match timeline {
            "anima" => Palette::new("4ECDC4", "95E1D3", "F3B6D3"),
            "eros" => Palette::new("D2001F", "FF6B6B", "FFD93D"),
            _ => Palette::new("FF69B4", "FFA07A", "FFD700"),
        }
    }
}

/// A chapter file read from disk, ready for analysis and transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterSource {
    /// Full path of the file on disk.
    pub path: PathBuf,
    /// Path relative to the chapter root, always `/`-separated.
    pub relative: String,
    /// Raw UTF-8 content.
    pub content: String,
}

impl ChapterSource {
    pub fn episode_key(&self) -> Option<EpisodeKey> {
        EpisodeKey::from_path(&self.relative)
    }
}

/// Summary of the corpus after collection, filtering and analysis.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorpusReport {
    pub chapters: Vec<PathBuf>,
    pub episodes: Vec<String>,
    pub povs: Vec<String>,
    pub facts: CorpusFacts,
    pub word_count: usize,
}

/// Outcome of a complete generation run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationReport {
    pub corpus: CorpusReport,
    pub output_path: PathBuf,
    pub output_size: u64,
    pub engine: String,
    pub chapters_assembled: usize,
}

/// Specifies the intended stage a run goes up to.
/// Used by `BookConfig::preflight_check` to tailor validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionMode {
    /// Collect, filter and analyze the chapters only.
    Analyze,
    /// Produce the manuscript text in memory.
    Assemble,
    /// Produce the manuscript and hand it to the rendering engine.
    Render,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_format_parses_case_insensitively() {
        assert_eq!("A5".parse::<PageFormat>().unwrap(), PageFormat::A5);
        assert_eq!(" a4 ".parse::<PageFormat>().unwrap(), PageFormat::A4);
        assert!("letter".parse::<PageFormat>().is_err());
        assert_eq!(PageFormat::default().to_string(), "a4");
    }

    #[test]
    fn unknown_timeline_uses_bloom_palette() {
        assert_eq!(Palette::for_timeline("test"), Palette::for_timeline("bloom"));
        assert_eq!(Palette::for_timeline("eros").primary, "D2001F");
        assert_eq!(Palette::for_timeline("anima").accent, "F3B6D3");
    }
}
