//! Corpus-wide analysis of the filtered chapter set.
//!
//! A single pass over every chapter derives the two facts that gate heading
//! formatting for the whole run: whether more than one episode is present and
//! whether more than one point-of-view character narrates. The pass reads
//! nothing but the already-loaded [`ChapterSource`] values and mutates nothing.

use std::collections::BTreeSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::transform::{ChapterHeading, split_front_matter};
use crate::types::ChapterSource;

/// Longest accepted POV name, in characters.
const MAX_POV_LEN: usize = 10;

lazy_static! {
    /// Episode segment of a chapter path, e.g. `ep01-the-beginning`.
    pub static ref EPISODE_KEY_REGEX: Regex = Regex::new(r"ep(\d+)-([^/]+)").unwrap();
    /// POV annotation line right below a plain heading: `# Title` then `_[Alice]_`.
    static ref POV_IN_LINE_REGEX: Regex =
        Regex::new(r"(?m)^# [^:\n]+\n\s*_\[([^\]\n]+)\]_").unwrap();
    static ref POV_SHAPE_REGEX: Regex = Regex::new(r"^[A-Z][a-z]+$").unwrap();
}

/// Identity of the episode a chapter belongs to.
///
/// Two chapters share an episode iff their keys are textually identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeKey {
    key: String,
    number: String,
    slug: String,
}

impl EpisodeKey {
    /// Parses the first `ep<NN>-<slug>` segment of a `/`-separated path.
    pub fn from_path(path: &str) -> Option<Self> {
        let caps = EPISODE_KEY_REGEX.captures(path)?;
        Some(Self {
            key: caps[0].to_string(),
            number: caps[1].to_string(),
            slug: caps[2].to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Episode number digits as written in the path (zero padding kept).
    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Human readable label: hyphens become spaces, every word is capitalized.
    pub fn label(&self) -> String {
        title_case(&self.slug.replace('-', " "))
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Upper-cases every ASCII word character that starts a word.
fn title_case(s: &str) -> String {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut out = String::with_capacity(s.len());
    let mut prev_is_word = false;
    for c in s.chars() {
        if is_word(c) && !prev_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word(c);
    }
    out
}

/// A validated point-of-view name: one capital letter followed by lowercase
/// letters, at most ten characters long.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PovName(String);

impl PovName {
    /// Trims and validates a candidate, returning `None` for anything that
    /// does not have the accepted shape.
    pub fn parse(candidate: &str) -> Option<Self> {
        let candidate = candidate.trim();
        if candidate.chars().count() <= MAX_POV_LEN && POV_SHAPE_REGEX.is_match(candidate) {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PovName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the narrating POV from chapter content.
///
/// Only the first numbered heading (`# 3. Alice: Title`) is considered, the same
/// heading the transformer rewrites. Its POV prefix takes priority; the
/// annotation line is only consulted when that heading carries no prefix. When
/// the prefix exists but fails validation, the annotation is not consulted.
pub fn extract_pov(content: &str) -> Option<PovName> {
    let heading_pov = content
        .lines()
        .find_map(|line| match ChapterHeading::parse(line) {
            Some(ChapterHeading::Numbered { pov, .. }) => Some(pov),
            _ => None,
        })
        .flatten();
    if let Some(pov) = heading_pov {
        return PovName::parse(pov);
    }
    POV_IN_LINE_REGEX
        .captures(content)
        .and_then(|caps| PovName::parse(&caps[1]))
}

/// Whitespace-separated word count of the chapter body, front matter excluded.
pub fn word_count(content: &str) -> usize {
    split_front_matter(content).body.split_whitespace().count()
}

/// The two global facts that gate heading format for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct CorpusFacts {
    pub has_multiple_episodes: bool,
    pub has_multiple_povs: bool,
}

/// Distinct episodes and POV names found in the corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusAnalysis {
    pub episodes: BTreeSet<EpisodeKey>,
    pub povs: BTreeSet<PovName>,
    pub word_count: usize,
}

impl CorpusAnalysis {
    /// Scans every chapter once.
    pub fn analyze(chapters: &[ChapterSource]) -> Self {
        let mut analysis = CorpusAnalysis::default();
        for chapter in chapters {
            if let Some(key) = chapter.episode_key() {
                analysis.episodes.insert(key);
            }
            if let Some(pov) = extract_pov(&chapter.content) {
                analysis.povs.insert(pov);
            }
            analysis.word_count += word_count(&chapter.content);
        }
        log::info!(
            "{} episodes, {} POVs",
            analysis.episodes.len(),
            analysis.povs.len()
        );
        analysis
    }

    pub fn facts(&self) -> CorpusFacts {
        CorpusFacts {
            has_multiple_episodes: self.episodes.len() > 1,
            has_multiple_povs: self.povs.len() > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chapter(relative: &str, content: &str) -> ChapterSource {
        ChapterSource {
            path: PathBuf::from(relative),
            relative: relative.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn episode_key_from_directory_segment() {
        let key = EpisodeKey::from_path("arc-one/ep01-the-first-step/ep01-ch001-start.md").unwrap();
        assert_eq!(key.as_str(), "ep01-the-first-step");
        assert_eq!(key.number(), "01");
        assert_eq!(key.slug(), "the-first-step");
        assert_eq!(key.label(), "The First Step");
        assert!(EpisodeKey::from_path("arc-one/prologue.md").is_none());
    }

    #[test]
    fn label_capitalizes_after_non_word_characters() {
        let key = EpisodeKey::from_path("ep02-night.and-day_two").unwrap();
        assert_eq!(key.label(), "Night.And Day_two");
    }

    #[test]
    fn pov_shape() {
        assert!(PovName::parse("Alice").is_some());
        assert!(PovName::parse(" Bob ").is_some());
        assert!(PovName::parse("ALICE").is_none());
        assert!(PovName::parse("al").is_none());
        assert!(PovName::parse("A").is_none());
        assert!(PovName::parse("Maximiliano").is_none());
        assert!(PovName::parse("Mary Jane").is_none());
    }

    #[test]
    fn pov_from_heading_takes_priority() {
        let content = "# 1. Alice: The Start\n\n_[Bob]_\n";
        assert_eq!(extract_pov(content).unwrap().as_str(), "Alice");
    }

    #[test]
    fn pov_from_annotation_line() {
        let content = "# The Start\n\n_[Bob]_\n\nText.";
        assert_eq!(extract_pov(content).unwrap().as_str(), "Bob");
    }

    #[test]
    fn invalid_heading_pov_blocks_annotation() {
        let content = "# 1. ALICE: The Start\n_[Bob]_\n";
        assert!(extract_pov(content).is_none());
    }

    #[test]
    fn only_first_numbered_heading_names_the_pov() {
        let content = "# 1. Start\n\nText.\n\n# 2. Bob: Later\n";
        assert!(extract_pov(content).is_none());

        let content = "# 1. Start\n_[Alice]_\n\n# 2. Bob: Later\n";
        assert_eq!(extract_pov(content).unwrap().as_str(), "Alice");

        let content = "# Prologue\n\n# 1. Alice: Start\r\n";
        assert_eq!(extract_pov(content).unwrap().as_str(), "Alice");
    }

    #[test]
    fn facts_from_corpus() {
        let chapters = vec![
            chapter("a/ep01-one/ep01-ch001.md", "# 1. Alice: A\n"),
            chapter("a/ep01-one/ep01-ch002.md", "# 2. Bob: B\n"),
        ];
        let analysis = CorpusAnalysis::analyze(&chapters);
        assert_eq!(
            analysis.facts(),
            CorpusFacts {
                has_multiple_episodes: false,
                has_multiple_povs: true
            }
        );

        let chapters = vec![
            chapter("a/ep01-one/ep01-ch001.md", "# 1. Alice: A\n"),
            chapter("a/ep02-two/ep02-ch001.md", "# 1. Alice: B\n"),
            chapter("a/ep02-two/ep02-ch002.md", "# 2. Someonewithalongname: C\n"),
        ];
        let facts = CorpusAnalysis::analyze(&chapters).facts();
        assert!(facts.has_multiple_episodes);
        assert!(!facts.has_multiple_povs);
    }

    #[test]
    fn word_count_skips_front_matter() {
        let content = "---\npov: Alice\ntitle: \"X\"\n---\n\nOne two three.";
        assert_eq!(word_count(content), 3);
    }
}
