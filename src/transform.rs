//! Per-chapter content transformation.
//!
//! Every chapter goes through the same pure steps, in order:
//!
//! 1. [`split_front_matter`] drops a leading `---` delimited metadata block.
//! 2. [`strip_decorative`] removes pictographs and other render-hazard symbols.
//! 3. When the chapter path carries an episode key, the first numbered heading
//!    is rewritten according to the corpus facts and the chapter position, and
//!    an episode heading is prepended to the first chapter of every episode
//!    when the manuscript spans several episodes.
//!
//! Malformed headings never fail the transform; they simply pass through.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analyzer::{CorpusFacts, EpisodeKey};

lazy_static! {
    static ref FRONT_MATTER_REGEX: Regex =
        Regex::new(r"\A---\s*\n([\s\S]*?)\n---\s*\n").unwrap();
    static ref NUMBERED_HEADING_REGEX: Regex = Regex::new(r"^(\d+)\.\s*(.+)$").unwrap();
    static ref POV_PREFIX_REGEX: Regex = Regex::new(r"^([^:]+):\s*(.+)$").unwrap();
}

/// Inclusive code point ranges removed from chapter text.
const DECORATIVE_RANGES: &[(char, char)] = &[
    ('\u{1F000}', '\u{1F9FF}'),
    ('\u{2600}', '\u{26FF}'),
    ('\u{2700}', '\u{27BF}'),
    ('\u{2B1B}', '\u{2B1C}'),
    ('\u{25A0}', '\u{25FF}'),
    ('\u{2190}', '\u{21FF}'),
    ('\u{2200}', '\u{22FF}'),
    ('\u{FE0F}', '\u{FE0F}'),
    ('\u{200D}', '\u{200D}'),
];

/// Explicit page break understood by the LaTeX backend.
pub const PAGE_BREAK: &str = "\n\n\\newpage\n\n";

/// A chapter split into its optional front matter block and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// Raw text between the delimiters, if a block was recognized.
    pub block: Option<&'a str>,
    pub body: &'a str,
}

/// Recognizes the first front matter block at the very start of the content.
pub fn split_front_matter(content: &str) -> FrontMatter<'_> {
    match FRONT_MATTER_REGEX.captures(content) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            FrontMatter {
                block: caps.get(1).map(|m| m.as_str()),
                body: &content[whole..],
            }
        }
        None => FrontMatter {
            block: None,
            body: content,
        },
    }
}

pub fn is_decorative(c: char) -> bool {
    DECORATIVE_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&c))
}

/// Removes every decorative code point, leaving all other characters untouched.
pub fn strip_decorative(text: &str) -> String {
    text.chars().filter(|c| !is_decorative(*c)).collect()
}

/// Shape of a first-level heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterHeading<'a> {
    /// `# 3. Title` or `# 3. Pov: Title`
    Numbered {
        number: &'a str,
        pov: Option<&'a str>,
        title: &'a str,
    },
    /// Any other `# text` heading
    Plain { text: &'a str },
}

impl<'a> ChapterHeading<'a> {
    /// Parses a single line (without its line terminator).
    pub fn parse(line: &'a str) -> Option<Self> {
        let text = line.strip_prefix("# ")?;
        if let Some(caps) = NUMBERED_HEADING_REGEX.captures(text) {
            let number = caps.get(1)?.as_str();
            let rest = caps.get(2)?.as_str();
            return Some(match POV_PREFIX_REGEX.captures(rest) {
                Some(pov_caps) => ChapterHeading::Numbered {
                    number,
                    pov: Some(pov_caps.get(1)?.as_str()),
                    title: pov_caps.get(2)?.as_str(),
                },
                None => ChapterHeading::Numbered {
                    number,
                    pov: None,
                    title: rest,
                },
            });
        }
        if text.is_empty() {
            None
        } else {
            Some(ChapterHeading::Plain { text })
        }
    }
}

/// Where a chapter sits in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterPosition {
    /// 1-based number within the current episode.
    pub counter: u32,
    pub is_first_of_episode: bool,
}

/// Renders the output heading for a numbered chapter heading.
fn format_heading(
    pov: Option<&str>,
    title: &str,
    facts: CorpusFacts,
    position: ChapterPosition,
) -> String {
    let level = if facts.has_multiple_episodes { "##" } else { "#" };
    let number = if facts.has_multiple_episodes {
        String::new()
    } else {
        format!("{}. ", position.counter)
    };
    match pov {
        Some(pov) if facts.has_multiple_povs => format!("{level} {number}{title} _({pov})_"),
        _ => format!("{level} {number}{title}"),
    }
}

/// Rewrites only the first numbered first-level heading of `body`.
pub fn rewrite_heading(body: &str, facts: CorpusFacts, position: ChapterPosition) -> String {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);
        if let Some(ChapterHeading::Numbered { pov, title, .. }) = ChapterHeading::parse(content) {
            let heading = format_heading(pov, title, facts, position);
            let tail = &body[offset + content.len()..];
            return format!("{}{}{}", &body[..offset], heading, tail);
        }
        offset += line.len();
    }
    body.to_string()
}

/// Transforms one chapter's raw content into its manuscript form.
pub fn transform_chapter(
    content: &str,
    relative_path: &str,
    facts: CorpusFacts,
    position: ChapterPosition,
) -> String {
    let body = split_front_matter(content).body;
    let cleaned = strip_decorative(body);

    let Some(episode) = EpisodeKey::from_path(relative_path) else {
        return cleaned;
    };

    let rewritten = rewrite_heading(&cleaned, facts, position);
    if facts.has_multiple_episodes && position.is_first_of_episode {
        log::debug!("Opening episode '{}' with {}", episode.label(), relative_path);
        format!("# {}\n\n{}", episode.label(), rewritten)
    } else {
        rewritten
    }
}
