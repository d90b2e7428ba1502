//! Manuscript assembly.
//!
//! Chapters are folded in path order through a [`ChapterCursor`], which owns the
//! only running state of a run: the episode currently being written and the
//! chapter counter inside it. Each step yields a [`ChapterPosition`] that is
//! handed to the pure per-chapter transform, and the results are joined with
//! explicit page breaks.
//!
//! The assembled text is written to a [`TransientManuscript`] for the external
//! compiler. The file is removed on every exit path once it exists.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::analyzer::{CorpusFacts, EpisodeKey};
use crate::error::{Error, Result};
use crate::path_utils::{absolute_path, path_to_string_lossy, sanitize_filename};
use crate::transform::{ChapterPosition, PAGE_BREAK, transform_chapter};
use crate::types::ChapterSource;

/// Running episode/chapter state threaded through the assembly fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterCursor {
    current: Option<EpisodeKey>,
    counter: u32,
}

impl ChapterCursor {
    /// Moves to the next chapter.
    ///
    /// The counter restarts whenever a chapter carries an episode key that
    /// differs from the current one; chapters without a key keep counting.
    pub fn advance(self, episode: Option<EpisodeKey>) -> (Self, ChapterPosition) {
        let is_first_of_episode = episode.is_some() && episode != self.current;
        let (current, counter) = if is_first_of_episode {
            (episode, 1)
        } else {
            (self.current, self.counter + 1)
        };
        let position = ChapterPosition {
            counter,
            is_first_of_episode,
        };
        (Self { current, counter }, position)
    }
}

/// The concatenated manuscript, held in memory for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manuscript {
    pub text: String,
    /// Position assigned to each chapter, in manuscript order.
    pub positions: Vec<ChapterPosition>,
}

impl Manuscript {
    pub fn chapter_count(&self) -> usize {
        self.positions.len()
    }
}

/// Transforms every chapter in order and joins them with page breaks.
pub fn assemble(chapters: &[ChapterSource], facts: CorpusFacts) -> Manuscript {
    let (_, positions, bodies) = chapters.iter().fold(
        (ChapterCursor::default(), Vec::new(), Vec::new()),
        |(cursor, mut positions, mut bodies), chapter| {
            let (cursor, position) = cursor.advance(chapter.episode_key());
            log::debug!(
                "Chapter {} -> #{}{}",
                chapter.relative,
                position.counter,
                if position.is_first_of_episode {
                    " (opens episode)"
                } else {
                    ""
                }
            );
            bodies.push(transform_chapter(
                &chapter.content,
                &chapter.relative,
                facts,
                position,
            ));
            positions.push(position);
            (cursor, positions, bodies)
        },
    );

    Manuscript {
        text: bodies.join(PAGE_BREAK),
        positions,
    }
}

/// A manuscript file that lives only as long as this value.
///
/// Call [`TransientManuscript::remove`] on the normal path; dropping the value
/// without doing so removes the file synchronously.
#[derive(Debug)]
pub struct TransientManuscript {
    path: PathBuf,
    removed: bool,
}

impl TransientManuscript {
    /// File name prefix of every transient manuscript.
    pub const PREFIX: &'static str = "temp-";

    /// Writes `text` to a new, uniquely named file in `directory`.
    ///
    /// The name is `temp-<timeline>-<unix millis>.md`; if that name is taken the
    /// timestamp component is bumped until a free name is found.
    pub async fn create(directory: &Path, timeline: &str, text: &str) -> Result<Self> {
        let timeline = sanitize_filename(timeline);
        let mut stamp = Utc::now().timestamp_millis();

        let (path, mut file) = loop {
            let candidate =
                absolute_path(&directory.join(format!("{}{}-{}.md", Self::PREFIX, timeline, stamp)))?;
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => break (candidate, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(Error::Io(e)),
            }
        };

        // From here on the file exists, so any failure must still remove it.
        let manuscript = Self {
            path,
            removed: false,
        };
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        log::debug!(
            "Wrote transient manuscript {}",
            path_to_string_lossy(&manuscript.path)
        );
        Ok(manuscript)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file. A file that is already gone is not an error.
    pub async fn remove(mut self) -> Result<()> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                log::debug!(
                    "Removed transient manuscript {}",
                    path_to_string_lossy(&self.path)
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl Drop for TransientManuscript {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!(
                "Removed transient manuscript {}",
                path_to_string_lossy(&self.path)
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Could not remove transient manuscript {}: {}",
                path_to_string_lossy(&self.path),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(relative: &str, content: &str) -> ChapterSource {
        ChapterSource {
            path: PathBuf::from(relative),
            relative: relative.to_string(),
            content: content.to_string(),
        }
    }

    fn key(path: &str) -> Option<EpisodeKey> {
        EpisodeKey::from_path(path)
    }

    #[test]
    fn cursor_resets_at_episode_boundary() {
        let keys = [
            key("arc/ep01-a/ep01-ch001.md"),
            key("arc/ep01-a/ep01-ch002.md"),
            key("arc/ep02-b/ep02-ch001.md"),
        ];
        let mut cursor = ChapterCursor::default();
        let mut counters = Vec::new();
        let mut firsts = Vec::new();
        for k in keys {
            let (next, position) = cursor.advance(k);
            cursor = next;
            counters.push(position.counter);
            firsts.push(position.is_first_of_episode);
        }
        assert_eq!(counters, vec![1, 2, 1]);
        assert_eq!(firsts, vec![true, false, true]);
    }

    #[test]
    fn chapters_without_episode_keep_counting() {
        let (cursor, first) = ChapterCursor::default().advance(key("ep01-a/x.md"));
        let (_, loose) = cursor.advance(None);
        assert_eq!(first.counter, 1);
        assert_eq!(loose.counter, 2);
        assert!(!loose.is_first_of_episode);
    }

    #[test]
    fn page_breaks_only_between_chapters() {
        let chapters = vec![
            chapter("arc/ep01-a/ep01-ch001.md", "# 1. One\nA"),
            chapter("arc/ep01-a/ep01-ch002.md", "# 2. Two\nB"),
        ];
        let manuscript = assemble(&chapters, CorpusFacts::default());
        assert_eq!(
            manuscript.text,
            "# 1. One\nA\n\n\\newpage\n\n# 2. Two\nB"
        );
        assert_eq!(manuscript.chapter_count(), 2);
    }

    #[test]
    fn episodes_get_headings_and_grouped_titles() {
        let chapters = vec![
            chapter("arc/ep01-first-light/ep01-ch001.md", "# 1. Alice: Dawn\n"),
            chapter("arc/ep01-first-light/ep01-ch002.md", "# 2. Bob: Noon\n"),
            chapter("arc/ep02-dark/ep02-ch001.md", "# 1. Alice: Dusk\n"),
        ];
        let facts = CorpusFacts {
            has_multiple_episodes: true,
            has_multiple_povs: true,
        };
        let manuscript = assemble(&chapters, facts);
        assert_eq!(
            manuscript.text,
            "# First Light\n\n## Dawn _(Alice)_\n\
             \n\n\\newpage\n\n\
             ## Noon _(Bob)_\n\
             \n\n\\newpage\n\n\
             # Dark\n\n## Dusk _(Alice)_\n"
        );
    }
}
