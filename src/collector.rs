//! Chapter file discovery and filtering.
//!
//! This module walks the chapter tree of a timeline (`arc/episode/chapter.md`),
//! produces a deterministic, lexicographically ordered list of markdown files,
//! narrows it to the requested episodes and drops the reserved "chapter zero"
//! files that hold episode front pages rather than story text.

use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};
use rayon::prelude::*;
use tokio::fs::read_dir;

use crate::error::{Error, Result};
use crate::path_utils::{path_to_string_lossy, relative_slash_path};
use crate::types::ChapterSource;

/// Extension of chapter files.
pub const MARKDOWN_EXTENSION: &str = ".md";
/// Path segment marking episode front pages, never part of the manuscript.
pub const CHAPTER_ZERO_MARKER: &str = "-ch00-";

/// A discovered chapter file that has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub path: PathBuf,
    /// Path relative to the chapter root, `/`-separated.
    pub relative: String,
}

/// Enumerates chapter files below a chapter root.
#[derive(Debug)]
pub struct Collector<'a> {
    chapters_root: &'a Path,
}

impl<'a> Collector<'a> {
    /// Creates a new Collector for the specified chapter root.
    pub fn new(chapters_root: &'a Path) -> Self {
        Self { chapters_root }
    }

    /// Collects every markdown file below the chapter root, sorted by path.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<ChapterEntry>>` - Entries in lexicographic order of their relative path
    pub async fn collect_chapters(&self) -> Result<Vec<ChapterEntry>> {
        if !self.chapters_root.is_dir() {
            return Err(Error::NotFound(format!(
                "Chapters folder not found: {}",
                path_to_string_lossy(self.chapters_root)
            )));
        }

        let files = collect_recursive(self.chapters_root.to_path_buf()).await?;

        let mut entries: Vec<ChapterEntry> = files
            .into_iter()
            .map(|path| ChapterEntry {
                relative: relative_slash_path(self.chapters_root, &path),
                path,
            })
            .collect();
        entries.par_sort_by(|a, b| a.relative.cmp(&b.relative));

        log::debug!(
            "Collected {} markdown files under {}",
            entries.len(),
            path_to_string_lossy(self.chapters_root)
        );
        Ok(entries)
    }

    /// Reads every entry once, in order.
    pub async fn load_chapters(entries: Vec<ChapterEntry>) -> Result<Vec<ChapterSource>> {
        let mut chapters = Vec::with_capacity(entries.len());
        for entry in entries {
            let content = tokio::fs::read_to_string(&entry.path).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to read chapter '{}': {}",
                        path_to_string_lossy(&entry.path),
                        e
                    ),
                ))
            })?;
            chapters.push(ChapterSource {
                path: entry.path,
                relative: entry.relative,
                content,
            });
        }
        Ok(chapters)
    }
}

/// Lists a directory, sorts it, and descends into subdirectories in order.
fn collect_recursive(directory: PathBuf) -> BoxFuture<'static, Result<Vec<PathBuf>>> {
    async move {
        let mut listing: Vec<PathBuf> = Vec::new();
        let mut paths = read_dir(&directory).await?;
        while let Some(entry) = paths.next_entry().await? {
            listing.push(entry.path());
        }
        listing.sort();

        let mut files = Vec::new();
        for path in listing {
            // symlink_metadata keeps directory symlink loops out of the walk
            let file_type = match tokio::fs::symlink_metadata(&path).await {
                Ok(meta) => meta.file_type(),
                Err(e) => {
                    log::warn!("Skipping unreadable entry {}: {}", path_to_string_lossy(&path), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                match collect_recursive(path.clone()).await {
                    Ok(nested) => files.extend(nested),
                    Err(e) => {
                        log::warn!(
                            "Skipping unreadable directory {}: {}",
                            path_to_string_lossy(&path),
                            e
                        );
                    }
                }
            } else if is_markdown(&path) && path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
    .boxed()
}

fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(MARKDOWN_EXTENSION))
        .unwrap_or(false)
}

/// Caller-requested subset of episodes, e.g. `"1, 2,10"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeFilter {
    requested: String,
    segments: Vec<String>,
}

impl EpisodeFilter {
    /// Parses a comma-separated list of episode numbers. Each number is
    /// zero-padded to two digits and matched as an `ep<NN>` path segment.
    pub fn parse(requested: &str) -> Self {
        let segments = requested
            .split(',')
            .map(str::trim)
            .filter(|ep| !ep.is_empty())
            .map(|ep| format!("ep{:0>2}", ep))
            .collect();
        Self {
            requested: requested.to_string(),
            segments,
        }
    }

    /// The list exactly as the caller wrote it.
    pub fn requested(&self) -> &str {
        &self.requested
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.segments
            .iter()
            .any(|segment| relative.contains(segment.as_str()))
    }

    /// Keeps entries matching any requested episode.
    pub fn apply(&self, entries: Vec<ChapterEntry>) -> Result<Vec<ChapterEntry>> {
        let kept: Vec<ChapterEntry> = entries
            .into_iter()
            .filter(|entry| self.matches(&entry.relative))
            .collect();
        if kept.is_empty() {
            return Err(Error::NoMatch {
                episodes: self.requested.clone(),
            });
        }
        log::info!(
            "Filtered {} files for episodes: {}",
            kept.len(),
            self.requested
        );
        Ok(kept)
    }
}

pub fn is_chapter_zero(relative: &str) -> bool {
    relative.contains(CHAPTER_ZERO_MARKER)
}

/// Applies the optional episode filter, then the chapter zero exclusion.
///
/// # Returns
///
/// * `Err(Error::NoMatch)` - The episode filter matched nothing
/// * `Err(Error::EmptyCorpus)` - Nothing remains after all filtering
pub fn filter_chapters(
    entries: Vec<ChapterEntry>,
    episodes: Option<&EpisodeFilter>,
) -> Result<Vec<ChapterEntry>> {
    let entries = match episodes {
        Some(filter) => filter.apply(entries)?,
        None => entries,
    };

    let chapters: Vec<ChapterEntry> = entries
        .into_iter()
        .filter(|entry| !is_chapter_zero(&entry.relative))
        .collect();

    log::info!("Processing {} files", chapters.len());
    if chapters.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    Ok(chapters)
}
