//! Manuscript - Chapter Tree to Typeset Book Assembly
//!
//! This crate turns a timeline's chapter tree (`chapters/<arc>/ep<NN>-<slug>/*.md`)
//! into a single ordered markdown manuscript and hands it to an external document
//! compiler (by default `pandoc` with a LaTeX engine) together with the template's
//! style variables.
//!
//! The pipeline runs in two phases. A corpus-wide analysis derives whether the
//! selection spans several episodes and several point-of-view characters; then
//! every chapter is transformed on its own (front matter stripped, decorative
//! symbols removed, chapter heading renumbered) and the results are joined with
//! page breaks.
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use manuscript::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> manuscript::error::Result<()> {
//!     let config = BookConfig::builder()
//!         .content_path("./docs/bloom")
//!         .output_path("./output/bloom-ep1.pdf")
//!         .timeline("bloom")
//!         .episodes("1")
//!         .format(PageFormat::A4)
//!         .build()?;
//!
//!     // Optional: validate before touching the filesystem
//!     config.preflight_check(ExecutionMode::Render)?;
//!
//!     let report = config.generate().await?;
//!     println!(
//!         "{} chapters from {} episodes -> {:?}",
//!         report.chapters_assembled,
//!         report.corpus.episodes.len(),
//!         report.output_path
//!     );
//!     Ok(())
//! }
//! ```
//!
//! To inspect the manuscript without rendering it, use
//! [`BookConfig::assemble`]; to plug in another compiler, implement
//! [`renderer::Renderer`] and call [`BookConfig::generate_with`].

pub mod analyzer;
pub mod assembler;
pub mod book;
pub mod collector;
pub mod error;
pub mod path_utils;
pub mod renderer;
pub mod transform;
pub mod types;

pub use book::BookConfig;
pub use book::BookConfigBuilder;

pub use types::{
    BookMetadata, ChapterSource, CorpusReport, ExecutionMode, GenerationReport, PageFormat,
    Palette,
};

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types and traits, so a single
/// `use manuscript::prelude::*;` is enough for typical use.
pub mod prelude {
    pub use super::{
        BookConfig, BookConfigBuilder, BookMetadata, ChapterSource, CorpusReport, ExecutionMode,
        GenerationReport, PageFormat, Palette, error, renderer, types,
    };
    pub use crate::analyzer::{CorpusAnalysis, CorpusFacts, EpisodeKey, PovName};
    pub use crate::assembler::{ChapterCursor, Manuscript, TransientManuscript};
    pub use crate::collector::{Collector, EpisodeFilter};
    pub use crate::renderer::pandoc::Pandoc;
    pub use crate::renderer::{RenderJob, Renderer};
    pub use crate::transform::{ChapterHeading, ChapterPosition};
    pub use std::path::{Path, PathBuf};
}
