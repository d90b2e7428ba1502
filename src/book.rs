use std::path::PathBuf;

use tokio::fs;

use crate::analyzer::CorpusAnalysis;
use crate::assembler::{Manuscript, TransientManuscript, assemble};
use crate::collector::{Collector, EpisodeFilter, filter_chapters};
use crate::error::{Error, Result};
use crate::path_utils::{absolute_path, path_to_string_lossy};
use crate::renderer::pandoc::Pandoc;
use crate::renderer::{RenderJob, Renderer};
use crate::types::{
    BookMetadata, ChapterSource, CorpusReport, ExecutionMode, GenerationReport, PageFormat,
    Palette,
};

/// Configuration of one manuscript generation run, built declaratively using the builder pattern.
///
/// A run reads the chapter tree of a single timeline, assembles the manuscript and
/// hands it to a [`Renderer`]. The staged entry points expose each step:
///
/// - [`analyze`](BookConfig::analyze): collection, filtering and corpus analysis only
/// - [`assemble`](BookConfig::assemble): the manuscript text, kept in memory
/// - [`generate`](BookConfig::generate): the full run with the default `pandoc` renderer
/// - [`generate_with`](BookConfig::generate_with): the full run with any [`Renderer`]
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use manuscript::prelude::*;
/// # #[tokio::main]
/// # async fn main() -> manuscript::error::Result<()> {
/// let config = BookConfig::builder()
///     .content_path("./docs/eros")
///     .output_path("./output/eros.pdf")
///     .timeline("eros")
///     .episodes("1,2")
///     .format(PageFormat::A5)
///     .build()?;
///
/// let report = config.generate().await?;
/// println!("{} chapters, {} bytes", report.chapters_assembled, report.output_size);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BookConfig {
    /// Timeline content folder, holding the chapters folder.
    pub content_path: PathBuf,

    /// Destination of the rendered document. Its parent directory is created if needed.
    pub output_path: PathBuf,

    /// Timeline identifier, used for labeling, palette lookup and the transient file name.
    pub timeline: String,

    /// Comma-separated episode numbers to keep, e.g. `"1,2,3"`. All episodes when unset or blank.
    #[builder(default)]
    pub episodes: Option<String>,

    /// Page geometry passed to the template.
    #[builder(default)]
    pub format: PageFormat,

    /// Chapters folder below `content_path`. An empty path uses `content_path` itself.
    #[builder(default = "PathBuf::from(\"chapters\")")]
    pub chapters_subdir: PathBuf,

    /// Directory holding the templates; also the compiler's working directory.
    #[builder(default = "PathBuf::from(\"templates\")")]
    pub templates_dir: PathBuf,

    /// Template name; the file used is `templates_dir/<template>/template.tex`.
    #[builder(default = "\"victoria-regia\".to_string()")]
    pub template: String,

    /// Title page metadata.
    #[builder(default)]
    pub metadata: BookMetadata,

    /// Palette override. When unset, the palette is looked up by timeline.
    #[builder(default)]
    pub palette: Option<Palette>,
}

impl BookConfig {
    /// Creates a new builder for configuring `BookConfig`.
    pub fn builder() -> BookConfigBuilder {
        BookConfigBuilder::default()
    }

    /// Folder the chapter files are collected from.
    pub fn chapters_root(&self) -> PathBuf {
        if self.chapters_subdir.as_os_str().is_empty() {
            self.content_path.clone()
        } else {
            self.content_path.join(&self.chapters_subdir)
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.templates_dir.join(&self.template).join("template.tex")
    }

    pub fn palette(&self) -> Palette {
        self.palette
            .clone()
            .unwrap_or_else(|| Palette::for_timeline(&self.timeline))
    }

    /// The episode filter of the run. A blank list selects every episode.
    pub fn episode_filter(&self) -> Option<EpisodeFilter> {
        self.episodes
            .as_deref()
            .filter(|episodes| !episodes.trim().is_empty())
            .map(EpisodeFilter::parse)
    }

    /// Performs validation checks on the configuration for a specific execution mode.
    ///
    /// No file is created or read; only the existence of the input folders and the
    /// shape of the output path are checked. Every entry point calls this first.
    pub fn preflight_check(&self, mode: ExecutionMode) -> Result<&Self> {
        if self.timeline.trim().is_empty() {
            return Err(Error::Other("Timeline is required".to_string()));
        }
        if self.content_path.as_os_str().is_empty() {
            return Err(Error::Other("Content path is required".to_string()));
        }
        if !self.content_path.exists() {
            return Err(Error::NotFound(format!(
                "Content folder not found: {}",
                path_to_string_lossy(&self.content_path)
            )));
        }
        if !self.content_path.is_dir() {
            return Err(Error::InvalidPath(
                self.content_path.clone(),
                "Content path is not a directory.".to_string(),
            ));
        }

        let chapters_root = self.chapters_root();
        if !chapters_root.is_dir() {
            return Err(Error::NotFound(format!(
                "Chapters folder not found: {}",
                path_to_string_lossy(&chapters_root)
            )));
        }

        match mode {
            ExecutionMode::Analyze | ExecutionMode::Assemble => {}
            ExecutionMode::Render => {
                if self.output_path.file_name().is_none() {
                    return Err(Error::InvalidPath(
                        self.output_path.clone(),
                        "Output path must name a file.".to_string(),
                    ));
                }
            }
        }

        Ok(self)
    }

    /// Collects, filters and reads the chapters of the run, in manuscript order.
    pub async fn collect_chapters(&self) -> Result<Vec<ChapterSource>> {
        let chapters_root = self.chapters_root();
        let entries = Collector::new(&chapters_root).collect_chapters().await?;
        let filter = self.episode_filter();
        let entries = filter_chapters(entries, filter.as_ref())?;
        Collector::load_chapters(entries).await
    }

    /// Collects and analyzes the corpus without assembling it.
    pub async fn analyze(&self) -> Result<CorpusReport> {
        self.preflight_check(ExecutionMode::Analyze)?;
        let chapters = self.collect_chapters().await?;
        let analysis = CorpusAnalysis::analyze(&chapters);
        Ok(Self::corpus_report(&chapters, &analysis))
    }

    /// Assembles the manuscript in memory without rendering it.
    pub async fn assemble(&self) -> Result<Manuscript> {
        self.preflight_check(ExecutionMode::Assemble)?;
        let (_, manuscript) = self.prepare().await?;
        Ok(manuscript)
    }

    /// Runs the full pipeline with the default `pandoc` renderer.
    pub async fn generate(&self) -> Result<GenerationReport> {
        self.generate_with(&Pandoc::default()).await
    }

    /// Runs the full pipeline, handing the manuscript to `renderer`.
    ///
    /// The transient manuscript is written next to the output file and removed
    /// before this returns, whether rendering succeeded or not.
    pub async fn generate_with<R>(&self, renderer: &R) -> Result<GenerationReport>
    where
        R: Renderer + ?Sized,
    {
        self.preflight_check(ExecutionMode::Render)?;
        log::info!("Generating book for timeline: {}", self.timeline.to_uppercase());

        let (corpus, manuscript) = self.prepare().await?;

        let destination = absolute_path(&self.output_path)?;
        let output_dir = match destination.parent() {
            Some(parent) => parent.to_path_buf(),
            None => {
                return Err(Error::InvalidPath(
                    destination.clone(),
                    "Output path has no parent directory.".to_string(),
                ));
            }
        };
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir).await?;
        }

        let transient =
            TransientManuscript::create(&output_dir, &self.timeline, &manuscript.text).await?;
        let rendered = self
            .render_manuscript(renderer, transient.path().to_path_buf(), destination.clone())
            .await;
        let cleanup = transient.remove().await;
        let engine = rendered?;
        cleanup?;

        let output_size = fs::metadata(&destination).await?.len();
        log::info!(
            "Book generated: {} ({} KB)",
            path_to_string_lossy(&destination),
            (output_size as f64 / 1024.0).round()
        );

        Ok(GenerationReport {
            corpus,
            output_path: destination,
            output_size,
            engine,
            chapters_assembled: manuscript.chapter_count(),
        })
    }

    /// Named style variables handed to the template, in a fixed order.
    pub fn style_variables(&self) -> Result<Vec<(String, String)>> {
        let palette = self.palette();
        let templates_dir = absolute_path(&self.templates_dir)?;
        let metadata = &self.metadata;
        Ok(vec![
            ("geometry".to_string(), self.format.to_string()),
            ("timeline".to_string(), self.timeline.clone()),
            ("title".to_string(), metadata.title.clone()),
            ("subtitle".to_string(), capitalize(&self.timeline)),
            ("author".to_string(), metadata.author.clone()),
            ("authorFull".to_string(), metadata.author_full.clone()),
            ("publisher".to_string(), metadata.publisher.clone()),
            ("email".to_string(), metadata.email.clone()),
            ("year".to_string(), metadata.year.clone()),
            ("timeline-primary".to_string(), palette.primary),
            ("timeline-secondary".to_string(), palette.secondary),
            ("timeline-accent".to_string(), palette.accent),
            (
                "templates-dir".to_string(),
                path_to_string_lossy(&templates_dir),
            ),
        ])
    }

    // --- Private helpers for pipeline steps ---

    /// Collection, analysis and assembly shared by the entry points.
    async fn prepare(&self) -> Result<(CorpusReport, Manuscript)> {
        let chapters = self.collect_chapters().await?;
        let analysis = CorpusAnalysis::analyze(&chapters);
        let manuscript = assemble(&chapters, analysis.facts());
        Ok((Self::corpus_report(&chapters, &analysis), manuscript))
    }

    async fn render_manuscript<R>(
        &self,
        renderer: &R,
        source: PathBuf,
        destination: PathBuf,
    ) -> Result<String>
    where
        R: Renderer + ?Sized,
    {
        let engine = renderer.detect_engine()?;
        log::info!("Using PDF engine: {}", engine);

        let job = RenderJob {
            source,
            destination,
            template: absolute_path(&self.template_path())?,
            engine: engine.clone(),
            variables: self.style_variables()?,
            working_dir: absolute_path(&self.templates_dir)?,
        };
        renderer.render(&job).await?;
        Ok(engine)
    }

    fn corpus_report(chapters: &[ChapterSource], analysis: &CorpusAnalysis) -> CorpusReport {
        CorpusReport {
            chapters: chapters.iter().map(|c| c.path.clone()).collect(),
            episodes: analysis.episodes.iter().map(|e| e.to_string()).collect(),
            povs: analysis.povs.iter().map(|p| p.to_string()).collect(),
            facts: analysis.facts(),
            word_count: analysis.word_count,
        }
    }
}

/// Upper-cases the first character.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl BookConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(timeline) = &self.timeline {
            if timeline.trim().is_empty() {
                return Err("Timeline must not be empty".to_string());
            }
            if timeline.contains(['/', '\\']) {
                return Err(format!("Timeline must not contain path separators: {}", timeline));
            }
        }

        // A blank list means no filter.
        let requested = self.episodes.clone().flatten();
        if let Some(episodes) = requested.filter(|e| !e.trim().is_empty()) {
            let well_formed = episodes
                .chars()
                .all(|c| c.is_ascii_digit() || c == ',' || c.is_whitespace());
            if !well_formed || !episodes.chars().any(|c| c.is_ascii_digit()) {
                return Err(format!("Invalid episode list: {}", episodes));
            }
        }

        Ok(())
    }
}
