//! books-generator - assemble a timeline's chapters into a typeset book.
//!
//! ```text
//! books-generator ./docs/eros ./output/eros.pdf eros "1,2" a4
//! ```

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use manuscript::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "books-generator", version, about)]
struct Cli {
    /// Path to timeline content folder (containing chapters/)
    content_path: PathBuf,

    /// Output PDF file path
    output_path: PathBuf,

    /// Timeline name (anima, eros, bloom)
    timeline: String,

    /// Comma-separated episode numbers, e.g. "1,2,3" ("" for all episodes)
    episodes: Option<String>,

    /// Page format: a4 or a5 ("" for a4)
    #[arg(default_value = "a4", value_parser = parse_format)]
    format: PageFormat,

    /// Directory holding the templates
    #[arg(long, env = "BOOKS_TEMPLATES_DIR", default_value = "templates")]
    templates_dir: PathBuf,

    /// Template name inside the templates directory
    #[arg(long, default_value = "victoria-regia")]
    template: String,

    /// Book title
    #[arg(long)]
    title: Option<String>,

    /// Author name shown on the cover
    #[arg(long)]
    author: Option<String>,

    /// Publication year
    #[arg(long)]
    year: Option<String>,

    /// Show per-chapter details
    #[arg(short, long)]
    verbose: bool,
}

/// Page format argument; a blank value selects the default.
fn parse_format(value: &str) -> manuscript::error::Result<PageFormat> {
    if value.trim().is_empty() {
        Ok(PageFormat::default())
    } else {
        value.parse()
    }
}

impl Cli {
    fn metadata(&self) -> BookMetadata {
        let mut metadata = match &self.title {
            Some(title) => BookMetadata::default_with_title(title.clone()),
            None => BookMetadata::default(),
        };
        if let Some(author) = &self.author {
            metadata.author = author.clone();
        }
        if let Some(year) = &self.year {
            metadata.year = year.clone();
        }
        metadata
    }

    /// The episode list, with a blank positional meaning every episode.
    fn episodes(&self) -> Option<&str> {
        self.episodes
            .as_deref()
            .filter(|episodes| !episodes.trim().is_empty())
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut builder = BookConfig::builder();
    builder
        .content_path(cli.content_path.clone())
        .output_path(cli.output_path.clone())
        .timeline(cli.timeline.clone())
        .format(cli.format)
        .templates_dir(cli.templates_dir.clone())
        .template(cli.template.clone())
        .metadata(cli.metadata());
    if let Some(episodes) = cli.episodes() {
        builder.episodes(episodes);
    }

    let report = builder.build()?.generate().await?;
    println!(
        "Book generated: {} ({} chapters, {} episodes, {} POVs)",
        report.output_path.display(),
        report.chapters_assembled,
        report.corpus.episodes.len(),
        report.corpus.povs.len()
    );
    Ok(())
}
