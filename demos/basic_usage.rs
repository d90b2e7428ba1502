//! Example generating books from a timeline content tree.
//!
//! Expects `./docs/<timeline>/chapters/<arc>/ep<NN>-<slug>/*.md` and a
//! `./templates/victoria-regia/template.tex`, plus `pandoc` and a LaTeX engine
//! on `PATH`.

use manuscript::prelude::*;

#[tokio::main]
async fn main() -> manuscript::error::Result<()> {
    // Example 1: a single episode
    let bloom = BookConfig::builder()
        .content_path("./docs/bloom")
        .output_path("./output/bloom-ep1.pdf")
        .timeline("bloom")
        .episodes("1")
        .format(PageFormat::A4)
        .build()?;
    report(bloom.generate().await?);

    // Example 2: several episodes on A5 pages
    let eros = BookConfig::builder()
        .content_path("./docs/eros")
        .output_path("./output/eros-complete.pdf")
        .timeline("eros")
        .episodes("1,2,3")
        .format(PageFormat::A5)
        .build()?;
    report(eros.generate().await?);

    // Example 3: the whole timeline, inspected before rendering
    let anima = BookConfig::builder()
        .content_path("./docs/anima")
        .output_path("./output/anima-all.pdf")
        .timeline("anima")
        .build()?;
    let corpus = anima.analyze().await?;
    println!(
        "anima: {} chapters, {} words, episodes {:?}, POVs {:?}",
        corpus.chapters.len(),
        corpus.word_count,
        corpus.episodes,
        corpus.povs
    );
    report(anima.generate().await?);

    Ok(())
}

fn report(report: GenerationReport) {
    println!(
        "{} -> {} chapters, {} KB (engine: {})",
        report.output_path.display(),
        report.chapters_assembled,
        report.output_size / 1024,
        report.engine
    );
}
