//! Common test utilities and constants for the manuscript crate.
//!
//! Provides functions for setting up scratch content trees, writing chapter
//! files, and renderers that stand in for pandoc.

use async_trait::async_trait;
use manuscript::error::{Error, Result};
use manuscript::renderer::{RenderJob, Renderer};
use rand::{Rng, distributions::Alphanumeric};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Scratch directories of one test.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    /// Timeline content folder (`content_path`).
    pub content_dir: PathBuf,
    /// `content_dir/chapters`
    pub chapters_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[allow(dead_code)]
impl TestDirs {
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// Creates a clean, uniquely named test directory with content, chapters and
/// output subdirectories. The output directory is not created.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let content_dir = test_dir.join("content");
    let chapters_dir = content_dir.join("chapters");
    let output_dir = test_dir.join("output");

    fs::create_dir_all(&chapters_dir).await.unwrap();

    TestDirs {
        test_dir,
        content_dir,
        chapters_dir,
        output_dir,
    }
}

/// Writes a file below `root`, creating parent directories.
#[allow(dead_code)]
pub async fn write_file(root: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, content).await?;
    Ok(path)
}

/// Chapter text with front matter and a `# N. Pov: Title` heading.
#[allow(dead_code)]
pub fn chapter_text(number: u32, pov: &str, title: &str, body: &str) -> String {
    format!(
        "---\npov: {pov}\ntitle: \"{title}\"\ntimeline: test\nchapter: {number}\n---\n\n# {number}. {pov}: {title}\n\n{body}\n"
    )
}

/// Names of leftover transient manuscripts in `dir`.
#[allow(dead_code)]
pub async fn transient_files(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(mut entries) = fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("temp-") {
                names.push(name);
            }
        }
    }
    names
}

/// Stands in for pandoc: copies the manuscript to the destination and records
/// every job it receives.
#[allow(dead_code)]
#[derive(Default)]
pub struct CopyRenderer {
    pub jobs: Mutex<Vec<RenderJob>>,
    pub manuscripts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CopyRenderer {
    pub fn last_job(&self) -> RenderJob {
        self.jobs.lock().unwrap().last().cloned().expect("no job rendered")
    }

    pub fn last_manuscript(&self) -> String {
        self.manuscripts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no manuscript rendered")
    }
}

#[async_trait]
impl Renderer for CopyRenderer {
    fn detect_engine(&self) -> Result<String> {
        Ok("fake-tex".to_string())
    }

    async fn render(&self, job: &RenderJob) -> Result<()> {
        let text = fs::read_to_string(&job.source).await?;
        fs::write(&job.destination, format!("RENDERED\n{}", text)).await?;
        self.jobs.lock().unwrap().push(job.clone());
        self.manuscripts.lock().unwrap().push(text);
        Ok(())
    }
}

/// Fails like a compiler exiting non-zero, after checking its input exists.
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingRenderer {
    pub saw_source: Mutex<bool>,
}

#[async_trait]
impl Renderer for FailingRenderer {
    fn detect_engine(&self) -> Result<String> {
        Ok("fake-tex".to_string())
    }

    async fn render(&self, job: &RenderJob) -> Result<()> {
        *self.saw_source.lock().unwrap() = job.source.exists();
        Err(Error::CompilerFailure("`fake` exited with exit status: 43".to_string()))
    }
}
