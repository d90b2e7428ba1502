//! Renderer module provides the seam to the external document compiler.
//!
//! The assembled manuscript is a plain markdown file; turning it into a typeset
//! document is delegated to a [`Renderer`]. The default implementation,
//! [`pandoc::Pandoc`], shells out to `pandoc` with a LaTeX PDF engine.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

pub mod pandoc;

/// Everything the compiler needs for one rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// The transient manuscript (absolute path).
    pub source: PathBuf,
    /// Where the rendered document is written (absolute path).
    pub destination: PathBuf,
    /// Template file handed to the compiler.
    pub template: PathBuf,
    /// PDF engine binary name, as returned by [`Renderer::detect_engine`].
    pub engine: String,
    /// Named style variables, in the order they are passed.
    pub variables: Vec<(String, String)>,
    /// Directory the compiler runs from, so templates can use relative assets.
    pub working_dir: PathBuf,
}

impl RenderJob {
    /// Value of a style variable, if set.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Common interface for document compilers.
///
/// Implementations either produce a file at [`RenderJob::destination`] or fail;
/// they never leave a partial destination behind on failure.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Picks the rendering engine to use.
    ///
    /// # Returns
    /// * `Err(Error::NoEngine)` - No candidate engine is available
    fn detect_engine(&self) -> Result<String>;

    /// Compiles the job's source into its destination.
    ///
    /// # Returns
    /// * `Err(Error::CompilerFailure)` - The compiler could not run or exited unsuccessfully
    async fn render(&self, job: &RenderJob) -> Result<()>;
}
