use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::path_utils::path_to_string_lossy;
use crate::renderer::{RenderJob, Renderer};

/// PDF engines probed in priority order.
pub const DEFAULT_ENGINES: &[&str] = &["pdflatex", "xelatex", "lualatex"];

/// Renders manuscripts with `pandoc` and a LaTeX engine.
#[derive(Debug, Clone)]
pub struct Pandoc {
    binary: String,
    engines: Vec<String>,
    toc_depth: Option<u8>,
}

impl Default for Pandoc {
    fn default() -> Self {
        Self {
            binary: "pandoc".to_string(),
            engines: DEFAULT_ENGINES.iter().map(|e| e.to_string()).collect(),
            toc_depth: Some(1),
        }
    }
}

impl Pandoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different pandoc executable (name on `PATH` or a path).
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Replaces the engine candidates, highest priority first.
    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = engines.into_iter().map(Into::into).collect();
        self
    }

    /// Table of contents depth; `None` renders without a table of contents.
    pub fn with_toc_depth(mut self, depth: Option<u8>) -> Self {
        self.toc_depth = depth;
        self
    }

    /// Command line arguments for a job, excluding the binary itself.
    pub fn args(&self, job: &RenderJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            job.source.clone().into_os_string(),
            "-o".into(),
            job.destination.clone().into_os_string(),
        ];

        let mut template = OsString::from("--template=");
        template.push(job.template.as_os_str());
        args.push(template);
        args.push(format!("--pdf-engine={}", job.engine).into());

        if let Some(depth) = self.toc_depth {
            args.push("--toc".into());
            args.push(format!("--toc-depth={}", depth).into());
        }

        args.extend(
            job.variables
                .iter()
                .map(|(key, value)| OsString::from(format!("--variable={}:{}", key, value))),
        );
        args
    }
}

/// Looks a binary up on `PATH`. A name with a directory part is checked as
/// given. On Windows each `PATH` entry is also tried with an `.exe` suffix.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(name);
        if full.is_file() {
            return Some(full);
        }
        // Windows binaries carry an extension the caller does not spell out.
        if cfg!(windows) {
            let exe = dir.join(format!("{}.exe", name));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

#[async_trait]
impl Renderer for Pandoc {
    fn detect_engine(&self) -> Result<String> {
        self.engines
            .iter()
            .find(|engine| find_in_path(engine).is_some())
            .cloned()
            .ok_or_else(|| Error::NoEngine {
                candidates: self.engines.clone(),
            })
    }

    async fn render(&self, job: &RenderJob) -> Result<()> {
        log::info!(
            "Executing {} for {}",
            self.binary,
            path_to_string_lossy(&job.destination)
        );

        let status = Command::new(&self.binary)
            .args(self.args(job))
            .current_dir(&job.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| {
                Error::CompilerFailure(format!("failed to run `{}`: {}", self.binary, e))
            })?;

        if !status.success() {
            return Err(Error::CompilerFailure(format!(
                "`{}` exited with {}",
                self.binary, status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> RenderJob {
        RenderJob {
            source: PathBuf::from("/out/temp-eros-1.md"),
            destination: PathBuf::from("/out/eros.pdf"),
            template: PathBuf::from("/tpl/victoria-regia/template.tex"),
            engine: "xelatex".to_string(),
            variables: vec![
                ("geometry".to_string(), "a5".to_string()),
                ("title".to_string(), "Echoes: Eros".to_string()),
            ],
            working_dir: PathBuf::from("/tpl"),
        }
    }

    #[test]
    fn builds_pandoc_arguments() {
        let args: Vec<String> = Pandoc::new()
            .args(&job())
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "/out/temp-eros-1.md",
                "-o",
                "/out/eros.pdf",
                "--template=/tpl/victoria-regia/template.tex",
                "--pdf-engine=xelatex",
                "--toc",
                "--toc-depth=1",
                "--variable=geometry:a5",
                "--variable=title:Echoes: Eros",
            ]
        );
    }

    #[test]
    fn toc_can_be_disabled() {
        let args = Pandoc::new().with_toc_depth(None).args(&job());
        assert!(!args.iter().any(|a| a.to_string_lossy().starts_with("--toc")));
    }

    #[test]
    fn missing_engines_are_reported() {
        let pandoc = Pandoc::new().with_engines(["no-such-engine-a", "no-such-engine-b"]);
        match pandoc.detect_engine() {
            Err(Error::NoEngine { candidates }) => {
                assert_eq!(candidates, vec!["no-such-engine-a", "no-such-engine-b"])
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_a_compiler_failure() {
        let pandoc = Pandoc::new().with_binary("no-such-pandoc-binary");
        let mut job = job();
        job.working_dir = std::env::temp_dir();
        let result = pandoc.render(&job).await;
        assert!(matches!(result, Err(Error::CompilerFailure(_))));
    }
}
