//! Path utilities for chapter and output path handling.
//!
//! Chapter paths are matched as text (episode segments, chapter zero markers),
//! so they are rendered relative to the chapter root with `/` separators on
//! every platform. Output paths are made absolute before they are handed to
//! the external compiler, which runs from the templates directory.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Renders `path` relative to `root`, joining components with `/`.
///
/// Paths outside `root` are rendered whole.
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves a path against the current directory without touching the filesystem.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        Error::InvalidPath(
            path.to_path_buf(),
            format!("Cannot resolve absolute path: {}", e),
        )
    })
}

/// Sanitizes a filename by replacing invalid characters with safe alternatives.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '?' | '*' => '-',
            ':' => '-',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("content/chapters");
        let path = root.join("arc").join("ep01-x").join("ep01-ch001.md");
        assert_eq!(relative_slash_path(root, &path), "arc/ep01-x/ep01-ch001.md");
    }

    #[test]
    fn test_relative_slash_path_outside_root() {
        let path = Path::new("elsewhere/file.md");
        assert_eq!(
            relative_slash_path(Path::new("content"), path),
            "elsewhere/file.md"
        );
    }

    #[test]
    fn test_absolute_path_is_absolute() {
        let resolved = absolute_path(Path::new("output/book.pdf")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("output/book.pdf"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test<file>"), "test-file-");
        assert_eq!(sanitize_filename("test|file"), "test-file");
        assert_eq!(sanitize_filename("test:file"), "test-file");
        assert_eq!(sanitize_filename("test/file"), "test-file");
        assert_eq!(sanitize_filename("test\\file"), "test-file");
        assert_eq!(sanitize_filename("eros"), "eros");
    }
}
