//! Custom error types and result handling for manuscript generation.
//!
//! Every stage of the pipeline returns a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. Errors are surfaced to the caller unmodified
//! and terminate the run; nothing is retried.
//!
use std::path::PathBuf;

/// Type alias for Results with manuscript errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all manuscript operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Configuration builder errors (missing or invalid fields)
    #[error(transparent)]
    BookConfigBuilder(#[from] crate::book::BookConfigBuilderError),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// The content root or its chapters folder does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// The episode filter excluded every collected file
    #[error("No files found for episodes: {episodes}")]
    NoMatch { episodes: String },
    /// Nothing left to assemble once all filters ran
    #[error("No files to process")]
    EmptyCorpus,
    /// None of the candidate PDF engines is installed
    #[error("No PDF engine found. Install one of: {}", .candidates.join(", "))]
    NoEngine { candidates: Vec<String> },
    /// The external document compiler failed or could not be started
    #[error("Document compiler failed: {0}")]
    CompilerFailure(String),
    /// Unsupported values (e.g. an unknown page format)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_names_the_requested_list() {
        let err = Error::NoMatch {
            episodes: "7, 99".to_string(),
        };
        assert_eq!(err.to_string(), "No files found for episodes: 7, 99");
    }

    #[test]
    fn no_engine_lists_candidates() {
        let err = Error::NoEngine {
            candidates: vec!["pdflatex".to_string(), "xelatex".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No PDF engine found. Install one of: pdflatex, xelatex"
        );
    }
}
