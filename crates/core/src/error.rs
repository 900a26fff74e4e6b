//! Error types for the PDF narration pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a PDF into speech.
///
/// Every operation boundary reports one of these three kinds; the payload
/// carries the formatted underlying cause.
#[derive(Error, Debug)]
pub enum Error {
    /// The source document could not be opened, parsed, or read.
    #[error("Document error: {0}")]
    Document(String),

    /// The speech backend failed to produce or play audio.
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Invalid settings, a missing backend, or an operation requested
    /// in a state that cannot accept it.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Build a [`Error::Document`] from anything displayable.
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    /// Build a [`Error::Synthesis`] from anything displayable.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`Error::Configuration`] from anything displayable.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_cause() {
        let err = Error::document("file not found: test.pdf");
        assert_eq!(err.to_string(), "Document error: file not found: test.pdf");

        let err = Error::synthesis("espeak-ng exited with status 1");
        assert!(err.to_string().starts_with("Synthesis error:"));

        let err = Error::configuration("rate 50 outside 100..=200");
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
