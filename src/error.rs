//! Error types for mdlive

use thiserror::Error;

/// Result type alias for mdlive operations
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Highlighting engine error types
///
/// None of these ever reach a caller of the engine's highlight entry
/// points; they are logged and degrade to "no visible highlighting".
#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern `{name}`: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("Pattern `{pattern}` produced an unexpected match: {reason}")]
    Extract {
        pattern: &'static str,
        reason: String,
    },

    #[error("Invalid viewport: first visible line {first} is after last visible line {last}")]
    InvalidViewport { first: usize, last: usize },

    #[error("Engine has been destroyed")]
    Destroyed,

    #[error("Highlight pass panicked: {0}")]
    Panicked(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl HighlightError {
    /// Shorthand for an extractor that was handed a match it cannot decompose
    pub fn extract(pattern: &'static str, reason: impl Into<String>) -> Self {
        HighlightError::Extract {
            pattern,
            reason: reason.into(),
        }
    }
}
