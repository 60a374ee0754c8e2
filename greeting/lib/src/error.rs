use std::path::PathBuf;

/// Error types for the greeting library.
#[derive(Debug, thiserror::Error)]
pub enum GreetingError {
    /// Writing to the output stream failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file could not be read.
    #[error("Failed to read source '{}': {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parser reached a character no token rule recognizes.
    ///
    /// `line` and `column` are 1-based.
    #[error("Invalid character '{ch}' at line {line}, column {column}")]
    InvalidCharacter { ch: char, line: usize, column: usize },

    /// A token other than the one the grammar requires.
    #[error("Expected {expected} but found '{found}' at line {line}, column {column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    /// Input ended in the middle of a construct.
    #[error("Expected {expected} but reached end of input")]
    UnexpectedEnd { expected: String },

    /// Valid Java that the Python generator has no translation for.
    #[error("Cannot translate {construct} at line {line}, column {column}")]
    Untranslatable {
        construct: String,
        line: usize,
        column: usize,
    },
}

/// Convenience Result type for greeting operations.
pub type Result<T> = std::result::Result<T, GreetingError>;
