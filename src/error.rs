use std::path::PathBuf;
use thiserror::Error;

use crate::parser::ParseError;

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error at {0}")]
    Parse(#[from] ParseError),

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config { message: message.into() }
    }

    /// The parse error behind this error, if any
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for crate-level operations
pub type Result<T> = std::result::Result<T, Error>;
