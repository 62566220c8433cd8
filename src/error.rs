use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the mdbook-stitch library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Directory could not be listed.
    #[error("Cannot read directory '{path}': {message}")]
    ReadDir {
        /// Directory that failed to list
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The target file has more fenced regions than the reference has blocks.
    #[error(
        "Fenced region #{region} in '{path}' has no replacement: reference provides only {available} code block(s)"
    )]
    BlocksExhausted {
        /// File being patched
        path: PathBuf,
        /// 1-based number of the region that had no replacement
        region: usize,
        /// Number of blocks extracted from the reference
        available: usize,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Invalid UTF-8 encountered in file.
    #[error("Invalid UTF-8 encoding in file '{path}'. File may be binary or use unsupported encoding.")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    ///
    /// `InvalidData` errors raised while decoding lines are reported as
    /// [`Error::InvalidUtf8`].
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::InvalidData {
            return Self::invalid_utf8(path);
        }
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a directory listing error.
    #[must_use]
    pub fn read_dir(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ReadDir {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a blocks exhausted error for the given 1-based region.
    #[must_use]
    pub fn blocks_exhausted(path: impl Into<PathBuf>, region: usize, available: usize) -> Self {
        Self::BlocksExhausted {
            path: path.into(),
            region,
            available,
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if the splicer ran out of reference blocks.
    #[must_use]
    pub const fn is_blocks_exhausted(&self) -> bool {
        matches!(self, Self::BlocksExhausted { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
