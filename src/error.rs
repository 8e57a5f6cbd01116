//! Crate-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the
//! CLI uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum
//! - Module-specific errors ([`TagReadError`], [`ResolverError`], [`ConfigError`]) for detailed handling
//! - [`FailureReason`]: the short classification recorded on a failed extraction
//!
//! [`ResolverError`]: crate::resolver::ResolverError
//! [`ConfigError`]: crate::config::ConfigError

use std::fmt;

pub use crate::tags::TagReadError;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag parsing error
    #[error("Tag error: {0}")]
    Tag(#[from] TagReadError),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A blocking worker task panicked or was cancelled
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Short, stable name of the failing error kind, used when classifying
    /// an extraction failure that is neither corrupt nor unsupported.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Io(_) => "Io",
            Self::Tag(e) => e.kind_name(),
            Self::Image(_) => "Image",
            Self::TaskJoin(_) => "TaskJoin",
            Self::WithContext { source, .. } => source.kind_name(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskJoin(e.to_string())
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

/// Why an extraction did not complete.
///
/// Rendered with [`fmt::Display`] into the `error_message` of a failed
/// [`SongFileMetadata`](crate::model::SongFileMetadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Tag container present but structurally unreadable
    CorruptFile,
    /// Container or codec not recognized at all
    UnsupportedFormat,
    /// Anything else, named by the failing error kind
    Other(String),
}

impl From<&Error> for FailureReason {
    fn from(err: &Error) -> Self {
        match err {
            Error::Tag(TagReadError::CorruptFile(_)) => Self::CorruptFile,
            Error::Tag(TagReadError::UnsupportedFormat(_)) => Self::UnsupportedFormat,
            Error::WithContext { source, .. } => Self::from(source.as_ref()),
            other => Self::Other(other.kind_name().to_string()),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptFile => f.write_str("CorruptFile"),
            Self::UnsupportedFormat => f.write_str("UnsupportedFormat"),
            Self::Other(name) => f.write_str(name),
        }
    }
}
