//! Domain error taxonomy.
//!
//! A single `Error` enum shared by every layer below the composition root. Application
//! and infrastructure code propagates this with `?`; `anyhow` is reserved for the root
//! facade crate where errors are reported to a human rather than matched on.

/// Result alias using the domain [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by domain ports and application use-cases.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input failed validation before any I/O was attempted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A knowledge base or job already exists under the given key.
    #[error("already exists: {0}")]
    Conflict(String),

    /// A configured provider could not be reached or returned a transport-level failure.
    #[error("provider unavailable: {0}")]
    ServiceUnavailable(String),

    /// A provider call completed but returned a result this code cannot use.
    #[error("provider error: {0}")]
    Provider(String),

    /// Reading or parsing a content source failed.
    #[error("content read failed: {0}")]
    ContentRead(String),

    /// The underlying vector store rejected an operation.
    #[error("store error: {0}")]
    Store(String),

    /// A job or queue operation hit a capacity limit.
    #[error("queue full: {0}")]
    QueueFull(String),

    /// The operation was cancelled cooperatively.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Wraps a lower-level I/O failure with added context.
    #[error("io error: {0}: {1}")]
    Io(String, #[source] std::io::Error),

    /// Catch-all for errors from dependencies that don't map onto a more specific variant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a [`Error::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`Error::Conflict`].
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Build a [`Error::ServiceUnavailable`].
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// Build a [`Error::Provider`], preserving the causing message as-is.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Build a [`Error::ContentRead`].
    pub fn content_read(msg: impl Into<String>) -> Self {
        Self::ContentRead(msg.into())
    }

    /// Build a [`Error::Store`].
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Build a [`Error::QueueFull`].
    pub fn queue_full(msg: impl Into<String>) -> Self {
        Self::QueueFull(msg.into())
    }

    /// Build a [`Error::Cancelled`].
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Build a [`Error::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap an [`std::io::Error`] with a context string.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io(context.into(), source)
    }

    /// True if retrying the same operation without changing inputs might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::QueueFull(_))
    }
}
