use crate::engine::backend::EngineVariant;

/// Convenience result type used across imgcmp.
pub type ImgcmpResult<T> = Result<T, ImgcmpError>;

/// Top-level error taxonomy used by the comparator APIs.
#[derive(thiserror::Error, Debug)]
pub enum ImgcmpError {
    /// Source MIME type is outside the accepted allow-set.
    #[error("unsupported mime type: {0}")]
    UnsupportedMimeType(String),

    /// A transcoding engine could not be probed or instantiated.
    #[error("engine load failed: {variant}: {reason}")]
    EngineLoadFailed {
        /// Variant whose load failed.
        variant: EngineVariant,
        /// Human readable cause reported by the loader.
        reason: String,
    },

    /// Source bytes could not be materialized.
    #[error("read error: {0}")]
    ReadError(String),

    /// The engine reported a failure for a single transcode.
    #[error("transcode failed: {0}")]
    TranscodeFailed(String),

    /// Invalid user-provided parameters or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImgcmpError {
    /// Build a [`ImgcmpError::UnsupportedMimeType`] value.
    pub fn unsupported_mime(mime: impl Into<String>) -> Self {
        Self::UnsupportedMimeType(mime.into())
    }

    /// Build a [`ImgcmpError::EngineLoadFailed`] value.
    pub fn engine_load(variant: EngineVariant, reason: impl Into<String>) -> Self {
        Self::EngineLoadFailed {
            variant,
            reason: reason.into(),
        }
    }

    /// Build a [`ImgcmpError::ReadError`] value.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::ReadError(msg.into())
    }

    /// Build a [`ImgcmpError::TranscodeFailed`] value.
    pub fn transcode(msg: impl Into<String>) -> Self {
        Self::TranscodeFailed(msg.into())
    }

    /// Build a [`ImgcmpError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` when retrying the same request may succeed without user changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EngineLoadFailed { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
