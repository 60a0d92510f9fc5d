/// Convenience result type used across multipaste.
pub type PasteResult<T> = Result<T, PasteError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Every variant aborts the whole batch: nothing is retried and no partially composited output
/// is produced.
#[derive(thiserror::Error, Debug)]
pub enum PasteError {
    /// Inconsistent batch shapes, paste geometry or grid layout.
    #[error("validation error: {0}")]
    Validation(String),

    /// Element type (or type pair) outside the supported set.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Scratch storage smaller than the planned requirement.
    #[error("resource error: {0}")]
    Resource(String),

    /// Errors when serializing or deserializing batch arguments.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PasteError {
    /// Build a [`PasteError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PasteError::Validation`] value tagged with the failing sample index.
    pub fn at_sample(sample: usize, msg: impl std::fmt::Display) -> Self {
        Self::Validation(format!("sample {sample}: {msg}"))
    }

    /// Build a [`PasteError::UnsupportedType`] value.
    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Build a [`PasteError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`PasteError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
