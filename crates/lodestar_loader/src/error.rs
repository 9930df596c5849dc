//! Error types for the loader.

/// Errors raised synchronously by [`Loader`](crate::Loader) operations.
///
/// Resource failures are not part of this enum: they are delivered to
/// intercept handlers as [`ResourceLoadError`](lodestar_dom::ResourceLoadError)
/// and otherwise leave dependents pending.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    /// A module id is not a valid identifier, or a load target is neither a
    /// known id nor a registered location.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A dependency argument has an unsupported shape.
    #[error("invalid dependency list: {0}")]
    InvalidDependencyList(String),

    /// The loader configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LoaderError {
    /// Creates an [`InvalidIdentifier`](Self::InvalidIdentifier).
    pub fn invalid_identifier(what: impl Into<String>) -> Self {
        Self::InvalidIdentifier(what.into())
    }

    /// Creates an [`InvalidDependencyList`](Self::InvalidDependencyList).
    pub fn invalid_dependencies(what: impl Into<String>) -> Self {
        Self::InvalidDependencyList(what.into())
    }
}
