//! Arguments accepted by [`Loader::load`](crate::Loader::load).

use crate::error::LoaderError;
use crate::intercept::InterceptMap;

/// What to load.
#[derive(Debug, Clone)]
pub enum LoadTarget {
    /// Request each id or location.
    Ids(Vec<String>),
    /// Register the handlers, then request each of their ids.
    Intercept(InterceptMap),
    /// Discover declarations in the document and request all of them.
    Discover,
}

/// Conversion into a [`LoadTarget`].
pub trait IntoLoadTarget {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidIdentifier`] for JSON values that are not
    /// a string, an array of strings, or an object.
    fn into_load_target(self) -> Result<LoadTarget, LoaderError>;
}

impl IntoLoadTarget for LoadTarget {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Ok(self)
    }
}

impl IntoLoadTarget for () {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Ok(LoadTarget::Discover)
    }
}

impl IntoLoadTarget for &str {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Ok(LoadTarget::Ids(vec![self.to_string()]))
    }
}

impl IntoLoadTarget for String {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Ok(LoadTarget::Ids(vec![self]))
    }
}

impl IntoLoadTarget for Vec<&str> {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Ok(LoadTarget::Ids(self.into_iter().map(str::to_string).collect()))
    }
}

impl IntoLoadTarget for Vec<String> {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Ok(LoadTarget::Ids(self))
    }
}

impl<const N: usize> IntoLoadTarget for [&str; N] {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Vec::from(self).into_load_target()
    }
}

impl IntoLoadTarget for InterceptMap {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        Ok(LoadTarget::Intercept(self))
    }
}

impl IntoLoadTarget for serde_json::Value {
    fn into_load_target(self) -> Result<LoadTarget, LoaderError> {
        use serde_json::Value as Json;

        match self {
            Json::String(id) => Ok(LoadTarget::Ids(vec![id])),
            Json::Array(entries) => entries
                .into_iter()
                .map(|entry| match entry {
                    Json::String(id) => Ok(id),
                    other => Err(LoaderError::invalid_identifier(format!(
                        "load targets must be strings, got {other}"
                    ))),
                })
                .collect::<Result<_, _>>()
                .map(LoadTarget::Ids),
            Json::Object(map) => Ok(LoadTarget::Ids(map.into_iter().map(|(id, _)| id).collect())),
            other => Err(LoaderError::invalid_identifier(format!(
                "only strings, arrays and objects can be loaded, got {other}"
            ))),
        }
    }
}
