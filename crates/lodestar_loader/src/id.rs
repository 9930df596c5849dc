//! Module identifiers.

use crate::error::LoaderError;
use core::borrow::Borrow;
use core::fmt;
use std::sync::Arc;

/// A validated module id.
///
/// Any non-blank string without control characters is a valid id, including
/// ids with spaces or punctuation (`"entry: main"`) and resource locations
/// used as aliases (`"http://localhost/a.js"`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    /// Validates and wraps an id.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidIdentifier`] if the id is empty, blank,
    /// or contains control characters.
    pub fn parse(id: &str) -> Result<Self, LoaderError> {
        if id.trim().is_empty() {
            return Err(LoaderError::invalid_identifier(format!(
                "module ids must be non-empty strings, got {id:?}"
            )));
        }
        if id.chars().any(char::is_control) {
            return Err(LoaderError::invalid_identifier(format!(
                "module ids must not contain control characters, got {id:?}"
            )));
        }
        Ok(Self(Arc::from(id)))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({:?})", &*self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Conversion into a [`ModuleId`], validating on the way.
///
/// Implemented for string types and for JSON values, so ids arriving from
/// dynamic sources (markup, configuration) fail the same way as bad literals.
pub trait IntoModuleId {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidIdentifier`] for anything that is not a
    /// valid id string.
    fn into_module_id(self) -> Result<ModuleId, LoaderError>;
}

impl IntoModuleId for ModuleId {
    fn into_module_id(self) -> Result<ModuleId, LoaderError> {
        Ok(self)
    }
}

impl IntoModuleId for &ModuleId {
    fn into_module_id(self) -> Result<ModuleId, LoaderError> {
        Ok(self.clone())
    }
}

impl IntoModuleId for &str {
    fn into_module_id(self) -> Result<ModuleId, LoaderError> {
        ModuleId::parse(self)
    }
}

impl IntoModuleId for String {
    fn into_module_id(self) -> Result<ModuleId, LoaderError> {
        ModuleId::parse(&self)
    }
}

impl IntoModuleId for &String {
    fn into_module_id(self) -> Result<ModuleId, LoaderError> {
        ModuleId::parse(self)
    }
}

impl IntoModuleId for &serde_json::Value {
    fn into_module_id(self) -> Result<ModuleId, LoaderError> {
        match self {
            serde_json::Value::String(id) => ModuleId::parse(id),
            other => Err(LoaderError::invalid_identifier(format!(
                "module ids must be strings, got {other}"
            ))),
        }
    }
}

impl IntoModuleId for serde_json::Value {
    fn into_module_id(self) -> Result<ModuleId, LoaderError> {
        (&self).into_module_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_ids_with_spaces_and_punctuation() {
        for id in ["a", "entry: main", "load using default handler", "/url", "http://localhost/a.js"] {
            assert_eq!(ModuleId::parse(id).map(|id| id.to_string()), Ok(id.to_string()));
        }
    }

    #[test]
    fn rejects_blank_and_control_ids() {
        for id in ["", "   ", "a\nb", "\t"] {
            assert!(matches!(
                ModuleId::parse(id),
                Err(LoaderError::InvalidIdentifier(_))
            ));
        }
    }

    #[test]
    fn rejects_non_string_json() {
        for value in [json!(false), json!(null), json!(0), json!(["a"]), json!({"a": 1})] {
            assert!(matches!(
                value.into_module_id(),
                Err(LoaderError::InvalidIdentifier(_))
            ));
        }
        assert_eq!(
            json!("x").into_module_id().map(|id| id.to_string()),
            Ok("x".to_string())
        );
    }
}
