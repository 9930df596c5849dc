//! Dynamically typed module values.

use core::any::{Any, type_name};
use core::fmt;
use std::sync::Arc;

/// The value a module resolves to.
///
/// Values are cheap to clone and compare by identity: every dependent that
/// receives a module's value shares the same allocation. A value may be
/// `undefined` (a module defined without a factory, a `null` dependency slot,
/// or a global that was never set).
#[derive(Clone, Default)]
pub struct Value {
    inner: Option<Arc<dyn Any + Send + Sync>>,
    // Kept for `Debug`; `dyn Any` cannot name its own type.
    type_name: &'static str,
}

impl Value {
    /// Creates a value holding `value`.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
            type_name: type_name::<T>(),
        }
    }

    /// Creates an `undefined` value.
    #[must_use]
    pub fn undefined() -> Self {
        Self::default()
    }

    /// Returns whether this value is `undefined`.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns a reference to the held value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_deref()?.downcast_ref::<T>()
    }

    /// Returns whether the held value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Returns whether both values share the same allocation.
    ///
    /// Two `undefined` values are identical.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the Rust type name of the held value, or `"undefined"`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        if self.inner.is_some() {
            self.type_name
        } else {
            "undefined"
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            return f.write_str("Value(undefined)");
        }
        if let Some(s) = self.downcast_ref::<&'static str>() {
            return write!(f, "Value({s:?})");
        }
        if let Some(s) = self.downcast_ref::<String>() {
            return write!(f, "Value({s:?})");
        }
        if let Some(json) = self.downcast_ref::<serde_json::Value>() {
            return write!(f, "Value({json})");
        }
        write!(f, "Value(<{}>)", self.type_name)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::new(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_is_the_default() {
        let value = Value::default();
        assert!(value.is_undefined());
        assert_eq!(value.type_name(), "undefined");
        assert!(value.ptr_eq(&Value::undefined()));
    }

    #[test]
    fn downcasts_to_the_stored_type() {
        let value = Value::new(42_i32);
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
        assert!(value.downcast_ref::<u32>().is_none());
        assert!(value.is::<i32>());
    }

    #[test]
    fn clones_share_identity() {
        let value = Value::new(String::from("local"));
        let clone = value.clone();
        assert!(value.ptr_eq(&clone));
        assert!(!value.ptr_eq(&Value::new(String::from("local"))));
        assert!(!value.ptr_eq(&Value::undefined()));
    }

    #[test]
    fn debug_shows_common_payloads() {
        assert_eq!(format!("{:?}", Value::new("global")), r#"Value("global")"#);
        assert_eq!(
            format!("{:?}", Value::from(serde_json::json!({"an": "object"}))),
            r#"Value({"an":"object"})"#
        );
        assert_eq!(format!("{:?}", Value::undefined()), "Value(undefined)");
    }
}
