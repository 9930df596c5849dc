//! Factories and dependency lists.
//!
//! A definition pairs a [`Factory`] with its [`Dependencies`]. The factory is
//! either callable, receiving each dependency's value positionally, or a
//! literal registered as-is.

use crate::error::LoaderError;
use crate::id::ModuleId;
use crate::value::Value;
use core::any::Any;
use core::fmt;

/// Boxed callable factory.
pub type FactoryFn = Box<dyn FnOnce(Vec<Value>) -> Value + Send>;

/// What a module definition produces.
pub enum Factory {
    /// Invoked once with the resolved dependency values, in declared order.
    /// Its return value becomes the module's value.
    Callable(FactoryFn),
    /// Registered directly without invocation.
    Literal(Value),
}

impl Factory {
    /// Creates a callable factory.
    ///
    /// # Example
    ///
    /// ```
    /// use lodestar_loader::{Factory, Value};
    ///
    /// let double = Factory::call(|args| {
    ///     let n = args[0].downcast_ref::<i32>().copied().unwrap_or_default();
    ///     Value::new(n * 2)
    /// });
    /// assert!(double.is_callable());
    /// ```
    #[must_use]
    pub fn call(f: impl FnOnce(Vec<Value>) -> Value + Send + 'static) -> Self {
        Factory::Callable(Box::new(f))
    }

    /// Creates a literal factory holding `value`.
    #[must_use]
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Factory::Literal(Value::new(value))
    }

    /// Creates a literal factory that defines the module as `undefined`.
    #[must_use]
    pub fn undefined() -> Self {
        Factory::Literal(Value::undefined())
    }

    /// Returns whether the factory will be invoked.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Factory::Callable(_))
    }

    /// Produces the module value from the resolved dependency values.
    pub(crate) fn resolve(self, args: Vec<Value>) -> Value {
        match self {
            Factory::Callable(f) => f(args),
            Factory::Literal(value) => value,
        }
    }
}

impl Default for Factory {
    fn default() -> Self {
        Factory::undefined()
    }
}

impl From<Value> for Factory {
    fn from(value: Value) -> Self {
        Factory::Literal(value)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factory::Callable(_) => f.write_str("Factory::Callable(..)"),
            Factory::Literal(value) => f.debug_tuple("Factory::Literal").field(value).finish(),
        }
    }
}

/// An ordered dependency list.
///
/// `None` slots come from `null` entries: they never block and surface as
/// `undefined` to the factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies(Vec<Option<ModuleId>>);

impl Dependencies {
    /// An empty list.
    #[must_use]
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Returns the slots in declared order.
    #[must_use]
    pub fn slots(&self) -> &[Option<ModuleId>] {
        &self.0
    }

    /// Iterates over the non-null ids.
    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.0.iter().flatten()
    }

    /// Number of slots, including null ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn dependency_id(id: &str) -> Result<ModuleId, LoaderError> {
    ModuleId::parse(id)
        .map_err(|_| LoaderError::invalid_dependencies(format!("{id:?} is not a valid module id")))
}

/// Conversion into [`Dependencies`].
///
/// Accepted shapes: nothing (`()`), `None`, a single id, or a sequence of
/// ids (with optional `null` slots). JSON values follow the same rules:
/// `null`, a string, an array of strings and `null`s, or an object whose
/// keys are the ids in declared order.
pub trait IntoDependencies {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidDependencyList`] for unsupported shapes
    /// or entries that are not valid ids.
    fn into_dependencies(self) -> Result<Dependencies, LoaderError>;
}

impl IntoDependencies for Dependencies {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        Ok(self)
    }
}

impl IntoDependencies for () {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        Ok(Dependencies::none())
    }
}

impl IntoDependencies for Option<&str> {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        match self {
            Some(id) => id.into_dependencies(),
            None => Ok(Dependencies::none()),
        }
    }
}

impl IntoDependencies for &str {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        Ok(Dependencies(vec![Some(dependency_id(self)?)]))
    }
}

impl IntoDependencies for String {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        self.as_str().into_dependencies()
    }
}

impl IntoDependencies for Vec<&str> {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        self.into_iter()
            .map(|id| dependency_id(id).map(Some))
            .collect::<Result<_, _>>()
            .map(Dependencies)
    }
}

impl IntoDependencies for Vec<String> {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        self.iter()
            .map(|id| dependency_id(id).map(Some))
            .collect::<Result<_, _>>()
            .map(Dependencies)
    }
}

impl IntoDependencies for Vec<Option<&str>> {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        self.into_iter()
            .map(|slot| slot.map(dependency_id).transpose())
            .collect::<Result<_, _>>()
            .map(Dependencies)
    }
}

impl<const N: usize> IntoDependencies for [&str; N] {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        Vec::from(self).into_dependencies()
    }
}

impl<const N: usize> IntoDependencies for [Option<&str>; N] {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        Vec::from(self).into_dependencies()
    }
}

impl IntoDependencies for serde_json::Value {
    fn into_dependencies(self) -> Result<Dependencies, LoaderError> {
        use serde_json::Value as Json;

        match self {
            Json::Null => Ok(Dependencies::none()),
            Json::String(id) => id.into_dependencies(),
            Json::Array(entries) => entries
                .into_iter()
                .map(|entry| match entry {
                    Json::Null => Ok(None),
                    Json::String(id) => dependency_id(&id).map(Some),
                    other => Err(LoaderError::invalid_dependencies(format!(
                        "dependency ids must be strings or null, got {other}"
                    ))),
                })
                .collect::<Result<_, _>>()
                .map(Dependencies),
            // Keys in declared order; the values are ignored.
            Json::Object(map) => map
                .keys()
                .map(|id| dependency_id(id).map(Some))
                .collect::<Result<_, _>>()
                .map(Dependencies),
            other => Err(LoaderError::invalid_dependencies(format!(
                "expected null, a string, an array or an object, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slots(deps: &Dependencies) -> Vec<Option<&str>> {
        deps.slots()
            .iter()
            .map(|slot| slot.as_ref().map(ModuleId::as_str))
            .collect()
    }

    #[test]
    fn literal_factories_ignore_arguments() {
        let value = Factory::value(7_u8).resolve(vec![Value::new("ignored")]);
        assert_eq!(value.downcast_ref::<u8>(), Some(&7));
        assert!(Factory::default().resolve(Vec::new()).is_undefined());
    }

    #[test]
    fn callable_factories_receive_arguments_in_order() {
        let factory = Factory::call(|args| {
            let joined: Vec<&str> = args
                .iter()
                .map(|v| v.downcast_ref::<&str>().copied().unwrap_or("?"))
                .collect();
            Value::new(joined.join(","))
        });
        let value = factory.resolve(vec![Value::new("a"), Value::undefined(), Value::new("c")]);
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("a,?,c"));
    }

    #[test]
    fn accepts_every_supported_shape() {
        assert!(().into_dependencies().map(|d| d.is_empty()).unwrap_or(false));
        assert!(None::<&str>.into_dependencies().map(|d| d.is_empty()).unwrap_or(false));

        let single = "index".into_dependencies().expect("single id");
        assert_eq!(slots(&single), [Some("index")]);

        let list = ["a", "b"].into_dependencies().expect("array");
        assert_eq!(slots(&list), [Some("a"), Some("b")]);

        let with_null = vec![None, Some("a")].into_dependencies().expect("nullable list");
        assert_eq!(slots(&with_null), [None, Some("a")]);
        assert_eq!(with_null.ids().count(), 1);
    }

    #[test]
    fn json_shapes() {
        assert!(json!(null).into_dependencies().map(|d| d.is_empty()).unwrap_or(false));

        let list = json!(["a", null]).into_dependencies().expect("array");
        assert_eq!(slots(&list), [Some("a"), None]);

        let keyed = json!({"z": null, "a": "ignored"}).into_dependencies().expect("object");
        assert_eq!(slots(&keyed), [Some("z"), Some("a")]);

        for bad in [json!(0), json!(false), json!({"": 1}), json!([1]), json!([""])] {
            assert!(matches!(
                bad.into_dependencies(),
                Err(LoaderError::InvalidDependencyList(_))
            ));
        }
    }

    #[test]
    fn blank_ids_are_invalid_dependencies() {
        assert!(matches!(
            "".into_dependencies(),
            Err(LoaderError::InvalidDependencyList(_))
        ));
    }
}
