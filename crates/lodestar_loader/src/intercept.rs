//! Intercept handlers.
//!
//! By default a loaded resource either defines its module itself or is
//! picked up from a registered global. An intercept handler replaces that
//! default for one id: it runs when the resource settles, successfully or
//! not, and decides whether (and how) to call [`Loader::define`].
//!
//! A handler that never defines its id leaves every dependent of that id
//! pending. That is not an error.

use crate::id::ModuleId;
use crate::registry::Loader;
use core::fmt;
use indexmap::IndexMap;
use lodestar_dom::document::{LoadEvent, ResourceLoadError};
use lodestar_dom::element::Element;
use std::sync::Arc;

/// What an intercept handler learns about the settled resource.
#[derive(Debug, Clone)]
pub struct LoadData {
    /// The `load` or `error` event.
    pub event: LoadEvent,
    /// The URL that was loaded, as registered.
    pub url: String,
    /// The module id the resource was loaded for.
    pub id: ModuleId,
    /// The inserted element.
    pub element: Element,
}

/// Callback run in place of the default load behavior.
///
/// Receives the loader (to call `define`), the load error if the resource
/// failed, and the [`LoadData`].
pub type InterceptHandler =
    Arc<dyn Fn(&Loader, Option<&ResourceLoadError>, &LoadData) + Send + Sync>;

/// Handlers keyed by module id, in registration order.
#[derive(Clone, Default)]
pub struct InterceptMap {
    handlers: IndexMap<String, InterceptHandler>,
}

impl InterceptMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for `id`, replacing any previous one.
    ///
    /// # Example
    ///
    /// ```
    /// use lodestar_loader::{Factory, InterceptMap};
    ///
    /// let handlers = InterceptMap::new().on("css", |loader, _error, data| {
    ///     // Stylesheets define nothing; mark the id as resolved.
    ///     let _ = loader.define(&data.id, (), Factory::undefined());
    /// });
    /// assert_eq!(handlers.ids().collect::<Vec<_>>(), ["css"]);
    /// ```
    #[must_use]
    pub fn on(
        mut self,
        id: impl Into<String>,
        handler: impl Fn(&Loader, Option<&ResourceLoadError>, &LoadData) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(id.into(), Arc::new(handler));
        self
    }

    /// Iterates over the ids with handlers.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl IntoIterator for InterceptMap {
    type Item = (String, InterceptHandler);
    type IntoIter = indexmap::map::IntoIter<String, InterceptHandler>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.into_iter()
    }
}

impl fmt::Debug for InterceptMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptMap")
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}
