//! Document elements.
//!
//! An [`Element`] is a shared handle: cloning it yields another reference to
//! the same node, so identity survives fan-out to every load waiter. Use
//! [`Element::ptr_eq`] to compare identity.

use core::fmt;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Tag name of executable script elements.
pub const SCRIPT_TAG: &str = "script";

/// Tag name of stylesheet link elements.
pub const LINK_TAG: &str = "link";

struct ElementData {
    tag: String,
    attributes: RwLock<IndexMap<String, String>>,
}

/// A node in the host document.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementData>,
}

impl Element {
    /// Creates an element with the given tag name and no attributes.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ElementData {
                tag: tag.into(),
                attributes: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Creates the loadable element for a resource of the given kind.
    ///
    /// `link` elements reference their resource through `href` and are marked
    /// as stylesheets; every other kind uses `src`.
    #[must_use]
    pub fn loadable(kind: &str, url: &str) -> Self {
        let element = Self::new(kind);
        if kind == LINK_TAG {
            element.set_attribute("rel", "stylesheet");
            element.set_attribute("href", url);
        } else {
            element.set_attribute("src", url);
        }
        element
    }

    /// Sets an attribute and returns the element, for building.
    #[must_use]
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Returns the value of an attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attributes.read().get(name).cloned()
    }

    /// Returns whether the element carries the attribute.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner.attributes.read().contains_key(name)
    }

    /// Sets (or replaces) an attribute.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .attributes
            .write()
            .insert(name.into(), value.into());
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.inner.attributes.write().shift_remove(name)
    }

    /// Returns the URL this element loads (`src`, falling back to `href`).
    #[must_use]
    pub fn source(&self) -> Option<String> {
        self.attribute("src").or_else(|| self.attribute("href"))
    }

    /// Returns whether both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.inner.tag)
            .field("attributes", &*self.inner.attributes.read())
            .finish()
    }
}
