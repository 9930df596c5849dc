//! The [`Document`] trait and load signaling.
//!
//! A document accepts loadable elements and reports, exactly once per
//! element, whether the referenced resource loaded or failed. Hosts decide
//! when that happens: a browser-like host fires it from its event loop, the
//! [`MemoryDocument`](crate::memory::MemoryDocument) fires it from
//! [`settle`](crate::memory::MemoryDocument::settle).

use crate::element::Element;

/// Whether a load event reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEventKind {
    /// The resource finished loading (and, for scripts, executing).
    Load,
    /// The resource could not be fetched or parsed.
    Error,
}

/// The event a document fires when a loadable element settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEvent {
    /// Success or failure.
    pub kind: LoadEventKind,
    /// The URL the element referenced.
    pub url: String,
}

impl LoadEvent {
    /// Creates a successful load event.
    #[must_use]
    pub fn load(url: impl Into<String>) -> Self {
        Self {
            kind: LoadEventKind::Load,
            url: url.into(),
        }
    }

    /// Creates a failed load event.
    #[must_use]
    pub fn error(url: impl Into<String>) -> Self {
        Self {
            kind: LoadEventKind::Error,
            url: url.into(),
        }
    }
}

/// A successfully loaded element together with its load event.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// The inserted element.
    pub element: Element,
    /// The `load` event.
    pub event: LoadEvent,
}

/// A resource failed to load.
///
/// Carries the inserted element and the partial `error` event so intercept
/// handlers can inspect what was attempted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to load '{url}': {reason}")]
pub struct ResourceLoadError {
    /// The URL that failed.
    pub url: String,
    /// Human-readable failure reason.
    pub reason: String,
    /// The inserted element.
    pub element: Element,
    /// The `error` event.
    pub event: LoadEvent,
}

impl ResourceLoadError {
    /// Creates a load error for an element.
    #[must_use]
    pub fn new(url: impl Into<String>, reason: impl Into<String>, element: Element) -> Self {
        let url = url.into();
        Self {
            event: LoadEvent::error(url.clone()),
            url,
            reason: reason.into(),
            element,
        }
    }
}

/// Result of loading one element.
pub type LoadOutcome = Result<Loaded, ResourceLoadError>;

/// Single-shot callback a document invokes when an appended element settles.
pub type Completion = Box<dyn FnOnce(LoadOutcome) + Send>;

/// A hosting document.
///
/// Implementations must invoke each [`Completion`] exactly once and must not
/// hold internal locks while doing so: completions re-enter the loader, which
/// may append further elements.
pub trait Document: Send + Sync + 'static {
    /// Inserts a loadable element and arranges for `completion` to run once
    /// the referenced resource settles.
    fn append(&self, element: Element, completion: Completion);

    /// Returns every element carrying the attribute, in document order.
    fn elements_with_attribute(&self, name: &str) -> Vec<Element>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_carries_partial_event() {
        let element = Element::loadable("script", "/missing.js");
        let error = ResourceLoadError::new("/missing.js", "not found", element.clone());

        assert_eq!(error.event.kind, LoadEventKind::Error);
        assert_eq!(error.event.url, "/missing.js");
        assert!(error.element.ptr_eq(&element));
        assert_eq!(error.to_string(), "failed to load '/missing.js': not found");
    }
}
