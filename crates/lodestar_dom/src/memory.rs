//! A deterministic, in-process [`Document`].
//!
//! [`MemoryDocument`] hosts resources by URL and queues every appended
//! element. Nothing loads until [`settle`](MemoryDocument::settle) is called;
//! it then drains the queue in insertion order, running hosted scripts
//! against a caller-supplied context before firing each completion.
//!
//! The context type `C` is whatever hosted scripts need to talk to. A module
//! loader passes itself, so scripts can register definitions:
//!
//! ```
//! use lodestar_dom::element::Element;
//! use lodestar_dom::document::{Document, LoadOutcome};
//! use lodestar_dom::memory::MemoryDocument;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let document = MemoryDocument::<AtomicUsize>::new();
//! document.serve("/count.js", |runs: &AtomicUsize| {
//!     runs.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! document.append(Element::loadable("script", "/count.js"), Box::new(|outcome: LoadOutcome| {
//!     assert!(outcome.is_ok());
//! }));
//!
//! let runs = AtomicUsize::new(0);
//! assert_eq!(document.settle(&runs), 1);
//! assert_eq!(runs.load(Ordering::SeqCst), 1);
//! ```

use crate::document::{Completion, Document, LoadEvent, Loaded, ResourceLoadError};
use crate::element::Element;
use core::fmt;
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;

/// Body of a hosted script.
pub type Script<C> = Arc<dyn Fn(&C) + Send + Sync>;

/// How a URL responds when loaded.
enum Hosted<C: 'static> {
    /// Runs the script, then fires `load`.
    Script(Script<C>),
    /// Fires `load` without running anything (stylesheets, images).
    Static,
    /// Fires `error` with the given reason.
    Failing(String),
}

impl<C: 'static> Clone for Hosted<C> {
    fn clone(&self) -> Self {
        match self {
            Hosted::Script(script) => Hosted::Script(Arc::clone(script)),
            Hosted::Static => Hosted::Static,
            Hosted::Failing(reason) => Hosted::Failing(reason.clone()),
        }
    }
}

struct QueuedLoad {
    element: Element,
    completion: Completion,
}

/// In-memory document host.
pub struct MemoryDocument<C: 'static = ()> {
    // Every element in the document, declarative and loadable.
    elements: RwLock<Vec<Element>>,
    hosted: RwLock<HashMap<String, Hosted<C>>>,
    queue: Mutex<VecDeque<QueuedLoad>>,
}

impl<C: 'static> Default for MemoryDocument<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> fmt::Debug for MemoryDocument<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("elements", &self.elements.read().len())
            .field("hosted", &self.hosted.read().keys().collect::<Vec<_>>())
            .field("queued", &self.queue.lock().len())
            .finish()
    }
}

impl<C: 'static> MemoryDocument<C> {
    /// Creates an empty document that hosts nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: RwLock::new(Vec::new()),
            hosted: RwLock::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Adds a non-loadable element, such as a declarative dependency map.
    pub fn insert(&self, element: Element) {
        self.elements.write().push(element);
    }

    /// Hosts a script at `url`. Loading it runs `script` with the settle context.
    pub fn serve(&self, url: impl Into<String>, script: impl Fn(&C) + Send + Sync + 'static) -> &Self {
        self.hosted
            .write()
            .insert(url.into(), Hosted::Script(Arc::new(script)));
        self
    }

    /// Hosts a resource at `url` that loads without running anything.
    pub fn serve_static(&self, url: impl Into<String>) -> &Self {
        self.hosted.write().insert(url.into(), Hosted::Static);
        self
    }

    /// Makes loads of `url` fail with `reason`.
    pub fn serve_error(&self, url: impl Into<String>, reason: impl Into<String>) -> &Self {
        self.hosted
            .write()
            .insert(url.into(), Hosted::Failing(reason.into()));
        self
    }

    /// Returns a snapshot of every element in the document.
    #[must_use]
    pub fn elements(&self) -> Vec<Element> {
        self.elements.read().clone()
    }

    /// Counts elements that load `url`.
    #[must_use]
    pub fn count_loadable(&self, url: &str) -> usize {
        self.elements
            .read()
            .iter()
            .filter(|element| element.source().as_deref() == Some(url))
            .count()
    }

    /// Removes every element that loads `url`, returning how many were removed.
    pub fn remove_loadable(&self, url: &str) -> usize {
        let mut elements = self.elements.write();
        let before = elements.len();
        elements.retain(|element| element.source().as_deref() != Some(url));
        before - elements.len()
    }

    /// Number of appended elements still waiting to settle.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    /// Settles queued loads in insertion order until the queue is empty.
    ///
    /// Loads appended while settling (for example by a script that requests
    /// another resource) are settled by the same call. Unhosted URLs fail
    /// with a "not found" error. Returns the number of loads settled.
    pub fn settle(&self, context: &C) -> usize {
        let mut settled = 0;
        loop {
            let Some(load) = self.queue.lock().pop_front() else {
                break;
            };
            let url = load.element.source().unwrap_or_default();
            let hosted = self.hosted.read().get(&url).cloned();

            let outcome = match hosted {
                Some(Hosted::Script(script)) => {
                    script(context);
                    Ok(Loaded {
                        element: load.element,
                        event: LoadEvent::load(url),
                    })
                }
                Some(Hosted::Static) => Ok(Loaded {
                    element: load.element,
                    event: LoadEvent::load(url),
                }),
                Some(Hosted::Failing(reason)) => {
                    Err(ResourceLoadError::new(url, reason, load.element))
                }
                None => Err(ResourceLoadError::new(url, "not found", load.element)),
            };

            (load.completion)(outcome);
            settled += 1;
        }
        settled
    }
}

impl<C: 'static> Document for MemoryDocument<C> {
    fn append(&self, element: Element, completion: Completion) {
        self.elements.write().push(element.clone());
        self.queue.lock().push_back(QueuedLoad {
            element,
            completion,
        });
    }

    fn elements_with_attribute(&self, name: &str) -> Vec<Element> {
        self.elements
            .read()
            .iter()
            .filter(|element| element.has_attribute(name))
            .cloned()
            .collect()
    }
}
