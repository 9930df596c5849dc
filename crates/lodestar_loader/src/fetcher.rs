//! The resource fetcher.
//!
//! Inserts one loadable element per unique location into the [`Document`]
//! and fans its single completion out to every waiter. Waiters registered
//! after completion are answered immediately with the cached outcome.
//!
//! Two kinds of waiter exist:
//!
//! - callbacks ([`ResourceFetcher::fetch_with`]), run synchronously inside
//!   the document's completion, which is what the registry uses so that
//!   definitions made by a loaded resource are visible before the load event
//!   returns;
//! - futures ([`ResourceFetcher::fetch`]), backed by a `oneshot` channel.

use crate::location::ResourceLocation;
use futures::FutureExt;
use futures::future::BoxFuture;
use hashbrown::HashMap;
use lodestar_dom::document::{Document, LoadOutcome, ResourceLoadError};
use lodestar_dom::element::Element;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;

/// Lifecycle of a resource location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Never fetched.
    NotRequested,
    /// Inserted, waiting for the document to report completion.
    Requesting,
    /// Loaded successfully.
    Loaded,
    /// Failed to load.
    Errored,
}

enum Waiter {
    Callback(Box<dyn FnOnce(&LoadOutcome) + Send>),
    Channel(oneshot::Sender<LoadOutcome>),
}

impl Waiter {
    fn notify(self, outcome: &LoadOutcome) {
        match self {
            Waiter::Callback(callback) => callback(outcome),
            Waiter::Channel(sender) => {
                // The receiver may have been dropped; nothing to tell then.
                let _ = sender.send(outcome.clone());
            }
        }
    }
}

enum RecordState {
    Requesting(Vec<Waiter>),
    Settled(LoadOutcome),
}

struct ResourceRecord {
    element: Element,
    // Distinguishes records across `reset()`, so stale completions are ignored.
    ticket: u64,
    state: RecordState,
}

struct FetcherShared {
    document: Arc<dyn Document>,
    records: Mutex<HashMap<String, ResourceRecord>>,
    next_ticket: AtomicU64,
}

impl FetcherShared {
    fn settle(&self, key: &str, ticket: u64, outcome: LoadOutcome) {
        let waiters = {
            let mut records = self.records.lock();
            let Some(record) = records.get_mut(key) else {
                return;
            };
            if record.ticket != ticket {
                return;
            }
            match core::mem::replace(&mut record.state, RecordState::Settled(outcome.clone())) {
                RecordState::Requesting(waiters) => waiters,
                RecordState::Settled(previous) => {
                    // Documents complete each element once; keep the first outcome.
                    record.state = RecordState::Settled(previous);
                    return;
                }
            }
        };

        match &outcome {
            Ok(_) => tracing::debug!(location = key, waiters = waiters.len(), "resource loaded"),
            Err(error) => {
                tracing::debug!(location = key, waiters = waiters.len(), %error, "resource failed");
            }
        }

        for waiter in waiters {
            waiter.notify(&outcome);
        }
    }
}

/// Deduplicating resource fetcher over a [`Document`].
///
/// Cloning yields another handle to the same records.
#[derive(Clone)]
pub struct ResourceFetcher {
    shared: Arc<FetcherShared>,
}

impl core::fmt::Debug for ResourceFetcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceFetcher")
            .field("records", &self.shared.records.lock().len())
            .finish()
    }
}

impl ResourceFetcher {
    /// Creates a fetcher that inserts elements into `document`.
    #[must_use]
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            shared: Arc::new(FetcherShared {
                document,
                records: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
            }),
        }
    }

    /// Fetches `location`, running `callback` once it settles.
    ///
    /// If the location is already settled the callback runs before this
    /// returns. Returns `true` if this call inserted the element.
    pub fn fetch_with(
        &self,
        location: &ResourceLocation,
        callback: impl FnOnce(&LoadOutcome) + Send + 'static,
    ) -> bool {
        self.enqueue(location, Waiter::Callback(Box::new(callback)))
    }

    /// Fetches `location`, resolving once it settles.
    ///
    /// If the fetcher is reset before the resource settles, the future
    /// resolves with an error.
    pub fn fetch(&self, location: &ResourceLocation) -> BoxFuture<'static, LoadOutcome> {
        let (sender, receiver) = oneshot::channel();
        self.enqueue(location, Waiter::Channel(sender));

        let location = location.clone();
        async move {
            receiver.await.unwrap_or_else(|_| {
                Err(ResourceLoadError::new(
                    location.url(),
                    "request abandoned",
                    location.element(),
                ))
            })
        }
        .boxed()
    }

    /// Returns the status of `location`.
    #[must_use]
    pub fn status(&self, location: &ResourceLocation) -> ResourceStatus {
        match self.shared.records.lock().get(&location.key()) {
            None => ResourceStatus::NotRequested,
            Some(record) => match &record.state {
                RecordState::Requesting(_) => ResourceStatus::Requesting,
                RecordState::Settled(Ok(_)) => ResourceStatus::Loaded,
                RecordState::Settled(Err(_)) => ResourceStatus::Errored,
            },
        }
    }

    /// Returns the element inserted for `location`.
    #[must_use]
    pub fn element(&self, location: &ResourceLocation) -> Option<Element> {
        self.shared
            .records
            .lock()
            .get(&location.key())
            .map(|record| record.element.clone())
    }

    /// Number of locations ever inserted since the last reset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.records.lock().len()
    }

    /// Returns whether nothing has been inserted since the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every record. Pending future waiters resolve with an error;
    /// pending callbacks are dropped.
    pub fn reset(&self) {
        let records = core::mem::take(&mut *self.shared.records.lock());
        drop(records);
    }

    fn enqueue(&self, location: &ResourceLocation, waiter: Waiter) -> bool {
        let key = location.key();
        let mut records = self.shared.records.lock();

        if let Some(record) = records.get_mut(&key) {
            match &mut record.state {
                RecordState::Requesting(waiters) => waiters.push(waiter),
                RecordState::Settled(outcome) => {
                    let outcome = outcome.clone();
                    drop(records);
                    waiter.notify(&outcome);
                }
            }
            return false;
        }

        let element = location.element();
        let ticket = self.shared.next_ticket.fetch_add(1, Ordering::Relaxed);
        records.insert(
            key.clone(),
            ResourceRecord {
                element: element.clone(),
                ticket,
                state: RecordState::Requesting(vec![waiter]),
            },
        );
        drop(records);

        tracing::debug!(location = %location, "inserting resource element");

        // The document owns the completion; a strong handle would keep the
        // fetcher alive through the document it owns.
        let shared = Arc::downgrade(&self.shared);
        self.shared.document.append(
            element,
            Box::new(move |outcome| {
                if let Some(shared) = shared.upgrade() {
                    shared.settle(&key, ticket, outcome);
                }
            }),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_dom::memory::MemoryDocument;
    use std::sync::atomic::AtomicUsize;

    fn location(raw: &str) -> ResourceLocation {
        ResourceLocation::parse(raw, "script").expect("valid location")
    }

    fn setup() -> (Arc<MemoryDocument>, ResourceFetcher) {
        let document = Arc::new(MemoryDocument::new());
        let fetcher = ResourceFetcher::new(document.clone());
        (document, fetcher)
    }

    #[test]
    fn concurrent_requests_share_one_element() {
        let (document, fetcher) = setup();
        document.serve_static("/a.js");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            fetcher.fetch_with(&location("/a.js"), move |outcome| {
                assert!(outcome.is_ok());
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(document.count_loadable("/a.js"), 1);
        assert_eq!(fetcher.status(&location("/a.js")), ResourceStatus::Requesting);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        document.settle(&());

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(fetcher.status(&location("/a.js")), ResourceStatus::Loaded);
    }

    #[test]
    fn settled_locations_answer_immediately() {
        let (document, fetcher) = setup();
        document.serve_static("/a.js");
        fetcher.fetch_with(&location("/a.js"), |_| {});
        document.settle(&());

        let called = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&called);
        let inserted = fetcher.fetch_with(&location("script /a.js"), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!inserted);
        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert_eq!(document.count_loadable("/a.js"), 1);
    }

    #[test]
    fn errors_are_cached_too() {
        let (document, fetcher) = setup();
        fetcher.fetch_with(&location("/missing.js"), |outcome| assert!(outcome.is_err()));
        document.settle(&());

        assert_eq!(fetcher.status(&location("/missing.js")), ResourceStatus::Errored);
        assert!(!fetcher.fetch_with(&location("/missing.js"), |outcome| assert!(outcome.is_err())));
        assert_eq!(document.queued(), 0);
    }

    #[test]
    fn queued_completions_do_not_keep_the_fetcher_alive() {
        let (document, fetcher) = setup();
        document.serve_static("/a.js");
        fetcher.fetch_with(&location("/a.js"), |_| panic!("dropped fetchers notify nobody"));

        let records = Arc::downgrade(&fetcher.shared);
        drop(fetcher);

        assert!(records.upgrade().is_none());
        assert_eq!(document.settle(&()), 1);
    }

    #[test]
    fn stale_completions_after_reset_are_ignored() {
        let (document, fetcher) = setup();
        document.serve_static("/a.js");

        fetcher.fetch_with(&location("/a.js"), |_| panic!("reset drops pending callbacks"));
        fetcher.reset();
        assert!(fetcher.is_empty());

        let fresh = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fresh);
        fetcher.fetch_with(&location("/a.js"), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        // Both the stale and the fresh element settle; only the fresh one counts.
        assert_eq!(document.settle(&()), 2);
        assert_eq!(fresh.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.status(&location("/a.js")), ResourceStatus::Loaded);
    }
}
