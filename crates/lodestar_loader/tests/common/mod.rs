//! Shared helpers for `lodestar_loader` integration tests.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items used in every test binary"
)]

use lodestar_loader::{Factory, HostDocument, Loader, Value};
use std::sync::{Arc, Mutex};

// ═══════════════════════════════════════════════════════════════════════════════
// SETUP
// ═══════════════════════════════════════════════════════════════════════════════

/// Creates an empty in-memory document and a loader over it.
pub fn setup() -> (Arc<HostDocument>, Loader) {
    let document = Arc::new(HostDocument::new());
    let loader = Loader::new(document.clone());
    (document, loader)
}

/// Reads an `i32` module value.
pub fn int(value: &Value) -> Option<i32> {
    value.downcast_ref::<i32>().copied()
}

/// Reads a `&'static str` module value.
pub fn text(value: &Value) -> Option<&'static str> {
    value.downcast_ref::<&'static str>().copied()
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALL RECORDING
// ═══════════════════════════════════════════════════════════════════════════════

/// Records every invocation of the factories it builds.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(&'static str, Vec<Value>)>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory that records its arguments under `name` and returns `result`.
    pub fn factory(&self, name: &'static str, result: Value) -> Factory {
        let calls = Arc::clone(&self.calls);
        Factory::call(move |args| {
            calls.lock().expect("call log poisoned").push((name, args));
            result
        })
    }

    /// A factory that records its arguments under `name` and returns `undefined`.
    pub fn record(&self, name: &'static str) -> Factory {
        self.factory(name, Value::undefined())
    }

    /// Total number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls.lock().expect("call log poisoned").len()
    }

    /// Number of recorded calls for `name`.
    pub fn count_of(&self, name: &str) -> usize {
        self.calls
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter(|(called, _)| *called == name)
            .count()
    }

    /// Names in call order.
    pub fn order(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .iter()
            .map(|(name, _)| *name)
            .collect()
    }

    /// Arguments of the first call recorded under `name`.
    pub fn args(&self, name: &str) -> Vec<Value> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .iter()
            .find(|(called, _)| *called == name)
            .map(|(_, args)| args.clone())
            .unwrap_or_else(|| panic!("{name} was never called"))
    }
}
