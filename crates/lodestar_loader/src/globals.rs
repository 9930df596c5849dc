//! The host's global scope.
//!
//! Resources that publish themselves as globals instead of calling
//! `define` are picked up from here once they finish loading, through the
//! paths registered with [`Loader::add_globals`](crate::Loader::add_globals).

use crate::value::Value;
use hashbrown::HashMap;
use parking_lot::RwLock;

/// Root names that refer to the global object itself.
const GLOBAL_ROOTS: [&str; 3] = ["window", "globalThis", "self"];

/// Dot-separated global variables.
///
/// A leading root (`window.`, `globalThis.`, `self.`) is ignored, so
/// `"window.theGlobal"` and `"theGlobal"` address the same slot.
#[derive(Debug, Default)]
pub struct GlobalScope {
    values: RwLock<HashMap<String, Value>>,
}

fn normalize(path: &str) -> &str {
    let path = path.trim();
    match path.split_once('.') {
        Some((root, rest)) if GLOBAL_ROOTS.contains(&root) => rest,
        _ => path,
    }
}

impl GlobalScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a global, returning the previous value.
    pub fn set(&self, path: &str, value: Value) -> Option<Value> {
        self.values.write().insert(normalize(path).to_string(), value)
    }

    /// Reads a global. Unset globals read as `undefined`.
    #[must_use]
    pub fn get(&self, path: &str) -> Value {
        self.values
            .read()
            .get(normalize(path))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns whether a global has been set.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.values.read().contains_key(normalize(path))
    }

    /// Removes a global, returning its value.
    pub fn remove(&self, path: &str) -> Option<Value> {
        self.values.write().remove(normalize(path))
    }
}
