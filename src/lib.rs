//! A dependency-graph module loader.
//!
//! Define modules with their dependencies, let the loader fetch whatever
//! resources back those dependencies, and each factory fires exactly once,
//! as soon as everything it needs is defined.
//!
//! - [`dom`] - The host document: elements, load events, markup scanning
//! - [`loader`] - The module registry, aliasing and resource fetching
//! - `diagnostics` (feature `tracing`) - Tracing subscriber setup
//!
//! # Example
//!
//! ```
//! use lodestar::prelude::*;
//! use std::sync::Arc;
//!
//! let document = Arc::new(HostDocument::new());
//! document.serve("/math.js", |loader: &Loader| {
//!     loader.define("math", (), Factory::value(2_i32)).unwrap();
//! });
//!
//! let loader = Loader::new(document.clone());
//! loader.add_files([("math", "/math.js")]);
//! loader.define("double", ["math"], Factory::call(|args| {
//!     let n = args[0].downcast_ref::<i32>().copied().unwrap_or_default();
//!     Value::new(n * 2)
//! })).unwrap();
//!
//! document.settle(&loader);
//! assert_eq!(loader.get("double").unwrap().downcast_ref::<i32>(), Some(&4));
//! ```

pub use lodestar_dom as dom;
pub use lodestar_loader as loader;

#[cfg(feature = "tracing")]
pub use lodestar_core as diagnostics;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use lodestar_loader::prelude::*;

    #[cfg(feature = "tracing")]
    pub use lodestar_core::prelude::*;
}
