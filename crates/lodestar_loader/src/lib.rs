//! Dependency-graph module loading for Lodestar (Layer 2).
//!
//! `lodestar_loader` resolves module definitions against a host
//! [`Document`](lodestar_dom::Document):
//!
//! - [`registry`] - The [`Loader`]: definitions, wait-sets and resolution
//! - [`fetcher`] - One element per resource location, shared completions
//! - [`aliases`] - Id/location/alias bookkeeping
//! - [`factory`] - [`Factory`] and [`Dependencies`]
//! - [`intercept`] - Handlers replacing the default load behavior
//! - [`globals`] - The [`GlobalScope`] resources publish into
//!
//! # Example
//!
//! ```
//! use lodestar_loader::prelude::*;
//! use std::sync::Arc;
//!
//! let document = Arc::new(HostDocument::new());
//! document.serve("/assets/greeting.js", |loader: &Loader| {
//!     loader.globals().set("window.greeting", Value::new("hello"));
//! });
//!
//! let loader = Loader::new(document.clone());
//! loader
//!     .add_files([("greeting", "/assets/greeting.js")])
//!     .add_globals([("greeting", "window.greeting")]);
//! loader.load("greeting").unwrap();
//!
//! document.settle(&loader);
//! let value = loader.get("greeting").unwrap();
//! assert_eq!(value.downcast_ref::<&str>(), Some(&"hello"));
//! ```

/// Id/location/alias table.
pub mod aliases;

/// Loader configuration.
pub mod config;

/// Error types.
pub mod error;

/// Factories and dependency lists.
pub mod factory;

/// Deduplicating resource fetcher.
pub mod fetcher;

/// Host global scope.
pub mod globals;

/// Validated module identifiers.
pub mod id;

/// Intercept handlers.
pub mod intercept;

/// Resource locations.
pub mod location;

/// The module registry.
pub mod registry;

/// Load targets.
pub mod target;

/// Dynamically typed module values.
pub mod value;

pub use aliases::AliasTable;
pub use config::LoaderConfig;
pub use error::LoaderError;
pub use factory::{Dependencies, Factory, FactoryFn, IntoDependencies};
pub use fetcher::{ResourceFetcher, ResourceStatus};
pub use globals::GlobalScope;
pub use id::{IntoModuleId, ModuleId};
pub use intercept::{InterceptHandler, InterceptMap, LoadData};
pub use location::ResourceLocation;
pub use registry::{Loader, ModuleState};
pub use target::{IntoLoadTarget, LoadTarget};
pub use value::Value;

/// In-memory document whose hosted scripts run against a [`Loader`].
pub type HostDocument = lodestar_dom::MemoryDocument<Loader>;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::HostDocument;
    pub use crate::config::LoaderConfig;
    pub use crate::error::LoaderError;
    pub use crate::factory::{Dependencies, Factory, IntoDependencies};
    pub use crate::globals::GlobalScope;
    pub use crate::id::{IntoModuleId, ModuleId};
    pub use crate::intercept::{InterceptMap, LoadData};
    pub use crate::registry::{Loader, ModuleState};
    pub use crate::target::{IntoLoadTarget, LoadTarget};
    pub use crate::value::Value;
    pub use lodestar_dom::prelude::*;
}
