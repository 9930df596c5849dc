//! The host document model for Lodestar (Layer 1).
//!
//! `lodestar_dom` describes the document a loader runs inside of, without
//! knowing anything about modules:
//!
//! - [`element`] - Loadable and declarative elements with attributes
//! - [`document`] - The [`Document`] trait, load events and outcomes
//! - [`memory`] - [`MemoryDocument`], a deterministic in-process host
//! - [`scanner`] - Discovery of declarative dependency maps in markup
//!
//! # Architecture
//!
//! - **Layer 1** (`lodestar_dom`): Host document primitives (this crate)
//! - **Layer 2** (`lodestar_loader`): Module registry, aliasing and fetching
//!
//! # Example
//!
//! ```
//! use lodestar_dom::element::Element;
//! use lodestar_dom::memory::MemoryDocument;
//! use lodestar_dom::scanner::scan;
//!
//! let document = MemoryDocument::<()>::new();
//! document.insert(
//!     Element::new("div")
//!         .with_attribute("data-entry", "main")
//!         .with_attribute("data-deps", r#"{"entry: [data-entry]": "/m-[data-entry].js"}"#),
//! );
//!
//! let found = scan(&document, "data-deps");
//! assert_eq!(found.get("entry: main").map(String::as_str), Some("/m-main.js"));
//! ```

/// Document trait, load events and load outcomes.
pub mod document;

/// Elements and their attributes.
pub mod element;

/// In-memory document host.
pub mod memory;

/// Declarative dependency map discovery.
pub mod scanner;

pub use document::{
    Completion, Document, LoadEvent, LoadEventKind, LoadOutcome, Loaded, ResourceLoadError,
};
pub use element::Element;
pub use memory::MemoryDocument;
pub use scanner::{Declarations, scan};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::document::*;
    pub use crate::element::*;
    pub use crate::memory::*;
    pub use crate::scanner::*;
}
