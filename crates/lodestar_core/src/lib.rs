//! Shared infrastructure for Lodestar hosts.
//!
//! The loader crates only emit `tracing` events; installing a subscriber is
//! left to the host. [`TracingSetup`] is the one place that does it.
//!
//! # Example
//!
//! ```
//! use lodestar_core::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! let config = TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .install();
//! assert_eq!(config.level, Level::DEBUG);
//! ```

/// Tracing subscriber installation.
pub mod tracing_setup;

pub use tracing_setup::{TracingConfig, TracingFormat, TracingSetup};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::tracing_setup::*;
}
