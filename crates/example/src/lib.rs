//! Example page boot built with Lodestar.
//!
//! A small in-memory "site" whose page declares its entry module in markup.
//! Booting scans the page, fetches the entry, and lets the graph unfold:
//!
//! ```text
//! page markup ──▶ app: <entry> ──┬──▶ greeting        (defines itself)
//!                                ├──▶ clock           (publishes a global)
//!                                └──▶ theme           (stylesheet, intercepted)
//! ```

use lodestar_dom::element::Element;
use lodestar_loader::{Factory, HostDocument, InterceptMap, Loader, LoaderError, Value};
use std::sync::Arc;

/// Attribute the page declares its modules under.
pub const ATTRIBUTE: &str = "data-lodestar";

/// Builds the hosted site with a page whose entry is `entry`.
#[must_use]
pub fn site(entry: &str) -> Arc<HostDocument> {
    let document = Arc::new(HostDocument::new());

    document.insert(
        Element::new("body")
            .with_attribute("data-entry", entry)
            .with_attribute(
                ATTRIBUTE,
                r#"{"app: [data-entry]": "/app/[data-entry].js"}"#,
            ),
    );

    document
        .serve("/app/main.js", |loader: &Loader| {
            define_app(loader, "app: main", "Welcome");
        })
        .serve("/app/admin.js", |loader: &Loader| {
            define_app(loader, "app: admin", "Administration");
        })
        .serve("/lib/greeting.js", |loader: &Loader| {
            let defined = loader.define("greeting", (), Factory::call(|_| Value::new("hello")));
            if let Err(error) = defined {
                tracing::error!(%error, "greeting failed to define");
            }
        })
        .serve("/lib/clock.js", |loader: &Loader| {
            loader.globals().set("window.clock", Value::new(1_700_000_000_u64));
        })
        .serve_static("/css/theme.css");

    document
}

fn define_app(loader: &Loader, id: &str, title: &'static str) {
    let defined = loader.define(
        id,
        ["greeting", "clock", "theme"],
        Factory::call(move |args| {
            let greeting = args[0].downcast_ref::<&str>().copied().unwrap_or("hi");
            let clock = args[1].downcast_ref::<u64>().copied().unwrap_or_default();
            Value::new(format!("{title}: {greeting} (booted at {clock})"))
        }),
    );
    if let Err(error) = defined {
        tracing::error!(id, %error, "app failed to define");
    }
}

/// Creates a loader for `document` with the site's libraries registered.
///
/// # Errors
///
/// Returns [`LoaderError`] if the stylesheet handler cannot be registered.
pub fn loader(document: Arc<HostDocument>) -> Result<Loader, LoaderError> {
    let loader = Loader::new(document);
    loader
        .add_files([
            ("greeting", "/lib/greeting.js"),
            ("clock", "/lib/clock.js"),
            ("theme", "link /css/theme.css"),
        ])
        .add_globals([("clock", "window.clock")]);

    // Stylesheets define nothing; resolve the id once the sheet applies.
    loader.intercept(InterceptMap::new().on("theme", |loader, error, data| {
        if let Some(error) = error {
            tracing::warn!(%error, "theme unavailable, booting unstyled");
        }
        if let Err(error) = loader.define(&data.id, (), Factory::undefined()) {
            tracing::error!(%error, "theme failed to define");
        }
    }))?;

    Ok(loader)
}

/// Outcome of booting a page.
#[derive(Debug, Clone)]
pub struct BootReport {
    /// Ids discovered in markup, with their locations.
    pub discovered: Vec<(String, String)>,
    /// Rendered value of each discovered module, `None` if it never resolved.
    pub modules: Vec<(String, Option<String>)>,
    /// Definitions still waiting on dependencies.
    pub pending: usize,
}

/// Boots the page: scan, fetch, settle.
///
/// # Errors
///
/// Returns [`LoaderError`] if the loader cannot be set up.
pub fn boot(entry: &str) -> Result<BootReport, LoaderError> {
    let document = site(entry);
    let loader = loader(document.clone())?;

    let declarations = loader.init();
    let settled = document.settle(&loader);
    tracing::info!(settled, "page settled");

    let modules = declarations
        .keys()
        .map(|id| {
            let rendered = loader
                .get(id)
                .and_then(|value| value.downcast_ref::<String>().cloned());
            (id.clone(), rendered)
        })
        .collect();

    Ok(BootReport {
        discovered: declarations.into_iter().collect(),
        modules,
        pending: loader.pending_count(),
    })
}
