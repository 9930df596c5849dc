//! Declarative markup discovery tests.
//!
//! Tests covering `find_in_document`, `init`, `load(())`, placeholder
//! expansion through the loader, and malformed declarations.

mod common;

use common::{CallLog, int, setup};
use lodestar_dom::element::Element;
use lodestar_loader::{Factory, HostDocument, Loader, LoaderConfig, ModuleState};
use std::sync::Arc;

fn declaration(attribute: &str, json: &str) -> Element {
    Element::new("script").with_attribute(attribute, json)
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that `init()` registers and requests every declared id.
#[test]
fn init_discovers_and_requests_declarations() {
    let (document, loader) = setup();
    document.insert(
        declaration("data-lodestar", r#"{"entry: [data-entry]": "/m-[data-entry].js"}"#)
            .with_attribute("data-entry", "main"),
    );
    document.serve("/m-main.js", |loader: &Loader| {
        loader.define("entry: main", (), Factory::value(1_i32)).expect("define entry");
    });

    let declarations = loader.init();

    assert_eq!(
        declarations.get("entry: main").map(String::as_str),
        Some("/m-main.js")
    );
    assert_eq!(document.count_loadable("/m-main.js"), 1);
    assert_eq!(loader.state("entry: main"), ModuleState::Loading);

    document.settle(&loader);
    assert_eq!(loader.get("entry: main").as_ref().and_then(int), Some(1));
}

/// Verifies that `load(())` is equivalent to `init()`.
#[test]
fn loading_nothing_discovers_the_document() {
    let (document, loader) = setup();
    document.insert(declaration("data-lodestar", r#"{"a": "/a.js", "b": "link /b.css"}"#));

    loader.load(()).expect("discovery");

    assert_eq!(document.count_loadable("/a.js"), 1);
    assert_eq!(document.count_loadable("/b.css"), 1);
}

/// Verifies that `find_in_document` registers files without requesting them.
#[test]
fn find_in_document_only_registers() {
    let (document, loader) = setup();
    document.insert(declaration("data-deps", r#"{"lib": "/lib.js"}"#));
    let log = CallLog::new();

    let found = loader.find_in_document("data-deps");

    assert_eq!(found.len(), 1);
    assert_eq!(document.queued(), 0);
    assert_eq!(loader.files().get("lib").map(String::as_str), Some("script /lib.js"));

    loader.define("user", ["lib"], log.record("user")).expect("define user");
    assert_eq!(document.count_loadable("/lib.js"), 1);
}

/// Verifies that `init()` scans the configured attribute.
#[test]
fn init_uses_the_configured_attribute() {
    let document = Arc::new(HostDocument::new());
    let loader = Loader::with_config(
        document.clone(),
        LoaderConfig::new().with_attribute("data-just-define"),
    );
    document.insert(declaration("data-lodestar", r#"{"ignored": "/ignored.js"}"#));
    document.insert(declaration("data-just-define", r#"{"used": "/used.js"}"#));

    let found = loader.init();

    assert_eq!(found.keys().collect::<Vec<_>>(), ["used"]);
    assert_eq!(document.count_loadable("/ignored.js"), 0);
    assert_eq!(document.count_loadable("/used.js"), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// MALFORMED MARKUP
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that one malformed declaration does not abort the scan.
#[test]
fn malformed_declarations_are_skipped() {
    let (document, loader) = setup();
    document.insert(declaration("data-lodestar", "{not json"));
    document.insert(declaration("data-lodestar", r#"["an", "array"]"#));
    document.insert(declaration("data-lodestar", r#"{"ok": "/ok.js"}"#));

    let found = loader.init();

    assert_eq!(found.len(), 1);
    assert_eq!(document.count_loadable("/ok.js"), 1);
}

/// Verifies that declarations with blank locations are not registered.
#[test]
fn blank_locations_are_not_registered() {
    let (document, loader) = setup();
    document.insert(declaration("data-lodestar", r#"{"blank": "  ", "fine": "/fine.js"}"#));

    loader.init();

    assert!(loader.files().get("blank").is_none());
    assert_eq!(document.count_loadable("/fine.js"), 1);
}
