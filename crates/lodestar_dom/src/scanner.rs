//! Declarative dependency discovery.
//!
//! Any element may declare resources through an attribute whose value is a
//! JSON object mapping module ids to locations:
//!
//! ```html
//! <div data-entry="main"
//!      data-lodestar='{"entry: [data-entry]": "/m-[data-entry].js"}'></div>
//! ```
//!
//! `[name]` placeholders in keys and values are replaced with the same
//! element's `name` attribute, so the element above declares
//! `"entry: main" -> "/m-main.js"`. A placeholder naming an attribute the
//! element lacks is kept verbatim.

use crate::document::Document;
use crate::element::Element;
use indexmap::IndexMap;

/// Discovered id to location pairs, in document then declaration order.
pub type Declarations = IndexMap<String, String>;

/// Scans every element carrying `attribute` and merges their declarations.
///
/// Elements whose declaration is missing or malformed contribute nothing;
/// later declarations of the same id win.
#[must_use]
pub fn scan(document: &dyn Document, attribute: &str) -> Declarations {
    let mut declarations = Declarations::new();
    for element in document.elements_with_attribute(attribute) {
        declarations.extend(scan_element(&element, attribute));
    }
    declarations
}

/// Reads the declarations of a single element.
#[must_use]
pub fn scan_element(element: &Element, attribute: &str) -> Declarations {
    let Some(raw) = element.attribute(attribute) else {
        return Declarations::new();
    };

    let parsed: IndexMap<String, String> = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(
                attribute,
                tag = element.tag(),
                %error,
                "skipping malformed dependency declaration"
            );
            return Declarations::new();
        }
    };

    parsed
        .into_iter()
        .map(|(key, value)| {
            (
                expand_placeholders(&key, element),
                expand_placeholders(&value, element),
            )
        })
        .collect()
}

/// Replaces `[name]` tokens with the element's `name` attribute.
#[must_use]
pub fn expand_placeholders(template: &str, element: &Element) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open + 1..].find(']') else {
            break;
        };
        let name = &rest[open + 1..open + 1 + close];
        let token_end = open + close + 2;

        expanded.push_str(&rest[..open]);
        match element.attribute(name) {
            Some(value) if !name.is_empty() => expanded.push_str(&value),
            _ => expanded.push_str(&rest[open..token_end]),
        }
        rest = &rest[token_end..];
    }

    expanded.push_str(rest);
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    const ATTRIBUTE: &str = "data-lodestar";

    fn declaring(json: &str) -> Element {
        Element::new("div").with_attribute(ATTRIBUTE, json)
    }

    #[test]
    fn expands_placeholders_in_keys_and_values() {
        let element = declaring(r#"{"entry: [data-entry]": "/assets/m-[data-entry].js"}"#)
            .with_attribute("data-entry", "main");

        let found = scan_element(&element, ATTRIBUTE);

        assert_eq!(found.len(), 1);
        assert_eq!(
            found.get("entry: main").map(String::as_str),
            Some("/assets/m-main.js")
        );
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        let element = Element::new("div");
        assert_eq!(expand_placeholders("a-[missing]-b", &element), "a-[missing]-b");
        assert_eq!(expand_placeholders("open [bracket", &element), "open [bracket");
        assert_eq!(expand_placeholders("[]", &element), "[]");
    }

    #[test]
    fn repeated_placeholders_all_expand() {
        let element = Element::new("div").with_attribute("v", "2");
        assert_eq!(expand_placeholders("[v]/[v].js", &element), "2/2.js");
    }

    #[test]
    fn malformed_declarations_do_not_abort_the_scan() {
        let document = MemoryDocument::<()>::new();
        document.insert(declaring("{not json"));
        document.insert(declaring(r#"["an", "array"]"#));
        document.insert(declaring(r#"{"numeric": 1}"#));
        document.insert(declaring(r#"{"main": "/main.js"}"#));

        let found = scan(&document, ATTRIBUTE);

        assert_eq!(found.len(), 1);
        assert_eq!(found.get("main").map(String::as_str), Some("/main.js"));
    }

    #[test]
    fn preserves_document_order() {
        let document = MemoryDocument::<()>::new();
        document.insert(declaring(r#"{"b": "/b.js", "a": "/a.js"}"#));
        document.insert(declaring(r#"{"c": "link /c.css"}"#));

        let found = scan(&document, ATTRIBUTE);
        let ids: Vec<&str> = found.keys().map(String::as_str).collect();

        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(found.get("c").map(String::as_str), Some("link /c.css"));
    }

    #[test]
    fn elements_without_the_attribute_are_ignored() {
        let document = MemoryDocument::<()>::new();
        document.insert(Element::new("div").with_attribute("data-other", r#"{"x": "/x.js"}"#));

        assert!(scan(&document, ATTRIBUTE).is_empty());
    }
}
