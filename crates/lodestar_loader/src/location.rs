//! Resource locations.
//!
//! A location is a URL optionally prefixed by the element kind that loads
//! it: `"/a.js"` and `"script /a.js"` name the same resource, while
//! `"link /a.css"` is loaded through a stylesheet link.

use core::fmt;
use lodestar_dom::element::Element;
use url::Url;

/// A parsed resource location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocation {
    kind: String,
    url: String,
}

impl ResourceLocation {
    /// Parses `"[kind ]url"`, using `default_kind` when no kind is given.
    ///
    /// Returns `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str, default_kind: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (kind, url) = match raw.split_once(char::is_whitespace) {
            Some((kind, url)) if !url.trim().is_empty() => (kind, url.trim()),
            _ => (default_kind, raw),
        };

        Some(Self {
            kind: kind.to_string(),
            url: url.to_string(),
        })
    }

    /// The element kind used to load this resource.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The URL as written.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Canonical `"<kind> <url>"` key. At most one element is inserted per key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{} {}", self.kind, self.url)
    }

    /// The URL resolved against `base`, as a document would report it.
    ///
    /// Returns `None` if the URL cannot be joined.
    #[must_use]
    pub fn absolute(&self, base: &Url) -> Option<String> {
        base.join(&self.url).ok().map(String::from)
    }

    /// Creates the element that loads this resource.
    #[must_use]
    pub fn element(&self) -> Element {
        Element::loadable(&self.kind, &self.url)
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ResourceLocation {
        ResourceLocation::parse(raw, "script").expect("valid location")
    }

    #[test]
    fn bare_urls_use_the_default_kind() {
        let location = parse("/assets/a.js");
        assert_eq!(location.kind(), "script");
        assert_eq!(location.url(), "/assets/a.js");
        assert_eq!(location.key(), "script /assets/a.js");
    }

    #[test]
    fn kind_prefix_selects_the_element() {
        let location = parse("link /assets/a.css");
        assert_eq!(location.kind(), "link");
        assert_eq!(location.url(), "/assets/a.css");

        let element = location.element();
        assert_eq!(element.tag(), "link");
        assert_eq!(element.attribute("href").as_deref(), Some("/assets/a.css"));
    }

    #[test]
    fn explicit_default_kind_shares_the_key() {
        assert_eq!(parse("script /a.js").key(), parse("/a.js").key());
    }

    #[test]
    fn blank_locations_are_rejected() {
        assert!(ResourceLocation::parse("  ", "script").is_none());
    }

    #[test]
    fn resolves_against_a_base() {
        let base = Url::parse("http://localhost/").expect("base url");
        assert_eq!(
            parse("/assets/a.js").absolute(&base).as_deref(),
            Some("http://localhost/assets/a.js")
        );
        assert_eq!(
            parse("https://cdn.example/x.js").absolute(&base).as_deref(),
            Some("https://cdn.example/x.js")
        );
    }
}
