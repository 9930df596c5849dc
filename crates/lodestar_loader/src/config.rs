//! Loader configuration.

use crate::error::LoaderError;
use serde::Deserialize;
use url::Url;

/// Attribute scanned by [`Loader::init`](crate::Loader::init) unless configured otherwise.
pub const DEFAULT_ATTRIBUTE: &str = "data-lodestar";

/// Element kind used for locations without a kind prefix.
pub const DEFAULT_KIND: &str = "script";

/// Base URL used to compute absolute-URL aliases.
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Loader configuration.
///
/// # Example
///
/// ```
/// use lodestar_loader::LoaderConfig;
///
/// let config = LoaderConfig::default().with_attribute("data-just-define");
/// assert_eq!(config.attribute, "data-just-define");
/// assert_eq!(config.default_kind, "script");
///
/// let parsed = LoaderConfig::from_json(r#"{"base_url": "https://app.example/"}"#).unwrap();
/// assert_eq!(parsed.base_url.as_ref().map(|url| url.as_str()), Some("https://app.example/"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Attribute carrying declarative dependency maps.
    pub attribute: String,
    /// Element kind for locations without a kind prefix.
    pub default_kind: String,
    /// Document base URL; inserted locations are also aliased by their
    /// absolute URL against this base. `None` disables absolute aliases.
    pub base_url: Option<Url>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            default_kind: DEFAULT_KIND.to_string(),
            base_url: Url::parse(DEFAULT_BASE_URL).ok(),
        }
    }
}

impl LoaderConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidConfig`] on malformed JSON, unknown
    /// fields, or an unparsable base URL.
    pub fn from_json(json: &str) -> Result<Self, LoaderError> {
        serde_json::from_str(json).map_err(|error| LoaderError::InvalidConfig(error.to_string()))
    }

    /// Sets the declarative attribute name.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Sets the default element kind.
    #[must_use]
    pub fn with_default_kind(mut self, kind: impl Into<String>) -> Self {
        self.default_kind = kind.into();
        self
    }

    /// Sets the document base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }
}
