//! The id/alias table.
//!
//! Maps module ids to the locations that back them, ids to the global paths
//! read after their resource loads, and (once a location has been inserted)
//! every alias of that location back to its owning id.

use crate::id::ModuleId;
use crate::intercept::InterceptHandler;
use crate::location::ResourceLocation;
use hashbrown::HashMap;
use indexmap::IndexMap;
use url::Url;

/// Bidirectional id/location mapping plus per-id globals and handlers.
#[derive(Default)]
pub struct AliasTable {
    files: IndexMap<ModuleId, ResourceLocation>,
    globals: HashMap<ModuleId, String>,
    // alias -> owning id, populated when a location is inserted.
    aliases: HashMap<String, ModuleId>,
    handlers: HashMap<ModuleId, InterceptHandler>,
}

impl core::fmt::Debug for AliasTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AliasTable")
            .field("files", &self.files)
            .field("globals", &self.globals)
            .field("aliases", &self.aliases)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AliasTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `id` with a location, replacing any previous one.
    pub fn add_file(&mut self, id: ModuleId, location: ResourceLocation) {
        self.files.insert(id, location);
    }

    /// Returns the location backing `id`.
    #[must_use]
    pub fn file(&self, id: &str) -> Option<&ResourceLocation> {
        self.files.get(id)
    }

    /// Returns the registered id and location for `id`.
    #[must_use]
    pub fn file_entry(&self, id: &str) -> Option<(&ModuleId, &ResourceLocation)> {
        self.files.get_key_value(id)
    }

    /// Returns every registered id and its location, in registration order.
    pub fn files(&self) -> impl Iterator<Item = (&ModuleId, &ResourceLocation)> {
        self.files.iter()
    }

    /// Registers the global path read for `id` after its resource loads.
    pub fn add_global(&mut self, id: ModuleId, path: impl Into<String>) {
        self.globals.insert(id, path.into());
    }

    /// Returns the global path registered for `id`.
    #[must_use]
    pub fn global(&self, id: &str) -> Option<&str> {
        self.globals.get(id).map(String::as_str)
    }

    /// Registers an intercept handler for `id`.
    pub fn set_handler(&mut self, id: ModuleId, handler: InterceptHandler) {
        self.handlers.insert(id, handler);
    }

    /// Returns the intercept handler for `id`.
    #[must_use]
    pub fn handler(&self, id: &str) -> Option<&InterceptHandler> {
        self.handlers.get(id)
    }

    /// Returns the handler for a loaded resource, registered either under its
    /// owning id or under any alias of its location.
    #[must_use]
    pub fn handler_for(
        &self,
        owner: &ModuleId,
        location: &ResourceLocation,
        base: Option<&Url>,
    ) -> Option<&InterceptHandler> {
        self.handler(owner.as_str())
            .or_else(|| self.handler(location.url()))
            .or_else(|| self.handler(&location.key()))
            .or_else(|| {
                let absolute = location.absolute(base?)?;
                self.handler(&absolute)
            })
    }

    /// Links the aliases of an inserted location to its owner.
    ///
    /// The raw URL, the canonical `"<kind> <url>"` key and the absolute URL
    /// against `base` (if any) all become aliases. Returns the aliases that
    /// were linked.
    pub fn link(
        &mut self,
        owner: &ModuleId,
        location: &ResourceLocation,
        base: Option<&Url>,
    ) -> Vec<String> {
        let mut linked = Vec::with_capacity(3);
        let candidates = [
            Some(location.url().to_string()),
            Some(location.key()),
            base.and_then(|base| location.absolute(base)),
        ];

        for alias in candidates.into_iter().flatten() {
            if alias == owner.as_str() || linked.contains(&alias) {
                continue;
            }
            self.aliases.insert(alias.clone(), owner.clone());
            linked.push(alias);
        }
        linked
    }

    /// Returns the id an alias was linked to.
    #[must_use]
    pub fn alias_owner(&self, alias: &str) -> Option<&ModuleId> {
        self.aliases.get(alias)
    }

    /// Resolves an id or alias to the id its module record lives under.
    #[must_use]
    pub fn canonical<'a>(&'a self, id: &'a str) -> &'a str {
        self.alias_owner(id).map_or(id, ModuleId::as_str)
    }

    /// Finds the id whose registered location matches `location`.
    ///
    /// Matches linked aliases first, then compares against every registered
    /// location by raw URL and by canonical key.
    #[must_use]
    pub fn owner_of_location(&self, location: &str, default_kind: &str) -> Option<&ModuleId> {
        if let Some(owner) = self.alias_owner(location) {
            return Some(owner);
        }
        let key = ResourceLocation::parse(location, default_kind)?.key();
        self.files
            .iter()
            .find(|(_, registered)| registered.url() == location || registered.key() == key)
            .map(|(id, _)| id)
    }
}
