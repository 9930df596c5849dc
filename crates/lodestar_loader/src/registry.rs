//! The module registry.
//!
//! [`Loader`] tracks every module id through its lifecycle
//! (`Unrequested` → `Loading` → `Defined`), queues definitions whose
//! dependencies are not yet defined, and fires each queued factory exactly
//! once when its last dependency resolves.
//!
//! # Resolution
//!
//! A queued definition waits on each dependency that was undefined when it
//! was queued. Defining an id wakes only its waiters; among the woken
//! definitions whose dependencies are all defined, the one queued first
//! fires first. Its result is itself a definition, so resolution cascades
//! within the same call, iteratively, however long the chain. Factories
//! always receive values in their own declared order.
//!
//! # Re-entrancy
//!
//! Factories, intercept handlers and hosted scripts may call back into the
//! loader. No lock is held while user code or the document runs. Only the
//! outermost resolution drains the queue; definitions made while it runs
//! are picked up by it once the running factory returns.
//!
//! # Example
//!
//! ```
//! use lodestar_loader::{Factory, HostDocument, Loader, Value};
//! use std::sync::Arc;
//!
//! let document = Arc::new(HostDocument::new());
//! document.serve("/a.js", |loader: &Loader| {
//!     loader.define("a", (), Factory::value(42_i32)).unwrap();
//! });
//!
//! let loader = Loader::new(document.clone());
//! loader.add_files([("a", "/a.js")]);
//! loader.define("needs-a", ["a"], Factory::call(|args| {
//!     let a = args[0].downcast_ref::<i32>().copied().unwrap_or_default();
//!     Value::new(a + 1)
//! })).unwrap();
//!
//! document.settle(&loader);
//! assert_eq!(loader.get("needs-a").and_then(|v| v.downcast_ref::<i32>().copied()), Some(43));
//! ```

use crate::aliases::AliasTable;
use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::factory::{Dependencies, Factory, IntoDependencies};
use crate::fetcher::ResourceFetcher;
use crate::globals::GlobalScope;
use crate::id::{IntoModuleId, ModuleId};
use crate::intercept::{InterceptMap, LoadData};
use crate::location::ResourceLocation;
use crate::target::{IntoLoadTarget, LoadTarget};
use crate::value::Value;
use hashbrown::HashMap;
use indexmap::IndexMap;
use lodestar_dom::document::{Document, LoadOutcome};
use lodestar_dom::scanner::{self, Declarations};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

// ─────────────────────────────────────────────────────────────────────────────
// Module State
// ─────────────────────────────────────────────────────────────────────────────

/// Where a module id is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Nothing has been requested or defined under this id.
    Unrequested,
    /// Its resource has been requested but it is not defined yet.
    Loading,
    /// It has a value.
    Defined,
}

#[derive(Default)]
struct ModuleRecord {
    value: Option<Value>,
    loading: bool,
}

impl ModuleRecord {
    fn state(&self) -> ModuleState {
        match (&self.value, self.loading) {
            (Some(_), _) => ModuleState::Defined,
            (None, true) => ModuleState::Loading,
            (None, false) => ModuleState::Unrequested,
        }
    }
}

/// A definition waiting on undefined dependencies.
struct PendingDefinition {
    id: ModuleId,
    dependencies: Dependencies,
    factory: Factory,
}

#[derive(Default)]
struct RegistryState {
    modules: HashMap<ModuleId, ModuleRecord>,
    // Keyed by queue sequence; lower sequences fire first.
    pending: BTreeMap<u64, PendingDefinition>,
    next_sequence: u64,
    // Canonical dependency id -> sequences of the definitions waiting on it.
    waiters: HashMap<ModuleId, Vec<u64>>,
    // Sequences whose dependencies may have become ready.
    woken: BTreeSet<u64>,
    resolving: bool,
    table: AliasTable,
}

impl RegistryState {
    fn record(&self, id: &str) -> Option<&ModuleRecord> {
        self.modules.get(self.table.canonical(id))
    }

    fn is_defined(&self, id: &str) -> bool {
        self.record(id).is_some_and(|record| record.value.is_some())
    }

    fn value(&self, id: &str) -> Option<Value> {
        self.record(id).and_then(|record| record.value.clone())
    }

    fn canonical_id(&self, id: &ModuleId) -> ModuleId {
        self.table.alias_owner(id.as_str()).cloned().unwrap_or_else(|| id.clone())
    }

    /// Queues a definition behind its `missing` dependencies.
    fn queue(&mut self, pending: PendingDefinition, missing: &[ModuleId]) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        for dep in missing {
            let key = self.canonical_id(dep);
            self.waiters.entry(key).or_default().push(sequence);
        }
        self.pending.insert(sequence, pending);
    }

    /// Stores a value under the canonical id and wakes its waiters.
    fn store(&mut self, id: &ModuleId, value: Value) {
        let canonical = self.canonical_id(id);
        let record = self.modules.entry(canonical.clone()).or_default();
        if record.value.is_some() {
            tracing::debug!(id = %id, "redefining module");
        }
        record.value = Some(value);
        self.wake(&canonical);
    }

    fn wake(&mut self, id: &ModuleId) {
        if let Some(sequences) = self.waiters.remove(id) {
            self.woken.extend(sequences);
        }
    }

    /// Removes the oldest woken definition whose dependencies are all defined.
    ///
    /// Woken definitions that are still missing something stay queued behind
    /// their other dependencies.
    fn next_ready(&mut self) -> Option<PendingDefinition> {
        while let Some(sequence) = self.woken.pop_first() {
            let ready = self
                .pending
                .get(&sequence)
                .is_some_and(|pending| self.is_ready(&pending.dependencies));
            if ready {
                return self.pending.remove(&sequence);
            }
        }
        None
    }

    fn is_ready(&self, dependencies: &Dependencies) -> bool {
        dependencies.ids().all(|dep| self.is_defined(dep.as_str()))
    }

    fn arguments(&self, dependencies: &Dependencies) -> Vec<Value> {
        dependencies
            .slots()
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .and_then(|dep| self.value(dep.as_str()))
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Finds the id and location to fetch for an id, alias or location.
    fn loadable(&self, target: &str, default_kind: &str) -> Option<(ModuleId, ResourceLocation)> {
        if let Some((owner, location)) = self.table.file_entry(self.table.canonical(target)) {
            return Some((owner.clone(), location.clone()));
        }
        let owner = self.table.owner_of_location(target, default_kind)?;
        let location = self.table.file(owner.as_str())?;
        Some((owner.clone(), location.clone()))
    }

    /// Links a location's aliases to `owner` and folds any record that was
    /// created under one of those aliases into the owner's record.
    ///
    /// Definitions waiting on an alias move to the owner. Returns whether
    /// folding defined the owner, in which case its waiters are woken.
    fn link_aliases(&mut self, owner: &ModuleId, location: &ResourceLocation, config: &LoaderConfig) -> bool {
        let mut defined = false;
        let linked = self.table.link(owner, location, config.base_url.as_ref());
        tracing::debug!(id = %owner, aliases = ?linked, "linked location aliases");
        for alias in linked {
            if let Some(sequences) = self.waiters.remove(alias.as_str()) {
                self.waiters.entry(owner.clone()).or_default().extend(sequences);
            }
            let Some(aliased) = self.modules.remove(alias.as_str()) else {
                continue;
            };
            let record = self.modules.entry(owner.clone()).or_default();
            if record.value.is_none() && aliased.value.is_some() {
                record.value = aliased.value;
                defined = true;
            }
            tracing::debug!(id = %owner, alias = %alias, "folded aliased record");
        }
        if defined {
            self.wake(owner);
        }
        defined
    }
}

/// Clears the resolving flag if a factory unwinds out of resolution.
struct ResolvingGuard<'a>(&'a Mutex<RegistryState>);

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().resolving = false;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loader
// ─────────────────────────────────────────────────────────────────────────────

struct LoaderShared {
    config: LoaderConfig,
    document: Arc<dyn Document>,
    fetcher: ResourceFetcher,
    globals: GlobalScope,
    state: Mutex<RegistryState>,
}

/// The module registry and loader.
///
/// A `Loader` is a handle: clones share the same registry. Create one per
/// document and pass it (or a reference) to whatever needs to define or
/// request modules.
#[derive(Clone)]
pub struct Loader {
    shared: Arc<LoaderShared>,
}

impl core::fmt::Debug for Loader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Loader")
            .field("config", &self.shared.config)
            .field("modules", &state.modules.len())
            .field("pending", &state.pending.len())
            .field("table", &state.table)
            .finish()
    }
}

impl Loader {
    /// Creates a loader over `document` with the default configuration.
    #[must_use]
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self::with_config(document, LoaderConfig::default())
    }

    /// Creates a loader over `document`.
    #[must_use]
    pub fn with_config(document: Arc<dyn Document>, config: LoaderConfig) -> Self {
        Self {
            shared: Arc::new(LoaderShared {
                config,
                fetcher: ResourceFetcher::new(Arc::clone(&document)),
                document,
                globals: GlobalScope::new(),
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Definition
    // ─────────────────────────────────────────────────────────────────────────

    /// Defines module `id`.
    ///
    /// If every dependency is already defined, the factory runs before this
    /// returns. Otherwise the definition is queued, the resources of any
    /// registered dependencies are requested, and the factory runs once the
    /// last dependency is defined. Dependencies nobody ever defines keep the
    /// definition pending forever; that is not an error.
    ///
    /// Defining an id again replaces its value. Factories that already fired
    /// are not invoked again.
    ///
    /// # Errors
    ///
    /// - [`LoaderError::InvalidIdentifier`] if `id` is not a valid id
    /// - [`LoaderError::InvalidDependencyList`] if `dependencies` has an
    ///   unsupported shape
    ///
    /// Both are raised before anything is fetched.
    pub fn define(
        &self,
        id: impl IntoModuleId,
        dependencies: impl IntoDependencies,
        factory: impl Into<Factory>,
    ) -> Result<(), LoaderError> {
        let id = id.into_module_id()?;
        let dependencies = dependencies.into_dependencies()?;
        let factory = factory.into();

        let missing = {
            let mut state = self.shared.state.lock();
            if state.is_ready(&dependencies) {
                let args = state.arguments(&dependencies);
                drop(state);
                tracing::debug!(id = %id, "defining module");
                let value = factory.resolve(args);
                self.install(&id, value);
                return Ok(());
            }

            let missing: Vec<ModuleId> = dependencies
                .ids()
                .filter(|dep| !state.is_defined(dep.as_str()))
                .cloned()
                .collect();
            let pending = PendingDefinition {
                id: id.clone(),
                dependencies,
                factory,
            };
            state.queue(pending, &missing);
            missing
        };

        tracing::debug!(id = %id, missing = ?missing, "definition waiting on dependencies");
        for dep in &missing {
            self.request_dependency(dep);
        }
        Ok(())
    }

    /// Stores a module value and resolves whatever it unblocks.
    fn install(&self, id: &ModuleId, value: Value) {
        self.shared.state.lock().store(id, value);
        self.resolve_pending();
    }

    /// Fires woken definitions whose dependencies are all defined, oldest
    /// first, one at a time.
    ///
    /// A call made while another resolution is running returns at once; the
    /// running one drains whatever was woken in the meantime.
    fn resolve_pending(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.resolving {
                return;
            }
            state.resolving = true;
        }
        let _resolving = ResolvingGuard(&self.shared.state);

        loop {
            let (pending, args) = {
                let mut state = self.shared.state.lock();
                let Some(pending) = state.next_ready() else {
                    state.resolving = false;
                    break;
                };
                let args = state.arguments(&pending.dependencies);
                (pending, args)
            };

            tracing::trace!(id = %pending.id, "dependencies resolved");
            let value = pending.factory.resolve(args);
            self.shared.state.lock().store(&pending.id, value);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Requests the resource behind an id, alias or registered location.
    ///
    /// Already-defined ids are a no-op, as are ids whose resource is already
    /// loading.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidIdentifier`] if `target` is neither a
    /// defined id, an id with a registered location, nor a registered
    /// location. Bare paths such as `"/url"` are only accepted when some id
    /// registered them.
    pub fn request(&self, target: &str) -> Result<(), LoaderError> {
        let id = ModuleId::parse(target)?;
        let loadable = {
            let state = self.shared.state.lock();
            if state.is_defined(id.as_str()) {
                return Ok(());
            }
            state.loadable(id.as_str(), &self.shared.config.default_kind)
        };

        match loadable {
            Some((owner, location)) => {
                self.start_load(owner, location);
                Ok(())
            }
            None => Err(LoaderError::invalid_identifier(format!(
                "{target:?} is neither a registered module nor a registered location"
            ))),
        }
    }

    /// Loads ids, locations, intercepted ids, or (with `()`) everything
    /// declared in the document.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidIdentifier`] if the target has an
    /// unsupported shape or any requested id is unknown. Ids before the
    /// failing one have already been requested.
    pub fn load(&self, target: impl IntoLoadTarget) -> Result<(), LoaderError> {
        match target.into_load_target()? {
            LoadTarget::Ids(ids) => {
                for id in &ids {
                    self.request(id)?;
                }
            }
            LoadTarget::Intercept(handlers) => {
                let ids: Vec<String> = handlers.ids().map(str::to_string).collect();
                self.intercept(handlers)?;
                for id in &ids {
                    self.request(id)?;
                }
            }
            LoadTarget::Discover => {
                self.init();
            }
        }
        Ok(())
    }

    /// Requests a dependency if anything is registered for it; unknown ids
    /// are left alone.
    fn request_dependency(&self, dep: &ModuleId) {
        let loadable = self
            .shared
            .state
            .lock()
            .loadable(dep.as_str(), &self.shared.config.default_kind);
        if let Some((owner, location)) = loadable {
            self.start_load(owner, location);
        }
    }

    fn start_load(&self, id: ModuleId, location: ResourceLocation) {
        let folded = {
            let mut state = self.shared.state.lock();
            let record = state.modules.entry(id.clone()).or_default();
            if record.value.is_some() || record.loading {
                return;
            }
            record.loading = true;
            state.link_aliases(&id, &location, &self.shared.config)
        };

        // Defined under one of its locations before anything was fetched.
        if folded {
            self.resolve_pending();
            return;
        }

        tracing::debug!(id = %id, location = %location, "requesting module");

        // The fetcher lives inside the registry; hold it weakly from there.
        let shared = Arc::downgrade(&self.shared);
        let settled = location.clone();
        self.shared.fetcher.fetch_with(&location, move |outcome| {
            if let Some(loader) = Loader::upgrade(&shared) {
                loader.on_settled(&id, &settled, outcome);
            }
        });
    }

    fn upgrade(shared: &Weak<LoaderShared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }

    /// Runs once a requested resource settles.
    fn on_settled(&self, id: &ModuleId, location: &ResourceLocation, outcome: &LoadOutcome) {
        let handler = self
            .shared
            .state
            .lock()
            .table
            .handler_for(id, location, self.shared.config.base_url.as_ref())
            .cloned();

        if let Some(handler) = handler {
            let (element, event) = match outcome {
                Ok(loaded) => (loaded.element.clone(), loaded.event.clone()),
                Err(error) => (error.element.clone(), error.event.clone()),
            };
            let data = LoadData {
                event,
                url: location.url().to_string(),
                id: id.clone(),
                element,
            };
            tracing::debug!(id = %id, "running intercept handler");
            handler(self, outcome.as_ref().err(), &data);
            return;
        }

        if let Err(error) = outcome {
            tracing::warn!(id = %id, %error, "resource failed to load; dependents stay pending");
            return;
        }

        let global = {
            let state = self.shared.state.lock();
            if state.is_defined(id.as_str()) {
                return;
            }
            state.table.global(id.as_str()).map(str::to_string)
        };

        match global {
            Some(path) => {
                tracing::debug!(id = %id, global = %path, "defining module from global");
                let value = self.shared.globals.get(&path);
                self.install(id, value);
            }
            None => {
                tracing::debug!(id = %id, "resource loaded without defining its module");
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers `{id: location}` pairs. Invalid entries are skipped.
    ///
    /// Returns `self` so registrations can be chained.
    pub fn add_files<I, K, V>(&self, files: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = self.shared.state.lock();
        for (id, location) in files {
            let (id, location) = (id.as_ref(), location.as_ref());
            let Ok(module_id) = ModuleId::parse(id) else {
                tracing::warn!(id, "skipping file with invalid module id");
                continue;
            };
            let Some(parsed) = ResourceLocation::parse(location, &self.shared.config.default_kind)
            else {
                tracing::warn!(id, "skipping file with blank location");
                continue;
            };
            tracing::trace!(id, location = %parsed, "registered file");
            state.table.add_file(module_id, parsed);
        }
        self
    }

    /// Registers `{id: global path}` pairs. Invalid entries are skipped.
    ///
    /// Returns `self` so registrations can be chained.
    pub fn add_globals<I, K, V>(&self, globals: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = self.shared.state.lock();
        for (id, path) in globals {
            match ModuleId::parse(id.as_ref()) {
                Ok(module_id) => state.table.add_global(module_id, path.as_ref()),
                Err(_) => tracing::warn!(id = id.as_ref(), "skipping global with invalid module id"),
            }
        }
        self
    }

    /// Registers intercept handlers without requesting anything.
    ///
    /// A handler may be keyed by a module id or by one of its locations; it
    /// runs when that module's resource settles.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidIdentifier`] if any id is invalid; no
    /// handler is registered in that case.
    pub fn intercept(&self, handlers: InterceptMap) -> Result<&Self, LoaderError> {
        let handlers = handlers
            .into_iter()
            .map(|(id, handler)| ModuleId::parse(&id).map(|id| (id, handler)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.shared.state.lock();
        for (id, handler) in handlers {
            state.table.set_handler(id, handler);
        }
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Document Discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Scans the document for `attribute` declarations and registers them.
    pub fn find_in_document(&self, attribute: &str) -> Declarations {
        let declarations = scanner::scan(self.shared.document.as_ref(), attribute);
        self.add_files(declarations.iter());
        declarations
    }

    /// Registers every declaration under the configured attribute and
    /// requests each discovered id.
    pub fn init(&self) -> Declarations {
        let declarations = self.find_in_document(&self.shared.config.attribute);
        for id in declarations.keys() {
            if let Err(error) = self.request(id) {
                tracing::warn!(id = %id, %error, "skipping undeclarable module");
            }
        }
        tracing::info!(
            attribute = %self.shared.config.attribute,
            discovered = declarations.len(),
            "document scan complete"
        );
        declarations
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the value of a defined id or alias.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.shared.state.lock().value(id)
    }

    /// Returns whether an id or alias is defined.
    #[must_use]
    pub fn is_defined(&self, id: &str) -> bool {
        self.shared.state.lock().is_defined(id)
    }

    /// Returns the lifecycle state of an id or alias.
    #[must_use]
    pub fn state(&self, id: &str) -> ModuleState {
        self.shared
            .state
            .lock()
            .record(id)
            .map_or(ModuleState::Unrequested, ModuleRecord::state)
    }

    /// Number of definitions still waiting on dependencies.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Snapshot of the registered files as `{id: "<kind> <url>"}`.
    #[must_use]
    pub fn files(&self) -> IndexMap<String, String> {
        self.shared
            .state
            .lock()
            .table
            .files()
            .map(|(id, location)| (id.to_string(), location.key()))
            .collect()
    }

    /// The global scope resources publish themselves into.
    #[must_use]
    pub fn globals(&self) -> &GlobalScope {
        &self.shared.globals
    }

    /// The hosting document.
    #[must_use]
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.shared.document
    }

    /// The resource fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &ResourceFetcher {
        &self.shared.fetcher
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.shared.config
    }

    /// Resets the registry to empty: modules, queued definitions, files,
    /// globals paths, aliases, handlers and fetched resources.
    ///
    /// The document and the global scope belong to the host and are kept.
    pub fn clean(&self) {
        let previous = {
            let mut state = self.shared.state.lock();
            let resolving = state.resolving;
            let previous = core::mem::take(&mut *state);
            state.resolving = resolving;
            previous
        };
        self.shared.fetcher.reset();
        tracing::debug!(
            modules = previous.modules.len(),
            pending = previous.pending.len(),
            "registry cleaned"
        );
    }
}
