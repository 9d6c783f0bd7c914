//! Event Registry: identity-checked set of CEvents and global events
//!
//! Holds one template per registered CEvent together with the constructor
//! used to build fresh occurrences at queue time. Global events are kept in
//! registration order and never enter the id index.
//!
//! Registration is two-phase. Until [`Registry::configure`] supplies the
//! settings, every request is buffered; configuring replays the buffer in
//! registration order. Replays drain the buffer, so they happen once.

mod catalog;

pub use catalog::{CandidateEvent, CandidateKind, CatalogOutcome, CatalogReport, EventCatalog};

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::event::{
    CEvent, Definition, EventConstructor, EventId, EventInstance, GlobalCEvent, SharedConfig,
    GLOBAL_EVENT_ID,
};
use crate::settings::Settings;

/// Registration conflicts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("CEvent {name}: id 0 is reserved for global events")]
    ReservedId { name: String },

    #[error("CEvent {name}: id {id} already registered by {existing}")]
    DuplicateId {
        id: EventId,
        name: String,
        existing: String,
    },

    #[error("{name} cannot be instantiated")]
    Placeholder { name: String },
}

/// Result type for registration
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// What happened to a registration request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Added to the registry
    Registered,
    /// The definition opted out via `register_event() == false`, or is an
    /// example while examples are disabled
    Skipped,
    /// Settings are not available yet; replayed on [`Registry::configure`]
    Deferred,
}

/// A registered CEvent: its template plus the constructor for occurrences
pub struct RegisteredEvent {
    template: Box<dyn CEvent>,
    constructor: EventConstructor,
}

impl RegisteredEvent {
    pub fn id(&self) -> EventId {
        self.template.id()
    }

    pub fn name(&self) -> &str {
        self.template.name()
    }

    pub fn description(&self) -> &str {
        self.template.description()
    }

    pub fn players_required(&self) -> Option<u32> {
        self.template.players_required()
    }

    /// The template instance built at registration time
    pub fn template(&self) -> &dyn CEvent {
        self.template.as_ref()
    }

    /// Config tokens the queue command must supply
    pub fn expected_args(&self) -> usize {
        self.template.default_config().expected_args()
    }

    /// Usage fragment for the queue command
    pub fn usage(&self) -> String {
        self.template.default_config().usage().to_string()
    }
}

impl std::fmt::Debug for RegisteredEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredEvent")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

#[derive(Debug)]
enum PendingRegistration {
    Definition(Definition),
    Catalog(EventCatalog),
}

/// Registry of CEvents and global events
pub struct Registry {
    settings: Option<Settings>,
    events: Vec<RegisteredEvent>,
    globals: Vec<Arc<dyn GlobalCEvent>>,
    pending: Vec<PendingRegistration>,
    loaded_catalogs: HashSet<String>,
    next_occurrence: u64,
}

impl Registry {
    /// Create a registry that defers registration until configured
    pub fn new() -> Self {
        Self {
            settings: None,
            events: Vec::new(),
            globals: Vec::new(),
            pending: Vec::new(),
            loaded_catalogs: HashSet::new(),
            next_occurrence: 1,
        }
    }

    /// Create an already-configured registry
    pub fn with_settings(settings: Settings) -> Self {
        let mut registry = Self::new();
        registry.settings = Some(settings);
        registry
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// Supply settings and replay deferred registrations in order.
    ///
    /// Returns the reports of catalogs loaded during the replay. Failures of
    /// individual definitions are logged and do not stop the replay.
    pub fn configure(&mut self, settings: Settings) -> Vec<CatalogReport> {
        self.settings = Some(settings);

        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            debug!(count = pending.len(), "Replaying deferred registrations");
        }

        let mut reports = Vec::new();
        for request in pending {
            match request {
                PendingRegistration::Definition(definition) => {
                    // Conflicts are already logged by register_now.
                    let _ = self.register_now(definition);
                }
                PendingRegistration::Catalog(catalog) => {
                    if let CatalogOutcome::Loaded(report) = self.register_catalog(catalog) {
                        reports.push(report);
                    }
                }
            }
        }
        reports
    }

    /// Register one definition.
    pub fn register(&mut self, definition: Definition) -> RegistrationResult<RegisterOutcome> {
        if !self.is_configured() {
            debug!(?definition, "Settings not loaded, deferring registration");
            self.pending.push(PendingRegistration::Definition(definition));
            return Ok(RegisterOutcome::Deferred);
        }
        self.register_now(definition)
    }

    fn register_now(&mut self, definition: Definition) -> RegistrationResult<RegisterOutcome> {
        match definition {
            Definition::Global(global) => Ok(self.register_global(global)),
            Definition::Event(constructor) => {
                let template = constructor();
                let result = self.register_event(template, constructor);
                if let Err(e) = &result {
                    error!("Failed to load CEvent: {}", e);
                }
                result
            }
        }
    }

    fn examples_enabled(&self) -> bool {
        self.settings.as_ref().map_or(true, |s| s.enable_examples)
    }

    fn register_global(&mut self, global: Arc<dyn GlobalCEvent>) -> RegisterOutcome {
        if !global.register_event() {
            debug!(?global, "GlobalCEvent opted out of registration");
            return RegisterOutcome::Skipped;
        }
        if global.is_example() && !self.examples_enabled() {
            debug!(?global, "Examples disabled, skipping");
            return RegisterOutcome::Skipped;
        }
        self.globals.push(global);
        debug!(count = self.globals.len(), "A GlobalCEvent was registered successfully");
        RegisterOutcome::Registered
    }

    fn register_event(
        &mut self,
        template: Box<dyn CEvent>,
        constructor: EventConstructor,
    ) -> RegistrationResult<RegisterOutcome> {
        if !template.register_event() {
            debug!(name = template.name(), "CEvent opted out of registration");
            return Ok(RegisterOutcome::Skipped);
        }
        if template.is_example() && !self.examples_enabled() {
            debug!(name = template.name(), "Examples disabled, skipping");
            return Ok(RegisterOutcome::Skipped);
        }

        debug!(name = template.name(), id = template.id(), "Loading CEvent");

        if template.id() == GLOBAL_EVENT_ID {
            return Err(RegistrationError::ReservedId {
                name: template.name().to_string(),
            });
        }

        if let Some(existing) = self.find(template.id()) {
            return Err(RegistrationError::DuplicateId {
                id: template.id(),
                name: template.name().to_string(),
                existing: existing.name().to_string(),
            });
        }

        debug!(name = template.name(), id = template.id(), "CEvent registered successfully");
        self.events.push(RegisteredEvent {
            template,
            constructor,
        });
        Ok(RegisterOutcome::Registered)
    }

    /// Filter, instantiate and register every candidate in a catalog.
    ///
    /// Placeholders are skipped, as are examples unless the settings enable
    /// them. One candidate failing does not stop the rest. A catalog name is
    /// loaded at most once per registry.
    pub fn register_catalog(&mut self, catalog: EventCatalog) -> CatalogOutcome {
        if self.loaded_catalogs.contains(&catalog.name) {
            debug!(catalog = %catalog.name, "Catalog already loaded");
            return CatalogOutcome::AlreadyLoaded;
        }

        let Some(settings) = self.settings.as_ref() else {
            let waiting = self.pending.iter().any(|p| {
                matches!(p, PendingRegistration::Catalog(c) if c.name == catalog.name)
            });
            if !waiting {
                debug!(catalog = %catalog.name, "Settings not loaded, deferring catalog");
                self.pending.push(PendingRegistration::Catalog(catalog));
            }
            return CatalogOutcome::Deferred;
        };
        let enable_examples = settings.enable_examples;

        debug!(catalog = %catalog.name, "Loading catalog");
        self.loaded_catalogs.insert(catalog.name.clone());

        let mut report = CatalogReport::new(&catalog.name);
        for candidate in catalog.candidates {
            if candidate.example && !enable_examples {
                debug!(candidate = %candidate.type_name, "Examples disabled, skipping");
                continue;
            }

            match candidate.kind {
                CandidateKind::Event(None) | CandidateKind::Global(None) => {
                    debug!(candidate = %candidate.type_name, "Skipping non-instantiable candidate");
                }
                CandidateKind::Event(Some(constructor)) => {
                    report.events_attempted += 1;
                    let template = constructor();
                    match self.register_event(template, constructor) {
                        Ok(RegisterOutcome::Registered) => report.events_registered += 1,
                        Ok(_) => {}
                        Err(e) => {
                            error!(
                                catalog = %catalog.name,
                                candidate = %candidate.type_name,
                                "Error loading CEvent: {}",
                                e
                            );
                            report.errors.push(e.to_string());
                        }
                    }
                }
                CandidateKind::Global(Some(global)) => {
                    report.globals_attempted += 1;
                    if self.register_global(global) == RegisterOutcome::Registered {
                        report.globals_registered += 1;
                    }
                }
            }
        }

        info!(
            catalog = %report.catalog,
            "Loaded catalog: {}/{} CEvents registered, {}/{} GlobalCEvents registered",
            report.events_registered,
            report.events_attempted,
            report.globals_registered,
            report.globals_attempted
        );
        CatalogOutcome::Loaded(report)
    }

    /// Remove a CEvent by id. Returns whether it was registered.
    pub fn unregister(&mut self, id: EventId) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id() != id);
        let removed = self.events.len() != before;
        if removed {
            debug!(id, "Unregistered CEvent");
        }
        removed
    }

    /// Remove every CEvent. Global events are left alone.
    pub fn unregister_all(&mut self) -> usize {
        let removed = self.events.len();
        self.events.clear();
        debug!(removed, "Unregistered all CEvents");
        removed
    }

    /// Remove every global event.
    pub fn unregister_all_globals(&mut self) -> usize {
        let removed = self.globals.len();
        self.globals.clear();
        removed
    }

    pub fn find(&self, id: EventId) -> Option<&RegisteredEvent> {
        self.events.iter().find(|e| e.id() == id)
    }

    /// Registered CEvents in registration order
    pub fn events(&self) -> &[RegisteredEvent] {
        &self.events
    }

    /// Registered global events in registration order
    pub fn globals(&self) -> &[Arc<dyn GlobalCEvent>] {
        &self.globals
    }

    /// Number of buffered registration requests
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Build a fresh occurrence of a registered CEvent carrying `config`.
    pub fn instantiate(&mut self, id: EventId, config: SharedConfig) -> Option<EventInstance> {
        let event = (self.find(id)?.constructor)();
        let occurrence = self.next_occurrence;
        self.next_occurrence += 1;
        Some(EventInstance::new(occurrence, event, config))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
