//! Event catalogs for bulk registration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::event::{constructor_of, CEvent, EventConstructor, GlobalCEvent};

/// How a catalog candidate is built
#[derive(Clone)]
pub enum CandidateKind {
    /// A CEvent; `None` marks an abstract placeholder
    Event(Option<EventConstructor>),
    /// A global event; `None` marks an abstract placeholder
    Global(Option<Arc<dyn GlobalCEvent>>),
}

/// One entry in a catalog
#[derive(Clone)]
pub struct CandidateEvent {
    /// Name used in logs
    pub type_name: String,
    /// Built-in example, only registered when examples are enabled
    pub example: bool,
    pub kind: CandidateKind,
}

impl CandidateEvent {
    pub fn event<E>() -> Self
    where
        E: CEvent + Default + 'static,
    {
        Self {
            type_name: short_type_name::<E>(),
            example: false,
            kind: CandidateKind::Event(Some(constructor_of::<E>())),
        }
    }

    pub fn global<G>(global: G) -> Self
    where
        G: GlobalCEvent + 'static,
    {
        Self {
            type_name: short_type_name::<G>(),
            example: false,
            kind: CandidateKind::Global(Some(Arc::new(global))),
        }
    }

    /// A candidate that cannot be instantiated
    pub fn placeholder(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            example: false,
            kind: CandidateKind::Event(None),
        }
    }

    /// Mark as a built-in example
    pub fn example(mut self) -> Self {
        self.example = true;
        self
    }
}

impl fmt::Debug for CandidateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            CandidateKind::Event(Some(_)) => "event",
            CandidateKind::Global(Some(_)) => "global",
            _ => "placeholder",
        };
        f.debug_struct("CandidateEvent")
            .field("type_name", &self.type_name)
            .field("example", &self.example)
            .field("kind", &kind)
            .finish()
    }
}

fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// A named set of candidates, registered together
#[derive(Debug, Clone)]
pub struct EventCatalog {
    pub name: String,
    pub candidates: Vec<CandidateEvent>,
}

impl EventCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    pub fn with(mut self, candidate: CandidateEvent) -> Self {
        self.candidates.push(candidate);
        self
    }
}

/// Outcome of loading one catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReport {
    pub catalog: String,
    pub events_attempted: usize,
    pub events_registered: usize,
    pub globals_attempted: usize,
    pub globals_registered: usize,
    /// One message per rejected candidate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CatalogReport {
    pub(crate) fn new(catalog: &str) -> Self {
        Self {
            catalog: catalog.to_string(),
            ..Default::default()
        }
    }

    pub fn all_registered(&self) -> bool {
        self.events_registered == self.events_attempted
            && self.globals_registered == self.globals_attempted
    }
}

/// What [`Registry::register_catalog`](super::Registry::register_catalog) did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOutcome {
    Loaded(CatalogReport),
    /// Buffered until settings are available
    Deferred,
    /// A catalog with this name was loaded before
    AlreadyLoaded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventId;
    use crate::registry::Registry;
    use crate::settings::Settings;

    #[derive(Debug, Default)]
    struct Alpha;

    impl CEvent for Alpha {
        fn id(&self) -> EventId {
            11
        }

        fn name(&self) -> &str {
            "Alpha"
        }
    }

    #[derive(Debug, Default)]
    struct AlphaClone;

    impl CEvent for AlphaClone {
        fn id(&self) -> EventId {
            11
        }

        fn name(&self) -> &str {
            "Alpha Clone"
        }
    }

    #[derive(Debug, Default)]
    struct Beta;

    impl CEvent for Beta {
        fn id(&self) -> EventId {
            12
        }

        fn name(&self) -> &str {
            "Beta"
        }
    }

    #[derive(Debug)]
    struct Watcher;

    impl GlobalCEvent for Watcher {}

    fn catalog() -> EventCatalog {
        EventCatalog::new("plugin")
            .with(CandidateEvent::placeholder("AbstractRound"))
            .with(CandidateEvent::event::<Alpha>())
            .with(CandidateEvent::event::<AlphaClone>())
            .with(CandidateEvent::event::<Beta>().example())
            .with(CandidateEvent::global(Watcher))
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(CandidateEvent::event::<Alpha>().type_name, "Alpha");
    }

    #[test]
    fn test_catalog_isolates_failures() {
        let mut registry = Registry::with_settings(Settings::default());
        let CatalogOutcome::Loaded(report) = registry.register_catalog(catalog()) else {
            panic!("catalog should load");
        };

        assert_eq!(report.events_attempted, 3);
        assert_eq!(report.events_registered, 2);
        assert_eq!(report.globals_attempted, 1);
        assert_eq!(report.globals_registered, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(!report.all_registered());

        let names: Vec<&str> = registry.events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_examples_filtered_when_disabled() {
        let settings = Settings {
            enable_examples: false,
            ..Settings::default()
        };
        let mut registry = Registry::with_settings(settings);
        let CatalogOutcome::Loaded(report) = registry.register_catalog(catalog()) else {
            panic!("catalog should load");
        };

        assert_eq!(report.events_attempted, 2);
        assert!(registry.find(12).is_none());
    }

    #[test]
    fn test_catalog_loaded_once() {
        let mut registry = Registry::with_settings(Settings::default());
        assert!(matches!(
            registry.register_catalog(catalog()),
            CatalogOutcome::Loaded(_)
        ));
        assert_eq!(
            registry.register_catalog(catalog()),
            CatalogOutcome::AlreadyLoaded
        );
        assert_eq!(registry.globals().len(), 1);
    }

    #[test]
    fn test_deferred_catalog_waits_once() {
        let mut registry = Registry::new();
        assert_eq!(registry.register_catalog(catalog()), CatalogOutcome::Deferred);
        assert_eq!(registry.register_catalog(catalog()), CatalogOutcome::Deferred);
        assert_eq!(registry.pending_len(), 1);

        let reports = registry.configure(Settings::default());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].catalog, "plugin");
        assert_eq!(registry.events().len(), 2);
        assert_eq!(registry.globals().len(), 1);
    }
}
