//! Built-in example events
//!
//! Registered through [`builtin_catalog`], and only when the settings enable
//! examples.

mod no_escape;
mod nuke_run;
mod nuke_run_loadout;

pub use no_escape::NoEscape;
pub use nuke_run::NukeRun;
pub use nuke_run_loadout::{LoadoutConfig, NukeRunWithLoadout};

use crate::registry::{CandidateEvent, EventCatalog};

/// Catalog name of the built-in examples
pub const BUILTIN_CATALOG: &str = "builtin";

/// All built-in examples, each marked as an example candidate.
pub fn builtin_catalog() -> EventCatalog {
    EventCatalog::new(BUILTIN_CATALOG)
        .with(CandidateEvent::event::<NukeRun>().example())
        .with(CandidateEvent::event::<NukeRunWithLoadout>().example())
        .with(CandidateEvent::global(NoEscape).example())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Definition;
    use crate::registry::{CatalogOutcome, RegisterOutcome, Registry};
    use crate::settings::Settings;

    #[test]
    fn test_builtin_catalog_registers_everything() {
        let mut registry = Registry::with_settings(Settings::default());
        let CatalogOutcome::Loaded(report) = registry.register_catalog(builtin_catalog()) else {
            panic!("builtin catalog should load");
        };
        assert!(report.all_registered());
        assert_eq!(report.events_registered, 2);
        assert_eq!(report.globals_registered, 1);
        assert_eq!(registry.find(1).map(|e| e.name()), Some("Nuke Run"));
        assert_eq!(registry.find(2).map(|e| e.usage()), Some("<medkits> <colas>".to_string()));
    }

    #[test]
    fn test_builtin_catalog_respects_enable_examples() {
        let settings = Settings {
            enable_examples: false,
            ..Settings::default()
        };
        let mut registry = Registry::with_settings(settings);
        let CatalogOutcome::Loaded(report) = registry.register_catalog(builtin_catalog()) else {
            panic!("builtin catalog should load");
        };
        assert_eq!(report.events_attempted, 0);
        assert_eq!(report.globals_attempted, 0);
        assert!(registry.events().is_empty());
        assert!(registry.globals().is_empty());
    }

    #[test]
    fn test_direct_registration_respects_enable_examples() {
        let settings = Settings {
            enable_examples: false,
            ..Settings::default()
        };
        let mut registry = Registry::with_settings(settings);

        let outcome = registry.register(Definition::event::<NukeRunWithLoadout>());
        assert_eq!(outcome, Ok(RegisterOutcome::Skipped));
        let outcome = registry.register(Definition::global(NoEscape));
        assert_eq!(outcome, Ok(RegisterOutcome::Skipped));

        assert!(registry.find(NukeRunWithLoadout::ID).is_none());
        assert!(registry.globals().is_empty());
    }

    #[test]
    fn test_deferred_examples_filtered_on_configure() {
        let mut registry = Registry::new();
        registry.register(Definition::event::<NukeRun>()).unwrap();
        registry.configure(Settings {
            enable_examples: false,
            ..Settings::default()
        });
        assert!(registry.events().is_empty());

        let mut registry = Registry::with_settings(Settings::default());
        let outcome = registry.register(Definition::event::<NukeRun>());
        assert_eq!(outcome, Ok(RegisterOutcome::Registered));
        assert_eq!(registry.find(NukeRun::ID).map(|e| e.name()), Some("Nuke Run"));
    }
}
