//! CEvent definitions
//!
//! A CEvent is a named special-round behavior with a unique id, an optional
//! minimum player count, and a parser that turns command tokens into a
//! config. Game behavior itself (the hooks the host calls during the round)
//! lives with the host; this module only describes the definition.
//!
//! Global events are overlays: they never enter the queue and share the
//! reserved id [`GLOBAL_EVENT_ID`]. They run alongside whatever is current.

pub mod config;

pub use config::{CEventConfig, ConfigError, ConfigResult, NoConfig, SharedConfig};

use std::fmt;
use std::sync::Arc;

/// Identifier of a registered CEvent
pub type EventId = i32;

/// Id reserved for global events
pub const GLOBAL_EVENT_ID: EventId = 0;

/// Name and description reported by every global event
pub const GLOBAL_EVENT_NAME: &str = "GlobalCEvent";

/// A schedulable special-round event.
pub trait CEvent: fmt::Debug + Send + Sync {
    /// Unique id used to queue the event. Must not be [`GLOBAL_EVENT_ID`].
    fn id(&self) -> EventId;

    /// Display name
    fn name(&self) -> &str;

    /// Display description
    fn description(&self) -> &str {
        ""
    }

    /// Minimum ready players at round start, `None` for no minimum.
    fn players_required(&self) -> Option<u32> {
        None
    }

    /// When false, registration is skipped.
    fn register_event(&self) -> bool {
        true
    }

    /// Built-in example; skipped when the settings disable examples.
    fn is_example(&self) -> bool {
        false
    }

    /// Build the default config. Called once per occurrence, so each
    /// call must return a fresh instance.
    fn default_config(&self) -> SharedConfig {
        Arc::new(NoConfig)
    }

    /// Turn exactly `default_config().expected_args()` tokens into a config.
    ///
    /// The caller has already checked the token count; implementations only
    /// validate content.
    fn parse_config(&self, args: &[String]) -> ConfigResult {
        let _ = args;
        Ok(self.default_config())
    }
}

/// An overlay that is co-active with every CEvent.
pub trait GlobalCEvent: fmt::Debug + Send + Sync {
    /// When false, registration is skipped.
    fn register_event(&self) -> bool {
        true
    }

    fn is_example(&self) -> bool {
        false
    }

    fn id(&self) -> EventId {
        GLOBAL_EVENT_ID
    }

    fn name(&self) -> &str {
        GLOBAL_EVENT_NAME
    }
}

/// Constructor for a CEvent. Called once for the registry's template and
/// again for every queued occurrence.
pub type EventConstructor = Arc<dyn Fn() -> Box<dyn CEvent> + Send + Sync>;

/// Wrap a constructor closure.
pub fn constructor<F>(f: F) -> EventConstructor
where
    F: Fn() -> Box<dyn CEvent> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Constructor for a default-constructible event type.
pub fn constructor_of<E>() -> EventConstructor
where
    E: CEvent + Default + 'static,
{
    Arc::new(|| Box::new(E::default()) as Box<dyn CEvent>)
}

/// Something that can be handed to the registry.
#[derive(Clone)]
pub enum Definition {
    /// A round event, built from its constructor
    Event(EventConstructor),
    /// A global overlay
    Global(Arc<dyn GlobalCEvent>),
}

impl Definition {
    pub fn event<E>() -> Self
    where
        E: CEvent + Default + 'static,
    {
        Self::Event(constructor_of::<E>())
    }

    pub fn global<G>(global: G) -> Self
    where
        G: GlobalCEvent + 'static,
    {
        Self::Global(Arc::new(global))
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(_) => f.write_str("Definition::Event(..)"),
            Self::Global(global) => f.debug_tuple("Definition::Global").field(global).finish(),
        }
    }
}

/// One queued occurrence of a CEvent with its own config.
///
/// Two occurrences of the same id never share an instance, so a config
/// parsed for one cannot leak into the other.
pub struct EventInstance {
    occurrence: u64,
    event: Box<dyn CEvent>,
    config: SharedConfig,
}

impl EventInstance {
    pub(crate) fn new(occurrence: u64, event: Box<dyn CEvent>, config: SharedConfig) -> Self {
        Self {
            occurrence,
            event,
            config,
        }
    }

    /// Sequence number distinguishing this occurrence from every other one
    /// created by the same registry.
    pub fn occurrence(&self) -> u64 {
        self.occurrence
    }

    pub fn id(&self) -> EventId {
        self.event.id()
    }

    pub fn name(&self) -> &str {
        self.event.name()
    }

    pub fn description(&self) -> &str {
        self.event.description()
    }

    pub fn players_required(&self) -> Option<u32> {
        self.event.players_required()
    }

    pub fn event(&self) -> &dyn CEvent {
        self.event.as_ref()
    }

    pub fn config(&self) -> &dyn CEventConfig {
        self.config.as_ref()
    }

    /// Typed access to this occurrence's config.
    pub fn config_as<T: CEventConfig>(&self) -> Option<&T> {
        self.config.downcast_ref::<T>()
    }

    /// Whether `ready` players are enough for this occurrence to run.
    pub fn has_enough_players(&self, ready: u32) -> bool {
        self.players_required().map_or(true, |required| ready >= required)
    }
}

impl fmt::Debug for EventInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInstance")
            .field("occurrence", &self.occurrence)
            .field("id", &self.id())
            .field("name", &self.name())
            .field("config", &self.config)
            .finish()
    }
}

/// What a host hook call is about.
#[derive(Debug, Clone, Copy)]
pub enum HookTarget<'a> {
    Event(&'a EventInstance),
    Global(&'a dyn GlobalCEvent),
}

impl HookTarget<'_> {
    pub fn id(&self) -> EventId {
        match self {
            Self::Event(instance) => instance.id(),
            Self::Global(global) => global.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Event(instance) => instance.name(),
            Self::Global(global) => global.name(),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}
