//! CEvent Scheduler: owned registry, queue and lifecycle for one host
//!
//! Everything the command layer and the host need goes through this type.
//! Callers only ever get snapshots or single results back, never mutable
//! access to the queue or the registry's storage.
//!
//! Startup is two-phase: [`CEventScheduler::new`] creates an unconfigured
//! scheduler that buffers registrations, [`CEventScheduler::configure`]
//! supplies settings and replays them. [`CEventScheduler::shutdown`] tears
//! everything down and hands the host back.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::event::{Definition, EventId, EventInstance};
use crate::lifecycle::{LifecycleController, RoundHost, TransitionReason, TransitionRecord};
use crate::queue::{EventQueue, QueueError, QueuePosition, QueueSlot, RunIn, NORMAL_ROUND};
use crate::registry::{
    CatalogOutcome, CatalogReport, EventCatalog, RegisterOutcome, Registry, RegistrationResult,
};
use crate::settings::Settings;

/// Errors surfaced to the command layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid event ID.")]
    InvalidEventId { token: String },

    #[error("Event not found.")]
    UnknownEvent { id: EventId },

    #[error("Expected {expected} config argument(s), got {got}.")]
    WrongArgCount {
        expected: usize,
        got: usize,
        usage: String,
    },

    #[error("{message}")]
    InvalidConfig { message: String, usage: String },

    #[error("No additional arguments allowed for null event.")]
    NormalRoundTakesNoArguments,

    #[error("Too many arguments.")]
    TooManyArguments,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("No event is currently running.")]
    NothingRunning,
}

impl ScheduleError {
    /// Usage fragment of the event involved, for errors that should be
    /// answered with the command usage.
    pub fn usage(&self) -> Option<&str> {
        match self {
            Self::WrongArgCount { usage, .. } | Self::InvalidConfig { usage, .. } => Some(usage),
            _ => None,
        }
    }
}

/// Result type for scheduler operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// What to queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueTarget {
    /// An ordinary round (`null` on the command line)
    NormalRound,
    Event(EventId),
}

impl QueueTarget {
    /// Parse `null` (any case) or an event id.
    pub fn parse(token: &str) -> ScheduleResult<Self> {
        if token.eq_ignore_ascii_case("null") {
            return Ok(Self::NormalRound);
        }
        token
            .parse::<EventId>()
            .map(Self::Event)
            .map_err(|_| ScheduleError::InvalidEventId {
                token: token.to_string(),
            })
    }
}

impl fmt::Display for QueueTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalRound => write!(f, "null"),
            Self::Event(id) => write!(f, "{}", id),
        }
    }
}

/// Listing entry for a registered CEvent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListing {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub players_required: Option<u32>,
    pub usage: String,
}

/// Result of a successful queue operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queued {
    /// Name of the queued event, or "Normal Round"
    pub name: String,
    /// 1-based slot the entry landed on
    pub position: usize,
    pub run_in: usize,
}

/// Queue snapshot with the current event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueView {
    pub current: Option<String>,
    pub current_id: Option<EventId>,
    pub slots: Vec<QueueSlot>,
}

impl QueueView {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Owns the scheduling state for one host
pub struct CEventScheduler<H: RoundHost> {
    registry: Registry,
    queue: EventQueue,
    lifecycle: LifecycleController,
    host: H,
}

impl<H: RoundHost> CEventScheduler<H> {
    /// Create an unconfigured scheduler; registrations are buffered
    pub fn new(host: H) -> Self {
        Self {
            registry: Registry::new(),
            queue: EventQueue::new(),
            lifecycle: LifecycleController::new(),
            host,
        }
    }

    /// Create and configure in one step
    pub fn with_settings(host: H, settings: Settings) -> Self {
        let mut scheduler = Self::new(host);
        scheduler.configure(settings);
        scheduler
    }

    /// Supply settings and replay buffered registrations
    pub fn configure(&mut self, settings: Settings) -> Vec<CatalogReport> {
        self.lifecycle
            .set_globals_in_normal_rounds(settings.global_events_in_normal_rounds);
        self.registry.configure(settings)
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.registry.settings()
    }

    pub fn register(&mut self, definition: Definition) -> RegistrationResult<RegisterOutcome> {
        self.registry.register(definition)
    }

    pub fn register_catalog(&mut self, catalog: EventCatalog) -> CatalogOutcome {
        self.registry.register_catalog(catalog)
    }

    pub fn unregister(&mut self, id: EventId) -> bool {
        self.registry.unregister(id)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn current(&self) -> Option<&EventInstance> {
        self.lifecycle.current()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> + '_ {
        self.lifecycle.transitions()
    }

    // ------------------------------------------------------------------
    // Host signals
    // ------------------------------------------------------------------

    /// The host restarted the round. Returns the id now current, if any.
    pub fn notify_round_restarted(&mut self) -> Option<EventId> {
        self.lifecycle
            .on_round_restarted(&mut self.queue, self.registry.globals(), &mut self.host)
    }

    /// The host started the round with `ready` players. Returns true when
    /// the current event was aborted.
    pub fn notify_round_started(&mut self, ready: u32) -> bool {
        self.lifecycle
            .on_round_started(ready, self.registry.globals(), &mut self.host)
    }

    // ------------------------------------------------------------------
    // Command-layer operations
    // ------------------------------------------------------------------

    /// Registered CEvents in registration order
    pub fn list_registered(&self) -> Vec<EventListing> {
        self.registry
            .events()
            .iter()
            .map(|e| EventListing {
                id: e.id(),
                name: e.name().to_string(),
                description: e.description().to_string(),
                players_required: e.players_required(),
                usage: e.usage(),
            })
            .collect()
    }

    /// Queue a CEvent occurrence or an ordinary round.
    ///
    /// `config_tokens` must hold exactly the event's expected argument
    /// count. Nothing is mutated unless every check passes.
    pub fn queue(
        &mut self,
        target: QueueTarget,
        config_tokens: &[String],
        run_in: i64,
        position: i64,
    ) -> ScheduleResult<Queued> {
        let entry = match target {
            QueueTarget::NormalRound => {
                if !config_tokens.is_empty() {
                    return Err(ScheduleError::NormalRoundTakesNoArguments);
                }
                None
            }
            QueueTarget::Event(id) => {
                let registered = self
                    .registry
                    .find(id)
                    .ok_or(ScheduleError::UnknownEvent { id })?;

                let expected = registered.expected_args();
                if config_tokens.len() != expected {
                    return Err(ScheduleError::WrongArgCount {
                        expected,
                        got: config_tokens.len(),
                        usage: registered.usage(),
                    });
                }
                Some((id, registered))
            }
        };

        let run_in = RunIn::from_raw(run_in)?;
        let position = QueuePosition::from_raw(position)?;

        let instance = match entry {
            None => None,
            Some((id, registered)) => {
                let config = registered.template().parse_config(config_tokens).map_err(|e| {
                    ScheduleError::InvalidConfig {
                        message: e.to_string(),
                        usage: registered.usage(),
                    }
                })?;
                Some(
                    self.registry
                        .instantiate(id, config)
                        .ok_or(ScheduleError::UnknownEvent { id })?,
                )
            }
        };

        let name = instance
            .as_ref()
            .map_or_else(|| NORMAL_ROUND.to_string(), |i| i.name().to_string());
        let landed = self.queue.enqueue(instance, run_in, position);

        info!(
            event = %target,
            name = %name,
            run_in = run_in.get(),
            position = %position,
            "Queued {} in {} round(s)",
            name,
            run_in
        );
        Ok(Queued {
            name,
            position: landed,
            run_in: run_in.get(),
        })
    }

    /// Remove one queue slot by 1-based position. Returns the removed slot's label.
    pub fn remove_queued(&mut self, position: i64) -> ScheduleResult<String> {
        let removed = self.queue.remove_at(position)?;
        Ok(removed.map_or_else(|| NORMAL_ROUND.to_string(), |e| e.name().to_string()))
    }

    /// Ordered queue snapshot plus the current event
    pub fn view_queue(&self) -> QueueView {
        let current = self.lifecycle.current();
        QueueView {
            current: current.map(|c| c.name().to_string()),
            current_id: current.map(EventInstance::id),
            slots: self.queue.peek_all(),
        }
    }

    /// Empty the queue. Returns how many slots were dropped.
    pub fn clear_queue(&mut self) -> usize {
        self.queue.clear()
    }

    /// Stop the current event by requesting a round restart.
    ///
    /// Returns the name of the event being stopped. The event stays current
    /// until the host delivers the round-restarted signal.
    pub fn stop_current(&mut self) -> ScheduleResult<String> {
        let name = self
            .lifecycle
            .current()
            .map(|c| c.name().to_string())
            .ok_or(ScheduleError::NothingRunning)?;
        self.lifecycle.stop_current(&mut self.host);
        Ok(name)
    }

    /// Make `target` current right away with its default config, bypassing
    /// the queue. `None` switches to an ordinary round.
    pub fn switch_to(&mut self, target: Option<EventId>) -> ScheduleResult<()> {
        let next = match target {
            None => None,
            Some(id) => {
                let config = self
                    .registry
                    .find(id)
                    .ok_or(ScheduleError::UnknownEvent { id })?
                    .template()
                    .default_config();
                self.registry.instantiate(id, config)
            }
        };
        self.lifecycle.switch_to(
            next,
            TransitionReason::Manual,
            self.registry.globals(),
            &mut self.host,
        );
        Ok(())
    }

    /// Deactivate everything, drop the queue and registrations, and return
    /// the host.
    pub fn shutdown(mut self) -> H {
        self.lifecycle
            .shutdown(self.registry.globals(), &mut self.host);
        let dropped = self.queue.clear();
        let events = self.registry.unregister_all();
        let globals = self.registry.unregister_all_globals();
        info!(dropped, events, globals, "Scheduler shut down");
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CEvent, HookTarget};
    use crate::lifecycle::HookResult;

    #[derive(Debug, Default)]
    struct Quiet;

    impl RoundHost for Quiet {
        fn register_hooks(&mut self, _target: HookTarget<'_>) -> HookResult {
            Ok(())
        }

        fn unregister_hooks(&mut self, _target: HookTarget<'_>) -> HookResult {
            Ok(())
        }

        fn request_round_restart(&mut self) {}
    }

    #[derive(Debug, Default)]
    struct Plain;

    impl CEvent for Plain {
        fn id(&self) -> EventId {
            3
        }

        fn name(&self) -> &str {
            "Plain"
        }

        fn description(&self) -> &str {
            "Nothing special"
        }
    }

    fn scheduler() -> CEventScheduler<Quiet> {
        let mut scheduler = CEventScheduler::with_settings(Quiet, Settings::default());
        scheduler.register(Definition::event::<Plain>()).unwrap();
        scheduler
    }

    #[test]
    fn test_queue_target_parse() {
        assert_eq!(QueueTarget::parse("NULL"), Ok(QueueTarget::NormalRound));
        assert_eq!(QueueTarget::parse("7"), Ok(QueueTarget::Event(7)));
        assert_eq!(
            QueueTarget::parse("seven"),
            Err(ScheduleError::InvalidEventId {
                token: "seven".to_string()
            })
        );
    }

    #[test]
    fn test_list_registered() {
        let listing = scheduler().list_registered();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, 3);
        assert_eq!(listing[0].description, "Nothing special");
        assert_eq!(listing[0].usage, "");
    }

    #[test]
    fn test_queue_rejections_leave_queue_untouched() {
        let mut scheduler = scheduler();

        let err = scheduler.queue(QueueTarget::Event(99), &[], 1, -1).unwrap_err();
        assert_eq!(err, ScheduleError::UnknownEvent { id: 99 });

        let err = scheduler
            .queue(QueueTarget::Event(3), &["x".to_string()], 1, -1)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::WrongArgCount { expected: 0, got: 1, .. }));

        let err = scheduler.queue(QueueTarget::Event(3), &[], 0, -1).unwrap_err();
        assert_eq!(err, ScheduleError::Queue(QueueError::InvalidRunIn { run_in: 0 }));

        let err = scheduler.queue(QueueTarget::Event(3), &[], i64::MAX, -1).unwrap_err();
        assert_eq!(err, ScheduleError::Queue(QueueError::InvalidRunIn { run_in: i64::MAX }));

        let err = scheduler.queue(QueueTarget::NormalRound, &[], 100_000_000_000, -1).unwrap_err();
        assert!(matches!(err, ScheduleError::Queue(QueueError::InvalidRunIn { .. })));

        let err = scheduler.queue(QueueTarget::Event(3), &[], 1, 0).unwrap_err();
        assert_eq!(err, ScheduleError::Queue(QueueError::InvalidPosition { position: 0 }));

        let err = scheduler
            .queue(QueueTarget::NormalRound, &["1".to_string()], 1, -1)
            .unwrap_err();
        assert_eq!(err, ScheduleError::NormalRoundTakesNoArguments);

        assert_eq!(scheduler.queue_len(), 0);
    }

    #[test]
    fn test_queue_and_view() {
        let mut scheduler = scheduler();
        let queued = scheduler.queue(QueueTarget::Event(3), &[], 2, -1).unwrap();
        assert_eq!(queued.name, "Plain");
        assert_eq!(queued.position, 2);

        let queued = scheduler.queue(QueueTarget::NormalRound, &[], 1, -1).unwrap();
        assert_eq!(queued.name, NORMAL_ROUND);

        let view = scheduler.view_queue();
        assert!(view.current.is_none());
        let names: Vec<&str> = view.slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![NORMAL_ROUND, "Plain", NORMAL_ROUND]);
    }

    #[test]
    fn test_stop_current_needs_current() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.stop_current(), Err(ScheduleError::NothingRunning));

        scheduler.switch_to(Some(3)).unwrap();
        assert_eq!(scheduler.stop_current(), Ok("Plain".to_string()));
        assert_eq!(scheduler.view_queue().current.as_deref(), Some("Plain"));
    }

    #[test]
    fn test_switch_to_unknown_event() {
        let mut scheduler = scheduler();
        assert_eq!(
            scheduler.switch_to(Some(42)),
            Err(ScheduleError::UnknownEvent { id: 42 })
        );
        assert!(scheduler.current().is_none());
    }

    #[test]
    fn test_error_usage() {
        let err = ScheduleError::InvalidConfig {
            message: "Colas must be an integer.".to_string(),
            usage: "<medkits> <colas>".to_string(),
        };
        assert_eq!(err.usage(), Some("<medkits> <colas>"));
        assert_eq!(err.to_string(), "Colas must be an integer.");
        assert_eq!(ScheduleError::NothingRunning.usage(), None);
    }
}
