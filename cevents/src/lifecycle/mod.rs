//! Lifecycle Controller: which CEvent is current
//!
//! Driven by two host signals:
//!
//! ```text
//! round restarted → deactivate current (if any), pop the queue front,
//!                   activate it if it is an event
//! round started   → abort current if fewer players are ready than it needs
//! ```
//!
//! Activating or deactivating means calling the host's hook registration
//! for the event and for every global event. Each call is isolated: a
//! failing hook is logged and the remaining calls still run.

mod host;

pub use host::{HookResult, RoundHost};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::event::{EventId, EventInstance, GlobalCEvent, HookTarget};
use crate::queue::EventQueue;

/// Transition records kept for inspection
const MAX_TRANSITIONS: usize = 128;

/// Identity of an event occurrence in a transition record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: EventId,
    pub name: String,
    pub occurrence: u64,
}

impl From<&EventInstance> for EventSummary {
    fn from(instance: &EventInstance) -> Self {
        Self {
            id: instance.id(),
            name: instance.name().to_string(),
            occurrence: instance.occurrence(),
        }
    }
}

/// Why the current event changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionReason {
    /// The round ended and the previous event was cleared
    RoundRestarted,
    /// The queue front was activated
    Dequeued,
    /// Not enough ready players at round start
    NotEnoughPlayers { ready: u32, required: u32 },
    /// Administrative switch
    Manual,
    /// Scheduler shut down
    Shutdown,
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRestarted => write!(f, "round restarted"),
            Self::Dequeued => write!(f, "dequeued"),
            Self::NotEnoughPlayers { ready, required } => {
                write!(f, "not enough players ({}/{})", ready, required)
            }
            Self::Manual => write!(f, "manual"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// One change of the current event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: Option<EventSummary>,
    pub to: Option<EventSummary>,
    pub reason: TransitionReason,
    pub at: DateTime<Utc>,
}

/// Holds the current event and swaps it on host signals
#[derive(Debug)]
pub struct LifecycleController {
    current: Option<EventInstance>,
    globals_active: bool,
    globals_in_normal_rounds: bool,
    transitions: VecDeque<TransitionRecord>,
}

impl LifecycleController {
    pub fn new() -> Self {
        Self {
            current: None,
            globals_active: false,
            globals_in_normal_rounds: true,
            transitions: VecDeque::new(),
        }
    }

    /// Whether global events are re-activated on a switch to an ordinary round
    pub fn set_globals_in_normal_rounds(&mut self, enabled: bool) {
        self.globals_in_normal_rounds = enabled;
    }

    pub fn current(&self) -> Option<&EventInstance> {
        self.current.as_ref()
    }

    /// Whether the host currently has global hooks registered
    pub fn globals_active(&self) -> bool {
        self.globals_active
    }

    /// Most recent transitions, oldest first
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> + '_ {
        self.transitions.iter()
    }

    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.transitions.back()
    }

    /// Host signal: the round restarted.
    ///
    /// Clears the current event, then consumes one queue slot. Returns the
    /// id of the event that is now current, if any.
    pub fn on_round_restarted(
        &mut self,
        queue: &mut EventQueue,
        globals: &[Arc<dyn GlobalCEvent>],
        host: &mut dyn RoundHost,
    ) -> Option<EventId> {
        if self.current.is_some() {
            self.switch_to(None, TransitionReason::RoundRestarted, globals, host);
            debug!("Unregistered events");
        }

        match queue.dequeue_next() {
            Some(Some(next)) => {
                let (id, name) = (next.id(), next.name().to_string());
                self.switch_to(Some(next), TransitionReason::Dequeued, globals, host);
                debug!(id, name = %name, "Registered event");
                Some(id)
            }
            Some(None) => {
                debug!(remaining = queue.len(), "Normal round dequeued");
                None
            }
            None => None,
        }
    }

    /// Host signal: the round started with `ready` players.
    ///
    /// Aborts the current event when it needs more players. The queue is not
    /// touched and the aborted occurrence is dropped. Returns true on abort.
    pub fn on_round_started(
        &mut self,
        ready: u32,
        globals: &[Arc<dyn GlobalCEvent>],
        host: &mut dyn RoundHost,
    ) -> bool {
        let Some(current) = self.current.as_ref() else {
            return false;
        };
        let Some(required) = current.players_required() else {
            return false;
        };
        if ready >= required {
            return false;
        }

        let (id, name) = (current.id(), current.name().to_string());
        self.switch_to(
            None,
            TransitionReason::NotEnoughPlayers { ready, required },
            globals,
            host,
        );
        warn!(
            id,
            name = %name,
            ready,
            required,
            "{} ({}) could not run because there were not enough players ({}/{})",
            name,
            id,
            ready,
            required
        );
        true
    }

    /// Administrative stop: ask the host for a round restart.
    ///
    /// State is not changed here; the host's round-restarted signal clears
    /// the current event. Returns false when nothing is running.
    pub fn stop_current(&self, host: &mut dyn RoundHost) -> bool {
        let Some(current) = self.current.as_ref() else {
            return false;
        };
        debug!(id = current.id(), name = current.name(), "Stopping current event");
        host.request_round_restart();
        true
    }

    /// Replace the current event.
    ///
    /// Global hooks and the old event's hooks are removed first, then the new
    /// event and the globals are registered. Globals are also re-registered
    /// for an ordinary round unless disabled. Returns the replaced occurrence.
    pub fn switch_to(
        &mut self,
        next: Option<EventInstance>,
        reason: TransitionReason,
        globals: &[Arc<dyn GlobalCEvent>],
        host: &mut dyn RoundHost,
    ) -> Option<EventInstance> {
        let activate_globals = next.is_some() || self.globals_in_normal_rounds;
        self.swap(next, reason, activate_globals, globals, host)
    }

    /// Deactivate everything without re-activating globals.
    pub fn shutdown(
        &mut self,
        globals: &[Arc<dyn GlobalCEvent>],
        host: &mut dyn RoundHost,
    ) -> Option<EventInstance> {
        self.swap(None, TransitionReason::Shutdown, false, globals, host)
    }

    fn swap(
        &mut self,
        next: Option<EventInstance>,
        reason: TransitionReason,
        activate_globals: bool,
        globals: &[Arc<dyn GlobalCEvent>],
        host: &mut dyn RoundHost,
    ) -> Option<EventInstance> {
        if self.globals_active {
            for global in globals {
                unhook(host, HookTarget::Global(global.as_ref()));
            }
            self.globals_active = false;
        }

        let previous = self.current.take();
        if let Some(previous) = previous.as_ref() {
            unhook(host, HookTarget::Event(previous));
        }

        self.current = next;
        if let Some(current) = self.current.as_ref() {
            hook(host, HookTarget::Event(current));
        }

        if activate_globals {
            for global in globals {
                hook(host, HookTarget::Global(global.as_ref()));
            }
            self.globals_active = true;
        }

        self.record(TransitionRecord {
            from: previous.as_ref().map(EventSummary::from),
            to: self.current.as_ref().map(EventSummary::from),
            reason,
            at: Utc::now(),
        });
        previous
    }

    fn record(&mut self, record: TransitionRecord) {
        debug!(
            from = ?record.from.as_ref().map(|s| s.id),
            to = ?record.to.as_ref().map(|s| s.id),
            reason = %record.reason,
            "Current event changed"
        );
        if self.transitions.len() == MAX_TRANSITIONS {
            self.transitions.pop_front();
        }
        self.transitions.push_back(record);
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

fn hook(host: &mut dyn RoundHost, target: HookTarget<'_>) {
    if let Err(e) = host.register_hooks(target) {
        error!(
            id = target.id(),
            name = target.name(),
            "Failed to register hooks: {:#}",
            e
        );
    }
}

fn unhook(host: &mut dyn RoundHost, target: HookTarget<'_>) {
    if let Err(e) = host.unregister_hooks(target) {
        error!(
            id = target.id(),
            name = target.name(),
            "Failed to unregister hooks: {:#}",
            e
        );
    }
}
