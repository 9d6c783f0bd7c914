//! CEvent Core Library
//!
//! Scheduling for mutually exclusive special-round events ("CEvents") in a
//! round-based host process. This library provides:
//! - Event definitions with per-occurrence configs parsed from command tokens
//! - A registry that enforces unique ids and buffers registrations until
//!   settings are available
//! - A round queue with `run_in` padding and positional insert
//! - A lifecycle controller that swaps the current event on host signals and
//!   keeps global overlays co-active
//! - [`CEventScheduler`], the owned facade a command layer talks to
//!
//! # Usage
//!
//! ```ignore
//! let mut scheduler = CEventScheduler::new(host);
//! scheduler.register_catalog(builtin_catalog());
//! scheduler.configure(Settings::from_env());
//!
//! scheduler.queue(QueueTarget::Event(2), &["3".into(), "1".into()], 2, -1)?;
//! scheduler.notify_round_restarted();
//! scheduler.notify_round_started(ready_players);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod builtin;
pub mod event;
pub mod lifecycle;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod settings;

pub use event::{
    CEvent, CEventConfig, ConfigError, Definition, EventId, EventInstance, GlobalCEvent,
    HookTarget, NoConfig, SharedConfig,
};
pub use lifecycle::{HookResult, RoundHost, TransitionReason, TransitionRecord};
pub use queue::{QueueError, QueuePosition, QueueSlot, RunIn, NORMAL_ROUND};
pub use registry::{CatalogOutcome, CatalogReport, EventCatalog, RegistrationError, Registry};
pub use scheduler::{
    CEventScheduler, EventListing, QueueTarget, QueueView, Queued, ScheduleError, ScheduleResult,
};
pub use settings::{Permissions, Settings, SettingsError};
