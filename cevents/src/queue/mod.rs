//! Round queue
//!
//! An ordered list of upcoming round outcomes. Each slot is either a CEvent
//! occurrence or `None`, an ordinary round. Slots are consumed strictly from
//! the front, one per round restart.
//!
//! Queueing with `run_in > 1` pads the insertion with `run_in - 1` ordinary
//! rounds placed directly before the entry. The padding is not tracked as a
//! group: removing a slot later removes only that slot.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use tracing::debug;

use crate::event::{EventId, EventInstance};

/// Label shown for ordinary-round slots
pub const NORMAL_ROUND: &str = "Normal Round";

/// Errors from queue operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("runIn must be an integer between 1 and {} (got {run_in})", RunIn::MAX)]
    InvalidRunIn { run_in: i64 },

    #[error("position must be -1 or >= 1 (got {position})")]
    InvalidPosition { position: i64 },

    #[error("queue position {position} is out of range (queue has {len} entries)")]
    PositionOutOfRange { position: i64, len: usize },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Where a queued block is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePosition {
    /// Append at the tail (`-1` on the command line)
    End,
    /// Insert before the 1-based slot
    At(NonZeroUsize),
}

impl QueuePosition {
    /// Validate a raw command-line position: `-1` or any value `>= 1`.
    pub fn from_raw(position: i64) -> QueueResult<Self> {
        match position {
            -1 => Ok(Self::End),
            p if p >= 1 => usize::try_from(p)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(Self::At)
                .ok_or(QueueError::InvalidPosition { position }),
            _ => Err(QueueError::InvalidPosition { position }),
        }
    }

    /// Shorthand for [`QueuePosition::At`] with a 1-based offset.
    pub fn at(position: usize) -> Option<Self> {
        NonZeroUsize::new(position).map(Self::At)
    }
}

impl Default for QueuePosition {
    fn default() -> Self {
        Self::End
    }
}

impl fmt::Display for QueuePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::End => write!(f, "end"),
            Self::At(p) => write!(f, "{}", p),
        }
    }
}

/// Number of round cycles until a queued entry takes effect, always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunIn(NonZeroUsize);

impl RunIn {
    /// The next round.
    pub const NEXT: RunIn = RunIn(NonZeroUsize::MIN);

    /// Largest accepted `runIn`. Each unit becomes a queue slot, so the
    /// bound keeps a single command from allocating without limit.
    pub const MAX: usize = 10_000;

    /// Validate a raw command-line `runIn`: `1..=RunIn::MAX`.
    pub fn from_raw(run_in: i64) -> QueueResult<Self> {
        usize::try_from(run_in)
            .ok()
            .filter(|n| *n <= Self::MAX)
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(QueueError::InvalidRunIn { run_in })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Ordinary rounds inserted before the entry.
    pub fn padding(self) -> usize {
        self.0.get() - 1
    }
}

impl Default for RunIn {
    fn default() -> Self {
        Self::NEXT
    }
}

impl fmt::Display for RunIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSlot {
    /// 1-based position
    pub position: usize,
    /// `None` for an ordinary round
    pub event_id: Option<EventId>,
    pub name: String,
}

impl QueueSlot {
    pub fn is_normal_round(&self) -> bool {
        self.event_id.is_none()
    }
}

/// Queue of upcoming rounds
#[derive(Debug, Default)]
pub struct EventQueue {
    slots: VecDeque<Option<EventInstance>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Queue `entry` to take effect `run_in` rounds from now.
    ///
    /// The block `[None; run_in - 1] ++ [entry]` is appended when `position`
    /// is [`QueuePosition::End`] or past the tail, otherwise spliced in
    /// before the given 1-based slot. Returns the 1-based position the entry
    /// itself landed on.
    pub fn enqueue(
        &mut self,
        entry: Option<EventInstance>,
        run_in: RunIn,
        position: QueuePosition,
    ) -> usize {
        let name = entry
            .as_ref()
            .map_or_else(|| NORMAL_ROUND.to_string(), |e| e.name().to_string());

        let block = std::iter::repeat_with(|| None)
            .take(run_in.padding())
            .chain(std::iter::once(entry));

        let start = match position {
            QueuePosition::At(p) if p.get() <= self.slots.len() => p.get() - 1,
            _ => self.slots.len(),
        };

        // Split, extend, rejoin: later slots shift back by the block length.
        let tail = self.slots.split_off(start);
        self.slots.extend(block);
        self.slots.extend(tail);

        let landed = start + run_in.get();
        debug!(
            name = %name,
            run_in = run_in.get(),
            position = %position,
            landed,
            len = self.slots.len(),
            "Queued entry"
        );
        landed
    }

    /// Pop the front slot. `None` means the queue was empty; `Some(None)`
    /// is an ordinary round.
    pub fn dequeue_next(&mut self) -> Option<Option<EventInstance>> {
        self.slots.pop_front()
    }

    /// Remove the single slot at a 1-based position.
    pub fn remove_at(&mut self, position: i64) -> QueueResult<Option<EventInstance>> {
        let len = self.slots.len();
        let index = usize::try_from(position)
            .ok()
            .filter(|p| (1..=len).contains(p))
            .ok_or(QueueError::PositionOutOfRange { position, len })?
            - 1;

        let removed = self
            .slots
            .remove(index)
            .ok_or(QueueError::PositionOutOfRange { position, len })?;

        debug!(
            position,
            name = removed.as_ref().map_or(NORMAL_ROUND, |e| e.name()),
            len = self.slots.len(),
            "Removed queued entry"
        );
        Ok(removed)
    }

    /// Drop every slot. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.slots.len();
        self.slots.clear();
        debug!(removed, "Cleared queue");
        removed
    }

    /// Front slot without consuming it.
    pub fn peek(&self) -> Option<Option<&EventInstance>> {
        self.slots.front().map(Option::as_ref)
    }

    /// Ordered snapshot of every slot.
    pub fn peek_all(&self) -> Vec<QueueSlot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| QueueSlot {
                position: i + 1,
                event_id: slot.as_ref().map(EventInstance::id),
                name: slot
                    .as_ref()
                    .map_or_else(|| NORMAL_ROUND.to_string(), |e| e.name().to_string()),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&EventInstance>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }
}
