use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{Error, Result};

/// Time stored for an event kind that is not scheduled.
pub const IDLE_TIME: f64 = 1.0e30;

/// Pending times at or above this bound are never selected.
const PENDING_BOUND: f64 = 1.0e29;

const NUM_KINDS: usize = 2;

/// Kinds of events in the simulation, in the order they win ties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A customer arrives.
    Arrival,
    /// The customer in service leaves.
    Departure,
}

impl EventKind {
    fn index(self) -> usize {
        match self {
            Self::Arrival => 0,
            Self::Departure => 1,
        }
    }
}

/// Event list: the next scheduled time of every event kind, and the simulation clock.
///
/// The clock only moves in [`select_next`](Calendar::select_next), and always to the earliest
/// pending time.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    next: [f64; NUM_KINDS],
    time: f64,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            next: [IDLE_TIME; NUM_KINDS],
            time: 0.0,
        }
    }
}

impl Calendar {
    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sets the time of the next event of `kind`, overwriting whatever was scheduled.
    pub fn schedule_at(&mut self, kind: EventKind, time: f64) {
        debug_assert!(time >= self.time, "scheduled {} in the past", kind);
        self.next[kind.index()] = time;
    }

    /// Removes the pending event of `kind`, if any.
    pub fn cancel(&mut self, kind: EventKind) {
        self.next[kind.index()] = IDLE_TIME;
    }

    /// The time stored for `kind`; [`IDLE_TIME`] if it was never scheduled or got cancelled.
    #[must_use]
    pub fn next_time(&self, kind: EventKind) -> f64 {
        self.next[kind.index()]
    }

    /// Checks whether an event of `kind` is pending.
    #[must_use]
    pub fn is_scheduled(&self, kind: EventKind) -> bool {
        self.next_time(kind) < PENDING_BOUND
    }

    /// Selects the earliest pending event and advances the clock to its time.
    ///
    /// Kinds are scanned in declaration order and only a strictly earlier time replaces the
    /// current candidate, so an arrival wins a tie with a departure.
    /// The selected event stays in the calendar; the handler is expected to reschedule or
    /// cancel it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CalendarEmpty`] if nothing is pending; the clock is not moved then.
    pub fn select_next(&mut self) -> Result<(EventKind, f64)> {
        let mut selected = None;
        let mut min_time = PENDING_BOUND;
        for kind in EventKind::iter() {
            let time = self.next_time(kind);
            if time < min_time {
                min_time = time;
                selected = Some(kind);
            }
        }
        let kind = selected.ok_or(Error::CalendarEmpty { time: self.time })?;
        self.time = min_time;
        Ok((kind, min_time))
    }
}
