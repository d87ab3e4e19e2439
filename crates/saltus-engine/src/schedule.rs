//! The event table: pending internal events ordered by time.
//!
//! [`EventTable`] holds at most one pending entry per simulator. Ties
//! at the same time resolve by ascending [`SimulatorId`], which is
//! creation order, so runs over the same structure are deterministic.
//!
//! Internally the table pairs a min-heap with a live-entry map.
//! Rescheduling or cancelling does not search the heap; it bumps a
//! sequence number so the superseded heap entry is recognized as
//! stale and discarded when it surfaces.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use saltus_core::{SimTime, SimulatorId};

// ── ScheduleError ──────────────────────────────────────────────────

/// Errors from [`EventTable::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// The requested time is earlier than the simulator's last event.
    BackwardSchedule {
        /// The simulator being scheduled.
        simulator: SimulatorId,
        /// The rejected time.
        time: SimTime,
        /// The simulator's last recorded event time.
        last_event_time: SimTime,
    },
    /// Only finite times can be scheduled; a passive model simply has
    /// no entry in the table.
    NonFiniteTime {
        /// The simulator being scheduled.
        simulator: SimulatorId,
        /// The rejected time.
        time: SimTime,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackwardSchedule {
                simulator,
                time,
                last_event_time,
            } => write!(
                f,
                "simulator {simulator}: schedule at {time} is before its last event at {last_event_time}"
            ),
            Self::NonFiniteTime { simulator, time } => {
                write!(f, "simulator {simulator}: schedule time {time} is not finite")
            }
        }
    }
}

impl Error for ScheduleError {}

// ── EventTable ─────────────────────────────────────────────────────

/// Heap entry ordered by `(time, simulator, seq)`. The derived `Ord`
/// relies on this field order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    time: SimTime,
    simulator: SimulatorId,
    seq: u64,
}

#[derive(Clone, Copy, Debug)]
struct LiveEntry {
    time: SimTime,
    seq: u64,
}

/// The pending-event table.
#[derive(Debug, Default)]
pub struct EventTable {
    heap: BinaryHeap<Reverse<HeapEntry>>,
    live: IndexMap<SimulatorId, LiveEntry>,
    seq: u64,
}

impl EventTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `simulator` at `time`, replacing any prior entry.
    ///
    /// `last_event_time` is the simulator's most recent transition
    /// time; scheduling before it is rejected.
    pub fn schedule(
        &mut self,
        simulator: SimulatorId,
        time: SimTime,
        last_event_time: SimTime,
    ) -> Result<(), ScheduleError> {
        if !time.is_finite() {
            return Err(ScheduleError::NonFiniteTime { simulator, time });
        }
        if time < last_event_time {
            return Err(ScheduleError::BackwardSchedule {
                simulator,
                time,
                last_event_time,
            });
        }
        self.seq += 1;
        let seq = self.seq;
        self.live.insert(simulator, LiveEntry { time, seq });
        self.heap.push(Reverse(HeapEntry {
            time,
            simulator,
            seq,
        }));
        Ok(())
    }

    /// Cancel the pending entry for `simulator`, if any.
    ///
    /// Returns whether an entry existed. The heap entry stays behind
    /// and is discarded as stale later.
    pub fn cancel(&mut self, simulator: SimulatorId) -> bool {
        self.live.swap_remove(&simulator).is_some()
    }

    /// Earliest pending time, discarding stale heap entries.
    pub fn peek_time(&mut self) -> Option<SimTime> {
        while let Some(&Reverse(entry)) = self.heap.peek() {
            match self.live.get(&entry.simulator) {
                Some(live) if live.seq == entry.seq => return Some(entry.time),
                _ => {
                    self.heap.pop();
                }
            }
        }
        None
    }

    /// Remove and return every simulator pending at the minimum time.
    ///
    /// The returned set is in ascending [`SimulatorId`] order. Returns
    /// `None` when the table is empty.
    pub fn pop_imminent(&mut self) -> Option<(SimTime, Vec<SimulatorId>)> {
        let time = self.peek_time()?;
        let mut imminent = Vec::new();
        while let Some(&Reverse(entry)) = self.heap.peek() {
            if entry.time != time {
                break;
            }
            self.heap.pop();
            if let Some(live) = self.live.get(&entry.simulator) {
                if live.seq == entry.seq {
                    self.live.swap_remove(&entry.simulator);
                    imminent.push(entry.simulator);
                }
            }
        }
        Some((time, imminent))
    }

    /// Whether `simulator` has a pending entry.
    pub fn contains(&self, simulator: SimulatorId) -> bool {
        self.live.contains_key(&simulator)
    }

    /// Pending time for `simulator`, if any.
    pub fn pending_time(&self, simulator: SimulatorId) -> Option<SimTime> {
        self.live.get(&simulator).map(|entry| entry.time)
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no entries are pending.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drop every pending entry.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }
}
