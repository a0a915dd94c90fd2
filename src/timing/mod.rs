/*!
 * Hardware Event Queue
 * Timestamp-ordered queue of pending device and timeout events
 *
 * Entries are keyed by absolute ARM11 cycle count. Entries sharing a timestamp
 * fire in insertion order. A `Panic` sentinel at `u64::MAX` keeps the queue
 * non-empty, so `next_timestamp` always has a value.
 */

use crate::core::limits::ARM11_CLOCK_RATE;
use crate::core::types::Tick;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of hardware event sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EventType {
    /// End of frame, fires every 1/60 s
    VBlank = 0,
    /// Earliest pending wait timeout or sleep expiry
    ThreadWakeup = 1,
    /// DSP audio frame
    RunDsp = 2,
    /// Earliest running kernel timer
    UpdateTimers = 3,
    /// Y2R conversion finished
    SignalY2r = 4,
    /// IR polling
    UpdateIr = 5,
    /// Sentinel, never fires
    Panic = 6,
}

impl EventType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VBlank => "vblank",
            Self::ThreadWakeup => "thread_wakeup",
            Self::RunDsp => "run_dsp",
            Self::UpdateTimers => "update_timers",
            Self::SignalY2r => "signal_y2r",
            Self::UpdateIr => "update_ir",
            Self::Panic => "panic",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert nanoseconds to ARM11 cycles, saturating instead of overflowing
#[inline]
pub fn ns_to_cycles(ns: u64) -> Tick {
    let cycles = ns as u128 * ARM11_CLOCK_RATE as u128 / 1_000_000_000;
    u64::try_from(cycles).unwrap_or(u64::MAX)
}

/// Convert ARM11 cycles to nanoseconds
#[inline]
pub fn cycles_to_ns(cycles: Tick) -> u64 {
    let ns = cycles as u128 * 1_000_000_000 / ARM11_CLOCK_RATE as u128;
    u64::try_from(ns).unwrap_or(u64::MAX)
}

/// Hardware event queue
///
/// # Performance
/// - Ordered multimap on `(timestamp, insertion sequence)`
/// - `next_timestamp` is cached and refreshed on every mutation
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: BTreeMap<(Tick, u64), EventType>,
    seq: u64,
    current: Tick,
    next: Tick,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let mut queue = Self {
            events: BTreeMap::new(),
            seq: 0,
            current: 0,
            next: u64::MAX,
        };
        queue.reset();
        queue
    }

    /// Drop every event, rewind time to zero and re-insert the sentinel
    pub fn reset(&mut self) {
        self.events.clear();
        self.seq = 0;
        self.current = 0;
        self.add_event(EventType::Panic, u64::MAX);
    }

    /// Insert an event at an absolute timestamp
    pub fn add_event(&mut self, event: EventType, timestamp: Tick) {
        let key = (timestamp, self.seq);
        self.seq += 1;
        self.events.insert(key, event);
        self.refresh_next();
    }

    /// Remove the earliest entry of the given type; no-op if absent
    pub fn remove_event(&mut self, event: EventType) {
        let key = self
            .events
            .iter()
            .find(|(_, &e)| e == event)
            .map(|(&k, _)| k);
        if let Some(key) = key {
            self.events.remove(&key);
            self.refresh_next();
        }
    }

    /// Remove any entry of the given type and insert it again at `timestamp`
    pub fn reschedule_event(&mut self, event: EventType, timestamp: Tick) {
        self.remove_event(event);
        self.add_event(event, timestamp);
    }

    /// Timestamp of the entry of the given type, if one is pending
    pub fn scheduled_at(&self, event: EventType) -> Option<Tick> {
        self.events
            .iter()
            .find(|(_, &e)| e == event)
            .map(|(&(ts, _), _)| ts)
    }

    #[inline]
    pub fn contains(&self, event: EventType) -> bool {
        self.scheduled_at(event).is_some()
    }

    /// Pop the earliest event whose timestamp has been reached
    pub fn pop_due(&mut self) -> Option<(Tick, EventType)> {
        let (&key, &event) = self.events.iter().next()?;
        if key.0 > self.current || event == EventType::Panic {
            return None;
        }
        self.events.remove(&key);
        self.refresh_next();
        Some((key.0, event))
    }

    /// Advance the current timestamp (tick-accounting callback)
    #[inline]
    pub fn add_ticks(&mut self, ticks: u64) {
        self.current = self.current.saturating_add(ticks);
    }

    #[inline(always)]
    pub fn current_timestamp(&self) -> Tick {
        self.current
    }

    #[inline(always)]
    pub fn next_timestamp(&self) -> Tick {
        self.next
    }

    /// Cycles the execution engine may run before an event becomes due
    #[inline]
    pub fn cycles_until_next_event(&self) -> u64 {
        self.next.saturating_sub(self.current)
    }

    /// Number of pending entries, sentinel included
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending entries in firing order
    pub fn pending(&self) -> impl Iterator<Item = (Tick, EventType)> + '_ {
        self.events.iter().map(|(&(ts, _), &e)| (ts, e))
    }

    fn refresh_next(&mut self) {
        self.next = self
            .events
            .keys()
            .next()
            .map_or(u64::MAX, |&(ts, _)| ts);
    }
}
