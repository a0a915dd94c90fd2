/*!
 * Kernel Metrics
 * Counters for system calls, scheduling and hardware events
 */

use crate::timing::EventType;
use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

const EVENT_TYPE_COUNT: usize = 7;

/// Kernel metrics collector
///
/// Owned by the kernel and updated on the emulation thread only.
///
/// # Performance
/// - SVC counts live in an ahash map keyed by SVC number
/// - Everything else is a plain integer bump
#[derive(Debug, Clone)]
pub struct KernelMetrics {
    svc_calls: HashMap<u32, u64, RandomState>,
    context_switches: u64,
    wakeups: u64,
    timeouts: u64,
    events_fired: [u64; EVENT_TYPE_COUNT],
    start_time: Instant,
}

impl KernelMetrics {
    pub fn new() -> Self {
        Self {
            svc_calls: HashMap::with_hasher(RandomState::new()),
            context_switches: 0,
            wakeups: 0,
            timeouts: 0,
            events_fired: [0; EVENT_TYPE_COUNT],
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn record_svc(&mut self, svc: u32) {
        *self.svc_calls.entry(svc).or_insert(0) += 1;
    }

    #[inline]
    pub fn record_context_switch(&mut self) {
        self.context_switches += 1;
    }

    /// A waiting thread was made ready by a signal
    #[inline]
    pub fn record_wakeup(&mut self) {
        self.wakeups += 1;
    }

    /// A wait or sleep ended by reaching its wakeup tick
    #[inline]
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    #[inline]
    pub fn record_event(&mut self, event: EventType) {
        self.events_fired[event as usize] += 1;
    }

    pub fn svc_count(&self, svc: u32) -> u64 {
        self.svc_calls.get(&svc).copied().unwrap_or(0)
    }

    pub fn context_switches(&self) -> u64 {
        self.context_switches
    }

    pub fn wakeups(&self) -> u64 {
        self.wakeups
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    pub fn events_fired(&self, event: EventType) -> u64 {
        self.events_fired[event as usize]
    }

    /// Point-in-time copy suitable for serialization
    pub fn snapshot(&self) -> MetricsSnapshot {
        let svc_calls = self
            .svc_calls
            .iter()
            .map(|(&svc, &count)| (format!("0x{svc:02X}"), count))
            .collect();

        let events_fired = [
            EventType::VBlank,
            EventType::ThreadWakeup,
            EventType::RunDsp,
            EventType::UpdateTimers,
            EventType::SignalY2r,
            EventType::UpdateIr,
        ]
        .into_iter()
        .filter(|&e| self.events_fired[e as usize] > 0)
        .map(|e| (e.as_str().to_string(), self.events_fired[e as usize]))
        .collect();

        MetricsSnapshot {
            svc_calls,
            context_switches: self.context_switches,
            wakeups: self.wakeups,
            timeouts: self.timeouts,
            events_fired,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for KernelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsSnapshot {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub svc_calls: BTreeMap<String, u64>,
    pub context_switches: u64,
    pub wakeups: u64,
    pub timeouts: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub events_fired: BTreeMap<String, u64>,
    pub uptime_secs: u64,
}
