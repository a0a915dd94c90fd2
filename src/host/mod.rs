/*!
 * Host Request Queue
 * Single-producer/single-consumer channel from auxiliary host threads
 *
 * Auxiliary threads (shader compilation, control plane) never touch kernel
 * state. They push requests here; the emulation thread drains them with
 * `Kernel::drain_host_requests`.
 */

use crate::core::types::Handle;
use crate::timing::EventType;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

/// Request posted by an auxiliary host thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    /// Signal an event object on the emulation thread
    SignalEvent(Handle),
    /// Schedule a device event `delay_cycles` after the current timestamp
    ScheduleDeviceEvent { event: EventType, delay_cycles: u64 },
    /// Force a scheduling decision at the next drain
    RequestReschedule,
}

/// Producer half, owned by one auxiliary thread
pub struct HostRequestProducer {
    inner: HeapProd<HostRequest>,
}

impl HostRequestProducer {
    /// Enqueue a request; hands it back if the queue is full
    pub fn push(&mut self, request: HostRequest) -> Result<(), HostRequest> {
        self.inner.try_push(request)
    }

    pub fn free_slots(&self) -> usize {
        self.inner.vacant_len()
    }
}

/// Consumer half, owned by the kernel
pub struct HostRequestConsumer {
    inner: HeapCons<HostRequest>,
}

impl HostRequestConsumer {
    pub fn pop(&mut self) -> Option<HostRequest> {
        self.inner.try_pop()
    }

    pub fn pending(&self) -> usize {
        self.inner.occupied_len()
    }
}

impl std::fmt::Debug for HostRequestConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRequestConsumer")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Create a bounded request queue with `capacity` slots
pub fn host_request_queue(capacity: usize) -> (HostRequestProducer, HostRequestConsumer) {
    let (prod, cons) = HeapRb::<HostRequest>::new(capacity).split();
    (
        HostRequestProducer { inner: prod },
        HostRequestConsumer { inner: cons },
    )
}
