/*!
 * Event Servicing
 * Hardware event dispatch, host request draining and engine callbacks
 */

use super::Kernel;
use crate::core::data_structures::InlineString;
use crate::core::errors::KernelError;
use crate::core::limits::VBLANK_INTERVAL_CYCLES;
use crate::core::types::{KernelResult, Tick};
use crate::cpu::ExceptionKind;
use crate::host::HostRequest;
use crate::timing::EventType;
use log::{debug, error, warn};

/// Device side of the hardware event queue
///
/// Receives the device events the kernel does not handle itself: VBlank
/// (after the kernel re-arms it), RunDsp, UpdateIr and SignalY2r.
pub trait DeviceEventHandler {
    fn handle_event(&mut self, kernel: &mut Kernel, event: EventType) -> KernelResult<()>;
}

/// Device layer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevices;

impl DeviceEventHandler for NullDevices {
    fn handle_event(&mut self, _kernel: &mut Kernel, _event: EventType) -> KernelResult<()> {
        Ok(())
    }
}

impl Kernel {
    /// Service every event due at the current timestamp
    ///
    /// Called by the run loop when the engine's cycle budget is exhausted.
    /// Returns the number of events fired.
    pub fn poll_events(&mut self, devices: &mut dyn DeviceEventHandler) -> KernelResult<usize> {
        let mut fired = 0;
        while let Some((timestamp, event)) = self.queue.pop_due() {
            fired += 1;
            self.metrics.record_event(event);
            self.dispatch_event(devices, timestamp, event)?;
        }
        self.flush_event_callbacks()?;
        self.eval_reschedule();
        Ok(fired)
    }

    fn dispatch_event(
        &mut self,
        devices: &mut dyn DeviceEventHandler,
        timestamp: Tick,
        event: EventType,
    ) -> KernelResult<()> {
        match event {
            EventType::VBlank => {
                self.queue
                    .add_event(EventType::VBlank, timestamp + VBLANK_INTERVAL_CYCLES);
                self.frame_done = true;
                devices.handle_event(self, event)
            }
            EventType::ThreadWakeup => {
                self.handle_thread_wakeups();
                Ok(())
            }
            EventType::UpdateTimers => {
                self.update_timers();
                Ok(())
            }
            EventType::RunDsp | EventType::UpdateIr | EventType::SignalY2r => {
                devices.handle_event(self, event)
            }
            EventType::Panic => Err(KernelError::InvalidState(
                "sentinel event reached the front of the queue".into(),
            )),
        }
    }

    /// Apply every request queued by auxiliary host threads
    pub fn drain_host_requests(&mut self) -> KernelResult<usize> {
        let Some(mut rx) = self.host_rx.take() else {
            return Ok(0);
        };
        let mut drained = 0;
        while let Some(request) = rx.pop() {
            drained += 1;
            self.apply_host_request(request);
        }
        self.host_rx = Some(rx);

        self.flush_event_callbacks()?;
        self.eval_reschedule();
        Ok(drained)
    }

    fn apply_host_request(&mut self, request: HostRequest) {
        match request {
            HostRequest::SignalEvent(handle) => {
                if let Err(code) = self.signal_event(handle) {
                    warn!("Host signal of {:X} failed: {}", handle, code);
                }
            }
            HostRequest::ScheduleDeviceEvent { event, delay_cycles } => match event {
                EventType::ThreadWakeup | EventType::UpdateTimers | EventType::Panic => {
                    warn!("Host may not schedule kernel-owned event {}", event);
                }
                _ => {
                    let at = self.queue.current_timestamp().saturating_add(delay_cycles);
                    self.queue.reschedule_event(event, at);
                }
            },
            HostRequest::RequestReschedule => self.need_reschedule = true,
        }
    }

    /// Deliver queued event callbacks to their services
    pub(crate) fn flush_event_callbacks(&mut self) -> KernelResult<()> {
        while let Some(callback) = self.pending_callbacks.pop_front() {
            if !self.services.is_registered(callback.service) {
                debug!(
                    "Dropping event callback {} for unregistered service {}",
                    callback.tag, callback.service
                );
                continue;
            }
            let mut handler = self.services.take(callback.service)?;
            let result = handler.on_event_signalled(self, callback.tag);
            self.services.restore(callback.service, handler);
            result?;
        }
        Ok(())
    }

    /// Fatal CPU exception reported by the execution engine
    pub fn raise_exception(&mut self, kind: ExceptionKind, pc: u32) -> KernelError {
        error!(
            "CPU exception {} at pc 0x{:08X} on thread {}",
            kind, pc, self.current
        );
        KernelError::CpuException {
            kind: InlineString::from(kind.to_string()),
            pc,
        }
    }
}
