/*!
 * Primitive Operations
 * Signal/release paths for events, semaphores, mutexes and timers, plus
 * thread exit and handle closing
 */

use super::Kernel;
use crate::core::result::ResultCode;
use crate::core::types::{GuestResult, Handle, ResetType};
use crate::objects::handles;
use crate::objects::{ObjectData, ObjectKind, ResourceType};
use crate::sync::{Event, Mutex, Semaphore, Timer};
use crate::thread::ThreadStatus;
use crate::timing::{ns_to_cycles, EventType};
use log::{debug, trace};

impl Kernel {
    // =========================================================================
    // Events
    // =========================================================================

    /// Signal an event and wake its waiters
    ///
    /// A pulse is cleared again once current waiters are woken. Callbacks run
    /// at the next flush point, after the triggering call returns.
    pub fn signal_event(&mut self, handle: Handle) -> GuestResult {
        let handle = self.resolve_handle(handle);
        let callback = {
            let event = self
                .objects
                .get_as_mut::<Event>(handle)
                .ok_or(ResultCode::INVALID_HANDLE)?;
            event.fired = true;
            event.callback
        };

        let woken = self.wake_waiters(handle);
        if let Some(event) = self.objects.get_as_mut::<Event>(handle) {
            if event.reset_type == ResetType::Pulse {
                event.fired = false;
            }
        }
        if let Some(callback) = callback {
            self.pending_callbacks.push_back(callback);
        }
        trace!("Signalled event {:X} ({} woken)", handle, woken);
        Ok(())
    }

    pub fn clear_event(&mut self, handle: Handle) -> GuestResult {
        let handle = self.resolve_handle(handle);
        let event = self
            .objects
            .get_as_mut::<Event>(handle)
            .ok_or(ResultCode::INVALID_HANDLE)?;
        event.fired = false;
        Ok(())
    }

    // =========================================================================
    // Semaphores and mutexes
    // =========================================================================

    /// Release `count` slots; returns the count before the release
    pub fn release_semaphore(&mut self, handle: Handle, count: i32) -> GuestResult<i32> {
        let sem = self
            .objects
            .get_as_mut::<Semaphore>(handle)
            .ok_or(ResultCode::INVALID_HANDLE)?;
        if !sem.can_release(count) {
            return Err(ResultCode::OUT_OF_RANGE);
        }
        let previous = sem.available;
        sem.available += count;
        self.wake_waiters(handle);
        Ok(previous)
    }

    /// Drop one level of the running thread's ownership
    pub fn release_mutex(&mut self, handle: Handle) -> GuestResult {
        let thread = self.current;
        let mutex = self
            .objects
            .get_as_mut::<Mutex>(handle)
            .ok_or(ResultCode::INVALID_HANDLE)?;
        if mutex.owner != Some(thread) {
            return Err(ResultCode::INVALID_MUTEX_RELEASE);
        }
        if mutex.unlock() {
            self.wake_waiters(handle);
        }
        Ok(())
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Program a timer; an initial delay of zero fires it immediately
    pub fn set_timer(&mut self, handle: Handle, initial_ns: i64, interval_ns: i64) -> GuestResult {
        if initial_ns < 0 || interval_ns < 0 {
            return Err(ResultCode::OUT_OF_RANGE);
        }
        let now = self.queue.current_timestamp();
        let timer = self
            .objects
            .get_as_mut::<Timer>(handle)
            .ok_or(ResultCode::INVALID_HANDLE)?;
        timer.initial_delay = initial_ns as u64;
        timer.interval = interval_ns as u64;
        timer.running = true;
        timer.fire_tick = now.saturating_add(ns_to_cycles(initial_ns as u64));

        if initial_ns == 0 {
            self.fire_timer(handle);
        }
        self.update_timer_event();
        Ok(())
    }

    pub fn cancel_timer(&mut self, handle: Handle) -> GuestResult {
        let timer = self
            .objects
            .get_as_mut::<Timer>(handle)
            .ok_or(ResultCode::INVALID_HANDLE)?;
        timer.running = false;
        self.update_timer_event();
        Ok(())
    }

    pub fn clear_timer(&mut self, handle: Handle) -> GuestResult {
        let timer = self
            .objects
            .get_as_mut::<Timer>(handle)
            .ok_or(ResultCode::INVALID_HANDLE)?;
        timer.fired = false;
        Ok(())
    }

    fn fire_timer(&mut self, handle: Handle) {
        match self.objects.get_as_mut::<Timer>(handle) {
            Some(timer) => timer.fired = true,
            None => return,
        }
        self.wake_waiters(handle);

        let now = self.queue.current_timestamp();
        if let Some(timer) = self.objects.get_as_mut::<Timer>(handle) {
            if timer.reset_type == ResetType::Pulse {
                timer.fired = false;
            }
            if timer.interval > 0 {
                timer.fire_tick = now.saturating_add(ns_to_cycles(timer.interval));
            } else {
                timer.running = false;
            }
        }
    }

    /// Fire every running timer whose tick has passed
    pub(crate) fn update_timers(&mut self) {
        let now = self.queue.current_timestamp();
        for i in 0..self.timers.len() {
            let handle = self.timers[i];
            let due = self
                .objects
                .get_as::<Timer>(handle)
                .is_some_and(|t| t.running && t.fire_tick <= now);
            if due {
                self.fire_timer(handle);
            }
        }
        self.update_timer_event();
    }

    /// Keep a single UpdateTimers event at the earliest running timer
    fn update_timer_event(&mut self) {
        let next = self
            .timers
            .iter()
            .filter_map(|&h| self.objects.get_as::<Timer>(h))
            .filter(|t| t.running)
            .map(|t| t.fire_tick)
            .min();
        match next {
            Some(tick) => self.queue.reschedule_event(EventType::UpdateTimers, tick),
            None => self.queue.remove_event(EventType::UpdateTimers),
        }
    }

    // =========================================================================
    // Threads and handles
    // =========================================================================

    /// Terminate the running thread
    ///
    /// Every mutex it holds is released outright and threads joined on it wake.
    pub fn exit_current_thread(&mut self) {
        let thread = self.current;
        let owned: Vec<Handle> = self
            .objects
            .iter()
            .filter_map(|obj| match &obj.data {
                ObjectData::Mutex(m) if m.owner == Some(thread) => Some(obj.handle),
                _ => None,
            })
            .collect();
        for handle in owned {
            if let Some(mutex) = self.objects.get_as_mut::<Mutex>(handle) {
                mutex.owner = None;
                mutex.lock_count = 0;
            }
            self.wake_waiters(handle);
        }

        let t = &mut self.threads[thread];
        t.status = ThreadStatus::Dead;
        t.wait_list.clear();
        t.wakeup_tick = u64::MAX;
        let handle = t.handle;
        self.uncharge(ResourceType::Thread);
        debug!("Thread {} exited", thread);

        if let Some(handle) = handle {
            self.wake_waiters(handle);
        }
        self.need_reschedule = true;
    }

    /// Close a handle; slots are never reused, so only cleanup runs
    pub fn close_handle(&mut self, handle: Handle) -> GuestResult {
        if handles::is_service_handle(handle)
            || handle == handles::CURRENT_THREAD
            || handle == handles::CURRENT_PROCESS
        {
            return Ok(());
        }
        match self.objects.kind(handle) {
            None => Err(ResultCode::INVALID_HANDLE),
            Some(ObjectKind::Timer) => self.cancel_timer(handle),
            Some(kind) => {
                debug!("CloseHandle on {} {:X}", kind, handle);
                Ok(())
            }
        }
    }
}
