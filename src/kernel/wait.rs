/*!
 * Wait Protocol
 * Readiness, acquisition, blocking, wakeup and timeouts
 *
 * A blocked thread records the handles it waits on and joins the waitlist of
 * each. Signalling an object wakes eligible waiters in block order, acquires
 * on their behalf and writes their result registers. Timeouts are driven by a single ThreadWakeup event positioned at
 * the earliest armed `wakeup_tick`.
 */

use super::Kernel;
use crate::core::limits::{IDLE_THREAD_INDEX, MAX_WAIT_HANDLES};
use crate::core::result::ResultCode;
use crate::core::types::{GuestAddr, Handle, ResetType, ThreadIndex};
use crate::objects::handles::{self, CURRENT_PROCESS, CURRENT_THREAD};
use crate::objects::{ObjectData, ObjectKind};
use crate::sync::{AddressArbiter, ArbitrationType, WaitList};
use crate::thread::ThreadStatus;
use crate::timing::{ns_to_cycles, EventType};
use log::{debug, trace};

/// r1 value reporting "no single object" for WaitSynchronizationN
pub const NO_INDEX: u32 = u32::MAX;

impl Kernel {
    // =========================================================================
    // Readiness and acquisition
    // =========================================================================

    /// Resolve a handle for waiting; pseudo-handles map to real objects
    fn resolve_wait_handle(&self, handle: Handle) -> Handle {
        match handle {
            CURRENT_THREAD | CURRENT_PROCESS => self.resolve_handle(handle),
            other => other,
        }
    }

    /// Whether a thread may wait on `handle`
    pub(crate) fn is_waitable(&self, handle: Handle) -> bool {
        if handles::is_service_handle(handle) {
            return true;
        }
        matches!(
            self.objects.kind(handle),
            Some(
                ObjectKind::Event
                    | ObjectKind::Semaphore
                    | ObjectKind::Mutex
                    | ObjectKind::Timer
                    | ObjectKind::Thread
                    | ObjectKind::Process
                    | ObjectKind::Port
                    | ObjectKind::Session
            )
        )
    }

    /// Whether `thread` could acquire `handle` right now
    pub(crate) fn is_ready_for(&self, handle: Handle, thread: ThreadIndex) -> bool {
        if handles::is_service_handle(handle) {
            return true;
        }
        match self.objects.get(handle).map(|obj| &obj.data) {
            Some(ObjectData::Event(event)) => event.fired,
            Some(ObjectData::Timer(timer)) => timer.fired,
            Some(ObjectData::Semaphore(sem)) => sem.is_ready(),
            Some(ObjectData::Mutex(mutex)) => mutex.is_available_to(thread),
            Some(ObjectData::Thread(index)) => self.threads[*index].status == ThreadStatus::Dead,
            Some(ObjectData::Port(_)) | Some(ObjectData::Session(_)) => true,
            _ => false,
        }
    }

    /// Consume a ready object on behalf of `thread`
    pub(crate) fn acquire(&mut self, handle: Handle, thread: ThreadIndex) {
        let Some(obj) = self.objects.get_mut(handle) else {
            return;
        };
        match &mut obj.data {
            ObjectData::Event(event) if event.reset_type == ResetType::OneShot => event.fired = false,
            ObjectData::Timer(timer) if timer.reset_type == ResetType::OneShot => timer.fired = false,
            ObjectData::Semaphore(sem) => sem.available -= 1,
            ObjectData::Mutex(mutex) => mutex.lock(thread),
            _ => {}
        }
    }

    pub(crate) fn waitlist(&self, handle: Handle) -> Option<&WaitList> {
        match &self.objects.get(handle)?.data {
            ObjectData::Event(event) => Some(&event.waitlist),
            ObjectData::Semaphore(sem) => Some(&sem.waitlist),
            ObjectData::Mutex(mutex) => Some(&mutex.waitlist),
            ObjectData::Timer(timer) => Some(&timer.waitlist),
            ObjectData::Thread(index) => Some(&self.threads[*index].termination_waiters),
            _ => None,
        }
    }

    pub(crate) fn waitlist_mut(&mut self, handle: Handle) -> Option<&mut WaitList> {
        if let Some(index) = self.objects.thread_index(handle) {
            return Some(&mut self.threads[index].termination_waiters);
        }
        match &mut self.objects.get_mut(handle)?.data {
            ObjectData::Event(event) => Some(&mut event.waitlist),
            ObjectData::Semaphore(sem) => Some(&mut sem.waitlist),
            ObjectData::Mutex(mutex) => Some(&mut mutex.waitlist),
            ObjectData::Timer(timer) => Some(&mut timer.waitlist),
            _ => None,
        }
    }

    // =========================================================================
    // Waking
    // =========================================================================

    /// Whether `thread`'s pending wait would be satisfied by `handle` now
    fn wait_satisfied(&self, thread: ThreadIndex, handle: Handle) -> bool {
        let t = &self.threads[thread];
        match t.status {
            ThreadStatus::WaitSync1 | ThreadStatus::WaitSyncAny => self.is_ready_for(handle, thread),
            ThreadStatus::WaitSyncAll => t.wait_list.iter().all(|&h| self.is_ready_for(h, thread)),
            _ => false,
        }
    }

    /// Wake every waiter of `handle` whose wait the object now satisfies
    ///
    /// Returns the number of threads made ready. Never switches threads; a
    /// reschedule is flagged instead.
    pub(crate) fn wake_waiters(&mut self, handle: Handle) -> usize {
        let mut woken = 0;
        loop {
            let next = match self.waitlist(handle) {
                Some(list) => list.next_to_wake(|t| self.wait_satisfied(t, handle)),
                None => None,
            };
            let Some(thread) = next else {
                break;
            };
            self.wake_thread(thread, handle);
            woken += 1;
        }
        woken
    }

    fn wake_thread(&mut self, thread: ThreadIndex, signalled: Handle) {
        let status = self.threads[thread].status;
        let wait_list = std::mem::take(&mut self.threads[thread].wait_list);

        match status {
            ThreadStatus::WaitSyncAll => {
                for &h in &wait_list {
                    self.acquire(h, thread);
                }
                self.set_thread_reg(thread, 1, NO_INDEX);
            }
            ThreadStatus::WaitSyncAny => {
                self.acquire(signalled, thread);
                let index = wait_list
                    .iter()
                    .position(|&h| h == signalled)
                    .map_or(NO_INDEX, |i| i as u32);
                self.set_thread_reg(thread, 1, index);
            }
            _ => self.acquire(signalled, thread),
        }
        self.set_thread_reg(thread, 0, ResultCode::SUCCESS.raw());

        self.leave_waitlists(thread, &wait_list);
        if let Some(list) = self.waitlist_mut(signalled) {
            list.remove(thread);
        }
        self.make_ready(thread);
        self.metrics.record_wakeup();
        trace!("Thread {} woken by handle {:X}", thread, signalled);
    }

    fn leave_waitlists(&mut self, thread: ThreadIndex, wait_list: &[Handle]) {
        for &h in wait_list {
            if let Some(list) = self.waitlist_mut(h) {
                list.remove(thread);
            }
        }
    }

    /// Move a waiting thread to Ready at the back of its priority group
    pub(crate) fn make_ready(&mut self, thread: ThreadIndex) {
        let seq = self.next_seq();
        let t = &mut self.threads[thread];
        let had_timeout = t.has_timeout();
        t.status = ThreadStatus::Ready;
        t.wakeup_tick = u64::MAX;
        t.ready_seq = seq;
        if had_timeout {
            self.update_wakeup_event();
        }
        self.need_reschedule = true;
    }

    // =========================================================================
    // Blocking and timeouts
    // =========================================================================

    /// Block the running thread; a negative timeout waits forever
    pub(crate) fn block_current(&mut self, status: ThreadStatus, wait_list: Vec<Handle>, timeout_ns: i64) {
        let thread = self.current;
        for &h in &wait_list {
            if let Some(list) = self.waitlist_mut(h) {
                list.push(thread);
            }
        }
        let seq = self.next_seq();
        let t = &mut self.threads[thread];
        t.status = status;
        t.wait_list = wait_list;
        t.block_seq = seq;
        self.arm_timeout(thread, timeout_ns);
        self.need_reschedule = true;
    }

    fn arm_timeout(&mut self, thread: ThreadIndex, timeout_ns: i64) {
        if timeout_ns < 0 {
            self.threads[thread].wakeup_tick = u64::MAX;
            return;
        }
        let now = self.queue.current_timestamp();
        self.threads[thread].wakeup_tick = now.saturating_add(ns_to_cycles(timeout_ns as u64));
        self.update_wakeup_event();
    }

    /// Keep the ThreadWakeup event at the earliest armed timeout
    pub(crate) fn update_wakeup_event(&mut self) {
        let next = self
            .threads
            .iter()
            .filter(|t| t.has_timeout())
            .map(|t| t.wakeup_tick)
            .min();
        match next {
            Some(tick) => self.queue.reschedule_event(EventType::ThreadWakeup, tick),
            None => self.queue.remove_event(EventType::ThreadWakeup),
        }
    }

    /// Expire every wait whose wakeup tick has passed
    pub(crate) fn handle_thread_wakeups(&mut self) {
        let now = self.queue.current_timestamp();
        let mut due: Vec<_> = self
            .threads
            .iter()
            .filter(|t| t.has_timeout() && t.wakeup_tick <= now)
            .map(|t| (t.wakeup_tick, t.index))
            .collect();
        due.sort_unstable();

        for (_, thread) in due {
            self.time_out(thread);
        }
        self.update_wakeup_event();
    }

    fn time_out(&mut self, thread: ThreadIndex) {
        let status = self.threads[thread].status;
        let wait_list = std::mem::take(&mut self.threads[thread].wait_list);
        self.leave_waitlists(thread, &wait_list);

        match status {
            ThreadStatus::WaitSync1 | ThreadStatus::WaitArbiter => {
                self.set_thread_reg(thread, 0, ResultCode::TIMEOUT.raw());
            }
            ThreadStatus::WaitSyncAny | ThreadStatus::WaitSyncAll => {
                self.set_thread_reg(thread, 0, ResultCode::TIMEOUT.raw());
                self.set_thread_reg(thread, 1, NO_INDEX);
            }
            _ => {}
        }

        let seq = self.next_seq();
        let t = &mut self.threads[thread];
        t.status = ThreadStatus::Ready;
        t.wakeup_tick = u64::MAX;
        t.ready_seq = seq;
        self.need_reschedule = true;
        self.metrics.record_timeout();
        trace!("Thread {} timed out ({:?})", thread, status);
    }

    // =========================================================================
    // WaitSynchronization
    // =========================================================================

    /// WaitSynchronization1: result in r0
    pub fn wait_synchronization1(&mut self, handle: Handle, timeout_ns: i64) {
        let thread = self.current;
        let handle = self.resolve_wait_handle(handle);
        if !self.is_waitable(handle) {
            debug!("WaitSynchronization1 on bad handle {:X}", handle);
            self.set_result(ResultCode::INVALID_HANDLE);
            return;
        }

        if self.is_ready_for(handle, thread) {
            self.acquire(handle, thread);
            self.set_result(ResultCode::SUCCESS);
        } else if timeout_ns == 0 {
            self.set_result(ResultCode::TIMEOUT);
        } else {
            self.set_result(ResultCode::SUCCESS);
            self.block_current(ThreadStatus::WaitSync1, vec![handle], timeout_ns);
        }
    }

    /// WaitSynchronizationN over `count` handles at `handles_ptr`: r0 result, r1 index
    pub fn wait_synchronization_n(
        &mut self,
        handles_ptr: GuestAddr,
        count: i32,
        wait_all: bool,
        timeout_ns: i64,
    ) {
        if !(0..=MAX_WAIT_HANDLES as i32).contains(&count) {
            self.set_result(ResultCode::OUT_OF_RANGE);
            return;
        }

        let thread = self.current;
        let mut wait_list = Vec::with_capacity(count as usize);
        for i in 0..count as u32 {
            let raw = self.memory.read32(handles_ptr.wrapping_add(i * 4));
            let handle = self.resolve_wait_handle(raw);
            if !self.is_waitable(handle) {
                debug!("WaitSynchronizationN on bad handle {:X} (index {})", raw, i);
                self.set_result(ResultCode::INVALID_HANDLE);
                return;
            }
            wait_list.push(handle);
        }

        if wait_all {
            if wait_list.iter().all(|&h| self.is_ready_for(h, thread)) {
                for &h in &wait_list {
                    self.acquire(h, thread);
                }
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, NO_INDEX);
                return;
            }
        } else if let Some(index) = wait_list.iter().position(|&h| self.is_ready_for(h, thread)) {
            self.acquire(wait_list[index], thread);
            self.set_result(ResultCode::SUCCESS);
            self.set_reg(1, index as u32);
            return;
        }

        if timeout_ns == 0 {
            self.set_result(ResultCode::TIMEOUT);
            self.set_reg(1, NO_INDEX);
            return;
        }

        let status = if wait_all {
            ThreadStatus::WaitSyncAll
        } else {
            ThreadStatus::WaitSyncAny
        };
        self.set_result(ResultCode::SUCCESS);
        self.block_current(status, wait_list, timeout_ns);
    }

    // =========================================================================
    // Address arbitration
    // =========================================================================

    /// ArbitrateAddress: result in r0
    pub fn arbitrate_address(
        &mut self,
        arbiter: Handle,
        address: GuestAddr,
        raw_type: u32,
        value: i32,
        timeout_ns: i64,
    ) {
        if self.objects.get_as::<AddressArbiter>(arbiter).is_none() {
            self.set_result(ResultCode::INVALID_HANDLE);
            return;
        }
        let Some(kind) = ArbitrationType::from_raw(raw_type) else {
            self.set_result(ResultCode::INVALID_ENUM_VALUE);
            return;
        };

        self.set_result(ResultCode::SUCCESS);
        match kind {
            ArbitrationType::Signal => {
                let woken = self.signal_arbiter(address, value);
                trace!("Arbiter signal at {:08X} woke {} thread(s)", address, woken);
            }
            _ => {
                let word = self.memory.read32(address) as i32;
                if word < value {
                    if kind.decrements() {
                        self.memory.write32(address, word.wrapping_sub(1) as u32);
                    }
                    let timeout = if kind.has_timeout() { timeout_ns } else { -1 };
                    self.threads[self.current].waiting_address = address;
                    self.block_current(ThreadStatus::WaitArbiter, Vec::new(), timeout);
                }
            }
        }
    }

    /// Wake up to `count` threads waiting on `address`; negative wakes all
    fn signal_arbiter(&mut self, address: GuestAddr, count: i32) -> usize {
        let mut waiters: Vec<_> = self
            .threads
            .iter()
            .filter(|t| t.index != IDLE_THREAD_INDEX)
            .filter(|t| t.status == ThreadStatus::WaitArbiter && t.waiting_address == address)
            .map(|t| (t.block_seq, t.index))
            .collect();
        waiters.sort_unstable();

        let limit = if count < 0 { waiters.len() } else { count as usize };
        let mut woken = 0;
        for &(_, thread) in waiters.iter().take(limit) {
            self.set_thread_reg(thread, 0, ResultCode::SUCCESS.raw());
            self.make_ready(thread);
            self.metrics.record_wakeup();
            woken += 1;
        }
        woken
    }
}
