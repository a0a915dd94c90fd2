/*!
 * Dispatcher
 * Cooperative thread selection and context switching
 *
 * Signalling only marks threads Ready and raises `need_reschedule`; the
 * decision is taken once per kernel entry by [`Kernel::eval_reschedule`].
 *
 * # Policy
 * Lowest numeric priority wins; equal priorities run in the order they became
 * ready. The idle thread runs only when no user thread is Ready.
 */

use super::Kernel;
use crate::core::limits::IDLE_THREAD_INDEX;
use crate::core::types::{ThreadIndex, Tick};
use crate::thread::ThreadStatus;
use crate::timing::ns_to_cycles;
use log::trace;

impl Kernel {
    /// Pick the next thread to run
    pub(crate) fn pick_next_thread(&self) -> ThreadIndex {
        self.threads[..self.thread_count]
            .iter()
            .filter(|t| t.status == ThreadStatus::Ready)
            .min_by_key(|t| (t.priority, t.ready_seq))
            .map_or(IDLE_THREAD_INDEX, |t| t.index)
    }

    /// Make one scheduling decision and switch to its winner
    pub fn reschedule(&mut self) {
        let current = self.current;
        if self.threads[current].status == ThreadStatus::Running {
            self.threads[current].status = ThreadStatus::Ready;
        }

        let next = self.pick_next_thread();
        self.switch_thread(next);
        self.threads[next].status = ThreadStatus::Running;
        self.need_reschedule = false;
    }

    /// Reschedule if anything since the last decision asked for it
    pub fn eval_reschedule(&mut self) {
        if self.need_reschedule {
            self.reschedule();
        }
    }

    /// Flag that a scheduling decision is owed
    #[inline]
    pub fn request_reschedule(&mut self) {
        self.need_reschedule = true;
    }

    #[inline]
    pub fn needs_reschedule(&self) -> bool {
        self.need_reschedule
    }

    /// Save the live registers into the outgoing thread and load the incoming one
    pub(crate) fn switch_thread(&mut self, next: ThreadIndex) {
        let previous = self.current;
        if next == previous {
            return;
        }
        self.engine.save_context(&mut self.threads[previous].context);
        self.engine.load_context(&self.threads[next].context);
        self.current = next;
        self.metrics.record_context_switch();
        trace!("Switched thread {} -> {}", previous, next);
    }

    /// Send the running thread to the back of its priority group
    pub(crate) fn yield_current(&mut self) {
        let seq = self.next_seq();
        let thread = &mut self.threads[self.current];
        thread.ready_seq = seq;
        self.need_reschedule = true;
    }

    /// Sleep the running thread; zero or negative durations yield
    pub fn sleep_current(&mut self, ns: i64) {
        if ns <= 0 {
            self.yield_current();
            return;
        }
        let wake_at: Tick = self
            .queue
            .current_timestamp()
            .saturating_add(ns_to_cycles(ns as u64));
        let thread = self.current;
        let seq = self.next_seq();
        let t = &mut self.threads[thread];
        t.status = ThreadStatus::WaitSleep;
        t.wait_list.clear();
        t.wakeup_tick = wake_at;
        t.block_seq = seq;
        self.update_wakeup_event();
        self.need_reschedule = true;
    }
}
