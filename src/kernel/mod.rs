/*!
 * Kernel
 * Owned aggregate of all kernel state: object table, thread array, hardware
 * event queue, service slots and the execution/memory backends
 *
 * Every operation runs on the single emulation thread through `&mut Kernel`;
 * there is no ambient state, so independent instances can coexist.
 */

mod dispatch;
mod events;
mod ipc;
mod objects;
mod primitives;
mod resources;
mod wait;

pub use events::{DeviceEventHandler, NullDevices};
pub use wait::NO_INDEX;

use crate::core::config::KernelConfig;
use crate::core::limits::*;
use crate::core::result::ResultCode;
use crate::core::types::{GuestAddr, Handle, KernelResult, ThreadIndex, Tick};
use crate::cpu::{cpsr, ExecutionEngine, RegisterFile, PC};
use crate::host::{host_request_queue, HostRequestConsumer, HostRequestProducer};
use crate::ipc::{ServiceHandler, ServiceId, ServiceManager, SrvState};
use crate::memory::{GuestMemory, PagedMemory};
use crate::monitoring::KernelMetrics;
use crate::objects::handles::{CURRENT_PROCESS, CURRENT_THREAD};
use crate::objects::{ObjectData, ObjectKind, ObjectPayload, ObjectTable, Process, ResourceLimits, ResourceType};
use crate::sync::EventCallback;
use crate::thread::{ProcessorId, Thread, ThreadStatus};
use crate::timing::{EventQueue, EventType};
use log::{debug, info};
use std::collections::VecDeque;

/// `mov r0, #0; mov r1, #0; svc 0x0A; b -8`
const IDLE_THREAD_CODE: [u8; 16] = [
    0x00, 0x00, 0xA0, 0xE3, // mov r0, #0
    0x00, 0x10, 0xA0, 0xE3, // mov r1, #0
    0x0A, 0x00, 0x00, 0xEF, // svc SleepThread
    0xFB, 0xFF, 0xFF, 0xEA, // b loop
];

/// Emulated console kernel
pub struct Kernel {
    pub(crate) config: KernelConfig,
    pub(crate) engine: Box<dyn ExecutionEngine>,
    pub(crate) memory: Box<dyn GuestMemory>,
    pub(crate) objects: ObjectTable,
    /// MAX_THREADS user slots followed by the idle thread
    pub(crate) threads: Vec<Thread>,
    /// User slots handed out since reset
    pub(crate) thread_count: usize,
    pub(crate) current: ThreadIndex,
    pub(crate) queue: EventQueue,
    pub(crate) need_reschedule: bool,
    /// Source of ready/block sequence numbers
    pub(crate) seq: u64,
    pub(crate) process: Handle,
    pub(crate) resource_limit: Handle,
    pub(crate) srv_port: Handle,
    pub(crate) error_port: Handle,
    /// Timer objects, in creation order
    pub(crate) timers: Vec<Handle>,
    pub(crate) services: ServiceManager,
    pub(crate) srv: SrvState,
    pub(crate) pending_callbacks: VecDeque<EventCallback>,
    pub(crate) host_rx: Option<HostRequestConsumer>,
    pub(crate) host_tx: Option<HostRequestProducer>,
    pub(crate) metrics: KernelMetrics,
    pub(crate) frame_done: bool,
}

impl Kernel {
    /// Kernel backed by a plain register file and sparse paged memory
    pub fn new(config: KernelConfig) -> KernelResult<Self> {
        Self::with_backends(config, Box::new(RegisterFile::new()), Box::new(PagedMemory::new()))
    }

    /// Kernel driving a caller-supplied execution engine and guest memory
    pub fn with_backends(
        config: KernelConfig,
        engine: Box<dyn ExecutionEngine>,
        memory: Box<dyn GuestMemory>,
    ) -> KernelResult<Self> {
        config.validate()?;
        let (host_tx, host_rx) = host_request_queue(config.host_queue_capacity);

        let mut kernel = Self {
            config,
            engine,
            memory,
            objects: ObjectTable::new(),
            threads: Vec::new(),
            thread_count: 0,
            current: 0,
            queue: EventQueue::new(),
            need_reschedule: false,
            seq: 0,
            process: 0,
            resource_limit: 0,
            srv_port: 0,
            error_port: 0,
            timers: Vec::new(),
            services: ServiceManager::new(),
            srv: SrvState::default(),
            pending_callbacks: VecDeque::new(),
            host_rx: Some(host_rx),
            host_tx: Some(host_tx),
            metrics: KernelMetrics::new(),
            frame_done: false,
        };
        kernel.reset()?;
        Ok(kernel)
    }

    /// Tear down every object and rebuild the boot state
    ///
    /// Recreates the process and its resource limit, the main thread (running),
    /// the idle thread, the `srv:` and `err:f` ports and the event queue.
    pub fn reset(&mut self) -> KernelResult<()> {
        self.objects.clear();
        self.threads = (0..=MAX_THREADS).map(Thread::dead).collect();
        self.thread_count = 0;
        self.current = 0;
        self.need_reschedule = false;
        self.seq = 0;
        self.timers.clear();
        self.pending_callbacks.clear();
        self.srv = SrvState::default();
        self.frame_done = false;
        self.metrics.reset();

        self.queue.reset();
        self.queue.add_event(EventType::VBlank, VBLANK_INTERVAL_CYCLES);

        self.objects.insert(ObjectData::Dummy)?;
        self.process = self.objects.next_handle();
        self.resource_limit = self.process + 1;
        self.objects.insert(ObjectData::Process(Process {
            id: MAIN_PROCESS_ID,
            resource_limit: self.resource_limit,
        }))?;
        self.objects.insert(ObjectData::ResourceLimit(ResourceLimits::new(
            self.config.resource_limit_category,
        )))?;

        self.charge(ResourceType::Thread)?;
        let main_priority = self.config.main_thread_priority;
        self.make_thread(0, STACK_TOP, 0, main_priority, ProcessorId::Default)?;
        self.threads[0].status = ThreadStatus::Running;
        self.engine.load_context(&self.threads[0].context);

        self.setup_idle_thread();

        self.srv_port = self.make_port("srv:")?;
        self.error_port = self.make_port("err:f")?;

        self.services.reset_all();
        info!(
            "Kernel reset: {} objects, main thread priority 0x{:X}",
            self.objects.len(),
            main_priority
        );
        Ok(())
    }

    fn setup_idle_thread(&mut self) {
        let code = self.config.idle_thread_code_address;
        self.memory.write_bytes(code, &IDLE_THREAD_CODE);

        let mut idle = Thread::new(
            IDLE_THREAD_INDEX,
            code,
            0,
            0,
            IDLE_THREAD_PRIORITY,
            ProcessorId::AppCore,
        );
        idle.ready_seq = self.next_seq();
        self.memory.fill_zero(idle.tls_base(), TLS_SIZE);
        self.threads[IDLE_THREAD_INDEX] = idle;
    }

    /// Point the main thread at the loaded executable's entrypoint
    pub fn setup_main_thread(&mut self, entrypoint: GuestAddr) {
        let thumb = entrypoint & 1 != 0;
        let main = &mut self.threads[0];
        main.entrypoint = entrypoint;
        main.context.gprs[PC] = entrypoint & !1;
        main.context.cpsr = cpsr::USER_MODE | if thumb { cpsr::THUMB } else { 0 };
        if self.current == 0 {
            self.engine.set_reg(PC, entrypoint & !1);
            self.engine.set_cpsr(main.context.cpsr);
        }
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// Install the handler for a fixed service handle
    pub fn register_service(&mut self, id: ServiceId, handler: Box<dyn ServiceHandler>) {
        debug!("Registered service {}", id.name());
        self.services.register(id, handler);
    }

    // =========================================================================
    // Registers and threads
    // =========================================================================

    /// Live register of the running thread
    #[inline]
    pub fn reg(&self, index: usize) -> u32 {
        self.engine.reg(index)
    }

    #[inline]
    pub fn set_reg(&mut self, index: usize, value: u32) {
        self.engine.set_reg(index, value);
    }

    /// Write a register of any thread, live or saved
    pub(crate) fn set_thread_reg(&mut self, thread: ThreadIndex, index: usize, value: u32) {
        if thread == self.current {
            self.engine.set_reg(index, value);
        } else {
            self.threads[thread].context.gprs[index] = value;
        }
    }

    #[inline]
    pub(crate) fn set_result(&mut self, result: ResultCode) {
        self.engine.set_reg(0, result.raw());
    }

    #[inline]
    pub(crate) fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    #[inline]
    pub fn current_thread(&self) -> ThreadIndex {
        self.current
    }

    pub fn thread(&self, index: ThreadIndex) -> Option<&Thread> {
        self.threads.get(index)
    }

    /// Thread referenced by a handle, pseudo-handles included
    pub fn thread_by_handle(&self, handle: Handle) -> Option<&Thread> {
        self.thread_index_of(handle).map(|index| &self.threads[index])
    }

    pub(crate) fn thread_index_of(&self, handle: Handle) -> Option<ThreadIndex> {
        if handle == CURRENT_THREAD {
            return Some(self.current);
        }
        self.objects.thread_index(handle)
    }

    /// User threads created since reset, dead ones included
    pub fn user_threads(&self) -> &[Thread] {
        &self.threads[..self.thread_count]
    }

    pub fn idle_thread(&self) -> &Thread {
        &self.threads[IDLE_THREAD_INDEX]
    }

    /// TLS base of the running thread
    #[inline]
    pub fn tls_base(&self) -> GuestAddr {
        self.engine.tls_base()
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Map the current-thread/current-process pseudo-handles to real handles
    pub fn resolve_handle(&self, handle: Handle) -> Handle {
        match handle {
            CURRENT_THREAD => self.threads[self.current].handle.unwrap_or(handle),
            CURRENT_PROCESS => self.process,
            other => other,
        }
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// Kind of the object behind `handle`, after pseudo-handle resolution
    pub fn object_kind(&self, handle: Handle) -> Option<ObjectKind> {
        self.objects.kind(self.resolve_handle(handle))
    }

    /// Typed object lookup; `None` is the caller's bad-handle signal
    pub fn get_object<T: ObjectPayload>(&self, handle: Handle) -> Option<&T> {
        self.objects.get_as::<T>(self.resolve_handle(handle))
    }

    #[inline]
    pub fn process_handle(&self) -> Handle {
        self.process
    }

    #[inline]
    pub fn resource_limit_handle(&self) -> Handle {
        self.resource_limit
    }

    #[inline]
    pub fn srv_port(&self) -> Handle {
        self.srv_port
    }

    #[inline]
    pub fn error_port(&self) -> Handle {
        self.error_port
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Tick-accounting callback from the execution engine
    #[inline]
    pub fn add_ticks(&mut self, ticks: u64) {
        self.queue.add_ticks(ticks);
    }

    #[inline]
    pub fn current_timestamp(&self) -> Tick {
        self.queue.current_timestamp()
    }

    /// Run budget for the execution engine before events must be serviced
    #[inline]
    pub fn cycles_until_next_event(&self) -> u64 {
        self.queue.cycles_until_next_event()
    }

    pub fn event_queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Device-side access for scheduling RunDsp, UpdateIr and friends
    pub fn event_queue_mut(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    /// True once per VBlank; clears the flag
    pub fn take_frame_done(&mut self) -> bool {
        std::mem::take(&mut self.frame_done)
    }

    // =========================================================================
    // Backends
    // =========================================================================

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn engine(&self) -> &dyn ExecutionEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn ExecutionEngine {
        self.engine.as_mut()
    }

    pub fn memory(&self) -> &dyn GuestMemory {
        self.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> &mut dyn GuestMemory {
        self.memory.as_mut()
    }

    pub fn metrics(&self) -> &KernelMetrics {
        &self.metrics
    }

    /// Producer half of the host request queue, handed out once
    pub fn take_host_producer(&mut self) -> Option<HostRequestProducer> {
        self.host_tx.take()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("objects", &self.objects.len())
            .field("threads", &self.thread_count)
            .field("current", &self.current)
            .field("timestamp", &self.queue.current_timestamp())
            .finish()
    }
}
