/*!
 * Object Creation
 * Kernel-internal constructors; guest-facing SVCs charge resource limits first
 */

use super::Kernel;
use crate::core::errors::KernelError;
use crate::core::limits::{MAX_THREADS, TLS_SIZE};
use crate::core::types::{GuestAddr, Handle, KernelResult, Priority, ResetType};
use crate::objects::{MemoryBlock, MemoryPermission, ObjectData, Port, Session};
use crate::sync::{AddressArbiter, Event, EventCallback, Mutex, Semaphore, Timer};
use crate::thread::{ProcessorId, Thread};
use log::debug;

impl Kernel {
    pub fn make_event(&mut self, reset_type: ResetType) -> KernelResult<Handle> {
        self.objects.insert(ObjectData::Event(Event::new(reset_type)))
    }

    /// Event whose signal is reported back to `callback.service`
    pub fn make_event_with_callback(
        &mut self,
        reset_type: ResetType,
        callback: EventCallback,
    ) -> KernelResult<Handle> {
        self.objects
            .insert(ObjectData::Event(Event::with_callback(reset_type, callback)))
    }

    pub fn make_semaphore(&mut self, initial: i32, maximum: i32) -> KernelResult<Handle> {
        self.objects
            .insert(ObjectData::Semaphore(Semaphore::new(initial, maximum)))
    }

    /// Mutex, owned by the running thread when `locked`
    pub fn make_mutex(&mut self, locked: bool) -> KernelResult<Handle> {
        let mut mutex = Mutex::new(None);
        if locked {
            mutex.lock(self.current);
        }
        self.objects.insert(ObjectData::Mutex(mutex))
    }

    pub fn make_timer(&mut self, reset_type: ResetType) -> KernelResult<Handle> {
        let handle = self.objects.insert(ObjectData::Timer(Timer::new(reset_type)))?;
        self.timers.push(handle);
        Ok(handle)
    }

    pub fn make_address_arbiter(&mut self) -> KernelResult<Handle> {
        self.objects.insert(ObjectData::AddressArbiter(AddressArbiter))
    }

    pub fn make_memory_block(
        &mut self,
        address: GuestAddr,
        size: u32,
        my_permission: MemoryPermission,
        other_permission: MemoryPermission,
    ) -> KernelResult<Handle> {
        self.objects.insert(ObjectData::MemoryBlock(MemoryBlock {
            address,
            size,
            my_permission,
            other_permission,
            mapped: false,
        }))
    }

    pub fn make_port(&mut self, name: &str) -> KernelResult<Handle> {
        self.objects.insert(ObjectData::Port(Port::new(name)))
    }

    pub fn make_session(&mut self, port: Handle) -> KernelResult<Handle> {
        self.objects.insert(ObjectData::Session(Session { port }))
    }

    /// Create a Ready thread in the next free slot
    ///
    /// Slots are handed out once per boot; running out is fatal.
    pub fn make_thread(
        &mut self,
        entrypoint: GuestAddr,
        initial_sp: GuestAddr,
        arg: u32,
        priority: Priority,
        processor_id: ProcessorId,
    ) -> KernelResult<Handle> {
        if self.thread_count >= MAX_THREADS {
            return Err(KernelError::limit("thread slots", MAX_THREADS as u32));
        }
        let index = self.thread_count;
        let handle = self.objects.insert(ObjectData::Thread(index))?;
        self.thread_count += 1;

        let mut thread = Thread::new(index, entrypoint, initial_sp, arg, priority, processor_id);
        thread.handle = Some(handle);
        thread.ready_seq = self.next_seq();
        self.memory.fill_zero(thread.tls_base(), TLS_SIZE);
        self.threads[index] = thread;

        debug!(
            "Created thread {} (handle {:X}, entry {:08X}, priority 0x{:X})",
            index, handle, entrypoint, priority
        );
        Ok(handle)
    }
}
