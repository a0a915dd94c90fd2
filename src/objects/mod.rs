/*!
 * Kernel Objects
 * Append-only object arena addressed by handle
 *
 * Handle == index into the table. Slots are never removed or reused; closing
 * a handle runs type-specific cleanup only, and the whole table is rebuilt on
 * kernel reset.
 */

pub mod handles;
mod port;
mod process;

pub use port::{MemoryBlock, MemoryPermission, Port, Session};
pub use process::{Process, ResourceLimits, ResourceType, RESOURCE_TYPE_COUNT};

use crate::core::errors::KernelError;
use crate::core::limits::MAX_OBJECT_HANDLE;
use crate::core::types::{Handle, KernelResult, ThreadIndex};
use crate::sync::{AddressArbiter, Event, Mutex, Semaphore, Timer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Object type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    AddressArbiter,
    Event,
    Port,
    Process,
    ResourceLimit,
    Session,
    Thread,
    Timer,
    Semaphore,
    Mutex,
    MemoryBlock,
    Dummy,
}

impl ObjectKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddressArbiter => "address arbiter",
            Self::Event => "event",
            Self::Port => "port",
            Self::Process => "process",
            Self::ResourceLimit => "resource limit",
            Self::Session => "session",
            Self::Thread => "thread",
            Self::Timer => "timer",
            Self::Semaphore => "semaphore",
            Self::Mutex => "mutex",
            Self::MemoryBlock => "memory block",
            Self::Dummy => "dummy",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object payload, one variant per object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectData {
    Dummy,
    Process(Process),
    ResourceLimit(ResourceLimits),
    /// Index into the kernel thread array
    Thread(ThreadIndex),
    Event(Event),
    Semaphore(Semaphore),
    Mutex(Mutex),
    Timer(Timer),
    AddressArbiter(AddressArbiter),
    Port(Port),
    Session(Session),
    MemoryBlock(MemoryBlock),
}

impl ObjectData {
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Dummy => ObjectKind::Dummy,
            Self::Process(_) => ObjectKind::Process,
            Self::ResourceLimit(_) => ObjectKind::ResourceLimit,
            Self::Thread(_) => ObjectKind::Thread,
            Self::Event(_) => ObjectKind::Event,
            Self::Semaphore(_) => ObjectKind::Semaphore,
            Self::Mutex(_) => ObjectKind::Mutex,
            Self::Timer(_) => ObjectKind::Timer,
            Self::AddressArbiter(_) => ObjectKind::AddressArbiter,
            Self::Port(_) => ObjectKind::Port,
            Self::Session(_) => ObjectKind::Session,
            Self::MemoryBlock(_) => ObjectKind::MemoryBlock,
        }
    }
}

/// Payload types that can be borrowed out of an [`ObjectData`]
pub trait ObjectPayload: Sized {
    const KIND: ObjectKind;

    fn from_data(data: &ObjectData) -> Option<&Self>;
    fn from_data_mut(data: &mut ObjectData) -> Option<&mut Self>;
}

macro_rules! impl_payload {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl ObjectPayload for $ty {
                const KIND: ObjectKind = ObjectKind::$variant;

                #[inline]
                fn from_data(data: &ObjectData) -> Option<&Self> {
                    match data {
                        ObjectData::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }

                #[inline]
                fn from_data_mut(data: &mut ObjectData) -> Option<&mut Self> {
                    match data {
                        ObjectData::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_payload! {
    Process => Process,
    ResourceLimit => ResourceLimits,
    Event => Event,
    Semaphore => Semaphore,
    Mutex => Mutex,
    Timer => Timer,
    AddressArbiter => AddressArbiter,
    Port => Port,
    Session => Session,
    MemoryBlock => MemoryBlock,
}

/// Entry in the object table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelObject {
    pub handle: Handle,
    pub data: ObjectData,
}

impl KernelObject {
    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.data.kind()
    }
}

/// Object arena
#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: Vec<KernelObject>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy every object payload
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Append an object and return its handle
    pub fn insert(&mut self, data: ObjectData) -> KernelResult<Handle> {
        let index = self.objects.len();
        if index > MAX_OBJECT_HANDLE as usize {
            return Err(KernelError::HandleSpaceExhausted(index));
        }
        let handle = index as Handle;
        self.objects.push(KernelObject { handle, data });
        Ok(handle)
    }

    /// Handle the next insert will return
    #[inline]
    pub fn next_handle(&self) -> Handle {
        self.objects.len() as Handle
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&KernelObject> {
        self.objects.get(handle as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut KernelObject> {
        self.objects.get_mut(handle as usize)
    }

    #[inline]
    pub fn kind(&self, handle: Handle) -> Option<ObjectKind> {
        self.get(handle).map(KernelObject::kind)
    }

    /// Typed lookup; `None` for out-of-range handles and type mismatches
    #[inline]
    pub fn get_as<T: ObjectPayload>(&self, handle: Handle) -> Option<&T> {
        self.get(handle).and_then(|obj| T::from_data(&obj.data))
    }

    #[inline]
    pub fn get_as_mut<T: ObjectPayload>(&mut self, handle: Handle) -> Option<&mut T> {
        self.get_mut(handle)
            .and_then(|obj| T::from_data_mut(&mut obj.data))
    }

    /// Thread slot referenced by a thread handle
    #[inline]
    pub fn thread_index(&self, handle: Handle) -> Option<ThreadIndex> {
        match self.get(handle)?.data {
            ObjectData::Thread(index) => Some(index),
            _ => None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KernelObject> {
        self.objects.iter()
    }
}
