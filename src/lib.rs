/*!
 * Horizon Kernel Library
 * Object/handle table, cooperative thread scheduler, synchronization primitives,
 * hardware event queue and IPC dispatch for an emulated handheld console kernel
 */

pub mod core;
pub mod cpu;
pub mod host;
pub mod ipc;
pub mod kernel;
pub mod memory;
pub mod monitoring;
pub mod objects;
pub mod svc;
pub mod sync;
pub mod thread;
pub mod timing;

// Re-exports
pub use crate::core::{
    GuestResult, Handle, KernelConfig, KernelError, KernelResult, ResetType,
    ResourceLimitCategory, ResultCode,
};
pub use cpu::{ExceptionKind, ExecutionEngine, RegisterFile, ThreadContext};
pub use host::{host_request_queue, HostRequest, HostRequestConsumer, HostRequestProducer};
pub use ipc::{CommandBuffer, IpcHeader, ServiceHandler, ServiceId};
pub use kernel::{DeviceEventHandler, Kernel, NullDevices};
pub use memory::{GuestMemory, PagedMemory};
pub use monitoring::{init_tracing, KernelMetrics, MetricsSnapshot};
pub use objects::{ObjectData, ObjectKind};
pub use thread::{ProcessorId, Thread, ThreadStatus};
pub use timing::{ns_to_cycles, EventQueue, EventType};
