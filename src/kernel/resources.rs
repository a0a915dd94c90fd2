/*!
 * Resource Accounting
 * Per-process limits on object counts and committed memory
 */

use super::Kernel;
use crate::core::errors::KernelError;
use crate::core::types::{Handle, KernelResult};
use crate::objects::handles::CURRENT_PROCESS;
use crate::objects::{Process, ResourceLimits, ResourceType};
use log::trace;

impl Kernel {
    fn limits_mut(&mut self) -> KernelResult<&mut ResourceLimits> {
        let handle = self.resource_limit;
        self.objects
            .get_as_mut::<ResourceLimits>(handle)
            .ok_or_else(|| KernelError::InvalidState("process has no resource limit".into()))
    }

    /// Charge one unit of `resource` to the current process
    pub(crate) fn charge(&mut self, resource: ResourceType) -> KernelResult<()> {
        self.limits_mut()?.acquire(resource, 1)?;
        trace!("Charged one {} to the process", resource.as_str());
        Ok(())
    }

    pub(crate) fn uncharge(&mut self, resource: ResourceType) {
        if let Ok(limits) = self.limits_mut() {
            limits.release(resource, 1);
        }
    }

    /// Account `bytes` of newly committed guest memory
    pub fn commit_memory(&mut self, bytes: u32) -> KernelResult<()> {
        self.limits_mut()?.acquire(ResourceType::Commit, u64::from(bytes))
    }

    pub fn release_memory(&mut self, bytes: u32) {
        if let Ok(limits) = self.limits_mut() {
            limits.release(ResourceType::Commit, u64::from(bytes));
        }
    }

    /// Resource limit object behind a process handle
    ///
    /// Accepts the current-process pseudo-handle or a real process handle.
    pub fn resource_limit_of(&self, process: Handle) -> Option<Handle> {
        if process == CURRENT_PROCESS {
            return Some(self.resource_limit);
        }
        self.objects
            .get_as::<Process>(process)
            .map(|p| p.resource_limit)
    }

    /// Configured maximum of `resource` in the limit object `handle`
    pub fn resource_limit_value(&self, handle: Handle, resource: ResourceType) -> Option<u64> {
        self.objects
            .get_as::<ResourceLimits>(handle)
            .map(|limits| limits.max(resource))
    }

    /// Live value of `resource` in the limit object `handle`
    ///
    /// Priority reports the highest priority (lowest number) among live user
    /// threads; CPU time reports the configured allotment.
    pub fn resource_current_value(&self, handle: Handle, resource: ResourceType) -> Option<u64> {
        let limits = self.objects.get_as::<ResourceLimits>(handle)?;
        let value = match resource {
            ResourceType::Priority => self
                .user_threads()
                .iter()
                .filter(|t| t.is_alive())
                .map(|t| u64::from(t.priority))
                .min()
                .unwrap_or(0),
            ResourceType::CpuTime => self.config.cpu_time_limit,
            other => limits.current(other),
        };
        Some(value)
    }
}
