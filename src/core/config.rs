/*!
 * Kernel Configuration
 * Per-instance settings with JSON loading
 */

use super::errors::KernelError;
use super::limits::*;
use super::types::{GuestAddr, KernelResult, Priority};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which resource-limit table the main process runs under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLimitCategory {
    #[default]
    Application,
    SystemApplet,
    LibraryApplet,
    Other,
}

/// Kernel configuration
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub resource_limit_category: ResourceLimitCategory,
    pub main_thread_priority: Priority,
    /// Delay applied to the caller after every SendSyncRequest
    pub sync_request_delay_ns: i64,
    pub linear_heap_base: GuestAddr,
    pub idle_thread_code_address: GuestAddr,
    pub host_queue_capacity: usize,
    /// Value reported for the CPUTime resource
    pub cpu_time_limit: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            resource_limit_category: ResourceLimitCategory::Application,
            main_thread_priority: DEFAULT_MAIN_THREAD_PRIORITY,
            sync_request_delay_ns: DEFAULT_SYNC_REQUEST_DELAY_NS,
            linear_heap_base: DEFAULT_LINEAR_HEAP_BASE,
            idle_thread_code_address: DEFAULT_IDLE_THREAD_CODE,
            host_queue_capacity: DEFAULT_HOST_QUEUE_CAPACITY,
            cpu_time_limit: 0,
        }
    }
}

impl KernelConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> KernelResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> KernelResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Loaded kernel config from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.main_thread_priority > LOWEST_USER_PRIORITY {
            return Err(KernelError::Config(
                format!(
                    "main_thread_priority 0x{:X} is above 0x{:X}",
                    self.main_thread_priority, LOWEST_USER_PRIORITY
                )
                .into(),
            ));
        }
        if self.linear_heap_base >= LINEAR_HEAP_END || self.linear_heap_base % PAGE_SIZE != 0 {
            return Err(KernelError::Config(
                format!("linear_heap_base 0x{:08X} is invalid", self.linear_heap_base).into(),
            ));
        }
        if self.idle_thread_code_address % 4 != 0 {
            return Err(KernelError::Config(
                "idle_thread_code_address must be word aligned".into(),
            ));
        }
        if self.host_queue_capacity == 0 {
            return Err(KernelError::Config(
                "host_queue_capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
