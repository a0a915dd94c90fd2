/*!
 * Core Module
 * Fundamental kernel types, guest result codes, configuration and error handling
 */

pub mod config;
pub mod data_structures;
pub mod errors;
pub mod limits;
pub mod result;
pub mod types;

// Re-export for convenience
pub use config::{KernelConfig, ResourceLimitCategory};
pub use data_structures::InlineString;
pub use errors::*;
pub use result::ResultCode;
pub use types::*;
