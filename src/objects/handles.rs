/*!
 * Reserved Handles
 * Pseudo-handles and fixed service handles that bypass the object table
 */

use crate::core::types::Handle;

/// Resolves to the calling thread
pub const CURRENT_THREAD: Handle = 0xFFFF_8000;

/// Resolves to the calling process
pub const CURRENT_PROCESS: Handle = 0xFFFF_8001;

/// First fixed service handle (ac)
pub const MIN_SERVICE_HANDLE: Handle = 0xFFFF_8002;

/// Last fixed service handle (y2r)
pub const MAX_SERVICE_HANDLE: Handle = 0xFFFF_8016;

#[inline(always)]
pub const fn is_service_handle(handle: Handle) -> bool {
    handle >= MIN_SERVICE_HANDLE && handle <= MAX_SERVICE_HANDLE
}
