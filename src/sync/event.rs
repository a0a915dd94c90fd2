/*!
 * Event
 */

use super::waitlist::WaitList;
use crate::core::types::ResetType;
use crate::ipc::ServiceId;

/// Kernel-side hook attached to an event
///
/// When an event carrying a callback is signalled, the owning service is
/// notified with `tag` after the event's waiters have been woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventCallback {
    pub service: ServiceId,
    pub tag: u32,
}

/// Event object payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub reset_type: ResetType,
    pub fired: bool,
    pub waitlist: WaitList,
    pub callback: Option<EventCallback>,
}

impl Event {
    pub fn new(reset_type: ResetType) -> Self {
        Self {
            reset_type,
            fired: false,
            waitlist: WaitList::new(),
            callback: None,
        }
    }

    pub fn with_callback(reset_type: ResetType, callback: EventCallback) -> Self {
        Self {
            callback: Some(callback),
            ..Self::new(reset_type)
        }
    }
}
