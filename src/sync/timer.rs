/*!
 * Timer
 */

use super::waitlist::WaitList;
use crate::core::types::{ResetType, Tick};

/// Kernel timer payload
///
/// `initial_delay` and `interval` are in nanoseconds; `fire_tick` is the
/// absolute cycle count of the next expiry while `running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub reset_type: ResetType,
    pub fired: bool,
    pub running: bool,
    pub initial_delay: u64,
    pub interval: u64,
    pub fire_tick: Tick,
    pub waitlist: WaitList,
}

impl Timer {
    pub fn new(reset_type: ResetType) -> Self {
        Self {
            reset_type,
            fired: false,
            running: false,
            initial_delay: 0,
            interval: 0,
            fire_tick: 0,
            waitlist: WaitList::new(),
        }
    }
}
