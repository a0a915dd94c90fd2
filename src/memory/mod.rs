/*!
 * Memory Module
 * Guest memory boundary and the default sparse backing store
 */

mod paged;
pub mod traits;

pub use paged::PagedMemory;
pub use traits::{GuestMemory, GuestRead, GuestWrite};
