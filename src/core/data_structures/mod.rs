/*!
 * Data Structures
 *
 * Small-string storage for error payloads, service names and port names.
 *
 * # Performance
 *
 * - Inline strings: no heap allocation for strings up to 23 bytes, which covers
 *   every service and port name the kernel ever registers
 */

mod inline_string;

pub use inline_string::InlineString;
