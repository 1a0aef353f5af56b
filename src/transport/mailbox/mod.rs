//! Transmit mailbox accounting.
//!
//! The controller exposes three transmit mailboxes and reports their
//! emptiness as a 3-bit mask (bit i set = mailbox i empty). Selection always
//! prefers the lowest-index empty mailbox so transmissions issued while
//! several mailboxes are free keep an approximate FIFO ordering.

/// Number of hardware transmit mailboxes.
pub const TX_MAILBOX_COUNT: usize = 3;

/// Lowest set bit per 3-bit mask value. A table lookup rather than a loop,
/// to bound interrupt-context latency.
static FIRST_EMPTY: [Option<usize>; 8] = [
    None,    // 0b000
    Some(0), // 0b001
    Some(1), // 0b010
    Some(0), // 0b011
    Some(2), // 0b100
    Some(0), // 0b101
    Some(1), // 0b110
    Some(0), // 0b111
];

/// Resolve the lowest-index empty mailbox from the emptiness mask.
/// Returns `None` when all mailboxes are occupied.
#[inline]
pub fn first_empty(mask: u8) -> Option<usize> {
    FIRST_EMPTY[(mask & 0b111) as usize]
}
