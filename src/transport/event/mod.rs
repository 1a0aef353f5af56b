//! Hand-off of hardware events from interrupt context to task context.
//!
//! Interrupt handlers perform only register reads/writes, decode the event
//! into a [`HardwareEvent`] and push it through a bounded channel with a
//! non-blocking enqueue; an interrupt must never wait. The transport worker
//! is the sole consumer. Ownership transfers by copy through the queue.
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::transport::frame::CanFrame;

/// Default capacity for the hardware event queue.
pub const EVENT_QUEUE_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Event decoded by an interrupt handler from the controller registers.
pub enum HardwareEvent {
    /// A transmit mailbox completed; carries the frame reconstructed from
    /// the mailbox registers.
    Transmitted(CanFrame),
    /// A frame passed the acceptance filter and was read out of the
    /// reception FIFO.
    Received(CanFrame),
    /// The controller was removed from bus arbitration by its error
    /// recovery logic.
    BusOff,
}

/// Bounded queue carrying [`HardwareEvent`]s from ISRs to the worker task.
///
/// Firmware allocates one statically (e.g. through `static_cell`) and hands
/// the same reference to the interrupt trampolines and to the
/// [`TransportRunner`](crate::transport::driver::TransportRunner).
pub type EventQueue<M, const CAP: usize> = Channel<M, HardwareEvent, CAP>;

/// Non-blocking enqueue for interrupt context.
///
/// Returns `false` when the queue is full, in which case the incoming event
/// is dropped; data loss under overload is the accepted degradation, as no
/// backpressure toward the interrupt source exists.
pub fn publish_from_isr<M: RawMutex, const CAP: usize>(
    queue: &EventQueue<M, CAP>,
    event: HardwareEvent,
) -> bool {
    let accepted = queue.try_send(event).is_ok();
    #[cfg(feature = "defmt")]
    if !accepted {
        defmt::warn!("hardware event queue full, event dropped");
    }
    accepted
}
