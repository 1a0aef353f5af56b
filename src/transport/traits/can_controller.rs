//! Contract between the transport layer and a concrete CAN controller.
//! One implementation exists per target board; everything above this trait
//! is hardware independent.
use crate::transport::bit_timing::BitTiming;
use crate::transport::frame::{CanFilter, CanFrame};

/// Register-level operations of one physical CAN controller instance.
///
/// Implementations own the peripheral exclusively. The interrupt side of the
/// peripheral is wired separately: board interrupt handlers decode events
/// and push them through the
/// [`EventQueue`](crate::transport::event::EventQueue); this trait only
/// covers what the transport calls from task context.
pub trait CanController {
    type Error: core::fmt::Debug;

    /// Clock feeding the bit-timing prescaler, in Hz.
    fn peripheral_clock_hz(&self) -> u32;

    /// Program bit timing and the acceptance filter, clear stale completion
    /// flags, enable the transmit-mailbox-empty, frame-received, error and
    /// bus-off interrupt sources, and synchronize to the bus.
    ///
    /// Only called while the controller is quiescent; the filter bank is
    /// not writable during live reception.
    fn start(&mut self, timing: &BitTiming, filter: &CanFilter) -> Result<(), Self::Error>;

    /// Silence the controller. After return no further events may be
    /// delivered. Must be idempotent.
    fn stop(&mut self);

    /// Emptiness mask of the transmit mailboxes (bit i set = mailbox i
    /// empty). Read under the caller's critical section.
    fn empty_mailboxes(&self) -> u8;

    /// Write identifier, length and data into the given mailbox and flag it
    /// for transmission. Called under the caller's critical section, with
    /// `mailbox` guaranteed empty.
    fn load_and_request(&mut self, mailbox: usize, frame: &CanFrame);
}
