//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (frame construction,
//! bit-timing synthesis, transmission, transport lifecycle).
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur while constructing a CAN frame or filter.
pub enum FrameError {
    /// The identifier exceeds the bound implied by its width
    /// (0x7FF standard, 0x1FFFFFFF extended).
    #[error("Identifier out of range")]
    IdOutOfRange,
    /// The payload exceeds the 8-byte classic CAN ceiling.
    #[error("Payload too long: {len} bytes")]
    PayloadTooLong { len: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Bit-timing synthesis failure. Indicates a build-time misconfiguration
/// (clock and baud rate have no exact divisor), not a runtime condition.
pub enum BitTimingError {
    /// No prescaler/TQ combination divides the peripheral clock exactly
    /// down to the requested baud rate.
    #[error("No exact bit timing for {baud_rate} bit/s at {peripheral_clock_hz} Hz")]
    NoExactSolution {
        peripheral_clock_hz: u32,
        baud_rate: u32,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Non-fatal transmission failures reported to the caller, who decides
/// whether to drop, queue, or retry.
pub enum TransmitError {
    /// All three transmit mailboxes are occupied.
    #[error("All transmit mailboxes occupied")]
    Busy,
    /// The transport is not connected to the bus.
    #[error("Transport not connected")]
    NotConnected,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failure to register a subscriber with the control-loop publisher.
pub enum AttachError {
    /// The fixed-capacity subscriber set is full.
    #[error("Subscriber capacity exhausted")]
    CapacityExhausted,
}

#[derive(Error, Debug)]
/// Transport lifecycle errors: claiming the controller and (re)configuring it.
pub enum TransportError<E: core::fmt::Debug> {
    /// Another live transport instance already owns the CAN controller.
    /// Exactly one instance may exist at a time.
    #[error("CAN controller already claimed")]
    ControllerClaimed,

    /// Bit-timing synthesis failed for the requested baud rate.
    #[error(transparent)]
    BitTiming(#[from] BitTimingError),

    /// Error propagated from the hardware controller.
    #[error("Controller error: {0:?}")]
    Controller(E),
}
