//! `xcp-bridge` library: the hardware-independent core of an XCP USB-to-CAN
//! gateway for `no_std` environments. The crate exposes the CAN transport
//! layer (bit-timing synthesis, mailbox arbitration, interrupt event
//! decoupling), the fixed-step control loop, and the gateway state machine
//! that reframes XCP packets between a USB host and a CAN target.
#![no_std]
//==================================================================================
/// Fixed-step control loop: tick publisher and subscriber contract.
pub mod control_loop;
/// Domain and low-level errors (frame construction, bit timing,
/// transmission, transport lifecycle).
pub mod error;
/// XCP gateway: USB transfer framing, connection state machine,
/// bootloader hand-off, and boundary traits.
pub mod gateway;
/// CAN transport layer: frame and filter value types, bit-timing synthesis,
/// transmit mailbox arbitration, and the interrupt event worker.
pub mod transport;
//==================================================================================
