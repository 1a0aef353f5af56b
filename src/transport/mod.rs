//! CAN transport layer: frame and filter value types, bit-timing synthesis,
//! transmit mailbox arbitration, interrupt event decoupling, and the driver
//! that ties them to a concrete CAN controller.
//!
//! ## Timing Constants
//!
//! These constants bound the blocking behavior of the transport worker so
//! that no task in the system ever waits indefinitely.

pub mod bit_timing;
pub mod driver;
pub mod event;
pub mod frame;
pub mod mailbox;
pub mod traits;

/// Timeout for one wait cycle on the hardware event queue (ms).
///
/// The worker task blocks on the queue for at most this long, then re-arms
/// its wait. Event dispatch latency is unaffected; the bound only exists so
/// the wait is never unbounded.
pub const EVENT_WAIT_TIMEOUT_MS: u64 = 100;

/// Enumerated set of supported CAN communication speeds.
///
/// Mirrors the standard CAN rates. [`BitTiming::solve`] decides per board
/// whether a rate is actually reachable from the peripheral clock.
///
/// [`BitTiming::solve`]: bit_timing::BitTiming::solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Baudrate {
    /// 1 Mbit/s
    Br1M,
    /// 800 kbit/s
    Br800K,
    /// 500 kbit/s
    Br500K,
    /// 250 kbit/s
    Br250K,
    /// 125 kbit/s
    Br125K,
    /// 100 kbit/s
    Br100K,
    /// 50 kbit/s
    Br50K,
    /// 20 kbit/s
    Br20K,
    /// 10 kbit/s
    Br10K,
}

impl Baudrate {
    /// Communication speed in bits per second.
    pub const fn bits_per_second(self) -> u32 {
        match self {
            Baudrate::Br1M => 1_000_000,
            Baudrate::Br800K => 800_000,
            Baudrate::Br500K => 500_000,
            Baudrate::Br250K => 250_000,
            Baudrate::Br125K => 125_000,
            Baudrate::Br100K => 100_000,
            Baudrate::Br50K => 50_000,
            Baudrate::Br20K => 20_000,
            Baudrate::Br10K => 10_000,
        }
    }
}
