//! CAN bit-timing synthesis.
//!
//! A CAN bit period is subdivided into time quanta (TQ): one fixed sync
//! segment plus phase segment 1 and phase segment 2. The controller limits
//! phase segment 1 to [1,16] and phase segment 2 to [1,8]. For a requested
//! baud rate the synthesis must find a prescaler and segment pair such that
//! `peripheral_clock / prescaler / total_tq` equals the rate *exactly*: no
//! tolerance is permitted, because phase error accumulates across a
//! multi-node bus.
use crate::error::BitTimingError;

/// Largest supported baud rate prescaler value.
pub const MAX_PRESCALER: u16 = 1024;

/// Upper bound for the synchronization jump width, in TQ.
const MAX_SYNC_JUMP_WIDTH: u8 = 4;

/// Phase segment pair for one total TQ count.
struct SegmentPair {
    total_tq: u8,
    phase_seg1: u8,
    phase_seg2: u8,
}

/// Segment pairs for every reachable total TQ count, descending.
///
/// Each entry places the sample point as close to 75 % as the hardware
/// granularity allows, with ties resolved toward the later sample point.
/// TQ counts of 24 and 25 have no pair: hitting the 75 % region there would
/// need a phase segment 1 above the 16 TQ hardware limit.
static SEGMENT_TABLE: [SegmentPair; 21] = [
    SegmentPair { total_tq: 23, phase_seg1: 16, phase_seg2: 6 },
    SegmentPair { total_tq: 22, phase_seg1: 16, phase_seg2: 5 },
    SegmentPair { total_tq: 21, phase_seg1: 15, phase_seg2: 5 },
    SegmentPair { total_tq: 20, phase_seg1: 14, phase_seg2: 5 },
    SegmentPair { total_tq: 19, phase_seg1: 13, phase_seg2: 5 },
    SegmentPair { total_tq: 18, phase_seg1: 13, phase_seg2: 4 },
    SegmentPair { total_tq: 17, phase_seg1: 12, phase_seg2: 4 },
    SegmentPair { total_tq: 16, phase_seg1: 11, phase_seg2: 4 },
    SegmentPair { total_tq: 15, phase_seg1: 10, phase_seg2: 4 },
    SegmentPair { total_tq: 14, phase_seg1: 10, phase_seg2: 3 },
    SegmentPair { total_tq: 13, phase_seg1: 9, phase_seg2: 3 },
    SegmentPair { total_tq: 12, phase_seg1: 8, phase_seg2: 3 },
    SegmentPair { total_tq: 11, phase_seg1: 7, phase_seg2: 3 },
    SegmentPair { total_tq: 10, phase_seg1: 7, phase_seg2: 2 },
    SegmentPair { total_tq: 9, phase_seg1: 6, phase_seg2: 2 },
    SegmentPair { total_tq: 8, phase_seg1: 5, phase_seg2: 2 },
    SegmentPair { total_tq: 7, phase_seg1: 4, phase_seg2: 2 },
    SegmentPair { total_tq: 6, phase_seg1: 4, phase_seg2: 1 },
    SegmentPair { total_tq: 5, phase_seg1: 3, phase_seg2: 1 },
    SegmentPair { total_tq: 4, phase_seg1: 2, phase_seg2: 1 },
    SegmentPair { total_tq: 3, phase_seg1: 1, phase_seg2: 1 },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Synthesized bit-timing parameters, ready to program into the controller.
///
/// Values are logical (1-based); register encodings such as bxCAN's
/// minus-one fields are the controller implementation's concern.
pub struct BitTiming {
    /// Baud rate prescaler, 1 to [`MAX_PRESCALER`].
    pub prescaler: u16,
    /// Phase segment 1 length in TQ, 1 to 16.
    pub phase_seg1: u8,
    /// Phase segment 2 length in TQ, 1 to 8.
    pub phase_seg2: u8,
    /// Synchronization jump width in TQ, 1 to 4.
    pub sync_jump_width: u8,
}

impl BitTiming {
    /// Search for bit-timing parameters that hit `baud_rate` exactly.
    ///
    /// Prescalers are tried in ascending order; for each one the segment
    /// table is scanned highest TQ first, so the first exact match is also
    /// the one with the best achievable sample-point resolution. The result
    /// is deterministic for a given clock and rate.
    ///
    /// Failure indicates a build-time misconfiguration: callers are expected
    /// to treat it as startup-fatal rather than recoverable.
    pub fn solve(peripheral_clock_hz: u32, baud_rate: u32) -> Result<Self, BitTimingError> {
        for prescaler in 1..=MAX_PRESCALER {
            for pair in &SEGMENT_TABLE {
                let synthesized =
                    baud_rate as u64 * prescaler as u64 * pair.total_tq as u64;
                if synthesized == peripheral_clock_hz as u64 {
                    return Ok(Self {
                        prescaler,
                        phase_seg1: pair.phase_seg1,
                        phase_seg2: pair.phase_seg2,
                        sync_jump_width: MAX_SYNC_JUMP_WIDTH.min(pair.phase_seg2),
                    });
                }
            }
        }
        Err(BitTimingError::NoExactSolution {
            peripheral_clock_hz,
            baud_rate,
        })
    }

    /// Total bit time in TQ, sync segment included.
    pub fn total_tq(&self) -> u8 {
        1 + self.phase_seg1 + self.phase_seg2
    }

    /// Sample point position in permille of the bit period.
    pub fn sample_point_permille(&self) -> u16 {
        (1 + self.phase_seg1) as u16 * 1000 / self.total_tq() as u16
    }
}
