//! Unit tests for frame and filter construction.
use super::*;

//==================================================================================CAN_FRAME
#[test]
/// A standard-width frame keeps its identifier and payload intact.
fn frame_construction_standard() {
    let frame = CanFrame::from_raw(0x667, false, &[0xFF, 0x00]).unwrap();
    assert_eq!(frame.raw_id(), 0x667);
    assert!(!frame.is_extended());
    assert_eq!(frame.len, 2);
    assert_eq!(frame.payload(), &[0xFF, 0x00]);
    // Unused slots stay zeroed.
    assert_eq!(frame.data[2..], [0u8; 6]);
}

#[test]
/// Extended identifiers accept the full 29-bit range.
fn frame_construction_extended() {
    let frame = CanFrame::from_raw(0x1FFF_FFFF, true, &[]).unwrap();
    assert_eq!(frame.raw_id(), 0x1FFF_FFFF);
    assert!(frame.is_extended());
    assert_eq!(frame.len, 0);
}

#[test]
/// Identifiers above the width bound are a hard failure, never a wrap.
fn frame_rejects_out_of_range_id() {
    assert_eq!(
        CanFrame::from_raw(0x800, false, &[]).unwrap_err(),
        FrameError::IdOutOfRange
    );
    assert_eq!(
        CanFrame::from_raw(0x2000_0000, true, &[]).unwrap_err(),
        FrameError::IdOutOfRange
    );
}

#[test]
/// Payloads above 8 bytes are rejected, not truncated.
fn frame_rejects_long_payload() {
    let payload = [0u8; 9];
    assert_eq!(
        CanFrame::from_raw(0x123, false, &payload).unwrap_err(),
        FrameError::PayloadTooLong { len: 9 }
    );
}

//==================================================================================CAN_FILTER
#[test]
/// Exact-match filters select the width and full mask from the identifier.
fn filter_exact_match() {
    let std_filter = CanFilter::exact_match(make_id(0x7E1, false).unwrap());
    assert_eq!(std_filter.code, 0x7E1);
    assert_eq!(std_filter.mask, 0x7FF);
    assert_eq!(std_filter.mode, FilterMode::Standard);

    let ext_filter = CanFilter::exact_match(make_id(0x18DA_F101, true).unwrap());
    assert_eq!(ext_filter.code, 0x18DA_F101);
    assert_eq!(ext_filter.mask, 0x1FFF_FFFF);
    assert_eq!(ext_filter.mode, FilterMode::Extended);
}

#[test]
/// The accept-all filter matches both identifier widths with no code bits.
fn filter_accept_all() {
    let filter = CanFilter::accept_all();
    assert_eq!(filter.mask, 0);
    assert_eq!(filter.mode, FilterMode::Both);
}
