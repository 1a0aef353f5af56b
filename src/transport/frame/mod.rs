//! In-memory representations of a CAN frame and a reception acceptance
//! filter. Pure value types with validated construction and no behavior
//! beyond it.
use crate::error::FrameError;
use embedded_can::{ExtendedId, Id, StandardId};

/// Maximum payload length of a classic CAN frame.
pub const MAX_FRAME_DATA: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Raw CAN frame as exchanged with the controller hardware.
///
/// The identifier invariant (11 bits standard, 29 bits extended) is carried
/// by [`embedded_can::Id`] and cannot be violated once constructed.
pub struct CanFrame {
    /// Standard or extended identifier.
    pub id: Id,
    /// Payload buffer. Only the first `len` bytes are meaningful.
    pub data: [u8; MAX_FRAME_DATA],
    /// Number of valid payload bytes (DLC, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from an already validated identifier and a payload of
    /// at most [`MAX_FRAME_DATA`] bytes. Oversized payloads are rejected,
    /// never truncated.
    pub fn new(id: impl Into<Id>, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_FRAME_DATA {
            return Err(FrameError::PayloadTooLong { len: payload.len() });
        }
        let mut data = [0u8; MAX_FRAME_DATA];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id: id.into(),
            data,
            len: payload.len(),
        })
    }

    /// Build a frame from a raw identifier value and an explicit width flag.
    /// Out-of-range identifiers are a hard failure.
    pub fn from_raw(raw_id: u32, extended: bool, payload: &[u8]) -> Result<Self, FrameError> {
        let id = make_id(raw_id, extended)?;
        Self::new(id, payload)
    }

    /// Raw identifier value, regardless of width.
    pub fn raw_id(&self) -> u32 {
        match self.id {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        }
    }

    /// Whether the identifier is 29-bit extended.
    pub fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    /// Immutable view over the valid payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Validate a raw identifier against the bound implied by its width.
pub fn make_id(raw_id: u32, extended: bool) -> Result<Id, FrameError> {
    if extended {
        ExtendedId::new(raw_id)
            .map(Id::Extended)
            .ok_or(FrameError::IdOutOfRange)
    } else {
        let narrow = u16::try_from(raw_id).map_err(|_| FrameError::IdOutOfRange)?;
        StandardId::new(narrow)
            .map(Id::Standard)
            .ok_or(FrameError::IdOutOfRange)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Identifier width a reception filter applies to.
pub enum FilterMode {
    /// Match 11-bit standard identifiers only.
    Standard,
    /// Match 29-bit extended identifiers only.
    Extended,
    /// Match both widths. The controller must reserve two independent
    /// match slots, one per identifier width.
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Message reception acceptance filter.
///
/// Owned by the transport; replacing it requires a disconnect/reconfigure/
/// reconnect cycle because the hardware filter bank is only writable while
/// the controller is not actively matching traffic.
pub struct CanFilter {
    /// Bit values to match in the received identifier.
    pub code: u32,
    /// Mask selecting which code bits participate. A mask bit of 0 means
    /// don't-care.
    pub mask: u32,
    /// Identifier width the filter applies to.
    pub mode: FilterMode,
}

impl CanFilter {
    /// Filter with explicit code, mask and mode.
    pub const fn new(code: u32, mask: u32, mode: FilterMode) -> Self {
        Self { code, mask, mode }
    }

    /// Filter that accepts every frame of both widths.
    pub const fn accept_all() -> Self {
        Self::new(0, 0, FilterMode::Both)
    }

    /// Filter that accepts exactly one identifier.
    pub fn exact_match(id: Id) -> Self {
        match id {
            Id::Standard(id) => Self::new(id.as_raw() as u32, 0x7FF, FilterMode::Standard),
            Id::Extended(id) => Self::new(id.as_raw(), 0x1FFF_FFFF, FilterMode::Extended),
        }
    }
}
//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
