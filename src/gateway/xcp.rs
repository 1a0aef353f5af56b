//! XCP-on-USB transfer framing.
//!
//! Byte 0 of a transfer is the payload length `n` (0 to 8); bytes `1..=n`
//! are the XCP packet. A transfer qualifies as a command candidate only if
//! its total length is `n + 1` and lies within [2, 9]. Anything else is
//! still relayed onto CAN byte-for-byte, but never interpreted.

/// XCP Connect command code.
pub const CMD_CONNECT: u8 = 0xFF;
/// XCP Disconnect command code.
pub const CMD_DISCONNECT: u8 = 0xFE;
/// XCP Program Reset command code.
pub const CMD_PROGRAM_RESET: u8 = 0xCF;

/// Largest XCP payload a single CAN frame can carry.
pub const MAX_PACKET_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Connection-relevant XCP command recognized in a well-formed transfer.
pub enum XcpCommand {
    /// Connect request; `mode` addresses a specific node for firmware
    /// update hand-off.
    Connect { mode: u8 },
    /// Disconnect request.
    Disconnect,
    /// Program Reset request; ends the session like a disconnect.
    ProgramReset,
    /// Any other well-formed packet. Forwarded, never interpreted.
    Other,
}

impl XcpCommand {
    /// Classify a USB transfer. Returns `None` when the transfer does not
    /// satisfy the length-prefix framing contract.
    pub fn parse(transfer: &[u8]) -> Option<Self> {
        if !(2..=MAX_PACKET_LEN + 1).contains(&transfer.len()) {
            return None;
        }
        let payload_len = transfer[0] as usize;
        if transfer.len() != payload_len + 1 {
            return None;
        }
        let payload = &transfer[1..];
        Some(match (payload[0], payload_len) {
            (CMD_CONNECT, 2) => XcpCommand::Connect { mode: payload[1] },
            (CMD_DISCONNECT, 1) => XcpCommand::Disconnect,
            (CMD_PROGRAM_RESET, 1) => XcpCommand::ProgramReset,
            _ => XcpCommand::Other,
        })
    }
}
