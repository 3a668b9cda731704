//! Wire frames for the command/reply boundary.
//!
//! Inbound command frames carry a one-byte command code followed by
//! command data. Outbound reply frames open with the module id and a
//! reply code, then up to [`FRAME_DATA_MAX`]` - 2` payload bytes:
//!
//! ```text
//! command:  [code] [data ...]
//! reply:    [module id] [reply code] [payload ...]
//! ```

use heapless::Vec;

/// Maximum wire frame size in bytes, command and reply alike.
pub const FRAME_DATA_MAX: usize = 200;

/// Inbound command codes (first command byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandCode {
    /// Forward the rest of the payload to the wire verbatim.
    SendAll = 0x00,
    /// Reconfigure the line from a mode string payload.
    SetParameters = 0x01,
}

impl CommandCode {
    /// Convert from raw wire byte.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(CommandCode::SendAll),
            0x01 => Some(CommandCode::SetParameters),
            _ => None,
        }
    }
}

/// Reply codes (second reply byte). Error codes sit at the top of the
/// byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Payload was forwarded to the wire.
    Sent = 0x00,
    /// A received frame follows in the payload.
    Received = 0x01,
    /// Line parameters accepted and persisted.
    BaudrateSet = 0x02,
    /// Receive buffer overflowed; inbound bytes were discarded.
    ErrOverflow = 0xFD,
    /// Malformed command.
    ErrFormat = 0xFE,
    /// UART rejected the requested parameters.
    ErrUart = 0xFF,
}

impl ReplyCode {
    /// Convert from raw wire byte.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(ReplyCode::Sent),
            0x01 => Some(ReplyCode::Received),
            0x02 => Some(ReplyCode::BaudrateSet),
            0xFD => Some(ReplyCode::ErrOverflow),
            0xFE => Some(ReplyCode::ErrFormat),
            0xFF => Some(ReplyCode::ErrUart),
            _ => None,
        }
    }
}

/// Borrowed view of an inbound command payload.
#[derive(Debug, Clone, Copy)]
pub struct CommandFrame<'a> {
    bytes: &'a [u8],
}

impl<'a> CommandFrame<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Raw command code byte, if the frame is non-empty.
    pub fn code(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// Bytes following the command code.
    pub fn data(&self) -> &'a [u8] {
        self.bytes.get(1..).unwrap_or(&[])
    }

    /// Total frame length, code byte included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Owned outbound reply frame.
///
/// Always at least two bytes: module id, then reply code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFrame {
    bytes: Vec<u8, FRAME_DATA_MAX>,
}

impl ReplyFrame {
    /// Two-byte status reply.
    pub fn status(module_id: u8, code: ReplyCode) -> Self {
        // FRAME_DATA_MAX >= 2, pushes cannot fail
        let mut bytes = Vec::new();
        let _ = bytes.push(module_id);
        let _ = bytes.push(code as u8);
        Self { bytes }
    }

    /// Status reply followed by a payload.
    ///
    /// Payload bytes beyond the frame capacity are truncated.
    pub fn with_payload(module_id: u8, code: ReplyCode, payload: &[u8]) -> Self {
        let mut frame = Self::status(module_id, code);
        let room = FRAME_DATA_MAX - frame.bytes.len();
        let take = payload.len().min(room);
        let _ = frame.bytes.extend_from_slice(&payload[..take]);
        frame
    }

    pub fn module_id(&self) -> u8 {
        self.bytes[0]
    }

    /// Raw reply code byte.
    pub fn reply_code(&self) -> u8 {
        self.bytes[1]
    }

    /// Payload after the two-byte header.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[2..]
    }

    /// Full frame as sent on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
