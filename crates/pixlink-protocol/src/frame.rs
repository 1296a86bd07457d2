//! Frame type and encoding.
//!
//! A frame is one complete protocol-level command: the generic 6-byte
//! header followed by the opcode-defined payload.
//!
//! ```text
//! +-----------------------------+--------+------+------------------+
//! | payload length (u32, LE)    | opcode | mode | payload[0..len]  |
//! +-----------------------------+--------+------+------------------+
//! ```
//!
//! A partially transmitted frame is never a valid device command; the
//! transport layer treats any interruption mid-frame as a rejection.

use bytes::BufMut;
use log::trace;

use crate::commands::Command;
use crate::constants::FRAME_HEADER_LEN;
use crate::error::ProtocolError;

/// One complete protocol-level command before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    length: u32,
    opcode: u8,
    mode: u8,
    payload: Vec<u8>,
}

impl Frame {
    /// Assemble a frame from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] when the payload does not
    /// fit the header's 32-bit length field.
    pub fn new(opcode: u8, mode: u8, payload: Vec<u8>) -> Result<Self, ProtocolError> {
        let length = u32::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        Ok(Frame {
            length,
            opcode,
            mode,
            payload,
        })
    }

    /// Declared payload length. Always equals `payload().len()`.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Opcode byte.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Mode byte.
    pub fn mode(&self) -> u8 {
        self.mode
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Length of the serialized frame, header included.
    pub fn serialized_len(&self) -> usize {
        FRAME_HEADER_LEN + self.payload.len()
    }

    /// Serialize the frame for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        buf.put_u32_le(self.length);
        buf.put_u8(self.opcode);
        buf.put_u8(self.mode);
        buf.extend_from_slice(&self.payload);
        buf
    }
}

/// Encodes typed commands into frames.
pub struct FrameCodec;

impl FrameCodec {
    /// Encode a command into exactly one frame.
    ///
    /// Pure and deterministic: equal commands produce byte-identical
    /// frames.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidParameter`] when the command's
    /// parameters violate its family's constraints, and
    /// [`ProtocolError::PayloadTooLarge`] when the laid-out payload exceeds
    /// the length field's range.
    pub fn encode(command: &Command) -> Result<Frame, ProtocolError> {
        command.validate()?;
        let frame = Frame::new(command.opcode(), command.mode(), command.payload())?;
        trace!(
            "encoded frame opcode=0x{:02X} mode=0x{:02X} payload_len={}",
            frame.opcode(),
            frame.mode(),
            frame.length()
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::types::{DisplaySize, Rgb};

    #[test]
    fn test_frame_serialization_layout() {
        let frame = Frame::new(0x07, 0x01, vec![0x01]).expect("small frame should assemble");
        assert_eq!(frame.serialized_len(), FRAME_HEADER_LEN + 1);
        assert_eq!(
            frame.to_bytes(),
            vec![0x01, 0x00, 0x00, 0x00, 0x07, 0x01, 0x01]
        );
    }

    #[test]
    fn test_empty_payload_frame() {
        let frame = Frame::new(OP_SCREEN, MODE_NONE, Vec::new())
            .expect("empty payload should assemble");
        assert_eq!(frame.length(), 0);
        assert_eq!(frame.to_bytes(), vec![0, 0, 0, 0, OP_SCREEN, MODE_NONE]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let cmd = Command::Clock {
            style: crate::types::ClockStyle::Hourglass,
            show_date: false,
            hour24: true,
            color: Rgb::new(9, 8, 7),
        };
        let first = FrameCodec::encode(&cmd).expect("valid command should encode");
        let second = FrameCodec::encode(&cmd).expect("valid command should encode");
        assert_eq!(first.to_bytes(), second.to_bytes());
    }

    #[test]
    fn test_encode_screen_power_on() {
        let frame = FrameCodec::encode(&Command::ScreenPower { on: true })
            .expect("screen power should encode");
        assert_eq!(
            frame.to_bytes(),
            vec![0x01, 0x00, 0x00, 0x00, OP_POWER, MODE_FUNCTION, 0x01]
        );
    }

    #[test]
    fn test_encode_rejects_invalid_parameter() {
        let err = FrameCodec::encode(&Command::Brightness { percent: 0 }).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParameter { .. }));
    }

    #[test]
    fn test_encode_image_declares_payload_length() {
        let size = DisplaySize::Size16;
        let frame = FrameCodec::encode(&Command::Image {
            size,
            pixels: vec![0xFF; size.frame_len()],
        })
        .expect("well-sized image should encode");
        assert_eq!(frame.length() as usize, frame.payload().len());
        assert_eq!(
            frame.payload().len(),
            size.frame_len() + TRANSFER_BLOCK_HEADER_LEN
        );
    }
}
