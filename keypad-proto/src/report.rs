//! 64-byte Feature Report framing for the configuration interface.
//!
//! # Request
//!
//! ```text
//! byte 0      report id (0x04)
//! byte 1      command
//! bytes 2-62  command payload
//! byte 63     XOR of bytes 0-62
//! ```
//!
//! # Response
//!
//! ```text
//! byte 0      report id (0x04)
//! byte 1      echoed command (0xFF when the request checksum failed)
//! byte 2      status
//! bytes 3-62  response payload
//! byte 63     XOR of bytes 0-62
//! ```

use crate::checksum::xor_checksum;

/// Length of every request and response, including the report id.
pub const REPORT_LEN: usize = 64;

/// Report id carried in byte 0.
pub const CONFIG_REPORT_ID: u8 = 0x04;

/// Offset of the frame checksum.
pub const FRAME_CHECKSUM_OFFSET: usize = REPORT_LEN - 1;

/// Command echoed in a response to a request with a bad checksum.
pub const CHECKSUM_ERROR_COMMAND: u8 = 0xFF;

/// First payload byte of a request.
pub const REQUEST_PAYLOAD_OFFSET: usize = 2;

/// First payload byte of a response.
pub const RESPONSE_PAYLOAD_OFFSET: usize = 3;

/// Magic that FACTORY_RESET must carry in bytes 2-5.
pub const FACTORY_RESET_MAGIC: [u8; 4] = [0xEF, 0xBE, 0xAD, 0xDE];

/// Number of packets in a READ_CONFIG or WRITE_ALL transfer.
pub const TRANSFER_PACKETS: u8 = 3;

/// Bytes carried by each full packet of a multi-packet transfer.
pub const TRANSFER_CHUNK: usize = 56;

/// A raw report.
pub type Frame = [u8; REPORT_LEN];

/// XOR of every byte that precedes the checksum.
#[inline]
#[must_use]
pub fn frame_checksum(frame: &Frame) -> u8 {
    xor_checksum(&frame[..FRAME_CHECKSUM_OFFSET])
}

/// Request commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    ReadConfig = 0x01,
    WriteAction = 0x02,
    WriteAll = 0x03,
    GetInfo = 0x04,
    SetSlot = 0x05,
    FactoryReset = 0x06,
    SetBrightness = 0x07,
}

impl Command {
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => Command::ReadConfig,
            0x02 => Command::WriteAction,
            0x03 => Command::WriteAll,
            0x04 => Command::GetInfo,
            0x05 => Command::SetSlot,
            0x06 => Command::FactoryReset,
            0x07 => Command::SetBrightness,
            _ => return None,
        })
    }
}

/// Response status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    Success = 0x00,
    ChecksumError = 0x01,
    InvalidCommand = 0x02,
    InvalidSlot = 0x03,
    InvalidInput = 0x04,
    /// Persisting failed; the in-memory change was rolled back.
    StorageFailure = 0x05,
}

impl Status {
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Status::Success,
            0x01 => Status::ChecksumError,
            0x02 => Status::InvalidCommand,
            0x03 => Status::InvalidSlot,
            0x04 => Status::InvalidInput,
            0x05 => Status::StorageFailure,
            _ => return None,
        })
    }
}

/// Why a frame was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Wrong length or report id: not addressed to us, no response.
    Ignored,
    /// Framing is fine but the checksum is wrong.
    Checksum { stored: u8, computed: u8 },
}

fn validate(data: &[u8]) -> Result<Frame, FrameError> {
    let frame: Frame = data.try_into().map_err(|_| FrameError::Ignored)?;
    if frame[0] != CONFIG_REPORT_ID {
        return Err(FrameError::Ignored);
    }
    let stored = frame[FRAME_CHECKSUM_OFFSET];
    let computed = frame_checksum(&frame);
    if stored != computed {
        return Err(FrameError::Checksum { stored, computed });
    }
    Ok(frame)
}

/// A validated request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    frame: Frame,
}

impl Request {
    /// Validate length, report id and checksum, in that order.
    ///
    /// Nothing past byte 0 is interpreted before the checksum passes.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        validate(data).map(|frame| Self { frame })
    }

    /// Build a sealed request from a command byte and payload.
    ///
    /// Payload bytes beyond byte 62 are dropped.
    #[must_use]
    pub fn new(command: u8, payload: &[u8]) -> Self {
        let mut frame = [0u8; REPORT_LEN];
        frame[0] = CONFIG_REPORT_ID;
        frame[1] = command;
        let len = payload.len().min(FRAME_CHECKSUM_OFFSET - REQUEST_PAYLOAD_OFFSET);
        frame[REQUEST_PAYLOAD_OFFSET..REQUEST_PAYLOAD_OFFSET + len].copy_from_slice(&payload[..len]);
        frame[FRAME_CHECKSUM_OFFSET] = frame_checksum(&frame);
        Self { frame }
    }

    #[inline]
    #[must_use]
    pub fn command_byte(&self) -> u8 {
        self.frame[1]
    }

    #[inline]
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        Command::from_u8(self.frame[1])
    }

    /// Byte at an absolute frame offset.
    #[inline]
    #[must_use]
    pub fn byte(&self, offset: usize) -> u8 {
        self.frame[offset]
    }

    /// Bytes `offset..offset + N` as an array.
    #[must_use]
    pub fn array<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.frame[offset..offset + N]);
        out
    }

    #[must_use]
    pub fn as_bytes(&self) -> &Frame {
        &self.frame
    }
}

/// A response frame under construction.
///
/// The checksum is filled in by [`Response::to_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    frame: Frame,
}

impl Response {
    #[must_use]
    pub fn new(command: u8, status: Status) -> Self {
        let mut frame = [0u8; REPORT_LEN];
        frame[0] = CONFIG_REPORT_ID;
        frame[1] = command;
        frame[2] = status as u8;
        Self { frame }
    }

    /// Reply to a request whose checksum did not match.
    #[must_use]
    pub fn checksum_error() -> Self {
        Self::new(CHECKSUM_ERROR_COMMAND, Status::ChecksumError)
    }

    /// Parse a response received from the device.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        validate(data).map(|frame| Self { frame })
    }

    #[inline]
    #[must_use]
    pub fn command_byte(&self) -> u8 {
        self.frame[1]
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        Status::from_u8(self.frame[2])
    }

    /// Byte at an absolute frame offset.
    #[inline]
    #[must_use]
    pub fn byte(&self, offset: usize) -> u8 {
        self.frame[offset]
    }

    /// Payload bytes starting at an absolute frame offset.
    #[must_use]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.frame[offset..offset + len]
    }

    /// Write payload bytes at an absolute offset (3..=62).
    ///
    /// Bytes that would overlap the checksum are dropped.
    pub fn put(&mut self, offset: usize, data: &[u8]) -> &mut Self {
        let start = offset.clamp(RESPONSE_PAYLOAD_OFFSET, FRAME_CHECKSUM_OFFSET);
        let len = data.len().min(FRAME_CHECKSUM_OFFSET - start);
        self.frame[start..start + len].copy_from_slice(&data[..len]);
        self
    }

    /// Sealed wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Frame {
        let mut frame = self.frame;
        frame[FRAME_CHECKSUM_OFFSET] = frame_checksum(&frame);
        frame
    }
}
