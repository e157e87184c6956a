//! API-frame encoder and checksum routines.
//!
//! All traffic to and from an XBee module in API mode rides in a single
//! envelope:
//!
//! ```text
//! 0x7E <lenHi> <lenLo> <type> <payload ...> <checksum>
//! ```
//!
//! - Start delimiter: one `0x7E` byte
//! - `len`: big-endian count of the type byte plus the payload
//! - `type`: frame-type opcode (see [`FrameType`])
//! - `payload`: variable-length frame data
//! - `checksum`: `0xFF - (sum of type and payload bytes) mod 256`
//!
//! This module handles the pure byte-level encoding and checksum math.
//! Reading frames off a transport lives in [`crate::api`].

use bytes::{BufMut, BytesMut};

/// Start delimiter byte at the head of every API frame.
pub const START_DELIMITER: u8 = 0x7E;

/// Default maximum frame data size (type byte + payload) in bytes.
///
/// The bound is configurable per session; this default matches the largest
/// frame the supported module families emit in practice.
pub const DEFAULT_MAX_FRAME_DATA: u16 = 256;

/// Frame-type opcodes used by the LR and Cellular module families.
///
/// Unlisted opcodes decode as [`FrameType::Unknown`] and are logged and
/// skipped by the frame router rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// 0x08 -- AT command request.
    AtCommand,
    /// 0x20 -- transmit request (LR uplink / Cellular stateless IPv4).
    TransmitRequest,
    /// 0x40 -- socket create.
    SocketCreate,
    /// 0x42 -- socket connect.
    SocketConnect,
    /// 0x43 -- socket close.
    SocketClose,
    /// 0x44 -- socket send on a connected socket.
    SocketSend,
    /// 0x45 -- socket send-to (UDP datagram).
    SocketSendTo,
    /// 0x46 -- socket bind.
    SocketBind,
    /// 0x48 -- socket option.
    SocketOption,
    /// 0x88 -- AT command response.
    AtResponse,
    /// 0x8A -- modem status.
    ModemStatus,
    /// 0x8B -- transmit status.
    TransmitStatus,
    /// 0xA0 -- LR receive packet.
    LrRxPacket,
    /// 0xA1 -- LR explicit receive packet.
    LrExplicitRxPacket,
    /// 0xC0 -- socket create response.
    SocketCreateResponse,
    /// 0xC2 -- socket connect response.
    SocketConnectResponse,
    /// 0xC6 -- socket bind response.
    SocketBindResponse,
    /// 0xCD -- socket receive (connected socket).
    SocketRx,
    /// 0xCE -- socket receive-from (UDP datagram).
    SocketRxFrom,
    /// 0xCF -- socket status.
    SocketStatus,
    /// Any opcode not in the registry above.
    Unknown(u8),
}

impl FrameType {
    /// The opcode byte sent on the wire.
    pub const fn as_u8(self) -> u8 {
        match self {
            FrameType::AtCommand => 0x08,
            FrameType::TransmitRequest => 0x20,
            FrameType::SocketCreate => 0x40,
            FrameType::SocketConnect => 0x42,
            FrameType::SocketClose => 0x43,
            FrameType::SocketSend => 0x44,
            FrameType::SocketSendTo => 0x45,
            FrameType::SocketBind => 0x46,
            FrameType::SocketOption => 0x48,
            FrameType::AtResponse => 0x88,
            FrameType::ModemStatus => 0x8A,
            FrameType::TransmitStatus => 0x8B,
            FrameType::LrRxPacket => 0xA0,
            FrameType::LrExplicitRxPacket => 0xA1,
            FrameType::SocketCreateResponse => 0xC0,
            FrameType::SocketConnectResponse => 0xC2,
            FrameType::SocketBindResponse => 0xC6,
            FrameType::SocketRx => 0xCD,
            FrameType::SocketRxFrom => 0xCE,
            FrameType::SocketStatus => 0xCF,
            FrameType::Unknown(b) => b,
        }
    }
}

impl From<u8> for FrameType {
    fn from(b: u8) -> Self {
        match b {
            0x08 => FrameType::AtCommand,
            0x20 => FrameType::TransmitRequest,
            0x40 => FrameType::SocketCreate,
            0x42 => FrameType::SocketConnect,
            0x43 => FrameType::SocketClose,
            0x44 => FrameType::SocketSend,
            0x45 => FrameType::SocketSendTo,
            0x46 => FrameType::SocketBind,
            0x48 => FrameType::SocketOption,
            0x88 => FrameType::AtResponse,
            0x8A => FrameType::ModemStatus,
            0x8B => FrameType::TransmitStatus,
            0xA0 => FrameType::LrRxPacket,
            0xA1 => FrameType::LrExplicitRxPacket,
            0xC0 => FrameType::SocketCreateResponse,
            0xC2 => FrameType::SocketConnectResponse,
            0xC6 => FrameType::SocketBindResponse,
            0xCD => FrameType::SocketRx,
            0xCE => FrameType::SocketRxFrom,
            0xCF => FrameType::SocketStatus,
            other => FrameType::Unknown(other),
        }
    }
}

/// A decoded API frame.
///
/// `payload` holds the frame data *after* the type byte; the wire-level
/// length field therefore equals `payload.len() + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFrame {
    /// Frame-type opcode.
    pub frame_type: FrameType,
    /// Frame data, excluding the type byte.
    pub payload: Vec<u8>,
}

impl ApiFrame {
    /// Construct a frame from its parts.
    pub fn new(frame_type: FrameType, payload: impl Into<Vec<u8>>) -> Self {
        ApiFrame {
            frame_type,
            payload: payload.into(),
        }
    }
}

/// Compute the checksum for a frame's type byte and payload.
///
/// # Example
///
/// ```
/// use xbeelib_core::frame::checksum;
///
/// // ATVR response: type 0x88, payload [frame id, 'V', 'R', status, data...]
/// let cs = checksum(0x88, &[0x01, b'V', b'R', 0x00, 0x12, 0x00, 0x00]);
/// assert_eq!(cs, 0xBC);
/// ```
pub fn checksum(frame_type: u8, payload: &[u8]) -> u8 {
    let sum = payload
        .iter()
        .fold(frame_type as u32, |acc, &b| acc + b as u32);
    0xFF - (sum & 0xFF) as u8
}

/// Verify a received checksum byte against the type and payload it covers.
///
/// A frame is intact when the sum of every covered byte plus the checksum
/// equals `0xFF` modulo 256.
pub fn verify_checksum(frame_type: u8, payload: &[u8], received: u8) -> bool {
    let sum = payload
        .iter()
        .fold(frame_type as u32 + received as u32, |acc, &b| acc + b as u32);
    (sum & 0xFF) as u8 == 0xFF
}

/// Encode a frame into the raw bytes sent on the wire.
///
/// Produces the full envelope including delimiter, length, and checksum.
///
/// # Example
///
/// ```
/// use xbeelib_core::frame::{encode_frame, FrameType};
///
/// let bytes = encode_frame(FrameType::AtCommand, &[0x01, b'V', b'R']);
/// assert_eq!(bytes, vec![0x7E, 0x00, 0x04, 0x08, 0x01, b'V', b'R', 0x4E]);
/// ```
pub fn encode_frame(frame_type: FrameType, payload: &[u8]) -> Vec<u8> {
    let type_byte = frame_type.as_u8();
    let len = (payload.len() + 1) as u16;
    let mut buf = BytesMut::with_capacity(4 + payload.len() + 1);
    buf.put_u8(START_DELIMITER);
    buf.put_u16(len);
    buf.put_u8(type_byte);
    buf.put_slice(payload);
    buf.put_u8(checksum(type_byte, payload));
    buf.to_vec()
}
