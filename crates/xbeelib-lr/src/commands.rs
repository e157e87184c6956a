//! LR frame payload builders and response parsers.
//!
//! All functions are pure -- they produce or consume byte vectors without
//! performing any I/O. The device layer is responsible for sending the
//! bytes through the session and feeding received payloads back in.

use xbeelib_core::error::{Error, Result};
use xbeelib_core::types::LrPacket;

/// Minimum receive-packet payload: port, RSSI, SNR, 4-byte counter.
const RX_HEADER_LEN: usize = 7;

/// Build the transmit-request payload for an uplink.
///
/// Layout: `[frame id, port, ack flag, payload...]`.
pub fn encode_transmit_request(frame_id: u8, packet: &LrPacket) -> Vec<u8> {
    let mut data = Vec::with_capacity(3 + packet.payload.len());
    data.push(frame_id);
    data.push(packet.port);
    data.push(packet.ack as u8);
    data.extend_from_slice(&packet.payload);
    data
}

/// Parse a transmit-status payload into `(frame id, delivery status)`.
///
/// Layout: `[frame id, delivery status, ...]`; trailing bytes are ignored.
pub fn parse_transmit_status(payload: &[u8]) -> Result<(u8, u8)> {
    match payload {
        [frame_id, status, ..] => Ok((*frame_id, *status)),
        _ => Err(Error::Protocol(format!(
            "transmit status of {} bytes",
            payload.len()
        ))),
    }
}

/// Parse a receive-packet payload into a downlink [`LrPacket`].
///
/// Layout: `[port, rssi, snr, counter(4, big-endian), payload...]`. The
/// module reports RSSI as a positive offset; it is negated here into
/// signed dBm. SNR arrives as a signed byte.
pub fn parse_rx_packet(payload: &[u8]) -> Result<LrPacket> {
    if payload.len() < RX_HEADER_LEN {
        return Err(Error::Protocol(format!(
            "receive packet of {} bytes, need at least {RX_HEADER_LEN}",
            payload.len()
        )));
    }

    Ok(LrPacket {
        port: payload[0],
        rssi: -(payload[1] as i8),
        snr: payload[2] as i8,
        counter: u32::from_be_bytes([payload[3], payload[4], payload[5], payload[6]]),
        payload: payload[RX_HEADER_LEN..].to_vec(),
        ack: false,
        frame_id: 0,
        status: 0,
    })
}
