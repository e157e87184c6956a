//! Cellular frame payload builders and response parsers.
//!
//! All functions are pure -- they produce or consume byte vectors without
//! performing any I/O. The device layer sends the bytes through the
//! session and feeds received payloads back into the parsers.

use std::net::Ipv4Addr;

use xbeelib_core::error::{Error, Result};
use xbeelib_core::types::{CellularPacket, Protocol};

use crate::socket::{RemoteAddr, SocketOption, MAX_SOCKET_PAYLOAD};

/// Minimum socket-receive payload: frame ID, socket ID, status.
const RX_HEADER_LEN: usize = 3;

/// Minimum receive-from payload: header plus IPv4 address and port.
const RX_FROM_HEADER_LEN: usize = 9;

/// Build the stateless IPv4 transmit payload.
///
/// Layout: `[frame id, protocol, port(2), ip(4), payload...]`.
pub fn encode_ipv4_transmit(frame_id: u8, packet: &CellularPacket) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + packet.payload.len());
    data.push(frame_id);
    data.push(packet.protocol.as_u8());
    data.extend_from_slice(&packet.port.to_be_bytes());
    data.extend_from_slice(&packet.ip.octets());
    data.extend_from_slice(&packet.payload);
    data
}

/// Build a socket-create payload: `[frame id, protocol]`.
pub fn encode_socket_create(frame_id: u8, protocol: Protocol) -> Vec<u8> {
    vec![frame_id, protocol.as_u8()]
}

/// Build a socket-connect payload.
///
/// Layout: `[frame id, socket id, port(2), addr type, addr...]` where the
/// address is 4 octets for IPv4 (type 0x00) or the hostname bytes
/// (type 0x01, terminated by the frame end).
pub fn encode_socket_connect(
    frame_id: u8,
    socket_id: u8,
    port: u16,
    addr: &RemoteAddr,
) -> Vec<u8> {
    let mut data = vec![frame_id, socket_id];
    data.extend_from_slice(&port.to_be_bytes());
    match addr {
        RemoteAddr::Ipv4(ip) => {
            data.push(0x00);
            data.extend_from_slice(&ip.octets());
        }
        RemoteAddr::Hostname(host) => {
            data.push(0x01);
            data.extend_from_slice(host.as_bytes());
        }
    }
    data
}

/// Build a socket-bind payload: `[frame id, socket id, port(2)]`.
pub fn encode_socket_bind(frame_id: u8, socket_id: u8, port: u16) -> Vec<u8> {
    let mut data = vec![frame_id, socket_id];
    data.extend_from_slice(&port.to_be_bytes());
    data
}

/// Build a socket-send payload: `[frame id, socket id, options, payload...]`.
///
/// The payload must be 1 to [`MAX_SOCKET_PAYLOAD`] bytes.
pub fn encode_socket_send(frame_id: u8, socket_id: u8, payload: &[u8]) -> Result<Vec<u8>> {
    check_socket_payload(payload)?;
    let mut data = Vec::with_capacity(3 + payload.len());
    data.push(frame_id);
    data.push(socket_id);
    data.push(0x00); // transmit options
    data.extend_from_slice(payload);
    Ok(data)
}

/// Build a socket-send-to payload:
/// `[frame id, socket id, ip(4), port(2), options, payload...]`.
///
/// The payload must be 1 to [`MAX_SOCKET_PAYLOAD`] bytes.
pub fn encode_socket_send_to(
    frame_id: u8,
    socket_id: u8,
    ip: Ipv4Addr,
    port: u16,
    payload: &[u8],
) -> Result<Vec<u8>> {
    check_socket_payload(payload)?;
    let mut data = Vec::with_capacity(9 + payload.len());
    data.push(frame_id);
    data.push(socket_id);
    data.extend_from_slice(&ip.octets());
    data.extend_from_slice(&port.to_be_bytes());
    data.push(0x00); // transmit options
    data.extend_from_slice(payload);
    Ok(data)
}

/// Build a socket-option payload: `[frame id, socket id, option, value...]`.
pub fn encode_socket_option(
    frame_id: u8,
    socket_id: u8,
    option: SocketOption,
    value: &[u8],
) -> Result<Vec<u8>> {
    if value.is_empty() {
        return Err(Error::InvalidParameter("socket option value is empty".into()));
    }
    let mut data = Vec::with_capacity(3 + value.len());
    data.push(frame_id);
    data.push(socket_id);
    data.push(option.as_u8());
    data.extend_from_slice(value);
    Ok(data)
}

/// Build a socket-close payload: `[frame id, socket id]`.
pub fn encode_socket_close(frame_id: u8, socket_id: u8) -> Vec<u8> {
    vec![frame_id, socket_id]
}

/// Parse a socket response payload into `(frame id, socket id, status)`.
///
/// This shape is shared by the create (0xC0), connect (0xC2), and bind
/// (0xC6) responses, and by the socket-status frame (0xCF), where the
/// frame ID is zero for unsolicited reports.
pub fn parse_socket_response(payload: &[u8]) -> Result<(u8, u8, u8)> {
    match payload {
        [frame_id, socket_id, status, ..] => Ok((*frame_id, *socket_id, *status)),
        _ => Err(Error::Protocol(format!(
            "socket response of {} bytes",
            payload.len()
        ))),
    }
}

/// Parse a connected-socket receive payload (0xCD).
///
/// Layout: `[frame id, socket id, status, payload...]`.
pub fn parse_socket_rx(payload: &[u8]) -> Result<CellularPacket> {
    if payload.len() < RX_HEADER_LEN {
        return Err(Error::Protocol(format!(
            "socket receive of {} bytes, need at least {RX_HEADER_LEN}",
            payload.len()
        )));
    }

    Ok(CellularPacket {
        frame_id: payload[0],
        socket_id: payload[1],
        status: payload[2],
        payload: payload[RX_HEADER_LEN..].to_vec(),
        ..Default::default()
    })
}

/// Parse a receive-from payload (0xCE).
///
/// Layout: `[frame id, socket id, status, ip(4), port(2), payload...]`.
pub fn parse_socket_rx_from(payload: &[u8]) -> Result<CellularPacket> {
    if payload.len() < RX_FROM_HEADER_LEN {
        return Err(Error::Protocol(format!(
            "socket receive-from of {} bytes, need at least {RX_FROM_HEADER_LEN}",
            payload.len()
        )));
    }

    let remote_port = u16::from_be_bytes([payload[7], payload[8]]);
    Ok(CellularPacket {
        frame_id: payload[0],
        socket_id: payload[1],
        status: payload[2],
        ip: Ipv4Addr::new(payload[3], payload[4], payload[5], payload[6]),
        remote_port,
        port: remote_port,
        payload: payload[RX_FROM_HEADER_LEN..].to_vec(),
        ..Default::default()
    })
}

fn check_socket_payload(payload: &[u8]) -> Result<()> {
    if payload.is_empty() || payload.len() > MAX_SOCKET_PAYLOAD {
        return Err(Error::InvalidParameter(format!(
            "socket payload of {} bytes, expected 1 to {MAX_SOCKET_PAYLOAD}",
            payload.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_transmit_layout() {
        let packet = CellularPacket {
            protocol: Protocol::Tcp,
            port: 80,
            ip: Ipv4Addr::new(1, 2, 3, 4),
            payload: vec![0xAA, 0xBB],
            ..Default::default()
        };
        let data = encode_ipv4_transmit(5, &packet);
        assert_eq!(
            data,
            vec![0x05, 0x01, 0x00, 0x50, 0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB]
        );
    }

    #[test]
    fn socket_create_layout() {
        assert_eq!(encode_socket_create(7, Protocol::Udp), vec![0x07, 0x00]);
        assert_eq!(encode_socket_create(8, Protocol::Ssl), vec![0x08, 0x04]);
    }

    #[test]
    fn socket_connect_ipv4_layout() {
        let data = encode_socket_connect(
            3,
            1,
            8080,
            &RemoteAddr::Ipv4(Ipv4Addr::new(192, 168, 1, 10)),
        );
        assert_eq!(
            data,
            vec![0x03, 0x01, 0x1F, 0x90, 0x00, 192, 168, 1, 10]
        );
    }

    #[test]
    fn socket_connect_hostname_layout() {
        let data = encode_socket_connect(3, 1, 443, &RemoteAddr::Hostname("digi.com".into()));
        let mut expected = vec![0x03, 0x01, 0x01, 0xBB, 0x01];
        expected.extend_from_slice(b"digi.com");
        assert_eq!(data, expected);
    }

    #[test]
    fn socket_bind_layout() {
        assert_eq!(encode_socket_bind(2, 9, 0x1234), vec![0x02, 0x09, 0x12, 0x34]);
    }

    #[test]
    fn socket_send_layout() {
        let data = encode_socket_send(4, 2, &[0xDE, 0xAD]).unwrap();
        assert_eq!(data, vec![0x04, 0x02, 0x00, 0xDE, 0xAD]);
    }

    #[test]
    fn socket_send_rejects_oversize_payload() {
        let payload = vec![0u8; MAX_SOCKET_PAYLOAD + 1];
        assert!(matches!(
            encode_socket_send(1, 1, &payload),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            encode_socket_send(1, 1, &[]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn socket_send_accepts_max_payload() {
        let payload = vec![0x55; MAX_SOCKET_PAYLOAD];
        let data = encode_socket_send(1, 1, &payload).unwrap();
        assert_eq!(data.len(), 3 + MAX_SOCKET_PAYLOAD);
    }

    #[test]
    fn socket_send_to_layout() {
        let data =
            encode_socket_send_to(6, 3, Ipv4Addr::new(10, 0, 0, 1), 10001, &[0x42]).unwrap();
        assert_eq!(
            data,
            vec![0x06, 0x03, 10, 0, 0, 1, 0x27, 0x11, 0x00, 0x42]
        );
    }

    #[test]
    fn socket_option_layout() {
        let data = encode_socket_option(2, 1, SocketOption::Listen, &[0x01]).unwrap();
        assert_eq!(data, vec![0x02, 0x01, 0x01, 0x01]);
    }

    #[test]
    fn socket_option_rejects_empty_value() {
        assert!(matches!(
            encode_socket_option(2, 1, SocketOption::BindPort, &[]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn socket_response_triple() {
        assert_eq!(parse_socket_response(&[1, 2, 0]).unwrap(), (1, 2, 0));
        assert_eq!(
            parse_socket_response(&[0, 7, 1, 0xFF]).unwrap(),
            (0, 7, 1)
        );
        assert!(parse_socket_response(&[1, 2]).is_err());
    }

    #[test]
    fn socket_rx_layout() {
        let packet = parse_socket_rx(&[0x00, 0x02, 0x00, 0x68, 0x69]).unwrap();
        assert_eq!(packet.socket_id, 2);
        assert_eq!(packet.status, 0);
        assert_eq!(packet.payload, b"hi".to_vec());
        assert_eq!(packet.remote_port, 0);
    }

    #[test]
    fn socket_rx_rejects_runt() {
        assert!(parse_socket_rx(&[0x00, 0x02]).is_err());
    }

    #[test]
    fn socket_rx_from_layout() {
        let payload = [0x00, 0x03, 0x00, 52, 43, 121, 77, 0x27, 0x11, 0xCA, 0xFE];
        let packet = parse_socket_rx_from(&payload).unwrap();
        assert_eq!(packet.socket_id, 3);
        assert_eq!(packet.ip, Ipv4Addr::new(52, 43, 121, 77));
        assert_eq!(packet.remote_port, 10001);
        assert_eq!(packet.port, 10001);
        assert_eq!(packet.payload, vec![0xCA, 0xFE]);
    }

    #[test]
    fn socket_rx_from_rejects_runt() {
        assert!(parse_socket_rx_from(&[0x00, 0x03, 0x00, 52, 43, 121, 77, 0x27]).is_err());
    }
}
