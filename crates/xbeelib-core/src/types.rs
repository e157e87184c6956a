//! Shared packet and protocol types.
//!
//! These are the module-family-agnostic data carriers exchanged between
//! applications and the backend drivers: uplink/downlink packets for the
//! LR family and TCP/UDP packets for the Cellular family.

use std::net::Ipv4Addr;

/// Socket protocol selector for the Cellular family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// UDP datagrams (0x00).
    Udp,
    /// TCP stream (0x01).
    Tcp,
    /// TLS-wrapped TCP stream (0x04).
    Ssl,
}

impl Protocol {
    /// The protocol byte sent on the wire.
    pub const fn as_u8(self) -> u8 {
        match self {
            Protocol::Udp => 0x00,
            Protocol::Tcp => 0x01,
            Protocol::Ssl => 0x04,
        }
    }
}

/// LoRaWAN device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoRaClass {
    /// Class A -- two short RX windows after each uplink.
    A,
    /// Class B -- scheduled ping-slot RX windows.
    B,
    /// Class C -- continuous RX.
    C,
}

impl LoRaClass {
    /// The ASCII class byte sent on the wire.
    pub const fn as_u8(self) -> u8 {
        match self {
            LoRaClass::A => b'A',
            LoRaClass::B => b'B',
            LoRaClass::C => b'C',
        }
    }
}

/// A LoRaWAN uplink or downlink packet.
///
/// For transmit, fill in `payload`, `port`, and `ack`; the driver assigns
/// `frame_id` and reports the delivery outcome separately. The remaining
/// fields are populated on received downlinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrPacket {
    /// Application payload.
    pub payload: Vec<u8>,
    /// LoRaWAN application port (1-223).
    pub port: u8,
    /// Request a confirmed uplink.
    pub ack: bool,
    /// Frame ID assigned by the driver on transmit.
    pub frame_id: u8,
    /// Delivery status of the matching transmit (0 = delivered).
    pub status: u8,
    /// Downlink RSSI in dBm (negative).
    pub rssi: i8,
    /// Downlink SNR in dB.
    pub snr: i8,
    /// Downlink frame counter.
    pub counter: u32,
}

/// A Cellular TCP/UDP packet.
///
/// For stateless IPv4 transmit, fill in `protocol`, `ip`, `port`, and
/// `payload`. On socket receive, the driver populates `socket_id`,
/// `remote_port`, `status`, and the source address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellularPacket {
    /// Transport protocol.
    pub protocol: Protocol,
    /// Destination port (transmit) or local port (receive).
    pub port: u16,
    /// IPv4 address (destination or source).
    pub ip: Ipv4Addr,
    /// Application payload.
    pub payload: Vec<u8>,
    /// Frame ID assigned by the driver on transmit.
    pub frame_id: u8,
    /// Socket the data arrived on.
    pub socket_id: u8,
    /// Source port of an incoming datagram.
    pub remote_port: u16,
    /// Module-reported status byte on receive.
    pub status: u8,
}

impl Default for CellularPacket {
    fn default() -> Self {
        CellularPacket {
            protocol: Protocol::Udp,
            port: 0,
            ip: Ipv4Addr::UNSPECIFIED,
            payload: Vec::new(),
            frame_id: 0,
            socket_id: 0,
            remote_port: 0,
            status: 0,
        }
    }
}
