//! Extended-Socket types: state machine, options, remote addressing.
//!
//! The Cellular family exposes a socket interface on top of the API-frame
//! protocol (the `0x4x` request / `0xCx` response opcodes). A socket handle
//! is an opaque 8-bit ID assigned by the module on create; it stays valid
//! until a close completes or the module resets.
//!
//! State transitions tracked by the driver:
//!
//! ```text
//!    Created ──connect──▶ Connecting ──status 0x00──▶ Connected
//!       │                      │                         │
//!       │bind                  │fail                     │send/send_to
//!       ▼                      ▼                         ▼
//!    Bound                  Closed                  (Connected)
//!
//!    any state ──close──▶ Closing ──status 0x01──▶ Closed
//! ```

use std::net::Ipv4Addr;

use xbeelib_core::types::Protocol;

/// Largest payload accepted by socket send and send-to requests.
pub const MAX_SOCKET_PAYLOAD: usize = 120;

/// Lifecycle state of one socket, as tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Created on the module; not yet bound or connected.
    Created,
    /// Bound to a local port (UDP listen).
    Bound,
    /// Connect request accepted; waiting for the final socket status.
    Connecting,
    /// Connected to the remote endpoint.
    Connected,
    /// Close request sent; waiting for the close confirmation.
    Closing,
    /// Closed on the module. The handle is no longer valid.
    Closed,
}

/// Socket option identifiers for the socket-option request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketOption {
    /// Bind the socket to a local port (0x00).
    BindPort,
    /// Put the socket into listening mode (0x01).
    Listen,
    /// Enable TCP keepalive (0x02).
    Keepalive,
}

impl SocketOption {
    /// The option byte sent on the wire.
    pub const fn as_u8(self) -> u8 {
        match self {
            SocketOption::BindPort => 0x00,
            SocketOption::Listen => 0x01,
            SocketOption::Keepalive => 0x02,
        }
    }
}

/// Remote endpoint address for a socket connect.
///
/// Hostnames are resolved by the modem itself over the carrier's DNS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAddr {
    /// A literal IPv4 address (address type 0x00 on the wire).
    Ipv4(Ipv4Addr),
    /// A hostname for modem-side DNS resolution (address type 0x01).
    Hostname(String),
}

impl From<Ipv4Addr> for RemoteAddr {
    fn from(ip: Ipv4Addr) -> Self {
        RemoteAddr::Ipv4(ip)
    }
}

impl From<&str> for RemoteAddr {
    fn from(host: &str) -> Self {
        RemoteAddr::Hostname(host.to_string())
    }
}

/// Driver-side record of one module socket.
#[derive(Debug, Clone)]
pub(crate) struct SocketInfo {
    pub protocol: Protocol,
    pub state: SocketState,
}
