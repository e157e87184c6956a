//! Unsolicited-traffic event types.
//!
//! Events are emitted by backend drivers through a [`tokio::sync::broadcast`]
//! channel whenever the module delivers something the application did not
//! explicitly ask for: downlinks, socket data, delivery reports, and modem
//! state changes. Applications subscribe via
//! [`XBee::subscribe`](crate::device::XBee::subscribe); a driver with no
//! subscribers simply drops the events.

use crate::types::{CellularPacket, LrPacket};

/// An event emitted by a backend driver.
///
/// Events are delivered on a best-effort basis through a bounded broadcast
/// channel; slow consumers may miss events under heavy downlink load.
#[derive(Debug, Clone)]
pub enum XBeeEvent {
    /// A LoRaWAN downlink arrived.
    LrPacketReceived(LrPacket),

    /// Data arrived on a Cellular socket.
    CellularPacketReceived(CellularPacket),

    /// The module reported the outcome of an earlier transmit request.
    TransmitStatus {
        /// Frame ID of the transmit the report refers to.
        frame_id: u8,
        /// Delivery status byte (0 = delivered).
        status: u8,
    },

    /// The module emitted a modem-status frame.
    ModemStatus(u8),

    /// A socket changed state on the module.
    SocketStatus {
        /// Socket the status refers to.
        socket_id: u8,
        /// Module-reported status byte (0 = connected, 1 = closed).
        status: u8,
    },

    /// The module attached to the network (LTE registration or LoRaWAN join).
    Connected,

    /// The module detached from the network.
    Disconnected,
}
