//! xbeelib-cellular: XBee 3 Cellular (LTE/NB-IoT) backend.
//!
//! Provides [`XBeeCellular`] and [`XBeeCellularBuilder`] for driving Digi
//! XBee 3 Cellular modems over the API-frame serial protocol: APN/SIM
//! configuration, LTE network attach, stateless IPv4 transmits, and the
//! Extended-Socket family (create/bind/connect/send/send-to/close) with
//! per-socket state tracking.
//!
//! # Example
//!
//! ```no_run
//! use xbeelib_cellular::{CellularConfig, XBeeCellularBuilder};
//! use xbeelib_core::{Protocol, XBee};
//!
//! # async fn example() -> xbeelib_core::Result<()> {
//! let mut xbee = XBeeCellularBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .config(CellularConfig {
//!         apn: "hologram".into(),
//!         ..Default::default()
//!     })
//!     .build()
//!     .await?;
//!
//! xbee.connect().await?;
//!
//! let socket = xbee.socket_create(Protocol::Udp).await?;
//! xbee.socket_bind(socket, 0x1234, true).await?;
//! xbee.socket_send_to(socket, [52, 43, 121, 77].into(), 10001, b"hello").await?;
//! xbee.socket_close(socket, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod commands;
pub mod device;
pub mod socket;

pub use builder::XBeeCellularBuilder;
pub use device::{CellularConfig, XBeeCellular};
pub use socket::{RemoteAddr, SocketOption, SocketState};
