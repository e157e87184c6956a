//! # xbeelib -- Digi XBee module control for Rust
//!
//! `xbeelib` is an asynchronous Rust library for driving Digi XBee LR
//! (LoRaWAN) and XBee 3 Cellular (LTE/NB-IoT) modules over their binary
//! API-frame serial protocol. It is designed for gateways, sensor hubs,
//! and field equipment where a host processor owns the radio over a UART.
//!
//! ## Quick Start
//!
//! Add `xbeelib` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! xbeelib = { version = "0.1", features = ["lr"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Join a LoRaWAN network and send an uplink:
//!
//! ```no_run
//! use xbeelib::{LrPacket, XBee};
//! use xbeelib::lr::XBeeLrBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut xbee = XBeeLrBuilder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     xbee.set_app_eui("9E1177BD6B1DF41E").await?;
//!     xbee.set_app_key("CD32AAB41C54175E9060D86F3A8B7F48").await?;
//!     xbee.connect().await?;
//!
//!     let packet = LrPacket {
//!         payload: vec![0xC0, 0xFF, 0xEE],
//!         port: 2,
//!         ..Default::default()
//!     };
//!     let status = xbee.send_packet(&packet).await?;
//!     println!("delivery status: 0x{status:02X}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                  | Purpose                                         |
//! |------------------------|-------------------------------------------------|
//! | `xbeelib-core`         | Traits ([`XBee`], [`Transport`]), frame codec, AT correlator, errors |
//! | `xbeelib-transport`    | Serial transport implementation                 |
//! | `xbeelib-lr`           | XBee LR (LoRaWAN) backend                       |
//! | `xbeelib-cellular`     | XBee 3 Cellular backend with Extended Sockets   |
//! | `xbeelib-test-harness` | Mock transport for protocol tests               |
//! | **`xbeelib`**          | This facade crate -- re-exports everything      |
//!
//! Both backends implement the [`XBee`] trait, so application code can work
//! with `dyn XBee` for lifecycle and housekeeping and remain family-agnostic.
//!
//! ## Feature Flags
//!
//! | Feature    | Enables                              | Default |
//! |------------|--------------------------------------|---------|
//! | `lr`       | [`lr`] module (LoRaWAN backend)      | yes     |
//! | `cellular` | [`cellular`] module (LTE backend)    | yes     |
//! | `full`     | All backends                         | no      |
//!
//! ## Events
//!
//! Unsolicited traffic -- downlinks, socket data, delivery reports, modem
//! status -- arrives through a broadcast channel. Subscribe and keep
//! calling [`process`](XBee::process) from your main loop:
//!
//! ```no_run
//! use xbeelib::{XBee, XBeeEvent};
//! # async fn example(xbee: &mut dyn XBee) -> xbeelib::Result<()> {
//! let mut events = xbee.subscribe();
//! loop {
//!     xbee.process().await?;
//!     while let Ok(event) = events.try_recv() {
//!         match event {
//!             XBeeEvent::LrPacketReceived(packet) => {
//!                 println!("downlink on port {}: {:?}", packet.port, packet.payload);
//!             }
//!             other => println!("{other:?}"),
//!         }
//!     }
//! }
//! # }
//! ```

pub use xbeelib_core::*;

/// Serial transport implementation.
pub mod transport {
    pub use xbeelib_transport::*;
}

/// XBee LR (LoRaWAN) backend.
///
/// Provides [`XBeeLr`](lr::XBeeLr) and [`XBeeLrBuilder`](lr::XBeeLrBuilder)
/// for OTAA credential setup, network join, confirmed uplinks, and
/// downlink delivery.
#[cfg(feature = "lr")]
pub mod lr {
    pub use xbeelib_lr::*;
}

/// XBee 3 Cellular backend.
///
/// Provides [`XBeeCellular`](cellular::XBeeCellular) and
/// [`XBeeCellularBuilder`](cellular::XBeeCellularBuilder) for LTE attach,
/// stateless IPv4 transmits, and the Extended-Socket operations.
#[cfg(feature = "cellular")]
pub mod cellular {
    pub use xbeelib_cellular::*;
}
