//! xbeelib-lr: XBee LR (LoRaWAN) backend.
//!
//! Provides [`XBeeLr`] and [`XBeeLrBuilder`] for driving Digi XBee LR
//! modules over the API-frame serial protocol: OTAA credential setup,
//! network join, confirmed/unconfirmed uplinks with delivery reports, and
//! downlink delivery through the event channel.
//!
//! # Example
//!
//! ```no_run
//! use xbeelib_core::{LoRaClass, LrPacket, XBee};
//! use xbeelib_lr::XBeeLrBuilder;
//!
//! # async fn example() -> xbeelib_core::Result<()> {
//! let mut xbee = XBeeLrBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .build()
//!     .await?;
//!
//! xbee.set_app_eui("9E1177BD6B1DF41E").await?;
//! xbee.set_app_key("CD32AAB41C54175E9060D86F3A8B7F48").await?;
//! xbee.set_nwk_key("CD32AAB41C54175E9060D86F3A8B7F48").await?;
//! xbee.set_class(LoRaClass::C).await?;
//! xbee.connect().await?;
//!
//! let packet = LrPacket {
//!     payload: vec![0xC0, 0xFF, 0xEE],
//!     port: 2,
//!     ..Default::default()
//! };
//! let status = xbee.send_packet(&packet).await?;
//! println!("delivery status: 0x{status:02X}");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod commands;
pub mod device;

pub use builder::XBeeLrBuilder;
pub use device::XBeeLr;
