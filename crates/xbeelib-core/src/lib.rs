//! xbeelib-core: Core traits, types, and error definitions for xbeelib.
//!
//! This crate defines the module-family-agnostic abstractions that all
//! xbeelib backends build on. Applications depend on these types without
//! pulling in a specific modem driver.
//!
//! # Key types
//!
//! - [`XBee`] -- the unified trait for controlling any XBee module
//! - [`Transport`] -- byte-level communication channel
//! - [`ApiSession`] -- API-frame I/O, request/response correlation
//! - [`XBeeEvent`] -- unsolicited traffic notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod api;
pub mod at;
pub mod device;
pub mod error;
pub mod events;
pub mod frame;
pub mod hex;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use xbeelib_core::*`.
pub use api::ApiSession;
pub use at::AtCommand;
pub use device::XBee;
pub use error::{Error, Result};
pub use events::XBeeEvent;
pub use frame::{ApiFrame, FrameType, DEFAULT_MAX_FRAME_DATA};
pub use hex::{bytes_to_hex, hex_to_bytes};
pub use transport::Transport;
pub use types::*;
