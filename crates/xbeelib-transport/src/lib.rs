//! xbeelib-transport: Serial transport implementation for xbeelib.
//!
//! This crate provides [`SerialTransport`], the UART link every XBee
//! module ships with. The protocol machinery in `xbeelib-core` consumes it
//! through the [`Transport`](xbeelib_core::Transport) trait, so tests can
//! substitute `MockTransport` from `xbeelib-test-harness`.

pub mod serial;

pub use serial::SerialTransport;
