//! Transport trait for module communication.
//!
//! The [`Transport`] trait abstracts over the physical link to an XBee
//! module. Implementations exist for serial UARTs (the normal case) and
//! mock transports for testing.
//!
//! Protocol code (the API-frame machinery in [`crate::api`]) operates on a
//! `Transport` rather than directly on a serial port, enabling both real
//! hardware control and deterministic unit testing with `MockTransport`
//! from the `xbeelib-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Default window for a single bounded read from the module.
pub const UART_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Asynchronous byte-level transport to an XBee module.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. Framing and checksum validation are handled by the API-frame
/// reader that consumes this trait.
#[async_trait]
pub trait Transport: Send {
    /// Send raw bytes to the module.
    ///
    /// Implementations should not return until all bytes have been handed
    /// to the underlying link (serial TX buffer, pipe, etc.).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the module into the provided buffer.
    ///
    /// Returns the number of bytes actually read, which may be fewer than
    /// `buf.len()`. Waits up to `timeout` for data to arrive; returns
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing is
    /// received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard any bytes already buffered on the receive side.
    ///
    /// Used before mode changes where stale, half-received frames would
    /// confuse the reader. May be a no-op.
    async fn flush_rx(&mut self) -> Result<()>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
