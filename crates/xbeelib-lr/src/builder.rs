//! XBeeLrBuilder -- fluent builder for constructing [`XBeeLr`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial parameters and timeout values before the transport is opened.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use xbeelib_lr::XBeeLrBuilder;
//!
//! # async fn example() -> xbeelib_core::Result<()> {
//! let xbee = XBeeLrBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(9600)
//!     .attach_timeout(Duration::from_secs(120))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use xbeelib_core::api::{ApiSession, DEFAULT_AT_TIMEOUT};
use xbeelib_core::error::{Error, Result};
use xbeelib_core::frame::DEFAULT_MAX_FRAME_DATA;
use xbeelib_core::transport::{Transport, UART_READ_TIMEOUT};

use crate::device::XBeeLr;

/// Fluent builder for [`XBeeLr`].
///
/// All settings have defaults matching a factory-default module, so the
/// simplest usage is `XBeeLrBuilder::new().serial_port("...").build()`.
pub struct XBeeLrBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    max_frame_data: u16,
    read_timeout: Duration,
    command_timeout: Duration,
    attach_timeout: Duration,
    tx_status_timeout: Duration,
}

impl XBeeLrBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        XBeeLrBuilder {
            serial_port: None,
            baud_rate: 9600,
            max_frame_data: DEFAULT_MAX_FRAME_DATA,
            read_timeout: UART_READ_TIMEOUT,
            command_timeout: DEFAULT_AT_TIMEOUT,
            attach_timeout: Duration::from_secs(60),
            tx_status_timeout: Duration::from_secs(10),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default 9600 baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Override the maximum frame data size (type byte + payload).
    pub fn max_frame_data(mut self, max: u16) -> Self {
        self.max_frame_data = max;
        self
    }

    /// Override the per-read UART timeout window (default: 1 s).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the window for a single AT command/response exchange
    /// (default: 5 s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set how long [`connect`](xbeelib_core::XBee::connect) waits for the
    /// OTAA join to complete (default: 60 s).
    pub fn attach_timeout(mut self, timeout: Duration) -> Self {
        self.attach_timeout = timeout;
        self
    }

    /// Set how long a transmit waits for its delivery report
    /// (default: 10 s).
    pub fn tx_status_timeout(mut self, timeout: Duration) -> Self {
        self.tx_status_timeout = timeout;
        self
    }

    /// Build an [`XBeeLr`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a `MockTransport`
    /// from `xbeelib-test-harness`) and for advanced use cases where the
    /// caller manages the transport lifecycle directly.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> XBeeLr {
        let mut session = ApiSession::new(transport);
        session.set_max_frame_data(self.max_frame_data);
        session.set_read_timeout(self.read_timeout);
        XBeeLr::new(
            session,
            self.command_timeout,
            self.attach_timeout,
            self.tx_status_timeout,
        )
    }

    /// Build an [`XBeeLr`] using a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<XBeeLr> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = xbeelib_transport::SerialTransport::open(port, self.baud_rate).await?;
        Ok(self.build_with_transport(Box::new(transport)))
    }
}

impl Default for XBeeLrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbeelib_core::XBee;
    use xbeelib_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_defaults_produce_working_device() {
        let mut dev = XBeeLrBuilder::new().build_with_transport(Box::new(MockTransport::new()));
        assert!(dev.session().is_connected());
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = XBeeLrBuilder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_fluent_chain() {
        let mut dev = XBeeLrBuilder::new()
            .baud_rate(115_200)
            .max_frame_data(128)
            .read_timeout(Duration::from_millis(250))
            .command_timeout(Duration::from_secs(2))
            .attach_timeout(Duration::from_secs(30))
            .tx_status_timeout(Duration::from_secs(5))
            .build_with_transport(Box::new(MockTransport::new()));

        // The frame bound is carried into the session.
        let err = dev
            .session()
            .send_frame(xbeelib_core::FrameType::TransmitRequest, &[0u8; 128])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { max: 128, .. }));
    }
}
