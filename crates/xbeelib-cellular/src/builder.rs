//! XBeeCellularBuilder -- fluent builder for constructing [`XBeeCellular`]
//! instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial parameters, timeouts, and the APN/SIM/carrier profile before the
//! transport is opened.
//!
//! # Example
//!
//! ```no_run
//! use xbeelib_cellular::{CellularConfig, XBeeCellularBuilder};
//!
//! # async fn example() -> xbeelib_core::Result<()> {
//! let xbee = XBeeCellularBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .config(CellularConfig {
//!         apn: "hologram".into(),
//!         ..Default::default()
//!     })
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

use crate::device::{CellularConfig, XBeeCellular};

/// Fluent builder for [`XBeeCellular`].
///
/// All settings have defaults matching a factory-default module, so the
/// simplest usage is `XBeeCellularBuilder::new().serial_port("...").build()`.
pub struct XBeeCellularBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    max_frame_data: u16,
    read_timeout: Duration,
    command_timeout: Duration,
    config: CellularConfig,
}

impl XBeeCellularBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        XBeeCellularBuilder {
            serial_port: None,
            baud_rate: 9600,
            max_frame_data: DEFAULT_MAX_FRAME_DATA,
            read_timeout: UART_READ_TIMEOUT,
            command_timeout: DEFAULT_AT_TIMEOUT,
            config: CellularConfig::default(),
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

    /// Set the APN/SIM/carrier configuration pushed on connect.
    ///
    /// Can also be changed later with
    /// [`XBeeCellular::configure`](crate::device::XBeeCellular::configure).
    pub fn config(mut self, config: CellularConfig) -> Self {
        self.config = config;
        self
    }

    /// Build an [`XBeeCellular`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a `MockTransport`
    /// from `xbeelib-test-harness`) and for advanced use cases where the
    /// caller manages the transport lifecycle directly.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> XBeeCellular {
        let mut session = ApiSession::new(transport);
        session.set_max_frame_data(self.max_frame_data);
        session.set_read_timeout(self.read_timeout);
        XBeeCellular::new(session, self.command_timeout, self.config)
    }

    /// Build an [`XBeeCellular`] using a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<XBeeCellular> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = xbeelib_transport::SerialTransport::open(port, self.baud_rate).await?;
        Ok(self.build_with_transport(Box::new(transport)))
    }
}

impl Default for XBeeCellularBuilder {
    fn default() -> Self {
        Self::new()
    }
}
