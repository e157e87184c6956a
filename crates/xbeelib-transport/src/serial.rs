//! UART transport for XBee modules.
//!
//! [`SerialTransport`] implements the [`Transport`] trait for the DIN/DOUT
//! serial interface every XBee module exposes, whether wired to a host
//! UART directly or through a USB adapter presenting a virtual COM port.
//!
//! The module's UART format is fixed at 8 data bits, no parity, 1 stop
//! bit, so the only line parameters a caller chooses are the baud rate
//! (factory default 9600, `ATBD` to change) and whether the module's
//! CTS/RTS pins are wired for hardware flow control (`ATD7`/`ATD6`).
//! [`open`](SerialTransport::open) covers the common three-wire hookup;
//! use [`open_with_flow_control`](SerialTransport::open_with_flow_control)
//! when CTS/RTS are connected.
//!
//! Framing, checksums, and timeout-bounded frame reads live above this
//! layer in `xbeelib-core`; this type only moves bytes.
//!
//! # Example
//!
//! ```no_run
//! use xbeelib_transport::SerialTransport;
//! use xbeelib_core::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> xbeelib_core::Result<()> {
//! let mut uart = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! // One ATVR request frame out, response bytes in.
//! uart.send(&[0x7E, 0x00, 0x04, 0x08, 0x01, 0x56, 0x52, 0x4E]).await?;
//! let mut buf = [0u8; 256];
//! let n = uart.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, trace, warn};

use xbeelib_core::error::{Error, Result};
use xbeelib_core::transport::Transport;

/// UART link to an XBee module.
///
/// Holds the open port until [`close`](Transport::close) is called or the
/// transport is dropped; after close, every operation reports
/// [`Error::NotConnected`].
pub struct SerialTransport {
    /// Open port, or `None` once closed.
    port: Option<SerialStream>,
    /// Device path, kept for log context.
    path: String,
}

impl SerialTransport {
    /// Open the module's UART with the three-wire hookup (no flow control).
    ///
    /// `path` is the serial device (e.g. `/dev/ttyUSB0` on Linux, `COM3`
    /// on Windows); `baud` must match the module's `BD` setting, 9600 on a
    /// factory-default module.
    pub async fn open(path: &str, baud: u32) -> Result<Self> {
        Self::open_inner(path, baud, tokio_serial::FlowControl::None).await
    }

    /// Open the module's UART with hardware CTS/RTS flow control.
    ///
    /// Use this when the module's CTS (DIO7) and RTS (DIO6) pins are wired
    /// to the host and enabled; it keeps the module from overrunning its
    /// serial buffer during large API frames at high baud rates.
    pub async fn open_with_flow_control(path: &str, baud: u32) -> Result<Self> {
        Self::open_inner(path, baud, tokio_serial::FlowControl::Hardware).await
    }

    async fn open_inner(
        path: &str,
        baud: u32,
        flow: tokio_serial::FlowControl,
    ) -> Result<Self> {
        // XBee UARTs are always 8N1; only baud and flow control vary.
        let port = tokio_serial::new(path, baud)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(flow)
            .open_native_async()
            .map_err(|e| Error::Transport(format!("cannot open {path}: {e}")))?;

        debug!(port = %path, baud, flow = ?flow, "module uart opened");
        Ok(SerialTransport {
            port: Some(port),
            path: path.to_string(),
        })
    }

    /// The device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Fold the I/O failures that mean "the adapter is gone" into
/// [`Error::ConnectionLost`], so callers can tell a dead link from a
/// transient fault. USB serial adapters vanish mid-session when unplugged.
fn map_link_error(e: std::io::Error) -> Error {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::NotConnected => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        trace!(port = %self.path, "uart tx {} bytes: {data:02X?}", data.len());
        port.write_all(data).await.map_err(map_link_error)?;
        // Push the frame onto the wire now; the module cannot start
        // parsing a frame the host is still buffering.
        port.flush().await.map_err(map_link_error)
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            // The window elapsed with the line quiet.
            Err(_elapsed) => Err(Error::Timeout),
            Ok(Err(e)) => Err(map_link_error(e)),
            // EOF from a serial stream means the device detached.
            Ok(Ok(0)) => {
                warn!(port = %self.path, "uart read EOF, adapter detached");
                Err(Error::ConnectionLost)
            }
            Ok(Ok(n)) => {
                trace!(port = %self.path, "uart rx {n} bytes: {:02X?}", &buf[..n]);
                Ok(n)
            }
        }
    }

    async fn flush_rx(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.clear(tokio_serial::ClearBuffer::Input)
            .map_err(|e| Error::Transport(format!("cannot clear RX buffer: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            // Let any queued TX bytes drain before dropping the handle.
            if let Err(e) = port.flush().await {
                debug!(port = %self.path, error = %e, "flush on close failed");
            }
            debug!(port = %self.path, "module uart closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_transport() -> SerialTransport {
        SerialTransport {
            port: None,
            path: "/dev/null0".into(),
        }
    }

    #[test]
    fn link_error_maps_disconnects() {
        use std::io::{Error as IoError, ErrorKind};

        assert!(matches!(
            map_link_error(IoError::new(ErrorKind::BrokenPipe, "gone")),
            Error::ConnectionLost
        ));
        assert!(matches!(
            map_link_error(IoError::new(ErrorKind::NotConnected, "gone")),
            Error::ConnectionLost
        ));
    }

    #[test]
    fn link_error_keeps_other_io_faults() {
        use std::io::{Error as IoError, ErrorKind};

        let mapped = map_link_error(IoError::new(ErrorKind::InvalidData, "framing"));
        assert!(matches!(mapped, Error::Io(_)));
        assert!(mapped.to_string().contains("framing"));
    }

    #[tokio::test]
    async fn operations_after_close_report_not_connected() {
        let mut uart = closed_transport();
        assert!(!uart.is_connected());

        assert!(matches!(uart.send(&[0x7E]).await, Err(Error::NotConnected)));

        let mut buf = [0u8; 4];
        assert!(matches!(
            uart.receive(&mut buf, Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(uart.flush_rx().await, Err(Error::NotConnected)));

        // Closing an already-closed transport is a no-op, not an error.
        uart.close().await.unwrap();
    }

    #[tokio::test]
    async fn path_is_reported() {
        let uart = closed_transport();
        assert_eq!(uart.path(), "/dev/null0");
    }
}
