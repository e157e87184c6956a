//! The `XBee` trait -- unified interface for all module-family backends.
//!
//! This trait is the primary API surface of xbeelib. Applications program
//! against `dyn XBee` for lifecycle and module housekeeping without needing
//! to know which family (LR or Cellular) is attached; family-specific
//! operations (uplinks, sockets) live on the concrete types.
//!
//! The trait splits into two layers:
//!
//! - **Required methods** every backend supplies: the [`ApiSession`]
//!   accessor, the event channel, network attach/detach, and the frame
//!   handlers the router dispatches into.
//! - **Provided methods** shared by every family: resets, configuration
//!   persistence, and the diagnostic getters (firmware/hardware version,
//!   RSSI, serial number). These are implemented once here in terms of the
//!   session.
//!
//! All methods take `&mut self`: the underlying link is half-duplex and the
//! frame-ID counter is exclusive, so a device must be driven from a single
//! task (wrap it in a mutex or an actor to share it).

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::{ApiSession, DEFAULT_AT_TIMEOUT};
use crate::at::AtCommand;
use crate::error::{Error, Result};
use crate::events::XBeeEvent;
use crate::frame::{ApiFrame, FrameType};

/// Window for the short diagnostic getters (RSSI, versions, serial).
const DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(2);

/// Unified asynchronous interface for an XBee module.
///
/// Backends implement the required methods; everything else is provided.
/// Unsolicited traffic (downlinks, socket data, status reports) is
/// delivered through the broadcast channel returned by
/// [`subscribe`](XBee::subscribe).
#[async_trait]
pub trait XBee: Send {
    /// The API-frame session owning the transport and frame-ID counter.
    fn session(&mut self) -> &mut ApiSession;

    /// The event channel unsolicited traffic is published on.
    fn event_sender(&self) -> &broadcast::Sender<XBeeEvent>;

    /// Subscribe to unsolicited-traffic events.
    ///
    /// The channel is bounded; if the consumer falls behind, older events
    /// are dropped (lagged).
    fn subscribe(&self) -> broadcast::Receiver<XBeeEvent> {
        self.event_sender().subscribe()
    }

    /// Attach to the network (LTE registration or LoRaWAN join).
    ///
    /// Blocks until attached or the backend's attach window elapses. The
    /// driver never retries on its own; callers drive reattach attempts.
    async fn connect(&mut self) -> Result<()>;

    /// Detach from the network.
    async fn disconnect(&mut self) -> Result<()>;

    /// Whether the module currently reports itself attached.
    async fn is_connected(&mut self) -> Result<bool>;

    /// Handle a received data frame (downlink or socket traffic).
    ///
    /// Called by [`dispatch_frame`](XBee::dispatch_frame); backends parse
    /// the family-specific layout and publish an event.
    fn handle_rx_packet_frame(&mut self, frame: &ApiFrame);

    /// Handle a transmit-status frame.
    ///
    /// The default drops the frame with a log entry, which is correct for
    /// families whose transmits are not acknowledged this way.
    fn handle_transmit_status_frame(&mut self, frame: &ApiFrame) {
        debug!(payload = ?frame.payload, "transmit status (no handler), dropping");
    }

    /// Handle a socket-status frame.
    ///
    /// The default drops the frame with a log entry; the Cellular backend
    /// overrides this to track socket state.
    fn handle_socket_status_frame(&mut self, frame: &ApiFrame) {
        debug!(payload = ?frame.payload, "socket status (no handler), dropping");
    }

    /// Route one received frame to its type-specific handler.
    ///
    /// Unknown types are logged and skipped, never an error.
    fn dispatch_frame(&mut self, frame: &ApiFrame) {
        match frame.frame_type {
            FrameType::AtResponse => {
                // Consumed here only when it slipped past a correlator
                // (e.g. a response to a fire-and-forget command).
                if frame.payload.len() >= 4 {
                    debug!(
                        "late AT response: frame id {}, command {}{}, status {}",
                        frame.payload[0],
                        frame.payload[1] as char,
                        frame.payload[2] as char,
                        frame.payload[3]
                    );
                } else {
                    warn!(payload = ?frame.payload, "runt AT response");
                }
            }
            FrameType::ModemStatus => {
                let status = frame.payload.first().copied().unwrap_or(0);
                debug!(status, "modem status");
                let _ = self.event_sender().send(XBeeEvent::ModemStatus(status));
            }
            FrameType::TransmitStatus => self.handle_transmit_status_frame(frame),
            FrameType::LrRxPacket
            | FrameType::LrExplicitRxPacket
            | FrameType::SocketRx
            | FrameType::SocketRxFrom => self.handle_rx_packet_frame(frame),
            FrameType::SocketStatus => self.handle_socket_status_frame(frame),
            other => {
                debug!(frame_type = ?other, "received unknown frame type");
            }
        }
    }

    /// Poll for inbound traffic and dispatch it.
    ///
    /// Drains any frames parked during an earlier correlated exchange, then
    /// attempts one bounded read. A quiet line and recoverable decode
    /// errors are not failures; call this continuously from the
    /// application's main loop.
    async fn process(&mut self) -> Result<()> {
        while let Some(frame) = self.session().take_pending() {
            self.dispatch_frame(&frame);
        }

        match self.session().receive_frame().await {
            Ok(frame) => {
                self.dispatch_frame(&frame);
                Ok(())
            }
            Err(Error::Timeout) => Ok(()),
            Err(e @ (Error::NotConnected | Error::ConnectionLost | Error::Io(_))) => Err(e),
            Err(e) => {
                debug!(error = %e, "discarding undecodable frame");
                Ok(())
            }
        }
    }

    /// Reboot the module (AT `RE`, non-waiting).
    ///
    /// Success means only that the command frame was accepted, not that the
    /// module actually restarted.
    async fn soft_reset(&mut self) -> Result<()> {
        self.session().at_command(AtCommand::SoftReset, &[]).await?;
        Ok(())
    }

    /// Hard-reset the module through platform circuitry.
    ///
    /// Reset lines are platform glue outside the serial protocol, so the
    /// default reports the operation unsupported.
    async fn hard_reset(&mut self) -> Result<()> {
        Err(Error::Unsupported(
            "hard reset requires platform reset circuitry".into(),
        ))
    }

    /// Restore factory defaults (AT `FR`, non-waiting).
    async fn factory_reset(&mut self) -> Result<()> {
        self.session().at_command(AtCommand::FactoryReset, &[]).await?;
        Ok(())
    }

    /// Exit legacy `+++` command mode (AT `CN`, non-waiting).
    async fn exit_command_mode(&mut self) -> Result<()> {
        self.session().at_command(AtCommand::ExitCommandMode, &[]).await?;
        Ok(())
    }

    /// Select the API mode (AT `AP`): 0 transparent, 1 API, 2 API-escaped.
    async fn set_api_mode(&mut self, mode: u8) -> Result<()> {
        self.session().at_command(AtCommand::ApiEnable, &[mode]).await?;
        Ok(())
    }

    /// Change the UART baud rate (AT `BD`), using the module's rate code
    /// (e.g. 3 for 9600, 7 for 115200).
    async fn set_baud_rate_code(&mut self, code: u8) -> Result<()> {
        self.session().at_command(AtCommand::BaudRate, &[code]).await?;
        Ok(())
    }

    /// Persist the current configuration to non-volatile memory (AT `WR`).
    async fn write_config(&mut self) -> Result<()> {
        self.session()
            .at_command_response(AtCommand::WriteConfig, &[], DEFAULT_AT_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Apply pending configuration changes (AT `AC`).
    async fn apply_changes(&mut self) -> Result<()> {
        self.session()
            .at_command_response(AtCommand::ApplyChanges, &[], DEFAULT_AT_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Set the API options byte (AT `AO`).
    async fn set_api_options(&mut self, value: u8) -> Result<()> {
        self.session()
            .at_command_response(AtCommand::ApiOptions, &[value], DEFAULT_AT_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Read the firmware version (AT `VR`), assembled MSB-first.
    async fn firmware_version(&mut self) -> Result<u32> {
        let data = self
            .session()
            .at_command_response(AtCommand::FirmwareVersion, &[], DEFAULT_AT_TIMEOUT)
            .await?;
        let bytes: [u8; 4] = data.as_slice().try_into().map_err(|_| {
            Error::Protocol(format!("firmware version response of {} bytes", data.len()))
        })?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Read the hardware version (AT `HV`).
    async fn hardware_version(&mut self) -> Result<u16> {
        let data = self
            .session()
            .at_command_response(AtCommand::HardwareVersion, &[], DIAGNOSTIC_TIMEOUT)
            .await?;
        let bytes: [u8; 2] = data.as_slice().try_into().map_err(|_| {
            Error::Protocol(format!("hardware version response of {} bytes", data.len()))
        })?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Read the last-hop RSSI in dBm (AT `DB`).
    ///
    /// The module reports a positive offset; the returned value is the
    /// negated signed dBm figure.
    async fn last_rssi(&mut self) -> Result<i8> {
        let data = self
            .session()
            .at_command_response(AtCommand::LastHopRssi, &[], DIAGNOSTIC_TIMEOUT)
            .await?;
        match data.as_slice() {
            [offset] => Ok(-(*offset as i8)),
            other => Err(Error::Protocol(format!(
                "RSSI response of {} bytes",
                other.len()
            ))),
        }
    }

    /// Read the 64-bit factory serial number (AT `SH` + `SL`).
    async fn serial_number(&mut self) -> Result<u64> {
        let hi = self
            .session()
            .at_command_response(AtCommand::SerialHigh, &[], DIAGNOSTIC_TIMEOUT)
            .await?;
        let hi: [u8; 4] = hi
            .as_slice()
            .try_into()
            .map_err(|_| Error::Protocol(format!("serial high response of {} bytes", hi.len())))?;

        let lo = self
            .session()
            .at_command_response(AtCommand::SerialLow, &[], DIAGNOSTIC_TIMEOUT)
            .await?;
        let lo: [u8; 4] = lo
            .as_slice()
            .try_into()
            .map_err(|_| Error::Protocol(format!("serial low response of {} bytes", lo.len())))?;

        Ok((u32::from_be_bytes(hi) as u64) << 32 | u32::from_be_bytes(lo) as u64)
    }
}
