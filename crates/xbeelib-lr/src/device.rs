//! XBeeLr -- the [`XBee`] trait implementation for XBee LR modules.
//!
//! Ties the pure payload builders in [`crate::commands`] to an
//! [`ApiSession`] to produce a working LoRaWAN backend: OTAA credential
//! setters, the join/attach sequence, uplinks with delivery confirmation,
//! and downlink parsing.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use xbeelib_core::api::ApiSession;
use xbeelib_core::at::AtCommand;
use xbeelib_core::device::XBee;
use xbeelib_core::error::{Error, Result};
use xbeelib_core::events::XBeeEvent;
use xbeelib_core::frame::{ApiFrame, FrameType};
use xbeelib_core::hex::hex_to_bytes;
use xbeelib_core::types::{LoRaClass, LrPacket};

use crate::commands;

/// Delay between association-indication polls while joining.
const ATTACH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// AI response byte meaning "joined" on the LR family.
const AI_JOINED: u8 = 0x01;

/// A connected XBee LR (LoRaWAN) module.
///
/// Constructed via [`XBeeLrBuilder`](crate::builder::XBeeLrBuilder). All
/// module communication goes through the [`Transport`] provided at build
/// time.
///
/// [`Transport`]: xbeelib_core::Transport
pub struct XBeeLr {
    session: ApiSession,
    event_tx: broadcast::Sender<XBeeEvent>,
    command_timeout: Duration,
    attach_timeout: Duration,
    tx_status_timeout: Duration,
    /// Delivery status of the most recent transmit the module reported,
    /// solicited or not.
    last_delivery_status: Option<u8>,
}

impl XBeeLr {
    pub(crate) fn new(
        session: ApiSession,
        command_timeout: Duration,
        attach_timeout: Duration,
        tx_status_timeout: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        XBeeLr {
            session,
            event_tx,
            command_timeout,
            attach_timeout,
            tx_status_timeout,
            last_delivery_status: None,
        }
    }

    /// Set the OTAA application EUI (AT `AE`).
    ///
    /// `app_eui` must be exactly 16 hex characters.
    pub async fn set_app_eui(&mut self, app_eui: &str) -> Result<()> {
        let bytes: [u8; 8] = hex_to_bytes(app_eui)?;
        self.session
            .at_command_response(AtCommand::AppEui, &bytes, self.command_timeout)
            .await?;
        Ok(())
    }

    /// Set the OTAA application key (AT `AK`).
    ///
    /// `app_key` must be exactly 32 hex characters.
    pub async fn set_app_key(&mut self, app_key: &str) -> Result<()> {
        let bytes: [u8; 16] = hex_to_bytes(app_key)?;
        self.session
            .at_command_response(AtCommand::AppKey, &bytes, self.command_timeout)
            .await?;
        Ok(())
    }

    /// Set the OTAA network key (AT `NK`).
    ///
    /// `nwk_key` must be exactly 32 hex characters.
    pub async fn set_nwk_key(&mut self, nwk_key: &str) -> Result<()> {
        let bytes: [u8; 16] = hex_to_bytes(nwk_key)?;
        self.session
            .at_command_response(AtCommand::NwkKey, &bytes, self.command_timeout)
            .await?;
        Ok(())
    }

    /// Read the factory device EUI (AT `DE`) as 16 hex characters.
    pub async fn dev_eui(&mut self) -> Result<String> {
        let data = self
            .session
            .at_command_response(AtCommand::DevEui, &[], self.command_timeout)
            .await?;
        if data.len() != 16 {
            return Err(Error::Protocol(format!(
                "device EUI response of {} bytes",
                data.len()
            )));
        }
        String::from_utf8(data)
            .map_err(|_| Error::Protocol("device EUI response is not ASCII".into()))
    }

    /// Set the LoRaWAN device class (AT `LC`).
    pub async fn set_class(&mut self, class: LoRaClass) -> Result<()> {
        self.session
            .at_command_response(AtCommand::LoRaClass, &[class.as_u8()], self.command_timeout)
            .await?;
        Ok(())
    }

    /// Set the LoRaWAN region code (AT `LR`), e.g. 8 for US915.
    pub async fn set_region(&mut self, region: u8) -> Result<()> {
        self.session
            .at_command_response(AtCommand::Region, &[region], self.command_timeout)
            .await?;
        Ok(())
    }

    /// Set the join RX1 window delay in milliseconds (AT `J1`).
    pub async fn set_join_rx1_delay(&mut self, delay_ms: u16) -> Result<()> {
        self.session
            .at_command_response(
                AtCommand::JoinRx1Delay,
                &delay_ms.to_be_bytes(),
                self.command_timeout,
            )
            .await?;
        Ok(())
    }

    /// Set the join RX2 window delay in milliseconds (AT `J2`).
    pub async fn set_join_rx2_delay(&mut self, delay_ms: u16) -> Result<()> {
        self.session
            .at_command_response(
                AtCommand::JoinRx2Delay,
                &delay_ms.to_be_bytes(),
                self.command_timeout,
            )
            .await?;
        Ok(())
    }

    /// Set the RX2 window frequency in hertz (AT `XF`).
    pub async fn set_rx2_frequency(&mut self, freq_hz: u32) -> Result<()> {
        self.session
            .at_command_response(
                AtCommand::Rx2Frequency,
                &freq_hz.to_be_bytes(),
                self.command_timeout,
            )
            .await?;
        Ok(())
    }

    /// Send an uplink and wait for the module's delivery report.
    ///
    /// Builds a transmit request from `packet.payload`, `packet.port`, and
    /// `packet.ack`, then blocks until the transmit-status frame carrying
    /// the same frame ID arrives. Frames received meanwhile are parked for
    /// [`process`](XBee::process); nothing is dropped.
    ///
    /// Returns the delivery status byte: 0 means delivered, other values
    /// encode the failure reason (0x01 ACK failed, 0x22 not joined, ...).
    pub async fn send_packet(&mut self, packet: &LrPacket) -> Result<u8> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_transmit_request(frame_id, packet);
        self.session
            .send_frame(FrameType::TransmitRequest, &data)
            .await?;

        debug!(frame_id, len = packet.payload.len(), port = packet.port, "uplink queued");

        let status_frame = self
            .session
            .wait_for(
                FrameType::TransmitStatus,
                |payload| payload.first() == Some(&frame_id),
                self.tx_status_timeout,
            )
            .await?;

        let (_, status) = commands::parse_transmit_status(&status_frame.payload)?;
        self.last_delivery_status = Some(status);
        let _ = self
            .event_tx
            .send(XBeeEvent::TransmitStatus { frame_id, status });

        if status == 0 {
            debug!(frame_id, "uplink delivered");
        } else {
            warn!(frame_id, status, "uplink failed");
        }
        Ok(status)
    }

    /// Delivery status of the most recent transmit report, if any.
    pub fn last_delivery_status(&self) -> Option<u8> {
        self.last_delivery_status
    }
}

#[async_trait]
impl XBee for XBeeLr {
    fn session(&mut self) -> &mut ApiSession {
        &mut self.session
    }

    fn event_sender(&self) -> &broadcast::Sender<XBeeEvent> {
        &self.event_tx
    }

    /// Join the LoRaWAN network.
    ///
    /// Issues AT `JN`, then polls the association indication once per
    /// second until the module reports joined or the attach window
    /// elapses. The driver does not retry a failed join on its own.
    async fn connect(&mut self) -> Result<()> {
        info!("starting OTAA join");
        self.session.at_command(AtCommand::Join, &[]).await?;

        let deadline = Instant::now() + self.attach_timeout;
        loop {
            match self.poll_association().await {
                Ok(true) => {
                    info!("joined LoRaWAN network");
                    let _ = self.event_tx.send(XBeeEvent::Connected);
                    return Ok(());
                }
                Ok(false) => {}
                // A slow AI response near the join is not fatal; keep polling.
                Err(Error::ResponseTimeout) => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                warn!("join did not complete within the attach window");
                return Err(Error::AttachTimeout);
            }
            sleep(ATTACH_POLL_INTERVAL).await;
        }
    }

    /// LoRaWAN has no detach operation; the session simply ends when the
    /// module resets or re-joins.
    async fn disconnect(&mut self) -> Result<()> {
        Err(Error::Unsupported("LoRaWAN join cannot be torn down".into()))
    }

    async fn is_connected(&mut self) -> Result<bool> {
        self.poll_association().await
    }

    fn handle_rx_packet_frame(&mut self, frame: &ApiFrame) {
        match commands::parse_rx_packet(&frame.payload) {
            Ok(packet) => {
                debug!(
                    port = packet.port,
                    len = packet.payload.len(),
                    rssi = packet.rssi,
                    snr = packet.snr,
                    counter = packet.counter,
                    "downlink received"
                );
                let _ = self.event_tx.send(XBeeEvent::LrPacketReceived(packet));
            }
            Err(e) => warn!(error = %e, "dropping malformed downlink"),
        }
    }

    fn handle_transmit_status_frame(&mut self, frame: &ApiFrame) {
        match commands::parse_transmit_status(&frame.payload) {
            Ok((frame_id, status)) => {
                self.last_delivery_status = Some(status);
                let _ = self
                    .event_tx
                    .send(XBeeEvent::TransmitStatus { frame_id, status });
            }
            Err(e) => warn!(error = %e, "dropping malformed transmit status"),
        }
    }
}

impl XBeeLr {
    /// One association-indication poll; `true` means joined.
    async fn poll_association(&mut self) -> Result<bool> {
        let data = self
            .session
            .at_command_response(AtCommand::AssociationIndication, &[], self.command_timeout)
            .await?;
        Ok(data.first() == Some(&AI_JOINED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbeelib_core::frame::encode_frame;
    use xbeelib_test_harness::MockTransport;

    fn at_request(frame_id: u8, cmd: [u8; 2], param: &[u8]) -> Vec<u8> {
        let mut payload = vec![frame_id, cmd[0], cmd[1]];
        payload.extend_from_slice(param);
        encode_frame(FrameType::AtCommand, &payload)
    }

    fn at_response(frame_id: u8, cmd: [u8; 2], status: u8, data: &[u8]) -> Vec<u8> {
        let mut payload = vec![frame_id, cmd[0], cmd[1], status];
        payload.extend_from_slice(data);
        encode_frame(FrameType::AtResponse, &payload)
    }

    fn device(mock: MockTransport) -> XBeeLr {
        XBeeLr::new(
            ApiSession::new(Box::new(mock)),
            Duration::from_secs(5),
            Duration::from_secs(60),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn set_app_eui_sends_eight_raw_bytes() {
        let mut mock = MockTransport::new();
        mock.expect(
            &at_request(1, *b"AE", &[0x9E, 0x11, 0x77, 0xBD, 0x6B, 0x1D, 0xF4, 0x1E]),
            &at_response(1, *b"AE", 0, &[]),
        );

        let mut dev = device(mock);
        dev.set_app_eui("9E1177BD6B1DF41E").await.unwrap();
    }

    #[tokio::test]
    async fn set_app_eui_rejects_bad_hex() {
        let mut dev = device(MockTransport::new());
        assert!(matches!(
            dev.set_app_eui("9E1177BD6B1DF41").await,
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            dev.set_app_eui("9E1177BD6B1DF41G").await,
            Err(Error::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn set_app_key_sends_sixteen_raw_bytes() {
        let key_bytes: [u8; 16] = hex_to_bytes("CD32AAB41C54175E9060D86F3A8B7F48").unwrap();
        let mut mock = MockTransport::new();
        mock.expect(
            &at_request(1, *b"AK", &key_bytes),
            &at_response(1, *b"AK", 0, &[]),
        );

        let mut dev = device(mock);
        dev.set_app_key("CD32AAB41C54175E9060D86F3A8B7F48").await.unwrap();
    }

    #[tokio::test]
    async fn set_class_sends_ascii_byte() {
        let mut mock = MockTransport::new();
        mock.expect(
            &at_request(1, *b"LC", &[b'C']),
            &at_response(1, *b"LC", 0, &[]),
        );

        let mut dev = device(mock);
        dev.set_class(LoRaClass::C).await.unwrap();
    }

    #[tokio::test]
    async fn set_join_rx1_delay_is_big_endian() {
        let mut mock = MockTransport::new();
        mock.expect(
            &at_request(1, *b"J1", &[0x13, 0x88]),
            &at_response(1, *b"J1", 0, &[]),
        );

        let mut dev = device(mock);
        dev.set_join_rx1_delay(5000).await.unwrap();
    }

    #[tokio::test]
    async fn set_rx2_frequency_is_big_endian() {
        let mut mock = MockTransport::new();
        mock.expect(
            &at_request(1, *b"XF", &[0x37, 0x08, 0x70, 0xA0]),
            &at_response(1, *b"XF", 0, &[]),
        );

        let mut dev = device(mock);
        dev.set_rx2_frequency(923_300_000).await.unwrap();
    }

    #[tokio::test]
    async fn dev_eui_returns_sixteen_ascii_chars() {
        let mut mock = MockTransport::new();
        mock.expect(
            &at_request(1, *b"DE", &[]),
            &at_response(1, *b"DE", 0, b"0013A200415B2A5C"),
        );

        let mut dev = device(mock);
        assert_eq!(dev.dev_eui().await.unwrap(), "0013A200415B2A5C");
    }

    #[tokio::test(start_paused = true)]
    async fn connect_polls_until_joined() {
        let mut mock = MockTransport::new();
        // Join request, then two AI polls: still joining, then joined.
        mock.expect_send(&at_request(1, *b"JN", &[]));
        mock.expect(&at_request(2, *b"AI", &[]), &at_response(2, *b"AI", 0, &[0x00]));
        mock.expect(&at_request(3, *b"AI", &[]), &at_response(3, *b"AI", 0, &[0x01]));

        let mut dev = device(mock);
        let mut events = dev.subscribe();
        dev.connect().await.unwrap();

        assert!(matches!(events.try_recv().unwrap(), XBeeEvent::Connected));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_times_out_when_never_joined() {
        let mut mock = MockTransport::new();
        mock.expect_send(&at_request(1, *b"JN", &[]));
        // Every AI poll answers "still joining"; queue enough for the window.
        for id in 2..=70u8 {
            mock.expect(
                &at_request(id, *b"AI", &[]),
                &at_response(id, *b"AI", 0, &[0x00]),
            );
        }

        let mut dev = XBeeLr::new(
            ApiSession::new(Box::new(mock)),
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_secs(10),
        );
        assert!(matches!(dev.connect().await, Err(Error::AttachTimeout)));
    }

    #[tokio::test]
    async fn send_packet_returns_delivery_status() {
        let packet = LrPacket {
            payload: vec![0xC0, 0xC0, 0xC0, 0xFF, 0xEE],
            port: 2,
            ack: false,
            ..Default::default()
        };

        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(
                FrameType::TransmitRequest,
                &[0x01, 0x02, 0x00, 0xC0, 0xC0, 0xC0, 0xFF, 0xEE],
            ),
            &encode_frame(FrameType::TransmitStatus, &[0x01, 0x00]),
        );

        let mut dev = device(mock);
        assert_eq!(dev.send_packet(&packet).await.unwrap(), 0x00);
        assert_eq!(dev.last_delivery_status(), Some(0x00));
    }

    #[tokio::test]
    async fn send_packet_skips_foreign_tx_status() {
        // A status for some other frame ID arrives first; ours follows.
        let packet = LrPacket {
            payload: vec![0x01],
            port: 1,
            ..Default::default()
        };

        let mut response = encode_frame(FrameType::TransmitStatus, &[0x77, 0x01]);
        response.extend(encode_frame(FrameType::TransmitStatus, &[0x01, 0x22]));

        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::TransmitRequest, &[0x01, 0x01, 0x00, 0x01]),
            &response,
        );

        let mut dev = device(mock);
        assert_eq!(dev.send_packet(&packet).await.unwrap(), 0x22);
        // The foreign status was parked, not dropped.
        assert_eq!(dev.session().pending_len(), 1);
    }

    #[tokio::test]
    async fn downlink_reaches_subscriber_via_process() {
        let mut mock = MockTransport::new();
        mock.push_rx(&encode_frame(
            FrameType::LrRxPacket,
            &[0x02, 85, 0x07, 0x00, 0x00, 0x00, 0x09, 0xDE, 0xAD],
        ));

        let mut dev = device(mock);
        let mut events = dev.subscribe();
        dev.process().await.unwrap();

        match events.try_recv().unwrap() {
            XBeeEvent::LrPacketReceived(packet) => {
                assert_eq!(packet.port, 2);
                assert_eq!(packet.rssi, -85);
                assert_eq!(packet.payload, vec![0xDE, 0xAD]);
            }
            other => panic!("expected downlink event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn explicit_rx_uses_same_parser() {
        let mut mock = MockTransport::new();
        mock.push_rx(&encode_frame(
            FrameType::LrExplicitRxPacket,
            &[0x05, 90, 0x02, 0x00, 0x00, 0x00, 0x01, 0x42],
        ));

        let mut dev = device(mock);
        let mut events = dev.subscribe();
        dev.process().await.unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            XBeeEvent::LrPacketReceived(_)
        ));
    }

    #[tokio::test]
    async fn disconnect_is_unsupported() {
        let mut dev = device(MockTransport::new());
        assert!(matches!(dev.disconnect().await, Err(Error::Unsupported(_))));
    }
}
