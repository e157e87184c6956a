//! XBeeCellular -- the [`XBee`] trait implementation for XBee 3 Cellular
//! modems.
//!
//! Ties the pure payload builders in [`crate::commands`] to an
//! [`ApiSession`] to produce a working LTE/NB-IoT backend: APN/SIM/carrier
//! configuration, network attach, stateless IPv4 transmits, and the
//! Extended-Socket operations with per-socket state tracking.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use xbeelib_core::api::ApiSession;
use xbeelib_core::at::AtCommand;
use xbeelib_core::device::XBee;
use xbeelib_core::error::{Error, Result};
use xbeelib_core::events::XBeeEvent;
use xbeelib_core::frame::{ApiFrame, FrameType};
use xbeelib_core::types::{CellularPacket, Protocol};

use crate::commands;
use crate::socket::{RemoteAddr, SocketInfo, SocketOption, SocketState};

/// Window for a socket create/connect/bind/close response frame.
const SOCKET_RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Window for the final socket status after a connect is accepted.
const SOCKET_CONNECT_STATUS_TIMEOUT: Duration = Duration::from_secs(20);

/// Number of association-indication polls during a blocking attach.
const ATTACH_POLL_ATTEMPTS: u32 = 60;

/// Delay between association-indication polls.
const ATTACH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// AI response byte meaning "registered" on the Cellular family.
const AI_ATTACHED: u8 = 0x00;

/// Socket-status byte reporting a connected socket.
const SOCKET_STATUS_CONNECTED: u8 = 0x00;

/// Socket-status byte reporting a closed socket.
const SOCKET_STATUS_CLOSED: u8 = 0x01;

/// User configuration for cellular operation.
///
/// Empty strings mean "leave the module's current setting alone"; only
/// non-empty fields are pushed during [`connect`](XBee::connect).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellularConfig {
    /// Access point name (e.g. "hologram").
    pub apn: String,
    /// SIM unlock PIN.
    pub sim_pin: String,
    /// Carrier profile selector.
    pub carrier_profile: String,
}

/// A connected XBee 3 Cellular modem.
///
/// Constructed via [`XBeeCellularBuilder`](crate::builder::XBeeCellularBuilder).
/// All modem communication goes through the [`Transport`] provided at
/// build time.
///
/// [`Transport`]: xbeelib_core::Transport
pub struct XBeeCellular {
    session: ApiSession,
    event_tx: broadcast::Sender<XBeeEvent>,
    command_timeout: Duration,
    config: CellularConfig,
    /// Driver-side state per socket ID.
    sockets: HashMap<u8, SocketInfo>,
}

impl XBeeCellular {
    pub(crate) fn new(
        session: ApiSession,
        command_timeout: Duration,
        config: CellularConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        XBeeCellular {
            session,
            event_tx,
            command_timeout,
            config,
            sockets: HashMap::new(),
        }
    }

    /// Replace the APN/SIM/carrier configuration.
    ///
    /// The settings are copied into the device and pushed to the modem on
    /// the next [`connect`](XBee::connect).
    pub fn configure(&mut self, config: &CellularConfig) {
        self.config = config.clone();
    }

    /// The configuration currently held by the device.
    pub fn config(&self) -> &CellularConfig {
        &self.config
    }

    /// Push the non-empty configuration fields and start registration
    /// without waiting for the attach to complete.
    ///
    /// Use [`is_connected`](XBee::is_connected) or
    /// [`connect`](XBee::connect) to observe the attach.
    pub async fn connect_nonblocking(&mut self) -> Result<()> {
        self.push_config().await
    }

    /// Send a stateless IPv4 packet (no socket required).
    ///
    /// The module picks a source port and tears the flow down on its own;
    /// use sockets for anything interactive.
    pub async fn send_packet(&mut self, packet: &CellularPacket) -> Result<()> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_ipv4_transmit(frame_id, packet);
        self.session
            .send_frame(FrameType::TransmitRequest, &data)
            .await?;
        debug!(
            frame_id,
            dest = %packet.ip,
            port = packet.port,
            len = packet.payload.len(),
            "IPv4 transmit queued"
        );
        Ok(())
    }

    /// Create a TCP or UDP socket on the modem.
    ///
    /// Waits up to 3 s for the create response. Returns the module-assigned
    /// socket ID; a nonzero module status is [`Error::SocketFailure`].
    pub async fn socket_create(&mut self, protocol: Protocol) -> Result<u8> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_socket_create(frame_id, protocol);
        self.session
            .send_frame(FrameType::SocketCreate, &data)
            .await?;

        let response = self
            .session
            .wait_for(
                FrameType::SocketCreateResponse,
                |p| p.first() == Some(&frame_id),
                SOCKET_RESPONSE_TIMEOUT,
            )
            .await?;

        let (_, socket_id, status) = commands::parse_socket_response(&response.payload)?;
        if status != 0 {
            warn!(status, "socket create rejected");
            return Err(Error::SocketFailure { status });
        }

        debug!(socket_id, ?protocol, "socket created");
        self.sockets.insert(
            socket_id,
            SocketInfo {
                protocol,
                state: SocketState::Created,
            },
        );
        Ok(socket_id)
    }

    /// Connect a socket to a remote endpoint.
    ///
    /// Waits up to 3 s for the connect response, then up to 20 s for the
    /// socket-status frame that confirms the connection is established.
    pub async fn socket_connect(
        &mut self,
        socket_id: u8,
        addr: impl Into<RemoteAddr>,
        port: u16,
    ) -> Result<()> {
        let addr = addr.into();
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_socket_connect(frame_id, socket_id, port, &addr);
        self.session
            .send_frame(FrameType::SocketConnect, &data)
            .await?;
        self.set_socket_state(socket_id, SocketState::Connecting);

        debug!(socket_id, ?addr, port, "socket connect requested");

        let response = self
            .session
            .wait_for(
                FrameType::SocketConnectResponse,
                |p| p.first() == Some(&frame_id) && p.get(1) == Some(&socket_id),
                SOCKET_RESPONSE_TIMEOUT,
            )
            .await;
        let response = self.fail_socket_on_timeout(socket_id, response)?;

        let (_, _, status) = commands::parse_socket_response(&response.payload)?;
        if status != 0 {
            warn!(socket_id, status, "socket connect rejected");
            self.set_socket_state(socket_id, SocketState::Closed);
            return Err(Error::SocketFailure { status });
        }

        // The connect response only acknowledges the request; the socket is
        // usable once the module reports it connected.
        let status_frame = self
            .session
            .wait_for(
                FrameType::SocketStatus,
                |p| p.get(1) == Some(&socket_id),
                SOCKET_CONNECT_STATUS_TIMEOUT,
            )
            .await;
        let status_frame = self.fail_socket_on_timeout(socket_id, status_frame)?;

        let (_, _, status) = commands::parse_socket_response(&status_frame.payload)?;
        if status != SOCKET_STATUS_CONNECTED {
            warn!(socket_id, status, "socket failed to establish");
            self.set_socket_state(socket_id, SocketState::Closed);
            return Err(Error::SocketFailure { status });
        }

        info!(socket_id, "socket connected");
        self.set_socket_state(socket_id, SocketState::Connected);
        Ok(())
    }

    /// Bind a UDP socket to a local port.
    ///
    /// With `blocking` set, waits up to 3 s for the bind response.
    pub async fn socket_bind(&mut self, socket_id: u8, port: u16, blocking: bool) -> Result<()> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_socket_bind(frame_id, socket_id, port);
        self.session.send_frame(FrameType::SocketBind, &data).await?;

        if blocking {
            let response = self
                .session
                .wait_for(
                    FrameType::SocketBindResponse,
                    |p| p.first() == Some(&frame_id) && p.get(1) == Some(&socket_id),
                    SOCKET_RESPONSE_TIMEOUT,
                )
                .await?;

            let (_, _, status) = commands::parse_socket_response(&response.payload)?;
            if status != 0 {
                warn!(socket_id, status, "socket bind rejected");
                return Err(Error::SocketFailure { status });
            }
        }

        debug!(socket_id, port, "socket bound");
        self.set_socket_state(socket_id, SocketState::Bound);
        Ok(())
    }

    /// Send data on a connected socket.
    ///
    /// The payload is capped at 120 bytes per request.
    pub async fn socket_send(&mut self, socket_id: u8, payload: &[u8]) -> Result<()> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_socket_send(frame_id, socket_id, payload)?;
        self.session.send_frame(FrameType::SocketSend, &data).await?;
        debug!(socket_id, len = payload.len(), "socket send queued");
        Ok(())
    }

    /// Send a UDP datagram to a specific address and port.
    ///
    /// The payload is capped at 120 bytes per request.
    pub async fn socket_send_to(
        &mut self,
        socket_id: u8,
        ip: Ipv4Addr,
        port: u16,
        payload: &[u8],
    ) -> Result<()> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_socket_send_to(frame_id, socket_id, ip, port, payload)?;
        self.session
            .send_frame(FrameType::SocketSendTo, &data)
            .await?;
        debug!(socket_id, dest = %ip, port, len = payload.len(), "socket send-to queued");
        Ok(())
    }

    /// Set a socket option (bind port, listen, keepalive).
    pub async fn socket_set_option(
        &mut self,
        socket_id: u8,
        option: SocketOption,
        value: &[u8],
    ) -> Result<()> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_socket_option(frame_id, socket_id, option, value)?;
        self.session
            .send_frame(FrameType::SocketOption, &data)
            .await?;
        Ok(())
    }

    /// Close a socket.
    ///
    /// With `blocking` set, waits up to 3 s for the socket-status frame
    /// confirming closure; the handle becomes invalid once that arrives.
    pub async fn socket_close(&mut self, socket_id: u8, blocking: bool) -> Result<()> {
        let frame_id = self.session.next_frame_id();
        let data = commands::encode_socket_close(frame_id, socket_id);
        self.session.send_frame(FrameType::SocketClose, &data).await?;
        self.set_socket_state(socket_id, SocketState::Closing);

        if !blocking {
            return Ok(());
        }

        let status_frame = self
            .session
            .wait_for(
                FrameType::SocketStatus,
                |p| p.first() == Some(&frame_id) && p.get(1) == Some(&socket_id),
                SOCKET_RESPONSE_TIMEOUT,
            )
            .await?;

        let (_, _, status) = commands::parse_socket_response(&status_frame.payload)?;
        if status != SOCKET_STATUS_CLOSED {
            warn!(socket_id, status, "unexpected status while closing");
            return Err(Error::SocketFailure { status });
        }

        debug!(socket_id, "socket closed");
        self.sockets.remove(&socket_id);
        Ok(())
    }

    /// Driver-side state of a socket, if the handle is known.
    pub fn socket_state(&self, socket_id: u8) -> Option<SocketState> {
        self.sockets.get(&socket_id).map(|s| s.state)
    }

    /// Push non-empty configuration fields to the modem.
    async fn push_config(&mut self) -> Result<()> {
        debug!("applying cellular configuration");

        if !self.config.sim_pin.is_empty() {
            let pin = self.config.sim_pin.clone();
            self.session
                .at_command(AtCommand::SimPin, pin.as_bytes())
                .await?;
        }
        if !self.config.apn.is_empty() {
            debug!(apn = %self.config.apn, "setting APN");
            let apn = self.config.apn.clone();
            self.session
                .at_command(AtCommand::AccessPointName, apn.as_bytes())
                .await?;
        }
        if !self.config.carrier_profile.is_empty() {
            let carrier = self.config.carrier_profile.clone();
            self.session
                .at_command(AtCommand::CarrierProfile, carrier.as_bytes())
                .await?;
        }
        Ok(())
    }

    /// One association-indication poll; `true` means registered.
    async fn poll_attached(&mut self) -> Result<bool> {
        let data = self
            .session
            .at_command_response(AtCommand::AssociationIndication, &[], self.command_timeout)
            .await?;
        Ok(data.first() == Some(&AI_ATTACHED))
    }

    fn set_socket_state(&mut self, socket_id: u8, state: SocketState) {
        if let Some(info) = self.sockets.get_mut(&socket_id) {
            info.state = state;
        }
    }

    /// Map a wait timeout into a closed socket, leaving other errors as-is.
    fn fail_socket_on_timeout(
        &mut self,
        socket_id: u8,
        result: Result<ApiFrame>,
    ) -> Result<ApiFrame> {
        if matches!(result, Err(Error::ResponseTimeout)) {
            self.set_socket_state(socket_id, SocketState::Closed);
        }
        result
    }
}

#[async_trait]
impl XBee for XBeeCellular {
    fn session(&mut self) -> &mut ApiSession {
        &mut self.session
    }

    fn event_sender(&self) -> &broadcast::Sender<XBeeEvent> {
        &self.event_tx
    }

    /// Attach to the LTE network.
    ///
    /// Pushes the SIM PIN, APN, and carrier profile (where set), then polls
    /// the association indication up to 60 times at 1 s intervals. The
    /// driver does not retry a failed attach on its own.
    async fn connect(&mut self) -> Result<()> {
        self.push_config().await?;

        info!("waiting for network attach");
        for _ in 0..ATTACH_POLL_ATTEMPTS {
            if self.poll_attached().await? {
                info!("attached to cellular network");
                let _ = self.event_tx.send(XBeeEvent::Connected);
                return Ok(());
            }
            sleep(ATTACH_POLL_INTERVAL).await;
        }

        warn!("network attach did not complete");
        Err(Error::AttachTimeout)
    }

    /// Gracefully shut down the modem's network connection (AT `SD`).
    async fn disconnect(&mut self) -> Result<()> {
        self.session.at_command(AtCommand::Shutdown, &[]).await?;
        let _ = self.event_tx.send(XBeeEvent::Disconnected);
        Ok(())
    }

    async fn is_connected(&mut self) -> Result<bool> {
        self.poll_attached().await
    }

    /// On this family a soft reset is the graceful shutdown command, which
    /// detaches cleanly before the modem restarts registration.
    async fn soft_reset(&mut self) -> Result<()> {
        self.session.at_command(AtCommand::Shutdown, &[]).await?;
        Ok(())
    }

    fn handle_rx_packet_frame(&mut self, frame: &ApiFrame) {
        let parsed = match frame.frame_type {
            FrameType::SocketRx => commands::parse_socket_rx(&frame.payload),
            FrameType::SocketRxFrom => commands::parse_socket_rx_from(&frame.payload),
            other => {
                warn!(frame_type = ?other, "unexpected frame in RX handler");
                return;
            }
        };

        match parsed {
            Ok(packet) => {
                debug!(
                    socket_id = packet.socket_id,
                    len = packet.payload.len(),
                    source = %packet.ip,
                    "socket data received"
                );
                let _ = self
                    .event_tx
                    .send(XBeeEvent::CellularPacketReceived(packet));
            }
            Err(e) => warn!(error = %e, "dropping malformed socket receive"),
        }
    }

    fn handle_socket_status_frame(&mut self, frame: &ApiFrame) {
        match commands::parse_socket_response(&frame.payload) {
            Ok((_, socket_id, status)) => {
                debug!(socket_id, status, "socket status");
                match status {
                    SOCKET_STATUS_CONNECTED => {
                        self.set_socket_state(socket_id, SocketState::Connected)
                    }
                    SOCKET_STATUS_CLOSED => self.set_socket_state(socket_id, SocketState::Closed),
                    _ => {}
                }
                let _ = self
                    .event_tx
                    .send(XBeeEvent::SocketStatus { socket_id, status });
            }
            Err(e) => warn!(error = %e, "dropping malformed socket status"),
        }
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

    fn device_with(mock: MockTransport, config: CellularConfig) -> XBeeCellular {
        XBeeCellular::new(
            ApiSession::new(Box::new(mock)),
            Duration::from_secs(5),
            config,
        )
    }

    fn device(mock: MockTransport) -> XBeeCellular {
        device_with(mock, CellularConfig::default())
    }

    #[tokio::test]
    async fn send_packet_builds_ipv4_transmit() {
        let mut mock = MockTransport::new();
        mock.expect_send(&encode_frame(
            FrameType::TransmitRequest,
            &[0x05, 0x01, 0x00, 0x50, 0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB],
        ));

        let mut dev = device(mock);
        // Wind the frame-ID counter to 5.
        for _ in 0..4 {
            dev.session().next_frame_id();
        }

        let packet = CellularPacket {
            protocol: Protocol::Tcp,
            port: 80,
            ip: Ipv4Addr::new(1, 2, 3, 4),
            payload: vec![0xAA, 0xBB],
            ..Default::default()
        };
        dev.send_packet(&packet).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn connect_pushes_config_then_polls() {
        let mut mock = MockTransport::new();
        mock.expect_send(&at_request(1, *b"PN", b"1234"));
        mock.expect_send(&at_request(2, *b"AN", b"hologram"));
        mock.expect_send(&at_request(3, *b"CP", b"2"));
        mock.expect(&at_request(4, *b"AI", &[]), &at_response(4, *b"AI", 0, &[0x23]));
        mock.expect(&at_request(5, *b"AI", &[]), &at_response(5, *b"AI", 0, &[0x00]));

        let mut dev = device_with(
            mock,
            CellularConfig {
                apn: "hologram".into(),
                sim_pin: "1234".into(),
                carrier_profile: "2".into(),
            },
        );
        let mut events = dev.subscribe();
        dev.connect().await.unwrap();

        assert!(matches!(events.try_recv().unwrap(), XBeeEvent::Connected));
    }

    #[tokio::test]
    async fn connect_skips_empty_config_fields() {
        let mut mock = MockTransport::new();
        // Only the APN is set, so PN and CP must not be sent.
        mock.expect_send(&at_request(1, *b"AN", b"iot.provider"));
        mock.expect(&at_request(2, *b"AI", &[]), &at_response(2, *b"AI", 0, &[0x00]));

        let mut dev = device_with(
            mock,
            CellularConfig {
                apn: "iot.provider".into(),
                ..Default::default()
            },
        );
        dev.connect().await.unwrap();
    }

    #[tokio::test]
    async fn is_connected_checks_ai_for_zero() {
        let mut mock = MockTransport::new();
        mock.expect(&at_request(1, *b"AI", &[]), &at_response(1, *b"AI", 0, &[0x22]));
        mock.expect(&at_request(2, *b"AI", &[]), &at_response(2, *b"AI", 0, &[0x00]));

        let mut dev = device(mock);
        assert!(!dev.is_connected().await.unwrap());
        assert!(dev.is_connected().await.unwrap());
    }

    #[tokio::test]
    async fn disconnect_sends_shutdown() {
        let mut mock = MockTransport::new();
        mock.expect_send(&at_request(1, *b"SD", &[]));

        let mut dev = device(mock);
        let mut events = dev.subscribe();
        dev.disconnect().await.unwrap();
        assert!(matches!(events.try_recv().unwrap(), XBeeEvent::Disconnected));
    }

    #[tokio::test]
    async fn soft_reset_maps_to_shutdown() {
        let mut mock = MockTransport::new();
        mock.expect_send(&at_request(1, *b"SD", &[]));

        let mut dev = device(mock);
        dev.soft_reset().await.unwrap();
    }

    #[tokio::test]
    async fn socket_create_returns_assigned_id() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x01]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x12, 0x00]),
        );

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Tcp).await.unwrap();
        assert_eq!(socket, 0x12);
        assert_eq!(dev.socket_state(socket), Some(SocketState::Created));
    }

    #[tokio::test]
    async fn socket_create_failure_status() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x00]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x00, 0x22]),
        );

        let mut dev = device(mock);
        assert!(matches!(
            dev.socket_create(Protocol::Udp).await,
            Err(Error::SocketFailure { status: 0x22 })
        ));
    }

    #[tokio::test]
    async fn socket_connect_waits_for_response_and_status() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x01]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x02, 0x00]),
        );

        // Connect response, then the asynchronous established status.
        let mut connect_reply =
            encode_frame(FrameType::SocketConnectResponse, &[0x02, 0x02, 0x00]);
        connect_reply.extend(encode_frame(FrameType::SocketStatus, &[0x00, 0x02, 0x00]));
        mock.expect(
            &encode_frame(
                FrameType::SocketConnect,
                &[0x02, 0x02, 0x01, 0xBB, 0x00, 52, 43, 121, 77],
            ),
            &connect_reply,
        );

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Tcp).await.unwrap();
        dev.socket_connect(socket, Ipv4Addr::new(52, 43, 121, 77), 443)
            .await
            .unwrap();
        assert_eq!(dev.socket_state(socket), Some(SocketState::Connected));
    }

    #[tokio::test]
    async fn socket_connect_hostname_address_type() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x01]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x05, 0x00]),
        );

        let mut expected = vec![0x02, 0x05, 0x00, 0x50, 0x01];
        expected.extend_from_slice(b"example.com");
        let mut connect_reply =
            encode_frame(FrameType::SocketConnectResponse, &[0x02, 0x05, 0x00]);
        connect_reply.extend(encode_frame(FrameType::SocketStatus, &[0x00, 0x05, 0x00]));
        mock.expect(&encode_frame(FrameType::SocketConnect, &expected), &connect_reply);

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Tcp).await.unwrap();
        dev.socket_connect(socket, "example.com", 80).await.unwrap();
    }

    #[tokio::test]
    async fn socket_connect_rejection_closes_socket() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x01]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x02, 0x00]),
        );
        mock.expect(
            &encode_frame(
                FrameType::SocketConnect,
                &[0x02, 0x02, 0x00, 0x50, 0x00, 10, 0, 0, 1],
            ),
            &encode_frame(FrameType::SocketConnectResponse, &[0x02, 0x02, 0x20]),
        );

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Tcp).await.unwrap();
        assert!(matches!(
            dev.socket_connect(socket, Ipv4Addr::new(10, 0, 0, 1), 80).await,
            Err(Error::SocketFailure { status: 0x20 })
        ));
        assert_eq!(dev.socket_state(socket), Some(SocketState::Closed));
    }

    #[tokio::test]
    async fn socket_bind_blocking_waits_for_response() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x00]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x03, 0x00]),
        );
        mock.expect(
            &encode_frame(FrameType::SocketBind, &[0x02, 0x03, 0x12, 0x34]),
            &encode_frame(FrameType::SocketBindResponse, &[0x02, 0x03, 0x00]),
        );

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Udp).await.unwrap();
        dev.socket_bind(socket, 0x1234, true).await.unwrap();
        assert_eq!(dev.socket_state(socket), Some(SocketState::Bound));
    }

    #[tokio::test]
    async fn socket_send_and_send_to_cap_payload() {
        let mut dev = device(MockTransport::new());
        let oversize = vec![0u8; 121];
        assert!(matches!(
            dev.socket_send(1, &oversize).await,
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            dev.socket_send_to(1, Ipv4Addr::LOCALHOST, 1, &oversize).await,
            Err(Error::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn socket_close_blocking_confirms_and_forgets_handle() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x00]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x07, 0x00]),
        );
        mock.expect(
            &encode_frame(FrameType::SocketClose, &[0x02, 0x07]),
            &encode_frame(FrameType::SocketStatus, &[0x02, 0x07, 0x01]),
        );

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Udp).await.unwrap();
        dev.socket_close(socket, true).await.unwrap();
        assert_eq!(dev.socket_state(socket), None);
    }

    #[tokio::test]
    async fn socket_close_nonblocking_marks_closing() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x00]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x07, 0x00]),
        );
        mock.expect_send(&encode_frame(FrameType::SocketClose, &[0x02, 0x07]));

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Udp).await.unwrap();
        dev.socket_close(socket, false).await.unwrap();
        assert_eq!(dev.socket_state(socket), Some(SocketState::Closing));
    }

    #[tokio::test]
    async fn socket_rx_reaches_subscriber_via_process() {
        let mut mock = MockTransport::new();
        mock.push_rx(&encode_frame(
            FrameType::SocketRx,
            &[0x00, 0x02, 0x00, 0x68, 0x65, 0x6C, 0x6C, 0x6F],
        ));

        let mut dev = device(mock);
        let mut events = dev.subscribe();
        dev.process().await.unwrap();

        match events.try_recv().unwrap() {
            XBeeEvent::CellularPacketReceived(packet) => {
                assert_eq!(packet.socket_id, 2);
                assert_eq!(packet.payload, b"hello".to_vec());
            }
            other => panic!("expected socket data event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn socket_rx_from_carries_source_address() {
        let mut mock = MockTransport::new();
        mock.push_rx(&encode_frame(
            FrameType::SocketRxFrom,
            &[0x00, 0x03, 0x00, 52, 43, 121, 77, 0x27, 0x11, 0xCA, 0xFE],
        ));

        let mut dev = device(mock);
        let mut events = dev.subscribe();
        dev.process().await.unwrap();

        match events.try_recv().unwrap() {
            XBeeEvent::CellularPacketReceived(packet) => {
                assert_eq!(packet.ip, Ipv4Addr::new(52, 43, 121, 77));
                assert_eq!(packet.remote_port, 10001);
                assert_eq!(packet.payload, vec![0xCA, 0xFE]);
            }
            other => panic!("expected socket data event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn runt_socket_rx_is_dropped() {
        let mut mock = MockTransport::new();
        mock.push_rx(&encode_frame(FrameType::SocketRx, &[0x00, 0x02]));

        let mut dev = device(mock);
        let mut events = dev.subscribe();
        dev.process().await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsolicited_socket_status_updates_state() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode_frame(FrameType::SocketCreate, &[0x01, 0x01]),
            &encode_frame(FrameType::SocketCreateResponse, &[0x01, 0x02, 0x00]),
        );
        mock.push_rx(&encode_frame(FrameType::SocketStatus, &[0x00, 0x02, 0x01]));

        let mut dev = device(mock);
        let socket = dev.socket_create(Protocol::Tcp).await.unwrap();

        // The close status arrives unsolicited; process() routes it.
        dev.process().await.unwrap();
        assert_eq!(dev.socket_state(socket), Some(SocketState::Closed));
    }

    #[tokio::test]
    async fn configure_replaces_config_copy() {
        let mut dev = device(MockTransport::new());
        let config = CellularConfig {
            apn: "new-apn".into(),
            sim_pin: String::new(),
            carrier_profile: "3".into(),
        };
        dev.configure(&config);
        assert_eq!(dev.config(), &config);
    }
}
