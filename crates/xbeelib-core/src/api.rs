//! API-frame session: transport I/O, request/response correlation.
//!
//! [`ApiSession`] owns the [`Transport`] to a module together with the
//! per-device frame-ID counter and drives all wire traffic:
//!
//! - [`send_frame`](ApiSession::send_frame) writes one framed request.
//! - [`receive_frame`](ApiSession::receive_frame) runs the four-phase read
//!   state machine (delimiter, length, data, checksum).
//! - [`at_command_response`](ApiSession::at_command_response) implements the
//!   half-duplex AT correlator: it pumps incoming frames until the response
//!   matching the issued frame ID arrives, parking every unrelated frame on
//!   the pending queue so nothing is dropped while waiting.
//! - [`wait_for`](ApiSession::wait_for) is the same pump keyed by an
//!   arbitrary frame predicate, used by the socket layer.
//!
//! Pending frames are drained through the frame router by the owning
//! device's `process()` in arrival order.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

use crate::at::AtCommand;
use crate::error::{Error, Result};
use crate::frame::{
    checksum, encode_frame, verify_checksum, ApiFrame, FrameType, DEFAULT_MAX_FRAME_DATA,
    START_DELIMITER,
};
use crate::transport::{Transport, UART_READ_TIMEOUT};

/// Default window for an AT command/response exchange.
pub const DEFAULT_AT_TIMEOUT: Duration = Duration::from_secs(5);

/// Yield between correlation poll attempts so a cooperative runtime can
/// make progress elsewhere.
const POLL_DELAY: Duration = Duration::from_millis(1);

/// An API-frame session over a byte transport.
///
/// The session is deliberately single-task: the frame-ID counter and the
/// underlying link are exclusive, so a caller that needs concurrent access
/// must serialize externally.
pub struct ApiSession {
    transport: Box<dyn Transport>,
    /// Next frame ID to hand out. Wraps 255 -> 1; 0 is reserved for
    /// "no response requested".
    frame_id: u8,
    max_frame_data: u16,
    read_timeout: Duration,
    /// Frames received while waiting for a correlated response, in
    /// arrival order.
    pending: VecDeque<ApiFrame>,
}

impl ApiSession {
    /// Create a session over the given transport.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        ApiSession {
            transport,
            frame_id: 1,
            max_frame_data: DEFAULT_MAX_FRAME_DATA,
            read_timeout: UART_READ_TIMEOUT,
            pending: VecDeque::new(),
        }
    }

    /// Override the maximum frame data size (type byte + payload).
    pub fn set_max_frame_data(&mut self, max: u16) {
        self.max_frame_data = max;
    }

    /// Override the per-read UART timeout window.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// Whether the underlying transport is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Discard any half-received bytes buffered on the transport.
    pub async fn flush_rx(&mut self) -> Result<()> {
        self.transport.flush_rx().await
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Hand out the next frame ID and advance the counter.
    ///
    /// IDs run 1, 2, ..., 255, 1, 2, ... -- zero never appears because the
    /// module treats it as "suppress the response frame".
    pub fn next_frame_id(&mut self) -> u8 {
        let id = self.frame_id;
        self.frame_id = match self.frame_id {
            u8::MAX => 1,
            n => n + 1,
        };
        id
    }

    /// Take the oldest frame parked during correlation, if any.
    pub fn take_pending(&mut self) -> Option<ApiFrame> {
        self.pending.pop_front()
    }

    /// Number of frames parked during correlation.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Encode and write one frame.
    pub async fn send_frame(&mut self, frame_type: FrameType, payload: &[u8]) -> Result<()> {
        let length = payload.len() + 1;
        if length > self.max_frame_data as usize {
            return Err(Error::FrameTooLarge {
                length,
                max: self.max_frame_data,
            });
        }

        let bytes = encode_frame(frame_type, payload);
        trace!(frame_type = ?frame_type, bytes = ?bytes, "sending API frame");
        self.transport.send(&bytes).await
    }

    /// Read one frame off the wire.
    ///
    /// The read runs as a small state machine; each phase is bounded by the
    /// UART read window, so the call returns promptly even on a dead line:
    ///
    /// 1. Start delimiter -- a quiet line surfaces as [`Error::Timeout`],
    ///    any byte other than `0x7E` as [`Error::InvalidStartDelimiter`].
    ///    Garbage bytes therefore cost one error each and the reader
    ///    resynchronizes on the next delimiter.
    /// 2. Big-endian length -- short read is [`Error::LengthTimeout`]; a
    ///    length of zero or beyond the configured maximum is
    ///    [`Error::LengthExceedsBuffer`].
    /// 3. `length` bytes of frame data -- short read is [`Error::DataTimeout`].
    /// 4. Checksum byte -- missing is [`Error::ChecksumTimeout`], a bad sum
    ///    is [`Error::InvalidChecksum`].
    pub async fn receive_frame(&mut self) -> Result<ApiFrame> {
        let mut byte = [0u8; 1];
        let n = self.transport.receive(&mut byte, self.read_timeout).await?;
        if n == 0 {
            return Err(Error::Timeout);
        }
        if byte[0] != START_DELIMITER {
            return Err(Error::InvalidStartDelimiter(byte[0]));
        }

        let mut len_bytes = [0u8; 2];
        if self.read_exact(&mut len_bytes).await? < 2 {
            return Err(Error::LengthTimeout);
        }
        let length = u16::from_be_bytes(len_bytes);
        // The length counts the type byte, so zero is malformed too.
        if length == 0 || length > self.max_frame_data {
            return Err(Error::LengthExceedsBuffer {
                length,
                max: self.max_frame_data,
            });
        }

        let mut data = vec![0u8; length as usize];
        let got = self.read_exact(&mut data).await?;
        if got < length as usize {
            return Err(Error::DataTimeout);
        }

        let mut cs = [0u8; 1];
        if self.read_exact(&mut cs).await? < 1 {
            return Err(Error::ChecksumTimeout);
        }

        let frame_type = data[0];
        let payload = &data[1..];
        if !verify_checksum(frame_type, payload, cs[0]) {
            warn!(
                "dropping frame type 0x{frame_type:02X}: bad checksum (expected 0x{:02X}, got 0x{:02X})",
                checksum(frame_type, payload),
                cs[0]
            );
            return Err(Error::InvalidChecksum);
        }

        let frame = ApiFrame {
            frame_type: FrameType::from(frame_type),
            payload: payload.to_vec(),
        };
        trace!(frame_type = ?frame.frame_type, len = length, "received API frame");
        Ok(frame)
    }

    /// Send an AT command without waiting for the response frame.
    ///
    /// Returns the frame ID the request was stamped with.
    pub async fn at_command(&mut self, command: AtCommand, parameter: &[u8]) -> Result<u8> {
        let frame_id = self.next_frame_id();
        let code = command.code();

        let mut payload = Vec::with_capacity(3 + parameter.len());
        payload.push(frame_id);
        payload.extend_from_slice(&code);
        payload.extend_from_slice(parameter);

        debug!(command = %command, frame_id, param_len = parameter.len(), "sending AT command");
        self.send_frame(FrameType::AtCommand, &payload).await?;
        Ok(frame_id)
    }

    /// Send an AT command and wait for its response.
    ///
    /// Pumps the receiver until the AT response carrying the issued frame
    /// ID arrives or `timeout` elapses. Frames of any other type received
    /// meanwhile are parked on the pending queue in arrival order; the
    /// owning device drains them through its frame router.
    ///
    /// Returns the response data (may be empty). A nonzero module status
    /// byte is [`Error::AtCommandError`]; an exhausted window is
    /// [`Error::ResponseTimeout`].
    pub async fn at_command_response(
        &mut self,
        command: AtCommand,
        parameter: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let frame_id = self.at_command(command, parameter).await?;
        let deadline = Instant::now() + timeout;

        loop {
            match self.receive_frame().await {
                Ok(frame) if frame.frame_type == FrameType::AtResponse => {
                    // Payload: [frame id, cmd hi, cmd lo, status, data...]
                    if frame.payload.len() < 4 {
                        warn!(len = frame.payload.len(), "runt AT response, ignoring");
                    } else if frame.payload[0] == frame_id {
                        let status = frame.payload[3];
                        if status != 0 {
                            debug!(command = %command, status, "AT command rejected");
                            return Err(Error::AtCommandError(status));
                        }
                        return Ok(frame.payload[4..].to_vec());
                    } else {
                        debug!(
                            expected = frame_id,
                            got = frame.payload[0],
                            "stale AT response, ignoring"
                        );
                    }
                }
                Ok(frame) => {
                    trace!(frame_type = ?frame.frame_type, "parking unsolicited frame");
                    self.pending.push_back(frame);
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => trace!(error = %e, "receive error while correlating"),
            }

            if Instant::now() >= deadline {
                warn!(command = %command, "timeout waiting for AT response");
                return Err(Error::ResponseTimeout);
            }
            sleep(POLL_DELAY).await;
        }
    }

    /// Pump the receiver until a frame of `frame_type` whose payload
    /// satisfies `matches` arrives, or `timeout` elapses.
    ///
    /// Every other frame received meanwhile is parked on the pending queue.
    pub async fn wait_for(
        &mut self,
        frame_type: FrameType,
        matches: impl Fn(&[u8]) -> bool,
        timeout: Duration,
    ) -> Result<ApiFrame> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.receive_frame().await {
                Ok(frame) if frame.frame_type == frame_type && matches(&frame.payload) => {
                    return Ok(frame);
                }
                Ok(frame) => {
                    trace!(frame_type = ?frame.frame_type, "parking unsolicited frame");
                    self.pending.push_back(frame);
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => trace!(error = %e, "receive error while waiting"),
            }

            if Instant::now() >= deadline {
                return Err(Error::ResponseTimeout);
            }
            sleep(POLL_DELAY).await;
        }
    }
}

/// Transport failures that ripping out the poll loop cannot fix.
fn is_fatal(e: &Error) -> bool {
    matches!(
        e,
        Error::NotConnected | Error::ConnectionLost | Error::Io(_) | Error::Transport(_)
    )
}

impl ApiSession {
    /// Fill `buf`, looping over bounded reads until it is full or a read
    /// window passes with no data. Returns the number of bytes read.
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self
                .transport
                .receive(&mut buf[filled..], self.read_timeout)
                .await
            {
                Ok(0) | Err(Error::Timeout) => break,
                Ok(n) => filled += n,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}
