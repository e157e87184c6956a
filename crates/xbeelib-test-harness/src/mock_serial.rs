//! Mock transport for deterministic testing of the protocol machinery.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs plus a raw RX byte queue for unsolicited frames.
//! This lets you test frame encoding, AT correlation, and socket flows
//! without real hardware.
//!
//! # Example
//!
//! ```
//! use xbeelib_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // Pre-load: when the driver sends this ATVR request, return this response.
//! mock.expect(
//!     &[0x7E, 0x00, 0x04, 0x08, 0x01, 0x56, 0x52, 0x4E],
//!     &[0x7E, 0x00, 0x08, 0x88, 0x01, 0x56, 0x52, 0x00, 0x12, 0x00, 0x00, 0xBC],
//! );
//! // Unsolicited traffic (a downlink, a status frame) can be queued directly.
//! mock.push_rx(&[0x7E, 0x00, 0x02, 0x8A, 0x06, 0x6F]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use xbeelib_core::error::{Error, Result};
use xbeelib_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to queue for reading once the matching request arrives.
    /// Empty for fire-and-forget requests.
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing protocol code without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; the paired
/// response bytes are appended to the RX queue, which `receive()` drains.
/// Unsolicited inbound traffic can be injected at any time with
/// [`push_rx`](MockTransport::push_rx).
///
/// If sent data does not match, or the expectation queue is exhausted, an
/// error is returned.
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be read.
    rx_queue: VecDeque<u8>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            rx_queue: VecDeque::new(),
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, `response` is
    /// queued for subsequent `receive()` calls.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Add an expected fire-and-forget request with no response.
    pub fn expect_send(&mut self, request: &[u8]) {
        self.expect(request, &[]);
    }

    /// Queue raw inbound bytes, independent of any request.
    ///
    /// Use this for unsolicited frames: downlinks, modem status, socket
    /// status reports.
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx_queue.extend(bytes);
    }

    /// Return all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Protocol(format!(
                    "unexpected send data: expected {:02X?}, got {:02X?}",
                    expectation.request, data
                )));
            }
            self.rx_queue.extend(expectation.response);
            Ok(())
        } else {
            Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            ))
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if self.rx_queue.is_empty() {
            return Err(Error::Timeout);
        }

        let mut n = 0;
        while n < buf.len() {
            match self.rx_queue.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    async fn flush_rx(&mut self) -> Result<()> {
        self.rx_queue.clear();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.rx_queue.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
