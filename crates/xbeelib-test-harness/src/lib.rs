//! xbeelib-test-harness: Mock transports for deterministic testing of the
//! protocol machinery.
//!
//! This crate provides [`MockTransport`] for unit and integration testing
//! of frame encoding, AT correlation, and the backend drivers without real
//! module hardware.

pub mod mock_serial;

pub use mock_serial::MockTransport;
