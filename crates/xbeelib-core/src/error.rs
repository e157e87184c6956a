//! Error types for xbeelib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, frame-layer, and
//! command-layer errors are all captured here.

/// The error type for all xbeelib operations.
///
/// Variants cover the full range of failure modes encountered when talking
/// to an XBee module over its serial API: physical transport failures,
/// frame decode errors, command rejections, and timeouts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open/read/write failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed or unexpectedly-shaped frame from the module.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A single UART read window elapsed without any data arriving.
    ///
    /// This is the quiet-line case: no frame was in flight. Pollers treat
    /// it as "nothing to do" rather than as a failure.
    #[error("timeout waiting for data")]
    Timeout,

    /// The two-byte length field did not arrive in time.
    #[error("timeout reading frame length")]
    LengthTimeout,

    /// The frame data did not arrive in time.
    #[error("timeout reading frame data")]
    DataTimeout,

    /// The trailing checksum byte did not arrive in time.
    #[error("timeout reading frame checksum")]
    ChecksumTimeout,

    /// The first byte of a frame was not the `0x7E` start delimiter.
    ///
    /// Each garbage byte on the line costs one of these; the reader
    /// resynchronizes on the next delimiter it finds.
    #[error("invalid start delimiter: expected 0x7E, got 0x{0:02X}")]
    InvalidStartDelimiter(u8),

    /// Frame checksum validation failed.
    #[error("invalid frame checksum")]
    InvalidChecksum,

    /// A received frame declared a length outside the configured bound.
    #[error("frame length {length} exceeds maximum {max}")]
    LengthExceedsBuffer {
        /// Declared length (type byte + payload).
        length: u16,
        /// Configured maximum frame data size.
        max: u16,
    },

    /// An outbound frame would exceed the configured maximum frame size.
    #[error("frame of {length} bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Requested frame data size (type byte + payload).
        length: usize,
        /// Configured maximum frame data size.
        max: u16,
    },

    /// An AT command code was not recognized.
    #[error("invalid AT command: {0}")]
    InvalidCommand(String),

    /// The module answered an AT command with a nonzero status byte.
    #[error("AT command failed with status 0x{0:02X}")]
    AtCommandError(u8),

    /// No matching response arrived within the caller's window.
    #[error("timeout waiting for response")]
    ResponseTimeout,

    /// The module did not attach to the network within the attach window.
    #[error("timeout waiting for network attach")]
    AttachTimeout,

    /// A socket operation was answered with a nonzero status byte.
    #[error("socket operation failed with status 0x{status:02X}")]
    SocketFailure {
        /// Module-reported status byte.
        status: u8,
    },

    /// An invalid parameter was passed to a driver operation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested operation is not supported by this module family.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// No connection to the module has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the module was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
