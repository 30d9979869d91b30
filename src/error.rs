//! Error types for rsocket-framing.

use thiserror::Error;

/// Main error type for all framing operations.
///
/// Every variant is fatal for the frame (and typically the connection)
/// that produced it: the codec never returns a partially decoded frame.
/// Incomplete input in the stream-framer path is *not* an error; it is
/// retained as leftover bytes until more data arrives.
#[derive(Debug, Error)]
pub enum FramingError {
    /// Malformed or out-of-range field detected at parse or emit time.
    ///
    /// The message names the offending field and value.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Frame type tag not defined by this codec.
    #[error("unsupported frame type: 0x{0:02x}")]
    UnsupportedFrameType(u16),

    /// A field encoder rejected a value (e.g. the UTF-8 encoder was
    /// handed bytes that are not valid UTF-8).
    #[error("encoder mismatch: {0}")]
    EncoderMismatch(String),
}

impl FramingError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        FramingError::InvariantViolation(msg.into())
    }

    pub(crate) fn encoder(msg: impl Into<String>) -> Self {
        FramingError::EncoderMismatch(msg.into())
    }
}

/// Result type alias using FramingError.
pub type Result<T> = std::result::Result<T, FramingError>;
