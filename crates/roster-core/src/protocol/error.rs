//! Protocol error types.

/// Maximum frame size: 16 MiB.
///
/// A length prefix above this is treated as a protocol violation and the
/// connection is closed; it is never used to size an allocation.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Result alias for framing operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Transport-level protocol failure.
///
/// Both variants are fatal to the connection they occur on. Per-message
/// payload problems are [`super::messages::DecodeError`] instead and keep
/// the connection alive.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The length prefix exceeded the negotiated maximum.
    #[error("frame of {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge {
        /// Declared or actual payload size.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// The underlying stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
