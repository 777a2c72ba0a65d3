//! Error types for encoding and decoding.

use thiserror::Error;

/// Error returned by [`Encoder::write`](crate::Encoder::write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// NaN cannot be stored; its bit pattern marks end-of-stream.
    #[error("unsupported value: NaN")]
    NaN,

    /// The stream was already flushed.
    #[error("cannot write after flush")]
    Finished,
}

/// Error returned while decoding a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The first byte does not name a supported scheme.
    #[error("unsupported format tag {0:#04x}")]
    UnsupportedFormat(u8),

    /// The stream ended before the end-of-stream marker.
    #[error("unexpected end of compressed stream")]
    UnexpectedEnd,

    /// A long-form record claims more than 64 bits of leading plus significant bits.
    #[error("malformed record: {significant} significant bits after {leading} leading zeros")]
    Malformed {
        /// Leading zero count from the bucket id.
        leading: u8,
        /// Significant bit count read from the stream.
        significant: u8,
    },
}
