//! # floatxor
//!
//! Lossless compression for sequences of `f64` time-series values, in the
//! family of Facebook's Gorilla value encoding (VLDB 2015).
//!
//! ## Algorithm overview
//!
//! Gorilla XORs each value with the one before it and stores only the
//! non-zero middle of the result. Real series often repeat a value (or its
//! mantissa tail) from a few steps back rather than the immediately previous
//! one, so this codec XORs against a *reference* chosen from the last
//! [`WINDOW`](format::WINDOW) values:
//!
//! - The encoder keeps a [`HistoryIndex`]: 32 small rings of recent values,
//!   bucketed by the low five bits of their bit pattern. Values in the same
//!   bucket tend to XOR to a long run of trailing zeros, so the bucket is
//!   searched for the candidate with the most.
//! - Each record carries the reference id explicitly, so the decoder needs no
//!   index, only a ring of the last values addressed by that id.
//! - The leading-zero count is quantized to one of eight widths; deltas with
//!   a long run of trailing zeros also transmit an explicit width and drop
//!   those zeros.
//!
//! The layout is pinned in [`format`]. NaN cannot be stored: its bit
//! pattern terminates the stream. Infinities, signed zeros and subnormals
//! round-trip like any other value.
//!
//! ## Example
//!
//! ```rust
//! use floatxor::{Decoder, Encoder};
//!
//! let temperatures = [64.2, 49.4, 48.8, 49.4, 64.2, 64.2];
//!
//! let mut encoder = Encoder::new();
//! for &t in &temperatures {
//!     encoder.write(t).unwrap();
//! }
//! encoder.flush();
//! let (bytes, err) = encoder.bytes();
//! assert!(err.is_none());
//!
//! let decoded = Decoder::decode(bytes).unwrap();
//! assert_eq!(decoded, temperatures);
//! ```
//!
//! ## Lazy iteration
//!
//! ```rust
//! # use floatxor::{Decoder, Encoder};
//! let bytes = Encoder::encode(&[1.0, 1.5, 2.0]).unwrap();
//! for result in Decoder::iter(&bytes) {
//!     let value = result.unwrap();
//!     println!("{value}");
//! }
//! ```

pub mod bitbuffer;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod history;
pub mod ring;

// Re-export primary types at the crate root.
pub use decoder::{Decoder, DecoderIter};
pub use encoder::{Encoder, EncoderConfig, DEFAULT_MIN_TRAILING_BITS};
pub use error::{DecodeError, EncodeError};
pub use history::HistoryIndex;
