use tracing::{debug, warn};

use crate::bitbuffer::BitBuffer;
use crate::error::EncodeError;
use crate::format::{
    leading_bucket, BUCKET_ID_BITS, FORMAT_TAG, LEADING_ZEROS, LONG_FORM_FLAGS,
    LONG_FORM_MIN_TRAILING, REF_ID_BITS, SENTINEL_BITS, SHORT_FORM_FLAGS, SIGNIFICANT_BITS_WIDTH,
    WINDOW,
};
use crate::history::HistoryIndex;
use crate::ring::Ring;

/// Default minimum trailing-zero score a history candidate must beat.
///
/// Any delta with more trailing zeros than this takes the long form, which
/// drops those zeros from the payload.
pub const DEFAULT_MIN_TRAILING_BITS: u32 = LONG_FORM_MIN_TRAILING as u32 - 1;

/// Encoder tuning. None of these settings affect the wire format: streams
/// written with any configuration decode with the same [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Bytes pre-allocated for the output buffer.
    pub capacity: usize,
    /// How many previous positions the history search may look back.
    /// Clamped to `1..=WINDOW`.
    pub window: u64,
    /// A history candidate is used only if its XOR has more trailing zeros
    /// than this; otherwise the previous value is the reference.
    pub min_trailing_bits: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            window: WINDOW as u64,
            min_trailing_bits: DEFAULT_MIN_TRAILING_BITS,
        }
    }
}

/// Compresses a sequence of `f64` values.
///
/// Each value after the first is XOR-ed against a reference chosen from the
/// last [`WINDOW`] values: the [`HistoryIndex`] proposes the candidate whose
/// XOR has the longest run of trailing zeros, and the previous value is used
/// when no candidate qualifies. Only the reference id and the significant
/// bits of the XOR are written.
///
/// # Example
/// ```
/// use floatxor::{Decoder, Encoder};
///
/// let mut encoder = Encoder::new();
/// encoder.write(12.0).unwrap();
/// encoder.write(12.5).unwrap();
/// encoder.write(12.0).unwrap();
/// encoder.flush();
///
/// let (bytes, err) = encoder.bytes();
/// assert!(err.is_none());
/// assert_eq!(Decoder::decode(bytes).unwrap(), vec![12.0, 12.5, 12.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Encoder {
    buf: BitBuffer,
    history: HistoryIndex,
    /// Bit patterns of the last `WINDOW` positions; position `p` is in slot `p % WINDOW`.
    window: Ring<u64, WINDOW>,
    /// Position of the next value.
    position: u64,
    /// Leading zeros of the last emitted delta.
    leading: u8,
    /// Trailing zeros of the last emitted delta.
    trailing: u8,
    first: bool,
    finished: bool,
    err: Option<EncodeError>,
    config: EncoderConfig,
}

impl Encoder {
    /// Creates a new `Encoder` with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    /// Creates a new `Encoder` whose buffer is pre-allocated to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(EncoderConfig {
            capacity,
            ..EncoderConfig::default()
        })
    }

    pub fn with_config(config: EncoderConfig) -> Self {
        let config = EncoderConfig {
            window: config.window.clamp(1, WINDOW as u64),
            ..config
        };
        let mut buf = BitBuffer::with_capacity(config.capacity);
        buf.write_bits(u64::from(FORMAT_TAG), 8);
        Self {
            buf,
            history: HistoryIndex::new(),
            window: Ring::new(),
            position: 0,
            leading: 0,
            trailing: 0,
            first: true,
            finished: false,
            err: None,
            config,
        }
    }

    /// Encodes `values` and flushes, returning the finished stream.
    pub fn encode(values: &[f64]) -> Result<Vec<u8>, EncodeError> {
        let mut encoder = Self::with_capacity(values.len() * 8 + 16);
        for &v in values {
            encoder.write(v)?;
        }
        encoder.into_bytes()
    }

    /// Appends `v` to the stream.
    ///
    /// NaN is rejected and the error is kept: every later `write` returns it,
    /// and [`bytes`](Self::bytes) reports it. The stream still flushes and
    /// decodes up to the last accepted value.
    pub fn write(&mut self, v: f64) -> Result<(), EncodeError> {
        if self.finished {
            return Err(EncodeError::Finished);
        }
        if let Some(err) = self.err {
            return Err(err);
        }
        if v.is_nan() {
            warn!(position = self.position, "rejected NaN value");
            self.err = Some(EncodeError::NaN);
            return Err(EncodeError::NaN);
        }
        self.append(v.to_bits());
        Ok(())
    }

    /// Terminates the stream with the end-of-stream marker and pads it to a
    /// whole byte. Calling it again has no effect.
    pub fn flush(&mut self) {
        if self.finished {
            return;
        }
        let values = self.position;
        self.append(SENTINEL_BITS);
        self.buf.pad_to_byte();
        self.finished = true;
        debug!(values, bytes = self.buf.as_bytes().len(), "float stream flushed");
    }

    /// Returns the encoded bytes (format byte included) and the first error
    /// recorded by [`write`](Self::write), if any.
    pub fn bytes(&self) -> (&[u8], Option<&EncodeError>) {
        (self.buf.as_bytes(), self.err.as_ref())
    }

    /// Returns the recorded write error, if any.
    pub fn error(&self) -> Option<&EncodeError> {
        self.err.as_ref()
    }

    /// Flushes and returns the stream, or the recorded write error.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, EncodeError> {
        self.flush();
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.buf.into_bytes()),
        }
    }

    /// Returns the number of values accepted so far.
    pub fn len(&self) -> usize {
        if self.finished {
            // The sentinel took a position too.
            self.position.saturating_sub(1) as usize
        } else {
            self.position as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Leading and trailing zero counts of the last delta written in full.
    pub fn last_widths(&self) -> (u8, u8) {
        (self.leading, self.trailing)
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Returns the encoder to its just-constructed state. The configuration is kept.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.buf.write_bits(u64::from(FORMAT_TAG), 8);
        self.history.clear();
        self.window.clear();
        self.position = 0;
        self.leading = 0;
        self.trailing = 0;
        self.first = true;
        self.finished = false;
        self.err = None;
    }

    // ── internal helpers ───────────────────────────────────────────────

    fn append(&mut self, bits: u64) {
        if self.first {
            self.buf.write_bits(bits, 64);
            self.first = false;
        } else {
            self.append_record(bits);
        }
        self.window.push(bits);
        self.history.add_record(bits, self.position);
        self.position = self.position.wrapping_add(1);
    }

    /// Writes one record against the best available reference.
    ///
    /// | delta == 0  | `ref:7 0`                                        | 8 bits       |
    /// | trailing < 6 | `ref:7 1 0 bucket:3` + `64 - L` bits of delta   | 76 - L bits  |
    /// | otherwise   | `ref:7 1 1 bucket:3 (sig-1):6` + `sig` bits      | 18 + sig     |
    fn append_record(&mut self, bits: u64) {
        let reference = self
            .history
            .best_reference(
                bits,
                self.position,
                self.config.window,
                self.config.min_trailing_bits,
            )
            .unwrap_or_else(|| self.position.wrapping_sub(1));
        let ref_id = reference % WINDOW as u64;
        let delta = bits ^ self.window.slot(ref_id as usize);

        if delta == 0 {
            self.buf.write_bits(ref_id << 1, REF_ID_BITS + 1);
            return;
        }

        let bucket = leading_bucket(delta.leading_zeros());
        let leading = LEADING_ZEROS[bucket as usize];
        let trailing = delta.trailing_zeros() as u8;

        if trailing < LONG_FORM_MIN_TRAILING {
            let header = (((ref_id << 2) | SHORT_FORM_FLAGS) << BUCKET_ID_BITS) | u64::from(bucket);
            self.buf.write_bits(header, REF_ID_BITS + 2 + BUCKET_ID_BITS);
            self.buf.write_bits(delta, 64 - leading);
            self.leading = leading;
            self.trailing = 0;
        } else {
            let significant = 64 - leading - trailing;
            let header = (((((ref_id << 2) | LONG_FORM_FLAGS) << BUCKET_ID_BITS)
                | u64::from(bucket))
                << SIGNIFICANT_BITS_WIDTH)
                | u64::from(significant - 1);
            self.buf.write_bits(
                header,
                REF_ID_BITS + 2 + BUCKET_ID_BITS + SIGNIFICANT_BITS_WIDTH,
            );
            self.buf.write_bits(delta >> trailing, significant);
            self.leading = leading;
            self.trailing = trailing;
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
