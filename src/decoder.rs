use tracing::debug;

use crate::bitbuffer::BitReader;
use crate::error::DecodeError;
use crate::format::{
    is_supported_tag, BUCKET_ID_BITS, LEADING_ZEROS, REF_ID_BITS, SENTINEL_BITS,
    SIGNIFICANT_BITS_WIDTH, WINDOW,
};
use crate::ring::Ring;

/// Reconstructs `f64` values from a stream written by [`Encoder`](crate::Encoder).
///
/// Values are pulled one at a time: [`advance`](Self::advance) decodes the
/// next value and [`value`](Self::value) returns it. Errors are sticky; once
/// one is recorded `advance` keeps returning `false` without reading.
///
/// # Example
/// ```
/// use floatxor::{Decoder, Encoder};
///
/// let bytes = Encoder::encode(&[21.5, 21.5, 22.0]).unwrap();
///
/// let mut decoder = Decoder::new(&bytes);
/// let mut values = Vec::new();
/// while decoder.advance() {
///     values.push(decoder.value());
/// }
/// assert!(decoder.error().is_none());
/// assert_eq!(values, vec![21.5, 21.5, 22.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    reader: BitReader<'a>,
    /// Bit patterns of the last `WINDOW` positions, addressed by reference id.
    window: Ring<u64, WINDOW>,
    /// Most recently decoded bit pattern.
    value: u64,
    /// Number of values decoded so far.
    position: u64,
    /// Leading zeros of the last delta.
    leading: u8,
    /// Trailing zeros of the last delta.
    trailing: u8,
    first: bool,
    finished: bool,
    err: Option<DecodeError>,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over `buf`. A malformed header is reported through
    /// [`error`](Self::error).
    pub fn new(buf: &'a [u8]) -> Self {
        let mut decoder = Self {
            reader: BitReader::new(&[]),
            window: Ring::new(),
            value: SENTINEL_BITS,
            position: 0,
            leading: 0,
            trailing: 0,
            first: true,
            finished: false,
            err: None,
        };
        // Any failure is kept as the sticky error.
        let _ = decoder.set_bytes(buf);
        decoder
    }

    /// Decodes every value in `buf`.
    pub fn decode(buf: &[u8]) -> Result<Vec<f64>, DecodeError> {
        let mut decoder = Decoder::new(buf);
        let mut values = Vec::new();
        while decoder.advance() {
            values.push(decoder.value());
        }
        match decoder.err {
            Some(err) => Err(err),
            None => Ok(values),
        }
    }

    /// Returns an iterator that lazily decodes the values in `buf`.
    pub fn iter(buf: &'a [u8]) -> DecoderIter<'a> {
        DecoderIter {
            decoder: Decoder::new(buf),
            done: false,
        }
    }

    /// Points the decoder at a new stream and reads its first value.
    ///
    /// An empty buffer, or one holding only the format byte, is an empty
    /// stream. All history from a previous stream is dropped.
    pub fn set_bytes(&mut self, buf: &'a [u8]) -> Result<(), DecodeError> {
        self.window.clear();
        self.position = 0;
        self.leading = 0;
        self.trailing = 0;
        self.first = true;
        self.finished = false;
        self.err = None;
        self.value = SENTINEL_BITS;
        self.reader = BitReader::new(&[]);

        let result = self.read_header(buf);
        if let Err(err) = result {
            debug!(error = %err, "float stream header rejected");
            self.err = Some(err);
        }
        result
    }

    fn read_header(&mut self, buf: &'a [u8]) -> Result<(), DecodeError> {
        let Some((&tag, payload)) = buf.split_first() else {
            return Ok(());
        };
        if !is_supported_tag(tag) {
            return Err(DecodeError::UnsupportedFormat(tag));
        }
        if payload.is_empty() {
            return Ok(());
        }
        self.reader = BitReader::new(payload);
        self.value = self.reader.read_bits(64).ok_or(DecodeError::UnexpectedEnd)?;
        Ok(())
    }

    /// Decodes the next value. Returns `false` at the end of the stream or
    /// once an error has been recorded.
    pub fn advance(&mut self) -> bool {
        if self.err.is_some() || self.finished {
            return false;
        }

        let bits = if self.first {
            self.first = false;
            self.value
        } else {
            match self.read_record() {
                Ok(bits) => bits,
                Err(err) => {
                    debug!(position = self.position, error = %err, "float stream decode failed");
                    self.err = Some(err);
                    return false;
                }
            }
        };

        if bits == SENTINEL_BITS {
            self.finished = true;
            return false;
        }
        self.value = bits;
        self.window.push(bits);
        self.position = self.position.wrapping_add(1);
        true
    }

    /// Reads one record and returns the bit pattern it encodes.
    fn read_record(&mut self) -> Result<u64, DecodeError> {
        let ref_id = self.read(REF_ID_BITS)?;
        let reference = self.window.slot(ref_id as usize);

        if !self.read_bit()? {
            return Ok(reference);
        }

        let long = self.read_bit()?;
        let bucket = self.read(BUCKET_ID_BITS)?;
        let leading = LEADING_ZEROS[bucket as usize];

        let (significant, trailing) = if long {
            let significant = self.read(SIGNIFICANT_BITS_WIDTH)? as u8 + 1;
            let trailing = 64u8
                .checked_sub(leading + significant)
                .ok_or(DecodeError::Malformed {
                    leading,
                    significant,
                })?;
            (significant, trailing)
        } else {
            (64 - leading, 0)
        };
        self.leading = leading;
        self.trailing = trailing;

        let payload = self.read(significant)?;
        Ok(reference ^ (payload << trailing))
    }

    #[inline]
    fn read(&mut self, n: u8) -> Result<u64, DecodeError> {
        self.reader.read_bits(n).ok_or(DecodeError::UnexpectedEnd)
    }

    #[inline]
    fn read_bit(&mut self) -> Result<bool, DecodeError> {
        self.reader.read_bit().ok_or(DecodeError::UnexpectedEnd)
    }

    /// Returns the most recently decoded value.
    #[inline]
    pub fn value(&self) -> f64 {
        f64::from_bits(self.value)
    }

    /// Returns the recorded decoding error, if any.
    pub fn error(&self) -> Option<&DecodeError> {
        self.err.as_ref()
    }

    /// Returns `true` once the end-of-stream marker has been read.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Leading and trailing zero counts of the last delta read in full.
    pub fn last_widths(&self) -> (u8, u8) {
        (self.leading, self.trailing)
    }
}

// ── Lazy iterator ──────────────────────────────────────────────────────

/// A lazy iterator over the values of a stream.
///
/// Yields `Ok(value)` for every value, then ends; a decoding error is
/// yielded once as `Err` and ends the iteration.
#[derive(Debug, Clone)]
pub struct DecoderIter<'a> {
    decoder: Decoder<'a>,
    done: bool,
}

impl<'a> Iterator for DecoderIter<'a> {
    type Item = Result<f64, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.decoder.advance() {
            return Some(Ok(self.decoder.value()));
        }
        self.done = true;
        self.decoder.error().map(|err| Err(*err))
    }
}
