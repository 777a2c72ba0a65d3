//! Wire format, scheme 1.
//!
//! ```text
//! byte 0         format tag, scheme id in the high nibble (0x10)
//! first value    64 raw bits
//! each record    ref:7 | changed:1
//!                  changed = 0  -> identical to the referenced value
//!                  changed = 1  -> long:1 | bucket:3 | ...
//!                    long = 0   -> (64 - L) bits of the delta, trailing = 0
//!                    long = 1   -> (sig - 1):6 | sig bits of (delta >> trailing)
//! sentinel       one record decoding to SENTINEL_BITS, then zero padding
//! ```
//!
//! `L` is `LEADING_ZEROS[bucket]`. Every constant below is part of the
//! format; changing any of them requires a new scheme id.

/// Scheme id stored in the high nibble of the first byte.
pub const SCHEME_ID: u8 = 1;

/// The first byte of every encoded stream.
pub const FORMAT_TAG: u8 = SCHEME_ID << 4;

/// Reserved NaN pattern marking end-of-stream.
pub const SENTINEL_BITS: u64 = 0x7FF8_0000_0000_0001;

/// Number of previous positions a record may reference.
pub const WINDOW: usize = 128;

/// Width of the reference id (`log2(WINDOW)`).
pub const REF_ID_BITS: u8 = 7;

/// Width of the leading-zero bucket id.
pub const BUCKET_ID_BITS: u8 = 3;

/// Width of the explicit significant-bit count in the long form.
pub const SIGNIFICANT_BITS_WIDTH: u8 = 6;

/// Deltas with at least this many trailing zeros use the long form.
pub const LONG_FORM_MIN_TRAILING: u8 = 6;

/// Leading-zero counts representable on the wire, indexed by bucket id.
/// Granularity coarsens as the count grows; the last entry is the cap.
pub const LEADING_ZEROS: [u8; 8] = [0, 2, 4, 6, 8, 12, 16, 24];

/// Header of a short-form record after the reference id: `changed = 1, long = 0`.
pub(crate) const SHORT_FORM_FLAGS: u64 = 0b10;

/// Header of a long-form record after the reference id: `changed = 1, long = 1`.
pub(crate) const LONG_FORM_FLAGS: u64 = 0b11;

/// Largest record the encoder can emit: a short form with `L = 0`.
pub const MAX_RECORD_BITS: usize = (REF_ID_BITS + 2 + BUCKET_ID_BITS) as usize + 64;

/// Maps a leading-zero count to the largest bucket whose count does not exceed it.
#[inline]
pub fn leading_bucket(leading_zeros: u32) -> u8 {
    let mut bucket = 0;
    for (i, &lz) in LEADING_ZEROS.iter().enumerate() {
        if u32::from(lz) <= leading_zeros {
            bucket = i;
        }
    }
    bucket as u8
}

/// Returns `true` if the first byte of a stream names this scheme.
#[inline]
pub fn is_supported_tag(tag: u8) -> bool {
    tag >> 4 == SCHEME_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_bucket_rounds_down() {
        assert_eq!(leading_bucket(0), 0);
        assert_eq!(leading_bucket(1), 0);
        assert_eq!(leading_bucket(2), 1);
        assert_eq!(leading_bucket(7), 3);
        assert_eq!(leading_bucket(11), 4);
        assert_eq!(leading_bucket(12), 5);
        assert_eq!(leading_bucket(23), 6);
        assert_eq!(leading_bucket(24), 7);
        assert_eq!(leading_bucket(63), 7);
    }

    #[test]
    fn test_quantized_leading_never_exceeds_actual() {
        for lz in 0..=64u32 {
            let quantized = LEADING_ZEROS[leading_bucket(lz) as usize];
            assert!(u32::from(quantized) <= lz);
        }
    }

    #[test]
    fn test_widths_are_consistent() {
        assert_eq!(1usize << REF_ID_BITS, WINDOW);
        assert_eq!(1usize << BUCKET_ID_BITS, LEADING_ZEROS.len());
        // The long form never needs to encode more than 64 - 6 significant bits.
        assert!(64 - LONG_FORM_MIN_TRAILING as u32 <= 1 << SIGNIFICANT_BITS_WIDTH);
        assert_eq!(MAX_RECORD_BITS, 76);
    }

    #[test]
    fn test_format_tag() {
        assert!(is_supported_tag(FORMAT_TAG));
        assert!(is_supported_tag(0x1F));
        assert!(!is_supported_tag(0x00));
        assert!(!is_supported_tag(0x20));
        assert!(f64::from_bits(SENTINEL_BITS).is_nan());
    }
}
