use crate::ring::Ring;

/// Number of buckets; a value lands in bucket `bits & BUCKET_MASK`.
pub const BUCKET_COUNT: usize = 32;

/// Mask selecting the bucket from the low bits of a bit pattern.
pub const BUCKET_MASK: u64 = BUCKET_COUNT as u64 - 1;

/// Records retained per bucket.
pub const BUCKET_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Record {
    bits: u64,
    position: u64,
}

/// Bounded index of recently encoded values, used by the encoder to pick an
/// XOR reference.
///
/// Values sharing their low five bits tend to share the tail of the mantissa,
/// so their XOR ends in a long run of zeros. Bucketing on those bits narrows
/// the search to at most [`BUCKET_CAPACITY`] candidates per lookup. The result
/// is a good reference, not necessarily the best one in the whole window.
#[derive(Debug, Clone)]
pub struct HistoryIndex {
    buckets: [Ring<Record, BUCKET_CAPACITY>; BUCKET_COUNT],
}

impl HistoryIndex {
    pub fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|_| Ring::new()),
        }
    }

    #[inline]
    fn bucket(bits: u64) -> usize {
        (bits & BUCKET_MASK) as usize
    }

    /// Records that the value `bits` was written at `position`.
    #[inline]
    pub fn add_record(&mut self, bits: u64, position: u64) {
        self.buckets[Self::bucket(bits)].push(Record { bits, position });
    }

    /// Returns the position of the stored value whose XOR with `bits` has the
    /// most trailing zeros, considering only records at most `window - 1`
    /// positions before `position`.
    ///
    /// Ties go to the most recently inserted record. Returns `None` when no
    /// candidate scores more than `min_trailing_bits`; the caller then falls
    /// back to the previous value.
    pub fn best_reference(
        &self,
        bits: u64,
        position: u64,
        window: u64,
        min_trailing_bits: u32,
    ) -> Option<u64> {
        let mut best: Option<u64> = None;
        let mut best_trailing = min_trailing_bits;
        for record in self.buckets[Self::bucket(bits)].iter_newest() {
            let age = position.wrapping_sub(record.position);
            if age == 0 || age >= window {
                continue;
            }
            let trailing = (bits ^ record.bits).trailing_zeros();
            if trailing > best_trailing {
                best_trailing = trailing;
                best = Some(record.position);
            }
        }
        best
    }

    /// Returns the number of records currently held across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Ring::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Ring::is_empty)
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }
}

impl Default for HistoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: u64 = 128;

    #[test]
    fn test_empty_index_has_no_reference() {
        let index = HistoryIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.best_reference(42.0f64.to_bits(), 1, WINDOW, 0), None);
    }

    #[test]
    fn test_identical_value_is_best() {
        let mut index = HistoryIndex::new();
        index.add_record(12.5f64.to_bits(), 0);
        index.add_record(99.0f64.to_bits(), 1);
        index.add_record(13.5f64.to_bits(), 2);
        assert_eq!(index.best_reference(12.5f64.to_bits(), 3, WINDOW, 5), Some(0));
    }

    #[test]
    fn test_only_matching_bucket_is_searched() {
        let mut index = HistoryIndex::new();
        // Same upper bits, different bucket.
        index.add_record(0xABCD_0000_0000_0001, 0);
        assert_eq!(index.best_reference(0xABCD_0000_0000_0002, 1, WINDOW, 0), None);
    }

    #[test]
    fn test_maximizes_trailing_zeros() {
        let mut index = HistoryIndex::new();
        index.add_record(0x0000_0000_0000_0100, 0); // xor 0x300, 8 trailing
        index.add_record(0x0000_0000_0001_0000, 1); // xor 0x1_0200, 9 trailing
        index.add_record(0x0000_0000_0000_4000, 2); // xor 0x4200, 9 trailing
        let target = 0x0000_0000_0000_0200;
        // Positions 1 and 2 tie at 9; the newer one wins.
        assert_eq!(index.best_reference(target, 3, WINDOW, 0), Some(2));
    }

    #[test]
    fn test_ties_go_to_most_recent() {
        let mut index = HistoryIndex::new();
        let v = 7.25f64.to_bits();
        index.add_record(v, 10);
        index.add_record(v, 11);
        index.add_record(v, 12);
        assert_eq!(index.best_reference(v, 13, WINDOW, 0), Some(12));
    }

    #[test]
    fn test_threshold_must_be_exceeded() {
        let mut index = HistoryIndex::new();
        index.add_record(0b1_0000_0000, 0);
        let target = 0b10_0000_0000; // xor has 8 trailing zeros
        assert_eq!(index.best_reference(target, 1, WINDOW, 8), None);
        assert_eq!(index.best_reference(target, 1, WINDOW, 7), Some(0));
    }

    #[test]
    fn test_window_excludes_old_records() {
        let mut index = HistoryIndex::new();
        let v = 3.0f64.to_bits();
        index.add_record(v, 0);
        assert_eq!(index.best_reference(v, 127, WINDOW, 0), Some(0));
        assert_eq!(index.best_reference(v, 128, WINDOW, 0), None);
        assert_eq!(index.best_reference(v, 5, 4, 0), None);
    }

    #[test]
    fn test_window_across_position_wraparound() {
        let mut index = HistoryIndex::new();
        let v = 3.0f64.to_bits();
        index.add_record(v, u64::MAX - 1);
        assert_eq!(index.best_reference(v, 3, WINDOW, 0), Some(u64::MAX - 1));
    }

    #[test]
    fn test_bucket_overwrites_oldest() {
        let mut index = HistoryIndex::new();
        let target = 1.0f64.to_bits();
        index.add_record(target, 0);
        // Fill the same bucket with values that only match a few trailing bits.
        for position in 1..=BUCKET_CAPACITY as u64 {
            index.add_record(target ^ (1 << 5) ^ (position << 40), position);
        }
        assert_eq!(index.len(), BUCKET_CAPACITY);
        let found = index.best_reference(target, 20, WINDOW, 0);
        assert_ne!(found, Some(0));
        assert!(found.is_some());
    }

    #[test]
    fn test_clear() {
        let mut index = HistoryIndex::new();
        index.add_record(1.0f64.to_bits(), 0);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.best_reference(1.0f64.to_bits(), 1, WINDOW, 0), None);
    }
}
