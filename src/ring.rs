/// A fixed-capacity ring buffer with a write cursor.
///
/// Pushing into a full ring overwrites the oldest slot. Slots live inline, so
/// a ring never allocates after construction.
///
/// When every position of a stream is pushed in order starting from zero,
/// position `p` lives in slot `p % N` until position `p + N` overwrites it.
/// The encoder and decoder windows both rely on this to address values by
/// the reference id carried on the wire.
#[derive(Debug, Clone)]
pub struct Ring<T, const N: usize> {
    slots: [T; N],
    /// Slot the next push writes to.
    head: usize,
    /// Number of occupied slots (saturates at `N`).
    len: usize,
}

impl<T: Copy + Default, const N: usize> Ring<T, N> {
    pub fn new() -> Self {
        assert!(N > 0, "ring capacity must be non-zero");
        Self {
            slots: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `value`, overwriting the oldest entry when full.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.slots[self.head] = value;
        self.head = (self.head + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    /// Returns the value stored in `slot` (taken modulo `N`). Slots that were
    /// never written hold `T::default()`.
    #[inline]
    pub fn slot(&self, slot: usize) -> T {
        self.slots[slot % N]
    }

    /// Iterates over the occupied slots from the most recently pushed to the oldest.
    pub fn iter_newest(&self) -> impl Iterator<Item = T> + '_ {
        (1..=self.len).map(move |back| self.slots[(self.head + N - back) % N])
    }

    /// Returns the ring to its just-constructed state.
    pub fn clear(&mut self) {
        self.slots = [T::default(); N];
        self.head = 0;
        self.len = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_iterate_newest_first() {
        let mut ring: Ring<u32, 4> = Ring::new();
        assert!(ring.is_empty());
        ring.push(1);
        ring.push(2);
        ring.push(3);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter_newest().collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn test_overwrites_oldest_when_full() {
        let mut ring: Ring<u32, 3> = Ring::new();
        for v in 1..=5 {
            ring.push(v);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.capacity(), 3);
        assert_eq!(ring.iter_newest().collect::<Vec<_>>(), vec![5, 4, 3]);
    }

    #[test]
    fn test_slots_follow_push_order() {
        let mut ring: Ring<u64, 4> = Ring::new();
        for position in 0..10u64 {
            ring.push(position * 100);
            assert_eq!(ring.slot((position % 4) as usize), position * 100);
        }
        // Positions 6..=9 are still resident.
        for position in 6..10u64 {
            assert_eq!(ring.slot(position as usize), position * 100);
        }
    }

    #[test]
    fn test_unwritten_slot_is_default() {
        let ring: Ring<u64, 8> = Ring::new();
        assert_eq!(ring.slot(5), 0);
    }

    #[test]
    fn test_clear() {
        let mut ring: Ring<u8, 2> = Ring::new();
        ring.push(7);
        ring.push(8);
        ring.push(9);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.iter_newest().count(), 0);
        ring.push(1);
        assert_eq!(ring.slot(0), 1);
    }
}
