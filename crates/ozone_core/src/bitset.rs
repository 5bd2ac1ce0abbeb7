//! # Bitset
//!
//! Fixed-length bit mask backed by `u64` words. The render core keeps one
//! sized to the world's structure count and clears it once per frame.

const WORD_BITS: usize = 64;

/// Fixed-length bit mask.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitset {
    /// Backing words, bit `i` lives in `words[i / 64]`.
    words: Vec<u64>,
    /// Number of addressable bits.
    len: usize,
}

impl Bitset {
    /// Creates a bitset of `len` cleared bits.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Number of addressable bits.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if the bitset addresses no bits.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grows the bitset to at least `len` bits. Never shrinks.
    pub fn ensure_len(&mut self, len: usize) {
        if len > self.len {
            self.words.resize(len.div_ceil(WORD_BITS), 0);
            self.len = len;
        }
    }

    /// Returns bit `index`. Out-of-range bits read as cleared.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Sets bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len, "bit {index} out of range (len {})", self.len);
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    /// Sets bit `index` and returns its previous value.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn test_and_set(&mut self, index: usize) -> bool {
        let was_set = self.get(index);
        self.set(index);
        was_set
    }

    /// Clears every bit.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear_all() {
        let mut bits = Bitset::new(130);
        bits.set(0);
        bits.set(64);
        bits.set(129);
        assert!(bits.get(0) && bits.get(64) && bits.get(129));
        assert!(!bits.get(1));
        assert_eq!(bits.count_ones(), 3);

        bits.clear_all();
        assert_eq!(bits.count_ones(), 0);
        assert_eq!(bits.len(), 130);
    }

    #[test]
    fn test_ensure_len_grows_only() {
        let mut bits = Bitset::new(10);
        bits.set(9);
        bits.ensure_len(200);
        assert_eq!(bits.len(), 200);
        assert!(bits.get(9));
        bits.ensure_len(5);
        assert_eq!(bits.len(), 200);
    }

    #[test]
    fn test_out_of_range_reads_cleared() {
        let bits = Bitset::new(3);
        assert!(!bits.get(1000));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_set_out_of_range_panics() {
        let mut bits = Bitset::new(3);
        bits.set(3);
    }
}
