use core::fmt::{self, Debug, Formatter};
use core::iter::{self, FusedIterator};
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};
use tracing::trace;

/// Width of a storage word in bits.
pub const WORD_BITS: u32 = u64::BITS;

/// Below this many words the word store grows to the next power of two,
/// at or above it capacity grows in 25% steps.
pub(crate) const GROWTH_THRESHOLD: usize = 256;

/// Computes the number of words needed to cover `size` bits.
///
/// # Examples
/// ```
/// use hex_bitmap::word_count;
///
/// assert_eq!(word_count(0), 0);
/// assert_eq!(word_count(64), 1);
/// assert_eq!(word_count(65), 2);
/// ```
pub const fn word_count(size: u32) -> usize {
    size.div_ceil(WORD_BITS) as usize
}

/// Translates a 1-based bit position into `(word index, bit offset)`, where
/// the offset counts from the most significant bit of the word.
///
/// Position 1 is the MSB of word 0, position 64 its LSB and position 65 the
/// MSB of word 1. `x` must be at least 1.
#[inline]
pub(crate) const fn locate(x: u32) -> (usize, u32) {
    debug_assert!(x != 0);
    let offset = x - 1;
    ((offset / WORD_BITS) as usize, offset % WORD_BITS)
}

/// A word with exactly the bit at `bit_offset` set, counted from the MSB.
#[inline]
pub(crate) const fn mask(bit_offset: u32) -> u64 {
    0x8000_0000_0000_0000 >> bit_offset
}

/// Keeps the bits of the word holding position `size` that are `<= size`.
#[inline]
pub(crate) const fn tail_mask(size: u32) -> u64 {
    let (_, bit_offset) = locate(size);
    !0u64 << (63 - bit_offset)
}

/// Capacity (in words) to allocate when the word store must hold `needed`
/// words and currently has room for `current`.
pub(crate) fn next_capacity(current: usize, needed: usize) -> usize {
    if needed < GROWTH_THRESHOLD {
        return (needed + 1).next_power_of_two();
    }

    let mut capacity = current.max(GROWTH_THRESHOLD);
    while capacity < needed + 1 {
        capacity += (capacity + 3 * GROWTH_THRESHOLD) / 4;
    }
    capacity
}

#[inline]
const fn position(word_idx: usize, offset: u32) -> u32 {
    word_idx as u32 * WORD_BITS + offset
}

fn popcount(words: &[u64]) -> usize {
    words.iter().map(|w| w.count_ones() as usize).sum()
}

/// A dense, growable set of 1-based bit positions.
///
/// `size` is the highest position currently declared usable; every query
/// treats positions above it as absent. Bits are stored MSB-first in a
/// vector of `u64` words which only grows, except through [`and`],
/// [`and_not`] and [`clear`].
///
/// The type does no internal synchronization. Share it across threads
/// behind a lock.
///
/// [`and`]: Bitmap::and
/// [`and_not`]: Bitmap::and_not
/// [`clear`]: Bitmap::clear
#[derive(Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "crate::HexBitmap", try_from = "crate::HexBitmap")
)]
pub struct Bitmap {
    pub(crate) size: u32,
    pub(crate) words: Vec<u64>,
}

impl Bitmap {
    /// Creates a bitmap declaring `size` bits, all unset.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let bitmap = Bitmap::new(100);
    /// assert_eq!(bitmap.size(), 100);
    /// assert_eq!(bitmap.word_len(), 2);
    /// assert_eq!(bitmap.count(), 0);
    /// ```
    pub fn new(size: u32) -> Self {
        let mut bitmap = Self::default();
        bitmap.grow(size);
        bitmap
    }

    /// Returns the highest addressable position.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the number of words in the word store.
    #[inline]
    pub fn word_len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if no position in `[1, size]` is set.
    pub fn is_empty(&self) -> bool {
        self.min().is_none()
    }

    /// Sets the declared size to `desired_bit` and grows the word store to
    /// cover it.
    ///
    /// The word store never shrinks here, so lowering the size keeps the
    /// words and merely hides the positions above it.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::default();
    /// bitmap.grow(130);
    /// assert_eq!(bitmap.size(), 130);
    /// assert_eq!(bitmap.word_len(), 3);
    /// ```
    pub fn grow(&mut self, desired_bit: u32) {
        if desired_bit > self.size {
            self.clean_unused_bits();
        }
        self.size = desired_bit;
        if desired_bit > 0 {
            let (word_idx, _) = locate(desired_bit);
            self.grow_words(word_idx);
        }
    }

    /// Sets the bit at position `x`, growing the bitmap if necessary.
    ///
    /// If `x` lies past the current size, the size is raised to `x`.
    ///
    /// # Panics
    /// Panics if `x == 0`.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(8);
    /// bitmap.set(3);
    /// assert!(bitmap.contains(3));
    ///
    /// bitmap.set(200);
    /// assert_eq!(bitmap.size(), 200);
    /// assert!(bitmap.contains(200));
    /// ```
    #[inline]
    pub fn set(&mut self, x: u32) {
        assert!(x != 0, "Bit position 0 is not addressable");
        if x > self.size {
            self.clean_unused_bits();
            self.size = x;
        }
        let (word_idx, bit_offset) = locate(x);
        self.grow_words(word_idx);
        self.words[word_idx] |= mask(bit_offset);
    }

    /// Unsets the bit at position `x`. The bitmap is never shrunk.
    ///
    /// # Panics
    /// Panics if `x == 0`.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(8);
    /// bitmap.set(3);
    /// bitmap.remove(3);
    /// assert!(!bitmap.contains(3));
    /// assert_eq!(bitmap.size(), 8);
    /// ```
    #[inline]
    pub fn remove(&mut self, x: u32) {
        assert!(x != 0, "Bit position 0 is not addressable");
        let (word_idx, bit_offset) = locate(x);
        if let Some(word) = self.words.get_mut(word_idx) {
            *word &= !mask(bit_offset);
        }
    }

    /// Returns `true` if position `x` is set. Positions past the size are
    /// never contained.
    ///
    /// # Panics
    /// Panics if `x == 0`.
    #[inline]
    pub fn contains(&self, x: u32) -> bool {
        assert!(x != 0, "Bit position 0 is not addressable");
        if x > self.size {
            return false;
        }
        let (word_idx, bit_offset) = locate(x);
        self.words
            .get(word_idx)
            .is_some_and(|word| word & mask(bit_offset) != 0)
    }

    /// Sets every bit of every word, including the padding past the size in
    /// the last word.
    ///
    /// Queries still ignore that padding, and raising the size later clears
    /// it first.
    pub fn ones(&mut self) {
        self.words.fill(!0);
    }

    /// Zeroes and drops all words and resets the size to 0.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.words.clear();
        self.size = 0;
    }

    /// Returns the smallest set position, or `None` if nothing is set.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(300);
    /// assert_eq!(bitmap.min(), None);
    /// bitmap.set(170);
    /// bitmap.set(77);
    /// assert_eq!(bitmap.min(), Some(77));
    /// ```
    pub fn min(&self) -> Option<u32> {
        (0..self.live_len()).find_map(|idx| {
            let word = self.live_word(idx);
            (word != 0).then(|| position(idx, word.leading_zeros() + 1))
        })
    }

    /// Returns the largest set position, or `None` if nothing is set.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(300);
    /// bitmap.set(77);
    /// bitmap.set(170);
    /// assert_eq!(bitmap.max(), Some(170));
    /// ```
    pub fn max(&self) -> Option<u32> {
        (0..self.live_len()).rev().find_map(|idx| {
            let word = self.live_word(idx);
            (word != 0).then(|| position(idx, WORD_BITS - word.trailing_zeros()))
        })
    }

    /// Returns the smallest unset position in `[1, size]`, or `None` if all
    /// of them are set.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(70);
    /// bitmap.ones();
    /// assert_eq!(bitmap.min_zero(), None);
    /// bitmap.remove(66);
    /// assert_eq!(bitmap.min_zero(), Some(66));
    /// ```
    pub fn min_zero(&self) -> Option<u32> {
        (0..self.live_len()).find_map(|idx| {
            let word = !self.words[idx] & self.live_mask(idx);
            (word != 0).then(|| position(idx, word.leading_zeros() + 1))
        })
    }

    /// Returns the largest unset position in `[1, size]`, or `None` if all
    /// of them are set.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(70);
    /// bitmap.ones();
    /// assert_eq!(bitmap.max_zero(), None);
    /// bitmap.remove(5);
    /// assert_eq!(bitmap.max_zero(), Some(5));
    /// ```
    pub fn max_zero(&self) -> Option<u32> {
        (0..self.live_len()).rev().find_map(|idx| {
            let word = !self.words[idx] & self.live_mask(idx);
            (word != 0).then(|| position(idx, WORD_BITS - word.trailing_zeros()))
        })
    }

    /// Counts the set positions in `[1, until]`. `until` is clamped to the
    /// size, so `count_to(size)` equals [`count`](Bitmap::count).
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let bitmap: Bitmap = [2, 5, 64, 65].into_iter().collect();
    /// assert_eq!(bitmap.count_to(1), 0);
    /// assert_eq!(bitmap.count_to(5), 2);
    /// assert_eq!(bitmap.count_to(64), 3);
    /// assert_eq!(bitmap.count_to(1000), 4);
    /// ```
    pub fn count_to(&self, until: u32) -> usize {
        let until = until.min(self.size);
        if until == 0 || self.words.is_empty() {
            return 0;
        }

        let (word_idx, bit_offset) = locate(until);
        if word_idx >= self.words.len() {
            return popcount(&self.words);
        }

        // whole words before, then the head of the word holding `until`
        popcount(&self.words[..word_idx])
            + (self.words[word_idx] >> (63 - bit_offset)).count_ones() as usize
    }

    /// Returns the number of set positions in `[1, size]`.
    #[inline]
    pub fn count(&self) -> usize {
        self.count_to(self.size)
    }

    /// Intersects `self` with every bitmap in `others`, left to right.
    ///
    /// The size becomes the smallest size among all operands and the word
    /// store is shrunk to the shortest word store.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut a: Bitmap = [1, 2, 3, 100].into_iter().collect();
    /// let b: Bitmap = [2, 3, 4].into_iter().collect();
    /// let c: Bitmap = [3, 4, 5].into_iter().collect();
    /// a.and([&b, &c]);
    /// assert_eq!(a.iter().collect::<Vec<_>>(), [3]);
    /// assert_eq!(a.size(), 4);
    /// ```
    pub fn and<'a>(&mut self, others: impl IntoIterator<Item = &'a Bitmap>) {
        for other in others {
            self.size = self.size.min(other.size);
            self.shrink_words(self.words.len().min(other.words.len()));
            let rhs = other.live_words().chain(iter::repeat(0));
            for (word, rhs) in self.words.iter_mut().zip(rhs) {
                *word &= rhs;
            }
        }
    }

    /// Removes from `self` every position set in any of `others` (set
    /// subtraction), left to right.
    ///
    /// Sizing follows [`and`](Bitmap::and).
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut a: Bitmap = [1, 2, 3, 4].into_iter().collect();
    /// let b: Bitmap = [2, 4].into_iter().collect();
    /// a.and_not([&b]);
    /// assert_eq!(a.iter().collect::<Vec<_>>(), [1, 3]);
    /// ```
    pub fn and_not<'a>(&mut self, others: impl IntoIterator<Item = &'a Bitmap>) {
        for other in others {
            self.size = self.size.min(other.size);
            self.shrink_words(self.words.len().min(other.words.len()));
            let rhs = other.live_words().chain(iter::repeat(0));
            for (word, rhs) in self.words.iter_mut().zip(rhs) {
                *word &= !rhs;
            }
        }
    }

    /// Unions `self` with every bitmap in `others`, left to right.
    ///
    /// The size becomes the largest size among all operands and the word
    /// store is grown to the longest word store first.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut a: Bitmap = [1, 8].into_iter().collect();
    /// let b: Bitmap = [16].into_iter().collect();
    /// a.or([&b]);
    /// assert_eq!(a.size(), 16);
    /// assert_eq!(a.iter().collect::<Vec<_>>(), [1, 8, 16]);
    /// ```
    pub fn or<'a>(&mut self, others: impl IntoIterator<Item = &'a Bitmap>) {
        for other in others {
            self.widen_to(other);
            for (word, rhs) in self.words.iter_mut().zip(other.live_words()) {
                *word |= rhs;
            }
        }
    }

    /// Computes the symmetric difference of `self` and every bitmap in
    /// `others`, left to right.
    ///
    /// Sizing follows [`or`](Bitmap::or).
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut a: Bitmap = [1, 2].into_iter().collect();
    /// let b: Bitmap = [2, 3].into_iter().collect();
    /// a.xor([&b]);
    /// assert_eq!(a.iter().collect::<Vec<_>>(), [1, 3]);
    /// ```
    pub fn xor<'a>(&mut self, others: impl IntoIterator<Item = &'a Bitmap>) {
        for other in others {
            self.widen_to(other);
            for (word, rhs) in self.words.iter_mut().zip(other.live_words()) {
                *word ^= rhs;
            }
        }
    }

    /// Returns an iterator over the set positions in `[1, size]`, in
    /// ascending order.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let bitmap: Bitmap = [64, 3, 65].into_iter().collect();
    /// assert_eq!(bitmap.iter().collect::<Vec<_>>(), [3, 64, 65]);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            bitmap: self,
            word_idx: 0,
            current: if self.live_len() > 0 { self.live_word(0) } else { 0 },
        }
    }

    /// Ensures the word store holds at least `word_idx + 1` words, keeping
    /// existing words and zeroing new ones.
    pub(crate) fn grow_words(&mut self, word_idx: usize) {
        let len = word_idx + 1;
        if self.words.len() >= len {
            return;
        }

        if self.words.capacity() < len {
            let capacity = next_capacity(self.words.capacity(), len);
            trace!(
                from = self.words.capacity(),
                to = capacity,
                "bitmap: reallocating word store"
            );
            self.words.reserve_exact(capacity - self.words.len());
        }
        self.words.resize(len, 0);
    }

    /// Zeroes every word at index `>= len` and truncates to `len` words.
    pub(crate) fn shrink_words(&mut self, len: usize) {
        if len < self.words.len() {
            self.words[len..].fill(0);
            self.words.truncate(len);
        }
    }

    fn widen_to(&mut self, other: &Bitmap) {
        if other.size > self.size {
            self.clean_unused_bits();
            self.size = other.size;
        }
        if let Some(last) = other.words.len().checked_sub(1) {
            self.grow_words(last);
        }
    }

    /// Zeroes every stored bit past the size, so raising the size never
    /// exposes residue left by `ones` or a short capacity.
    fn clean_unused_bits(&mut self) {
        let live = self.live_len();
        self.words[live..].fill(0);
        if let Some(last) = live.checked_sub(1) {
            self.words[last] &= self.live_mask(last);
        }
    }

    /// Number of words that hold positions in `[1, size]`.
    #[inline]
    fn live_len(&self) -> usize {
        word_count(self.size).min(self.words.len())
    }

    #[inline]
    fn live_mask(&self, word_idx: usize) -> u64 {
        if word_idx + 1 == word_count(self.size) {
            tail_mask(self.size)
        } else {
            !0
        }
    }

    #[inline]
    fn live_word(&self, word_idx: usize) -> u64 {
        self.words[word_idx] & self.live_mask(word_idx)
    }

    fn live_words(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.live_len()).map(|idx| self.live_word(idx))
    }
}

/// Two bitmaps are equal when they declare the same size and agree on every
/// position in `[1, size]`. Word store length and padding are ignored.
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.live_words().eq(other.live_words())
    }
}

impl Eq for Bitmap {}

impl Debug for Bitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap[{}] ", self.size)?;
        for x in 1..=self.size {
            if x % 8 == 1 {
                write!(f, "{x}: ")?;
            }
            write!(f, "{}", if self.contains(x) { '1' } else { '0' })?;
            if x % 8 == 0 && x < self.size {
                write!(f, " ")?;
            }
        }
        Ok(())
    }
}

/// Builds a bitmap with every yielded position set. The size is the largest
/// position.
///
/// # Panics
/// Panics if the iterator yields `0`.
impl FromIterator<u32> for Bitmap {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        let mut bitmap = Self::default();
        for x in iter {
            bitmap.set(x);
        }
        bitmap
    }
}

impl<'bitmap> IntoIterator for &'bitmap Bitmap {
    type Item = u32;
    type IntoIter = Iter<'bitmap>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl BitAndAssign<&Bitmap> for Bitmap {
    fn bitand_assign(&mut self, rhs: &Bitmap) {
        self.and([rhs]);
    }
}

impl BitOrAssign<&Bitmap> for Bitmap {
    fn bitor_assign(&mut self, rhs: &Bitmap) {
        self.or([rhs]);
    }
}

impl BitXorAssign<&Bitmap> for Bitmap {
    fn bitxor_assign(&mut self, rhs: &Bitmap) {
        self.xor([rhs]);
    }
}

impl SubAssign<&Bitmap> for Bitmap {
    fn sub_assign(&mut self, rhs: &Bitmap) {
        self.and_not([rhs]);
    }
}

impl BitAnd for &Bitmap {
    type Output = Bitmap;

    fn bitand(self, rhs: Self) -> Self::Output {
        let mut out = self.clone();
        out &= rhs;
        out
    }
}

impl BitOr for &Bitmap {
    type Output = Bitmap;

    fn bitor(self, rhs: Self) -> Self::Output {
        let mut out = self.clone();
        out |= rhs;
        out
    }
}

impl BitXor for &Bitmap {
    type Output = Bitmap;

    fn bitxor(self, rhs: Self) -> Self::Output {
        let mut out = self.clone();
        out ^= rhs;
        out
    }
}

impl Sub for &Bitmap {
    type Output = Bitmap;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

/// Iterator over the set positions of a bitmap, in ascending order.
///
/// Returned by [`Bitmap::iter()`].
#[derive(Clone)]
pub struct Iter<'bitmap> {
    bitmap: &'bitmap Bitmap,
    word_idx: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current == 0 {
            if self.word_idx + 1 >= self.bitmap.live_len() {
                return None;
            }
            self.word_idx += 1;
            self.current = self.bitmap.live_word(self.word_idx);
        }
        let lz = self.current.leading_zeros();
        self.current &= !mask(lz); // unset highest
        Some(position(self.word_idx, lz + 1))
    }
}

impl FusedIterator for Iter<'_> {}
