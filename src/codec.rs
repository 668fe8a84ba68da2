use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use core::fmt::{self, Formatter, UpperHex};
use core::iter;
use tracing::debug;

const WORD_BYTES: usize = 8;
const WORD_HEX_DIGITS: usize = 16;

/// Clamps a requested capacity to what `len` input units can hold.
fn clamp_capacity(capacity: Option<u32>, len: usize, bits_per_unit: usize) -> u32 {
    let bound = u32::try_from(len.saturating_mul(bits_per_unit)).unwrap_or(u32::MAX);
    capacity.map_or(bound, |capacity| capacity.min(bound))
}

impl Bitmap {
    /// Encodes the bitmap as uppercase hex.
    ///
    /// Each word is written as 16 digits, word 0 first, and the result is
    /// cut to `ceil(size / 4)` digits.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(10);
    /// bitmap.set(3);
    /// bitmap.set(10);
    /// assert_eq!(bitmap.to_hex(), "204");
    /// ```
    pub fn to_hex(&self) -> String {
        let bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_be_bytes()).collect();
        let mut out = hex::encode_upper(bytes);
        out.truncate((self.size.div_ceil(4) as usize).min(out.len()));
        out
    }

    /// Decodes a bitmap from a hex string produced by [`to_hex`].
    ///
    /// The input is right-padded with `'0'` to whole words. The size is
    /// `capacity` clamped to 4 bits per input digit, or exactly 4 bits per
    /// digit when `capacity` is `None`. Empty input decodes to `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if `input` holds a non-hex character.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let bitmap = Bitmap::from_hex("204", Some(10)).unwrap().unwrap();
    /// assert_eq!(bitmap.size(), 10);
    /// assert_eq!(bitmap.iter().collect::<Vec<_>>(), [3, 10]);
    ///
    /// assert_eq!(Bitmap::from_hex("", None), Ok(None));
    /// assert!(Bitmap::from_hex("2G", None).is_err());
    /// ```
    ///
    /// [`to_hex`]: Bitmap::to_hex
    pub fn from_hex(input: &str, capacity: Option<u32>) -> Result<Option<Self>> {
        let capacity = clamp_capacity(capacity, input.len(), 4);

        let padded_len = input.len().next_multiple_of(WORD_HEX_DIGITS);
        let mut padded = String::with_capacity(padded_len);
        padded.push_str(input);
        padded.extend(iter::repeat_n('0', padded_len - input.len()));

        let mut bytes = hex::decode(&padded)
            .inspect_err(|err| debug!(%err, len = input.len(), "bitmap: rejecting hex string"))?;
        if bytes.is_empty() {
            return Ok(None);
        }

        bytes.reverse();
        Self::from_bytes(&bytes, Some(capacity))
    }

    /// Encodes the word store as raw bytes: the words in reverse order, each
    /// in little-endian byte order. This is exactly the byte-reversal of the
    /// big-endian word stream that [`to_hex`] renders.
    ///
    /// The returned buffer is a copy and is not tied to the bitmap.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new(64);
    /// bitmap.set(1);
    /// assert_eq!(bitmap.to_bytes(), [0, 0, 0, 0, 0, 0, 0, 0x80]);
    /// ```
    ///
    /// [`to_hex`]: Bitmap::to_hex
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().rev().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// Decodes a bitmap from bytes produced by [`to_bytes`].
    ///
    /// The size is `capacity` clamped to 8 bits per byte, or exactly 8 bits
    /// per byte when `capacity` is `None`; the word store always takes the
    /// whole buffer. An empty buffer decodes to `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBufferLength`] if the buffer length is not a
    /// multiple of 8.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::{Bitmap, Error};
    ///
    /// let bitmap = Bitmap::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0x80], Some(5))
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(bitmap.size(), 5);
    /// assert!(bitmap.contains(1));
    ///
    /// assert_eq!(
    ///     Bitmap::from_bytes(&[0; 7], None),
    ///     Err(Error::InvalidBufferLength(7))
    /// );
    /// ```
    ///
    /// [`to_bytes`]: Bitmap::to_bytes
    pub fn from_bytes(buffer: &[u8], capacity: Option<u32>) -> Result<Option<Self>> {
        let size = clamp_capacity(capacity, buffer.len(), 8);

        if buffer.is_empty() {
            return Ok(None);
        }
        if buffer.len() % WORD_BYTES != 0 {
            debug!(len = buffer.len(), "bitmap: rejecting byte buffer");
            return Err(Error::InvalidBufferLength(buffer.len()));
        }

        let words = buffer
            .chunks_exact(WORD_BYTES)
            .rev()
            .map(|chunk| {
                // little-endian: the last byte is the most significant
                chunk
                    .iter()
                    .rev()
                    .fold(0u64, |word, &byte| word << 8 | u64::from(byte))
            })
            .collect();

        Ok(Some(Self { size, words }))
    }

    /// Borrows the word store, word 0 first.
    ///
    /// The borrow ends before the bitmap can be mutated again, so the view
    /// can never outlive a reallocation.
    #[inline]
    pub fn as_words(&self) -> &[u64] {
        &self.words
    }
}

impl UpperHex for Bitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
