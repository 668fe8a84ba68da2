use crate::bitmap::Bitmap;
use crate::error::{Error, Result};

/// The serializable `{size, bits}` view of a [`Bitmap`].
///
/// `bits` holds the output of [`Bitmap::to_hex`]. With the `serde` feature
/// this is the JSON shape `{"size": 10, "bits": "204"}`, where either field
/// is omitted when zero or empty.
///
/// The mutators decode, apply the bitmap operation and re-encode, so each
/// call costs a full round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HexBitmap {
    /// Highest addressable position. Zero means "derive from `bits`".
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "is_zero"))]
    pub size: u32,
    /// Uppercase hex encoding of the words.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "String::is_empty")
    )]
    pub bits: String,
}

#[cfg(feature = "serde")]
fn is_zero(size: &u32) -> bool {
    *size == 0
}

impl HexBitmap {
    /// Decodes the full bitmap. Empty `bits` decode to an empty bitmap.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if `bits` is not valid hex.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::HexBitmap;
    ///
    /// let hex = HexBitmap { size: 10, bits: "204".to_owned() };
    /// let bitmap = hex.to_bitmap().unwrap();
    /// assert!(bitmap.contains(3));
    /// assert!(bitmap.contains(10));
    /// ```
    pub fn to_bitmap(&self) -> Result<Bitmap> {
        let capacity = Some(self.size).filter(|&size| size > 0);
        Ok(Bitmap::from_hex(&self.bits, capacity)?.unwrap_or_default())
    }

    /// Sets position `x`, raising the size if needed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidIndex`] for `x == 0` and [`Error::Decode`]
    /// if the current `bits` are not valid hex.
    ///
    /// # Examples
    /// ```
    /// use hex_bitmap::HexBitmap;
    ///
    /// let mut hex = HexBitmap::default();
    /// hex.grow(10).unwrap();
    /// hex.set(3).unwrap();
    /// hex.set(10).unwrap();
    /// assert_eq!(hex, HexBitmap { size: 10, bits: "204".to_owned() });
    /// ```
    pub fn set(&mut self, x: u32) -> Result<()> {
        if x == 0 {
            return Err(Error::InvalidIndex);
        }
        self.update(|bitmap| bitmap.set(x))
    }

    /// Unsets position `x`.
    ///
    /// # Errors
    /// Same as [`set`](HexBitmap::set).
    pub fn remove(&mut self, x: u32) -> Result<()> {
        if x == 0 {
            return Err(Error::InvalidIndex);
        }
        self.update(|bitmap| bitmap.remove(x))
    }

    /// Sets the size to `desired_bit`, see [`Bitmap::grow`].
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the current `bits` are not valid hex.
    pub fn grow(&mut self, desired_bit: u32) -> Result<()> {
        self.update(|bitmap| bitmap.grow(desired_bit))
    }

    fn update(&mut self, op: impl FnOnce(&mut Bitmap)) -> Result<()> {
        let mut bitmap = self.to_bitmap()?;
        op(&mut bitmap);
        *self = Self::from(&bitmap);
        Ok(())
    }
}

impl From<&Bitmap> for HexBitmap {
    fn from(bitmap: &Bitmap) -> Self {
        Self {
            size: bitmap.size(),
            bits: bitmap.to_hex(),
        }
    }
}

impl From<Bitmap> for HexBitmap {
    fn from(bitmap: Bitmap) -> Self {
        Self::from(&bitmap)
    }
}

impl TryFrom<HexBitmap> for Bitmap {
    type Error = Error;

    fn try_from(hex: HexBitmap) -> Result<Self> {
        hex.to_bitmap()
    }
}
