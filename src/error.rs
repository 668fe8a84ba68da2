use thiserror::Error;

/// Errors produced when decoding a [`Bitmap`](crate::Bitmap) or mutating a
/// [`HexBitmap`](crate::HexBitmap).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The hex string contained a character outside `[0-9a-fA-F]`.
    #[error("bitmap: invalid hex string: {0}")]
    Decode(#[from] hex::FromHexError),

    /// A raw byte buffer whose length is not a whole number of words.
    #[error("bitmap: buffer length expected to be multiple of 8, was {0}")]
    InvalidBufferLength(usize),

    /// Bit positions start at 1.
    #[error("bitmap: bit position 0 is not addressable")]
    InvalidIndex,
}

/// Shorthand for results carrying an [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
