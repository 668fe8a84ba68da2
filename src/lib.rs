//! A dense, growable bitmap over 1-based `u32` positions, with a compact
//! hex and byte codec.
//!
//! [`Bitmap`] is the main struct in this library. [`HexBitmap`] is its
//! serializable `{size, bits}` view. Its [features](#features) are listed
//! below.
//!
//! # Examples
//! ```
//! use hex_bitmap::{Bitmap, HexBitmap};
//!
//! let mut bitmap = Bitmap::new(10);
//! assert_eq!(bitmap.count(), 0);
//! bitmap.set(3);
//! bitmap.set(10);
//! assert_eq!(bitmap.min(), Some(3));
//! assert_eq!(bitmap.max_zero(), Some(9));
//!
//! let hex = HexBitmap::from(&bitmap);
//! assert_eq!(hex.bits, "204");
//! assert_eq!(hex.to_bitmap().unwrap(), bitmap);
//! ```
//!
//! # Layout
//!
//! Position 1 is the most significant bit of word 0, position 64 its least
//! significant bit, position 65 the most significant bit of word 1, and so
//! on. The hex and byte forms depend on this order and are meant to be
//! exchanged with other implementations byte for byte.
//!
//! # Features
//!
//! - Grows on demand, shrinks only through `and`, `and_not` and `clear`
//! - Membership: `set`, `remove`, `contains`, `ones`
//! - Rank and selection: `min`, `max`, `min_zero`, `max_zero`, `count_to`,
//!   `count`
//! - Multi-operand set algebra across differing sizes: `and`, `or`, `xor`,
//!   `and_not`, plus `&`, `|`, `^`, `-` and their assigning forms
//! - Hex (`to_hex`, `from_hex`) and raw byte (`to_bytes`, `from_bytes`)
//!   encodings
//! - `serde` support (default feature) through the [`HexBitmap`] shape
//!
//! A `Bitmap` does no locking. Guard shared instances externally.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod bitmap;
mod codec;
mod error;
mod facade;
#[cfg(test)]
mod tests_props;

pub use bitmap::{Bitmap, Iter, WORD_BITS, word_count};
pub use error::{Error, Result};
pub use facade::HexBitmap;
