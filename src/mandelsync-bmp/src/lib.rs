//! Library for working with uncompressed 24-bit bitmap images.
//!
//! Pixels are exchanged as packed [`Color`] values through the
//! [`Raster`] trait, which lets any pixel grid be encoded without
//! copying it into a [`Bitmap`] first.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod bitmap;
pub use bitmap::*;

mod color;
pub use color::*;

mod codec;
pub use codec::*;
