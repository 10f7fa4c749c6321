//! Utilities for reading and writing little-endian binary layouts.

use std::{
    io::{self, Read, Write},
    mem,
};

/// Reads a signature of `N` bytes from the stream and compares it
/// against `expected`.
#[inline]
pub fn magic<R: Read, const N: usize>(data: &mut R, expected: [u8; N]) -> io::Result<()> {
    let mut v = [0; N];
    data.read_exact(&mut v)?;

    if v == expected {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Signature mismatch in input stream",
        ))
    }
}

/// Writes a signature to the stream.
#[inline]
pub fn write_magic<W: Write>(out: &mut W, magic: &[u8]) -> io::Result<()> {
    out.write_all(magic)
}

macro_rules! int_read_impl {
    ($($fn:ident() -> $ty:ty),* $(,)*) => {
        $(
            #[doc = concat!("Parses a little-endian [`", stringify!($ty), "`] off the data stream.")]
            #[inline]
            pub fn $fn<R: Read>(data: &mut R) -> io::Result<$ty> {
                let mut v = [0; mem::size_of::<$ty>()];
                data.read_exact(&mut v)?;
                Ok(<$ty>::from_le_bytes(v))
            }
        )*
    };
}

macro_rules! int_write_impl {
    ($($fn:ident($ty:ty)),* $(,)*) => {
        $(
            #[doc = concat!("Writes a little-endian [`", stringify!($ty), "`] to the data stream.")]
            #[inline]
            pub fn $fn<W: Write>(out: &mut W, v: $ty) -> io::Result<()> {
                out.write_all(&v.to_le_bytes())
            }
        )*
    };
}

int_read_impl! {
    uint16() -> u16,
    uint32() -> u32,
    int32() -> i32,
}

int_write_impl! {
    write_uint16(u16),
    write_uint32(u32),
    write_int32(i32),
}

/// Discards exactly `count` bytes from the data stream.
///
/// Fails with [`io::ErrorKind::UnexpectedEof`] when the stream ends
/// before all bytes were consumed.
pub fn skip<R: Read>(data: &mut R, count: u64) -> io::Result<()> {
    let skipped = io::copy(&mut data.take(count), &mut io::sink())?;
    if skipped == count {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Premature EOF while skipping data",
        ))
    }
}

/// Writes `count` zero bytes to the output stream.
#[inline]
pub fn write_zeroes<W: Write>(out: &mut W, count: usize) -> io::Result<()> {
    const ZEROES: [u8; 16] = [0; 16];

    let mut remaining = count;
    while remaining > 0 {
        let chunk = remaining.min(ZEROES.len());
        out.write_all(&ZEROES[..chunk])?;
        remaining -= chunk;
    }

    Ok(())
}
