//! Encoding and decoding of the uncompressed 24-bit bitmap format.

use std::{
    fs,
    io::{self, Read, Write},
    mem,
    path::Path,
};

use mandelsync_utils::{align, binary};
use serde::Serialize;
use thiserror::Error;

use crate::{Bitmap, Color, Raster};

const SIGNATURE: [u8; 2] = *b"BM";
const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;

/// The offset of pixel data in bitmaps produced by [`encode`].
pub const PIXEL_DATA_OFFSET: u32 = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

const BITS_PER_PIXEL: u16 = 24;
const BYTES_PER_PIXEL: usize = 3;
const NO_COMPRESSION: u32 = 0;

/// Errors that may occur while encoding or decoding bitmaps.
#[derive(Debug, Error)]
pub enum BmpError {
    /// An I/O error occurred on the underlying stream.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// The stream does not start with the `BM` signature.
    #[error("not a bitmap file")]
    NotBitmap,

    /// The bitmap uses a pixel format other than 24-bit uncompressed.
    #[error("only 24-bit uncompressed bitmaps are supported (got {bits_per_pixel} bpp, compression {compression})")]
    Unsupported {
        /// The stored bits per pixel.
        bits_per_pixel: u16,
        /// The stored compression method.
        compression: u32,
    },

    /// The bitmap declares dimensions that cannot describe an image.
    #[error("invalid bitmap dimensions {width}x{height}")]
    Dimensions {
        /// The stored width.
        width: i64,
        /// The stored height.
        height: i64,
    },

    /// The pixel data offset points into the headers.
    #[error("pixel data offset {0} overlaps the bitmap headers")]
    DataOffset(u32),

    /// The image is too large to be represented in the format.
    #[error("image too large to represent as a bitmap")]
    TooLarge,
}

#[inline]
fn row_stride(width: u32) -> Result<usize, BmpError> {
    (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .filter(|bytes| bytes.checked_add(3).is_some())
        .map(|bytes| align::align_up(bytes, 4))
        .ok_or(BmpError::TooLarge)
}

/// The combined file and info headers of a bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Header {
    /// The total size of the file in bytes.
    pub file_size: u32,
    /// The offset of the pixel data from the start of the file.
    pub data_offset: u32,
    /// The size of the info header.
    pub info_size: u32,
    /// The width of the image in pixels.
    pub width: i32,
    /// The height of the image in pixels.
    ///
    /// Positive values store rows bottom-to-top, negative values
    /// top-to-bottom.
    pub height: i32,
    /// The number of color planes.
    pub planes: u16,
    /// The number of bits per pixel.
    pub bits_per_pixel: u16,
    /// The compression method.
    pub compression: u32,
    /// The size of the raw pixel data.
    pub image_size: u32,
    /// The horizontal resolution in pixels per meter.
    pub x_pixels_per_meter: i32,
    /// The vertical resolution in pixels per meter.
    pub y_pixels_per_meter: i32,
    /// The number of palette colors.
    pub colors_used: u32,
    /// The number of important palette colors.
    pub colors_important: u32,
}

impl Header {
    /// Builds the header for a 24-bit bottom-up image of the given
    /// dimensions.
    pub fn for_dimensions(width: u32, height: u32) -> Result<Self, BmpError> {
        let image_size = row_stride(width)?
            .checked_mul(height as usize)
            .and_then(|size| u32::try_from(size).ok())
            .ok_or(BmpError::TooLarge)?;
        let file_size = image_size
            .checked_add(PIXEL_DATA_OFFSET)
            .ok_or(BmpError::TooLarge)?;

        Ok(Self {
            file_size,
            data_offset: PIXEL_DATA_OFFSET,
            info_size: INFO_HEADER_SIZE,
            width: i32::try_from(width).map_err(|_| BmpError::TooLarge)?,
            height: i32::try_from(height).map_err(|_| BmpError::TooLarge)?,
            planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            compression: NO_COMPRESSION,
            image_size,
            x_pixels_per_meter: 0,
            y_pixels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
        })
    }

    /// Parses the headers from the given [`Read`]er.
    ///
    /// This consumes exactly 54 bytes from the stream.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self, BmpError> {
        binary::magic(reader, SIGNATURE).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => BmpError::NotBitmap,
            _ => e.into(),
        })?;

        let file_size = binary::uint32(reader)?;
        binary::skip(reader, 4)?;
        let data_offset = binary::uint32(reader)?;

        Ok(Self {
            file_size,
            data_offset,
            info_size: binary::uint32(reader)?,
            width: binary::int32(reader)?,
            height: binary::int32(reader)?,
            planes: binary::uint16(reader)?,
            bits_per_pixel: binary::uint16(reader)?,
            compression: binary::uint32(reader)?,
            image_size: binary::uint32(reader)?,
            x_pixels_per_meter: binary::int32(reader)?,
            y_pixels_per_meter: binary::int32(reader)?,
            colors_used: binary::uint32(reader)?,
            colors_important: binary::uint32(reader)?,
        })
    }

    /// Writes the headers to the given [`Write`]r.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        binary::write_magic(writer, &SIGNATURE)?;
        binary::write_uint32(writer, self.file_size)?;
        binary::write_zeroes(writer, 4)?;
        binary::write_uint32(writer, self.data_offset)?;

        binary::write_uint32(writer, self.info_size)?;
        binary::write_int32(writer, self.width)?;
        binary::write_int32(writer, self.height)?;
        binary::write_uint16(writer, self.planes)?;
        binary::write_uint16(writer, self.bits_per_pixel)?;
        binary::write_uint32(writer, self.compression)?;
        binary::write_uint32(writer, self.image_size)?;
        binary::write_int32(writer, self.x_pixels_per_meter)?;
        binary::write_int32(writer, self.y_pixels_per_meter)?;
        binary::write_uint32(writer, self.colors_used)?;
        binary::write_uint32(writer, self.colors_important)?;

        Ok(())
    }

    /// Whether pixel rows are stored bottom-to-top.
    #[inline]
    pub const fn is_bottom_up(&self) -> bool {
        self.height > 0
    }

    fn validate(&self) -> Result<(u32, u32), BmpError> {
        if self.bits_per_pixel != BITS_PER_PIXEL || self.compression != NO_COMPRESSION {
            return Err(BmpError::Unsupported {
                bits_per_pixel: self.bits_per_pixel,
                compression: self.compression,
            });
        }

        if self.width <= 0 || self.height == 0 {
            return Err(BmpError::Dimensions {
                width: self.width.into(),
                height: self.height.into(),
            });
        }

        if self.data_offset < PIXEL_DATA_OFFSET {
            return Err(BmpError::DataOffset(self.data_offset));
        }

        Ok((self.width.unsigned_abs(), self.height.unsigned_abs()))
    }

    fn pixel_data_size(&self, stride: usize, width: u32, height: u32) -> Result<u64, BmpError> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels.saturating_mul(mem::size_of::<Color>() as u64) > isize::MAX as u64 {
            return Err(BmpError::TooLarge);
        }

        let size = (stride as u64)
            .checked_mul(u64::from(height))
            .filter(|&size| size + u64::from(self.data_offset) <= u64::from(u32::MAX))
            .ok_or(BmpError::TooLarge)?;

        // A zero file size is left unchecked; some writers never fill it in.
        if self.file_size != 0 && size + u64::from(self.data_offset) > u64::from(self.file_size) {
            return Err(BmpError::Dimensions {
                width: self.width.into(),
                height: self.height.into(),
            });
        }

        Ok(size)
    }
}

/// Encodes any [`Raster`] as an uncompressed 24-bit bitmap.
///
/// Rows are stored bottom-to-top in blue-green-red order and padded
/// to 4 bytes. Alpha is not stored.
pub fn encode<R, W>(raster: &R, writer: &mut W) -> Result<(), BmpError>
where
    R: Raster + ?Sized,
    W: Write,
{
    let (width, height) = (raster.width(), raster.height());
    let header = Header::for_dimensions(width, height)?;
    header.write(writer)?;

    let stride = row_stride(width)?;
    let mut row = Vec::with_capacity(stride);
    for y in (0..height).rev() {
        row.clear();
        for x in 0..width {
            let color = raster.pixel(x, y);
            row.extend_from_slice(&[color.blue(), color.green(), color.red()]);
        }
        row.resize(row.len() + align::padding(row.len(), 4), 0);

        writer.write_all(&row)?;
    }

    Ok(())
}

impl Bitmap {
    /// Decodes an uncompressed 24-bit bitmap from the given
    /// [`Read`]er.
    ///
    /// Stored pixels with all channels zero decode to
    /// [`Color::TRANSPARENT`]; everything else decodes opaque.
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self, BmpError> {
        let header = Header::parse(reader)?;
        let (width, height) = header.validate()?;

        binary::skip(reader, u64::from(header.data_offset - PIXEL_DATA_OFFSET))?;

        let stride = row_stride(width)?;
        let size = header.pixel_data_size(stride, width, height)?;

        // Buffer the stored rows before allocating the bitmap, so a short
        // stream never costs more memory than it actually carries.
        let mut data = Vec::new();
        reader.by_ref().take(size).read_to_end(&mut data)?;
        if data.len() as u64 != size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Premature EOF in bitmap pixel data",
            )
            .into());
        }

        let mut bitmap = Bitmap::new(width, height);
        for (stored, row) in (0..height).zip(data.chunks_exact(stride)) {
            let y = if header.is_bottom_up() {
                height - 1 - stored
            } else {
                stored
            };

            for (x, px) in row.chunks_exact(BYTES_PER_PIXEL).take(width as usize).enumerate() {
                let (b, g, r) = (px[0], px[1], px[2]);
                let color = if (r, g, b) == (0, 0, 0) {
                    Color::TRANSPARENT
                } else {
                    Color::rgb(r, g, b)
                };

                bitmap.set(x as u32, y, color);
            }
        }

        Ok(bitmap)
    }

    /// Opens and decodes the bitmap file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BmpError> {
        let file = fs::File::open(path)?;
        Self::decode(&mut io::BufReader::new(file))
    }
}
