use mandelsync_bmp::Raster;

use crate::{Color, MergeError, RowResult};

/// The image being assembled by a run.
///
/// Only the [`Merger`](crate::Merger) writes to it, and every row can
/// be written exactly once.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    written: Vec<bool>,
    writes: u64,
}

impl ImageBuffer {
    /// Creates an empty image of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
            written: vec![false; height as usize],
            writes: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Gets the color at the given position.
    ///
    /// # Panics
    ///
    /// Panics when the position is out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        assert!(x < self.width, "column {x} out of bounds");
        self.row(y)[x as usize]
    }

    /// Gets all pixels of row `y`.
    #[inline]
    pub fn row(&self, y: u32) -> &[Color] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// All pixels in row-major order, top row first.
    #[inline]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// The number of individual pixel writes performed so far.
    #[inline]
    pub fn pixel_writes(&self) -> u64 {
        self.writes
    }

    /// The number of rows that were not written yet.
    pub fn missing_rows(&self) -> u32 {
        self.written.iter().filter(|w| !**w).count() as u32
    }

    /// Whether every row has been written.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.missing_rows() == 0
    }

    pub(crate) fn write_row(&mut self, result: RowResult) -> Result<(), MergeError> {
        let RowResult { row, pixels } = result;

        if row >= self.height {
            return Err(MergeError::RowOutOfBounds {
                row,
                height: self.height,
            });
        }

        if pixels.len() != self.width as usize {
            return Err(MergeError::RowWidth {
                row,
                expected: self.width as usize,
                actual: pixels.len(),
            });
        }

        let written = &mut self.written[row as usize];
        if *written {
            return Err(MergeError::DuplicateRow(row));
        }
        *written = true;

        let start = row as usize * self.width as usize;
        self.pixels[start..start + pixels.len()].copy_from_slice(&pixels);
        self.writes += pixels.len() as u64;

        Ok(())
    }
}

impl Raster for ImageBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Color {
        self.get(x, y)
    }
}
