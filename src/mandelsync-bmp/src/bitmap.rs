use crate::Color;

/// Read access to a rectangular grid of [`Color`]s.
///
/// Row `0` is the top row of the image.
pub trait Raster {
    /// The width of the grid in pixels.
    fn width(&self) -> u32;

    /// The height of the grid in pixels.
    fn height(&self) -> u32;

    /// Gets the color at the given position.
    ///
    /// # Panics
    ///
    /// Implementations may panic when `(x, y)` is out of bounds.
    fn pixel(&self, x: u32, y: u32) -> Color;
}

/// An owned in-memory image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl Bitmap {
    /// Creates a new bitmap with every pixel set to
    /// [`Color::TRANSPARENT`].
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![Color::TRANSPARENT; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{} bitmap",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    /// Gets the color at the given position.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.data[self.index(x, y)]
    }

    /// Sets the color at the given position.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let idx = self.index(x, y);
        self.data[idx] = color;
    }

    /// Overwrites every pixel with `color`.
    pub fn reset(&mut self, color: Color) {
        self.data.fill(color);
    }

    /// Gets all pixels in row-major order, top row first.
    #[inline]
    pub fn data(&self) -> &[Color] {
        &self.data
    }
}

impl Raster for Bitmap {
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
