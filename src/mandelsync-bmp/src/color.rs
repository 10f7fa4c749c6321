/// A packed 32-bit color value.
///
/// The canonical layout is `0xAARRGGBB`: alpha in the most
/// significant byte, followed by red, green and blue. Encoding and
/// decoding both go through this layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Color(u32);

impl Color {
    /// The all-zero color.
    ///
    /// Decoding maps stored black pixels to this value rather than
    /// to opaque black.
    pub const TRANSPARENT: Self = Self(0);

    /// Creates an opaque color from its channels.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, u8::MAX)
    }

    /// Creates a color from its channels and an alpha value.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Reinterprets a packed `0xAARRGGBB` value.
    #[inline]
    pub const fn from_packed(v: u32) -> Self {
        Self(v)
    }

    /// Gets the packed `0xAARRGGBB` value.
    #[inline]
    pub const fn packed(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Whether all three color channels are zero, regardless of alpha.
    #[inline]
    pub const fn is_black(self) -> bool {
        self.0 & 0x00FF_FFFF == 0
    }
}
