use serde::Serialize;

use crate::{Color, ComputationError, ConfigurationError};

/// The squared escape radius of the iteration.
const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// The region of the complex plane mapped onto the image, plus the
/// iteration cap.
///
/// Immutable for the duration of a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Viewport {
    /// The real part of the view center.
    pub center_x: f64,
    /// The imaginary part of the view center.
    pub center_y: f64,
    /// Half the side length of the view window.
    pub scale: f64,
    /// The image width in pixels.
    pub width: u32,
    /// The image height in pixels.
    pub height: u32,
    /// The maximum number of iterations per point.
    pub max_iter: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            scale: 4.0,
            width: 800,
            height: 600,
            max_iter: 1000,
        }
    }
}

#[inline]
fn axis(center: f64, scale: f64, pos: u32, len: u32) -> f64 {
    // A single pixel sits exactly on the center.
    if len == 1 {
        center
    } else {
        center - scale + 2.0 * scale * f64::from(pos) / f64::from(len - 1)
    }
}

impl Viewport {
    /// Validates the viewport parameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigurationError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }

        if self.max_iter == 0 {
            return Err(ConfigurationError::MaxIterations);
        }

        for (name, value) in [
            ("center x", self.center_x),
            ("center y", self.center_y),
            ("scale", self.scale),
        ] {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite(name));
            }
        }

        if self.scale <= 0.0 {
            return Err(ConfigurationError::Scale(self.scale));
        }

        Ok(())
    }

    /// Maps a pixel to its point `c` in the complex plane.
    pub fn point(&self, px: u32, py: u32) -> Result<(f64, f64), ComputationError> {
        let x = axis(self.center_x, self.scale, px, self.width);
        let y = axis(self.center_y, self.scale, py, self.height);

        if x.is_finite() && y.is_finite() {
            Ok((x, y))
        } else {
            Err(ComputationError::NonFinite { px, py })
        }
    }

    /// Computes the escape iteration count of a pixel.
    #[inline]
    pub fn iterations(&self, px: u32, py: u32) -> Result<u32, ComputationError> {
        let (cx, cy) = self.point(px, py)?;
        Ok(escape_iterations(cx, cy, self.max_iter))
    }

    /// Computes the final color of a pixel.
    #[inline]
    pub fn color(&self, px: u32, py: u32) -> Result<Color, ComputationError> {
        self.iterations(px, py)
            .map(|count| iteration_color(count, self.max_iter))
    }
}

/// Iterates `z = z² + c` from `z = 0` and counts the steps until
/// `|z|² > 4`, capped at `max_iter`.
pub fn escape_iterations(cx: f64, cy: f64, max_iter: u32) -> u32 {
    let (mut x, mut y) = (0.0f64, 0.0f64);

    let mut count = 0;
    while count < max_iter {
        if x * x + y * y > ESCAPE_RADIUS_SQ {
            break;
        }

        (x, y) = (x * x - y * y + cx, 2.0 * x * y + cy);
        count += 1;
    }

    count
}

/// Maps an iteration count to a color.
///
/// Points that never escaped are black; everything else ramps from
/// blue towards white with the count.
pub fn iteration_color(count: u32, max_iter: u32) -> Color {
    if count >= max_iter {
        return Color::rgb(0, 0, 0);
    }

    let level = (u64::from(count) * 255 / u64::from(max_iter)) as u8;
    Color::rgb(level, level, u8::MAX)
}
