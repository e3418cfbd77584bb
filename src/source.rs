use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{PaletteError, Result};

/// An addressable image the palette pipeline can read from.
///
/// Implemented for the `image` crate's buffers and for [`PixelBuffer`], a
/// borrowed view over raw interleaved bytes.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Native density of the image in pixels per logical unit (2.0 for a
    /// "@2x" asset). Only [`crate::Quality::Best`] looks at it.
    fn pixels_per_unit(&self) -> f32 {
        1.0
    }

    /// Color at `(x, y)`, or `None` when the underlying data cannot be read
    /// as RGB(A).
    fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>>;

    /// Up-front format check, run before any pixel is read.
    fn check_format(&self) -> Result<()> {
        Ok(())
    }

    /// A nearest-neighbour resized copy, for sources that resize themselves.
    /// `None` lets the downsampler sample through [`PixelSource::pixel`].
    fn resized(&self, _width: u32, _height: u32) -> Option<RgbaImage> {
        None
    }
}

impl PixelSource for DynamicImage {
    fn width(&self) -> u32 {
        DynamicImage::width(self)
    }

    fn height(&self) -> u32 {
        DynamicImage::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.in_bounds(x, y).then(|| self.get_pixel(x, y))
    }

    fn resized(&self, width: u32, height: u32) -> Option<RgbaImage> {
        Some(imageops::resize(self, width, height, FilterType::Nearest))
    }
}

impl PixelSource for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.get_pixel_checked(x, y).copied()
    }

    fn resized(&self, width: u32, height: u32) -> Option<RgbaImage> {
        Some(imageops::resize(self, width, height, FilterType::Nearest))
    }
}

impl PixelSource for RgbImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.get_pixel_checked(x, y)
            .map(|&Rgb([r, g, b])| Rgba([r, g, b, 255]))
    }
}

// ------------------------------------------------------------
// Raw interleaved buffers
// ------------------------------------------------------------

/// Borrowed view over interleaved 8-bit pixel data.
///
/// Three channels are read as RGB, four as RGBA. Any other layout is rejected
/// with [`PaletteError::UnsupportedFormat`] when the palette is extracted.
#[derive(Clone, Copy, Debug)]
pub struct PixelBuffer<'a> {
    width: u32,
    height: u32,
    channels: usize,
    data: &'a [u8],
    pixels_per_unit: f32,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(width: u32, height: u32, channels: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            channels,
            data,
            pixels_per_unit: 1.0,
        }
    }

    pub fn rgb(width: u32, height: u32, data: &'a [u8]) -> Self {
        Self::new(width, height, 3, data)
    }

    pub fn rgba(width: u32, height: u32, data: &'a [u8]) -> Self {
        Self::new(width, height, 4, data)
    }

    pub fn with_pixels_per_unit(mut self, pixels_per_unit: f32) -> Self {
        self.pixels_per_unit = pixels_per_unit;
        self
    }

    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels
    }
}

impl PixelSource for PixelBuffer<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixels_per_unit(&self) -> f32 {
        self.pixels_per_unit
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * self.channels;
        let px = self.data.get(idx..idx + self.channels)?;
        match *px {
            [r, g, b] => Some(Rgba([r, g, b, 255])),
            [r, g, b, a] => Some(Rgba([r, g, b, a])),
            _ => None,
        }
    }

    fn check_format(&self) -> Result<()> {
        if !matches!(self.channels, 3 | 4) {
            return Err(PaletteError::UnsupportedFormat(format!(
                "{} channels per pixel, expected 3 (RGB) or 4 (RGBA)",
                self.channels
            )));
        }
        if self.data.len() != self.expected_len() {
            return Err(PaletteError::UnsupportedFormat(format!(
                "buffer holds {} bytes, {}x{}x{} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.channels,
                self.expected_len()
            )));
        }
        if !self.pixels_per_unit.is_finite() || self.pixels_per_unit <= 0.0 {
            return Err(PaletteError::UnsupportedFormat(format!(
                "resolution must be positive, got {} pixels per unit",
                self.pixels_per_unit
            )));
        }
        Ok(())
    }
}
