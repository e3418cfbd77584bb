use image::RgbaImage;

use crate::config::Quality;
use crate::error::{PaletteError, Result};
use crate::source::PixelSource;

/// Largest pixel count the given tier may analyse for an image of
/// `width`×`height` pixels at `pixels_per_unit` density.
///
/// The fixed tiers ignore density. [`Quality::Best`] analyses the logical
/// resolution, which equals the native pixel count for 1× images.
pub fn pixel_ceiling(quality: Quality, width: u32, height: u32, pixels_per_unit: f32) -> u64 {
    match quality.pixel_budget() {
        Some(budget) => budget,
        None => {
            let density = if pixels_per_unit.is_finite() && pixels_per_unit > 1.0 {
                pixels_per_unit as f64
            } else {
                1.0
            };
            let logical_w = (width as f64 / density).floor().max(1.0);
            let logical_h = (height as f64 / density).floor().max(1.0);
            (logical_w * logical_h) as u64
        }
    }
}

/// Aspect-preserving size that fits within `ceiling` pixels. Never upscales.
pub fn target_size(width: u32, height: u32, ceiling: u64) -> (u32, u32) {
    let ceiling = ceiling.max(1);
    let area = width as u64 * height as u64;
    if area <= ceiling {
        return (width, height);
    }

    let ratio = (ceiling as f64 / area as f64).sqrt();
    let mut out_w = ((width as f64 * ratio).floor() as u32).clamp(1, width);
    let mut out_h = ((height as f64 * ratio).floor() as u32).clamp(1, height);

    // Extreme aspect ratios: one side pinned at 1 can push the other past
    // the ceiling.
    if out_w as u64 * out_h as u64 > ceiling {
        if out_h == 1 {
            out_w = ceiling.min(width as u64) as u32;
        } else {
            out_h = ceiling.min(height as u64) as u32;
        }
    }
    (out_w, out_h)
}

/// Produce the buffer the sampler walks: the source itself when it already
/// fits the tier, otherwise a nearest-neighbour reduction.
pub fn downsample<S: PixelSource + ?Sized>(source: &S, quality: Quality) -> Result<RgbaImage> {
    let (in_w, in_h) = (source.width(), source.height());
    let ceiling = pixel_ceiling(quality, in_w, in_h, source.pixels_per_unit());
    let (out_w, out_h) = target_size(in_w, in_h, ceiling);

    log::debug!(
        "downsample quality={quality} {in_w}x{in_h} -> {out_w}x{out_h} (ceiling {ceiling})"
    );

    if (out_w, out_h) != (in_w, in_h) {
        if let Some(resized) = source.resized(out_w, out_h) {
            if resized.dimensions() == (out_w, out_h) {
                return Ok(resized);
            }
            log::debug!(
                "source resized to {:?} instead of {out_w}x{out_h}, sampling directly",
                resized.dimensions()
            );
        }
    }

    // Sample the centre of every output cell; identity when sizes match.
    let scale_x = in_w as f64 / out_w as f64;
    let scale_y = in_h as f64 / out_h as f64;
    let mut out = RgbaImage::new(out_w, out_h);

    for y_out in 0..out_h {
        let y = (((y_out as f64 + 0.5) * scale_y) as u32).min(in_h - 1);
        for x_out in 0..out_w {
            let x = (((x_out as f64 + 0.5) * scale_x) as u32).min(in_w - 1);
            let px = source.pixel(x, y).ok_or_else(|| {
                PaletteError::UnsupportedFormat(format!("pixel ({x}, {y}) is not RGB(A)"))
            })?;
            out.put_pixel(x_out, y_out, px);
        }
    }

    Ok(out)
}
