use std::collections::HashMap;

use image::RgbaImage;

use crate::color::ColorKey;

/// One distinct color and how many pixels carried it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sample {
    pub color: ColorKey,
    pub count: u64,
}

/// Exact-color occurrence counts of a pixel buffer.
#[derive(Clone, Debug, Default)]
pub struct ColorHistogram {
    counts: HashMap<ColorKey, u64>,
    sampled: u64,
    transparent: u64,
}

impl ColorHistogram {
    /// Count every pixel of `image` by its exact RGB triple. Fully
    /// transparent pixels are tallied separately and never become samples;
    /// any other alpha value is ignored.
    pub fn from_image(image: &RgbaImage) -> Self {
        let mut histogram = ColorHistogram::default();
        for chunk in image.as_raw().chunks_exact(4) {
            if chunk[3] == 0 {
                histogram.transparent += 1;
                continue;
            }
            *histogram
                .counts
                .entry([chunk[0], chunk[1], chunk[2]])
                .or_insert(0) += 1;
            histogram.sampled += 1;
        }
        histogram
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Non-transparent pixels counted.
    pub fn sampled(&self) -> u64 {
        self.sampled
    }

    pub fn transparent(&self) -> u64 {
        self.transparent
    }

    pub fn count(&self, color: ColorKey) -> u64 {
        self.counts.get(&color).copied().unwrap_or(0)
    }

    /// Samples in ascending color-key order, so downstream stages see the
    /// same sequence on every run.
    pub fn samples(&self) -> Vec<Sample> {
        let mut samples: Vec<Sample> = self
            .counts
            .iter()
            .map(|(&color, &count)| Sample { color, count })
            .collect();
        samples.sort_unstable_by_key(|s| s.color);
        samples
    }
}
