//! Dominant-color palette extraction.
//!
//! [`extract_palette`] runs the whole pipeline on anything implementing
//! [`PixelSource`]:
//!
//! 1. downsample to the quality tier's pixel budget,
//! 2. count exact colors, skipping fully transparent pixels,
//! 3. drop near-black / near-white / gray colors if asked to,
//! 4. merge the closest colors until at most `max_colors` remain,
//! 5. merge leftovers closer than `merge_threshold`,
//! 6. sort.
//!
//! Every stage is a pure function of its input and the [`PaletteConfig`];
//! nothing is shared between calls.

pub mod cluster;
pub mod color;
pub mod config;
pub mod downsample;
pub mod entry;
pub mod error;
pub mod exclusion;
mod grid;
pub mod histogram;
pub mod sort;
pub mod source;
pub mod wasm;

pub use color::{ColorKey, DeltaFormula};
pub use config::{Exclusion, Exclusions, PaletteConfig, Quality, SortOrder};
pub use entry::{Palette, PaletteEntry, deduplicate};
pub use error::PaletteError;
pub use sort::sort_entries;
pub use source::{PixelBuffer, PixelSource};

use histogram::ColorHistogram;

/// Extract the dominant colors of `source`.
///
/// Fails only on unusable input (zero-sized image, unreadable pixel data) or
/// an invalid configuration. An image whose every pixel is transparent or
/// excluded yields an empty [`Palette`]; its `sampled` and `excluded`
/// counters tell the two cases apart.
pub fn extract_palette<S: PixelSource + ?Sized>(
    source: &S,
    config: &PaletteConfig,
) -> Result<Palette, PaletteError> {
    config.validate()?;

    let (width, height) = (source.width(), source.height());
    if width == 0 || height == 0 {
        return Err(PaletteError::InvalidImage { width, height });
    }
    source.check_format()?;

    // ----------------------
    // 1. Downsample
    // ----------------------
    let buffer = downsample::downsample(source, config.quality)?;

    // ----------------------
    // 2. Sample
    // ----------------------
    let histogram = ColorHistogram::from_image(&buffer);
    log::debug!(
        "sampled {} pixels, {} distinct colors, {} transparent",
        histogram.sampled(),
        histogram.distinct(),
        histogram.transparent()
    );

    // ----------------------
    // 3. Exclude
    // ----------------------
    let (samples, excluded) = exclusion::filter(histogram.samples(), config.exclusions);
    let remaining = histogram.sampled() - excluded;

    // ----------------------
    // 4. Cluster, 5. deduplicate
    // ----------------------
    let clusters = cluster::cluster(&samples, config.max_colors, config.formula);
    let clusters =
        cluster::deduplicate_clusters(clusters, config.merge_threshold, config.formula);

    // ----------------------
    // 6. Sort
    // ----------------------
    let mut entries: Vec<PaletteEntry> = clusters
        .iter()
        .map(|c| PaletteEntry::from_cluster(c, remaining))
        .collect();
    sort_entries(&mut entries, config.sort);

    Ok(Palette {
        entries,
        sampled: histogram.sampled(),
        excluded,
        transparent: histogram.transparent(),
    })
}
