use palette::Srgb;

use crate::cluster::{self, Cluster};
use crate::color::{self, ColorKey, DeltaFormula, LabColor};

/// One color of the extracted palette.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteEntry {
    pub color: Srgb<u8>,
    /// Number of analysed pixels this color stands for.
    pub weight: u64,
    /// `weight` as a share of all pixels that survived exclusion.
    pub fraction: f32,
}

impl PaletteEntry {
    pub fn key(&self) -> ColorKey {
        [self.color.red, self.color.green, self.color.blue]
    }

    pub fn lab(&self) -> LabColor {
        color::to_lab(self.key())
    }

    /// `#RRGGBB`
    pub fn hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            self.color.red, self.color.green, self.color.blue
        )
    }

    pub(crate) fn from_cluster(cluster: &Cluster, total: u64) -> Self {
        let [r, g, b] = cluster.color;
        let fraction = if total == 0 {
            0.0
        } else {
            (cluster.weight as f64 / total as f64) as f32
        };
        Self {
            color: Srgb::new(r, g, b),
            weight: cluster.weight,
            fraction,
        }
    }
}

/// Result of a palette extraction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Palette {
    pub entries: Vec<PaletteEntry>,
    /// Non-transparent pixels analysed after downsampling.
    pub sampled: u64,
    /// Pixels dropped by the exclusion filter.
    pub excluded: u64,
    /// Fully transparent pixels skipped by the sampler.
    pub transparent: u64,
}

impl Palette {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaletteEntry> {
        self.entries.iter()
    }

    /// Every opaque pixel was removed by an exclusion predicate.
    pub fn all_excluded(&self) -> bool {
        self.sampled > 0 && self.excluded == self.sampled
    }

    pub fn into_entries(self) -> Vec<PaletteEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a PaletteEntry;
    type IntoIter = std::slice::Iter<'a, PaletteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Merge any two entries closer than `threshold` under `formula`, with the
/// same weighted Lab averaging the clusterer uses. Fractions are recomputed
/// against the entries' combined weight. Idempotent.
pub fn deduplicate(
    entries: &[PaletteEntry],
    threshold: f32,
    formula: DeltaFormula,
) -> Vec<PaletteEntry> {
    let clusters: Vec<Cluster> = entries
        .iter()
        .map(|e| Cluster::new(e.key(), e.weight))
        .collect();
    let total: u64 = clusters.iter().map(|c| c.weight).sum();
    cluster::deduplicate_clusters(clusters, threshold, formula)
        .iter()
        .map(|c| PaletteEntry::from_cluster(c, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: ColorKey, weight: u64) -> PaletteEntry {
        PaletteEntry::from_cluster(&Cluster::new(key, weight), 10)
    }

    #[test]
    fn hex_is_upper_case() {
        assert_eq!(entry([255, 10, 0], 1).hex(), "#FF0A00");
    }

    #[test]
    fn fraction_is_share_of_total() {
        let e = entry([1, 2, 3], 4);
        assert!((e.fraction - 0.4).abs() < 1e-6);
        let e = PaletteEntry::from_cluster(&Cluster::new([1, 2, 3], 4), 0);
        assert_eq!(e.fraction, 0.0);
    }

    #[test]
    fn dedup_twice_equals_once() {
        let entries = vec![
            entry([200, 40, 40], 5),
            entry([204, 42, 40], 3),
            entry([40, 40, 200], 2),
            entry([43, 40, 205], 1),
        ];
        for formula in [DeltaFormula::Cie76, DeltaFormula::Cie94, DeltaFormula::Ciede2000] {
            let once = deduplicate(&entries, 6.0, formula);
            let twice = deduplicate(&once, 6.0, formula);
            assert_eq!(once, twice, "{formula}");
            assert_eq!(once.len(), 2, "{formula}");
            assert_eq!(once.iter().map(|e| e.weight).sum::<u64>(), 11);
        }
    }

    #[test]
    fn all_excluded_needs_samples() {
        let palette = Palette {
            sampled: 16,
            excluded: 16,
            ..Palette::default()
        };
        assert!(palette.is_empty() && palette.all_excluded());
        assert!(!Palette::default().all_excluded());
    }
}
