use std::cmp::Ordering;

use crate::color;
use crate::config::SortOrder;
use crate::entry::PaletteEntry;
use crate::exclusion::GRAY_MAX_CHROMA;

/// Composite "visual" score: saturated colors of mid lightness first.
fn visual_score(entry: &PaletteEntry) -> f32 {
    let lab = entry.lab();
    let saturation = (color::chroma(lab) / 100.0).min(1.0);
    let balance = 1.0 - ((lab.l - 50.0).abs() / 50.0).min(1.0);
    0.6 * saturation + 0.4 * balance
}

/// Hue angle, or `None` for colors too close to neutral to have one.
fn hue(entry: &PaletteEntry) -> Option<f32> {
    let lab = entry.lab();
    (color::chroma(lab) > GRAY_MAX_CHROMA).then(|| color::hue_degrees(lab))
}

/// Shared tie-break: heavier first, then lower color key.
fn by_frequency(a: &PaletteEntry, b: &PaletteEntry) -> Ordering {
    b.weight.cmp(&a.weight).then_with(|| a.key().cmp(&b.key()))
}

/// Reorder `entries` in place. Stable; never changes colors or weights.
pub fn sort_entries(entries: &mut [PaletteEntry], order: SortOrder) {
    match order {
        SortOrder::Frequency => entries.sort_by(by_frequency),
        SortOrder::DarkToLight => entries.sort_by(|a, b| {
            a.lab().l.total_cmp(&b.lab().l).then_with(|| by_frequency(a, b))
        }),
        SortOrder::LightToDark => entries.sort_by(|a, b| {
            b.lab().l.total_cmp(&a.lab().l).then_with(|| by_frequency(a, b))
        }),
        SortOrder::Hue => entries.sort_by(|a, b| match (hue(a), hue(b)) {
            (Some(ha), Some(hb)) => ha.total_cmp(&hb).then_with(|| by_frequency(a, b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.lab().l.total_cmp(&b.lab().l).then_with(|| by_frequency(a, b)),
        }),
        SortOrder::Visual => entries.sort_by(|a, b| {
            visual_score(b)
                .total_cmp(&visual_score(a))
                .then_with(|| by_frequency(a, b))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    fn entry(r: u8, g: u8, b: u8, weight: u64) -> PaletteEntry {
        PaletteEntry {
            color: Srgb::new(r, g, b),
            weight,
            fraction: 0.0,
        }
    }

    fn keys(entries: &[PaletteEntry]) -> Vec<[u8; 3]> {
        entries.iter().map(PaletteEntry::key).collect()
    }

    fn sample() -> Vec<PaletteEntry> {
        vec![
            entry(255, 255, 255, 2),
            entry(0, 0, 255, 9),
            entry(0, 0, 0, 2),
            entry(255, 0, 0, 5),
            entry(0, 200, 0, 5),
        ]
    }

    #[test]
    fn frequency_breaks_ties_on_color_key() {
        let mut e = sample();
        sort_entries(&mut e, SortOrder::Frequency);
        assert_eq!(
            keys(&e),
            vec![[0, 0, 255], [0, 200, 0], [255, 0, 0], [0, 0, 0], [255, 255, 255]]
        );
    }

    #[test]
    fn lightness_orders_are_mirrored() {
        let mut up = sample();
        sort_entries(&mut up, SortOrder::DarkToLight);
        assert_eq!(up.first().unwrap().key(), [0, 0, 0]);
        assert_eq!(up.last().unwrap().key(), [255, 255, 255]);
        assert!(up.windows(2).all(|w| w[0].lab().l <= w[1].lab().l));

        let mut down = sample();
        sort_entries(&mut down, SortOrder::LightToDark);
        up.reverse();
        assert_eq!(keys(&up), keys(&down));
    }

    #[test]
    fn hue_is_ascending() {
        let mut e = vec![entry(0, 0, 255, 1), entry(0, 200, 0, 1), entry(255, 0, 0, 1)];
        sort_entries(&mut e, SortOrder::Hue);
        assert_eq!(keys(&e), vec![[255, 0, 0], [0, 200, 0], [0, 0, 255]]);
    }

    #[test]
    fn hue_puts_neutrals_last() {
        let mut e = vec![
            entry(128, 128, 128, 9),
            entry(0, 0, 255, 1),
            entry(255, 255, 255, 1),
            entry(130, 128, 127, 1),
            entry(255, 0, 0, 1),
            entry(0, 0, 0, 1),
        ];
        sort_entries(&mut e, SortOrder::Hue);
        assert_eq!(
            keys(&e),
            vec![
                [255, 0, 0],
                [0, 0, 255],
                [0, 0, 0],
                [128, 128, 128],
                [130, 128, 127],
                [255, 255, 255],
            ]
        );
    }

    #[test]
    fn visual_puts_saturated_colors_before_neutrals() {
        let mut e = sample();
        sort_entries(&mut e, SortOrder::Visual);
        let last_two: Vec<_> = keys(&e[3..]);
        assert!(last_two.contains(&[0, 0, 0]));
        assert!(last_two.contains(&[255, 255, 255]));
    }

    #[test]
    fn sorting_keeps_the_entry_set() {
        for order in [
            SortOrder::Frequency,
            SortOrder::DarkToLight,
            SortOrder::LightToDark,
            SortOrder::Hue,
            SortOrder::Visual,
        ] {
            let mut e = sample();
            sort_entries(&mut e, order);
            let mut got = keys(&e);
            got.sort();
            let mut want = keys(&sample());
            want.sort();
            assert_eq!(got, want, "{order}");
        }
    }
}
