use crate::color::{self, LabColor};
use crate::config::{Exclusion, Exclusions};
use crate::histogram::Sample;

const BLACK_MAX_LIGHTNESS: f32 = 8.0;
const WHITE_MIN_LIGHTNESS: f32 = 92.0;
/// Chroma below which near-black and near-white count as neutral.
const NEUTRAL_MAX_CHROMA: f32 = 8.0;
pub(crate) const GRAY_MAX_CHROMA: f32 = 5.0;

pub fn is_black(lab: LabColor) -> bool {
    lab.l <= BLACK_MAX_LIGHTNESS && color::chroma(lab) <= NEUTRAL_MAX_CHROMA
}

pub fn is_white(lab: LabColor) -> bool {
    lab.l >= WHITE_MIN_LIGHTNESS && color::chroma(lab) <= NEUTRAL_MAX_CHROMA
}

pub fn is_gray(lab: LabColor) -> bool {
    color::chroma(lab) <= GRAY_MAX_CHROMA
}

/// Whether `lab` falls in the given category.
pub fn matches(exclusion: Exclusion, lab: LabColor) -> bool {
    match exclusion {
        Exclusion::Black => is_black(lab),
        Exclusion::White => is_white(lab),
        Exclusion::Gray => is_gray(lab),
    }
}

/// Whether any enabled predicate rejects `lab`.
pub fn is_excluded(exclusions: Exclusions, lab: LabColor) -> bool {
    [Exclusion::Black, Exclusion::White, Exclusion::Gray]
        .into_iter()
        .any(|e| exclusions.contains(e) && matches(e, lab))
}

/// Drop every sample an enabled predicate rejects. Returns the surviving
/// samples (order preserved) and the total count removed.
pub fn filter(samples: Vec<Sample>, exclusions: Exclusions) -> (Vec<Sample>, u64) {
    if exclusions.is_empty() {
        return (samples, 0);
    }

    let mut excluded = 0;
    let kept: Vec<Sample> = samples
        .into_iter()
        .filter(|s| {
            let drop = is_excluded(exclusions, color::to_lab(s.color));
            if drop {
                excluded += s.count;
            }
            !drop
        })
        .collect();

    log::debug!(
        "exclusion {exclusions:?}: kept {} colors, dropped weight {excluded}",
        kept.len()
    );
    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(color: [u8; 3], count: u64) -> Sample {
        Sample { color, count }
    }

    #[test]
    fn predicates_work_in_lab() {
        assert!(is_black(color::to_lab([0, 0, 0])));
        assert!(is_black(color::to_lab([10, 10, 12])));
        // Dark but saturated navy is not "black".
        assert!(!is_black(color::to_lab([0, 0, 60])));

        assert!(is_white(color::to_lab([255, 255, 255])));
        assert!(is_white(color::to_lab([245, 245, 240])));
        assert!(!is_white(color::to_lab([255, 255, 150])));

        assert!(is_gray(color::to_lab([128, 128, 128])));
        assert!(is_gray(color::to_lab([0, 0, 0])));
        assert!(!is_gray(color::to_lab([128, 100, 100])));
    }

    #[test]
    fn filter_is_subtractive() {
        let samples = vec![
            sample([0, 0, 0], 4),
            sample([200, 30, 30], 7),
            sample([255, 255, 255], 2),
            sample([120, 120, 120], 5),
        ];

        let (kept, dropped) = filter(samples.clone(), Exclusions::NONE);
        assert_eq!(kept, samples);
        assert_eq!(dropped, 0);

        let (kept, dropped) = filter(samples.clone(), Exclusions::NONE.with(Exclusion::Black));
        assert_eq!(kept.len(), 3);
        assert_eq!(dropped, 4);

        let (kept, dropped) = filter(samples, Exclusions::ALL);
        assert_eq!(kept, vec![sample([200, 30, 30], 7)]);
        assert_eq!(dropped, 11);
    }

    #[test]
    fn everything_excluded_is_empty_not_error() {
        let (kept, dropped) = filter(vec![sample([0, 0, 0], 16)], Exclusions::ALL);
        assert!(kept.is_empty());
        assert_eq!(dropped, 16);
    }
}
