//! sRGB ↔ CIE L*a*b* conversion and the perceptual distance formulas.
//!
//! Colors enter the pipeline as 8-bit sRGB triples (`[0, 255]` per channel).
//! Lab uses the D65 reference white, matching `palette`'s defaults.

use palette::color_difference::{Ciede2000, EuclideanDistance};
use palette::white_point::D65;
use palette::{FromColor, Lab, Lch, Srgb};

pub type LabColor = Lab<D65, f32>;

/// Exact 8-bit sRGB triple used as the identity of a sampled color.
pub type ColorKey = [u8; 3];

/// Upper bound on the Lab chroma of any 8-bit sRGB color (pure blue is about
/// 133.8).
pub const MAX_SRGB_CHROMA: f32 = 135.0;

// CIE94 graphic-arts constants.
const K1: f32 = 0.045;
const K2: f32 = 0.015;

/// Largest CIEDE2000 lightness weighting S_L for a mean L* in [0, 100].
const DE2000_MAX_SL: f32 = 1.75;
/// sin(60°), the largest |sin(2Δθ)| the CIEDE2000 rotation term can reach.
const DE2000_MAX_ROTATION: f32 = 0.866_026;

/// Convert an 8-bit sRGB triple into Lab.
pub fn to_lab(key: ColorKey) -> LabColor {
    let srgb = Srgb::new(key[0], key[1], key[2]).into_format::<f32>();
    Lab::from_color(srgb)
}

/// Convert a Lab color back to the nearest 8-bit sRGB triple. Out-of-gamut
/// values saturate at the channel limits.
pub fn from_lab(lab: LabColor) -> ColorKey {
    let rgb: Srgb<u8> = Srgb::<f32>::from_color(lab).into_format();
    [rgb.red, rgb.green, rgb.blue]
}

pub fn chroma(lab: LabColor) -> f32 {
    (lab.a * lab.a + lab.b * lab.b).sqrt()
}

/// LCh hue angle in degrees, `[0, 360)`.
pub fn hue_degrees(lab: LabColor) -> f32 {
    Lch::<D65, f32>::from_color(lab).hue.into_positive_degrees()
}

/// Closed set of color-difference formulas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeltaFormula {
    /// CIE76: plain Euclidean distance in Lab.
    Cie76,
    /// CIE94: chroma/hue weighted Euclidean distance. The weights come from
    /// the first argument, so the formula is not symmetric.
    Cie94,
    /// CIEDE2000.
    #[default]
    Ciede2000,
}

impl DeltaFormula {
    pub fn distance(self, reference: LabColor, sample: LabColor) -> f32 {
        match self {
            DeltaFormula::Cie76 => reference.distance_squared(sample).sqrt(),
            DeltaFormula::Cie94 => cie94(reference, sample),
            DeltaFormula::Ciede2000 => reference.difference(sample).max(0.0),
        }
    }

    pub fn is_symmetric(self) -> bool {
        !matches!(self, DeltaFormula::Cie94)
    }

    /// Order-independent distance between two colors: the smaller of both
    /// argument orders. Equal to [`DeltaFormula::distance`] for symmetric
    /// formulas.
    pub fn pair_distance(self, a: LabColor, b: LabColor) -> f32 {
        let forward = self.distance(a, b);
        if self.is_symmetric() {
            forward
        } else {
            forward.min(self.distance(b, a))
        }
    }

    /// Weight on a lightness difference in [`DeltaFormula::lower_bound`].
    pub fn lightness_weight(self) -> f32 {
        match self {
            DeltaFormula::Ciede2000 => 1.0 / DE2000_MAX_SL,
            DeltaFormula::Cie76 | DeltaFormula::Cie94 => 1.0,
        }
    }

    /// Weight on an a*b* difference between colors whose chroma is at most
    /// `chroma`. Non-increasing in `chroma`.
    pub fn chroma_weight(self, chroma: f32) -> f32 {
        match self {
            DeltaFormula::Cie76 => 1.0,
            // S_H <= S_C, and ΔC² + ΔH² >= Δa² + Δb².
            DeltaFormula::Cie94 => 1.0 / (1.0 + K1 * chroma),
            DeltaFormula::Ciede2000 => {
                // a* is stretched by 1 + G with G <= 0.5, so C' <= 1.5 C.
                // S_H <= S_C because T < 3. The rotation term removes at most
                // R_C * sin(60°) / 2 of the chroma/hue part.
                let c = 1.5 * chroma;
                let c7 = c.powi(7);
                let rc = 2.0 * (c7 / (c7 + 25f32.powi(7))).sqrt();
                let rotation = (1.0 - rc * DE2000_MAX_ROTATION / 2.0).max(0.0);
                rotation.sqrt() / (1.0 + K1 * c)
            }
        }
    }

    /// Lower bound on [`DeltaFormula::pair_distance`] for two colors whose L*
    /// differs by `dl`, whose a*b* positions are `dab` apart and whose chroma
    /// are both at most `chroma`.
    pub fn lower_bound(self, dl: f32, dab: f32, chroma: f32) -> f32 {
        let l = dl * self.lightness_weight();
        let ab = dab * self.chroma_weight(chroma);
        (l * l + ab * ab).sqrt()
    }

    /// Largest a*b* separation at which a partner of a color with chroma
    /// `chroma` can still lie within `budget`. Chroma grows by at most the
    /// a*b* distance travelled, which tightens the reach for dull colors.
    pub fn ab_reach(self, budget: f32, chroma: f32) -> f32 {
        let mut reach = budget / self.chroma_weight(MAX_SRGB_CHROMA);
        for _ in 0..3 {
            let far = (chroma + reach).min(MAX_SRGB_CHROMA);
            reach = reach.min(budget / self.chroma_weight(far));
        }
        reach
    }
}

fn cie94(reference: LabColor, sample: LabColor) -> f32 {
    let delta_l = reference.l - sample.l;
    let c1 = chroma(reference);
    let c2 = chroma(sample);
    let delta_c = c1 - c2;

    let delta_a = reference.a - sample.a;
    let delta_b = reference.b - sample.b;
    let delta_h = (delta_a * delta_a + delta_b * delta_b - delta_c * delta_c)
        .max(0.0)
        .sqrt();

    let s_c = 1.0 + K1 * c1;
    let s_h = 1.0 + K2 * c1;

    let term_c = delta_c / s_c;
    let term_h = delta_h / s_h;

    (delta_l * delta_l + term_c * term_c + term_h * term_h).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "{a} !≈ {b}");
    }

    #[test]
    fn white_and_black_hit_the_lightness_extremes() {
        let white = to_lab([255, 255, 255]);
        approx(white.l, 100.0, 1e-2);
        approx(white.a, 0.0, 1e-2);
        approx(white.b, 0.0, 1e-2);
        approx(to_lab([0, 0, 0]).l, 0.0, 1e-3);
    }

    #[test]
    fn lab_round_trip_recovers_the_key() {
        for key in [[255, 0, 0], [12, 200, 99], [128, 128, 128], [1, 2, 3]] {
            assert_eq!(from_lab(to_lab(key)), key);
        }
    }

    #[test]
    fn identical_colors_have_zero_distance() {
        let lab = to_lab([40, 90, 200]);
        for formula in [DeltaFormula::Cie76, DeltaFormula::Cie94, DeltaFormula::Ciede2000] {
            approx(formula.distance(lab, lab), 0.0, 1e-4);
        }
    }

    #[test]
    fn cie76_is_euclidean() {
        let a = Lab::new(50.0, 10.0, -10.0);
        let b = Lab::new(53.0, 14.0, -10.0);
        approx(DeltaFormula::Cie76.distance(a, b), 5.0, 1e-4);
    }

    #[test]
    fn cie94_red_green_reference() {
        let d = DeltaFormula::Cie94.distance(to_lab([255, 0, 0]), to_lab([0, 255, 0]));
        approx(d, 73.43, 0.5);
    }

    #[test]
    fn cie94_is_asymmetric_but_pair_distance_is_not() {
        let vivid = to_lab([230, 20, 40]);
        let muted = to_lab([150, 110, 110]);
        let forward = DeltaFormula::Cie94.distance(vivid, muted);
        let backward = DeltaFormula::Cie94.distance(muted, vivid);
        assert!((forward - backward).abs() > 1e-3);

        let pair = DeltaFormula::Cie94.pair_distance(vivid, muted);
        assert_eq!(pair, DeltaFormula::Cie94.pair_distance(muted, vivid));
        assert_eq!(pair, forward.min(backward));
    }

    #[test]
    fn ciede2000_sharma_reference_pair() {
        let a = Lab::new(50.0, 2.6772, -79.7751);
        let b = Lab::new(50.0, 0.0, -82.7485);
        approx(DeltaFormula::Ciede2000.distance(a, b), 2.0425, 1e-2);
    }

    #[test]
    fn lower_bound_never_exceeds_the_distance() {
        let mut state = 0x2545_f491_4f6c_dd1du64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let [r, g, b, ..] = state.to_le_bytes();
            [r, g, b]
        };
        let mut pairs: Vec<(ColorKey, ColorKey)> = (0..4000).map(|_| (next(), next())).collect();
        pairs.push(([0, 0, 255], [0, 0, 250]));
        pairs.push(([0, 0, 255], [40, 0, 255]));
        pairs.push(([255, 0, 255], [0, 0, 0]));

        for formula in [DeltaFormula::Cie76, DeltaFormula::Cie94, DeltaFormula::Ciede2000] {
            for &(x, y) in &pairs {
                let (a, b) = (to_lab(x), to_lab(y));
                assert!(chroma(a) <= MAX_SRGB_CHROMA && chroma(b) <= MAX_SRGB_CHROMA);
                let dl = (a.l - b.l).abs();
                let dab = ((a.a - b.a).powi(2) + (a.b - b.b).powi(2)).sqrt();
                let bound = formula.lower_bound(dl, dab, chroma(a).max(chroma(b)));
                let exact = formula.pair_distance(a, b);
                assert!(bound <= exact * 1.001 + 1e-4, "{formula} {x:?} {y:?}: {bound} > {exact}");
            }
        }
    }

    #[test]
    fn ab_reach_covers_the_bound() {
        for formula in [DeltaFormula::Cie76, DeltaFormula::Cie94, DeltaFormula::Ciede2000] {
            for chroma in [0.0, 20.0, 80.0, 130.0] {
                let reach = formula.ab_reach(3.0, chroma);
                let far = (chroma + reach).min(MAX_SRGB_CHROMA);
                assert!(reach * formula.chroma_weight(far) >= 3.0 * 0.999, "{formula}");
            }
        }
    }

    #[test]
    fn hue_is_positive() {
        let blue = hue_degrees(to_lab([0, 0, 255]));
        assert!((0.0..360.0).contains(&blue));
        assert!(blue > 270.0 && blue < 320.0, "blue hue {blue}");
    }
}
