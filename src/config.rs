use std::fmt;
use std::str::FromStr;

use crate::color::DeltaFormula;
use crate::error::{PaletteError, Result};

// ------------------------------------------------------------
// Quality tiers
// ------------------------------------------------------------

/// How aggressively the image is downsampled before analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Quality {
    /// At most 1 000 pixels are analysed.
    Fast,
    /// At most 10 000 pixels are analysed.
    #[default]
    Fair,
    /// At most 100 000 pixels are analysed.
    High,
    /// The image is analysed at its logical resolution.
    Best,
}

impl Quality {
    /// Fixed pixel budget of the tier. `None` for [`Quality::Best`], whose
    /// ceiling depends on the image's resolution.
    pub fn pixel_budget(self) -> Option<u64> {
        match self {
            Quality::Fast => Some(1_000),
            Quality::Fair => Some(10_000),
            Quality::High => Some(100_000),
            Quality::Best => None,
        }
    }
}

// ------------------------------------------------------------
// Exclusions
// ------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Exclusion {
    Black,
    White,
    Gray,
}

/// Set of enabled exclusion predicates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Exclusions {
    pub black: bool,
    pub white: bool,
    pub gray: bool,
}

impl Exclusions {
    pub const NONE: Exclusions = Exclusions { black: false, white: false, gray: false };
    pub const ALL: Exclusions = Exclusions { black: true, white: true, gray: true };

    pub fn with(mut self, exclusion: Exclusion) -> Self {
        match exclusion {
            Exclusion::Black => self.black = true,
            Exclusion::White => self.white = true,
            Exclusion::Gray => self.gray = true,
        }
        self
    }

    pub fn contains(&self, exclusion: Exclusion) -> bool {
        match exclusion {
            Exclusion::Black => self.black,
            Exclusion::White => self.white,
            Exclusion::Gray => self.gray,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.black || self.white || self.gray)
    }
}

impl FromIterator<Exclusion> for Exclusions {
    fn from_iter<I: IntoIterator<Item = Exclusion>>(iter: I) -> Self {
        iter.into_iter().fold(Exclusions::NONE, Exclusions::with)
    }
}

// ------------------------------------------------------------
// Sort strategies
// ------------------------------------------------------------

/// Order of the returned palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Descending aggregate weight.
    #[default]
    Frequency,
    /// Ascending perceptual lightness.
    DarkToLight,
    /// Descending perceptual lightness.
    LightToDark,
    /// Ascending LCh hue angle. Near-neutral colors, whose hue is noise,
    /// follow every chromatic one, dark to light.
    Hue,
    /// Saturated mid-lightness colors first.
    Visual,
}

// ------------------------------------------------------------
// Configuration
// ------------------------------------------------------------

/// Everything that controls a palette extraction.
///
/// Fields are public so the struct can be built literally; the chained
/// setters exist for the common "defaults plus a couple of overrides" case.
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteConfig {
    pub max_colors: usize,
    pub quality: Quality,
    pub formula: DeltaFormula,
    pub exclusions: Exclusions,
    /// Entries closer than this (in units of `formula`) are merged.
    pub merge_threshold: f32,
    pub sort: SortOrder,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            max_colors: 8,
            quality: Quality::default(),
            formula: DeltaFormula::default(),
            exclusions: Exclusions::NONE,
            merge_threshold: 10.0,
            sort: SortOrder::default(),
        }
    }
}

impl PaletteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_colors(mut self, max_colors: usize) -> Self {
        self.max_colors = max_colors;
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn formula(mut self, formula: DeltaFormula) -> Self {
        self.formula = formula;
        self
    }

    pub fn exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn exclude(mut self, exclusion: Exclusion) -> Self {
        self.exclusions = self.exclusions.with(exclusion);
        self
    }

    pub fn merge_threshold(mut self, merge_threshold: f32) -> Self {
        self.merge_threshold = merge_threshold;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_colors == 0 {
            return Err(PaletteError::InvalidConfiguration(
                "max_colors must be at least 1".into(),
            ));
        }
        if !self.merge_threshold.is_finite() || self.merge_threshold < 0.0 {
            return Err(PaletteError::InvalidConfiguration(format!(
                "merge_threshold must be a finite non-negative number, got {}",
                self.merge_threshold
            )));
        }
        Ok(())
    }
}

// ------------------------------------------------------------
// Name parsing shared by the CLI and the JS binding
// ------------------------------------------------------------

fn unknown(kind: &str, value: &str, expected: &[&str]) -> PaletteError {
    PaletteError::InvalidConfiguration(format!(
        "unknown {kind} `{value}` (expected one of: {})",
        expected.join(", ")
    ))
}

macro_rules! named_enum {
    ($ty:ty, $kind:literal, { $($variant:path => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub const NAMES: &'static [&'static str] = &[$($name),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = PaletteError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name $(| $alias)* => Ok($variant),)+
                    other => Err(unknown($kind, other, Self::NAMES)),
                }
            }
        }
    };
}

named_enum!(Quality, "quality", {
    Quality::Fast => "fast" | "low",
    Quality::Fair => "fair",
    Quality::High => "high",
    Quality::Best => "best",
});

named_enum!(Exclusion, "exclusion", {
    Exclusion::Black => "black",
    Exclusion::White => "white",
    Exclusion::Gray => "gray" | "grey",
});

named_enum!(SortOrder, "sort order", {
    SortOrder::Frequency => "frequency",
    SortOrder::DarkToLight => "dark-to-light" | "lightness",
    SortOrder::LightToDark => "light-to-dark" | "darkness",
    SortOrder::Hue => "hue",
    SortOrder::Visual => "visual",
});

named_enum!(DeltaFormula, "formula", {
    DeltaFormula::Cie76 => "cie76" | "euclidean",
    DeltaFormula::Cie94 => "cie94",
    DeltaFormula::Ciede2000 => "ciede2000",
});

impl FromStr for Exclusions {
    type Err = PaletteError;

    /// Parses a comma separated list such as `black,white`. An empty string
    /// or `none` yields the empty set.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Exclusions::NONE);
        }
        s.split(',').map(str::parse::<Exclusion>).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PaletteConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_max_colors() {
        let config = PaletteConfig::new().max_colors(0);
        assert!(matches!(
            config.validate(),
            Err(PaletteError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_negative_or_nan_threshold() {
        for t in [-0.5, f32::NAN, f32::INFINITY] {
            let config = PaletteConfig::new().merge_threshold(t);
            assert!(config.validate().is_err(), "threshold {t} accepted");
        }
        assert!(PaletteConfig::new().merge_threshold(0.0).validate().is_ok());
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("FAST".parse::<Quality>().unwrap(), Quality::Fast);
        assert_eq!("grey".parse::<Exclusion>().unwrap(), Exclusion::Gray);
        assert_eq!(
            "dark-to-light".parse::<SortOrder>().unwrap(),
            SortOrder::DarkToLight
        );
        assert_eq!(
            "ciede2000".parse::<DeltaFormula>().unwrap(),
            DeltaFormula::Ciede2000
        );
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn names_round_trip_through_display() {
        for name in SortOrder::NAMES {
            let order: SortOrder = name.parse().unwrap();
            assert_eq!(order.to_string(), *name);
        }
    }

    #[test]
    fn parses_exclusion_lists() {
        let set: Exclusions = "black, white".parse().unwrap();
        assert!(set.black && set.white && !set.gray);
        assert!("none".parse::<Exclusions>().unwrap().is_empty());
        assert!("black,blue".parse::<Exclusions>().is_err());
    }
}
