// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};

use super::resize::Method;

/// How a frame is taken from the sensor's grid up to the output size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// Colorize the grid, then resize it with the given method.
    Resize(Method),

    /// Zoom the intensities with a cubic spline, colorize, then optionally resize.
    Zoom {
        factor: u32,
        resize: Option<Method>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Interpolation {
    Nearest = 0,
    Linear,
    Area,
    Cubic,
    Lanczos4,
    PureScipy,
    ScipyMixed,
}

impl Default for Interpolation {
    fn default() -> Self {
        Self::Cubic
    }
}

impl Interpolation {
    pub(crate) const ALL: [Interpolation; 7] = [
        Self::Nearest,
        Self::Linear,
        Self::Area,
        Self::Cubic,
        Self::Lanczos4,
        Self::PureScipy,
        Self::ScipyMixed,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// The name shown in the overlay.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Nearest => "Nearest",
            Self::Linear => "Inter Linear",
            Self::Area => "Inter Area",
            Self::Cubic => "Inter Cubic",
            Self::Lanczos4 => "Inter Lanczos4",
            Self::PureScipy => "Pure Scipy",
            Self::ScipyMixed => "Scipy/CV2 Mixed",
        }
    }

    /// The name used in configuration files.
    pub(crate) fn short_name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Area => "area",
            Self::Cubic => "cubic",
            Self::Lanczos4 => "lanczos4",
            Self::PureScipy => "scipy",
            Self::ScipyMixed => "mixed",
        }
    }

    pub(crate) fn strategy(self) -> Strategy {
        match self {
            Self::Nearest => Strategy::Resize(Method::Nearest),
            Self::Linear => Strategy::Resize(Method::Triangle),
            Self::Area => Strategy::Resize(Method::Area),
            Self::Cubic => Strategy::Resize(Method::CatmullRom),
            Self::Lanczos4 => Strategy::Resize(Method::Lanczos4),
            Self::PureScipy => Strategy::Zoom {
                factor: 25,
                resize: None,
            },
            Self::ScipyMixed => Strategy::Zoom {
                factor: 10,
                resize: Some(Method::CatmullRom),
            },
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interpolation {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|interpolation| {
                interpolation.label().eq_ignore_ascii_case(s)
                    || interpolation.short_name().eq_ignore_ascii_case(s)
            })
            .ok_or("Invalid interpolation name")
    }
}

impl<'de> Deserialize<'de> for Interpolation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name: String = Deserialize::deserialize(deserializer)?;
        name.parse().map_err(|_| {
            de::Error::invalid_value(de::Unexpected::Str(&name), &"an interpolation method")
        })
    }
}

#[cfg(test)]
mod test {
    use super::super::resize::Method;
    use super::{Interpolation, Strategy};

    #[test]
    fn catalog_order() {
        let labels: Vec<&str> = Interpolation::ALL.iter().map(|i| i.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Nearest",
                "Inter Linear",
                "Inter Area",
                "Inter Cubic",
                "Inter Lanczos4",
                "Pure Scipy",
                "Scipy/CV2 Mixed",
            ]
        );
        for (index, interpolation) in Interpolation::ALL.iter().enumerate() {
            assert_eq!(interpolation.index(), index);
        }
    }

    #[test]
    fn default_is_cubic() {
        assert_eq!(Interpolation::default().index(), 3);
        assert_eq!(
            Interpolation::default().strategy(),
            Strategy::Resize(Method::CatmullRom)
        );
    }

    #[test]
    fn parse_labels_and_short_names() {
        assert_eq!(
            "Scipy/CV2 Mixed".parse::<Interpolation>(),
            Ok(Interpolation::ScipyMixed)
        );
        assert_eq!("lanczos4".parse::<Interpolation>(), Ok(Interpolation::Lanczos4));
        assert_eq!("INTER AREA".parse::<Interpolation>(), Ok(Interpolation::Area));
        assert!("bicubic".parse::<Interpolation>().is_err());
    }

    #[test]
    fn deserialize() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            interpolation: Interpolation,
        }
        let parsed: Wrapper = toml::from_str(r#"interpolation = "Pure Scipy""#).unwrap();
        assert_eq!(parsed.interpolation, Interpolation::PureScipy);
        let parsed: Result<Wrapper, _> = toml::from_str(r#"interpolation = "sideways""#);
        assert!(parsed.is_err());
    }
}
