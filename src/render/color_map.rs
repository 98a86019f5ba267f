// SPDX-License-Identifier: GPL-3.0-or-later
use std::f64::consts::FRAC_PI_3;
use std::fmt;
use std::str::FromStr;

use colorous::Color;
use image::{GrayImage, Rgb, RgbImage};
use serde::de::{self, Deserialize, Deserializer};

/// One channel of a piecewise linear colormap, as `(position, value)` pairs.
type Segments = &'static [(f32, f32)];

/// The different ways a palette can be defined.
enum Palette {
    /// Each channel is interpolated independently.
    Segments {
        red: Segments,
        green: Segments,
        blue: Segments,
    },

    /// Colors evenly spaced across the range, linearly interpolated between.
    Stops(&'static [Color]),

    /// A colorous gradient, optionally reversed.
    Gradient {
        gradient: colorous::Gradient,
        reversed: bool,
    },

    /// Discrete colors, each given an equal share of the range.
    Qualitative(&'static [Color]),

    /// A function of the position for each channel.
    Formula(fn(f32) -> [f32; 3]),
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color { r, g, b }
}

const JET_RED: Segments = &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
const JET_GREEN: Segments = &[
    (0.0, 0.0),
    (0.125, 0.0),
    (0.375, 1.0),
    (0.64, 1.0),
    (0.91, 0.0),
    (1.0, 0.0),
];
const JET_BLUE: Segments = &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

const BWR: &[Color] = &[rgb(0, 0, 255), rgb(255, 255, 255), rgb(255, 0, 0)];

const SEISMIC: &[Color] = &[
    rgb(0, 0, 77),
    rgb(0, 0, 255),
    rgb(255, 255, 255),
    rgb(255, 0, 0),
    rgb(128, 0, 0),
];

const TAB20: &[Color] = &[
    rgb(0x1f, 0x77, 0xb4),
    rgb(0xae, 0xc7, 0xe8),
    rgb(0xff, 0x7f, 0x0e),
    rgb(0xff, 0xbb, 0x78),
    rgb(0x2c, 0xa0, 0x2c),
    rgb(0x98, 0xdf, 0x8a),
    rgb(0xd6, 0x27, 0x28),
    rgb(0xff, 0x98, 0x96),
    rgb(0x94, 0x67, 0xbd),
    rgb(0xc5, 0xb0, 0xd5),
    rgb(0x8c, 0x56, 0x4b),
    rgb(0xc4, 0x9c, 0x94),
    rgb(0xe3, 0x77, 0xc2),
    rgb(0xf7, 0xb6, 0xd2),
    rgb(0x7f, 0x7f, 0x7f),
    rgb(0xc7, 0xc7, 0xc7),
    rgb(0xbc, 0xbd, 0x22),
    rgb(0xdb, 0xdb, 0x8d),
    rgb(0x17, 0xbe, 0xcf),
    rgb(0x9e, 0xda, 0xe5),
];

const BRG: &[Color] = &[rgb(0, 0, 255), rgb(255, 0, 0), rgb(0, 255, 0)];

/// gnuplot's "rgbformulae 30,31,32".
fn gnuplot2(x: f32) -> [f32; 3] {
    let red = x / 0.32 - 0.78125;
    let green = 2.0 * x - 0.84;
    let blue = if x < 0.25 {
        4.0 * x
    } else if x < 0.92 {
        -2.0 * x + 1.84
    } else {
        x / 0.08 - 11.5
    };
    [red, green, blue]
}

/// The ends of coolwarm, in sRGB.
const COOLWARM_COLD: [f64; 3] = [0.229_805_7, 0.298_717_966, 0.753_683_153];
const COOLWARM_HOT: [f64; 3] = [0.705_673_158, 0.015_556_16, 0.150_232_812];

/// D65 reference white for the CIELAB conversions.
const WHITE_POINT: [f64; 3] = [0.9505, 1.0, 1.089];

fn to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn from_linear(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_f(t: f64) -> f64 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inverse(t: f64) -> f64 {
    let cubed = t * t * t;
    if cubed > 0.008_856 {
        cubed
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

/// Convert an sRGB color to Moreland's polar form of CIELAB (magnitude, saturation, hue).
fn srgb_to_msh([r, g, b]: [f64; 3]) -> [f64; 3] {
    let (r, g, b) = (to_linear(r), to_linear(g), to_linear(b));
    let x = 0.4124 * r + 0.3576 * g + 0.1805 * b;
    let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    let z = 0.0193 * r + 0.1192 * g + 0.9505 * b;
    let fx = lab_f(x / WHITE_POINT[0]);
    let fy = lab_f(y / WHITE_POINT[1]);
    let fz = lab_f(z / WHITE_POINT[2]);
    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);
    let m = (l * l + a * a + b * b).sqrt();
    [m, (l / m).acos(), b.atan2(a)]
}

fn msh_to_srgb([m, s, h]: [f64; 3]) -> [f64; 3] {
    let l = m * s.cos();
    let a = m * s.sin() * h.cos();
    let b = m * s.sin() * h.sin();
    let fy = (l + 16.0) / 116.0;
    let x = lab_f_inverse(a / 500.0 + fy) * WHITE_POINT[0];
    let y = lab_f_inverse(fy) * WHITE_POINT[1];
    let z = lab_f_inverse(fy - b / 200.0) * WHITE_POINT[2];
    let r = 3.2406 * x - 1.5372 * y - 0.4986 * z;
    let g = -0.9689 * x + 1.8758 * y + 0.0415 * z;
    let b = 0.0557 * x - 0.2040 * y + 1.0570 * z;
    [from_linear(r), from_linear(g), from_linear(b)]
}

/// The hue an unsaturated color should take when blending towards a saturated one.
fn adjust_hue([m, s, h]: [f64; 3], unsaturated_m: f64) -> f64 {
    if m >= unsaturated_m {
        return h;
    }
    let spin = s * (unsaturated_m * unsaturated_m - m * m).sqrt() / (m * s.sin());
    if h > -FRAC_PI_3 {
        h + spin
    } else {
        h - spin
    }
}

/// Kenneth Moreland's blue to red diverging colormap, which matplotlib's coolwarm is sampled
/// from.
fn coolwarm(x: f32) -> [f32; 3] {
    let mut cold = srgb_to_msh(COOLWARM_COLD);
    let mut hot = srgb_to_msh(COOLWARM_HOT);
    let mut t = x as f64;
    // Very different hues diverge through a neutral gray in the middle.
    if cold[1] > 0.05 && hot[1] > 0.05 && (cold[2] - hot[2]).abs() > FRAC_PI_3 {
        let middle = [cold[0].max(hot[0]).max(88.0), 0.0, 0.0];
        if t < 0.5 {
            hot = middle;
            t *= 2.0;
        } else {
            cold = middle;
            t = 2.0 * t - 1.0;
        }
    }
    if cold[1] < 0.05 && hot[1] > 0.05 {
        cold[2] = adjust_hue(hot, cold[0]);
    } else if hot[1] < 0.05 && cold[1] > 0.05 {
        hot[2] = adjust_hue(cold, hot[0]);
    }
    let mix = |i: usize| (1.0 - t) * cold[i] + t * hot[i];
    let [r, g, b] = msh_to_srgb([mix(0), mix(1), mix(2)]);
    [r as f32, g as f32, b as f32]
}

/// The colormaps that can be cycled through, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ColorMap {
    Jet = 0,
    Bwr,
    Seismic,
    Coolwarm,
    PinkGreenReversed,
    Tab10,
    Tab20,
    Gnuplot2,
    Brg,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::Jet
    }
}

impl ColorMap {
    pub(crate) const ALL: [ColorMap; 9] = [
        Self::Jet,
        Self::Bwr,
        Self::Seismic,
        Self::Coolwarm,
        Self::PinkGreenReversed,
        Self::Tab10,
        Self::Tab20,
        Self::Gnuplot2,
        Self::Brg,
    ];

    /// The position of this colormap in [`ColorMap::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// The matplotlib name of the colormap.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Jet => "jet",
            Self::Bwr => "bwr",
            Self::Seismic => "seismic",
            Self::Coolwarm => "coolwarm",
            Self::PinkGreenReversed => "PiYG_r",
            Self::Tab10 => "tab10",
            Self::Tab20 => "tab20",
            Self::Gnuplot2 => "gnuplot2",
            Self::Brg => "brg",
        }
    }

    fn palette(self) -> Palette {
        match self {
            Self::Jet => Palette::Segments {
                red: JET_RED,
                green: JET_GREEN,
                blue: JET_BLUE,
            },
            Self::Bwr => Palette::Stops(BWR),
            Self::Seismic => Palette::Stops(SEISMIC),
            Self::Coolwarm => Palette::Formula(coolwarm),
            Self::PinkGreenReversed => Palette::Gradient {
                gradient: colorous::PINK_GREEN,
                reversed: true,
            },
            // d3's category10 is the same palette as matplotlib's tab10
            Self::Tab10 => Palette::Qualitative(&colorous::CATEGORY10),
            Self::Tab20 => Palette::Qualitative(TAB20),
            Self::Gnuplot2 => Palette::Formula(gnuplot2),
            Self::Brg => Palette::Stops(BRG),
        }
    }

    /// Evaluate the colormap at `position`, which is clamped to `[0, 1]`.
    pub(crate) fn eval(self, position: f32) -> Rgb<u8> {
        let position = if position.is_nan() {
            0.0
        } else {
            position.max(0.0).min(1.0)
        };
        match self.palette() {
            Palette::Segments { red, green, blue } => Rgb([
                unit_to_u8(eval_segments(red, position)),
                unit_to_u8(eval_segments(green, position)),
                unit_to_u8(eval_segments(blue, position)),
            ]),
            Palette::Stops(stops) => eval_stops(stops, position),
            Palette::Gradient { gradient, reversed } => {
                let t = if reversed { 1.0 - position } else { position };
                Rgb(gradient.eval_continuous(t as f64).as_array())
            }
            Palette::Qualitative(colors) => {
                let n = colors.len();
                let index = ((position * n as f32) as usize).min(n - 1);
                let c = colors[index];
                Rgb([c.r, c.g, c.b])
            }
            Palette::Formula(formula) => {
                let [r, g, b] = formula(position);
                Rgb([unit_to_u8(r), unit_to_u8(g), unit_to_u8(b)])
            }
        }
    }

    /// A 256 entry lookup table, one color for each possible intensity.
    pub(crate) fn lut(self) -> Vec<Rgb<u8>> {
        (0..=u8::MAX)
            .map(|intensity| self.eval(intensity as f32 / u8::MAX as f32))
            .collect()
    }

    /// Map each intensity in `intensities` to a color.
    pub(crate) fn apply(self, intensities: &GrayImage) -> RgbImage {
        let lut = self.lut();
        let mut colors = RgbImage::new(intensities.width(), intensities.height());
        for (source, dest) in intensities.pixels().zip(colors.pixels_mut()) {
            *dest = lut[source.0[0] as usize];
        }
        colors
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMap {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|colormap| colormap.name().eq_ignore_ascii_case(s))
            .ok_or("Invalid colormap name")
    }
}

impl<'de> Deserialize<'de> for ColorMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name: String = Deserialize::deserialize(deserializer)?;
        name.parse().map_err(|_| {
            de::Error::invalid_value(de::Unexpected::Str(&name), &"the name of a colormap")
        })
    }
}

fn unit_to_u8(value: f32) -> u8 {
    (value.max(0.0).min(1.0) * u8::MAX as f32).round() as u8
}

fn eval_segments(segments: Segments, position: f32) -> f32 {
    for pair in segments.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if position <= x1 {
            let t = if x1 > x0 { (position - x0) / (x1 - x0) } else { 0.0 };
            return y0 + (y1 - y0) * t;
        }
    }
    segments.last().map(|(_, y)| *y).unwrap_or(0.0)
}

fn eval_stops(stops: &[Color], position: f32) -> Rgb<u8> {
    let scaled = position * (stops.len() - 1) as f32;
    let index = (scaled.floor() as usize).min(stops.len() - 2);
    let t = scaled - index as f32;
    let lower = stops[index];
    let upper = stops[index + 1];
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgb([
        lerp(lower.r, upper.r),
        lerp(lower.g, upper.g),
        lerp(lower.b, upper.b),
    ])
}

#[cfg(test)]
mod test {
    use image::{GrayImage, Luma, Rgb};

    use super::ColorMap;

    #[test]
    fn catalog_order() {
        let names: Vec<&str> = ColorMap::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            [
                "jet", "bwr", "seismic", "coolwarm", "PiYG_r", "tab10", "tab20", "gnuplot2",
                "brg"
            ]
        );
        for (index, colormap) in ColorMap::ALL.iter().enumerate() {
            assert_eq!(colormap.index(), index);
        }
    }

    #[test]
    fn jet_ends() {
        assert_eq!(ColorMap::Jet.eval(0.0), Rgb([0, 0, 128]));
        assert_eq!(ColorMap::Jet.eval(1.0), Rgb([128, 0, 0]));
        // Past the range is clamped
        assert_eq!(ColorMap::Jet.eval(-3.0), ColorMap::Jet.eval(0.0));
    }

    #[test]
    fn bwr_middle_is_white() {
        assert_eq!(ColorMap::Bwr.eval(0.0), Rgb([0, 0, 255]));
        assert_eq!(ColorMap::Bwr.eval(0.5), Rgb([255, 255, 255]));
        assert_eq!(ColorMap::Bwr.eval(1.0), Rgb([255, 0, 0]));
    }

    #[test]
    fn qualitative_bins() {
        let lut = ColorMap::Tab10.lut();
        assert_eq!(lut[0], Rgb([0x1f, 0x77, 0xb4]));
        assert_eq!(lut[255], Rgb([0x17, 0xbe, 0xcf]));
        // Ten equally sized bins
        let changes = lut.windows(2).filter(|pair| pair[0] != pair[1]).count();
        assert_eq!(changes, 9);
    }

    #[test]
    fn gnuplot2_ends() {
        assert_eq!(ColorMap::Gnuplot2.eval(0.0), Rgb([0, 0, 0]));
        assert_eq!(ColorMap::Gnuplot2.eval(1.0), Rgb([255, 255, 255]));
    }

    #[test]
    fn coolwarm_diverges_through_gray() {
        assert_eq!(ColorMap::Coolwarm.eval(0.0), Rgb([59, 76, 192]));
        assert_eq!(ColorMap::Coolwarm.eval(0.5), Rgb([221, 221, 221]));
        assert_eq!(ColorMap::Coolwarm.eval(1.0), Rgb([180, 4, 38]));
        let lut = ColorMap::Coolwarm.lut();
        assert!(lut[64][2] > lut[64][0]);
        assert!(lut[192][0] > lut[192][2]);
    }

    #[test]
    fn reversed_gradient() {
        let forward = colorous::PINK_GREEN.eval_continuous(0.0).as_array();
        assert_eq!(ColorMap::PinkGreenReversed.eval(1.0), Rgb(forward));
    }

    #[test]
    fn lut_size() {
        for colormap in ColorMap::ALL.iter() {
            assert_eq!(colormap.lut().len(), 256, "{} LUT is the wrong size", colormap);
        }
    }

    #[test]
    fn apply_uses_lut() {
        let intensities = GrayImage::from_fn(4, 2, |x, y| Luma([(x * 60 + y) as u8]));
        let colors = ColorMap::Seismic.apply(&intensities);
        let lut = ColorMap::Seismic.lut();
        for (x, y, pixel) in colors.enumerate_pixels() {
            assert_eq!(*pixel, lut[intensities.get_pixel(x, y).0[0] as usize]);
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("JET".parse::<ColorMap>(), Ok(ColorMap::Jet));
        assert_eq!("piyg_r".parse::<ColorMap>(), Ok(ColorMap::PinkGreenReversed));
        assert!("viridis".parse::<ColorMap>().is_err());
    }
}
