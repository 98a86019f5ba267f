// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use serde::Deserialize;

use crate::state::DisplayState;

use super::color_map::ColorMap;
use super::font::DEFAULT_FONT_SIZE;
use super::interpolation::Interpolation;

fn default_smoothing() -> bool {
    true
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct RenderSettings {
    /// The colormap shown at startup.
    #[serde(default)]
    pub(crate) colormap: ColorMap,

    /// The interpolation method used at startup.
    #[serde(default)]
    pub(crate) interpolation: Interpolation,

    /// Whether edge-preserving smoothing is applied after enlarging.
    #[serde(default = "default_smoothing")]
    pub(crate) smoothing: bool,

    /// The width (in pixels) of the rendered image.
    #[serde(default = "default_width")]
    pub(crate) width: u32,

    /// The height (in pixels) of the rendered image.
    #[serde(default = "default_height")]
    pub(crate) height: u32,

    /// A TrueType font used for the overlay text, instead of the built in DejaVu Sans.
    #[serde(default)]
    pub(crate) font_path: Option<PathBuf>,

    #[serde(default = "default_font_size")]
    pub(crate) font_size: f32,
}

impl RenderSettings {
    /// The selections the viewer starts with.
    pub(crate) fn display_state(&self) -> DisplayState {
        DisplayState::new(self.colormap, self.interpolation, self.smoothing)
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            colormap: ColorMap::default(),
            interpolation: Interpolation::default(),
            smoothing: default_smoothing(),
            width: default_width(),
            height: default_height(),
            font_path: None,
            font_size: default_font_size(),
        }
    }
}

#[cfg(test)]
mod render_test {
    use std::path::PathBuf;

    use crate::state::DisplayState;

    use super::{ColorMap, Interpolation, RenderSettings};

    #[test]
    fn defaults() {
        let parsed: Result<RenderSettings, _> = toml::from_str("");
        assert!(
            parsed.is_ok(),
            "Failed to parse empty TOML: {}",
            parsed.unwrap_err()
        );
        let parsed = parsed.unwrap();
        let expected = RenderSettings::default();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.display_state(), DisplayState::default());
        assert_eq!((parsed.width, parsed.height), (800, 600));
        assert_eq!(parsed.font_path, None);
    }

    #[test]
    fn colormap() {
        let parsed: Result<RenderSettings, _> = toml::from_str("colormap = \"PiYG_r\"");
        assert!(
            parsed.is_ok(),
            "Failed to parse colormap: {}",
            parsed.unwrap_err()
        );
        let parsed = parsed.unwrap();
        let expected = RenderSettings {
            colormap: ColorMap::PinkGreenReversed,
            ..RenderSettings::default()
        };
        assert_eq!(parsed, expected);
    }

    #[test]
    fn invalid_colormap() {
        let parsed: Result<RenderSettings, _> = toml::from_str("colormap = \"turbo\"");
        assert!(parsed.is_err(), "Accepted unknown colormap");
    }

    #[test]
    fn interpolation_short_name() {
        let parsed: Result<RenderSettings, _> = toml::from_str("interpolation = \"area\"");
        assert!(
            parsed.is_ok(),
            "Failed to parse interpolation: {}",
            parsed.unwrap_err()
        );
        let parsed = parsed.unwrap();
        assert_eq!(parsed.interpolation, Interpolation::Area);
    }

    #[test]
    fn full() {
        let source = r#"
        colormap = "tab20"
        interpolation = "Scipy/CV2 Mixed"
        smoothing = false
        width = 640
        height = 480
        font_path = "/opt/fonts/mono.ttf"
        font_size = 12.5
        "#;
        let parsed: Result<RenderSettings, _> = toml::from_str(source);
        assert!(
            parsed.is_ok(),
            "Failed to parse full settings: {}",
            parsed.unwrap_err()
        );
        let parsed = parsed.unwrap();
        let expected = RenderSettings {
            colormap: ColorMap::Tab20,
            interpolation: Interpolation::ScipyMixed,
            smoothing: false,
            width: 640,
            height: 480,
            font_path: Some(PathBuf::from("/opt/fonts/mono.ttf")),
            font_size: 12.5,
        };
        assert_eq!(parsed, expected);
        let state = parsed.display_state();
        assert_eq!(state.colormap(), ColorMap::Tab20);
        assert_eq!(state.interpolation(), Interpolation::ScipyMixed);
        assert!(!state.smoothing);
    }
}
