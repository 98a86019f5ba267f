// SPDX-License-Identifier: GPL-3.0-or-later
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use tracing::debug;

mod cli;

use crate::camera::CameraSettings;
use crate::render::RenderSettings;
use crate::window::WindowSettings;
pub(crate) use cli::Args;

fn default_log_path() -> PathBuf {
    PathBuf::from("./cam_log.log")
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct LoggingSettings {
    /// The file log messages are appended to.
    #[serde(default = "default_log_path")]
    pub(crate) path: PathBuf,

    /// A `tracing_subscriber` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub(crate) level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            level: default_log_level(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub(crate) struct Settings {
    /// Camera-specific settings.
    #[serde(default)]
    pub(crate) camera: CameraSettings,

    /// Settings related to how camera frames are rendered.
    #[serde(default)]
    pub(crate) render: RenderSettings,

    /// Settings for the window the frames are shown in.
    #[serde(default)]
    pub(crate) window: WindowSettings,

    #[serde(default)]
    pub(crate) logging: LoggingSettings,
}

impl Settings {
    /// Load settings from a TOML file. A missing file is the same as an empty one.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                String::new()
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Unable to read config file {}", path.display()))
            }
        };
        toml::from_str(&data).with_context(|| format!("Invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod settings_test {
    use std::io::Write;
    use std::path::PathBuf;

    use crate::camera::{CameraSettings, RepeatMode};
    use crate::render::{ColorMap, Interpolation};

    use super::{LoggingSettings, Settings};

    #[test]
    fn empty_is_default() {
        let parsed: Result<Settings, _> = toml::from_str("");
        assert!(
            parsed.is_ok(),
            "Failed to parse empty TOML: {}",
            parsed.unwrap_err()
        );
        let parsed = parsed.unwrap();
        assert_eq!(parsed, Settings::default());
        assert_eq!(parsed.logging.level, "warn");
        assert_eq!(parsed.logging.path, PathBuf::from("./cam_log.log"));
    }

    #[test]
    fn full() {
        let source = r#"
        [camera]
        kind = "mock"
        path = "recording.toml"
        repeat_mode = "none"

        [render]
        colormap = "gnuplot2"
        interpolation = "nearest"

        [window]
        fullscreen = false

        [logging]
        path = "/tmp/thermal.log"
        level = "thermal_viewer=debug"
        "#;
        let parsed: Result<Settings, _> = toml::from_str(source);
        assert!(
            parsed.is_ok(),
            "Failed to parse settings: {}",
            parsed.unwrap_err()
        );
        let parsed = parsed.unwrap();
        assert_eq!(
            parsed.camera,
            CameraSettings::MockCamera {
                path: PathBuf::from("recording.toml"),
                frame_rate: None,
                repeat_mode: RepeatMode::None,
            }
        );
        assert_eq!(parsed.render.colormap, ColorMap::Gnuplot2);
        assert_eq!(parsed.render.interpolation, Interpolation::Nearest);
        assert!(parsed.render.smoothing);
        assert!(!parsed.window.fullscreen);
        assert_eq!(
            parsed.logging,
            LoggingSettings {
                path: PathBuf::from("/tmp/thermal.log"),
                level: "thermal_viewer=debug".to_string(),
            }
        );
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load(&dir.path().join("config.toml"));
        assert!(loaded.is_ok(), "{:?}", loaded);
        assert_eq!(loaded.unwrap(), Settings::default());
    }

    #[test]
    fn load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[render]\nsmoothing = false\n").unwrap();
        let loaded = Settings::load(file.path()).unwrap();
        assert!(!loaded.render.smoothing);
    }

    #[test]
    fn load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[render]\ninterpolation = \"bicubic\"\n").unwrap();
        assert!(Settings::load(file.path()).is_err());
    }
}
