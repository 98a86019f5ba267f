// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use serde::Deserialize;

fn default_title() -> String {
    "Thermal Camera".to_string()
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    900
}

fn default_fullscreen() -> bool {
    true
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./thermal_snapshots/")
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct WindowSettings {
    #[serde(default = "default_title")]
    pub(crate) title: String,

    /// The width of the window, in screen pixels.
    #[serde(default = "default_width")]
    pub(crate) width: u32,

    /// The height of the window, in screen pixels.
    #[serde(default = "default_height")]
    pub(crate) height: u32,

    #[serde(default = "default_fullscreen")]
    pub(crate) fullscreen: bool,

    /// The directory snapshots are saved in. It is created if it doesn't exist.
    #[serde(default = "default_snapshot_path")]
    pub(crate) snapshot_path: PathBuf,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            fullscreen: default_fullscreen(),
            snapshot_path: default_snapshot_path(),
        }
    }
}
