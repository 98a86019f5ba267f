// SPDX-License-Identifier: GPL-3.0-or-later
use image::{GrayImage, RgbImage};

/// Width of the MLX90640 pixel array.
pub const GRID_WIDTH: u32 = 32;

/// Height of the MLX90640 pixel array.
pub const GRID_HEIGHT: u32 = 24;

/// The number of samples in a single raw frame.
pub const NUM_PIXELS: usize = (GRID_WIDTH * GRID_HEIGHT) as usize;

/// Raw temperatures in degrees Celsius, row-major, [`NUM_PIXELS`] long.
pub type RawFrame = Vec<f32>;

/// Temperatures rescaled to the full range of a `u8`.
pub type NormalizedFrame = GrayImage;

/// The colorized, enlarged and annotated image shown in the window.
pub type DisplayImage = RgbImage;

/// A raw frame with every sample set to zero.
pub fn blank_frame() -> RawFrame {
    vec![0f32; NUM_PIXELS]
}
