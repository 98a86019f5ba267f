// SPDX-License-Identifier: GPL-3.0-or-later
use image::{GrayImage, Luma};

use crate::image_buffer::{NormalizedFrame, GRID_HEIGHT, GRID_WIDTH};

/// The smallest and largest temperatures in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Extremes {
    pub(crate) min: f32,
    pub(crate) max: f32,
}

/// Replace non-finite samples with 0, returning the extremes of the result.
pub(crate) fn sanitize(frame: &mut [f32]) -> Extremes {
    let mut extremes = Extremes {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };
    for value in frame.iter_mut() {
        if !value.is_finite() {
            *value = 0.0;
        }
        extremes.min = extremes.min.min(*value);
        extremes.max = extremes.max.max(*value);
    }
    if frame.is_empty() {
        extremes = Extremes { min: 0.0, max: 0.0 };
    }
    extremes
}

/// Rescale a sanitized frame so that its minimum is 0 and its maximum is 255.
///
/// A frame where every sample is the same normalizes to all zeros.
pub(crate) fn normalize(frame: &[f32], extremes: Extremes) -> NormalizedFrame {
    let mut normalized = GrayImage::new(GRID_WIDTH, GRID_HEIGHT);
    let min = extremes.min as f64;
    let range = extremes.max as f64 - min;
    if range <= 0.0 {
        return normalized;
    }
    for (value, pixel) in frame.iter().zip(normalized.pixels_mut()) {
        let scaled = ((*value as f64 - min) * u8::MAX as f64 / range).round();
        *pixel = Luma([scaled.max(0.0).min(u8::MAX as f64) as u8]);
    }
    normalized
}
