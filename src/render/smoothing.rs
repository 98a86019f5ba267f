// SPDX-License-Identifier: GPL-3.0-or-later
use image::RgbImage;
use rayon::prelude::*;

/// How far (in pixels) from the center the smoothing neighborhood reaches.
pub(crate) const RADIUS: i32 = 7;

pub(crate) const SIGMA_COLOR: f32 = 80.0;

pub(crate) const SIGMA_SPATIAL: f32 = 80.0;

/// The largest possible sum of the per-channel differences between two pixels.
const MAX_COLOR_DISTANCE: usize = 3 * 255;

/// Precomputed weights for a bilateral filter.
#[derive(Clone, Debug)]
struct Kernel {
    /// Neighbor offsets within a circle of [`RADIUS`], with their spatial weight.
    offsets: Vec<(i32, i32, f32)>,

    /// Weight for each possible color distance.
    color: Vec<f32>,
}

impl Kernel {
    fn new(radius: i32, sigma_color: f32, sigma_spatial: f32) -> Self {
        let spatial_coeff = -0.5 / (sigma_spatial * sigma_spatial);
        let color_coeff = -0.5 / (sigma_color * sigma_color);
        let mut offsets = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let distance_squared = (dx * dx + dy * dy) as f32;
                if distance_squared > (radius * radius) as f32 {
                    continue;
                }
                offsets.push((dx, dy, (distance_squared * spatial_coeff).exp()));
            }
        }
        let color = (0..=MAX_COLOR_DISTANCE)
            .map(|distance| {
                let distance = distance as f32;
                (distance * distance * color_coeff).exp()
            })
            .collect();
        Self { offsets, color }
    }
}

/// Reflect an index back into `0..len` without repeating the edge pixel.
fn reflect(index: i32, len: i32) -> i32 {
    if len == 1 {
        return 0;
    }
    let mut index = index;
    while index < 0 || index >= len {
        index = if index < 0 {
            -index
        } else {
            2 * (len - 1) - index
        };
    }
    index
}

/// Copy an image into a flat buffer with `radius` reflected pixels around every edge.
fn pad(image: &RgbImage, radius: i32) -> (Vec<u8>, usize) {
    let (width, height) = (image.width() as i32, image.height() as i32);
    let padded_width = (width + 2 * radius) as usize;
    let mut padded = Vec::with_capacity(padded_width * (height + 2 * radius) as usize * 3);
    for y in -radius..height + radius {
        let source_y = reflect(y, height) as u32;
        for x in -radius..width + radius {
            let source_x = reflect(x, width) as u32;
            padded.extend_from_slice(&image.get_pixel(source_x, source_y).0);
        }
    }
    (padded, padded_width)
}

/// Smooth out the blockiness of an enlarged image while keeping edges sharp.
///
/// This is a bilateral filter where the color distance between two pixels is the sum of the
/// differences of all three channels, so every channel of a pixel gets the same weight. Rows are
/// filtered in parallel.
pub(crate) fn smooth(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let kernel = Kernel::new(RADIUS, SIGMA_COLOR, SIGMA_SPATIAL);
    let (padded, padded_width) = pad(image, RADIUS);
    // Offsets into the padded buffer, relative to the center pixel.
    let offsets: Vec<(isize, f32)> = kernel
        .offsets
        .iter()
        .map(|(dx, dy, weight)| {
            let offset = (*dy as isize * padded_width as isize + *dx as isize) * 3;
            (offset, *weight)
        })
        .collect();
    let row_length = width as usize * 3;
    let mut smoothed = RgbImage::new(width, height);
    smoothed
        .par_chunks_mut(row_length)
        .enumerate()
        .for_each(|(y, row)| {
            let padded_row = (y + RADIUS as usize) * padded_width;
            for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
                let center = (padded_row + x + RADIUS as usize) * 3;
                let center_pixel = &padded[center..center + 3];
                let mut sum = [0f32; 3];
                let mut total_weight = 0f32;
                for (offset, spatial_weight) in offsets.iter() {
                    let neighbor = (center as isize + offset) as usize;
                    let neighbor_pixel = &padded[neighbor..neighbor + 3];
                    let distance: usize = center_pixel
                        .iter()
                        .zip(neighbor_pixel)
                        .map(|(a, b)| (*a as i32 - *b as i32).abs() as usize)
                        .sum();
                    let weight = spatial_weight * kernel.color[distance];
                    for channel in 0..3 {
                        sum[channel] += neighbor_pixel[channel] as f32 * weight;
                    }
                    total_weight += weight;
                }
                // The center pixel always has a weight of 1, so total_weight is never zero.
                for channel in 0..3 {
                    pixel[channel] = (sum[channel] / total_weight).round().max(0.0).min(255.0) as u8;
                }
            }
        });
    smoothed
}
