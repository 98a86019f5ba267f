// SPDX-License-Identifier: GPL-3.0-or-later
//! Cubic B-spline zooming of intensity grids.
//!
//! Samples are first converted to B-spline coefficients (with mirrored boundaries), then the
//! spline is evaluated on an evenly spaced grid where the first and last output samples line up
//! with the first and last input samples.
use image::GrayImage;
use ndarray::{Array2, ArrayViewMut1, Axis};

/// The single pole of the cubic B-spline prefilter, `sqrt(3) - 2`.
const POLE: f64 = -0.267_949_192_431_122_7;

fn bspline3(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        2.0 / 3.0 - t * t + t * t * t / 2.0
    } else if t < 2.0 {
        let u = 2.0 - t;
        u * u * u / 6.0
    } else {
        0.0
    }
}

/// Reflect an out of range index back into `0..len`, without repeating the edge sample.
fn mirror(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut index = index.rem_euclid(period);
    if index >= len as isize {
        index = period - index;
    }
    index as usize
}

/// Convert a line of samples into B-spline coefficients in place.
fn prefilter_line(mut line: ArrayViewMut1<f64>) {
    let len = line.len();
    if len < 2 {
        return;
    }
    let gain = (1.0 - POLE) * (1.0 - 1.0 / POLE);
    line.mapv_inplace(|v| v * gain);
    // Causal initialization for a mirrored signal.
    let pole_last = POLE.powi(len as i32 - 1);
    let mut sum = line[0] + pole_last * line[len - 1];
    let mut pole_power = POLE;
    for index in 1..len - 1 {
        sum += pole_power * (line[index] + pole_last * line[len - 1 - index]);
        pole_power *= POLE;
    }
    line[0] = sum / (1.0 - pole_last * pole_last);
    for index in 1..len {
        let previous = line[index - 1];
        line[index] += POLE * previous;
    }
    line[len - 1] = (POLE / (POLE * POLE - 1.0)) * (POLE * line[len - 2] + line[len - 1]);
    for index in (0..len - 1).rev() {
        line[index] = POLE * (line[index + 1] - line[index]);
    }
}

/// The input indices and weights contributing to each output sample along one axis.
fn axis_weights(input_len: usize, output_len: usize) -> Vec<[(usize, f64); 4]> {
    let scale = if output_len > 1 {
        (input_len as f64 - 1.0) / (output_len as f64 - 1.0)
    } else {
        0.0
    };
    (0..output_len)
        .map(|output_index| {
            let position = output_index as f64 * scale;
            let start = position.floor() as isize - 1;
            let mut taps = [(0, 0.0); 4];
            for (offset, tap) in taps.iter_mut().enumerate() {
                let index = start + offset as isize;
                *tap = (mirror(index, input_len), bspline3(position - index as f64));
            }
            taps
        })
        .collect()
}

/// The size of a zoomed axis.
pub(crate) fn zoomed_len(len: u32, factor: u32) -> u32 {
    (len as f64 * factor as f64).round() as u32
}

/// Zoom an intensity image by `factor` with cubic spline interpolation.
pub(crate) fn spline_zoom(image: &GrayImage, factor: u32) -> GrayImage {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let out_width = zoomed_len(image.width(), factor);
    let out_height = zoomed_len(image.height(), factor);
    let mut coefficients = Array2::from_shape_fn((height, width), |(row, col)| {
        image.get_pixel(col as u32, row as u32)[0] as f64
    });
    for row in coefficients.axis_iter_mut(Axis(0)) {
        prefilter_line(row);
    }
    for column in coefficients.axis_iter_mut(Axis(1)) {
        prefilter_line(column);
    }
    let column_weights = axis_weights(width, out_width as usize);
    let row_weights = axis_weights(height, out_height as usize);
    // Interpolate along each row, then down each column of the result.
    let horizontal = Array2::from_shape_fn((height, out_width as usize), |(row, col)| {
        column_weights[col]
            .iter()
            .map(|(index, weight)| coefficients[[row, *index]] * weight)
            .sum::<f64>()
    });
    GrayImage::from_fn(out_width, out_height, |col, row| {
        let value: f64 = row_weights[row as usize]
            .iter()
            .map(|(index, weight)| horizontal[[*index, col as usize]] * weight)
            .sum();
        image::Luma([value.round().max(0.0).min(255.0) as u8])
    })
}
