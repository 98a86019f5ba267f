// SPDX-License-Identifier: GPL-3.0-or-later
use std::cell::RefCell;
use std::fmt;

use anyhow::{anyhow, Context as _};
use image::{imageops, Rgb, RgbImage};
use resize as piston_resize;
use tracing::{debug, trace};

/// Different resizing methods
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Method {
    /// Nearest neighbor sampling.
    Nearest,

    /// Triangle (aka linear) sampling.
    Triangle,

    /// Each destination pixel is the average of the source area it covers.
    Area,

    /// Catmull-Rom (aka bicubic) sampling.
    CatmullRom,

    /// Lanczos sampling with a window size of 4.
    Lanczos4,
}

pub(crate) trait Resizer: fmt::Debug {
    /// Resize a map of colors to exactly `width` by `height`.
    fn resize(&self, colors: &RgbImage, width: u32, height: u32) -> anyhow::Result<RgbImage>;
}

/// A resizer that uses [`image::imageops`].
#[derive(Clone, Debug)]
pub(crate) struct ImageResize {
    filter_type: imageops::FilterType,
}

impl Resizer for ImageResize {
    fn resize(&self, colors: &RgbImage, width: u32, height: u32) -> anyhow::Result<RgbImage> {
        Ok(imageops::resize(colors, width, height, self.filter_type))
    }
}

/// A resizer that averages the area of the source image covered by each destination pixel.
///
/// When enlarging, the interior of each source pixel is copied unchanged and only the
/// destination pixels straddling a source pixel boundary are blended.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AreaResize;

impl AreaResize {
    /// For each destination index, the source indices it covers and how much of it each covers.
    fn weights(source: u32, destination: u32) -> Vec<Vec<(usize, f32)>> {
        let scale = source as f32 / destination as f32;
        (0..destination)
            .map(|dest_index| {
                let start = dest_index as f32 * scale;
                let end = start + scale;
                let mut weights = Vec::new();
                let mut source_index = start.floor() as u32;
                while (source_index as f32) < end && source_index < source {
                    let low = start.max(source_index as f32);
                    let high = end.min(source_index as f32 + 1.0);
                    if high > low {
                        weights.push((source_index as usize, (high - low) / scale));
                    }
                    source_index += 1;
                }
                weights
            })
            .collect()
    }
}

impl Resizer for AreaResize {
    fn resize(&self, colors: &RgbImage, width: u32, height: u32) -> anyhow::Result<RgbImage> {
        let source_width = colors.width();
        let source_height = colors.height();
        let column_weights = Self::weights(source_width, width);
        let row_weights = Self::weights(source_height, height);
        // Horizontal pass first, keeping full precision until the vertical pass is done.
        let mut horizontal = vec![[0f32; 3]; (width * source_height) as usize];
        for y in 0..source_height {
            for (x, weights) in column_weights.iter().enumerate() {
                let dest = &mut horizontal[y as usize * width as usize + x];
                for (source_x, weight) in weights {
                    let pixel = colors.get_pixel(*source_x as u32, y);
                    for channel in 0..3 {
                        dest[channel] += pixel[channel] as f32 * weight;
                    }
                }
            }
        }
        let mut resized = RgbImage::new(width, height);
        for (y, weights) in row_weights.iter().enumerate() {
            for x in 0..width as usize {
                let mut sum = [0f32; 3];
                for (source_y, weight) in weights {
                    let row = &horizontal[source_y * width as usize + x];
                    for channel in 0..3 {
                        sum[channel] += row[channel] * weight;
                    }
                }
                let pixel = Rgb([
                    sum[0].round().max(0.0).min(255.0) as u8,
                    sum[1].round().max(0.0).min(255.0) as u8,
                    sum[2].round().max(0.0).min(255.0) as u8,
                ]);
                resized.put_pixel(x as u32, y as u32, pixel);
            }
        }
        Ok(resized)
    }
}

type RgbResizer = piston_resize::Resizer<piston_resize::formats::Rgb<u8, u8>>;

/// The Piston resizer along with the dimensions it was built for.
#[derive(Debug)]
struct ResizerState {
    resizer: RgbResizer,
    source: (u32, u32),
    destination: (u32, u32),
}

/// A Lanczos (window size 4) resizer using the [`resize`] crate from the Piston project, as
/// [`image::imageops`] only has a window size of 3.
///
/// Building a Piston resizer precomputes the filter coefficients, so it's kept around until the
/// dimensions change.
#[derive(Debug, Default)]
pub(crate) struct PistonResize {
    state: RefCell<Option<ResizerState>>,
}

fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        let x = x * std::f32::consts::PI;
        x.sin() / x
    }
}

fn lanczos4(x: f32) -> f32 {
    if x.abs() < 4.0 {
        sinc(x) * sinc(x / 4.0)
    } else {
        0.0
    }
}

impl Resizer for PistonResize {
    fn resize(&self, colors: &RgbImage, width: u32, height: u32) -> anyhow::Result<RgbImage> {
        use rgb::FromSlice;

        let source = colors.dimensions();
        let destination = (width, height);
        let mut maybe_state = self
            .state
            .try_borrow_mut()
            .context("Piston resizer is already in use")?;
        let stale = maybe_state
            .as_ref()
            .map_or(false, |state| state.source != source || state.destination != destination);
        if stale {
            debug!("Image dimensions changed, recreating Piston resizer");
            *maybe_state = None;
        }
        if maybe_state.is_none() {
            debug!(?source, ?destination, "Creating new Piston resizer");
            let filter = piston_resize::Filter::new(Box::new(lanczos4), 4.0);
            let resizer = RgbResizer::new(
                source.0 as usize,
                source.1 as usize,
                width as usize,
                height as usize,
                piston_resize::Pixel::RGB8,
                piston_resize::Type::Custom(filter),
            )
            .map_err(|err| anyhow!("Unable to create resizer: {:?}", err))?;
            *maybe_state = Some(ResizerState {
                resizer,
                source,
                destination,
            });
        }
        let state = maybe_state
            .as_mut()
            .ok_or_else(|| anyhow!("Piston resizer was not created"))?;
        let mut resized = RgbImage::new(width, height);
        state
            .resizer
            .resize(colors.as_rgb(), resized.as_rgb_mut())
            .map_err(|err| anyhow!("Unable to resize image: {:?}", err))?;
        Ok(resized)
    }
}

impl Method {
    /// The preferred resizer for this method.
    pub(crate) fn resizer(self) -> Box<dyn Resizer> {
        match self {
            Self::Nearest => Box::new(ImageResize {
                filter_type: imageops::FilterType::Nearest,
            }),
            Self::Triangle => Box::new(ImageResize {
                filter_type: imageops::FilterType::Triangle,
            }),
            Self::CatmullRom => Box::new(ImageResize {
                filter_type: imageops::FilterType::CatmullRom,
            }),
            Self::Area => Box::new(AreaResize),
            Self::Lanczos4 => Box::new(PistonResize::default()),
        }
    }
}

/// Holds on to the resizer for the most recently used method.
#[derive(Debug, Default)]
pub(crate) struct ResizerCache {
    current: Option<(Method, Box<dyn Resizer>)>,
}

impl ResizerCache {
    pub(crate) fn get(&mut self, method: Method) -> &dyn Resizer {
        if self.current.as_ref().map(|(cached, _)| *cached) != Some(method) {
            trace!(?method, "switching resizer");
            self.current = None;
        }
        let (_, resizer) = self
            .current
            .get_or_insert_with(|| (method, method.resizer()));
        &**resizer
    }
}
