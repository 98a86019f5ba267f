// SPDX-License-Identifier: GPL-3.0-or-later
use std::rc::Rc;
use std::time::Instant;

use image::{imageops, Rgb, RgbImage};
use tracing::{debug, info};

use crate::camera::ThermalCamera;
use crate::error::FrameError;
use crate::image_buffer::{blank_frame, DisplayImage, NormalizedFrame, RawFrame};
use crate::state::DisplayState;

mod cheese;
mod color_map;
pub(crate) mod font;
mod interpolation;
mod normalize;
mod resize;
mod settings;
mod smoothing;
mod zoom;

pub(crate) use cheese::FontdueRenderer;
pub(crate) use color_map::ColorMap;
pub(crate) use font::TextRenderer;
pub(crate) use interpolation::Interpolation;
pub(crate) use settings::RenderSettings;

use interpolation::Strategy;
use normalize::{normalize, sanitize};
use self::resize::ResizerCache;

pub(crate) const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Baseline of the first line of the overlay.
const TEXT_ORIGIN: (i32, i32) = (30, 30);

const LINE_STEP: i32 = 22;

/// Everything about the camera's output that persists between frames.
#[derive(Clone, Debug)]
pub(crate) struct CameraState {
    pub(crate) display: DisplayState,

    /// The coldest temperature in the last successfully read frame.
    pub(crate) temp_min: Option<f32>,

    /// The hottest temperature in the last successfully read frame.
    pub(crate) temp_max: Option<f32>,

    /// When the previous frame was generated.
    pub(crate) timestamp: Instant,

    /// Whether the most recent call to [`FrameProcessor::generate_frame_image`] finished.
    pub(crate) current_frame_processed: bool,
}

impl CameraState {
    fn new(display: DisplayState, timestamp: Instant) -> Self {
        Self {
            display,
            temp_min: None,
            temp_max: None,
            timestamp,
            current_frame_processed: false,
        }
    }
}

/// Turns raw camera frames into annotated images.
pub(crate) struct FrameProcessor {
    camera: Box<dyn ThermalCamera>,
    state: CameraState,
    raw: RawFrame,
    blank: RawFrame,
    width: u32,
    height: u32,
    resizers: ResizerCache,
    text: Rc<dyn TextRenderer>,
    font_size: f32,
}

impl FrameProcessor {
    pub(crate) fn new(
        camera: Box<dyn ThermalCamera>,
        display: DisplayState,
        width: u32,
        height: u32,
        text: Rc<dyn TextRenderer>,
        font_size: f32,
    ) -> Self {
        Self {
            camera,
            state: CameraState::new(display, Instant::now()),
            raw: blank_frame(),
            blank: blank_frame(),
            width,
            height,
            resizers: ResizerCache::default(),
            text,
            font_size,
        }
    }

    pub(crate) fn state(&self) -> &CameraState {
        &self.state
    }

    pub(crate) fn display_mut(&mut self) -> &mut DisplayState {
        &mut self.state.display
    }

    pub(crate) fn generate_frame_image(&mut self) -> Result<DisplayImage, FrameError> {
        self.generate_frame_image_at(Instant::now())
    }

    /// Generate the next image, as if the current time is `now`.
    pub(crate) fn generate_frame_image_at(
        &mut self,
        now: Instant,
    ) -> Result<DisplayImage, FrameError> {
        self.state.current_frame_processed = false;
        let normalized = self.pull_raw_image()?;
        let mut image = self.render_image(&normalized)?;
        self.add_image_text(&mut image, now)?;
        self.state.current_frame_processed = true;
        Ok(image)
    }

    /// Read the next frame from the camera and normalize it.
    ///
    /// Transient camera faults are replaced with a blank frame, leaving the temperature extremes
    /// untouched.
    fn pull_raw_image(&mut self) -> Result<NormalizedFrame, FrameError> {
        match self.camera.read_raw_frame(&mut self.raw) {
            Ok(()) => {
                let extremes = sanitize(&mut self.raw);
                self.state.temp_min = Some(extremes.min);
                self.state.temp_max = Some(extremes.max);
                Ok(normalize(&self.raw, extremes))
            }
            Err(err) if err.is_transient() => {
                info!(error = %err, "unable to read frame, showing a blank frame");
                self.raw.copy_from_slice(&self.blank);
                let extremes = sanitize(&mut self.raw);
                Ok(normalize(&self.raw, extremes))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Colorize, enlarge, mirror and optionally smooth a normalized frame.
    fn render_image(&mut self, normalized: &NormalizedFrame) -> anyhow::Result<RgbImage> {
        let colormap = self.state.display.colormap();
        let interpolation = self.state.display.interpolation();
        let smoothing = self.state.display.smoothing;
        debug!(%colormap, %interpolation, smoothing, "rendering frame");
        let (width, height) = (self.width, self.height);
        let image = match interpolation.strategy() {
            Strategy::Resize(method) => {
                let colors = colormap.apply(normalized);
                self.resizers.get(method).resize(&colors, width, height)?
            }
            Strategy::Zoom { factor, resize } => {
                let colors = colormap.apply(&zoom::spline_zoom(normalized, factor));
                match resize {
                    Some(method) => self.resizers.get(method).resize(&colors, width, height)?,
                    None => colors,
                }
            }
        };
        let image = imageops::flip_horizontal(&image);
        if smoothing {
            Ok(smoothing::smooth(&image))
        } else {
            Ok(image)
        }
    }

    fn overlay_lines(&self, fps: f32) -> Vec<String> {
        let format_temp = |label: &str, temperature: Option<f32>| match temperature {
            Some(temperature) => format!("{}: {:+.1}", label, temperature),
            None => format!("{}: n/a", label),
        };
        let display = &self.state.display;
        vec![
            format_temp("Tmin", self.state.temp_min),
            format_temp("Tmax", self.state.temp_max),
            format!("Interp.: {}", display.interpolation().label()),
            format!("Colormap: {}", display.colormap().name()),
            format!(
                "Filtered: {}",
                if display.smoothing { "True" } else { "False" }
            ),
            format!("FPS: {:.1}", fps),
        ]
    }

    fn add_image_text(&mut self, image: &mut RgbImage, now: Instant) -> anyhow::Result<()> {
        let elapsed = now.saturating_duration_since(self.state.timestamp);
        let fps = if elapsed.as_secs_f32() > 0.0 {
            1.0 / elapsed.as_secs_f32()
        } else {
            0.0
        };
        for (line_number, line) in self.overlay_lines(fps).iter().enumerate() {
            let position = (TEXT_ORIGIN.0, TEXT_ORIGIN.1 + LINE_STEP * line_number as i32);
            self.text
                .draw_text(image, line, position, self.font_size, TEXT_COLOR)?;
        }
        self.state.timestamp = now;
        Ok(())
    }
}
