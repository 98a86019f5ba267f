// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::path::Path;
use std::thread::sleep as thread_sleep;
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use tracing::trace;

use crate::error::AcquisitionError;
use crate::image_buffer::NUM_PIXELS;

use super::thermal_camera::ThermalCamera;

/// A fault that can be recorded in place of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RecordedFault {
    /// An I/O error on the bus.
    Io,

    /// The camera returned garbage.
    Malformed,

    /// The camera never finished a frame.
    Retries,
}

/// A single entry in a recording: either a frame of temperatures, or a fault.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordedFrame {
    Values { values: Vec<f32> },
    Fault { fault: RecordedFault },
}

impl From<Vec<f32>> for RecordedFrame {
    fn from(values: Vec<f32>) -> Self {
        Self::Values { values }
    }
}

impl From<RecordedFault> for RecordedFrame {
    fn from(fault: RecordedFault) -> Self {
        Self::Fault { fault }
    }
}

#[derive(Debug, serde::Deserialize)]
struct Recording {
    frames: Vec<RecordedFrame>,
}

/// Controls how frames are repeated by [`MockCamera`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RepeatMode {
    /// Don't repeat.
    ///
    /// Once the end of the frames has been reached, every read is an I/O error.
    None,

    /// Loop over the frames, restarting from the beginning. This is the default mode.
    Loop,

    /// Alternate between forward and reverse playback.
    ///
    /// The frames at either end of the recording are *not* repeated.
    Bounce,
}

impl Default for RepeatMode {
    fn default() -> Self {
        Self::Loop
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepeatMode::None => "none",
            RepeatMode::Loop => "loop",
            RepeatMode::Bounce => "bounce",
        };
        write!(f, "{}", s)
    }
}

/// A camera that plays back previously recorded frames.
pub(crate) struct MockCamera {
    frames: Vec<RecordedFrame>,
    index: Box<dyn Iterator<Item = usize>>,
    frame_delay: Option<Duration>,
}

impl MockCamera {
    pub(crate) fn new(frames: Vec<RecordedFrame>, repeat: RepeatMode) -> Self {
        let num_frames = frames.len();
        let index: Box<dyn Iterator<Item = usize>> = match repeat {
            RepeatMode::None => Box::new(0..num_frames),
            RepeatMode::Loop => Box::new((0..num_frames).cycle()),
            RepeatMode::Bounce => {
                let forwards = 0..num_frames;
                let backwards = (1..num_frames.saturating_sub(1)).rev();
                Box::new(forwards.chain(backwards).cycle())
            }
        };
        Self {
            frames,
            index,
            frame_delay: None,
        }
    }

    /// Load a recording from a TOML file with a `frames` array.
    pub(crate) fn from_path(path: &Path, repeat: RepeatMode) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read camera recording {}", path.display()))?;
        let recording: Recording = toml::from_str(&data)
            .with_context(|| format!("Invalid camera recording {}", path.display()))?;
        if recording.frames.is_empty() {
            return Err(anyhow!("Camera recording {} has no frames", path.display()));
        }
        Ok(Self::new(recording.frames, repeat))
    }
}

impl fmt::Debug for MockCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCamera")
            .field("frames", &self.frames.len())
            .field("frame_delay", &self.frame_delay)
            .finish()
    }
}

impl ThermalCamera for MockCamera {
    fn read_raw_frame(&mut self, buffer: &mut [f32]) -> Result<(), AcquisitionError> {
        if let Some(delay) = self.frame_delay {
            thread_sleep(delay);
        }
        let index = self.index.next().ok_or_else(|| {
            AcquisitionError::Bus(anyhow!("No more frames in camera recording"))
        })?;
        trace!(index, "playing back recorded frame");
        match &self.frames[index] {
            RecordedFrame::Values { values } => {
                if values.len() != NUM_PIXELS || values.len() != buffer.len() {
                    return Err(AcquisitionError::Malformed(format!(
                        "recorded frame {} has {} values, expected {}",
                        index,
                        values.len(),
                        buffer.len()
                    )));
                }
                buffer.copy_from_slice(values);
                Ok(())
            }
            RecordedFrame::Fault { fault } => Err(match fault {
                RecordedFault::Io => AcquisitionError::Bus(anyhow!("recorded I/O error")),
                RecordedFault::Malformed => {
                    AcquisitionError::Malformed("recorded malformed frame".to_string())
                }
                RecordedFault::Retries => AcquisitionError::RetriesExhausted(0),
            }),
        }
    }

    fn set_frame_rate(&mut self, frame_rate: f32) -> anyhow::Result<()> {
        if frame_rate.is_nan() || frame_rate <= 0.0 {
            return Err(anyhow!("Invalid frame rate {}", frame_rate));
        }
        self.frame_delay = Some(Duration::from_secs_f32(1.0 / frame_rate));
        Ok(())
    }
}
