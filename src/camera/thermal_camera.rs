// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::error::Error as StdError;
use std::thread::sleep as thread_sleep;
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use embedded_hal::blocking::i2c;
use tracing::{debug, trace};

use crate::error::AcquisitionError;
use crate::image_buffer::NUM_PIXELS;

/// The operations a thermal camera needs to have to be used by the viewer.
pub(crate) trait ThermalCamera {
    /// Fill `buffer` with one full frame of temperatures (in Celsius).
    ///
    /// `buffer` is always [`NUM_PIXELS`] long. If an error is returned the contents of `buffer`
    /// are unspecified.
    fn read_raw_frame(&mut self, buffer: &mut [f32]) -> Result<(), AcquisitionError>;

    fn set_frame_rate(&mut self, frame_rate: f32) -> anyhow::Result<()>;
}

impl<C: ThermalCamera + ?Sized> ThermalCamera for Box<C> {
    fn read_raw_frame(&mut self, buffer: &mut [f32]) -> Result<(), AcquisitionError> {
        (**self).read_raw_frame(buffer)
    }

    fn set_frame_rate(&mut self, frame_rate: f32) -> anyhow::Result<()> {
        (**self).set_frame_rate(frame_rate)
    }
}

/// The MLX90640 updates half of its pixels (a "subpage") at a time, in a chessboard pattern.
const SUBPAGES_PER_FRAME: u32 = 2;

pub(crate) struct Mlx90640<I2C> {
    camera: mlx9064x::Mlx90640Driver<I2C>,
    temperature_buffer: Vec<f32>,
    max_retries: u32,
    poll_interval: Duration,
}

impl<I2C> Mlx90640<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: 'static + StdError + Sync + Send,
    <I2C as i2c::Write>::Error: 'static + StdError + Sync + Send,
{
    pub(crate) fn new(
        camera: mlx9064x::Mlx90640Driver<I2C>,
        max_retries: u32,
        poll_interval: Duration,
    ) -> Self {
        let num_pixels = camera.height() * camera.width();
        debug_assert_eq!(num_pixels, NUM_PIXELS);
        Self {
            camera,
            temperature_buffer: vec![0f32; num_pixels],
            max_retries,
            poll_interval,
        }
    }
}

impl<I2C> ThermalCamera for Mlx90640<I2C>
where
    I2C: 'static + i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: 'static + StdError + Sync + Send,
    <I2C as i2c::Write>::Error: 'static + StdError + Sync + Send,
{
    fn read_raw_frame(&mut self, buffer: &mut [f32]) -> Result<(), AcquisitionError> {
        if buffer.len() != self.temperature_buffer.len() {
            return Err(AcquisitionError::Malformed(format!(
                "expected a buffer of {} samples, got {}",
                self.temperature_buffer.len(),
                buffer.len()
            )));
        }
        let mut subpages = 0;
        let mut attempts = 0;
        // Both subpages need to be refreshed before the frame is complete.
        while subpages < SUBPAGES_PER_FRAME {
            if attempts >= self.max_retries {
                return Err(AcquisitionError::RetriesExhausted(attempts));
            }
            attempts += 1;
            let ready = self
                .camera
                .generate_image_if_ready(&mut self.temperature_buffer)
                .context("Unable to read subpage from MLX90640")
                .map_err(AcquisitionError::Bus)?;
            if ready {
                subpages += 1;
                trace!(subpages, attempts, "read MLX90640 subpage");
            } else {
                thread_sleep(self.poll_interval);
            }
        }
        buffer.copy_from_slice(&self.temperature_buffer);
        Ok(())
    }

    fn set_frame_rate(&mut self, frame_rate: f32) -> anyhow::Result<()> {
        let mlx_frame_rate = mlx9064x::FrameRate::try_from(frame_rate)
            .map_err(|err| anyhow!("Invalid frame rate {}: {}", frame_rate, err))?;
        debug!(?mlx_frame_rate, "setting MLX90640 frame rate");
        self.camera
            .set_frame_rate(mlx_frame_rate)
            .context("Error setting camera frame rate")
    }
}
