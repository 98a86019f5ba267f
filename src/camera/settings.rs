// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use linux_embedded_hal::I2cdev;
use serde::de::{Deserialize, Deserializer, Error};
use tracing::info;

use super::i2c::Bus;
use super::mock_camera::{MockCamera, RepeatMode};
use super::thermal_camera::{Mlx90640, ThermalCamera};

fn default_mlx90640_address() -> u8 {
    0x33
}

fn default_mlx90640_frame_rate() -> mlx9064x::FrameRate {
    mlx9064x::FrameRate::Eight
}

fn default_max_retries() -> u32 {
    100
}

fn default_poll_interval_ms() -> u64 {
    5
}

struct TryFromNum<U>(PhantomData<U>);

impl<U> TryFromNum<U> {
    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<U>,
        <T as TryFrom<U>>::Error: fmt::Display,
        U: Deserialize<'de>,
    {
        let value: U = U::deserialize(deserializer)?;
        T::try_from(value).map_err(|err| D::Error::custom(err))
    }
}

type TryFromF32 = TryFromNum<f32>;

#[derive(Clone, Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub(crate) enum CameraSettings {
    Mlx90640 {
        #[serde(default)]
        bus: Bus,

        #[serde(default = "default_mlx90640_address")]
        address: u8,

        #[serde(default = "default_mlx90640_frame_rate", with = "TryFromF32")]
        frame_rate: mlx9064x::FrameRate,

        /// How many times to poll the camera for a subpage before giving up on a frame.
        #[serde(default = "default_max_retries")]
        max_retries: u32,

        /// How long to wait between polls when a subpage isn't ready yet.
        #[serde(default = "default_poll_interval_ms")]
        poll_interval_ms: u64,
    },
    #[serde(rename = "mock")]
    MockCamera {
        path: PathBuf,

        #[serde(default)]
        frame_rate: Option<f32>,

        #[serde(default)]
        repeat_mode: RepeatMode,
    },
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self::Mlx90640 {
            bus: Bus::default(),
            address: default_mlx90640_address(),
            frame_rate: default_mlx90640_frame_rate(),
            max_retries: default_max_retries(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl CameraSettings {
    pub(crate) fn create_camera(&self) -> anyhow::Result<Box<dyn ThermalCamera>> {
        Ok(match self {
            Self::Mlx90640 {
                bus,
                address,
                frame_rate,
                max_retries,
                poll_interval_ms,
            } => {
                let bus = I2cdev::try_from(bus).context("Unable to connect to I2C bus")?;
                let driver = mlx9064x::Mlx90640Driver::new(bus, *address)
                    .context("Unable to initialize MLX90640")?;
                let mut camera = Mlx90640::new(
                    driver,
                    *max_retries,
                    Duration::from_millis(*poll_interval_ms),
                );
                camera.set_frame_rate(f32::from(*frame_rate))?;
                info!(address, "MLX90640 camera ready");
                Box::new(camera)
            }
            Self::MockCamera {
                path,
                frame_rate,
                repeat_mode,
            } => {
                let mut camera = MockCamera::from_path(path, *repeat_mode)?;
                if let Some(frame_rate) = frame_rate {
                    camera.set_frame_rate(*frame_rate)?;
                }
                info!(path = %path.display(), %repeat_mode, "playing back recorded camera data");
                Box::new(camera)
            }
        })
    }
}
