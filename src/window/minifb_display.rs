// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::time::Duration;

use anyhow::Context as _;
use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, ScaleMode, Window, WindowOptions};
use tracing::{debug, trace};

use super::display::{Display, InputEvent, KeyCode};
use super::settings::WindowSettings;

/// The shortest time between window refreshes, roughly 60 Hz.
const UPDATE_INTERVAL: Duration = Duration::from_micros(16_600);

/// A [`Display`] backed by a native window.
pub(crate) struct MinifbDisplay {
    window: Window,
    buffer: Vec<u32>,
    buffer_size: (usize, usize),
    mouse_down: bool,
}

impl MinifbDisplay {
    pub(crate) fn new(settings: &WindowSettings) -> anyhow::Result<Self> {
        // minifb doesn't have a real fullscreen mode, so a borderless window on top of everything
        // else is the closest we can get.
        let options = WindowOptions {
            borderless: settings.fullscreen,
            topmost: settings.fullscreen,
            resize: !settings.fullscreen,
            scale_mode: ScaleMode::Stretch,
            ..WindowOptions::default()
        };
        let mut window = Window::new(
            &settings.title,
            settings.width as usize,
            settings.height as usize,
            options,
        )
        .context("Unable to open window")?;
        window.limit_update_rate(Some(UPDATE_INTERVAL));
        debug!(
            title = %settings.title,
            width = settings.width,
            height = settings.height,
            fullscreen = settings.fullscreen,
            "opened window"
        );
        Ok(Self {
            window,
            buffer: Vec::new(),
            buffer_size: (0, 0),
            mouse_down: false,
        })
    }

    /// Map a point in window coordinates to image coordinates.
    fn to_image_coordinates(&self, (x, y): (f32, f32)) -> (i32, i32) {
        let (window_width, window_height) = self.window.get_size();
        let (buffer_width, buffer_height) = self.buffer_size;
        if window_width == 0 || window_height == 0 {
            return (x as i32, y as i32);
        }
        let scale_x = buffer_width as f32 / window_width as f32;
        let scale_y = buffer_height as f32 / window_height as f32;
        ((x * scale_x) as i32, (y * scale_y) as i32)
    }
}

impl fmt::Debug for MinifbDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinifbDisplay")
            .field("window", &"Window{{ opaque }}")
            .field("buffer_size", &self.buffer_size)
            .field("mouse_down", &self.mouse_down)
            .finish()
    }
}

impl Display for MinifbDisplay {
    fn present(&mut self, image: &RgbImage) -> anyhow::Result<()> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        self.buffer.clear();
        self.buffer.extend(image.pixels().map(|pixel| {
            let [red, green, blue] = pixel.0;
            (red as u32) << 16 | (green as u32) << 8 | blue as u32
        }));
        self.buffer_size = (width, height);
        self.window
            .update_with_buffer(&self.buffer, width, height)
            .context("Unable to update window")
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        if !self.window.is_open() {
            events.push(InputEvent::Closed);
            return events;
        }
        for key in self.window.get_keys_pressed(KeyRepeat::No) {
            let key = match key {
                Key::Escape => KeyCode::Escape,
                _ => KeyCode::Other,
            };
            events.push(InputEvent::Key(key));
        }
        // minifb only reports whether the button is down, so releases are found by watching for
        // the down to up transition.
        let mouse_down = self.window.get_mouse_down(MouseButton::Left);
        if self.mouse_down && !mouse_down {
            if let Some(position) = self.window.get_unscaled_mouse_pos(MouseMode::Discard) {
                let (x, y) = self.to_image_coordinates(position);
                trace!(x, y, "pointer released");
                events.push(InputEvent::PointerRelease { x, y });
            }
        }
        self.mouse_down = mouse_down;
        events
    }

    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn close(self) {
        debug!("closing window");
        drop(self.window);
    }
}
