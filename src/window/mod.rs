// SPDX-License-Identifier: GPL-3.0-or-later
use std::rc::Rc;
use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::render::TextRenderer;
use crate::state::DisplayState;

mod display;
mod minifb_display;
mod settings;

pub(crate) use display::{Display, InputEvent, KeyCode};
pub(crate) use minifb_display::MinifbDisplay;
pub(crate) use settings::WindowSettings;

#[cfg(test)]
pub(crate) use display::test::MemoryDisplay;

const BUTTON_COLOR: Rgb<u8> = Rgb([200, 200, 200]);

const BUTTON_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Offset of a button's label baseline from its top left corner.
const BUTTON_PADDING: (i32, i32) = (20, 30);

/// Label text is a bit smaller than the overlay text.
const BUTTON_TEXT_SCALE: f32 = 0.75;

const NOTIFICATION_TEXT: &str = "Snapshot Saved!";

const NOTIFICATION_POSITION: (i32, i32) = (30, 500);

const NOTIFICATION_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const NOTIFICATION_TEXT_SCALE: f32 = 4.0 / 3.0;

/// How long the notification is shown after a snapshot is saved.
pub(crate) const NOTIFICATION_DURATION: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ButtonAction {
    /// Save the next frame, without the buttons drawn on it.
    SaveSnapshot,
    CycleColormap,
    CycleInterpolation,
    Exit,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Button {
    pub(crate) label: &'static str,
    /// Top left corner.
    pub(crate) start: (i32, i32),
    /// Bottom right corner.
    pub(crate) end: (i32, i32),
    pub(crate) action: ButtonAction,
}

impl Button {
    fn new(
        label: &'static str,
        start: (i32, i32),
        size: (i32, i32),
        action: ButtonAction,
    ) -> Self {
        Self {
            label,
            start,
            end: (start.0 + size.0, start.1 + size.1),
            action,
        }
    }

    /// Whether a point is inside the button. Points on the edge are *not* inside.
    pub(crate) fn contains(&self, x: i32, y: i32) -> bool {
        x > self.start.0 && y > self.start.1 && x < self.end.0 && y < self.end.1
    }

    fn rect(&self) -> Rect {
        Rect::at(self.start.0, self.start.1).of_size(
            (self.end.0 - self.start.0) as u32,
            (self.end.1 - self.start.1) as u32,
        )
    }
}

pub(crate) fn default_buttons() -> Vec<Button> {
    vec![
        Button::new("Save", (0, 550), (80, 50), ButtonAction::SaveSnapshot),
        Button::new("Colormap", (90, 550), (130, 50), ButtonAction::CycleColormap),
        Button::new(
            "Interpolation",
            (230, 550),
            (150, 50),
            ButtonAction::CycleInterpolation,
        ),
        Button::new("Exit", (390, 550), (70, 50), ButtonAction::Exit),
    ]
}

/// The state of the controls drawn over the camera image.
#[derive(Debug)]
pub(crate) struct WindowState {
    buttons: Vec<Button>,
    snapshot_queued: bool,
    snapshot_saved_at: Option<Instant>,
    exit_requested: bool,
    text: Rc<dyn TextRenderer>,
    font_size: f32,
}

impl WindowState {
    pub(crate) fn new(text: Rc<dyn TextRenderer>, font_size: f32) -> Self {
        Self {
            buttons: default_buttons(),
            snapshot_queued: false,
            snapshot_saved_at: None,
            exit_requested: false,
            text,
            font_size,
        }
    }

    pub(crate) fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// The action of the first button containing the point.
    pub(crate) fn hit_test(&self, x: i32, y: i32) -> Option<ButtonAction> {
        self.buttons()
            .iter()
            .find(|button| button.contains(x, y))
            .map(|button| button.action)
    }

    pub(crate) fn apply(&mut self, action: ButtonAction, display: &mut DisplayState) {
        debug!(?action, "applying action");
        match action {
            ButtonAction::SaveSnapshot => self.snapshot_queued = true,
            ButtonAction::CycleColormap => display.cycle_colormap(),
            ButtonAction::CycleInterpolation => display.cycle_interpolation(),
            ButtonAction::Exit => self.exit_requested = true,
        }
    }

    pub(crate) fn handle_pointer_release(
        &mut self,
        x: i32,
        y: i32,
        display: &mut DisplayState,
    ) -> Option<ButtonAction> {
        let action = self.hit_test(x, y)?;
        self.apply(action, display);
        Some(action)
    }

    pub(crate) fn handle_key(&mut self, key: KeyCode) -> Option<ButtonAction> {
        match key {
            KeyCode::Escape => {
                self.exit_requested = true;
                Some(ButtonAction::Exit)
            }
            KeyCode::Other => None,
        }
    }

    pub(crate) fn handle_event(&mut self, event: InputEvent, display: &mut DisplayState) {
        match event {
            InputEvent::PointerRelease { x, y } => {
                self.handle_pointer_release(x, y, display);
            }
            InputEvent::Key(key) => {
                self.handle_key(key);
            }
            InputEvent::Closed => self.exit_requested = true,
        }
    }

    pub(crate) fn snapshot_queued(&self) -> bool {
        self.snapshot_queued
    }

    /// Record that the queued snapshot has been dealt with.
    ///
    /// `saved_at` is `None` if the snapshot couldn't be saved, in which case no notification is
    /// shown.
    pub(crate) fn finish_snapshot(&mut self, saved_at: Option<Instant>) {
        self.snapshot_queued = false;
        if saved_at.is_some() {
            self.snapshot_saved_at = saved_at;
        }
    }

    pub(crate) fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Whether the save notification should be shown at `now`.
    ///
    /// Once the notification has expired it is forgotten.
    pub(crate) fn notification_active(&mut self, now: Instant) -> bool {
        match self.snapshot_saved_at {
            Some(saved_at) if now.saturating_duration_since(saved_at) < NOTIFICATION_DURATION => {
                true
            }
            Some(_) => {
                self.snapshot_saved_at = None;
                false
            }
            None => false,
        }
    }

    pub(crate) fn draw_buttons(&self, image: &mut RgbImage) -> anyhow::Result<()> {
        for button in self.buttons() {
            draw_filled_rect_mut(image, button.rect(), BUTTON_COLOR);
            let position = (
                button.start.0 + BUTTON_PADDING.0,
                button.start.1 + BUTTON_PADDING.1,
            );
            self.text.draw_text(
                image,
                button.label,
                position,
                self.font_size * BUTTON_TEXT_SCALE,
                BUTTON_TEXT_COLOR,
            )?;
        }
        Ok(())
    }

    pub(crate) fn draw_notification(&self, image: &mut RgbImage) -> anyhow::Result<()> {
        self.text.draw_text(
            image,
            NOTIFICATION_TEXT,
            NOTIFICATION_POSITION,
            self.font_size * NOTIFICATION_TEXT_SCALE,
            NOTIFICATION_COLOR,
        )
    }

    /// Draw the controls for a frame that isn't being saved.
    ///
    /// While the save notification is active it replaces the buttons.
    pub(crate) fn draw_overlay(
        &mut self,
        image: &mut RgbImage,
        now: Instant,
    ) -> anyhow::Result<()> {
        if self.notification_active(now) {
            self.draw_notification(image)
        } else {
            self.draw_buttons(image)
        }
    }
}
