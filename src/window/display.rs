// SPDX-License-Identifier: GPL-3.0-or-later
use image::RgbImage;

/// The keys the viewer responds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeyCode {
    Escape,
    Other,
}

/// Input from the operator, in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum InputEvent {
    /// The primary pointer button was released at the given point.
    PointerRelease { x: i32, y: i32 },

    Key(KeyCode),

    /// The window was closed by the window manager.
    Closed,
}

/// Something that can show images to the operator and collect their input.
pub(crate) trait Display {
    /// Show an image, replacing whatever was shown before.
    fn present(&mut self, image: &RgbImage) -> anyhow::Result<()>;

    /// Collect the input received since the last call.
    fn poll_events(&mut self) -> Vec<InputEvent>;

    fn is_open(&self) -> bool;

    /// Release any resources held by the display.
    fn close(self);
}

#[cfg(test)]
pub(crate) mod test {
    use std::collections::VecDeque;

    use image::RgbImage;

    use super::{Display, InputEvent};

    /// A display that keeps every image it's shown, and replays scripted input.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryDisplay {
        pub(crate) presented: Vec<RgbImage>,
        /// The events returned by each call to `poll_events`, in order.
        pub(crate) scripted: VecDeque<Vec<InputEvent>>,
    }

    impl MemoryDisplay {
        pub(crate) fn script(&mut self, events: Vec<InputEvent>) {
            self.scripted.push_back(events);
        }
    }

    impl Display for MemoryDisplay {
        fn present(&mut self, image: &RgbImage) -> anyhow::Result<()> {
            self.presented.push(image.clone());
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<InputEvent> {
            self.scripted.pop_front().unwrap_or_default()
        }

        fn is_open(&self) -> bool {
            true
        }

        fn close(self) {}
    }
}
