// SPDX-License-Identifier: GPL-3.0-or-later
use image::{Rgb, RgbImage};

pub(super) const DEJA_VU_SANS: &[u8] = include_bytes!("DejaVuSans.ttf");

pub(crate) const DEFAULT_FONT_SIZE: f32 = 18.0;

pub(crate) trait TextRenderer: std::fmt::Debug {
    /// Draw a line of text onto an image.
    ///
    /// `position` is the left end of the text's baseline, and may be partially (or completely)
    /// outside of the image. Only the parts of the text inside the image are drawn.
    fn draw_text(
        &self,
        image: &mut RgbImage,
        text: &str,
        position: (i32, i32),
        size: f32,
        color: Rgb<u8>,
    ) -> anyhow::Result<()>;
}
