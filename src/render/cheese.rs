// SPDX-License-Identifier: GPL-3.0-or-later
//! This module is a text renderer using the [fontdue] crate. Naming the module 'fontdue' would've
//! been my first choice, but then there'd be a conflict between the module and the crate.
use std::cell::RefCell;
use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Context as _};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::{Rgb, RgbImage};
use tracing::{debug, trace};

use super::font::{TextRenderer, DEJA_VU_SANS};

pub(crate) struct FontdueRenderer {
    font: Font,
    layout: RefCell<Layout>,
}

impl FontdueRenderer {
    pub(crate) fn from_bytes(data: &[u8]) -> anyhow::Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|err| anyhow!("Unable to parse font: {}", err))?;
        Ok(Self {
            font,
            layout: RefCell::new(Layout::new(CoordinateSystem::PositiveYDown)),
        })
    }

    /// A renderer using the built in DejaVu Sans font.
    pub(crate) fn new() -> anyhow::Result<Self> {
        Self::from_bytes(DEJA_VU_SANS)
    }

    /// A renderer using the font at `path` if one is given, or the built in font otherwise.
    pub(crate) fn with_font(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::new(),
        }
    }

    pub(crate) fn from_path(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Unable to read font file {}", path.display()))?;
        debug!(path = %path.display(), "loaded font");
        Self::from_bytes(&data)
            .with_context(|| format!("Unable to load font file {}", path.display()))
    }

    /// Distance from the top of a line of text to its baseline.
    fn ascent(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.ascent)
            // Most fonts have an ascent of about 80% of the em size.
            .unwrap_or(size * 0.8)
    }
}

impl fmt::Debug for FontdueRenderer {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // fontdue::layout::Layout doesn't implement Debug, so instead I'm just putting a dummy
        // blob in there.
        fmt.debug_struct("FontdueRenderer")
            .field("font", &self.font)
            .field("layout", &"RefCell<Layout{{ opaque }}>")
            .finish()
    }
}

fn blend(background: u8, foreground: u8, coverage: u8) -> u8 {
    let coverage = coverage as u32;
    ((foreground as u32 * coverage + background as u32 * (255 - coverage) + 127) / 255) as u8
}

impl TextRenderer for FontdueRenderer {
    fn draw_text(
        &self,
        image: &mut RgbImage,
        text: &str,
        position: (i32, i32),
        size: f32,
        color: Rgb<u8>,
    ) -> anyhow::Result<()> {
        let mut layout = self
            .layout
            .try_borrow_mut()
            .context("Text layout is already in use")?;
        // Reset the fontdue context to a known default
        layout.reset(&LayoutSettings {
            x: position.0 as f32,
            y: position.1 as f32 - self.ascent(size),
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &TextStyle::new(text, size, 0));
        trace!(text, ?position, "drawing text");
        let (width, height) = (image.width() as i32, image.height() as i32);
        for glyph in layout.glyphs().iter() {
            let (metrics, coverage) = self.font.rasterize_config(glyph.key);
            let left = glyph.x.round() as i32;
            let top = glyph.y.round() as i32;
            for row in 0..metrics.height as i32 {
                let y = top + row;
                if y < 0 || y >= height {
                    continue;
                }
                for col in 0..metrics.width as i32 {
                    let x = left + col;
                    if x < 0 || x >= width {
                        continue;
                    }
                    let alpha = coverage[(row * metrics.width as i32 + col) as usize];
                    if alpha == 0 {
                        continue;
                    }
                    let pixel = image.get_pixel_mut(x as u32, y as u32);
                    for channel in 0..3 {
                        pixel[channel] = blend(pixel[channel], color[channel], alpha);
                    }
                }
            }
        }
        Ok(())
    }
}
