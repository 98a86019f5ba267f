// SPDX-License-Identifier: GPL-3.0-or-later
use std::rc::Rc;

use anyhow::Context as _;
use structopt::StructOpt;
use tracing::info;

mod camera;
mod error;
mod image_buffer;
mod logging;
mod render;
mod render_loop;
mod settings;
mod state;
mod window;

use crate::render::{FontdueRenderer, FrameProcessor, TextRenderer};
use crate::render_loop::RenderLoop;
use crate::settings::{Args, Settings};
use crate::window::{MinifbDisplay, WindowState};

fn main() -> anyhow::Result<()> {
    let args = Args::from_args();
    let settings = Settings::load(&args.config_path)?;
    logging::init(&settings.logging)?;
    info!(config_path = %args.config_path.display(), "starting");

    let camera = settings
        .camera
        .create_camera()
        .context("Unable to set up camera")?;
    let text: Rc<dyn TextRenderer> = Rc::new(FontdueRenderer::with_font(
        settings.render.font_path.as_deref(),
    )?);
    let processor = FrameProcessor::new(
        camera,
        settings.render.display_state(),
        settings.render.width,
        settings.render.height,
        Rc::clone(&text),
        settings.render.font_size,
    );
    let window = WindowState::new(text, settings.render.font_size);
    let display = MinifbDisplay::new(&settings.window)?;
    let mut render_loop = RenderLoop::new(
        processor,
        window,
        display,
        settings.window.snapshot_path.clone(),
    );
    render_loop.run()
}
