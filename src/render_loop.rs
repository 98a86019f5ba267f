// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context as _;
use chrono::Local;
use image::{ImageFormat, RgbImage};
use tracing::{error, info, warn};

use crate::error::FrameError;
use crate::render::FrameProcessor;
use crate::window::{Display, WindowState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoopState {
    Running,
    Exiting,
}

/// The name a snapshot taken at the given local time is saved as.
fn snapshot_filename(time: &chrono::DateTime<Local>) -> String {
    format!("snapshot_{}.jpg", time.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write a snapshot to `directory`, creating it if needed.
fn save_snapshot(directory: &Path, image: &RgbImage) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(directory).with_context(|| {
        format!("Unable to create snapshot directory {}", directory.display())
    })?;
    let path = directory.join(snapshot_filename(&Local::now()));
    image
        .save_with_format(&path, ImageFormat::Jpeg)
        .with_context(|| format!("Unable to write snapshot {}", path.display()))?;
    Ok(path)
}

/// Drives the camera, the controls and the display, one frame at a time.
pub(crate) struct RenderLoop<D: Display> {
    processor: FrameProcessor,
    window: WindowState,
    display: Option<D>,
    snapshot_path: PathBuf,
    state: LoopState,
}

impl<D: Display> RenderLoop<D> {
    pub(crate) fn new(
        processor: FrameProcessor,
        window: WindowState,
        display: D,
        snapshot_path: PathBuf,
    ) -> Self {
        Self {
            processor,
            window,
            display: Some(display),
            snapshot_path,
            state: LoopState::Running,
        }
    }

    pub(crate) fn state(&self) -> LoopState {
        self.state
    }

    /// Run until the operator asks to exit.
    pub(crate) fn run(&mut self) -> anyhow::Result<()> {
        while self.state() == LoopState::Running {
            self.tick(Instant::now())?;
        }
        Ok(())
    }

    /// Generate, decorate and show a single frame, then handle any input.
    pub(crate) fn tick(&mut self, now: Instant) -> anyhow::Result<()> {
        let display = match self.display.as_mut() {
            Some(display) => display,
            None => {
                self.state = LoopState::Exiting;
                return Ok(());
            }
        };
        let mut image = match self.processor.generate_frame_image_at(now) {
            Ok(image) => image,
            Err(FrameError::RetriesExhausted(attempts)) => {
                warn!(
                    attempts,
                    "Too many retries reading frame, potential I2C baudrate issue: continuing"
                );
                return Ok(());
            }
            Err(FrameError::Fatal(err)) => return Err(err),
        };
        if self.window.snapshot_queued() {
            let saved_at = match save_snapshot(&self.snapshot_path, &image) {
                Ok(path) => {
                    info!(path = %path.display(), "Snapshot saved");
                    Some(now)
                }
                Err(err) => {
                    error!("Unable to save snapshot: {:#}", err);
                    None
                }
            };
            self.window.finish_snapshot(saved_at);
            if self.window.notification_active(now) {
                self.window.draw_notification(&mut image)?;
            }
        } else {
            self.window.draw_overlay(&mut image, now)?;
        }
        display.present(&image)?;
        for event in display.poll_events() {
            self.window.handle_event(event, self.processor.display_mut());
        }
        if self.window.exit_requested() || !display.is_open() {
            self.state = LoopState::Exiting;
            if let Some(display) = self.display.take() {
                display.close();
            }
            info!("Exiting");
        }
        Ok(())
    }

    #[cfg(test)]
    fn display(&self) -> Option<&D> {
        self.display.as_ref()
    }

    #[cfg(test)]
    fn processor(&self) -> &FrameProcessor {
        &self.processor
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use chrono::TimeZone;
    use image::{Rgb, RgbImage};

    use crate::camera::{MockCamera, RecordedFault, RecordedFrame, RepeatMode};
    use crate::image_buffer::NUM_PIXELS;
    use crate::render::font::test::RecordingRenderer;
    use crate::render::font::TextRenderer;
    use crate::render::{ColorMap, FrameProcessor, Interpolation};
    use crate::state::DisplayState;
    use crate::window::{InputEvent, KeyCode, MemoryDisplay, WindowState};

    use super::{snapshot_filename, LoopState, RenderLoop};

    const BUTTON_PIXEL: (u32, u32) = (2, 552);

    fn ramp() -> RecordedFrame {
        (0..NUM_PIXELS).map(|n| n as f32).collect::<Vec<f32>>().into()
    }

    fn render_loop(
        frames: Vec<RecordedFrame>,
        text: Rc<dyn TextRenderer>,
        snapshot_path: &Path,
    ) -> RenderLoop<MemoryDisplay> {
        let camera = MockCamera::new(frames, RepeatMode::Loop);
        let display_state = DisplayState::new(ColorMap::Jet, Interpolation::Nearest, false);
        let processor =
            FrameProcessor::new(Box::new(camera), display_state, 800, 600, text.clone(), 18.0);
        let window = WindowState::new(text, 18.0);
        RenderLoop::new(
            processor,
            window,
            MemoryDisplay::default(),
            snapshot_path.to_path_buf(),
        )
    }

    fn is_button_gray(pixel: &Rgb<u8>) -> bool {
        pixel.0.iter().all(|channel| (*channel as i32 - 200).abs() < 20)
    }

    fn last_presented(render_loop: &RenderLoop<MemoryDisplay>) -> &RgbImage {
        render_loop.display().unwrap().presented.last().unwrap()
    }

    #[test]
    fn filename_format() {
        let time = chrono::Local
            .with_ymd_and_hms(2021, 3, 4, 5, 6, 7)
            .unwrap();
        assert_eq!(snapshot_filename(&time), "snapshot_2021-03-04_05-06-07.jpg");
    }

    #[test]
    fn buttons_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let text = Rc::new(RecordingRenderer::default());
        let mut render_loop = render_loop(vec![ramp()], text.clone(), dir.path());
        render_loop.tick(Instant::now()).unwrap();
        let image = last_presented(&render_loop);
        assert_eq!(*image.get_pixel(BUTTON_PIXEL.0, BUTTON_PIXEL.1), Rgb([200, 200, 200]));
        let lines = text.take_text();
        assert_eq!(lines.len(), 6 + 4);
        assert_eq!(&lines[6..], &["Save", "Colormap", "Interpolation", "Exit"]);
    }

    #[test]
    fn snapshot_flow() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_dir = dir.path().join("snapshots");
        let text = Rc::new(RecordingRenderer::default());
        let mut render_loop = render_loop(vec![ramp()], text.clone(), &snapshot_dir);
        let start = Instant::now();

        // Click the save button during the first tick.
        render_loop
            .display
            .as_mut()
            .unwrap()
            .script(vec![InputEvent::PointerRelease { x: 40, y: 575 }]);
        render_loop.tick(start).unwrap();
        assert!(!snapshot_dir.exists(), "snapshot saved too early");
        text.take();

        // The next frame is saved, without the buttons.
        let saved_at = start + Duration::from_millis(100);
        render_loop.tick(saved_at).unwrap();
        let entries: Vec<_> = std::fs::read_dir(&snapshot_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("snapshot_") && name.ends_with(".jpg"), "{}", name);
        let snapshot = image::open(&entries[0]).unwrap().to_rgb8();
        assert_eq!(snapshot.dimensions(), (800, 600));
        assert!(!is_button_gray(snapshot.get_pixel(BUTTON_PIXEL.0, BUTTON_PIXEL.1)));
        let lines = text.take_text();
        assert!(!lines.iter().any(|line| line == "Save"));
        let presented = last_presented(&render_loop);
        assert!(!is_button_gray(presented.get_pixel(BUTTON_PIXEL.0, BUTTON_PIXEL.1)));

        // Within the next second, the notification replaces the buttons.
        render_loop
            .tick(saved_at + Duration::from_millis(500))
            .unwrap();
        let lines = text.take_text();
        assert!(lines.iter().any(|line| line == "Snapshot Saved!"));
        assert!(!lines.iter().any(|line| line == "Save"));
        let presented = last_presented(&render_loop);
        assert!(!is_button_gray(presented.get_pixel(BUTTON_PIXEL.0, BUTTON_PIXEL.1)));

        // After that, the buttons come back.
        render_loop
            .tick(saved_at + Duration::from_millis(1500))
            .unwrap();
        let lines = text.take_text();
        assert!(!lines.iter().any(|line| line == "Snapshot Saved!"));
        assert!(lines.iter().any(|line| line == "Save"));
        let presented = last_presented(&render_loop);
        assert_eq!(
            *presented.get_pixel(BUTTON_PIXEL.0, BUTTON_PIXEL.1),
            Rgb([200, 200, 200])
        );
        // Only one snapshot was taken.
        assert_eq!(std::fs::read_dir(&snapshot_dir).unwrap().count(), 1);
    }

    #[test]
    fn failed_snapshot_continues() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the snapshot directory should be.
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, b"").unwrap();
        let text = Rc::new(RecordingRenderer::default());
        let mut render_loop = render_loop(vec![ramp()], text.clone(), &blocker);
        render_loop
            .display
            .as_mut()
            .unwrap()
            .script(vec![InputEvent::PointerRelease { x: 40, y: 575 }]);
        let start = Instant::now();
        render_loop.tick(start).unwrap();
        render_loop.tick(start + Duration::from_millis(50)).unwrap();
        render_loop.tick(start + Duration::from_millis(100)).unwrap();
        assert_eq!(render_loop.display().unwrap().presented.len(), 3);
        let lines = text.take_text();
        assert!(!lines.iter().any(|line| line == "Snapshot Saved!"));
        // No notification, so the buttons are back on the very next frame.
        let presented = last_presented(&render_loop);
        assert_eq!(
            *presented.get_pixel(BUTTON_PIXEL.0, BUTTON_PIXEL.1),
            Rgb([200, 200, 200])
        );
    }

    #[test]
    fn controls_apply_next_tick() {
        let dir = tempfile::tempdir().unwrap();
        let text = Rc::new(RecordingRenderer::default());
        let mut render_loop = render_loop(vec![ramp()], text.clone(), dir.path());
        render_loop
            .display
            .as_mut()
            .unwrap()
            .script(vec![InputEvent::PointerRelease { x: 150, y: 575 }]);
        let start = Instant::now();
        render_loop.tick(start).unwrap();
        assert_eq!(text.take_text()[3], "Colormap: jet");
        render_loop.tick(start + Duration::from_millis(100)).unwrap();
        assert_eq!(text.take_text()[3], "Colormap: bwr");
    }

    #[test]
    fn retries_exhausted_skips_tick() {
        let dir = tempfile::tempdir().unwrap();
        let text = Rc::new(RecordingRenderer::default());
        let frames = vec![RecordedFault::Retries.into(), ramp()];
        let mut render_loop = render_loop(frames, text, dir.path());
        let start = Instant::now();
        render_loop.tick(start).unwrap();
        assert_eq!(render_loop.state(), LoopState::Running);
        assert!(render_loop.display().unwrap().presented.is_empty());
        render_loop.tick(start + Duration::from_millis(100)).unwrap();
        assert_eq!(render_loop.display().unwrap().presented.len(), 1);
    }

    #[test]
    fn io_fault_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        let text = Rc::new(RecordingRenderer::default());
        let frames = vec![ramp(), RecordedFault::Io.into()];
        let mut render_loop = render_loop(frames, text, dir.path());
        let start = Instant::now();
        render_loop.tick(start).unwrap();
        render_loop.tick(start + Duration::from_millis(100)).unwrap();
        assert_eq!(render_loop.display().unwrap().presented.len(), 2);
        assert_eq!(render_loop.processor().state().temp_max, Some(767.0));
    }

    #[derive(Debug)]
    struct FailingRenderer;

    impl TextRenderer for FailingRenderer {
        fn draw_text(
            &self,
            _image: &mut RgbImage,
            _text: &str,
            _position: (i32, i32),
            _size: f32,
            _color: Rgb<u8>,
        ) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("no font"))
        }
    }

    #[test]
    fn other_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let mut render_loop = render_loop(vec![ramp()], Rc::new(FailingRenderer), dir.path());
        assert!(render_loop.tick(Instant::now()).is_err());
    }

    #[test]
    fn escape_exits() {
        let dir = tempfile::tempdir().unwrap();
        let text = Rc::new(RecordingRenderer::default());
        let mut render_loop = render_loop(vec![ramp()], text, dir.path());
        {
            let display = render_loop.display.as_mut().unwrap();
            display.script(vec![]);
            display.script(vec![InputEvent::Key(KeyCode::Other)]);
            display.script(vec![InputEvent::Key(KeyCode::Escape)]);
        }
        assert!(render_loop.run().is_ok());
        assert_eq!(render_loop.state(), LoopState::Exiting);
        assert!(render_loop.display().is_none());
    }

    #[test]
    fn exit_button_exits() {
        let dir = tempfile::tempdir().unwrap();
        let text = Rc::new(RecordingRenderer::default());
        let mut render_loop = render_loop(vec![ramp()], text, dir.path());
        render_loop
            .display
            .as_mut()
            .unwrap()
            .script(vec![InputEvent::PointerRelease { x: 420, y: 575 }]);
        render_loop.tick(Instant::now()).unwrap();
        assert_eq!(render_loop.state(), LoopState::Exiting);
        // Ticking after exiting does nothing.
        render_loop.tick(Instant::now()).unwrap();
        assert!(render_loop.display().is_none());
    }
}
