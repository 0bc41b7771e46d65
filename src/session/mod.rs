//! Interactive processing session.
//!
//! The controller owns the frame loop: pull a frame, run the detector,
//! filter and aggregate, score, draw the overlay, record, update the
//! throughput estimate, then handle one pending command. Finite sources
//! block for a command after every frame; continuous sources poll briefly so
//! the stream keeps moving.
//!
//! Exit paths:
//! - source exhaustion → `Completed`
//! - continuous source read failure → `Aborted`
//! - quit command or closed command channel → `UserQuit`
//! - detector or recorder failure → error
//!
//! Resources are released on every path: the source is closed, a recorder in
//! progress is finalized and the session's average FPS is logged.

pub mod control;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

pub use control::{Command, CommandSource, ScriptedCommands, StdinCommands};

use crate::config::{PipelineConfig, RECORD_FPS};
use crate::detect::{aggregate, Detector};
use crate::ingest::FrameSource;
use crate::nutrition::NutritionTable;
use crate::rate::RateWindow;
use crate::record::MjpegAviRecorder;
use crate::render::canvas::{ImageCanvas, OverlayFont};
use crate::render::{overlay_plan, OverlayOptions};
use crate::score::score;

const COMMAND_POLL: Duration = Duration::from_millis(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// The source ran out of frames.
    Completed,
    /// A continuous source failed to deliver a frame.
    Aborted,
    /// Quit command, or the command channel closed.
    UserQuit,
}

pub struct SessionController {
    source: FrameSource,
    detector: Box<dyn Detector>,
    commands: Box<dyn CommandSource>,
    config: PipelineConfig,
    table: NutritionTable,
    canvas: ImageCanvas,
    recorder: Option<MjpegAviRecorder>,
    rate: RateWindow,
    overlay_visible: bool,
}

impl SessionController {
    pub fn new(
        source: FrameSource,
        detector: Box<dyn Detector>,
        commands: Box<dyn CommandSource>,
        config: PipelineConfig,
        table: NutritionTable,
    ) -> Result<Self> {
        let font = match &config.font_path {
            Some(path) => Some(OverlayFont::load(path)?),
            None => None,
        };
        let recorder = if config.record {
            let (width, height) = config
                .resolution
                .context("recording requires an explicit resolution")?;
            Some(MjpegAviRecorder::create(
                &config.record_path,
                width,
                height,
                RECORD_FPS,
            )?)
        } else {
            None
        };
        Ok(Self {
            source,
            detector,
            commands,
            config,
            table,
            canvas: ImageCanvas::new(font),
            recorder,
            rate: RateWindow::default(),
            overlay_visible: true,
        })
    }

    /// Run the session to completion.
    pub fn run(&mut self) -> Result<ExitStatus> {
        let result = self.run_loop();
        self.release();
        result
    }

    fn run_loop(&mut self) -> Result<ExitStatus> {
        let continuous = self.source.kind().is_continuous();
        let overlay_opts = OverlayOptions {
            rich_layout: self.config.rich_overlay,
            show_fps: continuous,
        };

        loop {
            let started = Instant::now();
            let mut frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(ExitStatus::Completed),
                Err(err) => {
                    log::error!("{}", err);
                    return Ok(ExitStatus::Aborted);
                }
            };
            if let Some((width, height)) = self.config.resolution {
                frame.resize_to(width, height);
            }

            let raw = self.detector.infer(&frame)?;
            let (kept, counts) = aggregate(raw, self.config.threshold, &self.table);
            let frame_score = score(counts, &self.table);
            log::debug!(
                "frame {}: {} candies, {} calories, {:?}",
                frame.sequence,
                frame_score.counts.total(),
                frame_score.total_calories,
                frame_score.risk.tier
            );

            if self.overlay_visible {
                let ops = overlay_plan(&kept, &frame_score, self.rate.average(), &overlay_opts);
                self.canvas.apply(&mut frame.image, &ops);
            }
            if let Some(recorder) = &mut self.recorder {
                recorder.write_frame(&frame)?;
            }
            // Command handling is excluded from the throughput estimate; a
            // blocked prompt is not processing time.
            self.rate.push(started.elapsed());

            let command = if continuous {
                self.commands.poll(COMMAND_POLL)
            } else {
                match self.commands.wait() {
                    Some(command) => Some(command),
                    None => return Ok(ExitStatus::UserQuit),
                }
            };
            let Some(command) = command else { continue };
            match command {
                Command::Quit => return Ok(ExitStatus::UserQuit),
                Command::Snapshot => {
                    frame.save(&self.config.snapshot_path)?;
                    log::info!("snapshot written to {}", self.config.snapshot_path.display());
                }
                Command::Pause => {
                    if continuous {
                        // Hold the stream until the next command; quitting
                        // from a paused state still works.
                        match self.commands.wait() {
                            Some(Command::Quit) | None => return Ok(ExitStatus::UserQuit),
                            Some(_) => {}
                        }
                    } else {
                        self.source.step_back();
                    }
                }
                Command::ToggleOverlay => {
                    self.overlay_visible = !self.overlay_visible;
                }
            }
        }
    }

    fn release(&mut self) {
        self.source.close();
        if let Some(recorder) = self.recorder.take() {
            if let Err(err) = recorder.finish() {
                log::error!("failed to finalize recording: {}", err);
            }
        }
        log::info!("average pipeline FPS: {:.2}", self.rate.average());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BBox, Detection, ScriptedDetector, StubDetector};
    use crate::ingest::{CameraConfig, CameraSource, SourceKind};

    fn camera_source(fail_after: Option<u64>) -> FrameSource {
        FrameSource::Camera(CameraSource::synthetic(
            SourceKind::UsbCamera,
            CameraConfig {
                device: "stub://camera".to_string(),
                width: 64,
                height: 48,
            },
            fail_after,
        ))
    }

    fn test_config() -> PipelineConfig {
        let mut config = PipelineConfig::new("model.json".into(), "stub://camera".to_string());
        config.resolution = Some((64, 48));
        config
    }

    #[test]
    fn quit_command_ends_a_continuous_session() {
        let mut controller = SessionController::new(
            camera_source(None),
            Box::new(StubDetector::new()),
            Box::new(ScriptedCommands::new(vec![None, None, Some(Command::Quit)])),
            test_config(),
            NutritionTable::builtin(),
        )
        .expect("build controller");
        assert_eq!(controller.run().expect("run"), ExitStatus::UserQuit);
    }

    #[test]
    fn source_failure_aborts_the_session() {
        let mut controller = SessionController::new(
            camera_source(Some(2)),
            Box::new(StubDetector::new()),
            Box::new(ScriptedCommands::new(vec![None; 16])),
            test_config(),
            NutritionTable::builtin(),
        )
        .expect("build controller");
        assert_eq!(controller.run().expect("run"), ExitStatus::Aborted);
    }

    #[test]
    fn overlay_toggle_does_not_end_the_session() {
        let mut controller = SessionController::new(
            camera_source(None),
            Box::new(ScriptedDetector::from_frames(
                vec!["Gems".to_string()],
                vec![vec![Detection {
                    class_id: 1,
                    class_label: "Gems".to_string(),
                    confidence: 0.9,
                    bbox: BBox::new(2, 2, 20, 20),
                }]],
            )),
            Box::new(ScriptedCommands::new(vec![
                Some(Command::ToggleOverlay),
                None,
                Some(Command::ToggleOverlay),
                Some(Command::Quit),
            ])),
            test_config(),
            NutritionTable::builtin(),
        )
        .expect("build controller");
        assert_eq!(controller.run().expect("run"), ExitStatus::UserQuit);
    }
}
