/*
 *  visualizer.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame-driven render loop: sample, detect silence, colour, compose, publish
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

use log::{debug, info, log, trace, warn, Level};

use crate::analyzer::FrequencyAnalyzer;
use crate::bands;
use crate::colors::{ColorMapper, ColorMode};
use crate::error::{AnalyzerError, GradientError};
use crate::gradient::GradientComposer;
use crate::idle::is_idle;
use crate::pacer::FrameClock;
use crate::spectrum::FrequencySource;
use crate::stage::Publisher;

/// What one frame ended up publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Silence: the stage was cleared.
    Idle,
    /// A gradient with this many stops went out.
    Lit(usize),
    /// Nothing to compose, stage left as it was.
    Skipped,
}

/// Everything one tick needs, owned by the loop once it runs.
pub struct Pipeline<S> {
    analyzer: FrequencyAnalyzer<S>,
    colors: Box<dyn ColorMapper>,
    composer: GradientComposer,
    publisher: Publisher,
}

impl<S: FrequencySource> Pipeline<S> {
    pub fn new(
        analyzer: FrequencyAnalyzer<S>,
        colors: Box<dyn ColorMapper>,
        composer: GradientComposer,
        publisher: Publisher,
    ) -> Self {
        Self { analyzer, colors, composer, publisher }
    }

    pub fn band_count(&self) -> usize {
        self.analyzer.band_count()
    }

    pub fn set_colors(&mut self, colors: Box<dyn ColorMapper>) {
        self.colors = colors;
    }

    /// One frame of the light show.
    pub fn tick(&mut self) -> Result<FrameOutcome, AnalyzerError> {
        let magnitudes = self.analyzer.sample()?;

        if is_idle(magnitudes) {
            self.publisher.deactivate();
            return Ok(FrameOutcome::Idle);
        }

        let stops = bands::iterate(magnitudes.len())
            .map(|i| self.colors.map(i, magnitudes[i]))
            .collect::<Vec<_>>();

        match self.composer.compose(stops) {
            Ok(gradient) => {
                let n = gradient.stops().len();
                self.publisher.activate(gradient);
                Ok(FrameOutcome::Lit(n))
            }
            Err(GradientError::Empty) => Ok(FrameOutcome::Skipped),
        }
    }
}

/// Commands sent to the running loop.
#[derive(Debug, Clone, Copy)]
pub enum LoopCommand {
    SetColorMode(ColorMode),
    Stop,
}

/// Frame counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub lit: u64,
    pub idle: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Handle on the one render task of a session.
pub struct RenderLoop {
    cmd_tx: Sender<LoopCommand>,
    join: Option<JoinHandle<LoopStats>>,
}

impl RenderLoop {
    /// Move the pipeline into its own task; frames come from `clock`.
    /// Must be called from within a tokio runtime.
    pub fn spawn<S, C>(pipeline: Pipeline<S>, clock: C) -> Self
    where
        S: FrequencySource + 'static,
        C: FrameClock,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>(16);
        let join = tokio::spawn(render_worker(pipeline, clock, cmd_rx));
        Self { cmd_tx, join: Some(join) }
    }

    // Keep caller-side simple (no .await); best-effort send.
    pub fn set_color_mode(&self, mode: ColorMode) {
        let _ = self.cmd_tx.try_send(LoopCommand::SetColorMode(mode));
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.try_send(LoopCommand::Stop);
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop and wait for the task to wind down.
    pub async fn shutdown(mut self) -> LoopStats {
        let _ = self.cmd_tx.send(LoopCommand::Stop).await;
        match self.join.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!("render loop ended abnormally: {e}");
                LoopStats::default()
            }),
            None => LoopStats::default(),
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(LoopCommand::Stop);
        if let Some(handle) = self.join.take() {
            handle.abort();
        }
    }
}

/// Only the first failure of a run is worth a warning.
fn failure_level(streak: u64) -> Level {
    if streak <= 1 { Level::Warn } else { Level::Trace }
}

async fn render_worker<S, C>(
    mut pipeline: Pipeline<S>,
    mut clock: C,
    mut cmd_rx: Receiver<LoopCommand>,
) -> LoopStats
where
    S: FrequencySource,
    C: FrameClock,
{
    let mut stats = LoopStats::default();
    let mut streak = 0u64;
    info!("render loop started, {} bands", pipeline.band_count());

    loop {
        // commands first: a stop always wins over a due frame
        tokio::select! {
            biased;
            cmd = cmd_rx.recv() => match cmd {
                Some(LoopCommand::SetColorMode(mode)) => {
                    debug!("render loop: colour mode {:?}", mode);
                    pipeline.set_colors(mode.mapper());
                }
                Some(LoopCommand::Stop) | None => break,
            },
            due = clock.next_frame() => {
                if !due {
                    debug!("render loop: frame clock closed");
                    break;
                }
                stats.frames += 1;
                let outcome = pipeline.tick();
                if outcome.is_ok() {
                    streak = 0;
                }
                match outcome {
                    Ok(FrameOutcome::Lit(n)) => {
                        stats.lit += 1;
                        trace!("frame {}: {} stops", stats.frames, n);
                    }
                    Ok(FrameOutcome::Idle) => stats.idle += 1,
                    Ok(FrameOutcome::Skipped) => stats.skipped += 1,
                    Err(e) => {
                        // a dropped frame is fine, a dead visualization is not
                        stats.failed += 1;
                        streak += 1;
                        log!(failure_level(streak), "render loop: frame {} failed: {e}", stats.frames);
                    }
                }
            }
        }
    }

    info!(
        "render loop stopped after {} frames ({} lit, {} idle, {} failed)",
        stats.frames, stats.lit, stats.idle, stats.failed
    );
    stats
}
