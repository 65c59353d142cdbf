/*
 *  session.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  One visualization instance: source readiness, playback, teardown
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

//! The host drives a [`TheClub`] through three calls: the source is ready,
//! playback started, playback is over. Everything else (analysis buffer,
//! render task, stage updates) hangs off those transitions.

use log::{debug, info};

use crate::analyzer::FrequencyAnalyzer;
use crate::colors::ColorMode;
use crate::error::{AnalyzerError, SessionError};
use crate::gradient::{Corner, GradientComposer};
use crate::pacer::FrameClock;
use crate::spectrum::FrequencySource;
use crate::stage::{Publisher, Stage};
use crate::visualizer::{LoopStats, Pipeline, RenderLoop};

/// Externally settable knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClubSettings {
    pub randomize_colors: bool,
    /// `None` keeps the analysis engine's default.
    pub fft_size: Option<usize>,
    pub corner: Corner,
}

struct Session<S> {
    src: String,
    bands: usize,
    fft_size: usize,
    /// Waiting for playback; moves into the render loop when it starts.
    pipeline: Option<Pipeline<S>>,
    render: Option<RenderLoop>,
}

pub struct TheClub<S, C> {
    settings: ClubSettings,
    stage: Stage,
    publisher: Publisher,
    clocks: Box<dyn FnMut() -> C + Send>,
    session: Option<Session<S>>,
    /// Playback began before any source was ready.
    play_pending: bool,
}

impl<S, C> TheClub<S, C>
where
    S: FrequencySource + 'static,
    C: FrameClock,
{
    /// `clocks` hands out the frame clock for each render loop started.
    pub fn new<F>(settings: ClubSettings, stage: Stage, clocks: F) -> Self
    where
        F: FnMut() -> C + Send + 'static,
    {
        let publisher = stage.publisher();
        Self {
            settings,
            stage,
            publisher,
            clocks: Box::new(clocks),
            session: None,
            play_pending: false,
        }
    }

    pub fn settings(&self) -> ClubSettings {
        self.settings
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The source has its metadata. Builds the analysis session once per
    /// distinct `src`; `connect` is only called when a session is built.
    /// Returns `true` if a new session was set up.
    pub async fn on_source_ready<F>(&mut self, src: &str, connect: F) -> Result<bool, SessionError>
    where
        F: FnOnce() -> S,
    {
        if let Some(session) = &self.session {
            if session.src == src {
                debug!("session for {src} already set up");
                return Ok(false);
            }
            info!("source changed from {} to {src}", session.src);
            self.teardown().await;
        }

        let analyzer = FrequencyAnalyzer::configure(connect(), self.settings.fft_size)?;
        let bands = analyzer.band_count();
        let fft_size = analyzer.current_fft_size();
        let pipeline = Pipeline::new(
            analyzer,
            ColorMode::from_randomize(self.settings.randomize_colors).mapper(),
            GradientComposer::new(self.settings.corner),
            self.publisher.clone(),
        );
        info!("session ready for {src}: fft {fft_size}, {bands} bands");

        self.session = Some(Session {
            src: src.to_string(),
            bands,
            fft_size,
            pipeline: Some(pipeline),
            render: None,
        });

        if std::mem::take(&mut self.play_pending) {
            self.on_playback_started()?;
        }
        Ok(true)
    }

    /// Playback began. Starts the render loop the first time only; without a
    /// source yet, the start waits for [`on_source_ready`](Self::on_source_ready).
    /// Returns `true` if a loop was started. Needs a tokio runtime.
    pub fn on_playback_started(&mut self) -> Result<bool, SessionError> {
        let Some(session) = self.session.as_mut() else {
            debug!("playback started before the source is ready, deferring");
            self.play_pending = true;
            return Ok(false);
        };

        if let Some(lp) = &session.render {
            if lp.is_running() {
                debug!("render loop already running for {}", session.src);
            } else {
                debug!("render loop for {} has ended, not restarting", session.src);
            }
            return Ok(false);
        }

        let Some(pipeline) = session.pipeline.take() else {
            return Ok(false);
        };
        session.render = Some(RenderLoop::spawn(pipeline, (self.clocks)()));
        info!("light show started for {}", session.src);
        Ok(true)
    }

    /// Playback is over for good: stop the loop, drop the session, go dark.
    pub async fn on_playback_ended(&mut self) -> Option<LoopStats> {
        self.play_pending = false;
        self.teardown().await
    }

    /// Applies to the running loop immediately.
    pub fn set_randomize_colors(&mut self, randomize: bool) {
        self.settings.randomize_colors = randomize;
        let mode = ColorMode::from_randomize(randomize);
        if let Some(session) = self.session.as_mut() {
            if let Some(pipeline) = session.pipeline.as_mut() {
                pipeline.set_colors(mode.mapper());
            }
            if let Some(lp) = &session.render {
                lp.set_color_mode(mode);
            }
        }
    }

    /// Only allowed between sessions; a live session keeps its resolution.
    pub fn set_fft_size(&mut self, size: Option<usize>) -> Result<(), SessionError> {
        if let Some(session) = &self.session {
            let requested = size.unwrap_or(session.fft_size);
            if requested != session.fft_size {
                return Err(AnalyzerError::SessionLocked { current: session.fft_size, requested }.into());
            }
            return Ok(());
        }
        self.settings.fft_size = size;
        Ok(())
    }

    pub fn band_count(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.bands)
    }

    pub fn source(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.src.as_str())
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .and_then(|s| s.render.as_ref())
            .is_some_and(|lp| lp.is_running())
    }

    async fn teardown(&mut self) -> Option<LoopStats> {
        let session = self.session.take()?;
        let stats = match session.render {
            Some(lp) => Some(lp.shutdown().await),
            None => None,
        };
        self.publisher.deactivate();
        info!("session for {} torn down", session.src);
        stats
    }
}
