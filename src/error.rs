/*
 *  error.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for the analysis, gradient and session layers
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

use thiserror::Error;

/// Failures raised by the frequency analysis engine or its adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    /// The engine only accepts powers of two in its supported window range.
    #[error("unsupported fft size {size}: must be a power of two in {min}..={max}")]
    UnsupportedFftSize { size: usize, min: usize, max: usize },

    /// The analysis resolution is write-once per session.
    #[error("fft size is locked at {current} for this session (requested {requested})")]
    SessionLocked { current: usize, requested: usize },

    /// The engine reported a different bin count than the buffer was sized for.
    #[error("band count changed mid-session: buffer holds {expected}, engine reports {actual}")]
    BandCountChanged { expected: usize, actual: usize },

    /// A producer panicked while holding the sample ring.
    #[error("audio tap lock poisoned")]
    TapPoisoned,
}

/// Gradient composition failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GradientError {
    #[error("cannot compose a gradient without colour stops")]
    Empty,
}

/// Session lifecycle failures surfaced to the component host.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("analysis setup failed: {0}")]
    Analyzer(#[from] AnalyzerError),
}

/// Audio input failures in the player.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("cannot read WAV: {0}")]
    Wav(#[from] hound::Error),

    #[error("{0} holds no audio")]
    Empty(String),
}
