/*
 *  lib.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  While audio plays, paint a radial gradient built from its spectrum;
 *  go dark on silence.
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

pub mod analyzer;
pub mod bands;
pub mod colors;
pub mod config;
pub mod error;
pub mod gradient;
pub mod idle;
pub mod pacer;
pub mod playback;
pub mod session;
pub mod spectrum;
pub mod stage;
pub mod visualizer;

pub use error::{AnalyzerError, GradientError, PlaybackError, SessionError};
pub use session::{ClubSettings, TheClub};
pub use stage::{Stage, VisualState};
