/*
 *  playback.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Audio feeder: WAV or test tone into the tap, at real-time pace
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

use std::f32::consts::TAU;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::{debug, info};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::error::PlaybackError;
use crate::spectrum::AudioTap;

/// Blocks pushed per second of audio.
const CHUNKS_PER_SEC: u32 = 50;

pub const TONE_SAMPLE_RATE: u32 = 44_100;
const TONE_LOW_HZ: f32 = 55.0;
const TONE_HIGH_HZ: f32 = 7_040.0;
const TONE_LEVEL: f32 = 0.5;
/// Fraction of every second the tone sounds; the rest is silence.
const TONE_DUTY: f32 = 0.75;

/// What the player tells its host, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    MetadataLoaded { src: String, sample_rate: u32, duration: Duration },
    Started,
    Ended,
}

/// Decoded mono audio ready to be played.
#[derive(Debug, Clone)]
pub struct Track {
    src: String,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Track {
    /// Read a whole WAV file, downmixed to mono in -1.0..=1.0.
    pub fn open_wav(path: &Path) -> Result<Self, PlaybackError> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let samples = downmix(&interleaved, channels);
        if samples.is_empty() {
            return Err(PlaybackError::Empty(path.display().to_string()));
        }
        debug!(
            "wav {}: {} Hz, {} ch, {} bit {:?}",
            path.display(), spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
        );

        Ok(Self { src: path.display().to_string(), sample_rate: spec.sample_rate, samples })
    }

    /// Exponential sine sweep that gates off for the tail of every second,
    /// so both lit and dark frames show up.
    pub fn tone(sample_rate: u32, seconds: f32) -> Self {
        let sr = sample_rate.max(1) as f32;
        let n = (sr * seconds.max(0.0)).round() as usize;
        let mut phase = 0.0f32;

        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / sr;
                let f = TONE_LOW_HZ * (TONE_HIGH_HZ / TONE_LOW_HZ).powf(t / seconds);
                phase = (phase + TAU * f / sr) % TAU;
                if t.fract() < TONE_DUTY { TONE_LEVEL * phase.sin() } else { 0.0 }
            })
            .collect();

        Self { src: format!("tone:{seconds}s"), sample_rate, samples }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate.max(1) as f64)
    }
}

/// Average interleaved frames down to one channel. A trailing partial frame is dropped.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Handle on a playing track. Dropping it stops playback.
pub struct Player {
    join: Option<JoinHandle<()>>,
}

impl Player {
    /// Start feeding `track` into `tap`; lifecycle goes out on `events`.
    pub fn spawn(track: Track, tap: AudioTap, events: Sender<PlayerEvent>) -> Self {
        let join = tokio::spawn(player_worker(track, tap, events));
        Self { join: Some(join) }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.join.take() {
            handle.abort();
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn player_worker(track: Track, tap: AudioTap, events: Sender<PlayerEvent>) {
    let loaded = PlayerEvent::MetadataLoaded {
        src: track.src.clone(),
        sample_rate: track.sample_rate,
        duration: track.duration(),
    };
    if events.send(loaded).await.is_err() || events.send(PlayerEvent::Started).await.is_err() {
        return;
    }
    info!("player: playing {} ({:.1}s)", track.src, track.duration().as_secs_f32());

    let block = (track.sample_rate / CHUNKS_PER_SEC).max(1) as usize;
    let mut ticker = interval(Duration::from_millis(1000 / CHUNKS_PER_SEC as u64));
    for chunk in track.samples.chunks(block) {
        ticker.tick().await;
        tap.push(chunk);
    }

    // nothing flows after the last block
    tap.silence();
    info!("player: {} ended", track.src);
    let _ = events.send(PlayerEvent::Ended).await;
}
