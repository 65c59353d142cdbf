/*
 *  spectrum.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frequency analysis engine: sample tap + windowed FFT to byte magnitudes
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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::AnalyzerError;

pub const FFT_MIN: usize = 32;
pub const FFT_MAX: usize = 32_768;
pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_MIN_DB: f32 = -100.0;
pub const DEFAULT_MAX_DB: f32 = -30.0;

/// The pull side of a live analysis capability.
///
/// Implementors fill one byte per frequency bin; 0 is at or below the floor,
/// 255 at or above the ceiling.
pub trait FrequencySource: Send {
    fn frequency_bin_count(&self) -> usize;
    fn set_fft_size(&mut self, size: usize) -> Result<(), AnalyzerError>;
    fn get_byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), AnalyzerError>;
}

pub fn check_fft_size(size: usize) -> Result<(), AnalyzerError> {
    if size.is_power_of_two() && (FFT_MIN..=FFT_MAX).contains(&size) {
        Ok(())
    } else {
        Err(AnalyzerError::UnsupportedFftSize { size, min: FFT_MIN, max: FFT_MAX })
    }
}

struct TapRing {
    samples: Vec<f32>,
    write: usize,
}

/// Mono ring of the most recent `FFT_MAX` samples, shared between the audio
/// producer and the analyser.
#[derive(Clone)]
pub struct AudioTap {
    inner: Arc<Mutex<TapRing>>,
}

impl Default for AudioTap {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioTap {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TapRing { samples: vec![0.0; FFT_MAX], write: 0 })),
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let Ok(mut ring) = self.inner.lock() else { return };
        let cap = ring.samples.len();
        // only the tail can ever be read back
        let samples = &samples[samples.len().saturating_sub(cap)..];
        for &s in samples {
            let w = ring.write;
            ring.samples[w] = s;
            ring.write = (w + 1) % cap;
        }
    }

    /// Flood the ring with zeros, nothing is flowing anymore.
    pub fn silence(&self) {
        if let Ok(mut ring) = self.inner.lock() {
            ring.samples.fill(0.0);
            ring.write = 0;
        }
    }

    /// Copy the newest `out.len()` samples, oldest first.
    fn copy_latest(&self, out: &mut [f32]) -> Result<(), AnalyzerError> {
        let ring = self.inner.lock().map_err(|_| AnalyzerError::TapPoisoned)?;
        let cap = ring.samples.len();
        let n = out.len().min(cap);
        let start = (ring.write + cap - n) % cap;
        let first = (cap - start).min(n);
        out[..first].copy_from_slice(&ring.samples[start..start + first]);
        out[first..n].copy_from_slice(&ring.samples[..n - first]);
        Ok(())
    }
}

/// Windowed FFT over the tap, byte-scaled like a browser `AnalyserNode`.
pub struct SpectrumAnalyser {
    tap: AudioTap,
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    frame: Vec<f32>,
    buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    min_db: f32,
    max_db: f32,
}

impl SpectrumAnalyser {
    pub fn new(tap: AudioTap) -> Self {
        let (fft, window, buf, scratch) = Self::plan(DEFAULT_FFT_SIZE);
        Self {
            tap,
            fft_size: DEFAULT_FFT_SIZE,
            fft,
            window,
            frame: vec![0.0; DEFAULT_FFT_SIZE],
            buf,
            scratch,
            min_db: DEFAULT_MIN_DB,
            max_db: DEFAULT_MAX_DB,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[allow(clippy::type_complexity)]
    fn plan(nfft: usize) -> (Arc<dyn Fft<f32>>, Vec<f32>, Vec<Complex<f32>>, Vec<Complex<f32>>) {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(nfft);

        // Blackman, alpha = 0.16
        let n = nfft as f32;
        let window = (0..nfft)
            .map(|i| {
                let x = 2.0 * std::f32::consts::PI * i as f32 / n;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect::<Vec<_>>();

        let buf = vec![Complex::new(0.0, 0.0); nfft];
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        (fft, window, buf, scratch)
    }

    #[inline]
    fn db_to_byte(&self, db: f32) -> u8 {
        let x = (db - self.min_db) / (self.max_db - self.min_db);
        (x * 255.0).floor().clamp(0.0, 255.0) as u8
    }
}

impl FrequencySource for SpectrumAnalyser {
    fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    fn set_fft_size(&mut self, size: usize) -> Result<(), AnalyzerError> {
        check_fft_size(size)?;
        if size != self.fft_size {
            let (fft, window, buf, scratch) = Self::plan(size);
            self.fft = fft;
            self.window = window;
            self.buf = buf;
            self.scratch = scratch;
            self.frame = vec![0.0; size];
            self.fft_size = size;
        }
        Ok(())
    }

    fn get_byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), AnalyzerError> {
        self.tap.copy_latest(&mut self.frame)?;

        for ((b, &s), &w) in self.buf.iter_mut().zip(&self.frame).zip(&self.window) {
            b.re = s * w;
            b.im = 0.0;
        }
        self.fft.process_with_scratch(&mut self.buf, &mut self.scratch);

        let norm = 1.0 / self.fft_size as f32;
        let bins = self.frequency_bin_count().min(out.len());
        for k in 0..bins {
            let mag = self.buf[k].norm() * norm;
            // log10(0) is -inf which clamps to 0
            out[k] = self.db_to_byte(20.0 * mag.log10());
        }
        Ok(())
    }
}

/// Source replaying a spectrum it is handed; clones share the same frame.
///
/// Stands in for the live engine when driving the pipeline by hand.
#[derive(Clone, Default)]
pub struct ScriptedSpectrum {
    frame: Arc<Mutex<Vec<u8>>>,
    failing: Arc<AtomicBool>,
}

impl ScriptedSpectrum {
    pub fn new(frame: &[u8]) -> Self {
        Self { frame: Arc::new(Mutex::new(frame.to_vec())), failing: Arc::default() }
    }

    /// Replace the spectrum; a different length shows up as a band count change.
    pub fn set(&self, frame: &[u8]) {
        if let Ok(mut f) = self.frame.lock() {
            f.clear();
            f.extend_from_slice(frame);
        }
    }

    /// While set, every read fails as if the tap were poisoned.
    pub fn fail(&self, on: bool) {
        self.failing.store(on, Ordering::Relaxed);
    }
}

impl FrequencySource for ScriptedSpectrum {
    fn frequency_bin_count(&self) -> usize {
        self.frame.lock().map(|f| f.len()).unwrap_or(0)
    }

    fn set_fft_size(&mut self, size: usize) -> Result<(), AnalyzerError> {
        check_fft_size(size)?;
        let mut f = self.frame.lock().map_err(|_| AnalyzerError::TapPoisoned)?;
        f.resize(size / 2, 0);
        Ok(())
    }

    fn get_byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), AnalyzerError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(AnalyzerError::TapPoisoned);
        }
        let f = self.frame.lock().map_err(|_| AnalyzerError::TapPoisoned)?;
        let n = f.len().min(out.len());
        out[..n].copy_from_slice(&f[..n]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, nfft: usize, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / nfft as f32).sin())
            .collect()
    }

    #[test]
    fn test_default_bin_count() {
        let a = SpectrumAnalyser::new(AudioTap::new());
        assert_eq!(a.fft_size(), DEFAULT_FFT_SIZE);
        assert_eq!(a.frequency_bin_count(), DEFAULT_FFT_SIZE / 2);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let mut a = SpectrumAnalyser::new(AudioTap::new());
        for bad in [0usize, 16, 100, 1000, 65_536] {
            assert!(matches!(
                a.set_fft_size(bad),
                Err(AnalyzerError::UnsupportedFftSize { .. })
            ), "size {bad}");
        }
        assert_eq!(a.fft_size(), DEFAULT_FFT_SIZE);
        a.set_fft_size(256).unwrap();
        assert_eq!(a.frequency_bin_count(), 128);
    }

    #[test]
    fn test_silence_is_all_zero() {
        let tap = AudioTap::new();
        let mut a = SpectrumAnalyser::new(tap.clone());
        a.set_fft_size(512).unwrap();
        let mut out = vec![7u8; 256];
        a.get_byte_frequency_data(&mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let tap = AudioTap::new();
        let mut a = SpectrumAnalyser::new(tap.clone());
        a.set_fft_size(1024).unwrap();
        tap.push(&sine(64, 1024, 4096));

        let mut out = vec![0u8; 512];
        a.get_byte_frequency_data(&mut out).unwrap();
        assert_eq!(out[64], 255);
        assert!(out.iter().all(|&b| b <= out[64]));
        assert!(out[400] < 64);
    }

    #[test]
    fn test_silence_after_signal() {
        let tap = AudioTap::new();
        let mut a = SpectrumAnalyser::new(tap.clone());
        tap.push(&sine(32, 2048, 2048));
        tap.silence();
        let mut out = vec![0u8; 1024];
        a.get_byte_frequency_data(&mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_scripted_resizes_with_fft() {
        let mut s = ScriptedSpectrum::new(&[5; 8]);
        assert_eq!(s.frequency_bin_count(), 8);
        s.set_fft_size(64).unwrap();
        assert_eq!(s.frequency_bin_count(), 32);
        assert!(s.set_fft_size(63).is_err());
        let mut out = [0u8; 32];
        s.get_byte_frequency_data(&mut out).unwrap();
        assert_eq!(&out[..8], &[5; 8]);
        assert!(out[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tap_wraps_and_keeps_newest() {
        let tap = AudioTap::new();
        let ramp: Vec<f32> = (0..FFT_MAX + 10).map(|i| i as f32).collect();
        tap.push(&ramp);
        let mut out = [0.0f32; 4];
        tap.copy_latest(&mut out).unwrap();
        let last = (FFT_MAX + 9) as f32;
        assert_eq!(out, [last - 3.0, last - 2.0, last - 1.0, last]);
    }
}
