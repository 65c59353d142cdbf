/*
 *  analyzer.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-session magnitude snapshot over a live frequency source
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

use log::debug;

use crate::error::AnalyzerError;
use crate::spectrum::FrequencySource;

/// Owns the analysis source and the one magnitude buffer of a session.
///
/// The buffer is sized once, from the source's bin count after the fft size
/// has been applied, and is overwritten in place by every [`sample`](Self::sample).
pub struct FrequencyAnalyzer<S> {
    source: S,
    fft_size: Option<usize>,
    magnitudes: Vec<u8>,
}

impl<S: FrequencySource> FrequencyAnalyzer<S> {
    /// Apply the requested resolution (or keep the engine default) and
    /// allocate the magnitude buffer. An unsupported size is fatal for the session.
    pub fn configure(mut source: S, fft_size: Option<usize>) -> Result<Self, AnalyzerError> {
        if let Some(size) = fft_size {
            source.set_fft_size(size)?;
        }
        let bands = source.frequency_bin_count();
        debug!("analyzer: fft size {:?}, {} bands", fft_size, bands);
        Ok(Self { source, fft_size, magnitudes: vec![0; bands] })
    }

    /// Resolution is write-once; asking again for the same size is harmless.
    pub fn set_fft_size(&mut self, size: usize) -> Result<(), AnalyzerError> {
        let current = self.current_fft_size();
        if size == current {
            Ok(())
        } else {
            Err(AnalyzerError::SessionLocked { current, requested: size })
        }
    }

    pub fn current_fft_size(&self) -> usize {
        self.fft_size.unwrap_or(self.magnitudes.len() * 2)
    }

    pub fn band_count(&self) -> usize {
        self.magnitudes.len()
    }

    /// Pull the current spectrum into the session buffer.
    pub fn sample(&mut self) -> Result<&[u8], AnalyzerError> {
        let actual = self.source.frequency_bin_count();
        if actual != self.magnitudes.len() {
            return Err(AnalyzerError::BandCountChanged {
                expected: self.magnitudes.len(),
                actual,
            });
        }
        self.source.get_byte_frequency_data(&mut self.magnitudes)?;
        Ok(&self.magnitudes)
    }

    /// Last sampled magnitudes, without touching the source.
    pub fn magnitudes(&self) -> &[u8] {
        &self.magnitudes
    }
}
