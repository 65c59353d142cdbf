/*
 *  colors.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Band magnitude to colour mapping
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

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Wheel positions advanced per band, small enough that neighbours blend.
pub const WHEEL_STEP: u32 = 8;

/// A single colour stop, serialized the way the paint layer expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived brightness (Rec. 601 weights), 0..=255.
    pub fn luminance(&self) -> u8 {
        let y = 299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32;
        (y / 1000) as u8
    }

    /// Scale every channel by `magnitude / 255`.
    fn dimmed(self, magnitude: u8) -> Self {
        let scale = |c: u8| ((c as u32 * magnitude as u32) / 255) as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Three-segment colour wheel, channels always sum to 255.
fn color_wheel(pos: u8) -> Rgb {
    let pos = pos % 255;
    if pos < 85 {
        Rgb::new(pos * 3, 255 - pos * 3, 0)
    } else if pos < 170 {
        let pos = pos - 85;
        Rgb::new(255 - pos * 3, 0, pos * 3)
    } else {
        let pos = pos - 170;
        Rgb::new(0, pos * 3, 255 - pos * 3)
    }
}

/// Hue for a band index, brightness from its magnitude.
fn band_color(index: usize, magnitude: u8) -> Rgb {
    let pos = (((index % 255) as u32 * WHEEL_STEP) % 255) as u8;
    color_wheel(pos).dimmed(magnitude)
}

/// Strategy turning one band reading into a colour.
pub trait ColorMapper: Send {
    fn map(&mut self, index: usize, magnitude: u8) -> Rgb;
}

/// Deterministic mapping: neighbouring bands walk the wheel, louder is brighter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectrumColors;

impl ColorMapper for SpectrumColors {
    fn map(&mut self, index: usize, magnitude: u8) -> Rgb {
        band_color(index, magnitude)
    }
}

/// Same brightness as [`SpectrumColors`], channels shuffled on every call.
pub struct ConfettiColors<R: Rng = StdRng> {
    rng: R,
}

impl ConfettiColors<StdRng> {
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }
}

impl Default for ConfettiColors<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ConfettiColors<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    fn shuffled(&mut self, index: usize, magnitude: u8) -> Rgb {
        let base = band_color(index, magnitude);
        let mut channels = [base.r, base.g, base.b];
        channels.shuffle(&mut self.rng);
        Rgb::new(channels[0], channels[1], channels[2])
    }
}

impl<R: Rng + Send> ColorMapper for ConfettiColors<R> {
    fn map(&mut self, index: usize, magnitude: u8) -> Rgb {
        self.shuffled(index, magnitude)
    }
}

/// Which mapper drives the gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Spectrum,
    Confetti,
}

impl ColorMode {
    pub fn from_randomize(randomize: bool) -> Self {
        if randomize { ColorMode::Confetti } else { ColorMode::Spectrum }
    }

    pub fn mapper(self) -> Box<dyn ColorMapper> {
        match self {
            ColorMode::Spectrum => Box::new(SpectrumColors),
            ColorMode::Confetti => Box::new(ConfettiColors::new()),
        }
    }
}

/// One-shot mapping without holding a strategy around.
pub fn map_color(index: usize, magnitude: u8, randomize: bool) -> Rgb {
    if randomize {
        ConfettiColors::with_rng(rand::rng()).shuffled(index, magnitude)
    } else {
        band_color(index, magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_serialization() {
        assert_eq!(Rgb::new(255, 0, 128).to_string(), "rgb(255,0,128)");
        assert_eq!(Rgb::BLACK.to_string(), "rgb(0,0,0)");
    }

    #[test]
    fn test_silent_band_is_black_for_any_index() {
        let mut colors = SpectrumColors;
        for index in [0usize, 1, 7, 31, 32, 255, 1023, usize::MAX] {
            assert_eq!(colors.map(index, 0), Rgb::BLACK, "index {index}");
        }
    }

    #[test]
    fn test_louder_is_brighter() {
        let mut colors = SpectrumColors;
        let quiet = colors.map(5, 40);
        let loud = colors.map(5, 240);
        assert!(loud.luminance() > quiet.luminance());
    }

    #[test]
    fn test_neighbouring_bands_are_continuous() {
        let mut colors = SpectrumColors;
        let a = colors.map(3, 255);
        let b = colors.map(4, 255);
        let dist = |x: u8, y: u8| (x as i32 - y as i32).abs();
        let step = (WHEEL_STEP * 3) as i32;
        assert!(dist(a.r, b.r) <= step);
        assert!(dist(a.g, b.g) <= step);
        assert!(dist(a.b, b.b) <= step);
    }

    #[test]
    fn test_wheel_channels_sum_to_full_scale() {
        for pos in 0..=254u8 {
            let c = color_wheel(pos);
            assert_eq!(c.r as u32 + c.g as u32 + c.b as u32, 255, "pos {pos}");
        }
    }

    #[test]
    fn test_confetti_keeps_brightness_channels() {
        let mut confetti = ConfettiColors::with_rng(StdRng::seed_from_u64(7));
        for index in 0..64 {
            let expected = band_color(index, 200);
            let got = confetti.map(index, 200);
            let mut a = [expected.r, expected.g, expected.b];
            let mut b = [got.r, got.g, got.b];
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_confetti_silence_is_black() {
        let mut confetti = ConfettiColors::with_rng(StdRng::seed_from_u64(1));
        assert_eq!(confetti.map(12, 0), Rgb::BLACK);
        assert_eq!(map_color(12, 0, true), Rgb::BLACK);
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(ColorMode::from_randomize(false), ColorMode::Spectrum);
        assert_eq!(ColorMode::from_randomize(true), ColorMode::Confetti);
        assert_eq!(map_color(2, 99, false), SpectrumColors.map(2, 99));
    }
}
