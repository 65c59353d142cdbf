/*
 *  idle.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Silence detection over a magnitude snapshot
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

/// True when every band reads exactly zero.
///
/// Memoryless: one silent frame is idle, one non-silent frame is not.
/// An empty snapshot carries no values at all and is not treated as silence.
#[inline]
pub fn is_idle(magnitudes: &[u8]) -> bool {
    !magnitudes.is_empty() && magnitudes.iter().all(|&m| m == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_is_idle() {
        assert!(is_idle(&[0, 0, 0, 0]));
        assert!(is_idle(&[0u8; 1024]));
    }

    #[test]
    fn test_any_energy_is_not_idle() {
        assert!(!is_idle(&[255, 0, 128, 64]));
        for pos in 0..16 {
            let mut buf = [0u8; 16];
            buf[pos] = 1;
            assert!(!is_idle(&buf), "pos {pos}");
        }
    }

    #[test]
    fn test_empty_is_not_idle() {
        assert!(!is_idle(&[]));
    }
}
