/*
 *  bands.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Band index sequence driving per-band colour computation
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

use std::iter::FusedIterator;

/// Lazy ascending run of band indices `0..len`.
///
/// Calling [`iterate`] again with the same length restarts from band 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bands {
    next: usize,
    len: usize,
}

pub fn iterate(len: usize) -> Bands {
    Bands { next: 0, len }
}

impl Iterator for Bands {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.next < self.len {
            let i = self.next;
            self.next += 1;
            Some(i)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Bands {}
impl FusedIterator for Bands {}
