/*
 *  gradient.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Radial gradient descriptor built from per-band colours
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

use serde::{Deserialize, Serialize};

use crate::colors::Rgb;
use crate::error::GradientError;

/// Where the gradient's circle is centred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Corner::TopLeft => "top left",
            Corner::TopRight => "top right",
            Corner::BottomLeft => "bottom left",
            Corner::BottomRight => "bottom right",
            Corner::Center => "center",
        })
    }
}

/// Circle gradient, first stop nearest the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    corner: Corner,
    stops: Vec<Rgb>,
}

impl Gradient {
    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }
}

/// `radial-gradient(circle at top right, rgb(..),rgb(..))`
impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "radial-gradient(circle at {}, ", self.corner)?;
        for (i, stop) in self.stops.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{stop}")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GradientComposer {
    corner: Corner,
}

impl GradientComposer {
    pub fn new(corner: Corner) -> Self {
        Self { corner }
    }

    /// Stops keep input order. No stops, no gradient: the caller skips publishing.
    pub fn compose(&self, stops: Vec<Rgb>) -> Result<Gradient, GradientError> {
        if stops.is_empty() {
            return Err(GradientError::Empty);
        }
        Ok(Gradient { corner: self.corner, stops })
    }
}
