/*
 *  stage.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared visual state consumed by the paint layer, and its only writer
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

//! The stage is process-wide: create one at startup, hand clones of it to
//! whoever paints and to every session. It starts inactive; the first
//! [`Publisher::activate`] lights it and [`Publisher::deactivate`] is the
//! only way back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, trace, warn};
use tokio::sync::watch;

use crate::gradient::Gradient;

/// Style variable holding the gradient expression.
pub const BACKGROUND_VAR: &str = "--the-club-background";
/// Marker class telling the paint layer the variable is in effect.
pub const ACTIVE_CLASS: &str = "is-bumpin-that-beat";

/// Rule the paint layer installs once.
pub fn stylesheet() -> String {
    format!(".{ACTIVE_CLASS} {{\n  background-image: var({BACKGROUND_VAR}) !important;\n}}\n")
}

/// Either fully lit (marker set + gradient) or fully dark.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VisualState {
    #[default]
    Inactive,
    Active(Gradient),
}

impl VisualState {
    pub fn is_active(&self) -> bool {
        matches!(self, VisualState::Active(_))
    }

    pub fn gradient(&self) -> Option<&Gradient> {
        match self {
            VisualState::Active(g) => Some(g),
            VisualState::Inactive => None,
        }
    }

    /// Inline declaration for the body, `None` when inactive.
    pub fn style_declaration(&self) -> Option<String> {
        self.gradient().map(|g| format!("{BACKGROUND_VAR}: {g};"))
    }

    /// Whole paint document: the rule plus the body as it stands now.
    pub fn css(&self) -> String {
        let mut css = stylesheet();
        match self.style_declaration() {
            Some(decl) => css.push_str(&format!("body.{ACTIVE_CLASS} {{\n  {decl}\n}}\n")),
            None => css.push_str("body {}\n"),
        }
        css
    }
}

/// Handle on the shared visual state. Cheap to clone.
#[derive(Clone)]
pub struct Stage {
    tx: Arc<watch::Sender<VisualState>>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(VisualState::Inactive);
        Self { tx: Arc::new(tx) }
    }

    /// Paint-layer side: wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<VisualState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> VisualState {
        self.tx.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.tx.borrow().is_active()
    }

    pub fn publisher(&self) -> Publisher {
        Publisher { stage: self.clone() }
    }
}

/// The single writer of [`VisualState`].
#[derive(Clone)]
pub struct Publisher {
    stage: Stage,
}

impl Publisher {
    pub fn activate(&self, gradient: Gradient) {
        self.stage.tx.send_replace(VisualState::Active(gradient));
    }

    /// Safe to repeat; readers are only woken on an actual change.
    pub fn deactivate(&self) {
        self.stage.tx.send_if_modified(|state| {
            if state.is_active() {
                *state = VisualState::Inactive;
                true
            } else {
                false
            }
        });
    }
}

async fn write_css(path: &Path, state: &VisualState) -> std::io::Result<()> {
    tokio::fs::write(path, state.css()).await
}

/// Paint layer for a terminal: logs the lights going up and down and keeps
/// `css_out` current. Ends once every stage handle is gone.
pub async fn paint_sink(mut rx: watch::Receiver<VisualState>, css_out: Option<PathBuf>) {
    let mut was_active = false;
    loop {
        let state = rx.borrow_and_update().clone();
        match state.gradient() {
            Some(g) if !was_active => info!("lights up: {} stops", g.stops().len()),
            Some(g) => trace!("{g}"),
            None if was_active => info!("lights down"),
            None => {}
        }
        was_active = state.is_active();

        if let Some(path) = css_out.as_deref() {
            if let Err(e) = write_css(path, &state).await {
                warn!("paint: cannot write {}: {e}", path.display());
            }
        }

        if rx.changed().await.is_err() {
            break;
        }
    }
    debug!("paint sink stopped");
}
