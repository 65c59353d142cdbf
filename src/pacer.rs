/*
 *  pacer.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame scheduling for the render loop
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

use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

/// "Call me on the next display frame."
pub trait FrameClock: Send + 'static {
    /// Resolves when the next frame is due; `false` once no frame will ever come.
    fn next_frame(&mut self) -> impl Future<Output = bool> + Send;
}

/// Wall-clock frames at a target rate. Late frames are skipped, never queued.
pub struct Pacer {
    ticker: Interval,
    frame: Duration,
}

impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        let frame = Duration::from_micros((1_000_000u32 / target_fps.max(1)) as u64);
        let mut ticker = interval(frame);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { ticker, frame }
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }
}

impl FrameClock for Pacer {
    async fn next_frame(&mut self) -> bool {
        self.ticker.tick().await;
        true
    }
}

/// Frames on demand, for driving the loop step by step.
pub struct ManualClock {
    rx: mpsc::Receiver<oneshot::Sender<()>>,
    in_flight: Option<oneshot::Sender<()>>,
}

/// The button that fires a [`ManualClock`].
#[derive(Clone)]
pub struct FrameTrigger {
    tx: mpsc::Sender<oneshot::Sender<()>>,
}

impl ManualClock {
    pub fn new() -> (Self, FrameTrigger) {
        let (tx, rx) = mpsc::channel(1);
        (Self { rx, in_flight: None }, FrameTrigger { tx })
    }
}

impl FrameClock for ManualClock {
    async fn next_frame(&mut self) -> bool {
        // asking for the next frame means the previous one is fully done
        if let Some(done) = self.in_flight.take() {
            let _ = done.send(());
        }
        match self.rx.recv().await {
            Some(done) => {
                self.in_flight = Some(done);
                true
            }
            None => false,
        }
    }
}

impl FrameTrigger {
    /// Fire one frame and wait until the loop has finished it.
    /// Returns `false` if the loop is gone or stopped before completing it.
    pub async fn frame(&self) -> bool {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(done_tx).await.is_err() {
            return false;
        }
        done_rx.await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pacer_frame_length() {
        let p = Pacer::new(60);
        assert_eq!(p.frame(), Duration::from_micros(16_666));
        let p = Pacer::new(0);
        assert_eq!(p.frame(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_pacer_ticks() {
        let mut p = Pacer::new(240);
        assert!(p.next_frame().await);
        assert!(p.next_frame().await);
    }

    #[tokio::test]
    async fn test_manual_frame_completes_on_next_request() {
        let (mut clock, trigger) = ManualClock::new();
        let worker = tokio::spawn(async move {
            let mut frames = 0;
            while clock.next_frame().await {
                frames += 1;
            }
            frames
        });

        assert!(trigger.frame().await);
        assert!(trigger.frame().await);
        drop(trigger);
        assert_eq!(worker.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_manual_frame_fails_when_loop_is_gone() {
        let (clock, trigger) = ManualClock::new();
        drop(clock);
        assert!(!trigger.frame().await);
    }
}
