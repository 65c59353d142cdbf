/*
 *  main.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  Player, session and paint sink wired together
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

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use the_club::config::{self, Cli};
use the_club::pacer::{FrameClock, Pacer};
use the_club::playback::{Player, PlayerEvent, Track, TONE_SAMPLE_RATE};
use the_club::spectrum::{AudioTap, SpectrumAnalyser};
use the_club::stage::paint_sink;
use the_club::{Stage, TheClub};

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Route player lifecycle into the session until the track ends.
async fn run_events<C: FrameClock>(
    club: &mut TheClub<SpectrumAnalyser, C>,
    events: &mut mpsc::Receiver<PlayerEvent>,
    tap: &AudioTap,
) -> Result<()> {
    while let Some(event) = events.recv().await {
        match event {
            PlayerEvent::MetadataLoaded { src, sample_rate, duration } => {
                info!("{src}: {sample_rate} Hz, {:.1}s", duration.as_secs_f32());
                club.on_source_ready(&src, || SpectrumAnalyser::new(tap.clone()))
                    .await
                    .with_context(|| format!("setting up analysis for {src}"))?;
            }
            PlayerEvent::Started => {
                club.on_playback_started()?;
            }
            PlayerEvent::Ended => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        println!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This is {}, the party starts here", env!("CARGO_PKG_NAME"));
    info!("v.{}", env!("CARGO_PKG_VERSION"));

    let track = match cfg.input.as_deref() {
        Some(path) => Track::open_wav(path).with_context(|| format!("opening {}", path.display()))?,
        None => {
            info!("no input, sweeping a test tone for {}s", cfg.tone_seconds());
            Track::tone(TONE_SAMPLE_RATE, cfg.tone_seconds())
        }
    };

    let stage = Stage::new();
    let sink = tokio::spawn(paint_sink(stage.subscribe(), cfg.css_out.clone()));

    let fps = cfg.fps();
    let mut club = TheClub::new(cfg.club_settings(), stage.clone(), move || Pacer::new(fps));

    let tap = AudioTap::new();
    let (tx, mut events) = mpsc::channel(8);
    let mut player = Player::spawn(track, tap.clone(), tx);

    let outcome = tokio::select! {
        r = signal_handler() => r,
        r = run_events(&mut club, &mut events, &tap) => r,
    };

    player.stop();
    if let Some(stats) = club.on_playback_ended().await {
        info!(
            "{} frames: {} lit, {} idle, {} skipped, {} failed",
            stats.frames, stats.lit, stats.idle, stats.skipped, stats.failed
        );
    }

    drop(club);
    drop(stage);
    if let Err(e) = sink.await {
        warn!("paint sink ended abnormally: {e}");
    }

    outcome
}
