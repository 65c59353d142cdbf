/*
 *  tests/light_show.rs
 *
 *  End-to-end light show through the public session API
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 */

use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

use the_club::colors::{map_color, Rgb};
use the_club::pacer::{FrameTrigger, ManualClock};
use the_club::spectrum::{AudioTap, FrequencySource, ScriptedSpectrum, SpectrumAnalyser};
use the_club::stage::{ACTIVE_CLASS, BACKGROUND_VAR};
use the_club::{ClubSettings, Stage, TheClub, VisualState};

type Triggers = Arc<Mutex<Vec<FrameTrigger>>>;

fn club<S: FrequencySource + 'static>(settings: ClubSettings) -> (TheClub<S, ManualClock>, Stage, Triggers) {
    let stage = Stage::new();
    let triggers: Triggers = Arc::default();
    let handed_out = triggers.clone();
    let club = TheClub::new(settings, stage.clone(), move || {
        let (clock, trigger) = ManualClock::new();
        handed_out.lock().unwrap().push(trigger);
        clock
    });
    (club, stage, triggers)
}

fn first_trigger(triggers: &Triggers) -> FrameTrigger {
    triggers.lock().unwrap()[0].clone()
}

#[tokio::test]
async fn silence_leaves_the_room_dark() {
    let (mut club, stage, triggers) = club(ClubSettings::default());
    let source = ScriptedSpectrum::new(&[0, 0, 0, 0]);
    club.on_source_ready("quiet.wav", || source.clone()).await.unwrap();
    club.on_playback_started().unwrap();

    let frames = first_trigger(&triggers);
    for _ in 0..3 {
        assert!(frames.frame().await);
        assert_eq!(stage.snapshot(), VisualState::Inactive);
    }
    let stats = club.on_playback_ended().await.unwrap();
    assert_eq!(stats.idle, 3);
    assert_eq!(stats.lit, 0);
}

#[tokio::test]
async fn spectrum_becomes_gradient_and_goes_dark_again() {
    let (mut club, stage, triggers) = club(ClubSettings::default());
    let source = ScriptedSpectrum::new(&[255, 0, 128, 64]);
    club.on_source_ready("song.wav", || source.clone()).await.unwrap();
    club.on_playback_started().unwrap();
    let frames = first_trigger(&triggers);

    assert!(frames.frame().await);
    let state = stage.snapshot();
    let stops = state.gradient().unwrap().stops().to_vec();
    assert_eq!(stops.len(), 4);
    for (i, &m) in [255u8, 0, 128, 64].iter().enumerate() {
        assert_eq!(stops[i], map_color(i, m, false));
    }
    assert_eq!(stops[1], Rgb::BLACK);
    assert!(stops[1].luminance() < stops[0].luminance());
    assert!(stops[1].luminance() < stops[2].luminance());

    let css = state.css();
    assert!(css.contains(&format!("body.{ACTIVE_CLASS}")));
    assert!(css.contains(&format!("{BACKGROUND_VAR}: radial-gradient(circle at top right, rgb(")));

    source.set(&[0, 0, 0, 0]);
    assert!(frames.frame().await);
    assert!(!stage.is_active());

    club.on_playback_ended().await;
    assert!(!stage.is_active());
}

#[tokio::test]
async fn one_loop_per_source_however_often_it_plays() {
    let (mut club, stage, triggers) = club(ClubSettings::default());
    let source = ScriptedSpectrum::new(&[1, 2, 3]);
    for _ in 0..3 {
        club.on_source_ready("loop.wav", || source.clone()).await.unwrap();
        club.on_playback_started().unwrap();
    }
    assert_eq!(triggers.lock().unwrap().len(), 1);
    assert!(first_trigger(&triggers).frame().await);
    assert!(stage.is_active());
    club.on_playback_ended().await;
}

#[tokio::test]
async fn real_analyser_lights_up_on_a_tone() {
    let settings = ClubSettings { fft_size: Some(256), ..Default::default() };
    let (mut club, stage, triggers) = club(settings);
    let tap = AudioTap::new();
    club.on_source_ready("tone", || SpectrumAnalyser::new(tap.clone())).await.unwrap();
    assert_eq!(club.band_count(), Some(128));
    club.on_playback_started().unwrap();
    let frames = first_trigger(&triggers);

    // nothing pushed yet
    assert!(frames.frame().await);
    assert!(!stage.is_active());

    let tone: Vec<f32> = (0..256).map(|i| 0.5 * (TAU * 16.0 * i as f32 / 256.0).sin()).collect();
    tap.push(&tone);
    assert!(frames.frame().await);
    let state = stage.snapshot();
    let stops = state.gradient().unwrap().stops();
    assert_eq!(stops.len(), 128);
    assert!(stops[16].luminance() > stops[64].luminance());

    tap.silence();
    assert!(frames.frame().await);
    assert!(!stage.is_active());

    let stats = club.on_playback_ended().await.unwrap();
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.lit, 1);
    assert_eq!(stats.idle, 2);
}

#[tokio::test]
async fn bad_fft_size_never_starts_a_show() {
    let settings = ClubSettings { fft_size: Some(48), ..Default::default() };
    let (mut club, stage, triggers) = club(settings);
    let tap = AudioTap::new();
    assert!(club.on_source_ready("tone", || SpectrumAnalyser::new(tap.clone())).await.is_err());
    assert!(!club.on_playback_started().unwrap());
    assert!(triggers.lock().unwrap().is_empty());
    assert!(!stage.is_active());
}
