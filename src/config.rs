/*
 *  config.rs
 *
 *  the-club - audio reactive backdrop
 *  (c) 2020-26 Stuart Hunter
 *
 *  YAML config with command line overrides
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::gradient::Corner;
use crate::session::ClubSettings;

pub const DEFAULT_FPS: u32 = 60;
pub const MAX_FPS: u32 = 240;
pub const DEFAULT_TONE_SECONDS: f32 = 10.0;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration. Every field is optional so layers stack.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,      // e.g., "info" | "debug"
    /// shuffle colour channels every frame
    pub randomize_colors: Option<bool>,
    /// analysis window; the engine decides whether it is acceptable
    pub fft_size: Option<usize>,
    pub fps: Option<u32>,
    pub corner: Option<Corner>,
    /// WAV to play; without one a test tone sweeps instead
    pub input: Option<PathBuf>,
    pub tone_seconds: Option<f32>,
    /// file rewritten with the current style on every change
    pub css_out: Option<PathBuf>,
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn fps(&self) -> u32 {
        self.fps.unwrap_or(DEFAULT_FPS)
    }

    pub fn tone_seconds(&self) -> f32 {
        self.tone_seconds.unwrap_or(DEFAULT_TONE_SECONDS)
    }

    pub fn club_settings(&self) -> ClubSettings {
        ClubSettings {
            randomize_colors: self.randomize_colors.unwrap_or(false),
            fft_size: self.fft_size,
            corner: self.corner.unwrap_or_default(),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "the-club", version, about = "Paint the room with whatever is playing")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// WAV file to play
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub randomize_colors: bool,
    #[arg(long)]
    pub fft_size: Option<usize>,
    #[arg(long)]
    pub fps: Option<u32>,
    #[arg(long, value_enum)]
    pub corner: Option<Corner>,
    /// Length of the built-in test tone
    #[arg(long)]
    pub tone_seconds: Option<f32>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub css_out: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Debug logging
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge the command line over it, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            merge(&mut cfg, read_yaml(p)?);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        merge(&mut cfg, read_yaml(&p)?);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of the effective config.
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/the-club/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/the-club/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/the-club.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["the-club.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    // an empty file is a valid, empty config
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()        { dst.log_level = src.log_level; }
    if src.randomize_colors.is_some() { dst.randomize_colors = src.randomize_colors; }
    if src.fft_size.is_some()         { dst.fft_size = src.fft_size; }
    if src.fps.is_some()              { dst.fps = src.fps; }
    if src.corner.is_some()           { dst.corner = src.corner; }
    if src.input.is_some()            { dst.input = src.input; }
    if src.tone_seconds.is_some()     { dst.tone_seconds = src.tone_seconds; }
    if src.css_out.is_some()          { dst.css_out = src.css_out; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()    { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                  { cfg.log_level = Some("debug".into()); }
    // a flag can only switch it on
    if cli.randomize_colors       { cfg.randomize_colors = Some(true); }
    if cli.fft_size.is_some()     { cfg.fft_size = cli.fft_size; }
    if cli.fps.is_some()          { cfg.fps = cli.fps; }
    if cli.corner.is_some()       { cfg.corner = cli.corner; }
    if cli.input.is_some()        { cfg.input = cli.input.clone(); }
    if cli.tone_seconds.is_some() { cfg.tone_seconds = cli.tone_seconds; }
    if cli.css_out.is_some()      { cfg.css_out = cli.css_out.clone(); }
}

/// Ranges and required files. The fft size is left to the analysis engine.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(fps) = cfg.fps {
        if fps == 0 || fps > MAX_FPS {
            return Err(ConfigError::Validation(format!("fps must be 1..={MAX_FPS}, got {fps}")));
        }
    }
    if let Some(secs) = cfg.tone_seconds {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(ConfigError::Validation("tone_seconds must be > 0".into()));
        }
    }
    if let Some(input) = cfg.input.as_ref() {
        if !input.is_file() {
            return Err(ConfigError::Validation(format!(
                "input not found: {}",
                input.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_yaml(name: &str, body: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("the-club-{}-{name}.yaml", std::process::id()));
        fs::write(&p, body).unwrap();
        p
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["the-club"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.fps(), 60);
        assert_eq!(cfg.log_level(), "info");
        assert_eq!(cfg.tone_seconds(), 10.0);
        let s = cfg.club_settings();
        assert!(!s.randomize_colors);
        assert_eq!(s.fft_size, None);
        assert_eq!(s.corner, Corner::TopRight);
    }

    #[test]
    fn test_yaml_then_cli() {
        let p = scratch_yaml("layers", "fps: 30\nfft_size: 512\ncorner: bottom-left\nrandomize_colors: false\n");
        let path = p.to_string_lossy().into_owned();

        let cfg = load(&cli(&["--config", &path])).unwrap();
        assert_eq!(cfg.fps(), 30);
        assert_eq!(cfg.fft_size, Some(512));
        assert_eq!(cfg.corner, Some(Corner::BottomLeft));

        let cfg = load(&cli(&["--config", &path, "--fps", "24", "--randomize-colors", "-v"])).unwrap();
        assert_eq!(cfg.fps(), 24);
        assert_eq!(cfg.fft_size, Some(512));
        assert!(cfg.club_settings().randomize_colors);
        assert_eq!(cfg.log_level(), "debug");
        fs::remove_file(p).ok();
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let p = scratch_yaml("empty", "");
        let path = p.to_string_lossy().into_owned();
        let cfg = load(&cli(&["--config", &path])).unwrap();
        assert_eq!(cfg, Config::default());
        fs::remove_file(p).ok();
    }

    #[test]
    fn test_missing_config_file() {
        let r = load(&cli(&["--config", "/nonexistent/the-club.yaml"]));
        assert!(matches!(r, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_bad_yaml() {
        let p = scratch_yaml("bad", "fps: [not a number\n");
        let path = p.to_string_lossy().into_owned();
        assert!(matches!(load(&cli(&["--config", &path])), Err(ConfigError::Yaml(_))));
        fs::remove_file(p).ok();
    }

    #[test]
    fn test_validation() {
        let p = scratch_yaml("valid", "log_level: warn\n");
        let path = p.to_string_lossy().into_owned();

        assert!(load(&cli(&["--config", &path, "--fps", "0"])).is_err());
        assert!(load(&cli(&["--config", &path, "--fps", "241"])).is_err());
        assert!(load(&cli(&["--config", &path, "--input", "/nonexistent/song.wav"])).is_err());
        // odd sizes get through here and fail at session setup
        let cfg = load(&cli(&["--config", &path, "--fft-size", "1000"])).unwrap();
        assert_eq!(cfg.club_settings().fft_size, Some(1000));
        fs::remove_file(p).ok();
    }

    #[test]
    fn test_dump_round_trips() {
        let cfg = Config { fps: Some(50), corner: Some(Corner::Center), ..Default::default() };
        let yaml = dump(&cfg).unwrap();
        assert!(yaml.contains("corner: center"));
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_corner_on_command_line() {
        assert_eq!(cli(&["--corner", "top-left"]).corner, Some(Corner::TopLeft));
        assert!(Cli::try_parse_from(["the-club", "--corner", "middle"]).is_err());
    }
}
