/*
 *  config.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
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
use std::collections::HashSet;
use std::time::Duration;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::SurfaceSlot;
use crate::input::ENCODER_COUNT;
use crate::pacer::TickMode;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_TICK_MS: u64 = 20;
pub const DEFAULT_POLL_US: u64 = 2500;
pub const DEFAULT_BPM: u32 = 120;
pub const DEFAULT_STATS_SECS: u64 = 10;
pub const DEFAULT_BUS: &str = "/dev/i2c-1";
pub const DEFAULT_ENCODER_PINS: [(u8, u8); ENCODER_COUNT] = [(17, 27), (22, 23), (24, 25)];

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

/// Top-level cabinet configuration. Every field is optional so layers
/// can be merged; accessors fill in the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// Mock chips and scripted encoder lines instead of hardware
    pub emulated: Option<bool>,
    pub timing: Option<TimingConfig>,
    pub bus: Option<BusConfig>,
    pub displays: Option<DisplaysConfig>,
    pub encoders: Option<Vec<EncoderPins>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimingConfig {
    pub mode: Option<TickMode>,
    pub tick_ms: Option<u64>,
    pub poll_us: Option<u64>,
    pub default_bpm: Option<u32>,
    pub stats_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BusConfig {
    pub path: Option<String>,    // e.g. "/dev/i2c-1"
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplaysConfig {
    pub green: Option<u8>,
    pub blue: Option<u8>,
    pub red: Option<u8>,
    pub leds: Option<u8>,
    /// Which chip's key RAM carries the panel wiring
    pub scan: Option<SurfaceSlot>,
}

/// BCM pin numbers of one encoder's A and B lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderPins {
    pub a: u8,
    pub b: u8,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "cabinet", about = "Arcade cabinet I/O runtime", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// run against mock chips and scripted encoders
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    /// tick period in milliseconds (fixed mode)
    #[arg(long)]
    pub tick_ms: Option<u64>,
    /// derive the tick period from the application's tempo
    #[arg(long, action = ArgAction::SetTrue)]
    pub tempo: bool,
    #[arg(long)]
    pub bpm: Option<u32>,
    /// encoder poll interval in microseconds
    #[arg(long)]
    pub poll_us: Option<u64>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub i2c_bus: Option<String>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of effective config (nice for debugging)
pub fn to_yaml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/cabinet/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/cabinet/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/cabinet.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["cabinet.yaml", "config/cabinet.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.emulated.is_some()       { dst.emulated = src.emulated; }
    if src.bus.is_some()            { dst.bus = src.bus; }
    if src.encoders.is_some()       { dst.encoders = src.encoders; }
    // timing
    match (&mut dst.timing, src.timing) {
        (None, Some(t)) => dst.timing = Some(t),
        (Some(d), Some(s)) => merge_timing(d, s),
        _ => {}
    }
    // displays
    match (&mut dst.displays, src.displays) {
        (None, Some(c)) => dst.displays = Some(c),
        (Some(d), Some(s)) => merge_displays(d, s),
        _ => {}
    }
}

fn merge_timing(dst: &mut TimingConfig, src: TimingConfig) {
    if src.mode.is_some()         { dst.mode = src.mode; }
    if src.tick_ms.is_some()      { dst.tick_ms = src.tick_ms; }
    if src.poll_us.is_some()      { dst.poll_us = src.poll_us; }
    if src.default_bpm.is_some()  { dst.default_bpm = src.default_bpm; }
    if src.stats_secs.is_some()   { dst.stats_secs = src.stats_secs; }
}

fn merge_displays(dst: &mut DisplaysConfig, src: DisplaysConfig) {
    if src.green.is_some()  { dst.green = src.green; }
    if src.blue.is_some()   { dst.blue = src.blue; }
    if src.red.is_some()    { dst.red = src.red; }
    if src.leds.is_some()   { dst.leds = src.leds; }
    if src.scan.is_some()   { dst.scan = src.scan; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()  { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                { cfg.log_level = Some("debug".to_string()); }
    if cli.emulated             { cfg.emulated = Some(true); }
    if let Some(path) = cli.i2c_bus.as_ref() {
        cfg.bus = Some(BusConfig { path: Some(path.clone()) });
    }

    let any_timing = cli.tick_ms.is_some() || cli.tempo || cli.bpm.is_some() || cli.poll_us.is_some();
    if any_timing && cfg.timing.is_none() {
        cfg.timing = Some(TimingConfig::default());
    }
    if let Some(timing) = cfg.timing.as_mut() {
        if cli.tick_ms.is_some()  { timing.tick_ms = cli.tick_ms; }
        if cli.tempo              { timing.mode = Some(TickMode::Tempo); }
        if cli.bpm.is_some()      { timing.default_bpm = cli.bpm; }
        if cli.poll_us.is_some()  { timing.poll_us = cli.poll_us; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(timing) = cfg.timing.as_ref() {
        if let Some(ms) = timing.tick_ms {
            if !(1..=1000).contains(&ms) {
                return Err(ConfigError::Validation("timing tick_ms must be 1..=1000".into()));
            }
        }
        if let Some(us) = timing.poll_us {
            if !(500..=50_000).contains(&us) {
                return Err(ConfigError::Validation("timing poll_us must be 500..=50000".into()));
            }
        }
        if let Some(bpm) = timing.default_bpm {
            if !(1..=999).contains(&bpm) {
                return Err(ConfigError::Validation("timing default_bpm must be 1..=999".into()));
            }
        }
        if timing.stats_secs == Some(0) {
            return Err(ConfigError::Validation("timing stats_secs must be > 0".into()));
        }
    }

    let mut seen = HashSet::new();
    for slot in SurfaceSlot::ALL {
        let address = cfg.address(slot);
        if !(0x70..=0x77).contains(&address) {
            return Err(ConfigError::Validation(format!(
                "{} display address 0x{:02X} outside 0x70..=0x77", slot, address
            )));
        }
        if !seen.insert(address) {
            return Err(ConfigError::Validation(format!(
                "{} display address 0x{:02X} already in use", slot, address
            )));
        }
    }

    if let Some(encoders) = cfg.encoders.as_ref() {
        if encoders.len() != ENCODER_COUNT {
            return Err(ConfigError::Validation(format!(
                "exactly {} encoders required, got {}", ENCODER_COUNT, encoders.len()
            )));
        }
    }
    Ok(())
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn is_emulated(&self) -> bool {
        self.emulated.unwrap_or(false)
    }

    pub fn tick_mode(&self) -> TickMode {
        self.timing.as_ref().and_then(|t| t.mode).unwrap_or(TickMode::Fixed)
    }

    pub fn tick_period(&self) -> Duration {
        let ms = self.timing.as_ref().and_then(|t| t.tick_ms).unwrap_or(DEFAULT_TICK_MS);
        Duration::from_millis(ms)
    }

    pub fn poll_interval(&self) -> Duration {
        let us = self.timing.as_ref().and_then(|t| t.poll_us).unwrap_or(DEFAULT_POLL_US);
        Duration::from_micros(us)
    }

    pub fn default_bpm(&self) -> u32 {
        self.timing.as_ref().and_then(|t| t.default_bpm).unwrap_or(DEFAULT_BPM)
    }

    pub fn stats_interval(&self) -> Duration {
        let secs = self.timing.as_ref().and_then(|t| t.stats_secs).unwrap_or(DEFAULT_STATS_SECS);
        Duration::from_secs(secs)
    }

    pub fn bus_path(&self) -> &str {
        self.bus
            .as_ref()
            .and_then(|b| b.path.as_deref())
            .unwrap_or(DEFAULT_BUS)
    }

    pub fn address(&self, slot: SurfaceSlot) -> u8 {
        let displays = self.displays.as_ref();
        let configured = match slot {
            SurfaceSlot::Green => displays.and_then(|d| d.green),
            SurfaceSlot::Blue => displays.and_then(|d| d.blue),
            SurfaceSlot::Red => displays.and_then(|d| d.red),
            SurfaceSlot::Leds => displays.and_then(|d| d.leds),
        };
        configured.unwrap_or(match slot {
            SurfaceSlot::Green => 0x70,
            SurfaceSlot::Blue => 0x71,
            SurfaceSlot::Red => 0x72,
            SurfaceSlot::Leds => 0x73,
        })
    }

    pub fn scan_slot(&self) -> SurfaceSlot {
        self.displays.as_ref().and_then(|d| d.scan).unwrap_or(SurfaceSlot::Leds)
    }

    pub fn encoder_pins(&self) -> [(u8, u8); ENCODER_COUNT] {
        match self.encoders.as_deref() {
            Some([e0, e1, e2]) => [(e0.a, e0.b), (e1.a, e1.b), (e2.a, e2.b)],
            _ => DEFAULT_ENCODER_PINS,
        }
    }
}
