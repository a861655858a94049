/*
 *  input/lines.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Encoder line sources: GPIO header and scripted test input
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

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::ENCODER_COUNT;
use crate::error::HardwareError;

/// A/B line levels for every encoder, in encoder order
pub type Levels = [(bool, bool); ENCODER_COUNT];

/// Source of raw encoder line levels, owned by the poll thread.
pub trait EncoderLines: Send {
    /// Sample all encoder lines at once
    fn sample(&mut self) -> Result<Levels, HardwareError>;
}

pub type BoxedLines = Box<dyn EncoderLines>;

/// Encoder lines wired to the Raspberry Pi header, pulled up.
#[cfg(feature = "gpio")]
pub struct GpioLines {
    pins: Vec<(rppal::gpio::InputPin, rppal::gpio::InputPin)>,
}

#[cfg(feature = "gpio")]
impl GpioLines {
    /// Claim the A/B pins (BCM numbering) of each encoder
    pub fn open(pins: &[(u8, u8); ENCODER_COUNT]) -> Result<Self, HardwareError> {
        let gpio = rppal::gpio::Gpio::new()?;
        let mut claimed = Vec::with_capacity(ENCODER_COUNT);
        for &(a, b) in pins {
            let a = gpio.get(a)?.into_input_pullup();
            let b = gpio.get(b)?.into_input_pullup();
            claimed.push((a, b));
        }
        log::info!("Encoder lines claimed on BCM pins {:?}", pins);
        Ok(Self { pins: claimed })
    }
}

#[cfg(feature = "gpio")]
impl EncoderLines for GpioLines {
    fn sample(&mut self) -> Result<Levels, HardwareError> {
        let mut levels = [(false, false); ENCODER_COUNT];
        for (level, (a, b)) in levels.iter_mut().zip(&self.pins) {
            *level = (a.is_high(), b.is_high());
        }
        Ok(levels)
    }
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Levels>,
    current: Levels,
    samples: usize,
    failing: bool,
}

/// Replays queued levels, then holds the last one.
///
/// Clones share the same script, so a test can keep one handle and give
/// the other to the poll thread.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
    script: Arc<Mutex<Script>>,
}

impl ScriptedLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, levels: Levels) {
        self.with(|s| s.queue.push_back(levels));
    }

    pub fn feed_all<I: IntoIterator<Item = Levels>>(&self, levels: I) {
        self.with(|s| s.queue.extend(levels));
    }

    /// Queue a sequence for a single encoder, the others holding still
    pub fn feed_encoder(&self, index: usize, pairs: &[(bool, bool)]) {
        self.with(|s| {
            let mut base = s.queue.back().copied().unwrap_or(s.current);
            for &pair in pairs {
                if let Some(slot) = base.get_mut(index) {
                    *slot = pair;
                }
                s.queue.push_back(base);
            }
        });
    }

    pub fn set_failing(&self, failing: bool) {
        self.with(|s| s.failing = failing);
    }

    pub fn samples_taken(&self) -> usize {
        self.with(|s| s.samples)
    }

    pub fn is_exhausted(&self) -> bool {
        self.with(|s| s.queue.is_empty())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }
}

impl EncoderLines for ScriptedLines {
    fn sample(&mut self) -> Result<Levels, HardwareError> {
        self.with(|s| {
            s.samples += 1;
            if s.failing {
                return Err(HardwareError::Simulated("encoder sample"));
            }
            if let Some(next) = s.queue.pop_front() {
                s.current = next;
            }
            Ok(s.current)
        })
    }
}

/// Open the encoder lines for a run: scripted when emulated, otherwise
/// the GPIO header.
pub fn open_lines(pins: &[(u8, u8); ENCODER_COUNT], emulated: bool) -> Result<BoxedLines, HardwareError> {
    if emulated {
        log::info!("Encoder lines emulated");
        return Ok(Box::new(ScriptedLines::new()));
    }
    open_gpio(pins)
}

#[cfg(feature = "gpio")]
fn open_gpio(pins: &[(u8, u8); ENCODER_COUNT]) -> Result<BoxedLines, HardwareError> {
    Ok(Box::new(GpioLines::open(pins)?))
}

#[cfg(not(feature = "gpio"))]
fn open_gpio(_pins: &[(u8, u8); ENCODER_COUNT]) -> Result<BoxedLines, HardwareError> {
    Err(HardwareError::Unavailable("built without the gpio feature".into()))
}
