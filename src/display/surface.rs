/*
 *  display/surface.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-tick display surface values handed to the display manager
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
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::display::error::DisplayError;

/// Character cells on one alphanumeric display
pub const CELLS: usize = 4;

/// One 16-bit segment mask per cell
pub type Segments = [u16; CELLS];

/// Chip dimming levels run 0..=15
pub const MAX_BRIGHTNESS: u8 = 15;

/// The physical surfaces, in the order they are queried and committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceSlot {
    Green,
    Blue,
    Red,
    Leds,
}

impl SurfaceSlot {
    pub const ALL: [SurfaceSlot; 4] = [SurfaceSlot::Green, SurfaceSlot::Blue, SurfaceSlot::Red, SurfaceSlot::Leds];

    pub fn is_led_bank(self) -> bool {
        self == SurfaceSlot::Leds
    }

    pub fn name(self) -> &'static str {
        match self {
            SurfaceSlot::Green => "green",
            SurfaceSlot::Blue => "blue",
            SurfaceSlot::Red => "red",
            SurfaceSlot::Leds => "leds",
        }
    }
}

impl fmt::Display for SurfaceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hardware blink, slowest to fastest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlinkRate {
    #[default]
    Off,
    /// 0.5 Hz
    Slow,
    /// 1 Hz
    Normal,
    /// 2 Hz
    Fast,
}

/// What a surface shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceValue {
    Integer(i32),
    /// Left aligned, first four characters visible
    Text(String),
    /// Segment masks written verbatim
    RawSegments(Segments),
    /// Nothing lit. Valid on every surface, the LED bank included.
    Blank,
}

impl SurfaceValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SurfaceValue::Integer(_) => "integer",
            SurfaceValue::Text(_) => "text",
            SurfaceValue::RawSegments(_) => "raw segments",
            SurfaceValue::Blank => "blank",
        }
    }
}

/// Pure per-tick transform applied right before rendering
pub type Animator = Arc<dyn Fn(DisplaySurface, u64) -> DisplaySurface + Send + Sync>;

/// Everything needed to draw one surface for one tick
#[derive(Clone)]
pub struct DisplaySurface {
    pub value: SurfaceValue,
    pub blink: BlinkRate,
    pub brightness: u8,
    pub animator: Option<Animator>,
}

impl fmt::Debug for DisplaySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplaySurface")
            .field("value", &self.value)
            .field("blink", &self.blink)
            .field("brightness", &self.brightness)
            .field("animated", &self.animator.is_some())
            .finish()
    }
}

impl PartialEq for DisplaySurface {
    // animators are compared by identity
    fn eq(&self, other: &Self) -> bool {
        let same_animator = match (&self.animator, &other.animator) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.value == other.value
            && self.blink == other.blink
            && self.brightness == other.brightness
            && same_animator
    }
}

impl DisplaySurface {
    pub fn new(value: SurfaceValue) -> Self {
        Self {
            value,
            blink: BlinkRate::Off,
            brightness: MAX_BRIGHTNESS,
            animator: None,
        }
    }

    pub fn integer(value: i32) -> Self {
        Self::new(SurfaceValue::Integer(value))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(SurfaceValue::Text(text.into()))
    }

    pub fn raw(segments: Segments) -> Self {
        Self::new(SurfaceValue::RawSegments(segments))
    }

    /// All segments off
    pub fn blank() -> Self {
        Self::new(SurfaceValue::Blank)
    }

    pub fn with_blink(mut self, blink: BlinkRate) -> Self {
        self.blink = blink;
        self
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    pub fn with_animator(mut self, animator: Animator) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Run the animator, if any, for this tick. The result carries no
    /// animator so it is applied exactly once.
    pub fn animate(mut self, tick: u64) -> DisplaySurface {
        match self.animator.take() {
            Some(animator) => {
                let mut out = animator(self, tick);
                out.animator = None;
                out
            }
            None => self,
        }
    }
}

/// Segment masks under construction, for composing sprites on one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentFrame(Segments);

impl SegmentFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_digit(&mut self, index: usize, mask: u16) -> Result<(), DisplayError> {
        let cell = self.0.get_mut(index).ok_or(DisplayError::DigitOutOfRange { index, cells: CELLS })?;
        *cell = mask;
        Ok(())
    }

    /// OR a mask into one cell, keeping what is already lit
    pub fn overlay_digit(&mut self, index: usize, mask: u16) -> Result<(), DisplayError> {
        let cell = self.0.get_mut(index).ok_or(DisplayError::DigitOutOfRange { index, cells: CELLS })?;
        *cell |= mask;
        Ok(())
    }

    /// OR a whole frame on top of this one
    pub fn overlay(&mut self, other: &SegmentFrame) {
        for (cell, mask) in self.0.iter_mut().zip(other.0) {
            *cell |= mask;
        }
    }

    pub fn segments(&self) -> Segments {
        self.0
    }

    pub fn into_surface(self) -> DisplaySurface {
        DisplaySurface::raw(self.0)
    }
}
