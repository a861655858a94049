/*
 *  display/traits.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Hardware abstraction for multiplexed LED driver chips
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

use crate::display::error::DisplayError;
use crate::display::surface::BlinkRate;
use crate::error::HardwareError;
use crate::input::KeyScan;

/// Words of display RAM on a 16x8 matrix driver
pub const DISPLAY_RAM_WORDS: usize = 8;

/// Chip capabilities and metadata
#[derive(Debug, Clone)]
pub struct ChipCapabilities {
    /// Human readable model name
    pub name: &'static str,

    /// Bus address
    pub address: u8,

    /// Display RAM size in 16-bit words
    pub buffer_words: usize,

    /// Highest dimming level accepted
    pub max_brightness: u8,

    /// Whether the chip has key-scan RAM wired to the panel
    pub has_key_scan: bool,
}

/// Minimal hardware abstraction - every LED driver chip implements this
///
/// Brightness and blink are write-only registers. Buffer writes are staged
/// and only reach the LEDs on `flush`.
pub trait ChipDriver: Send {
    /// Returns the capabilities of this chip
    fn capabilities(&self) -> &ChipCapabilities;

    /// Start the oscillator, turn the display on and blank it
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set dimming level, 0 (dimmest) to `max_brightness`
    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError>;

    /// Set the hardware blink rate
    fn set_blink(&mut self, rate: BlinkRate) -> Result<(), DisplayError>;

    /// Stage words into display RAM starting at word 0
    fn write_buffer(&mut self, words: &[u16]) -> Result<(), DisplayError>;

    /// Transfer the staged buffer to the chip
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Read the raw key-scan RAM
    fn read_key_scan(&mut self) -> Result<KeyScan, HardwareError>;

    /// Blank the display
    fn clear(&mut self) -> Result<(), DisplayError> {
        let blank = [0u16; DISPLAY_RAM_WORDS];
        let words = self.capabilities().buffer_words.min(DISPLAY_RAM_WORDS);
        self.write_buffer(&blank[..words])?;
        self.flush()
    }
}

/// Type alias for boxed chip drivers
pub type BoxedChip = Box<dyn ChipDriver>;
