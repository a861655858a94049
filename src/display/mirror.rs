/*
 *  display/mirror.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Host-side mirror of write-only chip configuration registers
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
use crate::display::traits::ChipDriver;

/// Last brightness and blink successfully written to one chip.
///
/// `None` means unknown, which always differs from the desired value, so
/// the first commit after start or [`ChipMirror::invalidate`] writes both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipMirror {
    brightness: Option<u8>,
    blink: Option<BlinkRate>,
    writes: u64,
}

impl ChipMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brightness(&self) -> Option<u8> {
        self.brightness
    }

    pub fn blink(&self) -> Option<BlinkRate> {
        self.blink
    }

    /// Configuration register writes issued over the chip's lifetime
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Forget what the chip holds, e.g. after it was re-initialised
    pub fn invalidate(&mut self) {
        self.brightness = None;
        self.blink = None;
    }

    /// Write brightness only if it differs. The mirror changes only when
    /// the write succeeds. Returns whether a write was issued.
    pub fn sync_brightness(&mut self, chip: &mut dyn ChipDriver, level: u8) -> Result<bool, DisplayError> {
        if self.brightness == Some(level) {
            return Ok(false);
        }
        chip.set_brightness(level)?;
        self.brightness = Some(level);
        self.writes += 1;
        Ok(true)
    }

    pub fn sync_blink(&mut self, chip: &mut dyn ChipDriver, rate: BlinkRate) -> Result<bool, DisplayError> {
        if self.blink == Some(rate) {
            return Ok(false);
        }
        chip.set_blink(rate)?;
        self.blink = Some(rate);
        self.writes += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockChip;

    #[test]
    fn test_first_sync_always_writes() {
        let mut chip = MockChip::new("green", 0x70);
        let mut mirror = ChipMirror::new();
        assert!(mirror.sync_brightness(&mut chip, 15).unwrap());
        assert!(mirror.sync_blink(&mut chip, BlinkRate::Off).unwrap());
        assert_eq!(mirror.brightness(), Some(15));
        assert_eq!(mirror.blink(), Some(BlinkRate::Off));

        let state = chip.state();
        let state = state.lock().unwrap();
        assert_eq!(state.brightness_writes, 1);
        assert_eq!(state.blink_writes, 1);
    }

    #[test]
    fn test_unchanged_values_are_not_rewritten() {
        let mut chip = MockChip::new("green", 0x70);
        let mut mirror = ChipMirror::new();
        for _ in 0..10 {
            mirror.sync_brightness(&mut chip, 8).unwrap();
            mirror.sync_blink(&mut chip, BlinkRate::Fast).unwrap();
        }
        assert_eq!(mirror.writes(), 2);
        assert!(mirror.sync_brightness(&mut chip, 9).unwrap());
        assert_eq!(mirror.writes(), 3);
        assert_eq!(chip.state().lock().unwrap().brightness_writes, 2);
    }

    #[test]
    fn test_failed_write_leaves_mirror_untouched() {
        let mut chip = MockChip::new("red", 0x72);
        let mut mirror = ChipMirror::new();
        mirror.sync_brightness(&mut chip, 4).unwrap();

        chip.state().lock().unwrap().simulate_config_failure = true;
        assert!(mirror.sync_brightness(&mut chip, 12).is_err());
        assert_eq!(mirror.brightness(), Some(4));

        // retried once the bus recovers
        chip.state().lock().unwrap().simulate_config_failure = false;
        assert!(mirror.sync_brightness(&mut chip, 12).unwrap());
        assert_eq!(mirror.brightness(), Some(12));
    }

    #[test]
    fn test_invalidate_forces_rewrite() {
        let mut chip = MockChip::new("blue", 0x71);
        let mut mirror = ChipMirror::new();
        mirror.sync_blink(&mut chip, BlinkRate::Slow).unwrap();
        mirror.invalidate();
        assert!(mirror.sync_blink(&mut chip, BlinkRate::Slow).unwrap());
    }
}
