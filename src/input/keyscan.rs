/*
 *  input/keyscan.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Key-scan register map for the control panel wiring
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

//! Byte 0 carries the eight toggles. Byte 1 packs the three selectors two
//! bits each. Byte 2 has the buttons (bits 0-2), encoder push buttons
//! (bits 3-5) and the joystick button (bit 6). Byte 3 has the joystick
//! up/down/left/right contacts (bits 0-3). Bytes 4 and 5 are unwired.
//! A set bit means active.

use super::panel::Direction;
use super::{BUTTON_COUNT, ENCODER_COUNT, SELECTOR_COUNT};

pub const KEY_SCAN_BYTES: usize = 6;

/// Raw key RAM snapshot read from a display chip
pub type KeyScan = [u8; KEY_SCAN_BYTES];

const TOGGLES: usize = 0;
const SELECTORS: usize = 1;
const SWITCHES: usize = 2;
const JOYSTICK: usize = 3;

const ENCODER_BUTTON_SHIFT: u8 = 3;
const JOYSTICK_BUTTON_BIT: u8 = 6;

const JOY_UP: u8 = 1 << 0;
const JOY_DOWN: u8 = 1 << 1;
const JOY_LEFT: u8 = 1 << 2;
const JOY_RIGHT: u8 = 1 << 3;

/// One decoded key-scan snapshot, before any edge tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawPanel {
    pub toggles: u8,
    pub selectors: [u8; SELECTOR_COUNT],
    pub buttons: [bool; BUTTON_COUNT],
    pub encoder_buttons: [bool; ENCODER_COUNT],
    pub joystick: Direction,
    pub joystick_button: bool,
}

impl RawPanel {
    pub fn from_key_scan(scan: &KeyScan) -> Self {
        let selector_bits = scan[SELECTORS];
        let switches = scan[SWITCHES];

        let selectors = std::array::from_fn(|i| (selector_bits >> (i * 2)) & 0b11);
        let buttons = std::array::from_fn(|i| switches & (1 << i) != 0);
        let encoder_buttons =
            std::array::from_fn(|i| switches & (1 << (i as u8 + ENCODER_BUTTON_SHIFT)) != 0);

        // several contacts closed at once: first in priority order wins
        let joy = scan[JOYSTICK];
        let joystick = if joy & JOY_UP != 0 {
            Direction::Up
        } else if joy & JOY_DOWN != 0 {
            Direction::Down
        } else if joy & JOY_LEFT != 0 {
            Direction::Left
        } else if joy & JOY_RIGHT != 0 {
            Direction::Right
        } else {
            Direction::Centered
        };

        Self {
            toggles: scan[TOGGLES],
            selectors,
            buttons,
            encoder_buttons,
            joystick,
            joystick_button: switches & (1 << JOYSTICK_BUTTON_BIT) != 0,
        }
    }

    /// Inverse of [`RawPanel::from_key_scan`], used to script mock chips
    pub fn to_key_scan(&self) -> KeyScan {
        let mut scan = [0u8; KEY_SCAN_BYTES];
        scan[TOGGLES] = self.toggles;
        for (i, value) in self.selectors.iter().enumerate() {
            scan[SELECTORS] |= (value & 0b11) << (i * 2);
        }
        for (i, &pressed) in self.buttons.iter().enumerate() {
            if pressed {
                scan[SWITCHES] |= 1 << i;
            }
        }
        for (i, &pressed) in self.encoder_buttons.iter().enumerate() {
            if pressed {
                scan[SWITCHES] |= 1 << (i as u8 + ENCODER_BUTTON_SHIFT);
            }
        }
        if self.joystick_button {
            scan[SWITCHES] |= 1 << JOYSTICK_BUTTON_BIT;
        }
        scan[JOYSTICK] = match self.joystick {
            Direction::Up => JOY_UP,
            Direction::Down => JOY_DOWN,
            Direction::Left => JOY_LEFT,
            Direction::Right => JOY_RIGHT,
            Direction::Centered => 0,
        };
        scan
    }
}
