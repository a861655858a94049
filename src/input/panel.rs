/*
 *  input/panel.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Control panel state model - edge-aware buttons, selectors, toggles,
 *  joystick and rotary encoders updated once per scan cycle
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

use std::sync::Arc;

use log::{debug, warn};

use super::channel::{Drained, EncoderBank};
use super::keyscan::{KeyScan, RawPanel};
use super::quadrature::RotaryDecoder;
use super::{BUTTON_COUNT, ENCODER_COUNT, SELECTOR_COUNT};
use crate::error::HardwareError;

/// Scan failures between two repeated warnings
const READ_FAILURE_LOG_EVERY: u64 = 100;

#[inline]
fn advance(ticks: u32, changed: bool) -> u32 {
    if changed { 0 } else { ticks.saturating_add(1) }
}

/// Joystick position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Centered,
    Up,
    Down,
    Left,
    Right,
}

/// Momentary push button.
///
/// `ticks_in_state == 0` means the state changed on this scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Button {
    pub previous_state: bool,
    pub current_state: bool,
    pub ticks_in_state: u32,
}

impl Button {
    pub fn new(pressed: bool) -> Self {
        Self {
            previous_state: pressed,
            current_state: pressed,
            ticks_in_state: 0,
        }
    }

    pub fn update(&mut self, pressed: bool) {
        self.ticks_in_state = advance(self.ticks_in_state, pressed != self.current_state);
        self.previous_state = self.current_state;
        self.current_state = pressed;
    }

    pub fn is_pressed(&self) -> bool {
        self.current_state
    }

    /// Pressed on this very cycle
    pub fn just_pressed(&self) -> bool {
        self.current_state && self.ticks_in_state == 0
    }

    /// Released on this very cycle
    pub fn just_released(&self) -> bool {
        !self.current_state && self.ticks_in_state == 0
    }
}

/// Four position rotary selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selector {
    pub value: u8,
    pub previous_value: u8,
    pub ticks_in_state: u32,
}

impl Selector {
    pub fn new(value: u8) -> Self {
        let value = value & 0b11;
        Self {
            value,
            previous_value: value,
            ticks_in_state: 0,
        }
    }

    pub fn update(&mut self, value: u8) {
        let value = value & 0b11;
        self.ticks_in_state = advance(self.ticks_in_state, value != self.value);
        self.previous_value = self.value;
        self.value = value;
    }

    pub fn just_changed(&self) -> bool {
        self.ticks_in_state == 0
    }
}

/// Bank of eight latching toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toggles {
    pub state: u8,
    pub previous_state: u8,
    pub changed_mask: u8,
}

impl Toggles {
    pub fn new(state: u8) -> Self {
        Self {
            state,
            previous_state: state,
            changed_mask: 0,
        }
    }

    pub fn update(&mut self, state: u8) {
        self.previous_state = self.state;
        self.state = state;
        self.changed_mask = self.state ^ self.previous_state;
    }

    pub fn is_on(&self, index: u8) -> bool {
        index < 8 && self.state & (1 << index) != 0
    }

    pub fn switched_on(&self, index: u8) -> bool {
        self.is_on(index) && self.changed_mask & (1 << index) != 0
    }

    pub fn switched_off(&self, index: u8) -> bool {
        index < 8 && !self.is_on(index) && self.changed_mask & (1 << index) != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Joystick {
    pub direction: Direction,
    pub previous_direction: Direction,
    pub ticks_in_state: u32,
    pub button: Button,
}

impl Joystick {
    pub fn new(direction: Direction, pressed: bool) -> Self {
        Self {
            direction,
            previous_direction: direction,
            ticks_in_state: 0,
            button: Button::new(pressed),
        }
    }

    pub fn update(&mut self, direction: Direction, pressed: bool) {
        self.ticks_in_state = advance(self.ticks_in_state, direction != self.direction);
        self.previous_direction = self.direction;
        self.direction = direction;
        self.button.update(pressed);
    }

    /// Pushed into a new direction on this cycle
    pub fn just_moved(&self) -> bool {
        self.ticks_in_state == 0 && self.direction != Direction::Centered
    }
}

/// One rotary encoder as seen by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotaryEncoderState {
    /// Detents turned during this scan cycle, clockwise positive
    pub delta: i32,
    /// Running sum of every delta since startup
    pub position: i64,
    pub button: Button,
    decoder: RotaryDecoder,
}

impl RotaryEncoderState {
    pub fn new(pressed: bool) -> Self {
        Self {
            button: Button::new(pressed),
            ..Default::default()
        }
    }

    pub fn ignore_pending(&self) -> bool {
        self.decoder.ignore_pending()
    }

    /// Decode a drained channel batch into this cycle's delta
    pub fn apply(&mut self, drained: &Drained) {
        self.delta = self.decoder.accumulate(&drained.pairs);
        self.position = self.position.saturating_add(self.delta as i64);
    }
}

/// Snapshot of every control on the cabinet.
///
/// Rebuilt in place once per scan cycle and handed out read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlPanel {
    pub selectors: [Selector; SELECTOR_COUNT],
    pub buttons: [Button; BUTTON_COUNT],
    pub encoders: [RotaryEncoderState; ENCODER_COUNT],
    pub joystick: Joystick,
    pub toggles: Toggles,
}

impl ControlPanel {
    /// Panel matching the physical switch positions. Counts as the first
    /// scan cycle, so every control starts at `ticks_in_state == 0`.
    pub fn from_raw(raw: &RawPanel) -> Self {
        Self {
            selectors: raw.selectors.map(Selector::new),
            buttons: raw.buttons.map(Button::new),
            encoders: raw.encoder_buttons.map(RotaryEncoderState::new),
            joystick: Joystick::new(raw.joystick, raw.joystick_button),
            toggles: Toggles::new(raw.toggles),
        }
    }

    /// Apply the switch part of one scan cycle
    pub fn apply_raw(&mut self, raw: &RawPanel) {
        for (selector, &value) in self.selectors.iter_mut().zip(&raw.selectors) {
            selector.update(value);
        }
        for (button, &pressed) in self.buttons.iter_mut().zip(&raw.buttons) {
            button.update(pressed);
        }
        for (encoder, &pressed) in self.encoders.iter_mut().zip(&raw.encoder_buttons) {
            encoder.button.update(pressed);
        }
        self.joystick.update(raw.joystick, raw.joystick_button);
        self.toggles.update(raw.toggles);
    }
}

/// Drives the [`ControlPanel`] from key-scan reads and the encoder channels.
pub struct PanelScanner {
    panel: ControlPanel,
    encoders: Arc<EncoderBank>,
    last_raw: RawPanel,
    cycles: u64,
    read_failures: u64,
}

impl PanelScanner {
    /// `initial` is the startup chip read. Without one the panel starts
    /// from all controls released.
    pub fn new(encoders: Arc<EncoderBank>, initial: Option<KeyScan>) -> Self {
        let last_raw = initial
            .as_ref()
            .map(RawPanel::from_key_scan)
            .unwrap_or_default();
        Self {
            panel: ControlPanel::from_raw(&last_raw),
            encoders,
            last_raw,
            cycles: 0,
            read_failures: 0,
        }
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn read_failures(&self) -> u64 {
        self.read_failures
    }

    /// Run one scan cycle. A failed read is retried next cycle; this cycle
    /// reuses the last good snapshot so the tick counters keep running.
    pub fn scan(&mut self, read: Result<KeyScan, HardwareError>) -> &ControlPanel {
        match read {
            Ok(scan) => self.last_raw = RawPanel::from_key_scan(&scan),
            Err(e) => {
                self.read_failures += 1;
                if self.read_failures == 1 || self.read_failures % READ_FAILURE_LOG_EVERY == 0 {
                    warn!("Key scan read failed ({} so far): {}", self.read_failures, e);
                }
            }
        }
        let raw = self.last_raw;
        self.panel.apply_raw(&raw);

        for (index, (state, channel)) in self
            .panel
            .encoders
            .iter_mut()
            .zip(self.encoders.channels())
            .enumerate()
        {
            let drained = channel.drain_and_reset();
            if drained.dropped > 0 {
                debug!("Encoder {} lost {} transitions since last scan", index, drained.dropped);
            }
            state.apply(&drained);
        }

        self.cycles += 1;
        &self.panel
    }
}
