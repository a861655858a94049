/*
 *  input/mod.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Control panel input subsystem - encoder acquisition and scan cycle
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

pub mod quadrature;
pub mod channel;
pub mod lines;
pub mod poller;
pub mod keyscan;
pub mod panel;

/// Rotary encoders on the panel
pub const ENCODER_COUNT: usize = 3;
/// Plain push buttons
pub const BUTTON_COUNT: usize = 3;
/// Four position selectors
pub const SELECTOR_COUNT: usize = 3;

// Re-exports for convenience
pub use quadrature::{BitPair, RotaryDecoder, decode};
pub use channel::{Drained, EncoderBank, EncoderChannel, PushOutcome};
pub use lines::{BoxedLines, EncoderLines, Levels, ScriptedLines};
#[cfg(feature = "gpio")]
pub use lines::GpioLines;
pub use poller::{InputPoller, PollSummary, DEFAULT_POLL_INTERVAL};
pub use keyscan::{KeyScan, RawPanel, KEY_SCAN_BYTES};
pub use panel::{Button, ControlPanel, Direction, Joystick, PanelScanner, RotaryEncoderState, Selector, Toggles};
