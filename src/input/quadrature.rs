/*
 *  input/quadrature.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Gray-code quadrature decoding with detent debounce
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

/// Two sampled encoder lines packed as `(a << 1) | b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitPair(u8);

impl BitPair {
    pub const fn new(a: bool, b: bool) -> Self {
        BitPair(((a as u8) << 1) | b as u8)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn a(self) -> bool {
        self.0 & 0b10 != 0
    }

    pub const fn b(self) -> bool {
        self.0 & 0b01 != 0
    }
}

/// Step table indexed by `(prev << 2) | cur`.
///
/// Clockwise is 00 -> 01 -> 11 -> 10 -> 00.
const TRANSITIONS: [i8; 16] = [
    0,  // 00 -> 00
    1,  // 00 -> 01
    -1, // 00 -> 10
    0,  // 00 -> 11
    -1, // 01 -> 00
    0,  // 01 -> 01
    0,  // 01 -> 10
    1,  // 01 -> 11
    1,  // 10 -> 00
    0,  // 10 -> 01
    0,  // 10 -> 10
    -1, // 10 -> 11
    0,  // 11 -> 00
    -1, // 11 -> 01
    1,  // 11 -> 10
    0,  // 11 -> 11
];

/// Transitions swallowed after a counted step: the remainder of one detent.
/// A detent is four transitions, so swallowing only one would count two
/// steps per full cycle instead of one.
pub const SUPPRESSED_AFTER_STEP: u8 = 3;

/// Raw table lookup, no debounce.
#[inline]
pub fn decode(prev: BitPair, cur: BitPair) -> i8 {
    TRANSITIONS[((prev.bits() << 2) | cur.bits()) as usize]
}

/// Per-encoder debounce state wrapped around [`decode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotaryDecoder {
    ignore: u8,
}

impl RotaryDecoder {
    pub const fn new() -> Self {
        Self { ignore: 0 }
    }

    /// True while transitions are still being swallowed after a step.
    pub fn ignore_pending(&self) -> bool {
        self.ignore > 0
    }

    /// Decode one transition. Identical pairs are not transitions and
    /// leave the debounce state alone.
    pub fn step(&mut self, prev: BitPair, cur: BitPair) -> i8 {
        if prev == cur {
            return 0;
        }
        if self.ignore > 0 {
            self.ignore -= 1;
            return 0;
        }
        let delta = decode(prev, cur);
        if delta != 0 {
            self.ignore = SUPPRESSED_AFTER_STEP;
        }
        delta
    }

    /// Sum the steps across a drained sequence (seed first).
    pub fn accumulate(&mut self, pairs: &[BitPair]) -> i32 {
        pairs
            .windows(2)
            .map(|w| self.step(w[0], w[1]) as i32)
            .sum()
    }
}
