/*
 *  display/render.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Surface value to segment mask rendering
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

use std::fmt::Write;

use arrayvec::ArrayString;

use crate::display::error::DisplayError;
use crate::display::font::{self, BLANK, INTEGER_TABLE, MINUS};
use crate::display::surface::{CELLS, Segments, SurfaceValue};

/// Rows of the LED bank chip: red, blue, green
pub const LED_BANKS: usize = 3;

pub type LedWords = [u16; LED_BANKS];

/// How an integer reaches the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerPath {
    /// 0..=255 straight from the precomputed table
    Table,
    /// -255..=-1, table digits with a minus in front
    SignedTable,
    /// Everything else, formatted as text
    Formatted,
}

pub fn integer_path(value: i32) -> IntegerPath {
    match value {
        0..=255 => IntegerPath::Table,
        -255..=-1 => IntegerPath::SignedTable,
        _ => IntegerPath::Formatted,
    }
}

pub fn render_integer(value: i32) -> Segments {
    match integer_path(value) {
        IntegerPath::Table => INTEGER_TABLE[value as usize],
        IntegerPath::SignedTable => {
            let mut cells = INTEGER_TABLE[value.unsigned_abs() as usize];
            // at most three digits, so there is always a blank to the left
            if let Some(lead) = cells.iter().position(|&c| c != BLANK) {
                if lead > 0 {
                    cells[lead - 1] = MINUS;
                }
            }
            cells
        }
        IntegerPath::Formatted => {
            let mut text = ArrayString::<16>::new();
            // i32 never exceeds 11 characters
            let _ = write!(text, "{:>width$}", value, width = CELLS);
            render_text(&text)
        }
    }
}

/// Left aligned, blank padded, truncated to the cell count
pub fn render_text(text: &str) -> Segments {
    let mut cells = [BLANK; CELLS];
    for (cell, c) in cells.iter_mut().zip(text.chars()) {
        *cell = font::glyph(c);
    }
    cells
}

pub fn render_alpha(value: &SurfaceValue) -> Segments {
    match value {
        SurfaceValue::Integer(n) => render_integer(*n),
        SurfaceValue::Text(text) => render_text(text),
        SurfaceValue::RawSegments(segments) => *segments,
        SurfaceValue::Blank => [BLANK; CELLS],
    }
}

/// Low byte lights the red row, middle the blue row, high the green row.
pub fn render_leds(value: &SurfaceValue) -> Result<LedWords, DisplayError> {
    match value {
        SurfaceValue::Integer(n) => {
            let bits = *n as u32;
            Ok([
                (bits & 0xFF) as u16,
                ((bits >> 8) & 0xFF) as u16,
                ((bits >> 16) & 0xFF) as u16,
            ])
        }
        SurfaceValue::Blank => Ok([0; LED_BANKS]),
        other => Err(DisplayError::NonIntegerLedSurface(other.kind())),
    }
}
