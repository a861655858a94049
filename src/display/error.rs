/*
 *  display/error.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
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

use thiserror::Error;

use crate::display::surface::SurfaceSlot;
use crate::error::HardwareError;

/// Unified error type for all display operations
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Bus or chip failure, retried next tick
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// LED bank handed something other than an integer
    #[error("LED bank only shows integers, got {0}")]
    NonIntegerLedSurface(&'static str),

    /// Cell index past the end of the display
    #[error("digit {index} out of range, display has {cells} cells")]
    DigitOutOfRange { index: usize, cells: usize },

    /// More words than the chip's display RAM holds
    #[error("buffer of {actual} words exceeds chip capacity of {capacity}")]
    BufferTooLarge { capacity: usize, actual: usize },

    /// Nothing attached for this surface
    #[error("no chip attached for the {0} surface")]
    NoChip(SurfaceSlot),
}

impl DisplayError {
    /// Protocol misuse is the caller's fault and never worth a retry
    pub fn is_misuse(&self) -> bool {
        !matches!(self, DisplayError::Hardware(_) | DisplayError::NoChip(_))
    }
}
