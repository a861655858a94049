/*
 *  display/mod.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - segment displays and LED bank on HT16K33 chips
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod factory;

// Display chip drivers
pub mod drivers;

// Surfaces and rendering
pub mod surface;
pub mod font;
pub mod render;
pub mod animators;

// Register mirror and display manager
pub mod mirror;
pub mod manager;

// Re-exports for convenience
pub use traits::{BoxedChip, ChipCapabilities, ChipDriver, DISPLAY_RAM_WORDS};
pub use error::DisplayError;
pub use factory::ChipFactory;
pub use surface::{
    Animator, BlinkRate, CELLS, DisplaySurface, MAX_BRIGHTNESS, SegmentFrame, Segments, SurfaceSlot,
    SurfaceValue,
};
pub use render::{IntegerPath, integer_path};
pub use animators::{ScrollMode, flash, scroll_text};
pub use mirror::ChipMirror;
pub use manager::{CommitReport, DisplayManager};
pub use drivers::ht16k33::Ht16k33;
pub use drivers::mock::{MockChip, MockChipState};
