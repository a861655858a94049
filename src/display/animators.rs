/*
 *  display/animators.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Stock surface animators - scrolling marquee and software flash
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

use crate::display::surface::{Animator, CELLS, DisplaySurface, SurfaceValue};

/// Steps held at each end before moving
const PAUSE_STEPS: u64 = 3;

/// Blank cells between the tail and the head of a looping marquee
const LOOP_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Scroll left and wrap around
    Loop,
    /// Bounce back and forth between the ends
    Cylon,
}

/// Scroll text longer than the display one cell every `step_ticks`.
/// Text that fits is left alone.
pub fn scroll_text(mode: ScrollMode, step_ticks: u64) -> Animator {
    let step_ticks = step_ticks.max(1);
    Arc::new(move |surface: DisplaySurface, tick: u64| {
        let text = match &surface.value {
            SurfaceValue::Text(text) if text.chars().count() > CELLS => text.clone(),
            _ => return surface,
        };
        let step = tick / step_ticks;
        let window = match mode {
            ScrollMode::Loop => loop_window(&text, step),
            ScrollMode::Cylon => cylon_window(&text, step),
        };
        DisplaySurface {
            value: SurfaceValue::Text(window),
            ..surface
        }
    })
}

fn loop_window(text: &str, step: u64) -> String {
    let padded: Vec<char> = text.chars().chain(LOOP_GAP.chars()).collect();
    let cycle = PAUSE_STEPS + padded.len() as u64;
    let offset = (step % cycle).saturating_sub(PAUSE_STEPS) as usize;
    padded.iter().cycle().skip(offset).take(CELLS).collect()
}

fn cylon_window(text: &str, step: u64) -> String {
    let chars: Vec<char> = text.chars().collect();
    let travel = (chars.len() - CELLS) as u64;
    let cycle = 2 * (PAUSE_STEPS + travel);
    let p = step % cycle;
    let offset = if p < PAUSE_STEPS {
        0
    } else if p < PAUSE_STEPS + travel {
        p - PAUSE_STEPS + 1
    } else if p < 2 * PAUSE_STEPS + travel {
        travel
    } else {
        travel - (p - 2 * PAUSE_STEPS - travel) - 1
    };
    let offset = offset as usize;
    chars[offset..offset + CELLS].iter().collect()
}

/// Software flash: shown for the first half of each period, blank for
/// the second. Unlike hardware blink this can be phased to game events.
pub fn flash(period_ticks: u64) -> Animator {
    let half = (period_ticks / 2).max(1);
    Arc::new(move |surface: DisplaySurface, tick: u64| {
        if (tick / half) % 2 == 0 {
            return surface;
        }
        DisplaySurface {
            value: SurfaceValue::Blank,
            ..surface
        }
    })
}
