/*
 *  func_timer.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scoped phase timer, logs on drop
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

use std::time::Instant;

use log::trace;

pub struct PhaseTimer {
    name: &'static str,
    tick: u64,
    start: Instant,
}

impl PhaseTimer {
    pub fn new(name: &'static str, tick: u64) -> Self {
        PhaseTimer {
            name,
            tick,
            start: Instant::now(),
        }
    }
}

// Called automatically when the timer goes out of scope.
impl Drop for PhaseTimer {
    fn drop(&mut self) {
        trace!("tick {} {} took {:?}", self.tick, self.name, self.start.elapsed());
    }
}
