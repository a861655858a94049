/*
 *  app.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Contract between the runtime and the game or demo it hosts
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

use crate::display::{DisplaySurface, SurfaceSlot};
use crate::input::ControlPanel;

/// The model: whatever state the hosted game keeps.
pub trait Application: Send {
    /// Advance game logic by one tick. Runs after the panel listener.
    fn update(&mut self, _tick: u64) {}

    /// Desired tempo for tempo-driven scheduling. `None` keeps the
    /// current period.
    fn tempo_bpm(&self) -> Option<u32> {
        None
    }
}

/// Maps the model to the four physical surfaces. Queried exactly once
/// per surface per tick, in slot order.
pub trait DisplayStrategy<M>: Send {
    fn green(&self, model: &M) -> DisplaySurface;
    fn blue(&self, model: &M) -> DisplaySurface;
    fn red(&self, model: &M) -> DisplaySurface;
    /// Must be an integer surface
    fn leds(&self, model: &M) -> DisplaySurface;

    fn surface(&self, slot: SurfaceSlot, model: &M) -> DisplaySurface {
        match slot {
            SurfaceSlot::Green => self.green(model),
            SurfaceSlot::Blue => self.blue(model),
            SurfaceSlot::Red => self.red(model),
            SurfaceSlot::Leds => self.leds(model),
        }
    }
}

/// Returned by the listener. A new strategy renders this tick's commit;
/// a new listener first runs on the next tick.
pub enum Transition<M> {
    Stay,
    Listener(Box<dyn PanelListener<M>>),
    Strategy(Box<dyn DisplayStrategy<M>>),
    Both(Box<dyn PanelListener<M>>, Box<dyn DisplayStrategy<M>>),
}

/// Reacts to the freshly scanned panel, mutating the model.
pub trait PanelListener<M>: Send {
    fn on_panel(&mut self, panel: &ControlPanel, model: &mut M) -> Transition<M>;
}

impl<M, F> PanelListener<M> for F
where
    F: FnMut(&ControlPanel, &mut M) + Send,
{
    fn on_panel(&mut self, panel: &ControlPanel, model: &mut M) -> Transition<M> {
        self(panel, model);
        Transition::Stay
    }
}
