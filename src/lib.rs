/*
 *  lib.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Control panel and multiplexed display runtime
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

pub mod error;
pub mod config;
pub mod input;
pub mod display;
pub mod app;
pub mod pacer;
pub mod func_timer;
pub mod scheduler;
pub mod panel_test;

pub use app::{Application, DisplayStrategy, PanelListener, Transition};
pub use error::HardwareError;
pub use pacer::{Pacer, TickMode};
pub use scheduler::{Runtime, TickReport};
