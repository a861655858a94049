/*
 *  display/factory.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Builds display chips and the display manager from configuration
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

use log::{error, info, warn};

use crate::config::Config;
use crate::display::drivers::ht16k33::Ht16k33;
use crate::display::drivers::mock::MockChip;
use crate::display::manager::DisplayManager;
use crate::display::surface::SurfaceSlot;
use crate::display::traits::BoxedChip;
use crate::error::HardwareError;

/// Factory for creating display chips from configuration
pub struct ChipFactory;

impl ChipFactory {
    /// Create the chip driving `slot`
    ///
    /// Emulated runs get a [`MockChip`]; otherwise an HT16K33 is opened on
    /// the configured bus at the slot's address.
    pub fn create(slot: SurfaceSlot, config: &Config) -> Result<BoxedChip, HardwareError> {
        let address = config.address(slot);
        if config.is_emulated() {
            info!("Emulation mode enabled - mock chip for {} at 0x{:02X}", slot, address);
            return Ok(Box::new(MockChip::new(slot.name(), address)));
        }
        Ok(Box::new(Ht16k33::open(slot.name(), config.bus_path(), address)?))
    }

    /// Build a manager with every surface that could be opened. Missing
    /// chips are logged and left out; the rest of the cabinet still runs.
    pub fn build_manager(config: &Config) -> DisplayManager {
        let mut manager = DisplayManager::new(config.scan_slot());
        for slot in SurfaceSlot::ALL {
            match Self::create(slot, config) {
                Ok(chip) => {
                    if let Err(e) = manager.attach(slot, chip) {
                        warn!("{} display failed to initialise, will retry: {}", slot, e);
                    }
                }
                Err(e) => error!("{} display unavailable: {}", slot, e),
            }
        }
        if !manager.is_attached(manager.scan_slot()) {
            error!("No {} chip, panel switches will read as released", manager.scan_slot());
        }
        manager
    }
}
