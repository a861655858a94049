/*
 *  display/drivers/mock.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock LED driver chip for testing and emulated runs
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

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::display::error::DisplayError;
use crate::display::surface::{BlinkRate, MAX_BRIGHTNESS};
use crate::display::traits::{ChipCapabilities, ChipDriver, DISPLAY_RAM_WORDS};
use crate::error::HardwareError;
use crate::input::{KeyScan, KEY_SCAN_BYTES};

/// Mock chip driver
///
/// Simulates a display chip without a bus. It's used for:
/// - Unit and integration tests
/// - Emulated runs on a development machine
///
/// Every operation is recorded in shared state so tests can count bus
/// traffic and script key-scan contents.
#[derive(Debug, Clone)]
pub struct MockChip {
    capabilities: ChipCapabilities,

    /// Words staged by write_buffer, not yet flushed
    staged: [u16; DISPLAY_RAM_WORDS],

    state: Arc<Mutex<MockChipState>>,
}

/// Internal state for the mock chip (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockChipState {
    pub init_count: usize,
    pub flush_count: usize,
    pub clear_count: usize,
    pub brightness_writes: usize,
    pub blink_writes: usize,
    pub buffer_writes: usize,
    pub key_scan_reads: usize,

    pub last_brightness: Option<u8>,
    pub last_blink: Option<BlinkRate>,

    /// What the LEDs show, updated on flush
    pub shown: [u16; DISPLAY_RAM_WORDS],

    /// Returned by read_key_scan
    pub key_scan: KeyScan,

    pub is_initialized: bool,

    /// Simulate failures (for error testing)
    pub simulate_init_failure: bool,
    pub simulate_config_failure: bool,
    pub simulate_flush_failure: bool,
    pub simulate_scan_failure: bool,
}

impl MockChip {
    pub fn new(name: &'static str, address: u8) -> Self {
        Self {
            capabilities: ChipCapabilities {
                name,
                address,
                buffer_words: DISPLAY_RAM_WORDS,
                max_brightness: MAX_BRIGHTNESS,
                has_key_scan: true,
            },
            staged: [0; DISPLAY_RAM_WORDS],
            state: Arc::new(Mutex::new(MockChipState::default())),
        }
    }

    /// A chip with its key-scan matrix unwired
    pub fn without_key_scan(mut self) -> Self {
        self.capabilities.has_key_scan = false;
        self
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockChipState>> {
        Arc::clone(&self.state)
    }

    pub fn set_key_scan(&self, scan: KeyScan) {
        self.lock().key_scan = scan;
    }

    /// Words currently lit
    pub fn shown(&self) -> [u16; DISPLAY_RAM_WORDS] {
        self.lock().shown
    }

    fn lock(&self) -> MutexGuard<'_, MockChipState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChipDriver for MockChip {
    fn capabilities(&self) -> &ChipCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_init_failure {
            return Err(HardwareError::Simulated("init").into());
        }
        state.init_count += 1;
        state.is_initialized = true;
        state.shown = [0; DISPLAY_RAM_WORDS];
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_config_failure {
            return Err(HardwareError::Simulated("brightness").into());
        }
        state.brightness_writes += 1;
        state.last_brightness = Some(level.min(self.capabilities.max_brightness));
        Ok(())
    }

    fn set_blink(&mut self, rate: BlinkRate) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_config_failure {
            return Err(HardwareError::Simulated("blink").into());
        }
        state.blink_writes += 1;
        state.last_blink = Some(rate);
        Ok(())
    }

    fn write_buffer(&mut self, words: &[u16]) -> Result<(), DisplayError> {
        if words.len() > self.capabilities.buffer_words {
            return Err(DisplayError::BufferTooLarge {
                capacity: self.capabilities.buffer_words,
                actual: words.len(),
            });
        }
        self.staged[..words.len()].copy_from_slice(words);
        self.lock().buffer_writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let staged = self.staged;
        let name = self.capabilities.name;
        let mut state = self.lock();
        if state.simulate_flush_failure {
            return Err(HardwareError::Simulated("flush").into());
        }
        state.flush_count += 1;
        if state.shown != staged {
            debug!("{} now shows {:04x?}", name, &staged[..4]);
            state.shown = staged;
        }
        Ok(())
    }

    fn read_key_scan(&mut self) -> Result<KeyScan, HardwareError> {
        let mut state = self.lock();
        if state.simulate_scan_failure {
            return Err(HardwareError::Simulated("key scan"));
        }
        state.key_scan_reads += 1;
        Ok(state.key_scan)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.lock().clear_count += 1;
        self.write_buffer(&[0; DISPLAY_RAM_WORDS])?;
        self.flush()
    }
}

impl Default for MockChip {
    fn default() -> Self {
        Self::new("mock", 0x70)
    }
}

/// A key scan with every control released
pub const IDLE_KEY_SCAN: KeyScan = [0; KEY_SCAN_BYTES];
