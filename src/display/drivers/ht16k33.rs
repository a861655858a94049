/*
 *  display/drivers/ht16k33.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  HT16K33 16x8 LED matrix driver with key scan
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

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use log::info;

use crate::display::error::DisplayError;
use crate::display::surface::{BlinkRate, MAX_BRIGHTNESS};
use crate::display::traits::{ChipCapabilities, ChipDriver, DISPLAY_RAM_WORDS};
use crate::error::HardwareError;
use crate::input::{KeyScan, KEY_SCAN_BYTES};

const CMD_OSCILLATOR_ON: u8 = 0x21;
const CMD_DISPLAY_SETUP: u8 = 0x80;
const DISPLAY_ON: u8 = 0x01;
const CMD_DIMMING: u8 = 0xE0;

const ADDR_DISPLAY_RAM: u8 = 0x00;
const ADDR_KEY_RAM: u8 = 0x40;

fn blink_bits(rate: BlinkRate) -> u8 {
    match rate {
        BlinkRate::Off => 0b00,
        BlinkRate::Fast => 0b01,
        BlinkRate::Normal => 0b10,
        BlinkRate::Slow => 0b11,
    }
}

/// One HT16K33 on an I2C bus
pub struct Ht16k33<I2C> {
    i2c: I2C,
    capabilities: ChipCapabilities,
    buffer: [u16; DISPLAY_RAM_WORDS],
}

impl Ht16k33<I2cdev> {
    /// Open the chip on a Linux I2C bus
    ///
    /// # Arguments
    ///
    /// * `bus_path` - Path to I2C device (e.g., "/dev/i2c-1")
    /// * `address` - Chip address, 0x70 to 0x77
    pub fn open(name: &'static str, bus_path: &str, address: u8) -> Result<Self, HardwareError> {
        info!("Opening HT16K33 {} on {} at address 0x{:02X}", name, bus_path, address);
        let i2c = I2cdev::new(bus_path)
            .map_err(|e| HardwareError::Unavailable(format!("failed to open {}: {}", bus_path, e)))?;
        Ok(Self::new(i2c, name, address))
    }
}

impl<I2C: I2c> Ht16k33<I2C> {
    pub fn new(i2c: I2C, name: &'static str, address: u8) -> Self {
        Self {
            i2c,
            capabilities: ChipCapabilities {
                name,
                address,
                buffer_words: DISPLAY_RAM_WORDS,
                max_brightness: MAX_BRIGHTNESS,
                has_key_scan: true,
            },
            buffer: [0; DISPLAY_RAM_WORDS],
        }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn command(&mut self, command: u8) -> Result<(), HardwareError> {
        let address = self.capabilities.address;
        self.i2c
            .write(address, &[command])
            .map_err(|e| HardwareError::i2c(address, e))
    }
}

impl<I2C: I2c + Send> ChipDriver for Ht16k33<I2C> {
    fn capabilities(&self) -> &ChipCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.command(CMD_OSCILLATOR_ON)?;
        self.command(CMD_DISPLAY_SETUP | DISPLAY_ON)?;
        self.command(CMD_DIMMING | MAX_BRIGHTNESS)?;
        self.clear()
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.command(CMD_DIMMING | level.min(MAX_BRIGHTNESS))?;
        Ok(())
    }

    fn set_blink(&mut self, rate: BlinkRate) -> Result<(), DisplayError> {
        self.command(CMD_DISPLAY_SETUP | DISPLAY_ON | (blink_bits(rate) << 1))?;
        Ok(())
    }

    fn write_buffer(&mut self, words: &[u16]) -> Result<(), DisplayError> {
        if words.len() > DISPLAY_RAM_WORDS {
            return Err(DisplayError::BufferTooLarge {
                capacity: DISPLAY_RAM_WORDS,
                actual: words.len(),
            });
        }
        self.buffer[..words.len()].copy_from_slice(words);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let mut frame = [0u8; 1 + DISPLAY_RAM_WORDS * 2];
        frame[0] = ADDR_DISPLAY_RAM;
        for (chunk, word) in frame[1..].chunks_exact_mut(2).zip(self.buffer) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        let address = self.capabilities.address;
        self.i2c
            .write(address, &frame)
            .map_err(|e| HardwareError::i2c(address, e))?;
        Ok(())
    }

    fn read_key_scan(&mut self) -> Result<KeyScan, HardwareError> {
        let address = self.capabilities.address;
        let mut scan = [0u8; KEY_SCAN_BYTES];
        self.i2c
            .write_read(address, &[ADDR_KEY_RAM], &mut scan)
            .map_err(|e| HardwareError::i2c(address, e))?;
        Ok(scan)
    }
}
