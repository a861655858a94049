/*
 *  error.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Hardware error types shared by the input and display subsystems
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

/// Failure talking to a physical device (chip bus or GPIO lines).
///
/// Every variant is treated as transient by the runtime: it is logged,
/// the affected operation is skipped and retried on the next tick.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// Opening a bus or line handle failed
    #[error("device unavailable: {0}")]
    Unavailable(String),

    /// I2C transfer error
    #[error("I2C error at 0x{address:02X}: {message}")]
    I2c { address: u8, message: String },

    /// GPIO line error
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Raised by the mock devices when a failure is requested
    #[error("simulated failure: {0}")]
    Simulated(&'static str),
}

impl HardwareError {
    pub fn i2c<E: core::fmt::Debug>(address: u8, err: E) -> Self {
        HardwareError::I2c {
            address,
            message: format!("{:?}", err),
        }
    }
}

#[cfg(feature = "gpio")]
impl From<rppal::gpio::Error> for HardwareError {
    fn from(err: rppal::gpio::Error) -> Self {
        HardwareError::Gpio(err.to_string())
    }
}
