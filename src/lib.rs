//! Ambient light monitoring with a TSL2561 on a Linux I2C bus.
//!
//! The binary either reads the sensor once and prints the result, or polls it
//! forever and calls notification URLs when the light turns on or off.

pub mod ambient_light;
pub mod clock;
pub mod config;
pub mod errors;
pub mod notifier;
pub mod states;
pub mod tsl2561;

#[cfg(test)]
mod testing;
