//! Ambient light detector.
//!
//! A reading consists of several samples of both photodiodes. The infrared
//! count is subtracted from the broadband count to approximate visible light,
//! and the mean of all samples is compared against a fixed threshold.
use std::path::PathBuf;

use embedded_hal::blocking::{
    delay::DelayMs,
    i2c::{Write, WriteRead},
};
use linux_embedded_hal::{Delay, I2cdev};
use log::{debug, info, warn};

use crate::{
    config::Config,
    errors::{Error, Result},
    tsl2561::{self, Channel, GainSetting, RawChannelPair, Tsl2561},
};

/// Number of channel pairs averaged into one value
pub const SAMPLE_COUNT: u16 = 5;

/// Settle time after writing the power-on command
pub const POWER_ON_SETTLE_MS: u16 = 10;
/// Settle time after configuring gain and integration time
pub const TIMING_SETTLE_MS: u16 = 20;
/// Pause between reading channel 0 and channel 1
pub const CHANNEL_SETTLE_MS: u16 = 10;
/// Settle time after writing the power-off command
pub const POWER_OFF_SETTLE_MS: u16 = 10;

/// Visible light estimate of a single channel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightSample(u16);

impl LightSample {
    pub fn intensity(self) -> u16 {
        self.0
    }
}

impl From<RawChannelPair> for LightSample {
    /// Infrared counts exceeding broadband counts clamp to zero.
    fn from(pair: RawChannelPair) -> Self {
        if pair.infrared > pair.broadband {
            debug!(
                "Infrared count {} exceeds broadband count {}, clamping to 0",
                pair.infrared, pair.broadband
            );
        }
        Self(pair.broadband.saturating_sub(pair.infrared))
    }
}

/// Mean intensity of all samples, truncated. Zero if there are no samples.
pub fn average_intensity(samples: &[LightSample]) -> u32 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u32 = samples.iter().map(|s| u32::from(s.intensity())).sum();
    sum / samples.len() as u32
}

pub struct AmbientLight {
    /// Intensity values at or above this value are considered "lit"
    threshold: u32,
}

impl AmbientLight {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn classify(&self, intensity: u32) -> Brightness {
        Brightness {
            intensity,
            is_lit: intensity >= self.threshold,
        }
    }
}

pub struct Brightness {
    /// Averaged visible light intensity
    pub intensity: u32,
    /// Whether the threshold was reached
    is_lit: bool,
}

impl Brightness {
    pub fn is_lit(&self) -> bool {
        self.is_lit
    }

    pub fn is_unlit(&self) -> bool {
        !self.is_lit
    }
}

/// Power up the sensor, take [`SAMPLE_COUNT`] samples and return their
/// average intensity.
///
/// The sensor is powered off again afterwards, also when sampling failed.
pub fn measure<I2C, E, D>(
    sensor: &mut Tsl2561<I2C>,
    delay: &mut D,
    gain: GainSetting,
) -> std::result::Result<u32, tsl2561::Error<E>>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: std::fmt::Debug,
    D: DelayMs<u16>,
{
    let sampled = sample(sensor, delay, gain);

    let powered_off = sensor.power_off();
    delay.delay_ms(POWER_OFF_SETTLE_MS);

    match (sampled, powered_off) {
        (Ok(samples), Ok(())) => Ok(average_intensity(&samples)),
        (Err(e), off) => {
            if let Err(off_err) = off {
                warn!("Could not power off sensor: {}", off_err);
            }
            Err(e)
        }
        (Ok(_), Err(e)) => Err(e),
    }
}

fn sample<I2C, E, D>(
    sensor: &mut Tsl2561<I2C>,
    delay: &mut D,
    gain: GainSetting,
) -> std::result::Result<Vec<LightSample>, tsl2561::Error<E>>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u16>,
{
    sensor.power_on()?;
    delay.delay_ms(POWER_ON_SETTLE_MS);

    sensor.set_timing(gain)?;
    delay.delay_ms(TIMING_SETTLE_MS);

    let mut samples = Vec::with_capacity(usize::from(SAMPLE_COUNT));
    for _ in 0..SAMPLE_COUNT {
        let broadband = sensor.read_channel(Channel::Broadband)?;
        delay.delay_ms(CHANNEL_SETTLE_MS);
        let infrared = sensor.read_channel(Channel::Infrared)?;
        samples.push(LightSample::from(RawChannelPair {
            broadband,
            infrared,
        }));
    }
    Ok(samples)
}

/// Source of the binary lit/unlit state, queried once per cycle.
pub trait LightProbe {
    fn read_light_state(&mut self) -> Result<bool>;
}

/// Reads a TSL2561 attached to a Linux I2C character device.
///
/// The device is opened and closed again for every reading, so no handle is
/// held while the monitor sleeps.
pub struct I2cLightProbe {
    device: PathBuf,
    address: u8,
    gain: GainSetting,
    ambient_light: AmbientLight,
}

impl I2cLightProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            device: config.sensor.device.clone(),
            address: config.sensor.address,
            gain: config.sensor.gain,
            ambient_light: AmbientLight::new(config.sensor.threshold),
        }
    }
}

impl LightProbe for I2cLightProbe {
    fn read_light_state(&mut self) -> Result<bool> {
        let i2c = I2cdev::new(&self.device).map_err(|e| Error::bus_open(&self.device, e))?;
        let mut sensor = Tsl2561::new(i2c, self.address);

        let intensity = measure(&mut sensor, &mut Delay, self.gain)?;
        let brightness = self.ambient_light.classify(intensity);
        info!("Sensor value: {}", brightness.intensity);

        Ok(brightness.is_lit())
    }
}
