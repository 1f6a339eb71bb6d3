use std::{
    collections::BTreeSet,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    tsl2561::{self, GainSetting},
};

pub const DEFAULT_DEVICE: &str = "/dev/i2c-1";
pub const DEFAULT_GAIN_LEVEL: u32 = 1;
pub const DEFAULT_THRESHOLD: u32 = 100;
pub const DEFAULT_SLEEP_MINUTES: u64 = 10;
pub const DEFAULT_REPORT_HOURS: &str = "09,12,16";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration as read from the config file or the command line.
///
/// Every value is optional. Missing values fall back to the defaults when
/// converting into a [`Config`].
#[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawConfig {
    pub verbose: Option<bool>,
    #[serde(default)]
    pub sensor: RawSensor,
    #[serde(default)]
    pub notify: RawNotify,
    #[serde(default)]
    pub monitor: RawMonitor,
}

#[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawSensor {
    /// I2C character device
    pub device: Option<PathBuf>,

    /// I2C slave address
    pub address: Option<u8>,

    /// Gain level 1-6
    pub gain: Option<u32>,

    /// Averaged intensity at which the light is considered on
    pub threshold: Option<u32>,
}

#[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawNotify {
    /// Called once when continuous mode starts
    pub boot_url: Option<String>,

    /// Called when the light turns on, and again at reminder hours
    pub notify_url: Option<String>,

    /// Called when the light turns off after a notification
    pub resolved_url: Option<String>,

    /// Per request timeout in seconds
    pub timeout: Option<u64>,
}

#[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawMonitor {
    /// Keep polling instead of reading once
    pub continuous: Option<bool>,

    /// Minutes to sleep between two readings
    pub sleep_time: Option<u64>,

    /// Comma separated hours at which a reminder is sent while the light is on
    pub report_hours: Option<String>,
}

impl RawConfig {
    /// Parse the config file at the specified path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file at {:?}", path))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file to string")?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn example() -> Self {
        Self {
            verbose: Some(false),
            sensor: RawSensor {
                device: Some(PathBuf::from(DEFAULT_DEVICE)),
                address: Some(tsl2561::DEFAULT_ADDRESS),
                gain: Some(DEFAULT_GAIN_LEVEL),
                threshold: Some(DEFAULT_THRESHOLD),
            },
            notify: RawNotify {
                boot_url: Some("https://server/path/boot".to_string()),
                notify_url: Some("https://server/path/notify".to_string()),
                resolved_url: Some("https://server/path/resolved".to_string()),
                timeout: Some(DEFAULT_HTTP_TIMEOUT_SECS),
            },
            monitor: RawMonitor {
                continuous: Some(true),
                sleep_time: Some(DEFAULT_SLEEP_MINUTES),
                report_hours: Some(DEFAULT_REPORT_HOURS.to_string()),
            },
        }
    }

    /// Combine two configs. Values set in `overrides` win.
    ///
    /// Command line flags only ever produce `Some(true)` for `verbose` and
    /// `continuous`, so they can switch these on but not off.
    pub fn merge(self, overrides: RawConfig) -> Self {
        Self {
            verbose: overrides.verbose.or(self.verbose),
            sensor: RawSensor {
                device: overrides.sensor.device.or(self.sensor.device),
                address: overrides.sensor.address.or(self.sensor.address),
                gain: overrides.sensor.gain.or(self.sensor.gain),
                threshold: overrides.sensor.threshold.or(self.sensor.threshold),
            },
            notify: RawNotify {
                boot_url: overrides.notify.boot_url.or(self.notify.boot_url),
                notify_url: overrides.notify.notify_url.or(self.notify.notify_url),
                resolved_url: overrides.notify.resolved_url.or(self.notify.resolved_url),
                timeout: overrides.notify.timeout.or(self.notify.timeout),
            },
            monitor: RawMonitor {
                continuous: overrides.monitor.continuous.or(self.monitor.continuous),
                sleep_time: overrides.monitor.sleep_time.or(self.monitor.sleep_time),
                report_hours: overrides.monitor.report_hours.or(self.monitor.report_hours),
            },
        }
    }
}

/// Hours of the day in which a lit notification may be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// First hour of the window (inclusive)
    pub start: u32,
    /// End of the window (exclusive)
    pub end: u32,
}

impl ReportWindow {
    pub fn contains(&self, hour: u32) -> bool {
        (self.start..self.end).contains(&hour)
    }
}

impl Default for ReportWindow {
    fn default() -> Self {
        Self { start: 9, end: 22 }
    }
}

/// Hours at which an already sent lit notification is forgotten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderHours(BTreeSet<u32>);

impl ReminderHours {
    pub fn contains(&self, hour: u32) -> bool {
        self.0.contains(&hour)
    }
}

impl FromStr for ReminderHours {
    type Err = Error;

    /// Parse a list like `09,12,16`. An empty string disables reminders.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut hours = BTreeSet::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let hour: u32 = part
                .parse()
                .map_err(|_| Error::config(format!("Invalid report hour {:?}", part)))?;
            if hour > 23 {
                return Err(Error::config(format!(
                    "Report hour {} is out of range 0-23",
                    hour
                )));
            }
            hours.insert(hour);
        }
        Ok(Self(hours))
    }
}

#[derive(Debug)]
pub struct Config {
    pub verbose: bool,
    pub continuous: bool,
    pub sensor: Sensor,
    pub notify: Notify,
    pub schedule: Schedule,
}

#[derive(Debug)]
pub struct Sensor {
    pub device: PathBuf,
    pub address: u8,
    pub gain: GainSetting,
    pub threshold: u32,
}

/// Notification URLs. An empty URL disables that notification.
#[derive(Debug)]
pub struct Notify {
    pub boot_url: String,
    pub notify_url: String,
    pub resolved_url: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct Schedule {
    pub interval: Duration,
    pub reminder_hours: ReminderHours,
    pub report_window: ReportWindow,
}

impl TryFrom<RawConfig> for Config {
    type Error = Error;

    fn try_from(raw_config: RawConfig) -> Result<Self, Self::Error> {
        let RawConfig {
            verbose,
            sensor,
            notify,
            monitor,
        } = raw_config;

        let gain_level = sensor.gain.unwrap_or(DEFAULT_GAIN_LEVEL);
        if gain_level == 0 {
            return Err(Error::config("Gain level must be between 1 and 6"));
        }

        let sleep_time = monitor.sleep_time.unwrap_or(DEFAULT_SLEEP_MINUTES);
        if sleep_time == 0 {
            return Err(Error::config("Sleep time must be at least one minute"));
        }
        let interval = sleep_time
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| Error::config("Sleep time is too large"))?;

        let timeout = notify.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if timeout == 0 {
            return Err(Error::config("HTTP timeout must be at least one second"));
        }

        let continuous = monitor.continuous.unwrap_or(false);
        let notify_url = notify.notify_url.unwrap_or_default();
        if continuous && notify_url.is_empty() {
            return Err(Error::config(
                "The --notify-url parameter must be set in continuous mode",
            ));
        }

        let reminder_hours = monitor
            .report_hours
            .as_deref()
            .unwrap_or(DEFAULT_REPORT_HOURS)
            .parse()?;

        Ok(Config {
            verbose: verbose.unwrap_or(false),
            continuous,
            sensor: Sensor {
                device: sensor.device.unwrap_or_else(|| PathBuf::from(DEFAULT_DEVICE)),
                address: sensor.address.unwrap_or(tsl2561::DEFAULT_ADDRESS),
                gain: GainSetting::from_level(gain_level),
                threshold: sensor.threshold.unwrap_or(DEFAULT_THRESHOLD),
            },
            notify: Notify {
                boot_url: notify.boot_url.unwrap_or_default(),
                notify_url,
                resolved_url: notify.resolved_url.unwrap_or_default(),
                timeout: Duration::from_secs(timeout),
            },
            schedule: Schedule {
                interval,
                reminder_hours,
                report_window: ReportWindow::default(),
            },
        })
    }
}
