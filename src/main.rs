use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use log::info;

use pi_light_sensor::{
    ambient_light::I2cLightProbe,
    clock::SystemClock,
    config::{Config, RawConfig, RawMonitor, RawNotify, RawSensor},
    notifier::HttpTransport,
    states::{read_once, Monitor},
};

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Path to an optional config file. Command line arguments take precedence,
    /// except that --verbose and --continuous can only switch a setting on
    #[arg(long, env = "PI_LIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Add verbosity to command
    #[arg(short, long, env = "PI_LIGHT_VERBOSE")]
    verbose: bool,

    /// Continuous reading
    #[arg(short, long, env = "PI_LIGHT_CONTINUOUS")]
    continuous: bool,

    /// Gain level 1-6 [default: 1]
    #[arg(short, long, env = "PI_LIGHT_GAIN")]
    gain: Option<u32>,

    /// I2C device [default: /dev/i2c-1]
    #[arg(short, long, env = "PI_LIGHT_DEVICE")]
    device: Option<PathBuf>,

    /// I2C address of the sensor, e.g. 0x39 [default: 0x39]
    #[arg(short, long, env = "PI_LIGHT_ADDRESS", value_parser = parse_address)]
    address: Option<u8>,

    /// Light threshold [default: 100]
    #[arg(short, long, env = "PI_LIGHT_THRESHOLD")]
    threshold: Option<u32>,

    /// URL called once when continuous mode starts
    #[arg(short, long, env = "PI_LIGHT_BOOT_URL")]
    boot_url: Option<String>,

    /// URL called when the light turns on (required in continuous mode)
    #[arg(short, long, env = "PI_LIGHT_NOTIFY_URL")]
    notify_url: Option<String>,

    /// URL called when the light turns off again
    #[arg(short, long, env = "PI_LIGHT_RESOLVED_URL")]
    resolved_url: Option<String>,

    /// The number of minutes to sleep between each check [default: 10]
    #[arg(short = 'z', long, env = "PI_LIGHT_SLEEP_TIME")]
    sleep_time: Option<u64>,

    /// Comma-separated hours at which to get a reminder when light is on [default: 09,12,16]
    #[arg(long, env = "PI_LIGHT_REPORT_HOURS")]
    report_hours: Option<String>,

    /// Timeout for notification requests in seconds [default: 30]
    #[arg(long, env = "PI_LIGHT_HTTP_TIMEOUT")]
    http_timeout: Option<u64>,
}

impl Args {
    /// Values given on the command line, to be layered over the config file.
    fn overrides(&self) -> RawConfig {
        RawConfig {
            verbose: self.verbose.then_some(true),
            sensor: RawSensor {
                device: self.device.clone(),
                address: self.address,
                gain: self.gain,
                threshold: self.threshold,
            },
            notify: RawNotify {
                boot_url: self.boot_url.clone(),
                notify_url: self.notify_url.clone(),
                resolved_url: self.resolved_url.clone(),
                timeout: self.http_timeout,
            },
            monitor: RawMonitor {
                continuous: self.continuous.then_some(true),
                sleep_time: self.sleep_time,
                report_hours: self.report_hours.clone(),
            },
        }
    }
}

fn parse_address(value: &str) -> Result<u8, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid I2C address {:?}: {}", value, e))
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    // Parse config file
    let file_config = match &args.config {
        Some(path) => match RawConfig::load(path) {
            Ok(val) => val,
            Err(e) => {
                println!("Error: Failed to load config: {:#}", e);
                println!();
                if let Ok(example) = toml::to_string(&RawConfig::example()) {
                    println!("Example config:\n\n{}", example);
                }
                return ExitCode::from(2);
            }
        },
        None => RawConfig::default(),
    };

    let config = match Config::try_from(file_config.merge(args.overrides())) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", e);
            return ExitCode::from(2);
        }
    };

    init_logger(config.verbose);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    info!("** Welcome to Pi Light Sensor **");

    let mut probe = I2cLightProbe::new(config);

    if !config.continuous {
        println!("{}", read_once(&mut probe, config.verbose)?);
        return Ok(());
    }

    let transport =
        HttpTransport::new(config.notify.timeout).context("Failed to create HTTP client")?;
    let monitor = Monitor::new(config, probe, transport, SystemClock);
    let never = monitor.run()?;
    match never {}
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pi_light_sensor::tsl2561::GainSetting;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x39"), Ok(0x39));
        assert_eq!(parse_address("0X29"), Ok(0x29));
        assert_eq!(parse_address("73"), Ok(0x49));
        assert!(parse_address("0x1ff").is_err());
        assert!(parse_address("x").is_err());
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "pi-light-sensor",
            "-v",
            "-c",
            "-g",
            "4",
            "-n",
            "http://hub/on",
            "-z",
            "1",
        ])
        .unwrap();
        let config = Config::try_from(args.overrides()).unwrap();

        assert!(config.verbose);
        assert!(config.continuous);
        assert_eq!(config.sensor.gain, GainSetting::HighShort);
        assert_eq!(config.notify.notify_url, "http://hub/on");
        assert_eq!(config.schedule.interval.as_secs(), 60);
    }

    #[test]
    fn test_continuous_without_notify_url() {
        let args = Args::try_parse_from(["pi-light-sensor", "--continuous"]).unwrap();
        assert!(Config::try_from(args.overrides()).is_err());
    }
}
