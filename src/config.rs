use std::{
    fmt::Display,
    net::{Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

use thiserror::Error;

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1)), 5000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{var} has invalid value {value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Where the LED controller lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub path: String,
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub serial: SerialConfig,
    pub bind_addr: SocketAddr,
    /// Upper bound for a single `/turn_on_led` action.
    pub timeout: Duration,
    /// Program and arguments to launch instead of writing to the serial port directly.
    pub sender_command: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            bind_addr: DEFAULT_BIND_ADDR,
            timeout: DEFAULT_TIMEOUT,
            sender_command: None,
        }
    }
}

impl Config {
    /// Reads `LED_*` variables from the environment, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = lookup("LED_SERIAL_PORT").unwrap_or_else(|| DEFAULT_SERIAL_PORT.to_string());
        let baud_rate = parse_or(&lookup, "LED_BAUD_RATE", DEFAULT_BAUD_RATE)?;
        let bind_addr = parse_or(&lookup, "LED_BIND_ADDR", DEFAULT_BIND_ADDR)?;

        let timeout_secs = parse_or(&lookup, "LED_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs())?;
        if timeout_secs == 0 {
            return Err(ConfigError {
                var: "LED_TIMEOUT_SECS",
                value: timeout_secs.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let sender_command = lookup("LED_SENDER_COMMAND")
            .map(|command| {
                command
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|argv| !argv.is_empty());

        Ok(Self {
            serial: SerialConfig { path, baud_rate },
            bind_addr,
            timeout: Duration::from_secs(timeout_secs),
            sender_command,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError {
            var,
            reason: err.to_string(),
            value,
        }),
    }
}
