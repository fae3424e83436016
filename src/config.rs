use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Address (host or host:port) of the Tasmota device.
    pub device_address: String,
    /// Seconds between polls of the device status endpoint.
    pub poll_interval: u64,
    /// Port the /metrics endpoint listens on.
    pub port: u16,
    /// Label value identifying this station in metrics and sink tags.
    pub sensor_id: String,
    /// Present only when INFLUX_URL is set; the sink is disabled otherwise.
    pub influx: Option<InfluxConfig>,
}

#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub org: Option<String>,
    pub bucket: Option<String>,
    pub token: Option<String>,
}

const DEFAULT_DEVICE_ADDRESS: &str = "172.29.132.114";
const DEFAULT_POLL_INTERVAL: u64 = 60;
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SENSOR_ID: &str = "Tasmota_Station_1";

impl Config {
    /// Reads the full configuration from the process environment.
    ///
    /// Every variable has a default except the InfluxDB group, which is
    /// only consulted when `INFLUX_URL` is set.
    pub fn from_env() -> Result<Self> {
        let influx = env::var("INFLUX_URL").ok().map(|url| InfluxConfig {
            url,
            org: env::var("INFLUX_ORG").ok(),
            bucket: env::var("INFLUX_BUCKET").ok(),
            token: env::var("INFLUX_TOKEN").ok(),
        });

        Ok(Config {
            device_address: env_or("TASMOTA_IP", DEFAULT_DEVICE_ADDRESS),
            poll_interval: env_parse("POLL_INTERVAL", DEFAULT_POLL_INTERVAL)?,
            port: env_parse("PORT", DEFAULT_PORT)?,
            sensor_id: env_or("SENSOR_ID", DEFAULT_SENSOR_ID),
            influx,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(env_or("TASMOTA_EXPORTER_UNSET_VAR", "fallback"), "fallback");
        assert_eq!(env_parse("TASMOTA_EXPORTER_UNSET_VAR", 60u64).unwrap(), 60);
    }

    #[test]
    fn bad_numeric_value_is_an_error() {
        env::set_var("TASMOTA_EXPORTER_BAD_PORT", "not-a-number");
        assert!(env_parse::<u16>("TASMOTA_EXPORTER_BAD_PORT", 5000).is_err());
        env::remove_var("TASMOTA_EXPORTER_BAD_PORT");
    }
}
