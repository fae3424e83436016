//! Decoding of the Tasmota `Status 8` payload into typed readings.
//!
//! The device reports sensor data under `StatusSNS`, one sub-object per
//! attached sensor module. Parsing is deliberately permissive: a missing
//! or mistyped field becomes `0.0` so that one flaky sensor never blanks
//! out the other sensor's metrics for the cycle.

use serde_json::Value;

/// One decoded sensor group from a single poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Climate(Climate),
    Particulate(Particulate),
}

/// BME280 climate block.
#[derive(Debug, Clone, PartialEq)]
pub struct Climate {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// SPS30 particulate block: mass concentrations (ug/m3) and number
/// concentrations (1/cm3).
#[derive(Debug, Clone, PartialEq)]
pub struct Particulate {
    pub pm1_0: f64,
    pub pm2_5: f64,
    pub pm4_0: f64,
    pub pm10_0: f64,
    pub nc0_5: f64,
    pub nc1_0: f64,
}

impl Reading {
    /// InfluxDB measurement this reading is written to.
    pub fn measurement(&self) -> &'static str {
        match self {
            Reading::Climate(_) => "weather",
            Reading::Particulate(_) => "air_quality",
        }
    }

    /// Gauge updates for this reading, as `(metric name, value)` pairs.
    pub fn gauges(&self) -> Vec<(&'static str, f64)> {
        match self {
            Reading::Climate(c) => vec![
                ("tasmota_temperature_celsius", c.temperature),
                ("tasmota_humidity_percent", c.humidity),
                ("tasmota_pressure_hpa", c.pressure),
            ],
            Reading::Particulate(p) => vec![
                ("tasmota_pm1_0_ugm3", p.pm1_0),
                ("tasmota_pm2_5_ugm3", p.pm2_5),
                ("tasmota_pm4_0_ugm3", p.pm4_0),
                ("tasmota_pm10_0_ugm3", p.pm10_0),
                ("tasmota_nc0_5_cm3", p.nc0_5),
                ("tasmota_nc1_0_cm3", p.nc1_0),
            ],
        }
    }

    /// Line-protocol fields for the sink write.
    pub fn fields(&self) -> Vec<(&'static str, f64)> {
        match self {
            Reading::Climate(c) => vec![
                ("temperature", c.temperature),
                ("humidity", c.humidity),
                ("pressure", c.pressure),
            ],
            Reading::Particulate(p) => vec![
                ("pm1_0", p.pm1_0),
                ("pm2_5", p.pm2_5),
                ("pm4_0", p.pm4_0),
                ("pm10_0", p.pm10_0),
                ("nc0_5", p.nc0_5),
                ("nc1_0", p.nc1_0),
            ],
        }
    }
}

/// Maps a `StatusSNS` object to readings, climate first.
///
/// Unrecognized sub-blocks are skipped; an absent or empty object yields
/// an empty vec rather than an error.
pub fn parse_status(sns: &Value) -> Vec<Reading> {
    let mut readings = Vec::new();

    if let Some(bme280) = sns.get("BME280") {
        readings.push(Reading::Climate(Climate {
            temperature: field(bme280, "Temperature"),
            humidity: field(bme280, "Humidity"),
            pressure: field(bme280, "Pressure"),
        }));
    }

    if let Some(sps30) = sns.get("SPS30") {
        readings.push(Reading::Particulate(Particulate {
            pm1_0: field(sps30, "PM1_0"),
            pm2_5: field(sps30, "PM2_5"),
            pm4_0: field(sps30, "PM4_0"),
            pm10_0: field(sps30, "PM10"),
            nc0_5: field(sps30, "NCPM0_5"),
            nc1_0: field(sps30, "NCPM1_0"),
        }));
    }

    readings
}

fn field(block: &Value, key: &str) -> f64 {
    block.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_status() {
        let sns = json!({
            "BME280": {"Temperature": 21.5, "Humidity": 40, "Pressure": 1012.3},
            "SPS30": {
                "PM1_0": 3.2, "PM2_5": 5.1, "PM4_0": 6.0, "PM10": 7.4,
                "NCPM0_5": 120, "NCPM1_0": 95
            }
        });

        let readings = parse_status(&sns);
        assert_eq!(readings.len(), 2);
        assert_eq!(
            readings[0],
            Reading::Climate(Climate {
                temperature: 21.5,
                humidity: 40.0,
                pressure: 1012.3,
            })
        );
        assert_eq!(
            readings[1],
            Reading::Particulate(Particulate {
                pm1_0: 3.2,
                pm2_5: 5.1,
                pm4_0: 6.0,
                pm10_0: 7.4,
                nc0_5: 120.0,
                nc1_0: 95.0,
            })
        );
    }

    #[test]
    fn test_missing_field_defaults_to_zero() {
        let sns = json!({"BME280": {"Temperature": 18.0, "Pressure": 990.0}});

        let readings = parse_status(&sns);
        assert_eq!(readings.len(), 1);
        match &readings[0] {
            Reading::Climate(c) => {
                assert_eq!(c.temperature, 18.0);
                assert_eq!(c.humidity, 0.0);
                assert_eq!(c.pressure, 990.0);
            }
            other => panic!("expected climate reading, got {other:?}"),
        }
    }

    #[test]
    fn test_mistyped_field_defaults_to_zero() {
        let sns = json!({"BME280": {"Temperature": "warm", "Humidity": null}});

        match &parse_status(&sns)[0] {
            Reading::Climate(c) => {
                assert_eq!(c.temperature, 0.0);
                assert_eq!(c.humidity, 0.0);
            }
            other => panic!("expected climate reading, got {other:?}"),
        }
    }

    #[test]
    fn test_particulate_only_document() {
        let sns = json!({"SPS30": {"PM2_5": 5.1}});

        let readings = parse_status(&sns);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].measurement(), "air_quality");
    }

    #[test]
    fn test_empty_status_yields_no_readings() {
        assert!(parse_status(&json!({})).is_empty());
        assert!(parse_status(&Value::Null).is_empty());
    }

    #[test]
    fn test_unrecognized_blocks_are_ignored() {
        let sns = json!({
            "Time": "2024-01-01T00:00:00",
            "DHT11": {"Temperature": 30.0},
            "SPS30": {"PM1_0": 1.0}
        });

        let readings = parse_status(&sns);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].measurement(), "air_quality");
    }

    #[test]
    fn test_gauge_names_match_exposition() {
        let reading = Reading::Climate(Climate {
            temperature: 1.0,
            humidity: 2.0,
            pressure: 3.0,
        });
        let names: Vec<_> = reading.gauges().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "tasmota_temperature_celsius",
                "tasmota_humidity_percent",
                "tasmota_pressure_hpa",
            ]
        );
    }
}
