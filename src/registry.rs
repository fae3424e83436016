//! Gauge state shared between the poll loop and the /metrics endpoint.
//!
//! One `Family` per metric name, keyed by `sensor_id`, registered once at
//! construction. Writes are last-write-wins and immediately visible to a
//! concurrent render; entries never expire, so a sensor that stops
//! reporting keeps its last known value on the exposition.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tracing::warn;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct SensorLabels {
    sensor_id: String,
}

type SensorGauge = Family<SensorLabels, Gauge<f64, AtomicU64>>;

/// Every gauge this bridge exposes, with its help text.
const GAUGES: &[(&str, &str)] = &[
    ("tasmota_temperature_celsius", "Temperature from BME280"),
    ("tasmota_humidity_percent", "Humidity from BME280"),
    ("tasmota_pressure_hpa", "Pressure from BME280"),
    ("tasmota_pm1_0_ugm3", "PM1.0 mass concentration"),
    ("tasmota_pm2_5_ugm3", "PM2.5 mass concentration"),
    ("tasmota_pm4_0_ugm3", "PM4.0 mass concentration"),
    ("tasmota_pm10_0_ugm3", "PM10.0 mass concentration"),
    ("tasmota_nc0_5_cm3", "Number Concentration 0.5"),
    ("tasmota_nc1_0_cm3", "Number Concentration 1.0"),
];

pub struct MetricRegistry {
    registry: Registry,
    gauges: HashMap<&'static str, SensorGauge>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let mut gauges = HashMap::new();

        for (name, help) in GAUGES {
            let family = SensorGauge::default();
            registry.register(*name, *help, family.clone());
            gauges.insert(*name, family);
        }

        MetricRegistry { registry, gauges }
    }

    /// Overwrites the current value for `(name, sensor_id)`.
    ///
    /// Unknown metric names are dropped with a warning; the set of gauge
    /// names is fixed at construction.
    pub fn set(&self, name: &str, sensor_id: &str, value: f64) {
        match self.gauges.get(name) {
            Some(family) => {
                family
                    .get_or_create(&SensorLabels {
                        sensor_id: sensor_id.to_string(),
                    })
                    .set(value);
            }
            None => warn!("ignoring write to unregistered metric {name}"),
        }
    }

    /// OpenMetrics text exposition of the current state.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}
