//! The recurring poll cycle: fetch device status, decode it, publish.
//!
//! Runs as one background task for the process lifetime. Any failure in a
//! cycle is logged and the loop waits for the next tick; previously
//! published gauge values are never cleared by a failed cycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::exporters::Sink;
use crate::registry::MetricRegistry;
use crate::tasmota::{parse_status, Reading};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a single poll cycle produced no readings.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("device returned HTTP {0}")]
    Status(StatusCode),
    #[error("invalid status payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct Poller {
    client: Client,
    url: String,
    sensor_id: String,
    registry: Arc<MetricRegistry>,
    sink: Option<Arc<dyn Sink>>,
}

impl Poller {
    pub fn new(
        device_address: &str,
        sensor_id: &str,
        registry: Arc<MetricRegistry>,
        sink: Option<Arc<dyn Sink>>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Poller {
            client,
            url: format!("http://{device_address}/cm?cmnd=Status%208"),
            sensor_id: sensor_id.to_string(),
            registry,
            sink,
        })
    }

    /// Polls immediately, then once per `period`, forever. A cycle that
    /// overruns the period delays the next tick instead of bursting.
    /// Ticks are spaced a fixed `period` apart rather than slept
    /// post-cycle, so cycle duration does not stretch the schedule.
    pub async fn run(self, period: Duration) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately, let's consume it
        interval.tick().await;

        loop {
            self.run_cycle().await;
            interval.tick().await;
        }
    }

    async fn run_cycle(&self) {
        debug!("pulling status from {}", self.url);
        match self.fetch_status().await {
            Ok(doc) => {
                let sns = doc.get("StatusSNS").cloned().unwrap_or(Value::Null);
                let readings = parse_status(&sns);
                let count = readings.len();
                self.publish(&readings).await;
                info!(readings = count, "metrics updated");
            }
            Err(e) => error!("poll failed: {e}"),
        }
    }

    async fn fetch_status(&self) -> Result<Value, PollError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Applies all gauge updates before issuing any sink write. Sink
    /// results are checked and discarded here; a failing store must not
    /// interrupt the cycle.
    async fn publish(&self, readings: &[Reading]) {
        for reading in readings {
            for (name, value) in reading.gauges() {
                self.registry.set(name, &self.sensor_id, value);
            }
        }

        let Some(sink) = &self.sink else { return };
        for reading in readings {
            let tags = [("sensor", self.sensor_id.as_str())];
            let result = sink
                .write(reading.measurement(), &tags, &reading.fields())
                .await;
            if let Err(e) = result {
                warn!("time-series write failed: {e}");
            }
        }
    }
}
