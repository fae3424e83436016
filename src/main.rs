mod config;
mod exporters;
mod poller;
mod registry;
mod server;
mod tasmota;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::exporters::influxdb::InfluxSink;
use crate::exporters::Sink;
use crate::poller::Poller;
use crate::registry::MetricRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let config = Config::from_env()?;
    info!(
        "polling {} every {}s as {}",
        config.device_address, config.poll_interval, config.sensor_id
    );

    let registry = Arc::new(MetricRegistry::new());

    let sink: Option<Arc<dyn Sink>> = match &config.influx {
        Some(influx) => {
            info!("forwarding readings to InfluxDB at {}", influx.url);
            Some(Arc::new(InfluxSink::new(Client::new(), influx.clone())))
        }
        None => None,
    };

    let poller = Poller::new(&config.device_address, &config.sensor_id, registry.clone(), sink)?;
    tokio::spawn(poller.run(Duration::from_secs(config.poll_interval)));

    server::serve(config.port, registry).await
}
