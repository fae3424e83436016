pub mod influxdb;

use async_trait::async_trait;

/// Best-effort writer of one reading to a time-series store.
///
/// Implementations open a connection per call; the poll loop checks the
/// result, logs failures and discards them, so a broken store never
/// interrupts metric publication.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn write(
        &self,
        measurement: &str,
        tags: &[(&str, &str)],
        fields: &[(&str, f64)],
    ) -> anyhow::Result<()>;
}
