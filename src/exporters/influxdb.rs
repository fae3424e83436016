use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::Sink;
use crate::config::InfluxConfig;

/// Writes readings to the InfluxDB v2 write API, one request per call.
pub struct InfluxSink {
    client: Client,
    config: InfluxConfig,
}

impl InfluxSink {
    pub fn new(client: Client, config: InfluxConfig) -> Self {
        InfluxSink { client, config }
    }
}

/// Formats one point in InfluxDB line protocol. Tags are sorted by key so
/// output is stable for identical input.
fn format_line(measurement: &str, tags: &[(&str, &str)], fields: &[(&str, f64)]) -> String {
    let mut tags = tags.to_vec();
    tags.sort_by(|a, b| a.0.cmp(b.0));
    let tags_str = tags
        .iter()
        .map(|(k, v)| format!(",{}={}", k, v))
        .collect::<String>();

    let fields_str = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");

    format!("{measurement}{tags_str} {fields_str}")
}

#[async_trait]
impl Sink for InfluxSink {
    async fn write(
        &self,
        measurement: &str,
        tags: &[(&str, &str)],
        fields: &[(&str, f64)],
    ) -> Result<()> {
        let url = format!("{}/api/v2/write", self.config.url);
        let line = format_line(measurement, tags, fields);

        let mut request_builder = self
            .client
            .post(&url)
            .query(&[
                ("org", &self.config.org),
                ("bucket", &self.config.bucket),
                ("precision", &Some("s".to_string())),
            ])
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line);

        if let Some(token) = &self.config.token {
            if !token.is_empty() {
                request_builder =
                    request_builder.header("Authorization", format!("Token {}", token));
            }
        }

        request_builder.send().await?.error_for_status()?;

        Ok(())
    }
}
