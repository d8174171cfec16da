use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

/// One indicator reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Per-country, per-year indicator series.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn series(&self, country: &str, indicator: &str, start: i32, end: i32) -> Result<Vec<YearValue>>;
}

/// World Bank indicators API.
pub struct WorldBankDataset {
    client: Client,
    base_url: String,
}

impl WorldBankDataset {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DatasetSource for WorldBankDataset {
    async fn series(&self, country: &str, indicator: &str, start: i32, end: i32) -> Result<Vec<YearValue>> {
        let url = format!(
            "{}/country/{}/indicator/{}?date={}:{}&format=json&per_page=200",
            self.base_url, country, indicator, start, end
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach dataset API for {indicator}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, indicator, body = %error_text, "dataset request failed");
            anyhow::bail!("Dataset API returned {}", status);
        }

        let body = response
            .json::<Value>()
            .await
            .context("Failed to parse dataset response")?;
        let points = parse_indicator_page(body)?;
        debug!(country, indicator, points = points.len(), "indicator series fetched");
        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct Reading {
    date: String,
    value: Option<f64>,
}

/// Reads `[meta, [{date, value}, ..]]`. Years without a value are skipped; an
/// error page (`[{"message": [..]}]`) becomes an error.
pub fn parse_indicator_page(body: Value) -> Result<Vec<YearValue>> {
    let Value::Array(mut parts) = body else {
        anyhow::bail!("unexpected dataset payload");
    };
    if parts.len() < 2 {
        if let Some(message) = parts.first().and_then(|meta| meta.get("message")) {
            anyhow::bail!("dataset API error: {message}");
        }
        return Ok(Vec::new());
    }
    let rows = parts.swap_remove(1);
    if rows.is_null() {
        return Ok(Vec::new());
    }
    let readings: Vec<Reading> = serde_json::from_value(rows).context("Unexpected dataset rows")?;
    Ok(readings
        .into_iter()
        .filter_map(|r| {
            let year = r.date.trim().parse::<i32>().ok()?;
            let value = r.value.filter(|v| v.is_finite())?;
            Some(YearValue { year, value })
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use super::*;

    /// Serves fixed series keyed by indicator code.
    #[derive(Default)]
    pub struct FakeDataset {
        pub series: HashMap<String, Vec<YearValue>>,
        pub fail: bool,
    }

    impl FakeDataset {
        pub fn with(mut self, indicator: &str, points: &[(i32, f64)]) -> Self {
            self.series.insert(
                indicator.to_string(),
                points
                    .iter()
                    .map(|(year, value)| YearValue {
                        year: *year,
                        value: *value,
                    })
                    .collect(),
            );
            self
        }
    }

    #[async_trait]
    impl DatasetSource for FakeDataset {
        async fn series(&self, _country: &str, indicator: &str, start: i32, end: i32) -> Result<Vec<YearValue>> {
            if self.fail {
                anyhow::bail!("timed out");
            }
            Ok(self
                .series
                .get(indicator)
                .map(|points| {
                    points
                        .iter()
                        .filter(|p| (start..=end).contains(&p.year))
                        .copied()
                        .collect()
                })
                .unwrap_or_default())
        }
    }
}
