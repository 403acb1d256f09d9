//! Maps the day summaries onto the fixed sensor set.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use chrono::{DateTime, Local, NaiveDate};
use itertools::Itertools;
use serde_json::{Map, Value, json};

use crate::core::{aggregate::DaySummary, record::Record};

pub const NO_DATA: &str = "No data available";
pub const NO_ACCEPTED_BIDS: &str = "No accepted bids";

/// The fixed set of published sensors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Metric {
    Status,
    Utilization,
    DeliveryDate,
    TimeWindow,
    Price,
    Volume,
    HighestAccepted,
}

impl Metric {
    pub const ALL: [Self; 7] = [
        Self::Status,
        Self::Utilization,
        Self::DeliveryDate,
        Self::TimeWindow,
        Self::Price,
        Self::Volume,
        Self::HighestAccepted,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Utilization => "utilization",
            Self::DeliveryDate => "delivery_date",
            Self::TimeWindow => "time_window",
            Self::Price => "price",
            Self::Volume => "volume",
            Self::HighestAccepted => "highest_accepted",
        }
    }

    /// Home Assistant entity ID, for example `sensor.dfs_price`.
    #[must_use]
    pub fn entity_id(self, prefix: &str) -> String {
        format!("sensor.{prefix}_{}", self.as_str())
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor state: numeric when the reading is a measurement, text when it is a status
/// placeholder. Consumers match on the variant, there is no implicit coercion.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Display for MetricValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => Display::fmt(value, f),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One sensor reading: the primary state plus supplementary detail attributes,
/// shaped for a `POST /api/states/<entity_id>` body.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PublishedMetric {
    #[serde(rename = "state")]
    pub value: MetricValue,
    pub attributes: Map<String, Value>,
}

impl PublishedMetric {
    fn new(value: impl Into<MetricValue>) -> Self {
        Self { value: value.into(), attributes: Map::new() }
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_owned(), value);
        self
    }
}

pub type Metrics = BTreeMap<Metric, PublishedMetric>;

/// Map the aggregated summaries onto the full sensor set.
///
/// The mapping is always complete: with no relevant summary every dependent sensor
/// carries the `"No data available"` sentinel instead of being omitted.
pub fn publish(
    market: &BTreeMap<NaiveDate, DaySummary>,
    utilization: &BTreeMap<NaiveDate, DaySummary>,
    now: DateTime<Local>,
) -> Metrics {
    let mut metrics = Metrics::new();
    metrics.insert(Metric::Status, status_metric(market, now));

    match utilization.last_key_value() {
        Some((date, summary)) => {
            // The newest window of the most recent date is "the latest session".
            let latest = summary
                .records
                .last()
                .expect("a summary is only built for a non-empty record set");
            metrics.insert(
                Metric::Utilization,
                PublishedMetric::new(latest.status.as_str())
                    .with("last_checked", json!(now.to_rfc3339())),
            );
            metrics.insert(Metric::DeliveryDate, PublishedMetric::new(date.to_string()));
            metrics.insert(
                Metric::TimeWindow,
                PublishedMetric::new(summary.window_summary())
                    .with("windows", json!(summary.windows()))
                    .with("volumes", json!(summary.volumes())),
            );
            metrics.insert(
                Metric::Price,
                PublishedMetric::new(
                    summary
                        .mean_price
                        .map_or_else(|| MetricValue::from(NO_DATA), |mean| mean.rounded().into()),
                )
                .with("prices", json!(summary.prices())),
            );
            metrics.insert(
                Metric::Volume,
                PublishedMetric::new(latest.volume.rounded())
                    .with("volumes", json!(summary.volumes())),
            );
            metrics.insert(Metric::HighestAccepted, highest_accepted_metric(utilization));
        }
        None => {
            for metric in [
                Metric::Utilization,
                Metric::DeliveryDate,
                Metric::TimeWindow,
                Metric::Price,
                Metric::Volume,
                Metric::HighestAccepted,
            ] {
                metrics.insert(metric, PublishedMetric::new(NO_DATA));
            }
        }
    }
    metrics
}

fn status_metric(market: &BTreeMap<NaiveDate, DaySummary>, now: DateTime<Local>) -> PublishedMetric {
    let entry_count: usize = market.values().map(|summary| summary.records.len()).sum();
    let state = if entry_count > 0 { "active" } else { "inactive" };
    let mut metric = PublishedMetric::new(state)
        .with("last_checked", json!(now.to_rfc3339()))
        .with("entry_count", json!(entry_count));
    if let Some((date, summary)) = market.last_key_value() {
        metric = metric
            .with("most_recent_date", json!(date.to_string()))
            .with("details", json!(requirement_details(summary)));
    }
    metric
}

/// Bullet list of the most recent date's service windows with their volume and
/// guaranteed price.
fn requirement_details(summary: &DaySummary) -> String {
    let slots = summary.records.iter().map(|record| {
        format!("• {} ({}) at {}", record.window, record.volume, record.price)
    });
    std::iter::once(format!("**{}**", summary.date)).chain(slots).join("\n")
}

fn highest_accepted_metric(utilization: &BTreeMap<NaiveDate, DaySummary>) -> PublishedMetric {
    let winner = utilization
        .values()
        .filter_map(|summary| summary.highest_accepted.as_ref())
        .fold(None, |best: Option<&Record>, record| match best {
            // Ties keep the earlier date, matching the per-day rule.
            Some(best) if best.price >= record.price => Some(best),
            _ => Some(record),
        });
    match winner {
        Some(record) => PublishedMetric::new(record.price.rounded())
            .with("delivery_date", json!(record.delivery_date.to_string()))
            .with("time_from", json!(record.window.start.format("%H:%M").to_string()))
            .with("time_to", json!(record.window.end.format("%H:%M").to_string()))
            .with("volume", json!(record.volume.rounded())),
        None => PublishedMetric::new(NO_ACCEPTED_BIDS),
    }
}
