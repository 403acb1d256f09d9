//! One poll cycle: fetch → parse → aggregate → publish.
//!
//! The cycle carries no state of its own. The last-known-good snapshot is threaded
//! through the watch loop explicitly and is only replaced on a fully successful cycle;
//! a failed cycle republishes it unchanged with the status sensor flipped to `error`.

use chrono::{DateTime, Local};
use serde_json::json;

use crate::{
    api::neso,
    cli::FeedArgs,
    core::{
        aggregate::aggregate,
        parse::{FeedShape, parse},
        publish::{Metric, MetricValue, Metrics, PublishedMetric, publish},
    },
    prelude::*,
};

/// The most recently successfully published metric set.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub metrics: Metrics,
    pub updated_at: DateTime<Local>,
}

impl Snapshot {
    #[must_use]
    pub fn new(metrics: Metrics) -> Self {
        Self { metrics, updated_at: Local::now() }
    }
}

/// Run one full cycle against the live feeds.
#[instrument(skip_all)]
pub async fn try_cycle(api: &neso::Api, feed: &FeedArgs) -> Result<Metrics> {
    let market_payload = api.get_csv(&feed.market_resource_id).await?;
    let utilization_payload = api.get_csv(&feed.utilization_resource_id).await?;
    transform(&market_payload, &utilization_payload, &feed.participant, Local::now())
}

/// The pure part of the cycle: raw payloads in, full metric mapping out.
pub fn transform(
    market_payload: &str,
    utilization_payload: &str,
    participant: &str,
    now: DateTime<Local>,
) -> Result<Metrics> {
    let market = parse(market_payload, FeedShape::Market).context("market feed")?;
    let utilization =
        parse(utilization_payload, FeedShape::Utilization).context("utilisation feed")?;
    info!(n_market = market.len(), n_utilization = utilization.len(), "parsed the feeds");
    Ok(publish(&aggregate(&market, participant), &aggregate(&utilization, participant), now))
}

/// Fall back to the previous snapshot after a failed cycle.
///
/// Every sensor keeps its last-known-good reading value-for-value; only the status
/// sensor is replaced so the failure stays visible. Without a previous snapshot the
/// consumers still receive the complete mapping of sentinels.
#[must_use]
pub fn degrade(last_good: Option<&Snapshot>, reason: &str) -> Metrics {
    let mut metrics = last_good.map_or_else(
        || publish(&Default::default(), &Default::default(), Local::now()),
        |snapshot| snapshot.metrics.clone(),
    );
    let mut status = PublishedMetric {
        value: MetricValue::from("error"),
        attributes: serde_json::Map::new(),
    };
    status.attributes.insert("last_checked".to_owned(), json!(Local::now().to_rfc3339()));
    status.attributes.insert("error".to_owned(), json!(reason));
    if let Some(snapshot) = last_good {
        status
            .attributes
            .insert("stale_since".to_owned(), json!(snapshot.updated_at.to_rfc3339()));
    }
    metrics.insert(Metric::Status, status);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::publish::NO_DATA;

    const MARKET_PAYLOAD: &str = "\
        Delivery Date,From,To,Participant Bids Eligible,Service Requirement MW,Guaranteed Acceptance Price GBP per MWh\n\
        2025-02-11,16:00,19:00,OCTOPUS ENERGY LIMITED,240,95.00";

    const UTILIZATION_PAYLOAD: &str = "\
        Registered DFS Participant,Delivery Date,From,To,Status,Utilisation Price GBP per MWh,DFS Volume MW\n\
        OCTOPUS ENERGY LIMITED,2025-02-11,16:00,19:00,ACCEPTED,123.45,50.5";

    #[test]
    fn test_transform_single_row() -> Result {
        let metrics =
            transform(MARKET_PAYLOAD, UTILIZATION_PAYLOAD, "OCTOPUS ENERGY LIMITED", Local::now())?;
        assert_eq!(metrics[&Metric::Status].value, MetricValue::from("active"));
        assert_eq!(metrics[&Metric::Price].value, MetricValue::Number(123.45));
        assert_eq!(metrics[&Metric::HighestAccepted].value, MetricValue::Number(123.45));
        assert_eq!(metrics[&Metric::TimeWindow].value, MetricValue::from("16:00 - 19:00"));
        Ok(())
    }

    #[test]
    fn test_degrade_keeps_previous_readings() -> Result {
        let metrics =
            transform(MARKET_PAYLOAD, UTILIZATION_PAYLOAD, "OCTOPUS ENERGY LIMITED", Local::now())?;
        let snapshot = Snapshot::new(metrics.clone());

        let degraded = degrade(Some(&snapshot), "connection timed out");

        assert_eq!(degraded[&Metric::Status].value, MetricValue::from("error"));
        assert_eq!(degraded[&Metric::Status].attributes["error"], json!("connection timed out"));
        for metric in Metric::ALL.into_iter().filter(|metric| *metric != Metric::Status) {
            assert_eq!(degraded[&metric], metrics[&metric], "{metric} must stay unchanged");
        }
        Ok(())
    }

    #[test]
    fn test_degrade_without_a_snapshot_is_complete() {
        let degraded = degrade(None, "first cycle failed");
        for metric in Metric::ALL {
            assert!(degraded.contains_key(&metric));
        }
        assert_eq!(degraded[&Metric::Price].value, MetricValue::from(NO_DATA));
        assert_eq!(degraded[&Metric::Status].value, MetricValue::from("error"));
    }
}
