#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod prelude;
mod quantity;
mod tables;

use chrono::Local;
use clap::{Parser, crate_version};
use tokio::time::{sleep, timeout};

use crate::{
    api::neso,
    cli::{Args, Command, ScanArgs, WatchArgs},
    core::{
        aggregate::aggregate,
        cycle::{Snapshot, degrade, try_cycle},
        parse::{FeedShape, parse},
        publish::publish,
    },
    prelude::*,
    tables::{build_day_summary_table, build_metrics_table},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Watch(args) => watch(&args).await,
        Command::Scan(args) => scan(&args).await,
    }
}

/// The poll loop. One cycle runs to completion before the next sleep starts, so cycles
/// never overlap.
async fn watch(args: &WatchArgs) -> Result {
    let feed_api = neso::Api::new(args.feed.base_url.clone())?;
    let home_assistant = args.home_assistant.try_new_client()?;
    let mut last_good: Option<Snapshot> = None;

    loop {
        let metrics = match timeout(args.cycle_budget, try_cycle(&feed_api, &args.feed)).await {
            Ok(Ok(metrics)) => {
                last_good = Some(Snapshot::new(metrics.clone()));
                metrics
            }
            Ok(Err(error)) => {
                warn!("cycle failed, keeping the previous readings: {error:#}");
                degrade(last_good.as_ref(), &format!("{error:#}"))
            }
            Err(_elapsed) => {
                warn!(budget = ?args.cycle_budget, "cycle exceeded the budget, abandoning it");
                degrade(last_good.as_ref(), "cycle budget exceeded")
            }
        };

        for (metric, published) in &metrics {
            let entity_id = metric.entity_id(&args.home_assistant.entity_prefix);
            if let Err(error) = home_assistant.post_state(&entity_id, published).await {
                warn!(%entity_id, "failed to push the reading: {error:#}");
            }
        }

        info!(interval = ?args.poll_interval, "sleeping until the next cycle…");
        sleep(args.poll_interval).await;
    }
}

/// One-shot development aid: fetch, transform, and print instead of publishing.
async fn scan(args: &ScanArgs) -> Result {
    let feed_api = neso::Api::new(args.feed.base_url.clone())?;

    let market_payload = feed_api.get_csv(&args.feed.market_resource_id).await?;
    let utilization_payload = feed_api.get_csv(&args.feed.utilization_resource_id).await?;
    let market = aggregate(&parse(&market_payload, FeedShape::Market)?, &args.feed.participant);
    let utilization = aggregate(
        &parse(&utilization_payload, FeedShape::Utilization)?,
        &args.feed.participant,
    );

    if let Some((date, summary)) = utilization.last_key_value() {
        println!("Utilisation on {date}:");
        println!("{}", build_day_summary_table(summary));
    } else {
        println!("No utilisation records for {}", args.feed.participant);
    }

    let metrics = publish(&market, &utilization, Local::now());
    println!("{}", build_metrics_table(&metrics));
    Ok(())
}
