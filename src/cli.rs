use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Url;

use crate::{api::home_assistant, prelude::*};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: poll the DFS feeds on an interval and push the readings to Home Assistant.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),

    /// Run a single cycle and print the readings without publishing anything.
    #[clap(name = "scan")]
    Scan(Box<ScanArgs>),
}

#[derive(Parser)]
pub struct FeedArgs {
    /// NESO data portal base URL.
    #[clap(
        long = "feed-base-url",
        env = "FEED_BASE_URL",
        default_value = "https://api.neso.energy"
    )]
    pub base_url: Url,

    /// Datastore resource holding the DFS market requirements with eligible bids.
    #[clap(
        long = "market-resource-id",
        env = "MARKET_RESOURCE_ID",
        default_value = "f5605e2b-b677-424c-8df7-d0ce4ee03cef"
    )]
    pub market_resource_id: String,

    /// Datastore resource holding the DFS utilisation report.
    #[clap(
        long = "utilization-resource-id",
        env = "UTILIZATION_RESOURCE_ID",
        default_value = "cc36fff5-5f6f-4fde-8932-c935d982ecd8"
    )]
    pub utilization_resource_id: String,

    /// Registered DFS participant to watch.
    #[clap(long, env = "PARTICIPANT", default_value = "OCTOPUS ENERGY LIMITED")]
    pub participant: String,
}

#[derive(Parser)]
pub struct WatchArgs {
    #[clap(flatten)]
    pub feed: FeedArgs,

    #[clap(flatten)]
    pub home_assistant: HomeAssistantArgs,

    /// Interval between poll cycles.
    #[clap(
        long = "poll-interval",
        env = "POLL_INTERVAL",
        default_value = "300s",
        value_parser = humantime::parse_duration,
    )]
    pub poll_interval: Duration,

    /// A cycle running longer than this is abandoned; the stale readings stay published.
    #[clap(
        long = "cycle-budget",
        env = "CYCLE_BUDGET",
        default_value = "120s",
        value_parser = humantime::parse_duration,
    )]
    pub cycle_budget: Duration,
}

#[derive(Parser)]
pub struct ScanArgs {
    #[clap(flatten)]
    pub feed: FeedArgs,
}

#[derive(Parser)]
pub struct HomeAssistantArgs {
    /// Home Assistant long-lived access token.
    #[clap(long = "home-assistant-access-token", env = "HOME_ASSISTANT_ACCESS_TOKEN")]
    pub access_token: String,

    /// Home Assistant API base URL. For example: `http://localhost:8123/api`.
    #[clap(long = "home-assistant-api-base-url", env = "HOME_ASSISTANT_API_BASE_URL")]
    pub base_url: Url,

    /// Prefix for the published entity IDs, as in `sensor.<prefix>_price`.
    #[clap(long = "entity-prefix", env = "ENTITY_PREFIX", default_value = "dfs")]
    pub entity_prefix: String,
}

impl HomeAssistantArgs {
    pub fn try_new_client(&self) -> Result<home_assistant::Api> {
        home_assistant::Api::try_new(&self.access_token, self.base_url.clone())
    }
}
