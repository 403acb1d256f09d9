//! [NESO data portal](https://www.neso.energy/data-portal) client.
//!
//! The DFS feeds are CKAN datastore resources; the raw CSV dump endpoint is
//! `GET /datastore/dump/<resource_id>?format=csv`.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("the feed responded with {0}")]
    Status(StatusCode),

    #[error("the base URL cannot carry path segments")]
    BaseUrl,
}

pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    /// One attempt per cycle with a bounded timeout; the next scheduled cycle is the retry.
    pub fn new(base_url: Url) -> Result<Self> {
        ensure!(!base_url.cannot_be_a_base(), "invalid feed base URL `{base_url}`");
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, base_url })
    }

    #[instrument(skip_all, fields(resource_id = resource_id))]
    pub async fn get_csv(&self, resource_id: &str) -> Result<String, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::BaseUrl)?
            .push("datastore")
            .push("dump")
            .push(resource_id);
        url.query_pairs_mut().append_pair("format", "csv");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let payload = response.text().await?;
        info!(n_bytes = payload.len(), "fetched");
        Ok(payload)
    }
}
