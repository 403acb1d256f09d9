//! Home Assistant REST API client: pushes sensor readings into the per-entity state store.

use reqwest::{
    Client,
    ClientBuilder,
    Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};

use crate::{core::publish::PublishedMetric, prelude::*};

pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    pub fn try_new(access_token: &str, base_url: Url) -> Result<Self> {
        ensure!(!base_url.cannot_be_a_base(), "invalid Home Assistant base URL `{base_url}`");
        let headers = HeaderMap::from_iter([(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {access_token}"))?,
        )]);
        let client = ClientBuilder::new().default_headers(headers).build()?;
        Ok(Self { client, base_url })
    }

    /// `POST /api/states/<entity_id>` with a `{"state": …, "attributes": …}` body.
    /// Creates the entity on first push.
    #[instrument(skip_all, fields(entity_id = entity_id))]
    pub async fn post_state(&self, entity_id: &str, metric: &PublishedMetric) -> Result {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .push("states")
            .push(entity_id);
        self.client.post(url).json(metric).send().await?.error_for_status()?;
        debug!("pushed");
        Ok(())
    }
}
