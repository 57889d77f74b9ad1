use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::debug;

use super::{BreedRegistry, same_breed};

/// Breed lookups against TheCatAPI's breed catalog.
///
/// The catalog is fetched on every lookup; one request, bounded by the
/// client timeout, no retries.
pub struct CatApiRegistry {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(serde::Deserialize)]
struct BreedEntry {
    #[serde(default)]
    name: String,
}

impl CatApiRegistry {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build breed catalog client")?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl BreedRegistry for CatApiRegistry {
    async fn breed_exists(&self, name: &str) -> Result<bool> {
        let mut req = self.client.get(&self.url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req.send().await.context("breed catalog unreachable")?;
        if !resp.status().is_success() {
            bail!("breed catalog returned {}", resp.status());
        }

        let breeds: Vec<BreedEntry> = resp
            .json()
            .await
            .context("breed catalog sent an unreadable response")?;
        let found = breeds.iter().any(|b| same_breed(&b.name, name));
        debug!(breed = name, found, catalog = breeds.len(), "breed lookup");
        Ok(found)
    }
}
