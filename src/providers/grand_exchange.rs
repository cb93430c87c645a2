use crate::core::item::ItemFetcher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://secure.runescape.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DETAIL_PATH: &str = "/m=itemdb_oldschool/api/catalogue/detail.json";

/// Fetches item detail documents from the Old School Grand Exchange catalogue.
pub struct GrandExchangeClient {
    base_url: String,
    client: reqwest::Client,
}

impl GrandExchangeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("alchr/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn detail_url(&self, id: u32) -> String {
        format!("{}{}?item={}", self.base_url, DETAIL_PATH, id)
    }
}

#[async_trait]
impl ItemFetcher for GrandExchangeClient {
    async fn fetch(&self, id: u32) -> Result<String> {
        let url = self.detail_url(id);
        debug!("Requesting item data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request for item: {id}"))?
            .error_for_status()
            .with_context(|| format!("Catalogue rejected request for item: {id}"))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for item: {id}"))
    }
}
