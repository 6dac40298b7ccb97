use anyhow::{Context, bail};
use async_trait::async_trait;
use common::config::Config;
use reqwest::{Client, header};
use tracing::{debug, warn};
use url::Url;

use crate::remote::{RawSwap, SwapsResponse};
use crate::traits::SwapSource;

/// Client for the Moralis wallet swap history endpoint.
pub struct MoralisClient {
    client: Client,
    base_url: String,
    api_key: String,
    wallet_address: String,
    chain: String,
    limit: u32,
}

impl MoralisClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("swap_signal_bot/0.1.0")
            .timeout(config.http_timeout)
            .build()
            .context("Failed to build HTTP client.")?;

        Ok(Self {
            client,
            base_url: config.moralis_base_url.clone(),
            api_key: config.moralis_api_key.clone(),
            wallet_address: config.wallet_address.clone(),
            chain: config.chain.clone(),
            limit: config.swap_limit,
        })
    }

    fn swaps_url(&self) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid Moralis base url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Moralis base url cannot be a base"))?
            .pop_if_empty()
            .extend(["wallets", self.wallet_address.as_str(), "swaps"]);
        Ok(url)
    }

    async fn make_request(&self) -> anyhow::Result<SwapsResponse> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(self.swaps_url()?)
            .header(header::ACCEPT, "application/json")
            .header("X-API-Key", &self.api_key)
            .query(&[
                ("chain", self.chain.as_str()),
                ("order", "DESC"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("API failed: {} -> {}", status, body);
        }

        response
            .json::<SwapsResponse>()
            .await
            .context("Failed to parse JSON response")
    }
}

#[async_trait]
impl SwapSource for MoralisClient {
    async fn fetch_swaps(&self) -> anyhow::Result<Vec<RawSwap>> {
        let (swaps, rejected) = self.make_request().await?.into_swaps();

        for (entry, e) in rejected {
            let hash = entry
                .get("transactionHash")
                .and_then(|h| h.as_str())
                .unwrap_or("<no hash>");
            warn!("Skipping malformed swap record {}: {}", hash, e);
        }

        debug!("Fetched {} swaps for {}", swaps.len(), self.wallet_address);
        Ok(swaps)
    }
}
