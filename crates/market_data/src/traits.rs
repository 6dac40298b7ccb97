use async_trait::async_trait;

use crate::remote::RawSwap;

/// Anything that can hand back the most recent swaps of the watched wallet,
/// newest first.
#[async_trait]
pub trait SwapSource: Send + Sync {
    async fn fetch_swaps(&self) -> anyhow::Result<Vec<RawSwap>>;
}
