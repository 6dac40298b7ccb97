use std::time::Duration;

use common::config::DisplayLabels;
use market_data::{services::SignalExtractor, traits::SwapSource};
use storage::{SignalStore, StoreError};
use tokio::time::sleep;
use tracing::{error, info};

use crate::services::telegram_service::{Notifier, format_signal_message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetch failed; nothing was read or written.
    Skipped,
    NoNewSwaps,
    Notified { new: usize, delivered: usize },
}

/// Fetch, diff, persist, notify. One pass per tick, forever.
pub struct PollService<S, T, N> {
    source: S,
    store: T,
    notifier: N,
    extractor: SignalExtractor,
    labels: DisplayLabels,
    interval: Duration,
}

impl<S, T, N> PollService<S, T, N>
where
    S: SwapSource,
    T: SignalStore,
    N: Notifier,
{
    pub fn new(
        source: S,
        store: T,
        notifier: N,
        extractor: SignalExtractor,
        labels: DisplayLabels,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            extractor,
            labels,
            interval,
        }
    }

    /// Only returns when the signal store can no longer be trusted.
    pub async fn run(&self) -> Result<(), StoreError> {
        info!("Polling swaps every {}s", self.interval.as_secs());

        loop {
            self.run_cycle().await?;
            sleep(self.interval).await;
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleOutcome, StoreError> {
        info!("Checking swaps...");

        let swaps = match self.source.fetch_swaps().await {
            Ok(swaps) => swaps,
            Err(e) => {
                error!("Swap fetch failed: {:#}", e);
                return Ok(CycleOutcome::Skipped);
            }
        };

        let stored = self.store.load()?;
        let new_signals = self.extractor.extract(&swaps, &stored.known);

        if new_signals.is_empty() {
            info!("No new swaps.");
            return Ok(CycleOutcome::NoNewSwaps);
        }

        // Persist before announcing so a crash can only lose a message,
        // never a dedup entry.
        let mut updated = new_signals.clone();
        updated.extend(stored.signals);
        self.store.save(&updated)?;

        info!("{} new signal(s) recorded.", new_signals.len());

        let mut delivered = 0;
        for signal in &new_signals {
            let text = format_signal_message(signal, &self.labels);
            match self.notifier.send(&text).await {
                Ok(()) => delivered += 1,
                Err(e) => error!("Telegram send failed for {}: {:#}", signal.transaction_id, e),
            }
        }

        Ok(CycleOutcome::Notified {
            new: new_signals.len(),
            delivered,
        })
    }
}
