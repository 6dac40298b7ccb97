use dotenvy::dotenv;
use tracing::{error, info};

use common::{config::Config, logger};
use market_data::{remote::MoralisClient, services::SignalExtractor};
use storage::JsonSignalStore;

use crate::services::{poll_service::PollService, telegram_service::TelegramService};

mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    info!("Swap signal bot starting up...");

    let config = Config::from_env()?;
    info!("{:?}", config);

    let store = JsonSignalStore::new(config.signal_file.clone());
    info!("Recording signals in {}", store.path().display());

    let service = PollService::new(
        MoralisClient::new(&config)?,
        store,
        TelegramService::new(&config),
        SignalExtractor::from_config(&config),
        config.labels.clone(),
        config.poll_interval,
    );

    tokio::select! {
        result = service.run() => {
            if let Err(e) = result {
                error!("Signal store unusable, stopping: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down.");
        }
    }

    Ok(())
}
