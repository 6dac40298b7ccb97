use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

pub const DEFAULT_WALLET: &str = "0x5b2f0585296666e52b154b1a76677158cd7025c2";
pub const DEFAULT_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Unit suffixes used when rendering amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLabels {
    pub native: String,
    pub usd: String,
}

impl Default for DisplayLabels {
    fn default() -> Self {
        Self {
            native: "ETH".to_string(),
            usd: "USDT".to_string(),
        }
    }
}

/// Everything the bot needs, read once at startup and handed to each
/// component. Credentials are not validated here; a missing key surfaces as
/// an authentication failure on the first request.
#[derive(Clone)]
pub struct Config {
    pub moralis_api_key: String,
    pub moralis_base_url: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub wallet_address: String,
    pub chain: String,
    pub native_symbol: String,
    pub labels: DisplayLabels,
    pub swap_limit: u32,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub signal_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            moralis_api_key: text("MORALIS_API_KEY", ""),
            moralis_base_url: text("MORALIS_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            telegram_bot_token: text("TELEGRAM_BOT_TOKEN", ""),
            telegram_chat_id: text("TELEGRAM_CHAT_ID", ""),
            wallet_address: text("WALLET_ADDRESS", DEFAULT_WALLET).to_lowercase(),
            chain: text("CHAIN", "eth"),
            native_symbol: text("NATIVE_SYMBOL", "WETH"),
            labels: DisplayLabels {
                native: text("NATIVE_LABEL", "ETH"),
                usd: text("USD_LABEL", "USDT"),
            },
            swap_limit: parse_number(&lookup, "SWAP_LIMIT", 5)?,
            poll_interval: Duration::from_secs(parse_number(&lookup, "POLL_INTERVAL_SECS", 30)?),
            http_timeout: Duration::from_secs(parse_number(&lookup, "HTTP_TIMEOUT_SECS", 10)?),
            signal_file: PathBuf::from(text("SIGNAL_FILE", "data/signal.json")),
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
    T::Err: fmt::Display,
{
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };

    let value = raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })?;

    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("moralis_api_key", &redact(&self.moralis_api_key))
            .field("moralis_base_url", &self.moralis_base_url)
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("wallet_address", &self.wallet_address)
            .field("chain", &self.chain)
            .field("native_symbol", &self.native_symbol)
            .field("labels", &self.labels)
            .field("swap_limit", &self.swap_limit)
            .field("poll_interval", &self.poll_interval)
            .field("http_timeout", &self.http_timeout)
            .field("signal_file", &self.signal_file)
            .finish()
    }
}
