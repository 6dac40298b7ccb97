use anyhow::Context;
use async_trait::async_trait;
use common::{
    config::{Config, DisplayLabels},
    models::{Signal, TradeSignal},
};
use teloxide::{
    prelude::*,
    types::{ParseMode, Recipient},
};
use tracing::debug;

/// A single chat destination for signal messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

pub struct TelegramService {
    bot: Bot,
    chat: Recipient,
}

impl TelegramService {
    pub fn new(config: &Config) -> Self {
        Self {
            bot: Bot::new(&config.telegram_bot_token),
            chat: parse_recipient(&config.telegram_chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramService {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        // The message template uses the legacy Markdown dialect.
        #[allow(deprecated)]
        let parse_mode = ParseMode::Markdown;

        self.bot
            .send_message(self.chat.clone(), text)
            .parse_mode(parse_mode)
            .await
            .context("Telegram sendMessage failed")?;

        debug!("Delivered message to {:?}", self.chat);
        Ok(())
    }
}

/// Numeric ids go out as chat ids, anything else (e.g. `@channel`) as a
/// channel username.
fn parse_recipient(raw: &str) -> Recipient {
    match raw.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(raw.trim().to_string()),
    }
}

pub fn format_signal_message(signal: &TradeSignal, labels: &DisplayLabels) -> String {
    let prefix = match signal.signal {
        Signal::Buy => "🟢",
        Signal::Sell => "🔴",
    };

    format!(
        "{prefix} *{kind} Signal*\n\
         • *{native}:* `{eth}`\n\
         • *Token:* `{token}`\n\
         • *{usd}:* `{usd_amount}`\n\
         • *Pair:* `{pair}`\n\
         • *Swap:* `{venue}`\n\
         • *Time:* `{time}`",
        kind = signal.signal.as_str().to_uppercase(),
        native = labels.native,
        eth = signal.eth_amount_display,
        token = signal.token_amount_display,
        usd = labels.usd,
        usd_amount = signal.usd_amount_display,
        pair = signal.pair_address,
        venue = signal.swap_venue,
        time = signal.display_time,
    )
}
