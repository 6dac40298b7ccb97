use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed swap, already formatted for display. Created once by the
/// extractor and never mutated afterwards.
///
/// The serialized key names match the historical `signal.json` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub signal: Signal,
    #[serde(rename = "eth")]
    pub eth_amount_display: String, // "-0.500000 ETH"
    #[serde(rename = "token")]
    pub token_amount_display: String, // "+100.000000 PEPE"
    #[serde(rename = "usdt")]
    pub usd_amount_display: String, // "-900.00 USDT"
    pub pair_address: String,
    #[serde(rename = "swap")]
    pub swap_venue: String,
    #[serde(rename = "time")]
    pub display_time: String,
    pub transaction_id: String,
}
