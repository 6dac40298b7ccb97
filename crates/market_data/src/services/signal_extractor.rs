use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use common::{
    config::{Config, DisplayLabels},
    models::{Signal, TradeSignal},
};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::remote::{Amount, RawSwap, SwapLeg};

/// Indian Standard Time, UTC+05:30.
const IST: FixedOffset = match FixedOffset::east_opt(5 * 3600 + 30 * 60) {
    Some(offset) => offset,
    None => panic!("IST offset out of range"),
};

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const IMAGE_EXTENSIONS: &[&str] = &["png", "svg", "jpg", "jpeg", "webp", "gif"];
const UNKNOWN_VENUE: &str = "unknown";

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("unknown transaction type {0:?}")]
    Direction(String),
    #[error("expected exactly one {symbol} leg, found {found}")]
    NativeLeg { symbol: String, found: usize },
    #[error("{field} is missing or not a number: {value:?}")]
    Amount { field: &'static str, value: String },
    #[error("unparseable block timestamp {0:?}")]
    Timestamp(String),
}

/// Turns raw wallet swaps into display-ready signals.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    native_symbol: String,
    labels: DisplayLabels,
}

impl SignalExtractor {
    pub fn new(native_symbol: impl Into<String>, labels: DisplayLabels) -> Self {
        Self {
            native_symbol: native_symbol.into(),
            labels,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.native_symbol.clone(), config.labels.clone())
    }

    /// New signals in input order. Swaps whose hash is in `known` or was
    /// already seen earlier in `swaps` are skipped, as are swaps that fail
    /// to convert (logged).
    pub fn extract(&self, swaps: &[RawSwap], known: &HashSet<String>) -> Vec<TradeSignal> {
        let mut seen = HashSet::new();
        let mut signals = Vec::new();

        for swap in swaps {
            let hash = &swap.transaction_hash;
            if known.contains(hash) || !seen.insert(hash.as_str()) {
                continue;
            }

            match self.to_signal(swap) {
                Ok(signal) => signals.push(signal),
                Err(e) => warn!("Skipping swap {}: {}", hash, e),
            }
        }
        signals
    }

    pub fn to_signal(&self, swap: &RawSwap) -> Result<TradeSignal, ExtractError> {
        let direction = match swap.transaction_type.trim().to_ascii_lowercase().as_str() {
            "buy" => Signal::Buy,
            "sell" => Signal::Sell,
            _ => return Err(ExtractError::Direction(swap.transaction_type.clone())),
        };

        let (native, token) = self.split_legs(swap)?;

        let native_amount = amount_of(Some(&native.amount), "native amount")?.abs();
        let token_amount = amount_of(Some(&token.amount), "token amount")?.abs();
        let usd_amount = amount_of(native.usd_amount.as_ref(), "native usdAmount")?.abs();

        // Buying spends the native asset, selling receives it.
        let (native_sign, token_sign) = match direction {
            Signal::Buy => ('-', '+'),
            Signal::Sell => ('+', '-'),
        };

        Ok(TradeSignal {
            signal: direction,
            eth_amount_display: format!("{}{:.6} {}", native_sign, native_amount, self.labels.native),
            token_amount_display: format!("{}{:.6} {}", token_sign, token_amount, token.symbol),
            usd_amount_display: format!("{}{:.2} {}", native_sign, usd_amount, self.labels.usd),
            pair_address: swap.pair_address.clone(),
            swap_venue: venue_from_logo(swap.exchange_logo.as_deref()),
            display_time: to_display_time(&swap.block_timestamp)?,
            transaction_id: swap.transaction_hash.clone(),
        })
    }

    /// Returns (native leg, token leg).
    fn split_legs<'a>(&self, swap: &'a RawSwap) -> Result<(&'a SwapLeg, &'a SwapLeg), ExtractError> {
        let is_native = |leg: &SwapLeg| leg.symbol.eq_ignore_ascii_case(&self.native_symbol);

        match (is_native(&swap.bought), is_native(&swap.sold)) {
            (true, false) => Ok((&swap.bought, &swap.sold)),
            (false, true) => Ok((&swap.sold, &swap.bought)),
            (both, _) => Err(ExtractError::NativeLeg {
                symbol: self.native_symbol.clone(),
                found: if both { 2 } else { 0 },
            }),
        }
    }
}

fn amount_of(amount: Option<&Amount>, field: &'static str) -> Result<f64, ExtractError> {
    amount
        .and_then(Amount::to_f64)
        .ok_or_else(|| ExtractError::Amount {
            field,
            value: match amount {
                Some(Amount::Number(n)) => n.to_string(),
                Some(Amount::Text(s)) => s.clone(),
                None => "<missing>".to_string(),
            },
        })
}

/// File name of the exchange logo without its image extension, e.g.
/// `https://x/y/uniswap.png` -> `uniswap`.
pub fn venue_from_logo(logo: Option<&str>) -> String {
    let Some(logo) = logo.map(str::trim).filter(|l| !l.is_empty()) else {
        return UNKNOWN_VENUE.to_string();
    };

    let file_name = match Url::parse(logo) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => logo.rsplit('/').next().unwrap_or_default().to_string(),
    };

    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => file_name.as_str(),
    };

    if stem.is_empty() {
        UNKNOWN_VENUE.to_string()
    } else {
        stem.to_string()
    }
}

/// UTC block timestamp rendered in IST. Timestamps without an offset are
/// taken to be UTC.
pub fn to_display_time(raw: &str) -> Result<String, ExtractError> {
    let raw = raw.trim();

    let utc = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map_err(|_| ExtractError::Timestamp(raw.to_string()))?
            .and_utc(),
    };

    Ok(utc.with_timezone(&IST).format(DISPLAY_TIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(symbol: &str, amount: f64, usd: f64) -> SwapLeg {
        SwapLeg {
            symbol: symbol.to_string(),
            amount: Amount::Text(amount.to_string()),
            usd_amount: Some(Amount::Number(usd)),
        }
    }

    fn swap(hash: &str, kind: &str, bought: SwapLeg, sold: SwapLeg) -> RawSwap {
        RawSwap {
            transaction_hash: hash.to_string(),
            transaction_type: kind.to_string(),
            bought,
            sold,
            pair_address: "0xpair".to_string(),
            block_timestamp: "2024-05-01T12:34:56.000Z".to_string(),
            exchange_logo: Some("https://x/y/uniswap.png".to_string()),
        }
    }

    fn buy(hash: &str) -> RawSwap {
        swap(hash, "buy", leg("TOKEN", 100.0, 899.0), leg("WETH", 0.5, 900.0))
    }

    fn extractor() -> SignalExtractor {
        SignalExtractor::new("WETH", DisplayLabels::default())
    }

    #[test]
    fn test_buy_spends_native_and_receives_token() {
        let signal = extractor().to_signal(&buy("0x1")).unwrap();

        assert_eq!(signal.signal, Signal::Buy);
        assert_eq!(signal.eth_amount_display, "-0.500000 ETH");
        assert_eq!(signal.token_amount_display, "+100.000000 TOKEN");
        assert_eq!(signal.usd_amount_display, "-900.00 USDT");
        assert_eq!(signal.pair_address, "0xpair");
        assert_eq!(signal.swap_venue, "uniswap");
        assert_eq!(signal.display_time, "2024-05-01 18:04:56");
        assert_eq!(signal.transaction_id, "0x1");
    }

    #[test]
    fn test_sell_flips_every_sign() {
        let mut raw = buy("0x1");
        raw.transaction_type = "sell".to_string();

        let signal = extractor().to_signal(&raw).unwrap();

        assert_eq!(signal.signal, Signal::Sell);
        assert_eq!(signal.eth_amount_display, "+0.500000 ETH");
        assert_eq!(signal.token_amount_display, "-100.000000 TOKEN");
        assert_eq!(signal.usd_amount_display, "+900.00 USDT");
    }

    #[test]
    fn test_magnitudes_are_absolute_values() {
        let raw = swap(
            "0x1",
            "sell",
            leg("WETH", 1.2345678, 2469.1),
            leg("PEPE", -12.5, -2400.0),
        );

        let signal = extractor().to_signal(&raw).unwrap();

        assert_eq!(signal.eth_amount_display, "+1.234568 ETH");
        assert_eq!(signal.token_amount_display, "-12.500000 PEPE");
        assert_eq!(signal.usd_amount_display, "+2469.10 USDT");
    }

    #[test]
    fn test_usd_comes_from_native_leg_only() {
        let raw = swap("0x1", "buy", leg("TOKEN", 1.0, 5.0), leg("WETH", 1.0, 7.0));
        let signal = extractor().to_signal(&raw).unwrap();
        assert_eq!(signal.usd_amount_display, "-7.00 USDT");
    }

    #[test]
    fn test_skips_known_and_repeated_hashes() {
        let swaps = vec![buy("0x1"), buy("0x2"), buy("0x3"), buy("0x2")];
        let known: HashSet<String> = ["0x1".to_string()].into_iter().collect();

        let signals = extractor().extract(&swaps, &known);
        let ids: Vec<&str> = signals.iter().map(|s| s.transaction_id.as_str()).collect();

        assert_eq!(ids, vec!["0x2", "0x3"]);
        assert!(signals.iter().all(|s| !known.contains(&s.transaction_id)));
    }

    #[test]
    fn test_extract_is_repeatable() {
        let swaps = vec![buy("0x1"), buy("0x2")];
        let known = HashSet::new();
        let extractor = extractor();

        assert_eq!(extractor.extract(&swaps, &known), extractor.extract(&swaps, &known));
        assert!(known.is_empty());
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(extractor().extract(&[], &HashSet::new()).is_empty());
    }

    #[test]
    fn test_ambiguous_native_leg_is_rejected() {
        let neither = swap("0x1", "buy", leg("PEPE", 1.0, 1.0), leg("USDC", 1.0, 1.0));
        let both = swap("0x2", "buy", leg("WETH", 1.0, 1.0), leg("weth", 1.0, 1.0));

        assert_eq!(
            extractor().to_signal(&neither).unwrap_err(),
            ExtractError::NativeLeg { symbol: "WETH".to_string(), found: 0 }
        );
        assert_eq!(
            extractor().to_signal(&both).unwrap_err(),
            ExtractError::NativeLeg { symbol: "WETH".to_string(), found: 2 }
        );
        assert!(extractor().extract(&[neither, both, buy("0x3")], &HashSet::new()).len() == 1);
    }

    #[test]
    fn test_unknown_direction_is_rejected() {
        let mut raw = buy("0x1");
        raw.transaction_type = "addLiquidity".to_string();
        assert!(matches!(extractor().to_signal(&raw), Err(ExtractError::Direction(_))));
    }

    #[test]
    fn test_missing_native_usd_is_rejected() {
        let mut raw = buy("0x1");
        raw.sold.usd_amount = None;
        assert!(matches!(extractor().to_signal(&raw), Err(ExtractError::Amount { .. })));
    }

    #[test]
    fn test_venue_from_logo() {
        assert_eq!(venue_from_logo(Some("https://x/y/uniswap.png")), "uniswap");
        assert_eq!(venue_from_logo(Some("https://cdn/logos/sushiswap.SVG?v=2")), "sushiswap");
        assert_eq!(venue_from_logo(Some("pancakeswap-v3.png")), "pancakeswap-v3");
        assert_eq!(venue_from_logo(Some("https://x/y/")), "unknown");
        assert_eq!(venue_from_logo(Some("")), "unknown");
        assert_eq!(venue_from_logo(None), "unknown");
    }

    #[test]
    fn test_display_time_converts_to_ist() {
        assert_eq!(to_display_time("2024-05-01T12:34:56.000Z").unwrap(), "2024-05-01 18:04:56");
        assert_eq!(to_display_time("2024-12-31T20:00:00").unwrap(), "2025-01-01 01:30:00");
        assert_eq!(to_display_time("2024-05-01T12:34:56+02:00").unwrap(), "2024-05-01 16:04:56");
        assert!(to_display_time("yesterday").is_err());
    }
}
