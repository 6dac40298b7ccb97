use serde::Deserialize;
use serde_json::Value;

/// Body of `GET /wallets/{address}/swaps`. Entries stay untyped until each
/// one is decoded on its own, so a single odd record cannot poison the batch.
#[derive(Debug, Deserialize)]
pub struct SwapsResponse {
    #[serde(default)]
    pub result: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSwap {
    #[serde(rename(deserialize = "transactionHash"))]
    pub transaction_hash: String,
    #[serde(rename(deserialize = "transactionType"))]
    pub transaction_type: String,
    pub bought: SwapLeg,
    pub sold: SwapLeg,
    #[serde(rename(deserialize = "pairAddress"), default)]
    pub pair_address: String,
    #[serde(rename(deserialize = "blockTimestamp"))]
    pub block_timestamp: String,
    #[serde(rename(deserialize = "exchangeLogo"), default)]
    pub exchange_logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapLeg {
    pub symbol: String,
    pub amount: Amount,
    #[serde(rename(deserialize = "usdAmount"), default)]
    pub usd_amount: Option<Amount>,
}

/// Moralis sends token amounts as strings and USD values as numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Amount::Number(n) => *n,
            Amount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl SwapsResponse {
    /// Decodes every entry, handing back the ones that fail alongside the
    /// decoding error.
    pub fn into_swaps(self) -> (Vec<RawSwap>, Vec<(Value, serde_json::Error)>) {
        let mut swaps = Vec::with_capacity(self.result.len());
        let mut rejected = Vec::new();

        for entry in self.result {
            match serde_json::from_value::<RawSwap>(entry.clone()) {
                Ok(swap) => swaps.push(swap),
                Err(e) => rejected.push((entry, e)),
            }
        }
        (swaps, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "cursor": null,
        "page": 0,
        "pageSize": 5,
        "result": [
            {
                "transactionHash": "0xaaa",
                "transactionType": "buy",
                "blockTimestamp": "2024-05-01T12:34:56.000Z",
                "pairAddress": "0xpair",
                "exchangeLogo": "https://entities-logos.s3.amazonaws.com/uniswap.png",
                "bought": {"symbol": "PEPE", "amount": "1000.5", "usdAmount": 899.1},
                "sold": {"symbol": "WETH", "amount": "-0.5", "usdAmount": -900.25}
            },
            {
                "transactionHash": "0xbbb",
                "transactionType": "sell"
            }
        ]
    }"#;

    #[test]
    fn test_decodes_valid_entries_and_rejects_broken_ones() {
        let response: SwapsResponse = serde_json::from_str(BODY).unwrap();
        let (swaps, rejected) = response.into_swaps();

        assert_eq!(swaps.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0["transactionHash"], "0xbbb");

        let swap = &swaps[0];
        assert_eq!(swap.transaction_hash, "0xaaa");
        assert_eq!(swap.bought.amount.to_f64(), Some(1000.5));
        assert_eq!(swap.sold.usd_amount.as_ref().and_then(Amount::to_f64), Some(-900.25));
        assert_eq!(
            swap.exchange_logo.as_deref(),
            Some("https://entities-logos.s3.amazonaws.com/uniswap.png")
        );
    }

    #[test]
    fn test_missing_result_is_empty() {
        let response: SwapsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.result.is_empty());
    }

    #[test]
    fn test_amount_rejects_garbage() {
        assert_eq!(Amount::Text("abc".to_string()).to_f64(), None);
        assert_eq!(Amount::Text(" 2.5 ".to_string()).to_f64(), Some(2.5));
        assert_eq!(Amount::Number(-3.0).to_f64(), Some(-3.0));
    }
}
