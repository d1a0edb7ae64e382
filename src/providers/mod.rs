// src/providers/mod.rs
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ArbiterConfig, ConfigError};
use crate::types::{FundingRate, OrderBookDepth, Spread};

pub mod binance;
pub mod bybit;
pub mod http;
pub mod mexc;

#[cfg(test)]
pub(crate) mod fake;

pub use binance::BinanceAdapter;
pub use bybit::BybitAdapter;
pub use mexc::MexcAdapter;

/// Failure of one capability call on one exchange.
#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("exchange error {code}: {msg}")]
    Exchange { code: i64, msg: String },
    #[error("parse: {0}")]
    Parse(String),
    #[error("no entry for {0}")]
    Empty(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid data: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::Parse(e.to_string())
    }
}

/// Which of the three market calls a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    FundingRate,
    Spread,
    Depth,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::FundingRate => "funding_rate",
            Capability::Spread => "spread",
            Capability::Depth => "depth",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One derivatives exchange. Every call is independent and may fail on its own.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Stable identifier, e.g. "binance".
    fn name(&self) -> &'static str;

    async fn funding_rate(&self, pair: &str) -> Result<FundingRate, AdapterError>;

    async fn spread(&self, pair: &str) -> Result<Spread, AdapterError>;

    /// Bid/ask notional over the top N book levels.
    async fn order_book_depth(&self, pair: &str) -> Result<OrderBookDepth, AdapterError>;
}

pub fn parse_f64(field: &str, raw: &str) -> Result<f64, AdapterError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| AdapterError::Parse(format!("{field}={raw:?}: {e}")))
}

/// Turn string `[price, qty, ...]` levels into numeric pairs.
pub fn parse_levels(levels: &[Vec<String>]) -> Result<Vec<(f64, f64)>, AdapterError> {
    levels
        .iter()
        .map(|lvl| match lvl.as_slice() {
            [px, qty, ..] => Ok((parse_f64("price", px)?, parse_f64("qty", qty)?)),
            _ => Err(AdapterError::Parse(format!("short book level {lvl:?}"))),
        })
        .collect()
}

/// Build the adapters named in the config, in config order.
pub fn build(cfg: &ArbiterConfig) -> Result<Vec<Arc<dyn MarketSource>>, ConfigError> {
    let timeout = cfg.http_timeout();
    let mut out: Vec<Arc<dyn MarketSource>> = Vec::with_capacity(cfg.exchanges.len());
    for name in &cfg.exchanges {
        let key = cfg.keys.for_exchange(name).to_string();
        let built: Result<Arc<dyn MarketSource>, AdapterError> = match name.as_str() {
            "binance" => BinanceAdapter::new(key, timeout, cfg.depth_levels).map(|a| Arc::new(a) as _),
            "bybit" => BybitAdapter::new(key, timeout, cfg.depth_levels).map(|a| Arc::new(a) as _),
            "mexc" => MexcAdapter::new(key, timeout, cfg.depth_levels).map(|a| Arc::new(a) as _),
            _ => return Err(ConfigError::Invalid("unknown exchange in `exchanges`")),
        };
        let src = built.map_err(|source| ConfigError::HttpClient { exchange: name.clone(), source })?;
        out.push(src);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_levels() {
        let raw = vec![
            vec!["100.5".to_string(), "2".to_string()],
            vec!["100.0".to_string(), "0.5".to_string(), "extra".to_string()],
        ];
        assert_eq!(parse_levels(&raw).unwrap(), vec![(100.5, 2.0), (100.0, 0.5)]);
    }

    #[test]
    fn rejects_short_or_garbled_levels() {
        let short = vec![vec!["100.5".to_string()]];
        assert!(matches!(parse_levels(&short), Err(AdapterError::Parse(_))));

        let garbled = vec![vec!["abc".to_string(), "1".to_string()]];
        assert!(matches!(parse_levels(&garbled), Err(AdapterError::Parse(_))));
    }

    #[test]
    fn builds_configured_adapters_in_order() {
        let mut cfg = ArbiterConfig::default();
        cfg.exchanges = vec!["bybit".into(), "mexc".into(), "binance".into()];
        let names: Vec<_> = build(&cfg).unwrap().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["bybit", "mexc", "binance"]);
    }

    #[test]
    fn client_failure_names_the_exchange() {
        let err = ConfigError::HttpClient { exchange: "mexc".into(), source: AdapterError::Status(500) };
        assert_eq!(err.to_string(), "http client for mexc: unexpected status 500");
    }

    #[test]
    fn unknown_exchange_is_a_config_error() {
        let mut cfg = ArbiterConfig::default();
        cfg.exchanges = vec!["kraken".into()];
        assert!(build(&cfg).is_err());
    }
}
