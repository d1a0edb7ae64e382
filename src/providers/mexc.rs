// src/providers/mexc.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{http, AdapterError, MarketSource};
use crate::types::{notional, FundingRate, OrderBookDepth, Spread};

const BASE_URL: &str = "https://contract.mexc.com";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, AdapterError> {
        if !self.success || self.code != 0 {
            return Err(AdapterError::Exchange {
                code: self.code,
                msg: self.message.unwrap_or_default(),
            });
        }
        self.data.ok_or_else(|| AdapterError::Parse("missing `data`".into()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundingData {
    funding_rate: f64,
    next_settle_time: i64,
}

#[derive(Debug, Deserialize)]
struct TickerData {
    bid1: f64,
    ask1: f64,
}

// Levels are [price, contracts, order_count].
#[derive(Debug, Deserialize)]
struct DepthData {
    #[serde(default)]
    bids: Vec<Vec<f64>>,
    #[serde(default)]
    asks: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractDetail {
    contract_size: f64,
}

/// `BTCUSDT` -> `BTC_USDT`; anything else passes through.
pub fn to_mexc_symbol(pair: &str) -> String {
    match pair.strip_suffix("USDT") {
        Some(base) if !base.is_empty() && !base.ends_with('_') => format!("{base}_USDT"),
        _ => pair.to_string(),
    }
}

/// MEXC USDT-margined perpetual contracts.
///
/// Book sizes are quoted in contracts, so depth needs the per-symbol
/// contract size; it is fetched once and kept for the adapter's lifetime.
pub struct MexcAdapter {
    http: reqwest::Client,
    base_url: String,
    depth_levels: u32,
    contract_sizes: RwLock<HashMap<String, f64>>,
}

impl MexcAdapter {
    pub fn new(api_key: String, timeout: Duration, depth_levels: u32) -> Result<Self, AdapterError> {
        Self::with_base_url(api_key, timeout, depth_levels, BASE_URL)
    }

    pub fn with_base_url<S: Into<String>>(
        api_key: String,
        timeout: Duration,
        depth_levels: u32,
        base_url: S,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            http: http::client(timeout, Some(("apikey", &api_key)))?,
            base_url: base_url.into(),
            depth_levels,
            contract_sizes: RwLock::new(HashMap::new()),
        })
    }

    async fn contract_size(&self, symbol: &str) -> Result<f64, AdapterError> {
        if let Some(sz) = self.contract_sizes.read().await.get(symbol) {
            return Ok(*sz);
        }
        let url = format!("{}/api/v1/contract/detail?symbol={symbol}", self.base_url);
        let env: Envelope<ContractDetail> = http::get_json(&self.http, &url).await?;
        let size = env.into_data()?.contract_size;
        if !size.is_finite() || size <= 0.0 {
            return Err(AdapterError::Invalid(format!("contract size {size} for {symbol}")));
        }
        self.contract_sizes.write().await.insert(symbol.to_string(), size);
        Ok(size)
    }

    fn levels(&self, raw: &[Vec<f64>], contract_size: f64) -> Result<Vec<(f64, f64)>, AdapterError> {
        raw.iter()
            .take(self.depth_levels as usize)
            .map(|lvl| match lvl.as_slice() {
                [px, contracts, ..] => Ok((*px, contracts * contract_size)),
                _ => Err(AdapterError::Parse(format!("short book level {lvl:?}"))),
            })
            .collect()
    }
}

#[async_trait]
impl MarketSource for MexcAdapter {
    fn name(&self) -> &'static str {
        "mexc"
    }

    async fn funding_rate(&self, pair: &str) -> Result<FundingRate, AdapterError> {
        let url = format!("{}/api/v1/contract/funding_rate/{}", self.base_url, to_mexc_symbol(pair));
        let env: Envelope<FundingData> = http::get_json(&self.http, &url).await?;
        let d = env.into_data()?;
        Ok(FundingRate {
            exchange: self.name().to_string(),
            pair: pair.to_string(),
            rate: d.funding_rate,
            next_funding_ms: d.next_settle_time,
        })
    }

    async fn spread(&self, pair: &str) -> Result<Spread, AdapterError> {
        let url = format!("{}/api/v1/contract/ticker?symbol={}", self.base_url, to_mexc_symbol(pair));
        let env: Envelope<TickerData> = http::get_json(&self.http, &url).await?;
        let t = env.into_data()?;
        Ok(Spread::new(self.name(), pair, t.bid1, t.ask1))
    }

    async fn order_book_depth(&self, pair: &str) -> Result<OrderBookDepth, AdapterError> {
        let symbol = to_mexc_symbol(pair);
        let contract_size = self.contract_size(&symbol).await?;
        let url = format!(
            "{}/api/v1/contract/depth/{symbol}?limit={}",
            self.base_url, self.depth_levels
        );
        let env: Envelope<DepthData> = http::get_json(&self.http, &url).await?;
        let d = env.into_data()?;
        Ok(OrderBookDepth {
            exchange: self.name().to_string(),
            pair: pair.to_string(),
            bid_depth: notional(self.levels(&d.bids, contract_size)?),
            ask_depth: notional(self.levels(&d.asks, contract_size)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn adapter(server: &MockServer) -> MexcAdapter {
        MexcAdapter::with_base_url(String::new(), Duration::from_secs(2), 5, server.base_url()).unwrap()
    }

    #[test]
    fn symbol_mapping() {
        assert_eq!(to_mexc_symbol("BTCUSDT"), "BTC_USDT");
        assert_eq!(to_mexc_symbol("SOLUSDT"), "SOL_USDT");
        assert_eq!(to_mexc_symbol("USDT"), "USDT");
        assert_eq!(to_mexc_symbol("BTC_USDT"), "BTC_USDT");
        assert_eq!(to_mexc_symbol("ETHUSDC"), "ETHUSDC");
    }

    #[tokio::test]
    async fn funding_rate_uses_next_settle_time() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/contract/funding_rate/BTC_USDT");
                then.status(200).json_body(json!({
                    "success": true, "code": 0,
                    "data": {
                        "symbol": "BTC_USDT", "fundingRate": 0.00012,
                        "collectCycle": 8, "nextSettleTime": 1700006400000i64
                    }
                }));
            })
            .await;

        let fr = adapter(&server).funding_rate("BTCUSDT").await.unwrap();
        assert_eq!(fr.pair, "BTCUSDT");
        assert!((fr.rate - 0.00012).abs() < 1e-12);
        assert_eq!(fr.next_funding_ms, 1_700_006_400_000);
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_an_exchange_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/contract/ticker");
                then.status(200).json_body(json!({
                    "success": false, "code": 1001, "message": "contract not exists"
                }));
            })
            .await;

        let err = adapter(&server).spread("NOPEUSDT").await.unwrap_err();
        assert!(matches!(err, AdapterError::Exchange { code: 1001, .. }));
    }

    #[tokio::test]
    async fn depth_converts_contracts_to_notional_and_caches_size() {
        let server = MockServer::start_async().await;
        let detail = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/contract/detail")
                    .query_param("symbol", "BTC_USDT");
                then.status(200).json_body(json!({
                    "success": true, "code": 0,
                    "data": {"symbol": "BTC_USDT", "contractSize": 0.0001}
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/contract/depth/BTC_USDT");
                then.status(200).json_body(json!({
                    "success": true, "code": 0,
                    "data": {
                        "bids": [[60000.0, 10000.0, 3.0]],
                        "asks": [[60010.0, 5000.0, 1.0], [60020.0, 5000.0, 2.0]]
                    }
                }));
            })
            .await;

        let a = adapter(&server);
        let d = a.order_book_depth("BTCUSDT").await.unwrap();
        // 10_000 contracts * 0.0001 BTC = 1 BTC on the bid.
        assert!((d.bid_depth - 60_000.0).abs() < 1e-6);
        assert!((d.ask_depth - (30_005.0 + 30_010.0)).abs() < 1e-6);

        a.order_book_depth("BTCUSDT").await.unwrap();
        detail.assert_hits_async(1).await;
    }
}
