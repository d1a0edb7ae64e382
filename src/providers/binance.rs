// src/providers/binance.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{http, parse_f64, parse_levels, AdapterError, MarketSource};
use crate::types::{notional, FundingRate, OrderBookDepth, Spread};

const BASE_URL: &str = "https://fapi.binance.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndex {
    last_funding_rate: String,
    next_funding_time: i64, // unix ms
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicker {
    bid_price: String,
    ask_price: String,
}

#[derive(Debug, Deserialize)]
struct Depth {
    bids: Vec<Vec<String>>, // [price, qty]
    asks: Vec<Vec<String>>,
}

/// Binance USDⓈ-M perpetual futures.
pub struct BinanceAdapter {
    http: reqwest::Client,
    base_url: String,
    depth_levels: u32,
}

impl BinanceAdapter {
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
            http: http::client(timeout, Some(("x-mbx-apikey", &api_key)))?,
            base_url: base_url.into(),
            depth_levels,
        })
    }

    /// Futures depth only accepts a fixed set of limits.
    fn depth_limit(&self) -> u32 {
        const VALID: [u32; 7] = [5, 10, 20, 50, 100, 500, 1000];
        VALID.iter().copied().find(|l| *l >= self.depth_levels).unwrap_or(1000)
    }
}

#[async_trait]
impl MarketSource for BinanceAdapter {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn funding_rate(&self, pair: &str) -> Result<FundingRate, AdapterError> {
        let url = format!("{}/fapi/v1/premiumIndex?symbol={pair}", self.base_url);
        let raw: PremiumIndex = http::get_json(&self.http, &url).await?;
        Ok(FundingRate {
            exchange: self.name().to_string(),
            pair: pair.to_string(),
            rate: parse_f64("lastFundingRate", &raw.last_funding_rate)?,
            next_funding_ms: raw.next_funding_time,
        })
    }

    async fn spread(&self, pair: &str) -> Result<Spread, AdapterError> {
        let url = format!("{}/fapi/v1/ticker/bookTicker?symbol={pair}", self.base_url);
        let raw: BookTicker = http::get_json(&self.http, &url).await?;
        let bid = parse_f64("bidPrice", &raw.bid_price)?;
        let ask = parse_f64("askPrice", &raw.ask_price)?;
        Ok(Spread::new(self.name(), pair, bid, ask))
    }

    async fn order_book_depth(&self, pair: &str) -> Result<OrderBookDepth, AdapterError> {
        let url = format!("{}/fapi/v1/depth?symbol={pair}&limit={}", self.base_url, self.depth_limit());
        let raw: Depth = http::get_json(&self.http, &url).await?;
        let top = self.depth_levels as usize;
        let bids = parse_levels(&raw.bids)?;
        let asks = parse_levels(&raw.asks)?;
        Ok(OrderBookDepth {
            exchange: self.name().to_string(),
            pair: pair.to_string(),
            bid_depth: notional(bids.into_iter().take(top)),
            ask_depth: notional(asks.into_iter().take(top)),
        })
    }
}
