// src/providers/bybit.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{http, parse_f64, parse_levels, AdapterError, MarketSource};
use crate::types::{notional, FundingRate, OrderBookDepth, Spread};

const BASE_URL: &str = "https://api.bybit.com";

/// Every v5 response is wrapped in a retCode/result envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, AdapterError> {
        if self.ret_code != 0 {
            return Err(AdapterError::Exchange { code: self.ret_code, msg: self.ret_msg });
        }
        self.result
            .ok_or_else(|| AdapterError::Parse("missing `result`".into()))
    }
}

#[derive(Debug, Deserialize)]
struct TickerList {
    #[serde(default)]
    list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    #[serde(default)]
    funding_rate: String,
    #[serde(default)]
    next_funding_time: String,
    bid1_price: String,
    ask1_price: String,
}

#[derive(Debug, Deserialize)]
struct Book {
    #[serde(rename = "b", default)]
    bids: Vec<Vec<String>>,
    #[serde(rename = "a", default)]
    asks: Vec<Vec<String>>,
}

/// Bybit v5 linear perpetuals.
pub struct BybitAdapter {
    http: reqwest::Client,
    base_url: String,
    depth_levels: u32,
}

impl BybitAdapter {
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
            http: http::client(timeout, Some(("x-bapi-api-key", &api_key)))?,
            base_url: base_url.into(),
            depth_levels,
        })
    }

    async fn ticker(&self, pair: &str) -> Result<Ticker, AdapterError> {
        let url = format!("{}/v5/market/tickers?category=linear&symbol={pair}", self.base_url);
        let env: Envelope<TickerList> = http::get_json(&self.http, &url).await?;
        env.into_result()?
            .list
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::Empty(pair.to_string()))
    }
}

#[async_trait]
impl MarketSource for BybitAdapter {
    fn name(&self) -> &'static str {
        "bybit"
    }

    async fn funding_rate(&self, pair: &str) -> Result<FundingRate, AdapterError> {
        let t = self.ticker(pair).await?;
        let next_funding_ms = t
            .next_funding_time
            .trim()
            .parse::<i64>()
            .map_err(|e| AdapterError::Parse(format!("nextFundingTime={:?}: {e}", t.next_funding_time)))?;
        Ok(FundingRate {
            exchange: self.name().to_string(),
            pair: pair.to_string(),
            rate: parse_f64("fundingRate", &t.funding_rate)?,
            next_funding_ms,
        })
    }

    async fn spread(&self, pair: &str) -> Result<Spread, AdapterError> {
        let t = self.ticker(pair).await?;
        let bid = parse_f64("bid1Price", &t.bid1_price)?;
        let ask = parse_f64("ask1Price", &t.ask1_price)?;
        Ok(Spread::new(self.name(), pair, bid, ask))
    }

    async fn order_book_depth(&self, pair: &str) -> Result<OrderBookDepth, AdapterError> {
        let url = format!(
            "{}/v5/market/orderbook?category=linear&symbol={pair}&limit={}",
            self.base_url, self.depth_levels
        );
        let env: Envelope<Book> = http::get_json(&self.http, &url).await?;
        let book = env.into_result()?;
        let top = self.depth_levels as usize;
        Ok(OrderBookDepth {
            exchange: self.name().to_string(),
            pair: pair.to_string(),
            bid_depth: notional(parse_levels(&book.bids)?.into_iter().take(top)),
            ask_depth: notional(parse_levels(&book.asks)?.into_iter().take(top)),
        })
    }
}
