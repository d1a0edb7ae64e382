// src/providers/fake.rs
//
// Scriptable MarketSource for scorer/scheduler tests.
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{AdapterError, Capability, MarketSource};
use crate::types::{FundingRate, OrderBookDepth, Spread};

pub struct FakeSource {
    pub name: &'static str,
    pub funding: f64,
    pub bid: f64,
    pub ask: f64,
    pub bid_depth: f64,
    pub ask_depth: f64,
    pub delay: Duration,
    /// Capabilities that return an error.
    pub failing: Mutex<Vec<Capability>>,
    /// When set, every call fails.
    pub down: AtomicBool,
    /// When set, funding = base funding × number of funding calls so far.
    pub count_funding: bool,
    pub funding_calls: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeSource {
    /// spread_pct is relative to a bid of 100.
    pub fn new(name: &'static str, funding: f64, spread_pct: f64, depth: f64) -> Self {
        Self {
            name,
            funding,
            bid: 100.0,
            ask: 100.0 + spread_pct,
            bid_depth: depth / 2.0,
            ask_depth: depth / 2.0,
            delay: Duration::ZERO,
            failing: Mutex::new(Vec::new()),
            down: AtomicBool::new(false),
            count_funding: false,
            funding_calls: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(self, cap: Capability) -> Self {
        self.failing.lock().unwrap().push(cap);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn counting_funding(mut self) -> Self {
        self.count_funding = true;
        self
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    async fn enter(&self, cap: Capability) -> Result<(), AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.down.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&cap) {
            return Err(AdapterError::Exchange { code: -1, msg: format!("{} {cap} scripted failure", self.name) });
        }
        Ok(())
    }
}

#[async_trait]
impl MarketSource for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn funding_rate(&self, pair: &str) -> Result<FundingRate, AdapterError> {
        let n = self.funding_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.enter(Capability::FundingRate).await?;
        let rate = if self.count_funding { self.funding * n as f64 } else { self.funding };
        Ok(FundingRate {
            exchange: self.name.to_string(),
            pair: pair.to_string(),
            rate,
            next_funding_ms: 0,
        })
    }

    async fn spread(&self, pair: &str) -> Result<Spread, AdapterError> {
        self.enter(Capability::Spread).await?;
        Ok(Spread::new(self.name, pair, self.bid, self.ask))
    }

    async fn order_book_depth(&self, pair: &str) -> Result<OrderBookDepth, AdapterError> {
        self.enter(Capability::Depth).await?;
        Ok(OrderBookDepth {
            exchange: self.name.to_string(),
            pair: pair.to_string(),
            bid_depth: self.bid_depth,
            ask_depth: self.ask_depth,
        })
    }
}
