// src/types.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    pub exchange: String,
    pub pair: String,       // e.g., "BTCUSDT"
    pub rate: f64,          // signed fraction per interval (e.g. 0.0001 = 0.01%)
    pub next_funding_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub exchange: String,
    pub pair: String,
    pub bid: f64,
    pub ask: f64,
    pub spread: f64, // ask - bid
}

impl Spread {
    pub fn new<S: Into<String>, P: Into<String>>(exchange: S, pair: P, bid: f64, ask: f64) -> Self {
        Self { exchange: exchange.into(), pair: pair.into(), bid, ask, spread: ask - bid }
    }

    /// Spread as a percentage of the bid. Zero when the bid is not positive.
    pub fn pct_of_bid(&self) -> f64 {
        if self.bid > 0.0 {
            self.spread / self.bid * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookDepth {
    pub exchange: String,
    pub pair: String,
    pub bid_depth: f64, // quote notional resting on the buy side
    pub ask_depth: f64, // quote notional resting on the sell side
}

impl OrderBookDepth {
    #[inline]
    pub fn total(&self) -> f64 {
        self.bid_depth + self.ask_depth
    }
}

/// Sum of price × quantity over book levels.
#[inline]
pub fn notional<I>(levels: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    levels.into_iter().map(|(px, qty)| px * qty).sum()
}

/// One exchange's standing for one pair in one refresh cycle.
///
/// `depth_score` is only meaningful relative to the other entries
/// produced in the same cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeScore {
    pub exchange: String,
    pub pair: String,
    pub funding_rate: f64,
    pub spread_pct: f64,
    pub raw_bid_depth: f64,
    pub raw_ask_depth: f64,
    pub depth_score: f64,     // 0..1
    pub composite_score: f64,
    pub updated_at_ms: i64,   // unix ms
}

impl ExchangeScore {
    #[inline]
    pub fn raw_depth(&self) -> f64 {
        self.raw_bid_depth + self.raw_ask_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_pct_is_relative_to_bid() {
        let s = Spread::new("binance", "BTCUSDT", 100.0, 100.05);
        assert!((s.spread - 0.05).abs() < 1e-9);
        assert!((s.pct_of_bid() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn spread_pct_is_zero_without_a_bid() {
        assert_eq!(Spread::new("x", "BTCUSDT", 0.0, 10.0).pct_of_bid(), 0.0);
        assert_eq!(Spread::new("x", "BTCUSDT", -1.0, 10.0).pct_of_bid(), 0.0);
    }

    #[test]
    fn notional_sums_price_times_qty() {
        let levels = vec![(100.0, 2.0), (99.5, 1.0), (99.0, 0.5)];
        assert!((notional(levels) - (200.0 + 99.5 + 49.5)).abs() < 1e-9);
        assert_eq!(notional(Vec::<(f64, f64)>::new()), 0.0);
    }

    #[test]
    fn depth_total_adds_both_sides() {
        let d = OrderBookDepth {
            exchange: "bybit".into(),
            pair: "ETHUSDT".into(),
            bid_depth: 120.0,
            ask_depth: 80.0,
        };
        assert_eq!(d.total(), 200.0);
    }
}
