// src/scoring/mod.rs
use std::cmp::Ordering;
use std::fmt;

use crate::providers::{AdapterError, Capability};
use crate::types::ExchangeScore;

pub mod scorer;

pub use scorer::Scorer;

pub const FUNDING_WEIGHT: f64 = 0.4;
pub const SPREAD_WEIGHT: f64 = 0.4;
pub const DEPTH_WEIGHT: f64 = 0.2;

/// One source dropped from a cycle, and why.
#[derive(Debug)]
pub struct SourceFailure {
    pub exchange: &'static str,
    pub call: Capability,
    pub error: AdapterError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.exchange, self.call, self.error)
    }
}

/// No source survived a cycle for `pair`.
#[derive(thiserror::Error, Debug)]
#[error("no exchange data available for pair {pair} ({} of {attempted} sources failed)", .failures.len())]
pub struct AggregateError {
    pub pair: String,
    pub attempted: usize,
    pub failures: Vec<SourceFailure>,
}

/// Min-max scale raw depth into [0, 1] over this cycle's entries.
/// All-equal depth means no signal: everyone gets 1.0.
pub fn normalize_depth(scores: &mut [ExchangeScore]) {
    let Some(first) = scores.first() else { return };
    let (mut lo, mut hi) = (first.raw_depth(), first.raw_depth());
    for s in scores.iter().skip(1) {
        let d = s.raw_depth();
        lo = lo.min(d);
        hi = hi.max(d);
    }
    for s in scores.iter_mut() {
        s.depth_score = if hi == lo { 1.0 } else { (s.raw_depth() - lo) / (hi - lo) };
    }
}

/// Lower funding and spread are better, so both go through 1/(1+x).
#[inline]
pub fn composite(funding_rate: f64, spread_pct: f64, depth_score: f64) -> f64 {
    FUNDING_WEIGHT * (1.0 / (1.0 + funding_rate * 100.0))
        + SPREAD_WEIGHT * (1.0 / (1.0 + spread_pct))
        + DEPTH_WEIGHT * depth_score
}

/// Highest composite first; ties broken by exchange name.
pub fn rank(scores: &mut [ExchangeScore]) {
    scores.sort_by(|a, b| {
        match b.composite_score.total_cmp(&a.composite_score) {
            Ordering::Equal => a.exchange.cmp(&b.exchange),
            o => o,
        }
    });
}
