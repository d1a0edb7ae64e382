// src/scoring/scorer.rs
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::{composite, normalize_depth, rank, AggregateError, SourceFailure};
use crate::providers::{AdapterError, Capability, MarketSource};
use crate::types::{ExchangeScore, FundingRate, OrderBookDepth, Spread};

/// Fans a pair out to every configured source and ranks the survivors.
pub struct Scorer {
    sources: Vec<Arc<dyn MarketSource>>,
    call_timeout: Duration,
}

impl Scorer {
    /// Sources sharing a name are collapsed to the first one.
    pub fn new(sources: Vec<Arc<dyn MarketSource>>, call_timeout: Duration) -> Self {
        let mut kept: Vec<Arc<dyn MarketSource>> = Vec::with_capacity(sources.len());
        for src in sources {
            if kept.iter().any(|k| k.name() == src.name()) {
                tracing::warn!(exchange = src.name(), "duplicate source ignored");
                continue;
            }
            kept.push(src);
        }
        Self { sources: kept, call_timeout }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// One cycle for `pair`: every source is awaited before anything is
    /// normalized, and a source is dropped on its first failed call.
    pub async fn score_all(&self, pair: &str) -> Result<Vec<ExchangeScore>, AggregateError> {
        let futs = self.sources.iter().map(|src| self.collect(src.as_ref(), pair));
        let results = join_all(futs).await;
        let attempted = results.len();

        let now = Utc::now().timestamp_millis();
        let mut scores = Vec::with_capacity(attempted);
        let mut failures = Vec::new();
        for res in results {
            match res {
                Ok(mut s) => {
                    s.updated_at_ms = now;
                    scores.push(s);
                }
                Err(f) => {
                    tracing::warn!(
                        pair,
                        exchange = f.exchange,
                        call = %f.call,
                        error = %f.error,
                        "failed to score exchange, skipping"
                    );
                    #[cfg(feature = "metrics")]
                    crate::metrics::SOURCE_FAILURES_TOTAL
                        .with_label_values(&[f.exchange, f.call.as_str()])
                        .inc();
                    failures.push(f);
                }
            }
        }

        if scores.is_empty() {
            return Err(AggregateError { pair: pair.to_string(), attempted, failures });
        }

        normalize_depth(&mut scores);
        for s in scores.iter_mut() {
            s.composite_score = composite(s.funding_rate, s.spread_pct, s.depth_score);
        }
        rank(&mut scores);
        Ok(scores)
    }

    async fn collect(&self, src: &dyn MarketSource, pair: &str) -> Result<ExchangeScore, SourceFailure> {
        let exchange = src.name();
        let (funding, spread, depth) = tokio::try_join!(
            self.bounded(Capability::FundingRate, src.funding_rate(pair)),
            self.bounded(Capability::Spread, src.spread(pair)),
            self.bounded(Capability::Depth, src.order_book_depth(pair)),
        )
        .map_err(|(call, error)| SourceFailure { exchange, call, error })?;

        check_finite(&funding, &spread, &depth)
            .map_err(|(call, error)| SourceFailure { exchange, call, error })?;

        Ok(ExchangeScore {
            exchange: exchange.to_string(),
            pair: pair.to_string(),
            funding_rate: funding.rate,
            spread_pct: spread.pct_of_bid(),
            raw_bid_depth: depth.bid_depth,
            raw_ask_depth: depth.ask_depth,
            depth_score: depth.total(), // raw until normalized
            composite_score: 0.0,
            updated_at_ms: 0,
        })
    }

    async fn bounded<T, F>(&self, call: Capability, fut: F) -> Result<T, (Capability, AdapterError)>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(res) => res.map_err(|e| (call, e)),
            Err(_) => Err((call, AdapterError::Timeout(self.call_timeout))),
        }
    }
}

fn check_finite(
    funding: &FundingRate,
    spread: &Spread,
    depth: &OrderBookDepth,
) -> Result<(), (Capability, AdapterError)> {
    if !funding.rate.is_finite() {
        return Err((Capability::FundingRate, AdapterError::Invalid(format!("funding rate {}", funding.rate))));
    }
    if !spread.bid.is_finite() || !spread.ask.is_finite() {
        return Err((Capability::Spread, AdapterError::Invalid(format!("bid {} ask {}", spread.bid, spread.ask))));
    }
    let sides_ok = |v: f64| v.is_finite() && v >= 0.0;
    // both sides finite can still overflow in the sum
    if !sides_ok(depth.bid_depth) || !sides_ok(depth.ask_depth) || !depth.total().is_finite() {
        return Err((
            Capability::Depth,
            AdapterError::Invalid(format!("depth bid {} ask {}", depth.bid_depth, depth.ask_depth)),
        ));
    }
    Ok(())
}
