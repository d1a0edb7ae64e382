// src/cache.rs
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::ExchangeScore;

/// Latest ranked list per pair.
///
/// Lists are published whole and never mutated afterwards, so readers
/// only hold the lock long enough to clone an `Arc`.
#[derive(Clone, Default)]
pub struct ScoreCache {
    inner: Arc<RwLock<HashMap<String, Arc<Vec<ExchangeScore>>>>>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for `pair`.
    pub async fn publish(&self, pair: &str, scores: Vec<ExchangeScore>) {
        let scores = Arc::new(scores);
        self.inner.write().await.insert(pair.to_string(), scores);
    }

    pub async fn get(&self, pair: &str) -> Option<Arc<Vec<ExchangeScore>>> {
        self.inner.read().await.get(pair).cloned()
    }

    /// Every cached pair, sorted by pair name.
    pub async fn snapshot(&self) -> Vec<(String, Arc<Vec<ExchangeScore>>)> {
        let mut all: Vec<_> = self
            .inner
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub async fn pairs(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(exchange: &str, pair: &str, composite: f64) -> ExchangeScore {
        ExchangeScore {
            exchange: exchange.into(),
            pair: pair.into(),
            funding_rate: 0.0001,
            spread_pct: 0.01,
            raw_bid_depth: 1.0,
            raw_ask_depth: 1.0,
            depth_score: 1.0,
            composite_score: composite,
            updated_at_ms: 1,
        }
    }

    #[tokio::test]
    async fn missing_pair_is_none() {
        let cache = ScoreCache::new();
        assert!(cache.get("BTCUSDT").await.is_none());
        assert!(cache.pairs().await.is_empty());
    }

    #[tokio::test]
    async fn publish_replaces_whole_list() {
        let cache = ScoreCache::new();
        cache
            .publish("BTCUSDT", vec![entry("a", "BTCUSDT", 0.9), entry("b", "BTCUSDT", 0.8)])
            .await;
        let before = cache.get("BTCUSDT").await.unwrap();

        cache.publish("BTCUSDT", vec![entry("c", "BTCUSDT", 0.7)]).await;
        let after = cache.get("BTCUSDT").await.unwrap();

        // readers holding the old list keep a consistent view
        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].exchange, "c");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let cache = ScoreCache::new();
        let reader = cache.clone();
        cache.publish("ETHUSDT", vec![entry("a", "ETHUSDT", 0.5)]).await;
        cache.publish("BTCUSDT", vec![entry("a", "BTCUSDT", 0.5)]).await;

        assert_eq!(reader.pairs().await, vec!["BTCUSDT", "ETHUSDT"]);
        let snap = reader.snapshot().await;
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].0, "BTCUSDT");
    }
}
