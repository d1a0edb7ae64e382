// src/scheduler.rs
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cache::ScoreCache;
use crate::scoring::Scorer;
use crate::types::ExchangeScore;

#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("scheduler already running")]
    AlreadyRunning,
}

/// Everything one refresh pass needs; cloned into the background worker.
#[derive(Clone)]
struct Refresher {
    scorer: Arc<Scorer>,
    pairs: Arc<[String]>,
    cache: ScoreCache,
    parallel_pairs: bool,
    // Serializes passes so a pair is never written by two cycles at once.
    cycle: Arc<Mutex<()>>,
}

impl Refresher {
    async fn refresh(&self) {
        let _cycle = self.cycle.lock().await;
        if self.parallel_pairs {
            join_all(self.pairs.iter().map(|p| self.refresh_pair(p))).await;
        } else {
            for pair in self.pairs.iter() {
                self.refresh_pair(pair).await;
            }
        }
    }

    async fn refresh_pair(&self, pair: &str) {
        #[cfg(feature = "metrics")]
        let _timer = crate::metrics::SCORE_LATENCY.with_label_values(&[pair]).start_timer();

        match self.scorer.score_all(pair).await {
            Ok(scores) => {
                let n = scores.len();
                let best = scores.first().map(|s| s.exchange.clone()).unwrap_or_default();
                self.cache.publish(pair, scores).await;
                #[cfg(feature = "metrics")]
                crate::metrics::REFRESH_TOTAL.with_label_values(&["ok"]).inc();
                tracing::info!(pair, exchanges = n, best = %best, "cache refreshed");
            }
            Err(err) => {
                // previous entry stays; stale beats missing
                #[cfg(feature = "metrics")]
                crate::metrics::REFRESH_TOTAL.with_label_values(&["error"]).inc();
                tracing::error!(pair, error = %err, "scheduler refresh failed");
                for f in &err.failures {
                    tracing::debug!(pair, failure = %f, "source failure");
                }
            }
        }
    }
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Drives the scorer over the tracked pairs on a fixed cadence and owns the cache.
pub struct Scheduler {
    refresher: Refresher,
    interval: Duration,
    worker: Option<Worker>,
}

impl Scheduler {
    pub fn new(scorer: Scorer, pairs: Vec<String>, interval: Duration) -> Self {
        Self {
            refresher: Refresher {
                scorer: Arc::new(scorer),
                pairs: pairs.into(),
                cache: ScoreCache::new(),
                parallel_pairs: false,
                cycle: Arc::new(Mutex::new(())),
            },
            interval,
            worker: None,
        }
    }

    /// Score pairs concurrently within a pass instead of one after another.
    pub fn with_parallel_pairs(mut self, on: bool) -> Self {
        self.refresher.parallel_pairs = on;
        self
    }

    pub fn pairs(&self) -> &[String] {
        &self.refresher.pairs
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Read handle for query surfaces.
    pub fn cache(&self) -> ScoreCache {
        self.refresher.cache.clone()
    }

    /// `None` until the pair has completed one successful cycle.
    pub async fn get_scores(&self, pair: &str) -> Option<Arc<Vec<ExchangeScore>>> {
        self.refresher.cache.get(pair).await
    }

    /// Runs one full pass before returning, then refreshes every `interval`
    /// in the background.
    pub async fn start(&mut self) -> Result<(), SchedulerError> {
        if self.worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.refresher.refresh().await;

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run(self.refresher.clone(), self.interval, rx));
        self.worker = Some(Worker { shutdown: tx, handle });

        tracing::info!(
            interval = ?self.interval,
            pairs = ?self.refresher.pairs,
            exchanges = ?self.refresher.scorer.source_names(),
            "scheduler started"
        );
        Ok(())
    }

    /// Signal the worker and wait for it, including any pass in progress.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else { return };
        let _ = worker.shutdown.send(true);
        if let Err(e) = worker.handle.await {
            tracing::error!(error = %e, "scheduler worker ended abnormally");
        }
        tracing::info!("scheduler stopped");
    }
}

impl Drop for Scheduler {
    // The worker finishes its current pass and exits; nothing waits for it here.
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.shutdown.send(true);
            tracing::warn!("scheduler dropped while running, worker signalled to exit");
        }
    }
}

async fn run(refresher: Refresher, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // a pending stop wins over a due tick
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => refresher.refresh().await,
        }
    }
}
