//! Enrichment orchestrator
//!
//! A phase runs one [`Fetcher`] over every record that still needs it:
//!
//! 1. select records whose field is absent (per [`Fetcher::wants`])
//! 2. fetch them concurrently, at most `max_in_flight` awaited at once; the
//!    fetchers' rate limiters bound the request rate
//! 3. merge each result into the map as it completes, touching only the
//!    phase's field
//! 4. save the whole map to the request cache
//!
//! A failed or panicking fetch only affects its own record: the field stays
//! absent and the next run retries it. When the shutdown signal fires, results
//! already received are merged and saved, and the rest are dropped.

mod progress;
mod shutdown;

pub use shutdown::Shutdown;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use futures::FutureExt;

use crate::cache::RequestCache;
use crate::config::EnrichConfig;
use crate::errors::SnapshotError;
use crate::fetchers::Fetcher;
use crate::logger::{self, LogTag};
use crate::types::{TokenField, TokenMap};

use progress::PhaseProgress;

/// Outcome of one enrichment phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: TokenField,
    /// Records selected for fetching
    pub attempted: usize,
    pub succeeded: usize,
    /// Fetch errors and panics
    pub failed: usize,
    /// Selected records never completed because of shutdown
    pub cancelled: usize,
    pub elapsed: Duration,
}

impl PhaseReport {
    fn empty(phase: TokenField) -> Self {
        Self {
            phase,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            cancelled: 0,
            elapsed: Duration::ZERO,
        }
    }
}

pub struct Enricher {
    cache: RequestCache,
    cache_key: String,
    max_in_flight: usize,
    show_progress: bool,
    shutdown: Shutdown,
}

impl Enricher {
    pub fn new(cache: RequestCache, cache_key: &str, config: &EnrichConfig) -> Self {
        Self {
            cache,
            cache_key: cache_key.to_string(),
            max_in_flight: config.max_in_flight.max(1),
            show_progress: config.show_progress,
            shutdown: Shutdown::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run one fetcher over every record that needs it, then persist the map
    pub async fn run_phase(&self, tokens: &mut TokenMap, fetcher: Arc<dyn Fetcher>) -> PhaseReport {
        let field = fetcher.field();
        let started = Instant::now();

        let selected: Vec<_> = tokens.iter().filter(|r| fetcher.wants(r)).cloned().collect();
        let mut report = PhaseReport::empty(field);
        report.attempted = selected.len();

        if selected.is_empty() {
            logger::info(LogTag::Enrich, &format!("No tokens need {} details", field));
            self.cache.save(&self.cache_key, tokens);
            return report;
        }

        logger::info(
            LogTag::Enrich,
            &format!("Populating {} details for {} tokens...", field, selected.len()),
        );

        let progress = PhaseProgress::new(field.as_str(), selected.len(), self.show_progress);

        let mut results = stream::iter(selected.into_iter().map(|record| {
            let fetcher = fetcher.clone();
            async move {
                let token = record.token.clone();
                let outcome = AssertUnwindSafe(fetcher.fetch(record)).catch_unwind().await;
                (token, outcome)
            }
        }))
        .buffer_unordered(self.max_in_flight);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    logger::warning(LogTag::Enrich, &format!("{} phase interrupted", field));
                    break;
                }
                next = results.next() => next,
            };

            let Some((token, outcome)) = next else {
                break;
            };

            let outcome = outcome.unwrap_or_else(|panic| {
                Err(SnapshotError::Task(format!("panicked: {}", panic_message(&*panic))))
            });

            match outcome {
                Ok(fetched) => {
                    if let Some(stored) = tokens.get_mut(&token) {
                        field.merge(fetched, stored);
                    }
                    report.succeeded += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    let message = format!("{} {} fetch failed: {}", token, field, e);
                    if e.is_recoverable() {
                        logger::warning(LogTag::Enrich, &message);
                    } else {
                        logger::error(LogTag::Enrich, &message);
                    }
                }
            }
            progress.inc();
        }

        drop(results);
        progress.finish();

        report.cancelled = report.attempted - report.succeeded - report.failed;
        report.elapsed = started.elapsed();

        self.cache.save(&self.cache_key, tokens);

        logger::info(
            LogTag::Enrich,
            &format!(
                "{} phase: {} ok, {} failed, {} cancelled --- {:.2} seconds ---",
                field,
                report.succeeded,
                report.failed,
                report.cancelled,
                report.elapsed.as_secs_f64()
            ),
        );

        report
    }

    /// Holder phase
    pub async fn enrich_holders(&self, tokens: &mut TokenMap, holders: Arc<dyn Fetcher>) -> PhaseReport {
        self.run_phase(tokens, holders).await
    }

    /// Metadata phase: on-chain account first, then the off-chain document
    pub async fn enrich_metadata(
        &self,
        tokens: &mut TokenMap,
        account: Arc<dyn Fetcher>,
        offchain: Arc<dyn Fetcher>,
    ) -> Vec<PhaseReport> {
        let mut reports = vec![self.run_phase(tokens, account).await];
        if !self.shutdown.is_triggered() {
            reports.push(self.run_phase(tokens, offchain).await);
        }
        reports
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::testing::{FakeHttp, FakeLedger};
    use crate::fetchers::{AccountFetcher, HolderFetcher, OffChainFetcher};
    use crate::metadata::derive_metadata_pda;
    use crate::metadata::tests::encode_metadata;
    use crate::rpc::ExponentialBackoff;
    use solana_sdk::pubkey::Pubkey;
    use tempfile::TempDir;

    fn enricher(dir: &TempDir) -> Enricher {
        let config = EnrichConfig {
            max_in_flight: 4,
            show_progress: false,
        };
        Enricher::new(RequestCache::new(dir.path()), "test", &config)
    }

    #[tokio::test]
    async fn holder_phase_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mints: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        let mut ledger = FakeLedger::default();
        for mint in &mints {
            ledger = ledger.with_holder(mint, &Pubkey::new_unique(), "Owner");
        }
        let ledger = Arc::new(ledger);
        let fetcher: Arc<dyn Fetcher> = Arc::new(HolderFetcher::new(ledger.clone()));

        let mut tokens = TokenMap::new();
        tokens.seed(mints.iter().map(|m| m.to_string()));
        let enricher = enricher(&dir);

        let first = enricher.enrich_holders(&mut tokens, fetcher.clone()).await;
        assert_eq!(first.attempted, 5);
        assert_eq!(first.succeeded, 5);
        let calls = ledger.calls();
        let snapshot = tokens.clone();

        let second = enricher.enrich_holders(&mut tokens, fetcher).await;
        assert_eq!(second.attempted, 0);
        assert_eq!(ledger.calls(), calls);
        assert_eq!(tokens, snapshot);

        // Persisted after the phase
        assert_eq!(RequestCache::new(dir.path()).load("test"), tokens);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let dir = TempDir::new().unwrap();
        let good = Pubkey::new_unique();
        let failing = Pubkey::new_unique();
        let panicking = Pubkey::new_unique();

        let mut ledger = FakeLedger::default().with_holder(&good, &Pubkey::new_unique(), "Owner");
        ledger.failing.push(failing.to_string());
        ledger.panicking.push(panicking.to_string());
        let fetcher: Arc<dyn Fetcher> = Arc::new(HolderFetcher::new(Arc::new(ledger)));

        let mut tokens = TokenMap::new();
        tokens.seed([good.to_string(), failing.to_string(), panicking.to_string()]);

        let report = enricher(&dir).run_phase(&mut tokens, fetcher).await;
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.cancelled, 0);

        assert_eq!(tokens.get(&good.to_string()).unwrap().holder_address(), "Owner");
        assert!(tokens.get(&failing.to_string()).unwrap().holders.is_none());
        assert!(tokens.get(&panicking.to_string()).unwrap().holders.is_none());
        assert_eq!(tokens.len(), 3);
    }

    #[tokio::test]
    async fn shutdown_skips_pending_and_still_saves() {
        let dir = TempDir::new().unwrap();
        let mint = Pubkey::new_unique();
        let ledger = Arc::new(FakeLedger::default().with_holder(&mint, &Pubkey::new_unique(), "Owner"));
        let fetcher: Arc<dyn Fetcher> = Arc::new(HolderFetcher::new(ledger.clone()));

        let mut tokens = TokenMap::new();
        tokens.seed([mint.to_string()]);

        let enricher = enricher(&dir);
        enricher.shutdown().trigger();
        let report = enricher.run_phase(&mut tokens, fetcher).await;

        assert_eq!(report.attempted, 1);
        assert_eq!(report.cancelled, 1);
        assert_eq!(ledger.calls(), 0);
        assert!(RequestCache::new(dir.path()).path_for("test").exists());
    }

    #[tokio::test]
    async fn metadata_phases_run_account_then_offchain() {
        let dir = TempDir::new().unwrap();
        let with_uri = Pubkey::new_unique();
        let without_uri = Pubkey::new_unique();

        let mut ledger = FakeLedger::default();
        ledger.raw.insert(
            derive_metadata_pda(&with_uri).unwrap().to_string(),
            encode_metadata(&with_uri, "Token #1", "https://host/1.json"),
        );
        ledger.raw.insert(
            derive_metadata_pda(&without_uri).unwrap().to_string(),
            encode_metadata(&without_uri, "Token #2", ""),
        );
        let ledger: Arc<FakeLedger> = Arc::new(ledger);
        let http = Arc::new(FakeHttp::default().respond(
            "https://host/1.json",
            200,
            r#"{"attributes": [{"trait_type": "Eyes", "value": "Blue"}]}"#,
        ));

        let account: Arc<dyn Fetcher> = Arc::new(AccountFetcher::new(ledger.clone()));
        let offchain: Arc<dyn Fetcher> = Arc::new(OffChainFetcher::new(
            http.clone(),
            ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(1), 1),
        ));

        let mut tokens = TokenMap::new();
        tokens.seed([with_uri.to_string(), without_uri.to_string()]);

        let reports = enricher(&dir).enrich_metadata(&mut tokens, account, offchain).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].succeeded, 2);
        assert_eq!(reports[1].succeeded, 2);
        assert_eq!(http.calls(), 1);

        let first = tokens.get(&with_uri.to_string()).unwrap();
        assert_eq!(first.arweave.as_ref().unwrap().non_empty_attributes().unwrap().len(), 1);
        let second = tokens.get(&without_uri.to_string()).unwrap();
        assert!(second.arweave.as_ref().unwrap().is_empty());
        // Holder field untouched by metadata phases
        assert!(second.holders.is_none());
    }
}
