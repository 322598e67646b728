//! Per-year memoization of bracket schedules.
//!
//! [`RateCache`] sits in front of a [`RateProvider`] and remembers every
//! schedule it has fetched for the lifetime of the cache. Concurrent lookups
//! of the same uncached year share a single provider call. Failures are
//! never cached, so the next lookup of a failed year fetches again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use super::provider::RateProvider;
use crate::models::TaxBracketSet;

/// Message used when a provider fails without saying why.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to fetch tax rates";

/// Progress of the most recent provider call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl RateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Observable cache state: the request status and the last failure message.
///
/// The error is cleared when a new fetch starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateState {
    pub status: RateStatus,
    pub error: Option<String>,
}

/// A rate lookup failed in the provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RateLookupError {
    pub tax_year: i32,
    pub message: String,
}

type Entries = HashMap<i32, Arc<OnceCell<TaxBracketSet>>>;

pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    entries: Mutex<Entries>,
    state: watch::Sender<RateState>,
}

impl RateCache {
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        let (state, _) = watch::channel(RateState::default());
        Self {
            provider,
            entries: Mutex::new(HashMap::new()),
            state,
        }
    }

    /// Returns the bracket schedule for `tax_year`, fetching it on first use.
    ///
    /// A cached year resolves without touching the provider. Otherwise the
    /// status moves to [`RateStatus::Loading`] and then to
    /// [`RateStatus::Succeeded`] or [`RateStatus::Failed`].
    pub async fn get_brackets(
        &self,
        tax_year: i32,
    ) -> Result<TaxBracketSet, RateLookupError> {
        let cell = self.entry(tax_year);
        if let Some(set) = cell.get() {
            debug!(tax_year, "tax brackets served from cache");
            return Ok(set.clone());
        }

        match cell.get_or_try_init(|| self.fetch(tax_year)).await {
            Ok(set) => Ok(set.clone()),
            Err(error) => {
                self.forget_failed(tax_year, &cell);
                Err(error)
            }
        }
    }

    /// Snapshot of the current status.
    pub fn state(&self) -> RateState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<RateState> {
        self.state.subscribe()
    }

    pub fn is_cached(
        &self,
        tax_year: i32,
    ) -> bool {
        self.lock_entries()
            .get(&tax_year)
            .is_some_and(|cell| cell.initialized())
    }

    /// Years with a stored schedule, ascending. Failed years are not kept.
    pub fn cached_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .lock_entries()
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(year, _)| *year)
            .collect();
        years.sort_unstable();
        years
    }

    fn entry(
        &self,
        tax_year: i32,
    ) -> Arc<OnceCell<TaxBracketSet>> {
        self.lock_entries().entry(tax_year).or_default().clone()
    }

    /// Drops the empty cell of a failed year once no waiter still holds it,
    /// so years that never resolve do not accumulate.
    fn forget_failed(
        &self,
        tax_year: i32,
        cell: &Arc<OnceCell<TaxBracketSet>>,
    ) {
        let mut entries = self.lock_entries();
        // One reference is the map's, the other is ours.
        let unshared = Arc::strong_count(cell) == 2;
        let current = entries.get(&tax_year).is_some_and(|c| Arc::ptr_eq(c, cell));
        if unshared && current && !cell.initialized() {
            entries.remove(&tax_year);
        }
    }

    fn set_state(
        &self,
        status: RateStatus,
        error: Option<String>,
    ) {
        debug!(status = status.as_str(), "rate status changed");
        self.state.send_replace(RateState { status, error });
    }

    fn lock_entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(
        &self,
        tax_year: i32,
    ) -> Result<TaxBracketSet, RateLookupError> {
        self.set_state(RateStatus::Loading, None);
        info!(tax_year, "fetching tax brackets");

        match self.provider.fetch_brackets(tax_year).await {
            Ok(set) => {
                info!(tax_year, brackets = set.len(), "tax brackets cached");
                self.set_state(RateStatus::Succeeded, None);
                Ok(set)
            }
            Err(error) => {
                warn!(tax_year, %error, "tax bracket lookup failed");
                let message = match error.to_string() {
                    m if m.trim().is_empty() => FALLBACK_ERROR_MESSAGE.to_string(),
                    m => m,
                };
                self.set_state(RateStatus::Failed, Some(message.clone()));
                Err(RateLookupError { tax_year, message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TaxBracket;
    use crate::rates::provider::ProviderError;

    fn schedule(tax_year: i32) -> TaxBracketSet {
        TaxBracketSet::new(
            tax_year,
            vec![
                TaxBracket::new(dec!(0), Some(dec!(48535)), dec!(0.15)),
                TaxBracket::new(dec!(48535), None, dec!(0.205)),
            ],
        )
    }

    /// Replays scripted outcomes in order, counting every call. Once the
    /// script runs out every call succeeds.
    #[derive(Default)]
    struct ScriptedProvider {
        calls: AtomicUsize,
        script: Mutex<VecDeque<Result<(), ProviderError>>>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn failing_once(error: ProviderError) -> Self {
            Self {
                script: Mutex::new(VecDeque::from([Err(error)])),
                ..Self::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn with_delay(
            mut self,
            delay: Duration,
        ) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for ScriptedProvider {
        async fn fetch_brackets(
            &self,
            tax_year: i32,
        ) -> Result<TaxBracketSet, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Err(error)) => Err(error),
                _ => Ok(schedule(tax_year)),
            }
        }
    }

    #[tokio::test]
    async fn new_cache_is_idle_and_empty() {
        let cache = RateCache::new(Arc::new(ScriptedProvider::default()));

        assert_eq!(cache.state(), RateState::default());
        assert_eq!(cache.state().status.as_str(), "idle");
        assert!(cache.cached_years().is_empty());
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let provider = Arc::new(ScriptedProvider::default());
        let cache = RateCache::new(provider.clone());

        let first = cache.get_brackets(2020).await.unwrap();
        let second = cache.get_brackets(2020).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.tax_year(), 2020);
        assert_eq!(cache.state().status, RateStatus::Succeeded);
        assert!(cache.is_cached(2020));
    }

    #[tokio::test]
    async fn each_year_is_fetched_separately() {
        let provider = Arc::new(ScriptedProvider::default());
        let cache = RateCache::new(provider.clone());

        cache.get_brackets(2021).await.unwrap();
        cache.get_brackets(2019).await.unwrap();
        cache.get_brackets(2021).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.cached_years(), vec![2019, 2021]);
    }

    #[tokio::test]
    async fn failure_is_reported_and_not_cached() {
        let provider = Arc::new(ScriptedProvider::failing_once(ProviderError::Unavailable));
        let cache = RateCache::new(provider.clone());

        let error = cache.get_brackets(2022).await.unwrap_err();

        assert_eq!(error.tax_year, 2022);
        assert_eq!(error.message, "Failed to fetch tax rates. Please try again later.");
        assert_eq!(
            cache.state(),
            RateState {
                status: RateStatus::Failed,
                error: Some(error.message.clone()),
            }
        );
        assert!(!cache.is_cached(2022));
        assert!(cache.lock_entries().is_empty());

        let retried = cache.get_brackets(2022).await;

        assert!(retried.is_ok());
        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.state().status, RateStatus::Succeeded);
        assert_eq!(cache.state().error, None);
    }

    #[tokio::test]
    async fn provider_message_is_carried_to_caller() {
        let provider = ScriptedProvider::failing_once(ProviderError::NotFound(2018));
        let cache = RateCache::new(Arc::new(provider));

        let error = cache.get_brackets(2018).await.unwrap_err();

        assert_eq!(error.to_string(), "No tax brackets available for 2018");
    }

    #[tokio::test]
    async fn empty_provider_message_falls_back() {
        let provider = ScriptedProvider::failing_once(ProviderError::Other(String::new()));
        let cache = RateCache::new(Arc::new(provider));

        let error = cache.get_brackets(2020).await.unwrap_err();

        assert_eq!(error.message, FALLBACK_ERROR_MESSAGE);
        assert_eq!(cache.state().error.as_deref(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn subscribers_observe_loading_then_success() {
        let provider = Arc::new(ScriptedProvider::slow(Duration::from_millis(50)));
        let cache = Arc::new(RateCache::new(provider));
        let mut updates = cache.subscribe();

        let lookup = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_brackets(2019).await }
        });

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().status, RateStatus::Loading);

        lookup.await.unwrap().unwrap();
        assert_eq!(cache.state().status, RateStatus::Succeeded);
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let provider = Arc::new(ScriptedProvider::slow(Duration::from_millis(50)));
        let cache = Arc::new(RateCache::new(provider.clone()));

        let lookups: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_brackets(2020).await })
            })
            .collect();

        for lookup in lookups {
            assert_eq!(lookup.await.unwrap().unwrap().tax_year(), 2020);
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_waiters_refetch_after_failed_fetch() {
        let provider = Arc::new(
            ScriptedProvider::failing_once(ProviderError::Unavailable)
                .with_delay(Duration::from_millis(30)),
        );
        let cache = Arc::new(RateCache::new(provider.clone()));

        let lookups: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_brackets(2020).await })
            })
            .collect();

        let mut failures = 0;
        for lookup in lookups {
            match lookup.await.unwrap() {
                Ok(set) => assert_eq!(set.tax_year(), 2020),
                Err(error) => {
                    assert_eq!(error.tax_year, 2020);
                    failures += 1;
                }
            }
        }

        assert_eq!(failures, 1);
        assert_eq!(provider.calls(), 2);
        assert_eq!(
            cache.state(),
            RateState {
                status: RateStatus::Succeeded,
                error: None,
            }
        );
        assert_eq!(cache.cached_years(), vec![2020]);
    }

    #[tokio::test]
    async fn years_that_keep_failing_are_not_retained() {
        let provider = Arc::new(ScriptedProvider {
            script: Mutex::new(
                (0..3)
                    .map(|offset| Err(ProviderError::NotFound(1900 + offset)))
                    .collect(),
            ),
            ..ScriptedProvider::default()
        });
        let cache = RateCache::new(provider.clone());

        for year in 1900..1903 {
            assert!(cache.get_brackets(year).await.is_err());
        }

        assert_eq!(provider.calls(), 3);
        assert!(cache.lock_entries().is_empty());
        assert!(cache.cached_years().is_empty());
    }
}
