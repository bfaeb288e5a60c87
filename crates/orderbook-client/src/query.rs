//! Keyed cache of backend reads.
//!
//! - The mutex is never locked while a request is in flight, so reading a
//!   cached entry never waits on the network.
//! - Concurrent fetches of one key share a single request.
//! - Entries are replaced whole. A failed fetch keeps the last good value and
//!   only records the error next to it.
//! - A response to a request that started before the entry was invalidated or
//!   set never counts as fresh, and later reads do not join that request.
//! - Entries nobody read for the retention period are dropped.

use {
    crate::{
        error::ApiError,
        request_sharing::{BoxRequestSharing, RequestSharing},
    },
    futures::FutureExt,
    prometheus::IntCounterVec,
    std::{
        collections::HashMap,
        fmt::Debug,
        future::Future,
        hash::Hash,
        sync::{Arc, Mutex},
        time::Duration,
    },
    tokio::time::Instant,
};

/// How long entries survive without being read, unless configured otherwise.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

/// Bounds every cache key has to satisfy.
pub trait QueryKey: Clone + Debug + Eq + Hash + Send + Sync + 'static {}

impl<T: Clone + Debug + Eq + Hash + Send + Sync + 'static> QueryKey for T {}

/// Snapshot of one cache entry.
#[derive(Debug)]
pub struct Cached<V> {
    /// Last successfully fetched value.
    pub value: Option<Arc<V>>,
    pub fetched_at: Option<Instant>,
    /// Error of the most recent fetch if it failed.
    pub error: Option<ApiError>,
    pub invalidated: bool,
    generation: u64,
    last_read: Instant,
}

impl<V> Default for Cached<V> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            error: None,
            invalidated: false,
            generation: 0,
            last_read: Instant::now(),
        }
    }
}

impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            fetched_at: self.fetched_at,
            error: self.error.clone(),
            invalidated: self.invalidated,
            generation: self.generation,
            last_read: self.last_read,
        }
    }
}

impl<V> Cached<V> {
    fn refresh(&mut self, value: Arc<V>, invalidated: bool) {
        self.value = Some(value);
        self.fetched_at = Some(Instant::now());
        self.error = None;
        self.invalidated = invalidated;
    }

    /// Time since the value was fetched.
    pub fn age(&self) -> Option<Duration> {
        self.fetched_at.map(|fetched_at| fetched_at.elapsed())
    }

    /// Whether the entry has to be fetched again before it can be trusted.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.value.is_none()
            || self.invalidated
            || self.error.is_some()
            || self.age().is_none_or(|age| age > max_age)
    }
}

/// Entries plus the counter that orders invalidations. Every `invalidate`
/// and `set` stamps its entry with a new counter value, `invalidate_all`
/// records it for the whole cache. A fetch may only store a fresh value if
/// the generation of its key did not move while it was in flight.
struct State<K, V> {
    entries: HashMap<K, Cached<V>>,
    counter: u64,
    invalidated_all: u64,
}

impl<K, V> Default for State<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            counter: 0,
            invalidated_all: 0,
        }
    }
}

impl<K: QueryKey, V> State<K, V> {
    fn generation(&self, key: &K) -> u64 {
        let entry = self.entries.get(key).map_or(0, |cached| cached.generation);
        entry.max(self.invalidated_all)
    }

    fn next_generation(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    fn read(&mut self, key: &K) -> Option<&Cached<V>> {
        let cached = self.entries.get_mut(key)?;
        cached.last_read = Instant::now();
        Some(cached)
    }

    fn prune(&mut self, retention: Duration) {
        self.entries
            .retain(|_, cached| cached.last_read.elapsed() <= retention);
    }
}

pub struct Query<K, V> {
    label: &'static str,
    stale_time: Duration,
    retention: Duration,
    state: Arc<Mutex<State<K, V>>>,
    sharing: BoxRequestSharing<(K, u64), Result<Arc<V>, ApiError>>,
}

impl<K, V> Query<K, V>
where
    K: QueryKey,
    V: Send + Sync + 'static,
{
    /// A cache whose entries count as fresh for `stale_time` after they were
    /// fetched. `label` names the cache in logs and metrics.
    pub fn new(label: &'static str, stale_time: Duration) -> Self {
        Self {
            label,
            stale_time,
            retention: DEFAULT_RETENTION,
            state: Default::default(),
            sharing: RequestSharing::labelled(label),
        }
    }

    /// Drops entries that were not read for `retention`.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Current entry of `key` without any network access.
    pub fn peek(&self, key: &K) -> Option<Cached<V>> {
        self.state.lock().unwrap().read(key).cloned()
    }

    /// Fetches `key` from the backend and stores the result. Joins a request
    /// for the same key that is already in flight instead of starting a new
    /// one, unless the entry was invalidated since that request started.
    pub async fn fetch<F, Fut>(&self, key: K, fetcher: F) -> Result<Arc<V>, ApiError>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let generation = self.state.lock().unwrap().generation(&key);
        let state = self.state.clone();
        let label = self.label;
        let retention = self.retention;
        let shared = self
            .sharing
            .shared_or_else((key, generation), move |(key, generation)| {
                let (key, generation) = (key.clone(), *generation);
                let request = fetcher(key.clone());
                async move {
                    let result = request.await.map(Arc::new);
                    store(&state, label, retention, key, generation, &result);
                    result
                }
                .boxed()
            });
        shared.await
    }

    /// Returns the cached value if it is still fresh, fetches it otherwise.
    pub async fn get<F, Fut>(&self, key: K, fetcher: F) -> Result<Arc<V>, ApiError>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        if let Some(value) = self.fresh_value(&key) {
            tracing::debug!(query = self.label, ?key, "cache hit");
            return Ok(value);
        }
        tracing::debug!(query = self.label, ?key, "cache miss");
        self.fetch(key, fetcher).await
    }

    /// Returns the cached entry right away and refreshes it in the background
    /// if it is missing or stale.
    pub fn read<F, Fut>(self: &Arc<Self>, key: K, fetcher: F) -> Option<Cached<V>>
    where
        F: FnOnce(K) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let cached = self.peek(&key);
        if cached
            .as_ref()
            .is_none_or(|cached| cached.is_stale(self.stale_time))
        {
            let this = self.clone();
            tokio::spawn(async move {
                if let Err(err) = this.fetch(key.clone(), fetcher).await {
                    tracing::debug!(query = this.label, ?key, ?err, "background refresh failed");
                }
            });
        }
        cached
    }

    /// Replaces the entry of `key` as if it had just been fetched. Responses
    /// to requests already in flight do not overwrite it.
    pub fn set(&self, key: K, value: V) {
        let mut state = self.state.lock().unwrap();
        state.prune(self.retention);
        let generation = state.next_generation();
        let cached = state.entries.entry(key).or_default();
        cached.generation = generation;
        cached.last_read = Instant::now();
        cached.refresh(Arc::new(value), false);
    }

    /// Marks the entry of `key` so the next read fetches it again. The value
    /// stays readable until then.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.lock().unwrap();
        let generation = state.next_generation();
        // Even without a value a request for `key` may be in flight.
        let cached = state.entries.entry(key.clone()).or_default();
        cached.generation = generation;
        cached.invalidated = true;
    }

    pub fn invalidate_all(&self) {
        let mut state = self.state.lock().unwrap();
        let generation = state.next_generation();
        state.invalidated_all = generation;
        for cached in state.entries.values_mut() {
            cached.invalidated = true;
        }
    }

    fn fresh_value(&self, key: &K) -> Option<Arc<V>> {
        let mut state = self.state.lock().unwrap();
        let cached = state.read(key)?;
        if cached.is_stale(self.stale_time) {
            return None;
        }
        cached.value.clone()
    }
}

fn store<K: QueryKey, V>(
    state: &Mutex<State<K, V>>,
    label: &str,
    retention: Duration,
    key: K,
    generation: u64,
    result: &Result<Arc<V>, ApiError>,
) {
    let metrics = Metrics::get();
    let mut state = state.lock().unwrap();
    state.prune(retention);
    let outdated = state.generation(&key) != generation;
    let cached = state.entries.entry(key).or_default();
    match result {
        Ok(value) => {
            metrics.query_fetches.with_label_values(&[label, "ok"]).inc();
            if !outdated {
                cached.refresh(value.clone(), false);
            } else if cached.value.is_none() {
                // Better than nothing, but the next read fetches again.
                cached.refresh(value.clone(), true);
            } else {
                tracing::debug!(query = label, "dropping response older than invalidation");
            }
        }
        Err(err) => {
            metrics.query_fetches.with_label_values(&[label, "error"]).inc();
            if !outdated {
                cached.error = Some(err.clone());
            }
        }
    }
}

#[derive(prometheus_metric_storage::MetricStorage)]
struct Metrics {
    /// Backend fetches per query and outcome.
    #[metric(labels("query", "result"))]
    query_fetches: IntCounterVec,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    fn counting_fetcher(
        calls: Arc<AtomicUsize>,
    ) -> impl FnOnce(u32) -> futures::future::Ready<Result<String, ApiError>> {
        move |key| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(format!("{key}-{call}")))
        }
    }

    fn failing(_: u32) -> futures::future::Ready<Result<String, ApiError>> {
        futures::future::ready(Err(ApiError::transport("connection refused")))
    }

    #[tokio::test(start_paused = true)]
    async fn serves_fresh_values_from_cache() {
        let query = Query::new("test", Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(*query.get(7, counting_fetcher(calls.clone())).await.unwrap(), "7-0");
        assert_eq!(*query.get(7, counting_fetcher(calls.clone())).await.unwrap(), "7-0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(*query.get(7, counting_fetcher(calls.clone())).await.unwrap(), "7-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_last_value() {
        let query = Query::new("test", Duration::from_secs(60));
        query.set(1, "good".to_string());

        let err = query.fetch(1, failing).await.unwrap_err();
        assert!(err.is_transport());

        let cached = query.peek(&1).unwrap();
        assert_eq!(cached.value.as_deref().map(String::as_str), Some("good"));
        assert_eq!(cached.error, Some(err));
        assert!(cached.is_stale(Duration::from_secs(60)));

        query.fetch(1, |_| async { Ok("better".to_string()) }).await.unwrap();
        let cached = query.peek(&1).unwrap();
        assert_eq!(cached.value.as_deref().map(String::as_str), Some("better"));
        assert_eq!(cached.error, None);
    }

    #[tokio::test]
    async fn invalidation_forces_refetch() {
        let query = Query::new("test", Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));
        query.set(1, "seeded".to_string());
        query.set(2, "seeded".to_string());

        assert_eq!(*query.get(1, counting_fetcher(calls.clone())).await.unwrap(), "seeded");

        query.invalidate(&1);
        assert!(query.peek(&1).unwrap().invalidated);
        assert!(!query.peek(&2).unwrap().invalidated);
        assert_eq!(*query.get(1, counting_fetcher(calls.clone())).await.unwrap(), "1-0");

        query.invalidate_all();
        assert!(query.peek(&1).unwrap().invalidated);
        assert!(query.peek(&2).unwrap().invalidated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn read_refreshes_in_background() {
        let query = Arc::new(Query::new("test", Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        assert!(query.read(3, counting_fetcher(calls.clone())).is_none());
        // Let the spawned refresh run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
            if query.peek(&3).is_some() {
                break;
            }
        }
        let cached = query.read(3, counting_fetcher(calls.clone())).unwrap();
        assert_eq!(cached.value.as_deref().map(String::as_str), Some("3-0"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_discards_fetch_in_flight() {
        let query = Arc::new(Query::new("test", Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        let pending = tokio::spawn({
            let query = query.clone();
            async move {
                query
                    .fetch(1, |_| async move {
                        gate.await.unwrap();
                        Ok("before".to_string())
                    })
                    .await
            }
        });
        tokio::task::yield_now().await;

        query.invalidate_all();
        // Does not join the request that started before the invalidation.
        assert_eq!(*query.get(1, counting_fetcher(calls.clone())).await.unwrap(), "1-0");

        release.send(()).unwrap();
        assert_eq!(*pending.await.unwrap().unwrap(), "before");
        let cached = query.peek(&1).unwrap();
        assert_eq!(cached.value.as_deref().map(String::as_str), Some("1-0"));
        assert!(!cached.invalidated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn outdated_response_without_value_stays_invalidated() {
        let query = Arc::new(Query::new("test", Duration::from_secs(60)));
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        let pending = tokio::spawn({
            let query = query.clone();
            async move {
                query
                    .fetch(1, |_| async move {
                        gate.await.unwrap();
                        Ok("before".to_string())
                    })
                    .await
            }
        });
        tokio::task::yield_now().await;

        query.invalidate(&1);
        release.send(()).unwrap();
        pending.await.unwrap().unwrap();

        let cached = query.peek(&1).unwrap();
        assert_eq!(cached.value.as_deref().map(String::as_str), Some("before"));
        assert!(cached.invalidated);
        assert!(cached.is_stale(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn drops_entries_nobody_reads() {
        let query =
            Query::new("test", Duration::from_secs(1)).with_retention(Duration::from_secs(10));
        query.set(1, "read".to_string());
        query.set(2, "forgotten".to_string());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(query.peek(&1).is_some());
        tokio::time::advance(Duration::from_secs(6)).await;
        query.set(3, "new".to_string());

        assert!(query.peek(&1).is_some());
        assert!(query.peek(&2).is_none());
        assert!(query.peek(&3).is_some());
    }
}
