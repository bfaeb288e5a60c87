use {
    crate::{
        error::ApiError,
        query::{Cached, Query, QueryKey},
    },
    std::{future::Future, sync::Arc, time::Duration},
    tokio::{sync::watch, task::JoinHandle},
};

/// Keeps one cache entry up to date by polling the backend.
///
/// Every poll publishes the resulting entry. Failed polls keep the last good
/// value and record the error, which makes the entry stale until the next
/// successful poll. The poller stops when the subscription is dropped.
pub struct Subscription<V> {
    receiver: watch::Receiver<Cached<V>>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

/// Polls `key` every `interval` through `fetcher` and stores the results in
/// `query`. The first poll happens immediately.
pub fn subscribe<K, V, F, Fut>(
    query: Arc<Query<K, V>>,
    key: K,
    interval: Duration,
    fetcher: F,
) -> Subscription<V>
where
    K: QueryKey,
    V: Send + Sync + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
{
    let (sender, receiver) = watch::channel(query.peek(&key).unwrap_or_default());
    let task = tokio::spawn(async move {
        loop {
            match query.fetch(key.clone(), &fetcher).await {
                Ok(_) => tracing::debug!(query = query.label(), ?key, "polled"),
                Err(err) => tracing::warn!(
                    query = query.label(),
                    ?key,
                    ?err,
                    "poll failed, keeping last known value"
                ),
            }
            let cached = query.peek(&key).unwrap_or_default();
            if sender.send(cached).is_err() {
                tracing::debug!(query = query.label(), ?key, "no receivers left");
                break;
            }
            tokio::time::sleep(interval).await;
        }
    });
    Subscription {
        receiver,
        interval,
        task: Some(task),
    }
}

impl<V> Subscription<V> {
    /// A subscription that never polls, used while the key to poll is not
    /// known yet.
    pub fn disabled() -> Self {
        let (_, receiver) = watch::channel(Cached::default());
        Self {
            receiver,
            interval: Duration::MAX,
            task: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.task.is_some()
    }

    /// Last successfully fetched value.
    pub fn value(&self) -> Option<Arc<V>> {
        self.receiver.borrow().value.clone()
    }

    /// The full cache entry including the last error.
    pub fn snapshot(&self) -> Cached<V> {
        self.receiver.borrow().clone()
    }

    /// Whether the last poll failed, the value was invalidated, or it is older
    /// than one poll interval.
    pub fn is_stale(&self) -> bool {
        self.receiver.borrow().is_stale(self.interval)
    }

    /// Waits until the next poll has been published. Returns `false` once the
    /// poller has stopped.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Another receiver of the polled entries.
    pub fn receiver(&self) -> watch::Receiver<Cached<V>> {
        self.receiver.clone()
    }

    /// Stops polling. Dropping the subscription does the same.
    pub fn unsubscribe(self) {}
}

impl<V> Drop for Subscription<V> {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    #[tokio::test(start_paused = true)]
    async fn polls_every_interval() {
        let query = Arc::new(Query::new("test", Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = {
            let calls = calls.clone();
            move |key: u32| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(key * 100 + call as u32) }
            }
        };

        let mut subscription = subscribe(query.clone(), 1, Duration::from_secs(2), fetcher);
        assert!(subscription.value().is_none());
        assert!(subscription.is_stale());

        assert!(subscription.changed().await);
        assert_eq!(subscription.value().as_deref(), Some(&100));
        assert!(!subscription.is_stale());

        assert!(subscription.changed().await);
        assert_eq!(subscription.value().as_deref(), Some(&101));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(query.peek(&1).unwrap().value.as_deref(), Some(&101));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_marks_value_stale() {
        let query = Arc::new(Query::new("test", Duration::ZERO));
        let responses = Arc::new(Mutex::new(vec![
            Ok(2),
            Err(ApiError::transport("connection refused")),
            Ok(1),
        ]));
        let fetcher = {
            let responses = responses.clone();
            move |_: u32| {
                let response = responses.lock().unwrap().pop().unwrap();
                async move { response }
            }
        };

        let mut subscription = subscribe(query, 1, Duration::from_secs(1), fetcher);

        assert!(subscription.changed().await);
        assert_eq!(subscription.value().as_deref(), Some(&1));
        assert!(!subscription.is_stale());

        assert!(subscription.changed().await);
        assert_eq!(subscription.value().as_deref(), Some(&1));
        assert!(subscription.is_stale());
        assert!(subscription.snapshot().error.unwrap().is_transport());

        assert!(subscription.changed().await);
        assert_eq!(subscription.value().as_deref(), Some(&2));
        assert!(!subscription.is_stale());
    }

    #[tokio::test]
    async fn disabled_subscription_never_changes() {
        let mut subscription = Subscription::<u32>::disabled();
        assert!(!subscription.is_enabled());
        assert!(subscription.value().is_none());
        assert!(subscription.is_stale());
        assert!(!subscription.changed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_polling() {
        let query = Arc::new(Query::new("test", Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = {
            let calls = calls.clone();
            move |_: u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            }
        };

        let mut subscription = subscribe(query, 1, Duration::from_secs(1), fetcher);
        assert!(subscription.changed().await);
        let mut receiver = subscription.receiver();
        subscription.unsubscribe();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(receiver.changed().await.is_err());
    }
}
