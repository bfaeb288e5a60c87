use {
    futures::{
        FutureExt,
        future::{BoxFuture, Shared, WeakShared},
    },
    prometheus::IntCounterVec,
    std::{
        collections::HashMap,
        future::Future,
        hash::Hash,
        sync::{Arc, Mutex},
    },
};

/// Share an expensive to compute response with multiple requests that occur
/// while one of them is already in flight.
pub struct RequestSharing<Request, Fut: Future> {
    in_flight: Arc<Cache<Request, Fut>>,
    request_label: String,
}

/// Request sharing for boxed futures.
pub type BoxRequestSharing<Request, Response> =
    RequestSharing<Request, BoxFuture<'static, Response>>;

/// Cache mapping a request type to a shared future that returns the respective
/// response.
#[derive(Debug)]
struct Cache<Request, Response: Future>(Mutex<HashMap<Request, WeakShared<Response>>>);

impl<Request, Response: Future> Default for Cache<Request, Response> {
    fn default() -> Self {
        Self(Mutex::new(HashMap::default()))
    }
}

impl<Request, Fut: Future> RequestSharing<Request, Fut> {
    pub fn labelled(request_label: impl Into<String>) -> Self {
        Self {
            in_flight: Default::default(),
            request_label: request_label.into(),
        }
    }
}

/// Returns a shallow copy (without any pending requests)
impl<Request, Fut: Future> Clone for RequestSharing<Request, Fut> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Default::default(),
            request_label: self.request_label.clone(),
        }
    }
}

impl<Request, Fut> RequestSharing<Request, Fut>
where
    Request: Eq + Hash,
    Fut: Future,
    Fut::Output: Clone,
{
    /// Returns an existing in flight future or creates and uses a new future
    /// from the specified closure.
    pub fn shared_or_else<F>(&self, request: Request, future: F) -> Shared<Fut>
    where
        F: FnOnce(&Request) -> Fut,
    {
        let mut in_flight = self.in_flight.0.lock().unwrap();

        // Futures that nobody polls anymore only keep their key alive.
        in_flight.retain(|_request, weak| weak.upgrade().is_some());

        let existing = in_flight.get(&request).and_then(WeakShared::upgrade);

        if let Some(existing) = existing {
            Metrics::get()
                .request_sharing_access
                .with_label_values(&[self.request_label.as_str(), "hits"])
                .inc();
            return existing;
        }

        Metrics::get()
            .request_sharing_access
            .with_label_values(&[self.request_label.as_str(), "misses"])
            .inc();

        let shared = future(&request).shared();
        // unwrap because downgrade only returns None if the Shared has already
        // completed which cannot be the case because we haven't polled it yet.
        in_flight.insert(request, shared.downgrade().unwrap());
        shared
    }

    /// Number of requests that are currently in flight.
    pub fn in_flight(&self) -> usize {
        let mut in_flight = self.in_flight.0.lock().unwrap();
        in_flight.retain(|_request, weak| weak.upgrade().is_some());
        in_flight.len()
    }
}

#[derive(prometheus_metric_storage::MetricStorage)]
struct Metrics {
    /// Request sharing hits & misses
    #[metric(labels("request_label", "result"))]
    request_sharing_access: IntCounterVec,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry()).unwrap()
    }
}
