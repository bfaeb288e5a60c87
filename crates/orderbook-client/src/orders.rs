//! Order reads with their poll intervals and the create mutation that keeps
//! the cached reads consistent.

use {
    crate::{
        api::OrderbookApi,
        error::{ApiError, Error},
        query::{Cached, Query},
        subscription::{Subscription, subscribe},
        swap::ValidationError,
    },
    futures::{FutureExt, future::BoxFuture},
    model::{
        Order,
        filter::{OrderFilter, OrderPage},
        order::{CreateOrderRequest, OrderCreated},
        status::OrderStatusSnapshot,
        system::{SupportedChains, SystemHealth},
        time::now_in_epoch_seconds,
        wallet::WalletContext,
    },
    std::{sync::Arc, time::Duration},
};

pub const LIST_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const LIST_STALE_TIME: Duration = Duration::from_secs(1);
pub const ACTIVE_AUCTIONS_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const HISTORY_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const ORDER_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const ORDER_STALE_TIME: Duration = Duration::from_secs(2);
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const STATUS_STALE_TIME: Duration = Duration::from_millis(500);

type Fetch<V> = BoxFuture<'static, Result<V, ApiError>>;

/// Cached, de-duplicated access to the orders of the backend.
///
/// Cloning is cheap and clones share their caches.
#[derive(Clone)]
pub struct OrderQueries {
    api: Arc<dyn OrderbookApi>,
    lists: Arc<Query<OrderFilter, OrderPage>>,
    orders: Arc<Query<String, Order>>,
    statuses: Arc<Query<String, OrderStatusSnapshot>>,
}

impl OrderQueries {
    pub fn new(api: Arc<dyn OrderbookApi>) -> Self {
        Self {
            api,
            lists: Arc::new(Query::new("order_lists", LIST_STALE_TIME)),
            orders: Arc::new(Query::new("orders", ORDER_STALE_TIME)),
            statuses: Arc::new(Query::new("order_statuses", STATUS_STALE_TIME)),
        }
    }

    fn list_fetcher(&self) -> impl Fn(OrderFilter) -> Fetch<OrderPage> + Send + Sync + 'static {
        let api = self.api.clone();
        move |filter| {
            let api = api.clone();
            async move { api.orders(&filter).await }.boxed()
        }
    }

    fn order_fetcher(&self) -> impl Fn(String) -> Fetch<Order> + Send + Sync + 'static {
        let api = self.api.clone();
        move |order_id| {
            let api = api.clone();
            async move { api.order(&order_id).await }.boxed()
        }
    }

    fn status_fetcher(
        &self,
    ) -> impl Fn(String) -> Fetch<OrderStatusSnapshot> + Send + Sync + 'static {
        let api = self.api.clone();
        move |order_id| {
            let api = api.clone();
            async move { api.order_status(&order_id).await }.boxed()
        }
    }

    /// One page of orders, served from the cache while it is fresh.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Arc<OrderPage>, ApiError> {
        self.lists.get(filter, self.list_fetcher()).await
    }

    pub async fn order(&self, order_id: &str) -> Result<Arc<Order>, ApiError> {
        self.orders
            .get(order_id.to_owned(), self.order_fetcher())
            .await
    }

    pub async fn order_status(&self, order_id: &str) -> Result<Arc<OrderStatusSnapshot>, ApiError> {
        self.statuses
            .get(order_id.to_owned(), self.status_fetcher())
            .await
    }

    /// Cached listing without waiting. Stale or missing listings are
    /// refreshed in the background.
    pub fn read_orders(&self, filter: OrderFilter) -> Option<Cached<OrderPage>> {
        self.lists.read(filter, self.list_fetcher())
    }

    pub fn read_order(&self, order_id: &str) -> Option<Cached<Order>> {
        self.orders.read(order_id.to_owned(), self.order_fetcher())
    }

    pub fn read_order_status(&self, order_id: &str) -> Option<Cached<OrderStatusSnapshot>> {
        self.statuses
            .read(order_id.to_owned(), self.status_fetcher())
    }

    /// Polls the orders of the connected wallet matching `filter`. Stays
    /// disabled while no wallet is connected.
    pub fn watch_orders(
        &self,
        wallet: &WalletContext,
        filter: OrderFilter,
    ) -> Subscription<OrderPage> {
        let Some(maker) = wallet.address() else {
            return Subscription::disabled();
        };
        subscribe(
            self.lists.clone(),
            filter.with_maker(maker),
            LIST_POLL_INTERVAL,
            self.list_fetcher(),
        )
    }

    /// Polls the newest active auctions, optionally of one source chain.
    pub fn watch_active_auctions(&self, src_chain_id: Option<u64>) -> Subscription<OrderPage> {
        subscribe(
            self.lists.clone(),
            OrderFilter::active_auctions(src_chain_id),
            ACTIVE_AUCTIONS_POLL_INTERVAL,
            self.list_fetcher(),
        )
    }

    /// Polls the order history of the connected wallet.
    pub fn watch_history(&self, wallet: &WalletContext) -> Subscription<OrderPage> {
        let Some(maker) = wallet.address() else {
            return Subscription::disabled();
        };
        subscribe(
            self.lists.clone(),
            OrderFilter::history(maker),
            HISTORY_POLL_INTERVAL,
            self.list_fetcher(),
        )
    }

    pub fn watch_order(&self, order_id: Option<&str>) -> Subscription<Order> {
        let Some(order_id) = order_id else {
            return Subscription::disabled();
        };
        subscribe(
            self.orders.clone(),
            order_id.to_owned(),
            ORDER_POLL_INTERVAL,
            self.order_fetcher(),
        )
    }

    pub fn watch_order_status(&self, order_id: Option<&str>) -> Subscription<OrderStatusSnapshot> {
        let Some(order_id) = order_id else {
            return Subscription::disabled();
        };
        subscribe(
            self.statuses.clone(),
            order_id.to_owned(),
            STATUS_POLL_INTERVAL,
            self.status_fetcher(),
        )
    }

    /// Submits a signed order.
    ///
    /// On success every cached listing is invalidated and the detail of the
    /// new order is seeded from the request, so it can be shown before the
    /// backend is asked for it. Failures leave the caches untouched.
    pub async fn create_order(
        &self,
        wallet: &WalletContext,
        request: &CreateOrderRequest,
    ) -> Result<OrderCreated, Error> {
        if !wallet.is_connected() {
            return Err(ValidationError::WalletNotConnected.into());
        }

        let created = match self.api.create_order(request).await {
            Ok(created) => created,
            Err(err) => {
                tracing::error!(?err, "failed to create order");
                return Err(err.into());
            }
        };

        self.lists.invalidate_all();
        self.orders.set(
            created.order_id.clone(),
            Order::from_creation(request, &created, now_in_epoch_seconds()),
        );
        tracing::info!(order_id = %created.order_id, "created order");
        Ok(created)
    }

    pub async fn system_health(&self) -> Result<SystemHealth, ApiError> {
        self.api.system_health().await
    }

    pub async fn supported_chains(&self) -> Result<SupportedChains, ApiError> {
        self.api.supported_chains().await
    }
}
