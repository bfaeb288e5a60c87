//! Typed access to the order backend's REST API.

use {
    crate::error::ApiError,
    model::{
        api::Envelope,
        filter::{OrderFilter, OrderPage},
        order::{CreateOrderRequest, Order, OrderCreated},
        status::OrderStatusSnapshot,
        system::{SupportedChains, SystemHealth},
    },
    reqwest::{Client, RequestBuilder, header::CONTENT_TYPE},
    serde::de::DeserializeOwned,
    url::Url,
};

/// Backend used when none is configured.
pub const DEFAULT_URL: &str = "http://localhost:3003";

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait OrderbookApi: Send + Sync + 'static {
    /// Announces a new signed order. The backend starts its auction right
    /// away.
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderCreated, ApiError>;

    /// One page of orders matching `filter`.
    async fn orders(&self, filter: &OrderFilter) -> Result<OrderPage, ApiError>;

    async fn order(&self, order_id: &str) -> Result<Order, ApiError>;

    /// Light weight status of an order including the escrows and resolver
    /// that filled it.
    async fn order_status(&self, order_id: &str) -> Result<OrderStatusSnapshot, ApiError>;

    async fn system_health(&self) -> Result<SystemHealth, ApiError>;

    async fn supported_chains(&self) -> Result<SupportedChains, ApiError>;
}

/// [`OrderbookApi`] talking HTTP to a running backend.
#[derive(Clone, Debug)]
pub struct HttpOrderbookApi {
    /// Base URL without trailing slash.
    base: String,
    client: Client,
}

impl HttpOrderbookApi {
    pub fn new(client: Client, base_url: &str) -> Result<Self, url::ParseError> {
        let base = base_url.trim_end_matches('/').to_owned();
        Url::parse(&base)?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// URL of `endpoint` below the base. `segments` are appended as
    /// individually escaped path segments.
    fn url(&self, endpoint: &str, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{endpoint}", self.base))
            .map_err(|err| ApiError::transport(err.to_string()))?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| ApiError::transport(format!("{} can not be a base", self.base)))?
                .pop_if_empty()
                .extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        let result = decode(status, &body);
        if let Err(err) = &result {
            tracing::debug!(?err, "backend request failed");
        }
        result
    }
}

/// Interprets a response body according to the backend's envelope
/// conventions.
fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|err| ApiError::transport(format!("invalid response body: {err}")))?;

    if !(200..300).contains(&status) {
        let message = envelope
            .error
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        return Err(ApiError::rejected(status, message, envelope.details));
    }
    if !envelope.success {
        let message = envelope
            .error
            .unwrap_or_else(|| "request was not successful".to_owned());
        return Err(ApiError::rejected(status, message, envelope.details));
    }

    let data = envelope
        .data
        .ok_or_else(|| ApiError::transport("response is missing data"))?;
    serde_json::from_value(data)
        .map_err(|err| ApiError::transport(format!("invalid response data: {err}")))
}

#[async_trait::async_trait]
impl OrderbookApi for HttpOrderbookApi {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderCreated, ApiError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| ApiError::transport(format!("unserializable order: {err}")))?;
        let url = self.url("/api/orders", &[])?;
        self.send(self.client.post(url).body(body)).await
    }

    async fn orders(&self, filter: &OrderFilter) -> Result<OrderPage, ApiError> {
        let mut url = self.url("/api/orders", &[])?;
        let pairs = filter.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.send(self.client.get(url)).await
    }

    async fn order(&self, order_id: &str) -> Result<Order, ApiError> {
        let url = self.url("/api/orders", &[order_id])?;
        self.send(self.client.get(url)).await
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderStatusSnapshot, ApiError> {
        let url = self.url("/api/orders", &[order_id, "status"])?;
        self.send(self.client.get(url)).await
    }

    async fn system_health(&self) -> Result<SystemHealth, ApiError> {
        let url = self.url("/api/system/health", &[])?;
        self.send(self.client.get(url)).await
    }

    async fn supported_chains(&self) -> Result<SupportedChains, ApiError> {
        let url = self.url("/api/system/chains", &[])?;
        self.send(self.client.get(url)).await
    }
}
