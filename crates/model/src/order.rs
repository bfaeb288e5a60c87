//! Contains the order type as it is returned by the backend and the request
//! used to announce a new order.

use {
    serde::{Deserialize, Serialize},
    strum::{Display, EnumString},
};

/// The signed limit order that backs a cross-chain swap. All amounts and
/// traits are kept in the exact string form the maker signed.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrder {
    pub salt: String,
    pub maker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub maker_asset: String,
    pub taker_asset: String,
    pub making_amount: String,
    pub taking_amount: String,
    pub maker_traits: String,
}

/// Compact signature over a [`LimitOrder`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderSignature {
    pub r: String,
    pub vs: String,
}

/// Auction window and price bounds of an order.
///
/// Times are unix seconds. Prices are decimal strings of arbitrary precision
/// and are only parsed by the auction price model.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionParams {
    pub start_time: u64,
    pub end_time: u64,
    pub start_price: String,
    pub end_price: String,
    #[serde(default)]
    pub duration: u64,
}

impl AuctionParams {
    /// An auction that starts at `now` and runs for `duration` seconds.
    pub fn starting_at(now: u64, duration: u64, start_price: String, end_price: String) -> Self {
        Self {
            start_time: now,
            end_time: now.saturating_add(duration),
            start_price,
            end_price,
            duration,
        }
    }
}

/// Destination side of the swap.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainData {
    pub src_chain_id: u64,
    pub dst_chain_id: u64,
    pub dst_token: String,
    pub dst_amount: String,
    /// Commitment to the maker's secret. The backend always returns it, but a
    /// detail entry seeded right after creation does not know it yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashlock: Option<String>,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Active,
    Filled,
    Expired,
    Cancelled,
}

impl OrderStatus {
    /// Once an order reaches a terminal status it never changes again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// An order as returned when querying the backend.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub order_hash: String,
    pub order: LimitOrder,
    pub auction_params: AuctionParams,
    pub cross_chain_data: CrossChainData,
    pub status: OrderStatus,
    /// Last price computed by the backend. Advisory only, the auction price
    /// model always recomputes it for active orders.
    pub current_price: String,
    pub last_price_update: u64,
    pub created_at: u64,
}

impl Order {
    /// Builds the detail view of a freshly created order from the request
    /// that announced it and the backend's answer, so that it can be shown
    /// before the first poll of the order detail completes.
    pub fn from_creation(request: &CreateOrderRequest, created: &OrderCreated, now: u64) -> Self {
        let start_time = created.auction_start_time;
        let end_time = created.auction_end_time;
        Self {
            order_id: created.order_id.clone(),
            order_hash: created.order_hash.clone(),
            order: request.order.clone(),
            auction_params: AuctionParams {
                start_time,
                end_time,
                start_price: request.auction_params.start_price.clone(),
                end_price: request.auction_params.end_price.clone(),
                duration: end_time.saturating_sub(start_time),
            },
            cross_chain_data: CrossChainData {
                src_chain_id: request.cross_chain_data.src_chain_id,
                dst_chain_id: request.cross_chain_data.dst_chain_id,
                dst_token: request.cross_chain_data.dst_token.clone(),
                dst_amount: request.cross_chain_data.dst_amount.clone(),
                hashlock: None,
            },
            status: created.status,
            current_price: created.current_price.clone(),
            last_price_update: now,
            created_at: now,
        }
    }
}

/// Auction parameters of a new order. The backend derives the duration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionWindow {
    pub start_time: u64,
    pub end_time: u64,
    pub start_price: String,
    pub end_price: String,
}

impl From<AuctionParams> for AuctionWindow {
    fn from(params: AuctionParams) -> Self {
        Self {
            start_time: params.start_time,
            end_time: params.end_time,
            start_price: params.start_price,
            end_price: params.end_price,
        }
    }
}

/// Destination side of a new order. The backend derives the hashlock from
/// the secret.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainRequest {
    pub src_chain_id: u64,
    pub dst_chain_id: u64,
    pub dst_token: String,
    pub dst_amount: String,
}

/// Body of `POST /api/orders`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order: LimitOrder,
    pub signature: OrderSignature,
    pub auction_params: AuctionWindow,
    pub cross_chain_data: CrossChainRequest,
    pub secret: String,
}

/// Answer of the backend to a successfully created order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: String,
    pub order_hash: String,
    pub status: OrderStatus,
    pub auction_start_time: u64,
    pub auction_end_time: u64,
    pub current_price: String,
}
