//! Client of the cross-chain order backend.
//!
//! [`api`] is the raw REST client. [`orders::OrderQueries`] puts a keyed,
//! de-duplicating cache with fixed poll intervals on top of it. [`swap`]
//! validates swaps locally before anything is sent.

pub mod api;
pub mod error;
pub mod http_client;
pub mod orders;
pub mod query;
pub mod request_sharing;
pub mod subscription;
pub mod swap;

pub use {
    api::{HttpOrderbookApi, OrderbookApi},
    error::{ApiError, Error},
    orders::OrderQueries,
    subscription::Subscription,
};
