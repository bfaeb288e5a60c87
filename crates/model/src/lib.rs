//! Contains the models that are exchanged with the order backend and shared
//! between the auction price model, the order client and the command line
//! front-end.

pub mod api;
pub mod filter;
pub mod order;
pub mod status;
pub mod system;
pub mod time;
pub mod wallet;

pub use order::{Order, OrderStatus};
