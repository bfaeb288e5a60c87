//! Read-only view of the user's wallet connection.
//!
//! The wallet itself is managed by an external wallet library. Components
//! that depend on the connected account receive a [`WalletContext`]
//! explicitly so that they stay testable without a live wallet.

use strum::Display;

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WalletContext {
    address: Option<String>,
    chain_id: Option<u64>,
    status: ConnectionStatus,
}

impl WalletContext {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: impl Into<String>, chain_id: u64) -> Self {
        Self {
            address: Some(address.into()),
            chain_id: Some(chain_id),
            status: ConnectionStatus::Connected,
        }
    }

    pub fn connecting() -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            ..Default::default()
        }
    }

    /// The connected account. `None` unless the wallet is fully connected.
    pub fn address(&self) -> Option<&str> {
        match self.status {
            ConnectionStatus::Connected => self.address.as_deref(),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.address().is_some()
    }
}
