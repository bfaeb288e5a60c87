//! Informational endpoints of the backend. These are fetched on demand and
//! never polled.

use {
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// `GET /api/system/health`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SystemHealth {
    pub status: String,
    pub timestamp: u64,
    pub services: Services,
    pub version: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Services {
    pub api: ApiService,
    pub database: DatabaseService,
    /// Keyed by chain id.
    #[serde(default)]
    pub blockchain: BTreeMap<String, ChainService>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ApiService {
    pub status: String,
    pub uptime: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DatabaseService {
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainService {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// `GET /api/system/chains`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SupportedChains {
    pub chains: Vec<ChainInfo>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    pub contracts: ChainContracts,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainContracts {
    pub limit_order_protocol: String,
    pub dutch_auction_calculator: String,
    pub escrow_factory: String,
    pub weth: String,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn deserializes_health() {
        let health: SystemHealth = serde_json::from_value(json!({
            "status": "healthy",
            "timestamp": 1,
            "services": {
                "api": { "status": "up", "uptime": 42 },
                "database": { "status": "up", "type": "memory" },
                "blockchain": {
                    "1": { "status": "connected", "blockNumber": 19000000 },
                    "1116": { "status": "disconnected" }
                }
            },
            "version": "1.0.0"
        }))
        .unwrap();
        assert_eq!(health.services.database.kind, "memory");
        assert_eq!(health.services.blockchain["1"].block_number, Some(19000000));
        assert_eq!(health.services.blockchain["1116"].block_number, None);
    }
}
