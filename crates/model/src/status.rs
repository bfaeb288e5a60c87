//! Live status of an order as returned by `GET /api/orders/{id}/status`.

use {
    crate::order::OrderStatus,
    serde::{Deserialize, Serialize},
    serde_with::skip_serializing_none,
};

#[skip_serializing_none]
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusSnapshot {
    pub order_id: String,
    pub status: OrderStatus,
    pub current_price: String,
    pub last_price_update: u64,
    #[serde(default)]
    pub escrows: Option<Escrows>,
    #[serde(default)]
    pub resolver: Option<ResolverFill>,
}

impl OrderStatusSnapshot {
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}

/// Escrow contracts on both chains. Only present once a resolver filled the
/// order.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Escrows {
    #[serde(default)]
    pub src: Option<Escrow>,
    #[serde(default)]
    pub dst: Option<Escrow>,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Escrow {
    pub address: String,
    pub status: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverFill {
    pub address: String,
    pub filled_at: u64,
    pub fill_tx_hash: String,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn deserializes_unfilled_status() {
        let snapshot: OrderStatusSnapshot = serde_json::from_value(json!({
            "orderId": "ord_1",
            "status": "active",
            "currentPrice": "1999.1",
            "lastPriceUpdate": 123,
        }))
        .unwrap();
        assert_eq!(snapshot.escrows, None);
        assert!(!snapshot.is_filled());
    }

    #[test]
    fn deserializes_filled_status() {
        let value = json!({
            "orderId": "ord_1",
            "status": "filled",
            "currentPrice": "1950",
            "lastPriceUpdate": 130,
            "escrows": {
                "src": { "address": "0xsrc", "status": "locked", "txHash": "0x01" },
                "dst": { "address": "0xdst", "status": "pending" }
            },
            "resolver": {
                "address": "0xresolver",
                "filledAt": 129,
                "fillTxHash": "0x02"
            }
        });
        let snapshot: OrderStatusSnapshot = serde_json::from_value(value.clone()).unwrap();
        assert!(snapshot.is_filled());
        let escrows = snapshot.escrows.as_ref().unwrap();
        assert_eq!(escrows.dst.as_ref().unwrap().tx_hash, None);
        assert_eq!(snapshot.resolver.as_ref().unwrap().filled_at, 129);
        assert_eq!(serde_json::to_value(&snapshot).unwrap(), value);
    }
}
