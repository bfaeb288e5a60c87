//! Filters accepted by `GET /api/orders` and the paginated answer.

use {
    crate::order::{Order, OrderStatus},
    serde::{Deserialize, Serialize},
    strum::{Display, EnumString},
};

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortBy {
    CreatedAt,
    CurrentPrice,
    FilledAt,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters of an order listing. Also identifies the listing in the
/// client side cache, so two equal filters share one cache entry.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub maker: Option<String>,
    pub src_chain_id: Option<u64>,
    pub dst_chain_id: Option<u64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

impl OrderFilter {
    /// Active auctions, newest first, optionally restricted to one source
    /// chain.
    pub fn active_auctions(src_chain_id: Option<u64>) -> Self {
        Self {
            status: Some(OrderStatus::Active),
            src_chain_id,
            sort_by: Some(SortBy::CreatedAt),
            sort_order: Some(SortOrder::Desc),
            limit: Some(50),
            ..Default::default()
        }
    }

    /// The order history of one maker, newest first.
    pub fn history(maker: &str) -> Self {
        Self {
            maker: Some(maker.to_owned()),
            sort_by: Some(SortBy::CreatedAt),
            sort_order: Some(SortOrder::Desc),
            limit: Some(100),
            ..Default::default()
        }
    }

    pub fn with_maker(mut self, maker: &str) -> Self {
        self.maker = Some(maker.to_owned());
        self
    }

    /// Query string pairs in the order the backend documents them. Unset
    /// fields are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let Self {
            status,
            maker,
            src_chain_id,
            dst_chain_id,
            page,
            limit,
            sort_by,
            sort_order,
        } = self;

        let mut pairs = Vec::new();
        let mut push = |key, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((key, value));
            }
        };
        push("status", status.map(|s| s.to_string()));
        push("maker", maker.clone());
        push("srcChainId", src_chain_id.map(|id| id.to_string()));
        push("dstChainId", dst_chain_id.map(|id| id.to_string()));
        push("page", page.map(|page| page.to_string()));
        push("limit", limit.map(|limit| limit.to_string()));
        push("sortBy", sort_by.map(|s| s.to_string()));
        push("sortOrder", sort_order.map(|s| s.to_string()));
        pairs
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_query() {
        assert!(OrderFilter::default().query_pairs().is_empty());
    }

    #[test]
    fn active_auctions_query() {
        assert_eq!(
            OrderFilter::active_auctions(Some(1116)).query_pairs(),
            vec![
                ("status", "active".to_string()),
                ("srcChainId", "1116".to_string()),
                ("limit", "50".to_string()),
                ("sortBy", "createdAt".to_string()),
                ("sortOrder", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn history_query() {
        let pairs = OrderFilter::history("0xmaker").query_pairs();
        assert_eq!(pairs[0], ("maker", "0xmaker".to_string()));
        assert_eq!(pairs[1], ("limit", "100".to_string()));
    }

    #[test]
    fn parses_sort_options() {
        assert_eq!("filledAt".parse::<SortBy>().unwrap(), SortBy::FilledAt);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
    }
}
