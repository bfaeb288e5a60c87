//! Plain text presentation of orders, quotes and the demo.

use {
    auction::AuctionView,
    demo::{DemoState, state::PhaseStep},
    model::{Order, filter::OrderPage, order::AuctionParams, status::OrderStatusSnapshot},
    orderbook_client::swap::{SwapQuote, ValidatedSwap},
};

fn auction_summary(order: &Order, now: u64) -> String {
    match AuctionView::at(order, now) {
        Ok(view) if view.is_active => format!(
            "price {} ({:.0}% elapsed, {}s left)",
            view.current_price,
            view.progress * 100.,
            view.time_remaining,
        ),
        Ok(view) => format!("price {}", view.current_price),
        Err(err) => format!("price {} ({err})", order.current_price),
    }
}

pub fn order_line(order: &Order, now: u64) -> String {
    format!(
        "{} {} {} -> {} {}",
        order.order_id,
        order.status,
        order.cross_chain_data.src_chain_id,
        order.cross_chain_data.dst_chain_id,
        auction_summary(order, now),
    )
}

pub fn page(page: &OrderPage, now: u64) -> String {
    let pagination = &page.pagination;
    page.orders
        .iter()
        .map(|order| order_line(order, now) + "\n")
        .chain([format!(
            "page {}/{} ({} orders)",
            pagination.page, pagination.total_pages, pagination.total_count
        )])
        .collect()
}

pub fn order_detail(order: &Order, now: u64) -> String {
    let AuctionParams {
        start_time,
        end_time,
        start_price,
        end_price,
        ..
    } = &order.auction_params;
    [
        format!("order {} ({})", order.order_id, order.status),
        format!("  hash: {}", order.order_hash),
        format!("  maker: {}", order.order.maker),
        format!(
            "  selling {} of {} for {} of {} on chain {}",
            order.order.making_amount,
            order.order.maker_asset,
            order.cross_chain_data.dst_amount,
            order.cross_chain_data.dst_token,
            order.cross_chain_data.dst_chain_id,
        ),
        format!("  auction: {start_price} -> {end_price} between {start_time} and {end_time}"),
        format!("  {}", auction_summary(order, now)),
    ]
    .join("\n")
}

pub fn status_line(status: &OrderStatusSnapshot, stale: bool) -> String {
    let mut out = format!(
        "{} {} price {}",
        status.order_id, status.status, status.current_price
    );
    if let Some(resolver) = &status.resolver {
        out.push_str(&format!(
            " filled by {} in {}",
            resolver.address, resolver.fill_tx_hash
        ));
    }
    if let Some(escrows) = &status.escrows {
        for (side, escrow) in [("src", &escrows.src), ("dst", &escrows.dst)] {
            if let Some(escrow) = escrow {
                out.push_str(&format!(" {side} escrow {} {}", escrow.address, escrow.status));
            }
        }
    }
    if stale {
        out.push_str(" (stale)");
    }
    out
}

pub fn quote(swap: &ValidatedSwap, quote: &SwapQuote, auction: &AuctionParams) -> String {
    format!(
        "{} {} on chain {} -> {} on chain {}\n  estimated output: {}\n  minimum received: {}\n  \
         auction: {} -> {} over {}s",
        swap.from_amount.normalized(),
        swap.from_token,
        swap.src_chain_id,
        swap.to_token,
        swap.dst_chain_id,
        quote.estimated_output.normalized(),
        quote.min_received.normalized(),
        auction.start_price,
        auction.end_price,
        auction.duration,
    )
}

pub fn demo_phase(step: &PhaseStep) -> String {
    format!("== {}: {} ==", step.title, step.description)
}

pub fn demo_progress(state: &DemoState) -> String {
    format!(
        "{} {:.0}% (overall {:.0}%)",
        state.phase,
        state.progress(),
        state.overall_progress()
    )
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        demo::{Action, STEPS},
        model::{
            OrderStatus,
            filter::Pagination,
            order::CrossChainData,
            status::{Escrow, Escrows, ResolverFill},
        },
    };

    fn order() -> Order {
        Order {
            order_id: "order-1".to_string(),
            auction_params: AuctionParams {
                start_time: 1000,
                end_time: 1300,
                start_price: "2000".to_string(),
                end_price: "1900".to_string(),
                duration: 300,
            },
            cross_chain_data: CrossChainData {
                src_chain_id: 1,
                dst_chain_id: 1116,
                ..Default::default()
            },
            current_price: "1990".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn renders_active_auction() {
        assert_eq!(
            order_line(&order(), 1150),
            "order-1 active 1 -> 1116 price 1950 (50% elapsed, 150s left)"
        );
    }

    #[test]
    fn renders_finished_order_with_server_price() {
        let order = Order {
            status: OrderStatus::Filled,
            ..order()
        };
        assert_eq!(order_line(&order, 1150), "order-1 filled 1 -> 1116 price 1990");
    }

    #[test]
    fn renders_malformed_auction() {
        let mut order = order();
        order.auction_params.end_time = 1000;
        assert!(order_line(&order, 1150).ends_with(
            "price 1990 (malformed auction window: end time 1000 is not after start time 1000)"
        ));
    }

    #[test]
    fn renders_page() {
        let page = OrderPage {
            orders: vec![order(), order()],
            pagination: Pagination {
                page: 1,
                limit: 20,
                total_count: 2,
                total_pages: 1,
                ..Default::default()
            },
        };
        assert_eq!(
            super::page(&page, 1300),
            "order-1 active 1 -> 1116 price 1900\norder-1 active 1 -> 1116 price 1900\npage \
             1/1 (2 orders)"
        );
        assert!(order_detail(&order(), 1150).ends_with(
            "  auction: 2000 -> 1900 between 1000 and 1300\n  price 1950 (50% elapsed, 150s \
             left)"
        ));
    }

    #[test]
    fn renders_status() {
        let status = OrderStatusSnapshot {
            order_id: "order-1".to_string(),
            status: OrderStatus::Filled,
            current_price: "1950".to_string(),
            escrows: Some(Escrows {
                src: Some(Escrow {
                    address: "0xsrc".to_string(),
                    status: "withdrawn".to_string(),
                    ..Default::default()
                }),
                dst: None,
            }),
            resolver: Some(ResolverFill {
                address: "0xresolver".to_string(),
                filled_at: 1150,
                fill_tx_hash: "0xfill".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            status_line(&status, true),
            "order-1 filled price 1950 filled by 0xresolver in 0xfill src escrow 0xsrc withdrawn \
             (stale)"
        );
    }

    #[test]
    fn renders_demo() {
        assert_eq!(
            demo_phase(&STEPS[1]),
            "== Escrow Setup: Winner deposits in time-locked contract =="
        );
        let state = DemoState::default().apply(Action::Play);
        assert_eq!(demo_progress(&state), "auction 0% (overall 0%)");
    }
}
