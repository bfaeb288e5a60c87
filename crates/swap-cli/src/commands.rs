use {
    crate::{arguments::Command, render},
    anyhow::{Context, Result},
    demo::{Demo, Phase},
    model::{
        filter::OrderFilter,
        order::CreateOrderRequest,
        time::now_in_epoch_seconds,
        wallet::WalletContext,
    },
    orderbook_client::{
        OrderQueries,
        error::Error,
        swap::{ChainRegistry, SwapParams, ValidatedSwap, ValidationError},
    },
    std::time::Duration,
};

pub async fn execute(
    queries: &OrderQueries,
    wallet: &WalletContext,
    command: Command,
) -> Result<()> {
    match command {
        Command::Orders {
            status,
            src_chain_id,
            dst_chain_id,
            page,
            limit,
        } => {
            let maker = wallet
                .address()
                .ok_or(ValidationError::WalletNotConnected)?;
            let filter = OrderFilter {
                status,
                src_chain_id,
                dst_chain_id,
                page,
                limit,
                ..Default::default()
            }
            .with_maker(maker);
            let orders = queries.list_orders(filter).await?;
            println!("{}", render::page(&orders, now_in_epoch_seconds()));
        }
        Command::Auctions { src_chain_id } => {
            let orders = queries
                .list_orders(OrderFilter::active_auctions(src_chain_id))
                .await?;
            println!("{}", render::page(&orders, now_in_epoch_seconds()));
        }
        Command::History => {
            let maker = wallet
                .address()
                .ok_or(ValidationError::WalletNotConnected)?;
            let orders = queries.list_orders(OrderFilter::history(maker)).await?;
            println!("{}", render::page(&orders, now_in_epoch_seconds()));
        }
        Command::Order { order_id } => {
            let order = queries.order(&order_id).await?;
            println!("{}", render::order_detail(&order, now_in_epoch_seconds()));
        }
        Command::Watch { order_id } => watch(queries, &order_id).await?,
        Command::Create { request } => {
            let body = tokio::fs::read(&request)
                .await
                .with_context(|| format!("failed to read {}", request.display()))?;
            let request: CreateOrderRequest =
                serde_json::from_slice(&body).context("invalid order request")?;
            let created = queries.create_order(wallet, &request).await?;
            println!(
                "created order {} ({}), auction runs from {} to {}",
                created.order_id,
                created.order_hash,
                created.auction_start_time,
                created.auction_end_time,
            );
            let order = queries.order(&created.order_id).await?;
            println!("{}", render::order_detail(&order, now_in_epoch_seconds()));
        }
        Command::Quote {
            from_token,
            to_token,
            from_chain,
            to_chain,
            amount,
            slippage,
            auction_duration,
            reverse,
        } => {
            let params = SwapParams {
                from_token,
                to_token,
                from_chain,
                to_chain,
                from_amount: amount,
                slippage,
                auction_duration: auction_duration.as_secs(),
            };
            let chains = ChainRegistry::default();
            let params = if reverse {
                let forward = validate(&params, wallet, &chains)?;
                let output = forward.quote().estimated_output.normalized();
                params.reversed(output.to_plain_string())
            } else {
                params
            };
            let swap = validate(&params, wallet, &chains)?;
            let auction = swap.auction_params(now_in_epoch_seconds());
            println!("{}", render::quote(&swap, &swap.quote(), &auction));
        }
        Command::Demo { tick } => play_demo(tick).await?,
        Command::Health => {
            let health = queries.system_health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Command::Chains => {
            let chains = queries.supported_chains().await?;
            println!("{}", serde_json::to_string_pretty(&chains)?);
        }
    }
    Ok(())
}

fn validate(
    params: &SwapParams,
    wallet: &WalletContext,
    chains: &ChainRegistry,
) -> Result<ValidatedSwap, Error> {
    params.validate(wallet, chains).map_err(Error::Validation)
}

/// Prints status and price updates of an order until it is filled, expired
/// or cancelled.
async fn watch(queries: &OrderQueries, order_id: &str) -> Result<()> {
    let mut status = queries.watch_order_status(Some(order_id));
    let mut detail = queries.watch_order(Some(order_id));

    loop {
        tokio::select! {
            changed = status.changed() => {
                if !changed {
                    break;
                }
                let Some(snapshot) = status.value() else {
                    continue;
                };
                println!("{}", render::status_line(&snapshot, status.is_stale()));
                if snapshot.status.is_terminal() {
                    break;
                }
            }
            changed = detail.changed() => {
                if !changed {
                    break;
                }
                if let Some(order) = detail.value() {
                    println!("{}", render::order_line(&order, now_in_epoch_seconds()));
                }
            }
        }
    }
    Ok(())
}

async fn play_demo(tick: Duration) -> Result<()> {
    let demo = Demo::spawn(tick);
    let mut updates = demo.updates();
    anyhow::ensure!(demo.play(), "demo stopped unexpectedly");

    let mut phase = Phase::Idle;
    let mut shown = 0;
    while updates.changed().await.is_ok() {
        let state = *updates.borrow_and_update();
        if state.phase != phase {
            phase = state.phase;
            shown = 0;
            if let Some(step) = state.step() {
                println!("{}", render::demo_phase(step));
            }
        }
        let events = state.visible_events();
        for event in events.get(shown..).unwrap_or_default() {
            println!("  {event}");
        }
        shown = events.len();
        if state.phase == Phase::Complete {
            println!("{}", render::demo_progress(&state));
            break;
        }
    }
    Ok(())
}
