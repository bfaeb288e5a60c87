pub mod arguments;
mod commands;
mod render;

use {
    anyhow::{Context, Result},
    arguments::Arguments,
    clap::Parser,
    orderbook_client::{HttpOrderbookApi, OrderQueries, http_client::HttpClientFactory},
    std::sync::Arc,
};

pub async fn start(args: impl Iterator<Item = String>) -> Result<()> {
    let args = Arguments::parse_from(args);
    let mut config = observe::config::Config::new(
        &args.logging.log_filter,
        Some(args.logging.log_stderr_threshold),
        false,
    );
    if args.logging.log_json {
        config = config.with_json_format();
    }
    observe::tracing::initialize(&config);
    observe::metrics::setup_registry(Some("swap".into()), None);
    tracing::info!("running swap client with validated arguments:\n{}", args);

    let result = tokio::select! {
        result = run(args) => result,
        _ = shutdown_signal() => {
            tracing::info!("received shutdown signal, stopping");
            Ok(())
        }
    };
    result?;

    tracing::debug!(
        metrics = %observe::metrics::encode(observe::metrics::get_registry()),
        "final metrics"
    );
    Ok(())
}

async fn run(args: Arguments) -> Result<()> {
    let http_factory = HttpClientFactory::new(&args.http_client);
    let client = http_factory
        .create()
        .context("failed to build http client")?;
    let api = HttpOrderbookApi::new(client, &args.backend_url)
        .with_context(|| format!("invalid backend url {:?}", args.backend_url))?;
    let queries = OrderQueries::new(Arc::new(api));
    let wallet = args.wallet.context();

    commands::execute(&queries, &wallet, args.command).await
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Intercept main signals for graceful shutdown. Ctrl-C sends sigint.
    let Ok(mut interrupt) = signal(SignalKind::interrupt()) else {
        tracing::warn!("failed to install SIGINT handler");
        return std::future::pending().await;
    };
    let Ok(mut terminate) = signal(SignalKind::terminate()) else {
        tracing::warn!("failed to install SIGTERM handler");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
}

#[cfg(windows)]
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
