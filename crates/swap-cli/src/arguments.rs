use {
    model::wallet::WalletContext,
    orderbook_client::http_client,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    tracing::Level,
};

macro_rules! logging_args_with_default_filter {
    ($struct_name:ident, $default_filter:literal) => {
        #[derive(clap::Parser)]
        pub struct $struct_name {
            #[clap(long, env, default_value = $default_filter)]
            pub log_filter: String,

            #[clap(long, env, default_value = "error")]
            pub log_stderr_threshold: Level,

            /// Emit log events as JSON lines.
            #[clap(long, env)]
            pub log_json: bool,
        }

        impl Display for $struct_name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                let Self {
                    log_filter,
                    log_stderr_threshold,
                    log_json,
                } = self;

                writeln!(f, "log_filter: {log_filter}")?;
                writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
                writeln!(f, "log_json: {log_json}")?;
                Ok(())
            }
        }
    };
}

logging_args_with_default_filter!(LoggingArguments, "warn,swap_cli=info,orderbook_client=info");

/// The wallet the commands act for. Connecting a wallet is out of scope, so
/// its address is configured directly.
#[derive(clap::Parser)]
#[group(skip)]
pub struct WalletArguments {
    /// Address of the maker. Commands that need a connected wallet fail
    /// without it.
    #[clap(long, env = "MAKER_ADDRESS")]
    pub maker: Option<String>,

    #[clap(long, env, default_value = "1")]
    pub chain_id: u64,
}

impl WalletArguments {
    pub fn context(&self) -> WalletContext {
        match &self.maker {
            Some(maker) => WalletContext::connected(maker.clone(), self.chain_id),
            None => WalletContext::disconnected(),
        }
    }
}

impl Display for WalletArguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self { maker, chain_id } = self;

        writeln!(f, "maker: {}", maker.as_deref().unwrap_or("None"))?;
        writeln!(f, "chain_id: {chain_id}")
    }
}

#[derive(clap::Parser)]
#[clap(name = "swap", about = "Cross-chain Dutch auction swaps")]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    #[clap(flatten)]
    pub http_client: http_client::Arguments,

    #[clap(flatten)]
    pub wallet: WalletArguments,

    /// Base URL of the order backend.
    #[clap(
        long,
        env = "BACKEND_API_URL",
        default_value = orderbook_client::api::DEFAULT_URL,
    )]
    pub backend_url: String,

    #[clap(subcommand)]
    pub command: Command,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            logging,
            http_client,
            wallet,
            backend_url,
            command,
        } = self;

        write!(f, "{logging}")?;
        write!(f, "{http_client}")?;
        write!(f, "{wallet}")?;
        writeln!(f, "backend_url: {backend_url}")?;
        writeln!(f, "command: {command:?}")
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Orders of the configured maker.
    Orders {
        #[clap(long)]
        status: Option<model::OrderStatus>,
        #[clap(long)]
        src_chain_id: Option<u64>,
        #[clap(long)]
        dst_chain_id: Option<u64>,
        #[clap(long)]
        page: Option<u32>,
        #[clap(long)]
        limit: Option<u32>,
    },
    /// Running auctions with their current prices.
    Auctions {
        #[clap(long)]
        src_chain_id: Option<u64>,
    },
    /// Order history of the configured maker.
    History,
    /// Details and current auction state of one order.
    Order { order_id: String },
    /// Follows an order until it reaches a final status.
    Watch { order_id: String },
    /// Submits a signed order read from a JSON file.
    Create {
        #[clap(long)]
        request: PathBuf,
    },
    /// Validates a swap and estimates its outcome without sending anything.
    Quote {
        #[clap(long, default_value = "ETH")]
        from_token: String,
        #[clap(long, default_value = "USDC")]
        to_token: String,
        #[clap(long, default_value = "Ethereum")]
        from_chain: String,
        #[clap(long, default_value = "Sepolia")]
        to_chain: String,
        #[clap(long)]
        amount: String,
        /// Tolerated slippage in percent.
        #[clap(long, default_value = "0.5")]
        slippage: String,
        #[clap(
            long,
            default_value = "5m",
            value_parser = humantime::parse_duration,
        )]
        auction_duration: Duration,
        /// Quote the opposite direction, selling the estimated output.
        #[clap(long)]
        reverse: bool,
    },
    /// Plays the simulated swap lifecycle.
    Demo {
        #[clap(
            long,
            default_value = "100ms",
            value_parser = humantime::parse_duration,
        )]
        tick: Duration,
    },
    /// Health of the backend and the chains it follows.
    Health,
    /// Chains supported by the backend.
    Chains,
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[test]
    fn parses_defaults() {
        let args = Arguments::parse_from(["swap", "--maker", "0xmaker", "history"]);
        assert_eq!(args.backend_url, "http://localhost:3003");
        assert_eq!(args.http_client.http_timeout, Duration::from_secs(10));
        assert_eq!(args.logging.log_stderr_threshold, Level::ERROR);
        assert_eq!(args.wallet.context().address(), Some("0xmaker"));
        assert_eq!(args.wallet.context().chain_id(), Some(1));
        assert!(matches!(args.command, Command::History));
    }

    #[test]
    fn parses_quote() {
        let args = Arguments::parse_from([
            "swap",
            "quote",
            "--amount",
            "1.5",
            "--to-chain",
            "Core",
            "--auction-duration",
            "2m",
        ]);
        let Command::Quote {
            amount,
            to_chain,
            auction_duration,
            reverse,
            ..
        } = args.command
        else {
            panic!("expected quote command");
        };
        assert_eq!(amount, "1.5");
        assert_eq!(to_chain, "Core");
        assert_eq!(auction_duration, Duration::from_secs(120));
        assert!(!reverse);
    }

    #[test]
    fn displays_arguments() {
        let args = Arguments::parse_from(["swap", "order", "abc"]);
        let display = args.to_string();
        assert!(display.contains("backend_url: http://localhost:3003\n"));
        assert!(display.contains("maker: None\n"));
        assert!(display.contains("http_timeout: 10s\n"));
        assert!(args.wallet.context().address().is_none());
    }
}
