//! Local checks and estimates for a swap before it is turned into an order.
//!
//! Everything here runs without network access so that obviously broken
//! input never reaches the backend.

use {
    bigdecimal::{BigDecimal, RoundingMode},
    model::{order::AuctionParams, wallet::WalletContext},
    std::{collections::HashMap, str::FromStr},
    thiserror::Error,
};

/// Share of the input amount a swap is expected to return after fees, in
/// thousandths.
const OUTPUT_AFTER_FEES_PERMILLE: i64 = 997;

/// Slippage tolerance above this percentage is rejected.
const MAX_SLIPPAGE_PERCENT: u32 = 50;

/// Estimates are rounded to this many fractional digits.
const ESTIMATE_DECIMALS: i64 = 18;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    #[error("wallet not connected")]
    WalletNotConnected,
    #[error("amount {0:?} must be a positive number")]
    InvalidAmount(String),
    #[error("slippage {0:?} must be a percentage above 0 and at most 50")]
    InvalidSlippage(String),
    #[error("{0} token is missing")]
    MissingToken(&'static str),
    #[error("unknown {0} chain {1:?}")]
    UnknownChain(&'static str, String),
    #[error("auction duration must be positive")]
    EmptyAuction,
}

/// Maps user facing chain names to chain ids.
#[derive(Clone, Debug)]
pub struct ChainRegistry {
    chains: HashMap<String, u64>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::empty()
            .with_chain("Ethereum", 1)
            .with_chain("Sepolia", 11155111)
            .with_chain("Core", 1116)
            .with_chain("Core Testnet", 1114)
    }
}

impl ChainRegistry {
    pub fn empty() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    pub fn with_chain(mut self, name: &str, chain_id: u64) -> Self {
        self.chains.insert(normalize(name), chain_id);
        self
    }

    /// Looks up a chain by name, ignoring case and surrounding whitespace.
    pub fn chain_id(&self, name: &str) -> Option<u64> {
        self.chains.get(&normalize(name)).copied()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A swap as entered by the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapParams {
    pub from_token: String,
    pub to_token: String,
    pub from_chain: String,
    pub to_chain: String,
    pub from_amount: String,
    /// Tolerated slippage in percent.
    pub slippage: String,
    /// Auction duration in seconds.
    pub auction_duration: u64,
}

impl Default for SwapParams {
    fn default() -> Self {
        Self {
            from_token: "ETH".to_string(),
            to_token: "USDC".to_string(),
            from_chain: "Ethereum".to_string(),
            to_chain: "Sepolia".to_string(),
            from_amount: String::new(),
            slippage: "0.5".to_string(),
            auction_duration: 300,
        }
    }
}

impl SwapParams {
    /// Checks the swap against the connected wallet and the known chains.
    /// Returns every problem at once rather than only the first one.
    pub fn validate(
        &self,
        wallet: &WalletContext,
        chains: &ChainRegistry,
    ) -> Result<ValidatedSwap, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let maker = wallet.address();
        if maker.is_none() {
            errors.push(ValidationError::WalletNotConnected);
        }
        let amount = parse_positive(&self.from_amount);
        if amount.is_none() {
            errors.push(ValidationError::InvalidAmount(self.from_amount.clone()));
        }
        let slippage = parse_positive(&self.slippage)
            .filter(|slippage| *slippage <= BigDecimal::from(MAX_SLIPPAGE_PERCENT));
        if slippage.is_none() {
            errors.push(ValidationError::InvalidSlippage(self.slippage.clone()));
        }
        if self.from_token.trim().is_empty() {
            errors.push(ValidationError::MissingToken("source"));
        }
        if self.to_token.trim().is_empty() {
            errors.push(ValidationError::MissingToken("destination"));
        }
        let src_chain_id = chains.chain_id(&self.from_chain);
        if src_chain_id.is_none() {
            errors.push(ValidationError::UnknownChain("source", self.from_chain.clone()));
        }
        let dst_chain_id = chains.chain_id(&self.to_chain);
        if dst_chain_id.is_none() {
            errors.push(ValidationError::UnknownChain(
                "destination",
                self.to_chain.clone(),
            ));
        }
        if self.auction_duration == 0 {
            errors.push(ValidationError::EmptyAuction);
        }

        match (maker, amount, slippage, src_chain_id, dst_chain_id) {
            (Some(maker), Some(amount), Some(slippage), Some(src), Some(dst))
                if errors.is_empty() =>
            {
                Ok(ValidatedSwap {
                    maker: maker.to_owned(),
                    from_token: self.from_token.trim().to_owned(),
                    to_token: self.to_token.trim().to_owned(),
                    src_chain_id: src,
                    dst_chain_id: dst,
                    from_amount: amount,
                    slippage,
                    auction_duration: self.auction_duration,
                })
            }
            _ => Err(errors),
        }
    }

    /// The opposite direction of this swap, selling what this swap would
    /// have received.
    pub fn reversed(&self, from_amount: String) -> Self {
        Self {
            from_token: self.to_token.clone(),
            to_token: self.from_token.clone(),
            from_chain: self.to_chain.clone(),
            to_chain: self.from_chain.clone(),
            from_amount,
            ..self.clone()
        }
    }
}

fn parse_positive(value: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(value.trim())
        .ok()
        .filter(|value| *value > BigDecimal::from(0))
}

/// A swap that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedSwap {
    pub maker: String,
    pub from_token: String,
    pub to_token: String,
    pub src_chain_id: u64,
    pub dst_chain_id: u64,
    pub from_amount: BigDecimal,
    pub slippage: BigDecimal,
    pub auction_duration: u64,
}

/// Expected outcome of a swap.
#[derive(Clone, Debug, PartialEq)]
pub struct SwapQuote {
    pub estimated_output: BigDecimal,
    /// The least the user accepts after slippage.
    pub min_received: BigDecimal,
}

impl ValidatedSwap {
    pub fn quote(&self) -> SwapQuote {
        let estimated_output = estimate_output(&self.from_amount);
        let tolerance =
            BigDecimal::from(1) - &self.slippage / BigDecimal::from(100);
        let min_received = round(&estimated_output * tolerance);
        SwapQuote {
            estimated_output,
            min_received,
        }
    }

    /// Auction for this swap starting at `now`: the price starts at the
    /// estimated output and decays to the minimum the user accepts.
    pub fn auction_params(&self, now: u64) -> AuctionParams {
        let quote = self.quote();
        AuctionParams::starting_at(
            now,
            self.auction_duration,
            quote.estimated_output.normalized().to_plain_string(),
            quote.min_received.normalized().to_plain_string(),
        )
    }
}

/// Expected output for `amount` of input after swap fees.
pub fn estimate_output(amount: &BigDecimal) -> BigDecimal {
    round(amount * BigDecimal::new(OUTPUT_AFTER_FEES_PERMILLE.into(), 3))
}

fn round(value: BigDecimal) -> BigDecimal {
    value.with_scale_round(ESTIMATE_DECIMALS, RoundingMode::Down)
}
