//! Dutch auction price model.
//!
//! The price of an order falls linearly from its start price at the start of
//! its auction window to its end price at the end of the window and stays
//! clamped to those prices outside of it. All arithmetic is done on
//! arbitrary precision decimals so repeated evaluation never drifts.

use {
    bigdecimal::{BigDecimal, RoundingMode},
    model::order::{AuctionParams, Order, OrderStatus},
    std::str::FromStr,
    thiserror::Error,
};

/// Interpolated prices are rounded to at least this many fractional digits.
pub const PRICE_DECIMALS: i64 = 18;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("malformed auction window: end time {end} is not after start time {start}")]
    InvalidWindow { start: u64, end: u64 },
    #[error("{field} {value:?} is not a decimal number")]
    InvalidPrice { field: &'static str, value: String },
}

/// The parsed auction of a single order.
#[derive(Clone, Debug)]
pub struct DutchAuction<'a> {
    params: &'a AuctionParams,
    start_price: BigDecimal,
    end_price: BigDecimal,
    scale: i64,
}

impl<'a> DutchAuction<'a> {
    pub fn new(params: &'a AuctionParams) -> Result<Self, Error> {
        if params.end_time <= params.start_time {
            return Err(Error::InvalidWindow {
                start: params.start_time,
                end: params.end_time,
            });
        }
        let start_price = parse_price("start price", &params.start_price)?;
        let end_price = parse_price("end price", &params.end_price)?;
        // Both bounds must be representable at the output scale, otherwise
        // rounding could push an interpolated price outside of them.
        let scale = PRICE_DECIMALS
            .max(start_price.as_bigint_and_exponent().1)
            .max(end_price.as_bigint_and_exponent().1);
        Ok(Self {
            params,
            start_price,
            end_price,
            scale,
        })
    }

    fn duration(&self) -> u64 {
        self.params.end_time - self.params.start_time
    }

    /// The auction price at `now` (unix seconds) as a decimal string.
    ///
    /// Outside of the auction window the configured start or end price is
    /// returned verbatim.
    pub fn price_at(&self, now: u64) -> String {
        if now <= self.params.start_time {
            return self.params.start_price.clone();
        }
        if now >= self.params.end_time {
            return self.params.end_price.clone();
        }
        self.interpolate(now).normalized().to_plain_string()
    }

    /// Like [`Self::price_at`] but as a decimal, for comparisons.
    pub fn price_decimal_at(&self, now: u64) -> BigDecimal {
        if now <= self.params.start_time {
            return self.start_price.clone();
        }
        if now >= self.params.end_time {
            return self.end_price.clone();
        }
        self.interpolate(now)
    }

    fn interpolate(&self, now: u64) -> BigDecimal {
        let elapsed = BigDecimal::from(now - self.params.start_time);
        let duration = BigDecimal::from(self.duration());
        let decay = (&self.start_price - &self.end_price) * elapsed / duration;
        (&self.start_price - decay).with_scale_round(self.scale, RoundingMode::HalfEven)
    }

    /// Fraction of the auction window that has passed, clamped to `[0, 1]`.
    pub fn progress(&self, now: u64) -> f64 {
        let elapsed = now.saturating_sub(self.params.start_time).min(self.duration());
        elapsed as f64 / self.duration() as f64
    }

    /// Seconds until the auction window closes, never negative.
    pub fn time_remaining(&self, now: u64) -> u64 {
        self.params.end_time.saturating_sub(now)
    }

    /// Whether `now` lies inside the half open window `[start, end)`.
    pub fn contains(&self, now: u64) -> bool {
        self.params.start_time <= now && now < self.params.end_time
    }
}

fn parse_price(field: &'static str, value: &str) -> Result<BigDecimal, Error> {
    BigDecimal::from_str(value.trim()).map_err(|_| Error::InvalidPrice {
        field,
        value: value.to_owned(),
    })
}

/// Auction price of `order` at `now`, regardless of the order's status.
pub fn price(order: &Order, now: u64) -> Result<String, Error> {
    Ok(DutchAuction::new(&order.auction_params)?.price_at(now))
}

/// The price to show for `order` at `now`.
///
/// Active orders are priced by the auction model. Once an order left the
/// active state its auction no longer moves and the backend's last price is
/// authoritative.
pub fn display_price(order: &Order, now: u64) -> Result<String, Error> {
    match order.status {
        OrderStatus::Active => price(order, now),
        _ => Ok(order.current_price.clone()),
    }
}

/// Everything a price display needs for one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct AuctionView {
    pub current_price: String,
    pub progress: f64,
    pub time_remaining: u64,
    pub is_active: bool,
}

impl AuctionView {
    pub fn at(order: &Order, now: u64) -> Result<Self, Error> {
        let auction = DutchAuction::new(&order.auction_params)?;
        let is_active = order.status == OrderStatus::Active && auction.contains(now);
        let current_price = match order.status {
            OrderStatus::Active => auction.price_at(now),
            _ => order.current_price.clone(),
        };
        Ok(Self {
            current_price,
            progress: auction.progress(now),
            time_remaining: auction.time_remaining(now),
            is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(start_price: &str, end_price: &str) -> AuctionParams {
        AuctionParams {
            start_time: 1_000,
            end_time: 1_300,
            start_price: start_price.to_string(),
            end_price: end_price.to_string(),
            duration: 300,
        }
    }

    fn order(status: OrderStatus) -> Order {
        Order {
            auction_params: params("2000", "1900"),
            status,
            current_price: "1950".to_string(),
            ..Default::default()
        }
    }

    fn decimal(value: &str) -> BigDecimal {
        value.parse().unwrap()
    }

    #[test]
    fn interpolates_linearly() {
        let params = params("2000", "1900");
        let auction = DutchAuction::new(&params).unwrap();
        assert_eq!(auction.price_at(1_150), "1950");
        assert_eq!(auction.price_at(1_100), "1966.666666666666666667");
        assert_eq!(auction.price_at(1_200), "1933.333333333333333333");
    }

    #[test]
    fn returns_bounds_verbatim() {
        let params = params("2000.50", "1900.000");
        let auction = DutchAuction::new(&params).unwrap();
        assert_eq!(auction.price_at(0), "2000.50");
        assert_eq!(auction.price_at(999), "2000.50");
        assert_eq!(auction.price_at(1_000), "2000.50");
        assert_eq!(auction.price_at(1_300), "1900.000");
        assert_eq!(auction.price_at(u64::MAX), "1900.000");
    }

    #[test]
    fn price_never_increases_and_stays_within_bounds() {
        for (start, end) in [
            ("2000", "1900"),
            ("1", "0.999999999999999999"),
            ("0.000000000000000000007", "0.000000000000000000001"),
            ("115792089237316195423570985008687907853269984665640564039457", "3"),
            ("5", "5"),
        ] {
            let params = params(start, end);
            let auction = DutchAuction::new(&params).unwrap();
            let (upper, lower) = (decimal(start), decimal(end));
            let mut previous = auction.price_decimal_at(params.start_time);
            for now in params.start_time..params.end_time {
                let price = auction.price_decimal_at(now);
                assert!(price <= previous, "{start}->{end} rose at {now}");
                assert!(price <= upper && price >= lower, "{start}->{end} at {now}");
                assert_eq!(decimal(&auction.price_at(now)), price);
                previous = price;
            }
        }
    }

    #[test]
    fn keeps_precision_of_large_amounts() {
        let params = params("1000000000000000000000", "999999999999999999700");
        let auction = DutchAuction::new(&params).unwrap();
        assert_eq!(auction.price_at(1_001), "999999999999999999999");
        assert_eq!(auction.price_at(1_299), "999999999999999999701");
    }

    #[test]
    fn progress_and_time_remaining() {
        let params = params("2", "1");
        let auction = DutchAuction::new(&params).unwrap();
        assert_eq!(auction.progress(0), 0.);
        assert_eq!(auction.progress(1_150), 0.5);
        assert_eq!(auction.progress(5_000), 1.);

        assert_eq!(auction.time_remaining(5_000), 0);
        for now in 1_000..1_300 {
            for delta in [1, 7, 60] {
                let expected = auction.time_remaining(now).saturating_sub(delta);
                assert_eq!(auction.time_remaining(now + delta), expected);
            }
        }
        assert_eq!(auction.time_remaining(1_000), 300);
        assert_eq!(auction.time_remaining(1_010), 290);
    }

    #[test]
    fn rejects_malformed_window() {
        let mut params = params("2", "1");
        params.end_time = params.start_time;
        assert_eq!(
            DutchAuction::new(&params).unwrap_err(),
            Error::InvalidWindow {
                start: 1_000,
                end: 1_000
            }
        );
        params.end_time = 10;
        assert!(matches!(
            DutchAuction::new(&params),
            Err(Error::InvalidWindow { .. })
        ));
    }

    #[test]
    fn rejects_malformed_prices() {
        let params = params("two", "1");
        assert_eq!(
            DutchAuction::new(&params).unwrap_err(),
            Error::InvalidPrice {
                field: "start price",
                value: "two".to_string()
            }
        );
    }

    #[test]
    fn display_price_uses_backend_price_once_inactive() {
        assert_eq!(display_price(&order(OrderStatus::Active), 1_030).unwrap(), "1990");
        assert_eq!(display_price(&order(OrderStatus::Filled), 1_030).unwrap(), "1950");
        assert_eq!(price(&order(OrderStatus::Filled), 1_030).unwrap(), "1990");
    }

    #[test]
    fn auction_view() {
        let view = AuctionView::at(&order(OrderStatus::Active), 1_150).unwrap();
        assert_eq!(
            view,
            AuctionView {
                current_price: "1950".to_string(),
                progress: 0.5,
                time_remaining: 150,
                is_active: true,
            }
        );

        assert!(!AuctionView::at(&order(OrderStatus::Active), 1_300).unwrap().is_active);
        assert!(!AuctionView::at(&order(OrderStatus::Active), 999).unwrap().is_active);
        assert!(!AuctionView::at(&order(OrderStatus::Cancelled), 1_150).unwrap().is_active);
    }
}
