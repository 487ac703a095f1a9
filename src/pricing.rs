use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::types::U256;
use ethers::utils::parse_ether;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DEFAULT_ETH_PRICE_USD;
use crate::error::FamError;

/// Decimal places of ETH
const ETH_DECIMALS: u32 = 18;

/// Where the ETH/USD rate comes from
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// USD per ETH
    async fn eth_usd(&self) -> Result<Decimal>;
}

/// Constant rate. Replace with an API or oracle backed `PriceSource` for live prices.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrice(pub Decimal);

impl Default for FixedPrice {
    fn default() -> Self {
        Self(Decimal::from(DEFAULT_ETH_PRICE_USD))
    }
}

#[async_trait]
impl PriceSource for FixedPrice {
    async fn eth_usd(&self) -> Result<Decimal> {
        Ok(self.0)
    }
}

/// Wei worth `usd` at `price` USD/ETH, rounded half away from zero at 18 decimals.
pub fn transfer_amount(usd: Decimal, price: Decimal) -> Result<U256> {
    if price <= Decimal::ZERO {
        return Err(FamError::InvalidPrice(price).into());
    }
    if usd.is_sign_negative() && !usd.is_zero() {
        return Err(FamError::InvalidAmount(usd).into());
    }

    let eth = usd
        .checked_div(price)
        .ok_or(FamError::AmountOverflow { usd, price })?
        .round_dp_with_strategy(ETH_DECIMALS, RoundingStrategy::MidpointAwayFromZero);

    let wei = parse_ether(eth.to_string())
        .with_context(|| format!("converting {} ETH to wei", eth))?;
    Ok(wei)
}
