use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the pipeline itself, as opposed to errors bubbling up
/// from the RPC transport or the filesystem.
#[derive(Debug, Error)]
pub enum FamError {
    #[error("ETH price must be positive, got {0}")]
    InvalidPrice(Decimal),
    #[error("USD amount must not be negative, got {0}")]
    InvalidAmount(Decimal),
    #[error("transfer amount of {usd} USD at {price} USD/ETH does not fit in a decimal")]
    AmountOverflow { usd: Decimal, price: Decimal },
    #[error("transaction {tx_hash} was dropped before a receipt was produced")]
    Dropped { tx_hash: String },
    #[error("key store error: {0}")]
    KeyStore(String),
}
