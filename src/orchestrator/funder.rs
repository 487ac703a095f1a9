use anyhow::Result;
use ethers::utils::format_ether;
use rust_decimal::Decimal;
use tracing::{error, info};

use super::stats::FundingReport;
use crate::chain::{DomainChain, GeneratedWallet};
use crate::pricing::{transfer_amount, PriceSource};

/// Send `usd_amount` worth of ETH from the master wallet to every wallet, one
/// transfer at a time.
///
/// A failed transfer is logged and recorded, and the next wallet is still
/// attempted. Only pricing errors abort the stage.
pub async fn fund_wallets(
    chain: &dyn DomainChain,
    wallets: &[GeneratedWallet],
    usd_amount: Decimal,
    prices: &dyn PriceSource,
) -> Result<FundingReport> {
    let price = prices.eth_usd().await?;
    let amount_wei = transfer_amount(usd_amount, price)?;
    info!(
        "Funding {} wallets with {} ETH each ({} USD at {} USD/ETH)",
        wallets.len(),
        format_ether(amount_wei),
        usd_amount,
        price
    );

    let mut report = FundingReport {
        amount_wei,
        ..Default::default()
    };

    for wallet in wallets {
        let address = wallet.checksum_address();
        match chain.transfer(wallet.address, amount_wei).await {
            Ok(confirmation) => {
                info!(
                    tx = ?confirmation.tx_hash,
                    "Transferred {} USD worth of ETH to {}",
                    usd_amount,
                    address
                );
                report.funded.push((wallet.address, confirmation.tx_hash));
            }
            Err(e) => {
                error!("Error transferring ETH to {}: {:#}", address, e);
                report.failed.push((wallet.address, format!("{:#}", e)));
            }
        }
    }

    Ok(report)
}
