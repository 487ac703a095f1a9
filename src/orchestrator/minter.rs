use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use super::stats::{MintReport, MintedDomain};
use crate::chain::{DomainChain, GeneratedWallet, TxConfirmation};

/// Millisecond clock used to make names unique
pub type Clock = dyn Fn() -> i64 + Send + Sync;

pub fn system_clock() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `wallet-<first four hex digits of the address>-<millis><suffix>`
///
/// Names are unique only as long as two calls for the same address prefix
/// never share a millisecond.
pub fn domain_name(checksum_address: &str, timestamp_ms: i64, suffix: &str) -> String {
    let hex = checksum_address.strip_prefix("0x").unwrap_or(checksum_address);
    let fragment = hex.get(..4).unwrap_or(hex);
    format!("wallet-{}-{}{}", fragment, timestamp_ms, suffix)
}

enum MintOutcome {
    Minted(TxConfirmation),
    Taken,
}

/// Mint one domain per wallet, signed by the wallet itself.
///
/// Per-wallet errors are logged and recorded; the next wallet is still
/// attempted.
pub async fn mint_domains(
    chain: &dyn DomainChain,
    wallets: &[GeneratedWallet],
    suffix: &str,
    clock: &Clock,
) -> Result<MintReport> {
    let mut report = MintReport::default();

    for wallet in wallets {
        let name = domain_name(&wallet.checksum_address(), clock(), suffix);
        match mint_one(chain, wallet, &name).await {
            Ok(MintOutcome::Minted(confirmation)) => {
                info!(
                    tx = ?confirmation.tx_hash,
                    "Minted domain {} for wallet {}",
                    name,
                    wallet.checksum_address()
                );
                report.minted.push(MintedDomain {
                    owner: wallet.address,
                    name,
                    tx_hash: confirmation.tx_hash,
                });
            }
            Ok(MintOutcome::Taken) => {
                warn!("Domain {} already exists. Skipping...", name);
                report.skipped.push((wallet.address, name));
            }
            Err(e) => {
                error!("Error minting domain for {}: {:#}", wallet.checksum_address(), e);
                report.failed.push((wallet.address, format!("{:#}", e)));
            }
        }
    }

    Ok(report)
}

async fn mint_one(
    chain: &dyn DomainChain,
    wallet: &GeneratedWallet,
    name: &str,
) -> Result<MintOutcome> {
    if chain
        .domain_exists(name)
        .await
        .with_context(|| format!("checking whether {} exists", name))?
    {
        return Ok(MintOutcome::Taken);
    }

    let gas_limit = chain.estimate_mint_gas(wallet, name).await?;
    let gas_price = chain.gas_price().await?;
    debug!("Minting {} with gas limit {} at gas price {}", name, gas_limit, gas_price);

    let confirmation = chain.mint_domain(wallet, name, gas_limit, gas_price).await?;
    Ok(MintOutcome::Minted(confirmation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{Call, MockChain};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn wallets(n: usize) -> Vec<GeneratedWallet> {
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        (1..=n).map(|i| GeneratedWallet::random(i, &mut rng)).collect()
    }

    fn fixed_clock() -> i64 {
        1_700_000_000_000
    }

    #[test]
    fn test_domain_name_format() {
        assert_eq!(
            domain_name("0xABCD1234567890abcdef1234567890ABCDEF1234", 1_700_000_000_000, ".fam"),
            "wallet-ABCD-1700000000000.fam"
        );
    }

    #[test]
    fn test_domain_name_keeps_checksum_case() {
        assert_eq!(
            domain_name("0xaBcD000000000000000000000000000000000000", 42, ".fam"),
            "wallet-aBcD-42.fam"
        );
    }

    #[tokio::test]
    async fn test_mints_with_estimated_gas() {
        let chain = MockChain::new();
        let wallets = wallets(2);

        let report = mint_domains(&chain, &wallets, ".fam", &fixed_clock).await.unwrap();
        assert_eq!(report.minted.len(), 2);
        assert!(report.failed.is_empty());

        let expected = domain_name(&wallets[0].checksum_address(), fixed_clock(), ".fam");
        assert_eq!(
            chain.calls()[..4],
            [
                Call::Exists { name: expected.clone() },
                Call::Estimate { owner: wallets[0].address, name: expected.clone() },
                Call::GasPrice,
                Call::Mint {
                    owner: wallets[0].address,
                    name: expected,
                    gas_limit: chain.gas_limit,
                    gas_price: chain.gas_price,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_domain_is_not_minted() {
        let mut chain = MockChain::new();
        chain.domains_taken = true;

        let report = mint_domains(&chain, &wallets(3), ".fam", &fixed_clock).await.unwrap();
        assert_eq!(report.skipped.len(), 3);
        assert!(report.minted.is_empty());
        assert!(chain.mints().is_empty());
        assert!(chain
            .calls()
            .iter()
            .all(|call| matches!(call, Call::Exists { .. })));
    }

    #[tokio::test]
    async fn test_mint_failure_does_not_stop_next_wallet() {
        let wallets = wallets(3);
        let mut chain = MockChain::new();
        chain.failing_mints.insert(wallets[1].address);

        let report = mint_domains(&chain, &wallets, ".fam", &fixed_clock).await.unwrap();
        assert_eq!(report.minted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, wallets[1].address);

        let owners: Vec<_> = chain.mints().into_iter().map(|(owner, _)| owner).collect();
        assert_eq!(owners, vec![wallets[0].address, wallets[2].address]);
    }

    #[tokio::test]
    async fn test_existence_check_failure_is_isolated() {
        let mut chain = MockChain::new();
        chain.exists_fails = true;

        let report = mint_domains(&chain, &wallets(2), ".fam", &fixed_clock).await.unwrap();
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[0].1.contains("execution reverted"));
        assert!(chain.mints().is_empty());
    }

    #[tokio::test]
    async fn test_each_wallet_reads_the_clock() {
        let chain = MockChain::new();
        let ticks = AtomicI64::new(100);
        let clock = move || ticks.fetch_add(1, Ordering::SeqCst);

        let report = mint_domains(&chain, &wallets(2), ".xyz", &clock).await.unwrap();
        assert!(report.minted[0].name.ends_with("-100.xyz"));
        assert!(report.minted[1].name.ends_with("-101.xyz"));
    }
}
