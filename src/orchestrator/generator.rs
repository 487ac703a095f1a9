use anyhow::{Context, Result};
use rand::{CryptoRng, Rng};
use tracing::info;

use crate::chain::wallet::{GeneratedWallet, KeyStore};

/// Create `count` wallets and hand each to `store` as it is created.
///
/// A store failure aborts generation; wallets already persisted stay on disk.
pub fn generate_wallets<R: Rng + CryptoRng>(
    count: usize,
    store: &dyn KeyStore,
    rng: &mut R,
) -> Result<Vec<GeneratedWallet>> {
    let mut wallets = Vec::with_capacity(count);

    for index in 1..=count {
        let wallet = GeneratedWallet::random(index, rng);
        store
            .persist(&wallet)
            .with_context(|| format!("persisting wallet {}", index))?;
        info!("Wallet {} - Address: {}", index, wallet.checksum_address());
        wallets.push(wallet);
    }

    Ok(wallets)
}
