//! Pipeline Orchestrator - runs generation, funding and minting in order
//!
//! Each stage absorbs its own per-wallet failures. Any error a stage returns
//! ends the run.

use anyhow::{Context, Result};
use chrono::Utc;
use ethers::utils::to_checksum;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::chain::{DomainChain, KeyStore};
use crate::pricing::PriceSource;

mod funder;
mod generator;
mod minter;
mod stats;

pub use self::funder::fund_wallets;
pub use self::generator::generate_wallets;
pub use self::minter::{domain_name, mint_domains, system_clock, Clock};
pub use self::stats::{FundingReport, MintReport, MintedDomain, RunSummary};

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Number of wallets to create
    pub wallet_count: usize,
    /// USD value sent to each wallet
    pub usd_amount: Decimal,
    /// Appended to every minted name
    pub domain_suffix: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            wallet_count: 5,
            usd_amount: Decimal::from(5),
            domain_suffix: ".fam".to_string(),
        }
    }
}

/// Owns the collaborators for one run
pub struct Orchestrator<'a> {
    config: OrchestratorConfig,
    chain: &'a dyn DomainChain,
    store: &'a dyn KeyStore,
    prices: &'a dyn PriceSource,
    clock: &'a Clock,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: OrchestratorConfig,
        chain: &'a dyn DomainChain,
        store: &'a dyn KeyStore,
        prices: &'a dyn PriceSource,
    ) -> Self {
        Self {
            config,
            chain,
            store,
            prices,
            clock: &system_clock,
        }
    }

    /// Replace the millisecond clock used for domain names
    pub fn with_clock(mut self, clock: &'a Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Generate, fund, mint
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let master_address = to_checksum(&self.chain.master_address(), None);
        info!(%run_id, "Master wallet address: {}", master_address);

        let wallets = generate_wallets(self.config.wallet_count, self.store, &mut rand::thread_rng())
            .context("generating wallets")?;

        let funding = fund_wallets(self.chain, &wallets, self.config.usd_amount, self.prices)
            .await
            .context("funding wallets")?;

        let minting = mint_domains(self.chain, &wallets, &self.config.domain_suffix, self.clock)
            .await
            .context("minting domains")?;

        let summary = RunSummary {
            run_id,
            master_address,
            started_at,
            finished_at: Utc::now(),
            wallets_generated: wallets.len(),
            funding,
            minting,
        };
        summary.log();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{Call, MockChain};
    use crate::chain::PlaintextFileStore;
    use crate::pricing::FixedPrice;
    use ethers::types::U256;

    fn clock() -> i64 {
        1_700_000_000_000
    }

    #[tokio::test]
    async fn test_full_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let chain = MockChain::new();
        let store = PlaintextFileStore::new(dir.path());
        let prices = FixedPrice::default();
        let config = OrchestratorConfig {
            wallet_count: 2,
            ..Default::default()
        };

        let summary = Orchestrator::new(config, &chain, &store, &prices)
            .with_clock(&clock)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.wallets_generated, 2);
        assert_eq!(summary.funded_count(), 2);
        assert_eq!(summary.minted_count(), 2);
        assert_eq!(summary.funding.amount_wei, U256::from(2_777_777_778u64));
        assert!(dir.path().join("wallet_1.json").exists());
        assert!(dir.path().join("wallet_2.json").exists());
        assert_eq!(summary.master_address, to_checksum(&chain.master, None));

        // All transfers happen before the first existence check
        let calls = chain.calls();
        let first_check = calls
            .iter()
            .position(|c| matches!(c, Call::Exists { .. }))
            .unwrap();
        assert_eq!(first_check, 2);
        assert!(calls[..2].iter().all(|c| matches!(c, Call::Transfer { .. })));
    }

    #[tokio::test]
    async fn test_summary_records_checksummed_master() {
        let dir = tempfile::tempdir().unwrap();
        let mut chain = MockChain::new();
        chain.master = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let store = PlaintextFileStore::new(dir.path());
        let prices = FixedPrice::default();
        let config = OrchestratorConfig {
            wallet_count: 1,
            ..Default::default()
        };

        let summary = Orchestrator::new(config, &chain, &store, &prices)
            .with_clock(&clock)
            .run()
            .await
            .unwrap();
        assert_eq!(
            summary.master_address,
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[tokio::test]
    async fn test_funding_failure_still_mints() {
        let dir = tempfile::tempdir().unwrap();
        let mut chain = MockChain::new();
        chain.transfers_fail = true;
        let store = PlaintextFileStore::new(dir.path());
        let prices = FixedPrice::default();
        let config = OrchestratorConfig {
            wallet_count: 2,
            ..Default::default()
        };

        let summary = Orchestrator::new(config, &chain, &store, &prices)
            .with_clock(&clock)
            .run()
            .await
            .unwrap();
        assert_eq!(summary.funded_count(), 0);
        assert_eq!(summary.funding.failed.len(), 2);
        assert_eq!(chain.transfers().len(), 2);
        assert_eq!(summary.minted_count(), 2);
    }

    #[tokio::test]
    async fn test_bad_price_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let chain = MockChain::new();
        let store = PlaintextFileStore::new(dir.path());
        let prices = FixedPrice(Decimal::ZERO);

        let result = Orchestrator::new(OrchestratorConfig::default(), &chain, &store, &prices)
            .run()
            .await;

        assert!(result.is_err());
        assert!(chain.mints().is_empty());
        // Wallets were already generated and persisted
        assert!(dir.path().join("wallet_5.json").exists());
    }
}
