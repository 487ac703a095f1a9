//! Per-stage outcomes and the run summary built from them
use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of the funding stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundingReport {
    /// Wei sent to every wallet
    pub amount_wei: U256,
    pub funded: Vec<(Address, H256)>,
    pub failed: Vec<(Address, String)>,
}

/// Result of the minting stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MintReport {
    pub minted: Vec<MintedDomain>,
    /// Names that already existed
    pub skipped: Vec<(Address, String)>,
    pub failed: Vec<(Address, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintedDomain {
    pub owner: Address,
    pub name: String,
    pub tx_hash: H256,
}

/// Run summary snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Checksummed funding address
    pub master_address: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub wallets_generated: usize,
    pub funding: FundingReport,
    pub minting: MintReport,
}

impl RunSummary {
    pub fn funded_count(&self) -> usize {
        self.funding.funded.len()
    }

    pub fn minted_count(&self) -> usize {
        self.minting.minted.len()
    }

    /// Wallets that failed at any stage
    pub fn failure_count(&self) -> usize {
        self.funding.failed.len() + self.minting.failed.len()
    }

    pub fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            elapsed_ms = (self.finished_at - self.started_at).num_milliseconds(),
            failures = self.failure_count(),
            "Run complete: {} wallets, {} funded ({} failed), {} minted, {} skipped, {} mint failures",
            self.wallets_generated,
            self.funded_count(),
            self.funding.failed.len(),
            self.minted_count(),
            self.minting.skipped.len(),
            self.minting.failed.len(),
        );
        if self.failure_count() > 0 {
            tracing::warn!(
                run_id = %self.run_id,
                "{} wallet operations failed; see the errors above",
                self.failure_count(),
            );
        }
    }
}
