//! In-memory `DomainChain` used by the pipeline tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::collections::HashSet;
use std::sync::Mutex;

use super::{DomainChain, GeneratedWallet, TxConfirmation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Transfer { to: Address, value: U256 },
    Exists { name: String },
    Estimate { owner: Address, name: String },
    GasPrice,
    Mint { owner: Address, name: String, gas_limit: U256, gas_price: U256 },
}

pub struct MockChain {
    pub master: Address,
    pub gas_limit: U256,
    pub gas_price: U256,
    /// Transfers to these addresses fail
    pub failing_transfers: HashSet<Address>,
    pub transfers_fail: bool,
    /// Mints from these addresses fail at estimation
    pub failing_mints: HashSet<Address>,
    /// Every existence check answers this
    pub domains_taken: bool,
    pub exists_fails: bool,
    calls: Mutex<Vec<Call>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            master: Address::repeat_byte(0x11),
            gas_limit: U256::from(120_000u64),
            gas_price: U256::from(100_000_000u64),
            failing_transfers: HashSet::new(),
            transfers_fail: false,
            failing_mints: HashSet::new(),
            domains_taken: false,
            exists_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn transfers(&self) -> Vec<(Address, U256)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Transfer { to, value } => Some((to, value)),
                _ => None,
            })
            .collect()
    }

    pub fn mints(&self) -> Vec<(Address, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Mint { owner, name, .. } => Some((owner, name)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }
}

#[async_trait]
impl DomainChain for MockChain {
    fn master_address(&self) -> Address {
        self.master
    }

    async fn transfer(&self, to: Address, value: U256) -> Result<TxConfirmation> {
        let n = self.record(Call::Transfer { to, value });
        if self.transfers_fail || self.failing_transfers.contains(&to) {
            bail!("insufficient funds for gas * price + value");
        }
        Ok(TxConfirmation {
            tx_hash: H256::from_low_u64_be(n as u64),
            block_number: Some(n as u64),
        })
    }

    async fn domain_exists(&self, name: &str) -> Result<bool> {
        self.record(Call::Exists { name: name.to_string() });
        if self.exists_fails {
            bail!("execution reverted");
        }
        Ok(self.domains_taken)
    }

    async fn estimate_mint_gas(&self, wallet: &GeneratedWallet, name: &str) -> Result<U256> {
        self.record(Call::Estimate {
            owner: wallet.address,
            name: name.to_string(),
        });
        if self.failing_mints.contains(&wallet.address) {
            bail!("insufficient funds for gas");
        }
        Ok(self.gas_limit)
    }

    async fn gas_price(&self) -> Result<U256> {
        self.record(Call::GasPrice);
        Ok(self.gas_price)
    }

    async fn mint_domain(
        &self,
        wallet: &GeneratedWallet,
        name: &str,
        gas_limit: U256,
        gas_price: U256,
    ) -> Result<TxConfirmation> {
        let n = self.record(Call::Mint {
            owner: wallet.address,
            name: name.to_string(),
            gas_limit,
            gas_price,
        });
        Ok(TxConfirmation {
            tx_hash: H256::from_low_u64_be(n as u64),
            block_number: Some(n as u64),
        })
    }
}
