use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::chain::{EncryptedFileStore, KeyStore, PlaintextFileStore};
use crate::orchestrator::OrchestratorConfig;

pub const DEFAULT_CONFIG_PATH: &str = "fam_minter.toml";

/// Simulated ETH price in USD. Replace with a live feed via `PriceSource`.
pub const DEFAULT_ETH_PRICE_USD: i64 = 1_800_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub funding: FundingConfig,
    #[serde(default)]
    pub wallets: WalletsConfig,
    #[serde(default)]
    pub minting: MintingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChainConfig {
    // Note: the master private key is provided via MASTER_PRIVATE_KEY only.
    // Never store it in config files!
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default)]
    pub domain_contract: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingConfig {
    /// USD value sent to every generated wallet
    pub usd_amount: String,
    /// USD per ETH used by the fixed price source
    pub eth_price_usd: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreKind {
    #[default]
    Plaintext,
    Encrypted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletsConfig {
    pub count: usize,
    pub output_dir: PathBuf,
    pub keystore: KeyStoreKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MintingConfig {
    pub domain_suffix: String,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            usd_amount: "5".to_string(),
            eth_price_usd: DEFAULT_ETH_PRICE_USD.to_string(),
        }
    }
}

impl Default for WalletsConfig {
    fn default() -> Self {
        Self {
            count: 5,
            output_dir: PathBuf::from("."),
            keystore: KeyStoreKind::Plaintext,
        }
    }
}

impl Default for MintingConfig {
    fn default() -> Self {
        Self {
            domain_suffix: ".fam".to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Load the file when it exists. Only a missing `DEFAULT_CONFIG_PATH`
    /// falls back to defaults; any other path must exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        if path != Path::new(DEFAULT_CONFIG_PATH) {
            anyhow::bail!("config file {} not found", path.display());
        }
        tracing::debug!("No config file at {}, using defaults", path.display());
        Ok(Self::default())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parsed USD amount. Not checked for sign here; the funder rejects
    /// negative amounts when it computes the transfer value.
    pub fn usd_amount(&self) -> Result<Decimal> {
        self.funding
            .usd_amount
            .trim()
            .parse()
            .with_context(|| format!("parsing ETH_TRANSFER_AMOUNT {:?}", self.funding.usd_amount))
    }

    pub fn eth_price_usd(&self) -> Result<Decimal> {
        self.funding
            .eth_price_usd
            .trim()
            .parse()
            .with_context(|| format!("parsing eth_price_usd {:?}", self.funding.eth_price_usd))
    }

    /// Key store selected by `[wallets] keystore`, writing into `output_dir`
    pub fn key_store(&self, passphrase: Option<String>) -> Result<Box<dyn KeyStore>> {
        let dir = self.wallets.output_dir.clone();
        match self.wallets.keystore {
            KeyStoreKind::Plaintext => {
                warn!("Private keys will be written unencrypted to {}", dir.display());
                Ok(Box::new(PlaintextFileStore::new(dir)))
            }
            KeyStoreKind::Encrypted => {
                let passphrase = passphrase
                    .context("KEYSTORE_PASSPHRASE must be set for the encrypted key store")?;
                Ok(Box::new(EncryptedFileStore::new(dir, passphrase)))
            }
        }
    }

    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig> {
        Ok(OrchestratorConfig {
            wallet_count: self.wallets.count,
            usd_amount: self.usd_amount()?,
            domain_suffix: self.minting.domain_suffix.clone(),
        })
    }
}
