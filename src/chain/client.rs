use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, TransactionRequest, H256, U256};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::chain::contract::DomainRegistry;
use crate::chain::wallet::GeneratedWallet;
use crate::error::FamError;

/// Connection settings for the EVM JSON-RPC endpoint
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// HTTP JSON-RPC endpoint (e.g., an Arbitrum node)
    pub rpc_url: String,
    /// Hex private key of the funding wallet
    pub master_private_key: Zeroizing<String>,
    /// Address of the domain registry contract
    pub domain_contract: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("rpc_url", &self.rpc_url)
            .field("master_private_key", &"<redacted>")
            .field("domain_contract", &self.domain_contract)
            .finish()
    }
}

/// Proof that a submitted transaction made it into a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfirmation {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}

impl From<&TransactionReceipt> for TxConfirmation {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        }
    }
}

/// Every network interaction the pipeline performs.
#[async_trait]
pub trait DomainChain: Send + Sync {
    /// Address the funding transfers originate from
    fn master_address(&self) -> Address;

    /// Send `value` wei from the master wallet and wait for the receipt
    async fn transfer(&self, to: Address, value: U256) -> Result<TxConfirmation>;

    /// `checkDomainExists(name)`
    async fn domain_exists(&self, name: &str) -> Result<bool>;

    /// Gas needed for `wallet` to call `mintDomain(wallet, name)`
    async fn estimate_mint_gas(&self, wallet: &GeneratedWallet, name: &str) -> Result<U256>;

    async fn gas_price(&self) -> Result<U256>;

    /// Submit `mintDomain(wallet, name)` signed by `wallet` and wait for the receipt
    async fn mint_domain(
        &self,
        wallet: &GeneratedWallet,
        name: &str,
        gas_limit: U256,
        gas_price: U256,
    ) -> Result<TxConfirmation>;
}

type SigningClient = SignerMiddleware<Provider<Http>, LocalWallet>;

fn http_provider(rpc_url: &str) -> Result<Provider<Http>> {
    Provider::<Http>::try_from(rpc_url)
        .with_context(|| format!("invalid ARBITRUM_RPC_URL {:?}", rpc_url))
}

fn registry_address(raw: &str) -> Result<Address> {
    raw.trim()
        .parse()
        .with_context(|| format!("parsing DOMAIN_CONTRACT_ADDRESS {:?}", raw))
}

/// Read-only `checkDomainExists(name)`; needs no signer.
pub async fn check_domain(rpc_url: &str, domain_contract: &str, name: &str) -> Result<bool> {
    let registry = DomainRegistry::new(
        registry_address(domain_contract)?,
        Arc::new(http_provider(rpc_url)?),
    );
    let exists = registry
        .check_domain_exists(name.to_string())
        .call()
        .await
        .with_context(|| format!("checkDomainExists({name})"))?;
    Ok(exists)
}

/// `DomainChain` over an HTTP JSON-RPC provider.
///
/// Nothing touches the network until the first call; the chain id is fetched
/// once, by the first transaction that needs a signer.
pub struct EthersChain {
    provider: Provider<Http>,
    master_wallet: LocalWallet,
    registry: DomainRegistry<Provider<Http>>,
    contract_address: Address,
    chain_id: OnceCell<u64>,
}

impl EthersChain {
    /// Build the provider, parse the master key and set up the registry binding.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        info!("Using RPC endpoint {}", config.rpc_url);

        let provider = http_provider(&config.rpc_url)?;
        let master_wallet: LocalWallet = config
            .master_private_key
            .trim()
            .parse()
            .context("parsing MASTER_PRIVATE_KEY")?;

        let contract_address = registry_address(&config.domain_contract)?;
        let registry = DomainRegistry::new(contract_address, Arc::new(provider.clone()));

        Ok(Self {
            provider,
            master_wallet,
            registry,
            contract_address,
            chain_id: OnceCell::new(),
        })
    }

    async fn chain_id(&self) -> Result<u64> {
        let chain_id = self
            .chain_id
            .get_or_try_init(|| async {
                let id = self
                    .provider
                    .get_chainid()
                    .await
                    .context("querying chain id")?
                    .as_u64();
                info!("Connected to chain {}", id);
                Ok::<_, anyhow::Error>(id)
            })
            .await?;
        Ok(*chain_id)
    }

    /// Provider that signs as the master wallet
    async fn master_client(&self) -> Result<SigningClient> {
        let chain_id = self.chain_id().await?;
        Ok(SignerMiddleware::new(
            self.provider.clone(),
            self.master_wallet.clone().with_chain_id(chain_id),
        ))
    }

    /// Registry binding that signs as `wallet`
    async fn registry_for(&self, wallet: &GeneratedWallet) -> Result<DomainRegistry<SigningClient>> {
        let signer = wallet.signer(self.chain_id().await?)?;
        let client = SignerMiddleware::new(self.provider.clone(), signer);
        Ok(DomainRegistry::new(self.contract_address, Arc::new(client)))
    }
}

#[async_trait]
impl DomainChain for EthersChain {
    fn master_address(&self) -> Address {
        self.master_wallet.address()
    }

    async fn transfer(&self, to: Address, value: U256) -> Result<TxConfirmation> {
        let master = self.master_client().await?;
        let tx = TransactionRequest::pay(to, value).from(master.address());
        let pending = master
            .send_transaction(tx, None)
            .await
            .context("submitting transfer")?;
        let tx_hash = pending.tx_hash();
        debug!("Transfer to {:?} pending: {:?}", to, tx_hash);

        let receipt = pending
            .await
            .context("waiting for transfer receipt")?
            .ok_or_else(|| FamError::Dropped {
                tx_hash: format!("{:?}", tx_hash),
            })?;
        Ok(TxConfirmation::from(&receipt))
    }

    async fn domain_exists(&self, name: &str) -> Result<bool> {
        let exists = self
            .registry
            .check_domain_exists(name.to_string())
            .call()
            .await
            .with_context(|| format!("checkDomainExists({name})"))?;
        Ok(exists)
    }

    async fn estimate_mint_gas(&self, wallet: &GeneratedWallet, name: &str) -> Result<U256> {
        let registry = self.registry_for(wallet).await?;
        let gas = registry
            .mint_domain(wallet.address, name.to_string())
            .estimate_gas()
            .await
            .context("estimating mintDomain gas")?;
        Ok(gas)
    }

    async fn gas_price(&self) -> Result<U256> {
        let price = self
            .provider
            .get_gas_price()
            .await
            .context("fetching gas price")?;
        Ok(price)
    }

    async fn mint_domain(
        &self,
        wallet: &GeneratedWallet,
        name: &str,
        gas_limit: U256,
        gas_price: U256,
    ) -> Result<TxConfirmation> {
        let registry = self.registry_for(wallet).await?;
        let call = registry
            .mint_domain(wallet.address, name.to_string())
            .gas(gas_limit)
            .gas_price(gas_price);

        let pending = call.send().await.context("submitting mintDomain")?;
        let tx_hash = pending.tx_hash();
        debug!("Mint of {} pending: {:?}", name, tx_hash);

        let receipt = pending
            .await
            .context("waiting for mintDomain receipt")?
            .ok_or_else(|| FamError::Dropped {
                tx_hash: format!("{:?}", tx_hash),
            })?;
        Ok(TxConfirmation::from(&receipt))
    }
}
