use anyhow::{bail, Context, Result};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use ethers::utils::to_checksum;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Freshly generated EVM wallet.
/// Private key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct GeneratedWallet {
    /// 1-based position in the generated batch
    #[zeroize(skip)]
    pub index: usize,
    #[zeroize(skip)]
    pub address: Address,

    private_key_bytes: [u8; 32],
}

/// On-disk shape of a wallet, matching the usual `{address, privateKey}` JSON.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub address: String,
    pub private_key: String,
}

impl GeneratedWallet {
    /// Create a wallet from a random secp256k1 key
    pub fn random<R: Rng + CryptoRng>(index: usize, rng: &mut R) -> Self {
        let wallet = LocalWallet::new(rng);
        let mut private_key_bytes = [0u8; 32];
        private_key_bytes.copy_from_slice(&wallet.signer().to_bytes());

        Self {
            index,
            address: wallet.address(),
            private_key_bytes,
        }
    }

    /// Rebuild a wallet from raw key bytes
    pub fn from_private_key(index: usize, key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            bail!("private key must be 32 bytes, got {}", key.len());
        }
        let wallet = LocalWallet::from_bytes(key).context("invalid private key bytes")?;
        let mut private_key_bytes = [0u8; 32];
        private_key_bytes.copy_from_slice(key);

        Ok(Self {
            index,
            address: wallet.address(),
            private_key_bytes,
        })
    }

    /// EIP-55 checksummed address, e.g. `0xAbCd...`
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.address, None)
    }

    /// `0x`-prefixed hex private key.
    /// Note: Caller is responsible for secure handling
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.private_key_bytes)))
    }

    pub(crate) fn private_key_bytes(&self) -> &[u8; 32] {
        &self.private_key_bytes
    }

    /// Signer bound to the given chain id
    pub fn signer(&self, chain_id: u64) -> Result<LocalWallet> {
        let wallet = LocalWallet::from_bytes(&self.private_key_bytes)
            .context("stored private key is not a valid secp256k1 scalar")?;
        Ok(wallet.with_chain_id(chain_id))
    }

    pub fn to_record(&self) -> WalletRecord {
        WalletRecord {
            address: self.checksum_address(),
            private_key: self.private_key_hex().to_string(),
        }
    }
}

impl std::fmt::Debug for GeneratedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedWallet")
            .field("index", &self.index)
            .field("address", &self.checksum_address())
            .finish_non_exhaustive()
    }
}
