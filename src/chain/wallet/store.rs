use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Context, Result};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

use super::GeneratedWallet;
use crate::error::FamError;

const AES_NONCE_LEN: usize = 12;
const SALT_LEN: usize = 16;

/// Custody of generated key material.
///
/// The generator hands every wallet to a `KeyStore` before it is used for
/// anything else; a failing store aborts the run.
pub trait KeyStore: Send + Sync {
    /// Persist the wallet, returning where it went.
    fn persist(&self, wallet: &GeneratedWallet) -> Result<PathBuf>;
}

/// `wallet_<index>.json`
pub fn wallet_file_name(index: usize) -> String {
    format!("wallet_{}.json", index)
}

fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating wallet directory {}", parent.display()))?;
        }
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    // Owner-only from creation on Unix (0o600 = rw-------).
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("creating wallet file {}", path.display()))?;

    // `mode` only applies to new files; tighten a pre-existing one too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting permissions on {}", path.display()))?;
    }

    file.write_all(contents.as_bytes())
        .with_context(|| format!("writing wallet file {}", path.display()))?;
    Ok(())
}

/// Writes the key in clear as `{"address", "privateKey"}` JSON.
pub struct PlaintextFileStore {
    dir: PathBuf,
}

impl PlaintextFileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl KeyStore for PlaintextFileStore {
    fn persist(&self, wallet: &GeneratedWallet) -> Result<PathBuf> {
        let path = self.dir.join(wallet_file_name(wallet.index));
        let json = Zeroizing::new(serde_json::to_string(&wallet.to_record())?);
        write_private(&path, &json)?;
        debug!("Stored wallet {} in {}", wallet.index, path.display());
        Ok(path)
    }
}

/// Encrypted wallet file: AES-256-GCM under an Argon2id key derived from a
/// passphrase and a per-file salt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedWalletRecord {
    pub address: String,
    /// hex
    pub salt: String,
    /// hex of `nonce || ciphertext`
    pub ciphertext: String,
}

pub struct EncryptedFileStore {
    dir: PathBuf,
    passphrase: Zeroizing<String>,
}

impl EncryptedFileStore {
    pub fn new<P: Into<PathBuf>>(dir: P, passphrase: String) -> Self {
        Self {
            dir: dir.into(),
            passphrase: Zeroizing::new(passphrase),
        }
    }

    /// Decrypt a file written by this store.
    pub fn load<P: AsRef<Path>>(path: P, passphrase: &str) -> Result<GeneratedWallet> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading wallet file {}", path.display()))?;
        let record: EncryptedWalletRecord = serde_json::from_str(&json)
            .with_context(|| format!("parsing wallet file {}", path.display()))?;

        let salt = hex::decode(&record.salt).context("wallet salt is not hex")?;
        let payload = hex::decode(&record.ciphertext).context("wallet ciphertext is not hex")?;
        let key = Zeroizing::new(decrypt_key(&payload, passphrase, &salt)?);

        let index = index_from_file_name(path).unwrap_or(0);
        let wallet = GeneratedWallet::from_private_key(index, &key)?;
        if wallet.checksum_address() != record.address {
            return Err(FamError::KeyStore(format!(
                "decrypted key belongs to {}, file claims {}",
                wallet.checksum_address(),
                record.address
            ))
            .into());
        }
        Ok(wallet)
    }
}

impl KeyStore for EncryptedFileStore {
    fn persist(&self, wallet: &GeneratedWallet) -> Result<PathBuf> {
        let salt: [u8; SALT_LEN] = rand::random();
        let payload = encrypt_key(wallet.private_key_bytes(), &self.passphrase, &salt)?;
        let record = EncryptedWalletRecord {
            address: wallet.checksum_address(),
            salt: hex::encode(salt),
            ciphertext: hex::encode(payload),
        };

        let path = self.dir.join(wallet_file_name(wallet.index));
        write_private(&path, &serde_json::to_string_pretty(&record)?)?;
        debug!("Stored encrypted wallet {} in {}", wallet.index, path.display());
        Ok(path)
    }
}

fn index_from_file_name(path: &Path) -> Option<usize> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("wallet_")?
        .parse()
        .ok()
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let mut key = Zeroizing::new([0u8; 32]);
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|e| FamError::KeyStore(format!("key derivation failed: {e}")))?;
    Ok(key)
}

/// Returns `nonce || ciphertext`.
fn encrypt_key(plaintext: &[u8], passphrase: &str, salt: &[u8]) -> Result<Vec<u8>> {
    let key_bytes = derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes[..]));

    let nonce_bytes: [u8; AES_NONCE_LEN] = rand::random();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| FamError::KeyStore(format!("encryption failed: {e}")))?;

    let mut result = nonce_bytes.to_vec();
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

fn decrypt_key(payload: &[u8], passphrase: &str, salt: &[u8]) -> Result<Vec<u8>> {
    if payload.len() < AES_NONCE_LEN {
        return Err(FamError::KeyStore(format!(
            "ciphertext too short (expected at least {AES_NONCE_LEN} bytes for nonce)"
        ))
        .into());
    }
    let (nonce_bytes, encrypted) = payload.split_at(AES_NONCE_LEN);

    let key_bytes = derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes[..]));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
        .map_err(|_| FamError::KeyStore("decryption failed, wrong passphrase?".to_string()))?;
    Ok(plaintext)
}
