mod keys;
mod store;

pub use keys::{GeneratedWallet, WalletRecord};
pub use store::{
    wallet_file_name, EncryptedFileStore, EncryptedWalletRecord, KeyStore, PlaintextFileStore,
};
