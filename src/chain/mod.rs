pub mod wallet;
pub mod client;
pub mod contract;

#[cfg(test)]
pub(crate) mod mock;

pub use wallet::{GeneratedWallet, KeyStore, PlaintextFileStore, EncryptedFileStore};
pub use client::{check_domain, ClientConfig, DomainChain, EthersChain, TxConfirmation};
pub use contract::DomainRegistry;
