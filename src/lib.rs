// Library exports for fam_minter

pub mod chain;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pricing;

// Re-export main types for convenience
pub use chain::{ClientConfig, DomainChain, EthersChain, GeneratedWallet, KeyStore};
pub use error::FamError;
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunSummary};
pub use pricing::{FixedPrice, PriceSource};
