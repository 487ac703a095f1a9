use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use fam_minter::chain::{check_domain, ClientConfig, EthersChain};
use fam_minter::config::{Config, KeyStoreKind, DEFAULT_CONFIG_PATH};
use fam_minter::orchestrator::{generate_wallets, Orchestrator};
use fam_minter::pricing::FixedPrice;

#[derive(Parser)]
#[command(name = "fam_minter")]
#[command(about = "Generate wallets, fund them and mint .fam domains", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate wallets, fund them from the master wallet and mint a domain for each
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,

        #[command(flatten)]
        network: NetworkArgs,

        #[command(flatten)]
        wallets: WalletArgs,

        /// USD value of ETH sent to each new wallet
        #[arg(long, env = "ETH_TRANSFER_AMOUNT")]
        usd_amount: Option<String>,
    },

    /// Only generate and store wallets
    Generate {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,

        #[command(flatten)]
        wallets: WalletArgs,
    },

    /// Ask the registry whether a name is taken
    CheckDomain {
        /// Full domain name, e.g. wallet-ABCD-1700000000000.fam
        name: String,

        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,

        #[command(flatten)]
        network: NetworkArgs,
    },

    /// Generate a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: String,
    },
}

#[derive(Args)]
struct NetworkArgs {
    /// JSON-RPC endpoint
    #[arg(long, env = "ARBITRUM_RPC_URL")]
    rpc_url: Option<String>,

    /// Private key of the funding wallet
    #[arg(long, env = "MASTER_PRIVATE_KEY", hide_env_values = true)]
    master_key: Option<String>,

    /// Domain registry contract address
    #[arg(long, env = "DOMAIN_CONTRACT_ADDRESS")]
    contract: Option<String>,
}

#[derive(Args)]
struct WalletArgs {
    /// Number of wallets to generate
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Directory the wallet files are written to
    #[arg(long)]
    output_dir: Option<std::path::PathBuf>,

    /// How generated keys are stored
    #[arg(long, value_enum)]
    keystore: Option<KeyStoreKind>,

    /// Passphrase for the encrypted key store
    #[arg(long, env = "KEYSTORE_PASSPHRASE", hide_env_values = true)]
    keystore_passphrase: Option<String>,
}

impl NetworkArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.rpc_url {
            config.chain.rpc_url = url.clone();
        }
        if let Some(contract) = &self.contract {
            config.chain.domain_contract = contract.clone();
        }
    }

    fn client_config(&self, config: &Config) -> ClientConfig {
        ClientConfig {
            rpc_url: config.chain.rpc_url.clone(),
            master_private_key: Zeroizing::new(self.master_key.clone().unwrap_or_default()),
            domain_contract: config.chain.domain_contract.clone(),
        }
    }
}

impl WalletArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(count) = self.count {
            config.wallets.count = count;
        }
        if let Some(dir) = &self.output_dir {
            config.wallets.output_dir = dir.clone();
        }
        if let Some(keystore) = self.keystore {
            config.wallets.keystore = keystore;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fam_minter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dispatch(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error in main execution: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            config,
            network,
            wallets,
            usd_amount,
        } => {
            let mut config = Config::load_or_default(&config)?;
            network.apply(&mut config);
            wallets.apply(&mut config);
            if let Some(amount) = usd_amount {
                config.funding.usd_amount = amount;
            }

            run(&config, &network, wallets.keystore_passphrase.clone()).await?;
        }
        Commands::Generate { config, wallets } => {
            let mut config = Config::load_or_default(&config)?;
            wallets.apply(&mut config);

            let store = config.key_store(wallets.keystore_passphrase.clone())?;
            let generated =
                generate_wallets(config.wallets.count, store.as_ref(), &mut rand::thread_rng())?;
            info!(
                "Generated {} wallets in {}",
                generated.len(),
                config.wallets.output_dir.display()
            );
        }
        Commands::CheckDomain {
            name,
            config,
            network,
        } => {
            let mut config = Config::load_or_default(&config)?;
            network.apply(&mut config);

            let exists =
                check_domain(&config.chain.rpc_url, &config.chain.domain_contract, &name).await?;
            if exists {
                info!("Domain {} is taken", name);
            } else {
                info!("Domain {} is available", name);
            }
        }
        Commands::Init { output } => {
            let config = Config::default();
            config.save(&output)?;
            info!("Configuration file created at: {}", output);
        }
    }

    Ok(())
}

async fn run(config: &Config, network: &NetworkArgs, passphrase: Option<String>) -> Result<()> {
    let chain = EthersChain::connect(&network.client_config(config))?;
    let store = config.key_store(passphrase)?;
    let prices = FixedPrice(config.eth_price_usd()?);

    let orchestrator = Orchestrator::new(
        config.orchestrator_config()?,
        &chain,
        store.as_ref(),
        &prices,
    );
    orchestrator.run().await?;
    Ok(())
}
