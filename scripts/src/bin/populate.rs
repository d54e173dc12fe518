//! Seed a test/staging deployment of the protocol with mock data.
//!
//! Derives 20 wallets from the seed phrase in `MNEMONIC`, splits them into
//! users and proxies, and drives the fixed seven-stage population sequence
//! against the contracts deployed on the chosen network. The sequence is a
//! script, not an adaptive process: a failure anywhere aborts the run and
//! leaves the deployment partially populated.

use anyhow::{Context, Result};
use clap::Parser;
use helpers::connectors::NetworkConnectors;
use helpers::stages::{populate_all, PopulationAmounts};
use helpers::wallet::provision_wallets;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "populate", about = "Populate a test deployment with mock data")]
struct Args {
    /// Target network; must be present in the static address book.
    #[arg(long, default_value = "localhost")]
    network: String,

    /// Chain id wallets sign with.
    #[arg(long, default_value_t = 1337)]
    chain_id: u64,

    /// Number of wallets to derive; split half users, half proxies.
    #[arg(long, default_value_t = 20)]
    wallets: u32,

    /// Content pinning service endpoint.
    #[arg(long, default_value = "https://api.thegraph.com/ipfs")]
    ipfs: String,

    /// GRT transferred to every wallet in the funding stage.
    #[arg(long, default_value = "100000")]
    funding_amount: String,

    /// Also send this much ETH to every non-governor wallet before the
    /// funding stage. Only useful on a fresh deployment.
    #[arg(long)]
    send_eth: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let mnemonic = std::env::var("MNEMONIC")
        .context("MNEMONIC must hold the seed phrase of the governor account")?;
    let provider_url =
        std::env::var("PROVIDER_URL").unwrap_or_else(|_| "http://localhost:8545".to_string());

    info!(
        network = %args.network,
        provider = %provider_url,
        wallets = args.wallets,
        "populating deployment"
    );

    let wallets = provision_wallets(&mnemonic, args.chain_id, args.wallets)?;
    let factory = NetworkConnectors::new(&args.network, &provider_url, &args.ipfs)?;
    let amounts = PopulationAmounts {
        funding: args.funding_amount,
        send_eth: args.send_eth,
        ..PopulationAmounts::default()
    };

    populate_all(&factory, &wallets, &amounts).await
}
