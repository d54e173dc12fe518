//! The population sequence: seven stages, entered exactly once, in a fixed
//! order, each serializing on transaction confirmation. A failure anywhere
//! unwinds to the caller and aborts the rest of the run; the target
//! deployment is then partially populated and needs manual inspection or a
//! fresh deployment before re-running.

use anyhow::{ensure, Result};
use tracing::info;

use crate::connectors::ConnectorFactory;
use crate::ipfs::bytes32_to_base58;
use crate::metadata::canonical_subgraph_name;
use crate::mock_data::{
    account_metadatas, deployment_ids_bytes32, subgraph_metadatas, CHANNEL_PUB_KEYS,
    DEPLOYMENT_IDS_BASE58, GEOHASHES, SERVICE_URLS,
};
use crate::wallet::WalletSet;

/// Production defaults restored at the end of the staking stage.
pub const DEFAULT_EPOCH_LENGTH: u64 = 5760;
pub const DEFAULT_THAWING_PERIOD: u32 = 20;

/// User wallet index whose first subgraph gets deprecated.
const DEPRECATED_SUBGRAPH_OWNER: usize = 5;

/// Amounts used across the sequence, in human-readable token units.
#[derive(Debug, Clone)]
pub struct PopulationAmounts {
    /// GRT transferred to every wallet up front.
    pub funding: String,
    /// Base curation signal per deployment.
    pub signal: String,
    /// Double-weight signal placed on the third shared deployment.
    pub signal_boost: String,
    /// Curation allowance covering all four signals.
    pub curation_allowance: String,
    /// Curation shares redeemed by the first half of the wallets.
    pub redeem_shares: String,
    /// GRT staked (and allocated, and settled) per wallet.
    pub stake: String,
    /// When set, ETH sent to every non-governor wallet before stage 1.
    pub send_eth: Option<String>,
}

impl Default for PopulationAmounts {
    fn default() -> Self {
        Self {
            funding: "100000".to_string(),
            signal: "5000".to_string(),
            signal_boost: "10000".to_string(),
            curation_allowance: "25000".to_string(),
            redeem_shares: "1".to_string(),
            stake: "10000".to_string(),
            send_eth: None,
        }
    }
}

/// The fixed stage sequence. The orchestrator advances through
/// [`Stage::SEQUENCE`] in order; there is no branching between stages and no
/// persisted checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GraphToken,
    DidRegistry,
    Ens,
    Gns,
    Curation,
    ServiceRegistry,
    Staking,
}

impl Stage {
    pub const SEQUENCE: [Stage; 7] = [
        Stage::GraphToken,
        Stage::DidRegistry,
        Stage::Ens,
        Stage::Gns,
        Stage::Curation,
        Stage::ServiceRegistry,
        Stage::Staking,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::GraphToken => "graph-token",
            Stage::DidRegistry => "did-registry",
            Stage::Ens => "ens",
            Stage::Gns => "gns",
            Stage::Curation => "curation",
            Stage::ServiceRegistry => "service-registry",
            Stage::Staking => "staking",
        }
    }
}

/// Run the whole population sequence against a deployment.
pub async fn populate_all(
    factory: &dyn ConnectorFactory,
    wallets: &WalletSet,
    amounts: &PopulationAmounts,
) -> Result<()> {
    ensure_datasets_aligned(wallets)?;
    if let Some(eth) = &amounts.send_eth {
        send_eth(factory, wallets, eth).await?;
    }
    for stage in Stage::SEQUENCE {
        info!(stage = stage.name(), "entering stage");
        run_stage(factory, wallets, amounts, stage).await?;
    }
    info!("population sequence complete");
    Ok(())
}

async fn run_stage(
    factory: &dyn ConnectorFactory,
    wallets: &WalletSet,
    amounts: &PopulationAmounts,
    stage: Stage,
) -> Result<()> {
    match stage {
        Stage::GraphToken => populate_graph_token(factory, wallets, &amounts.funding).await,
        Stage::DidRegistry => populate_did_registry(factory, wallets).await,
        Stage::Ens => populate_ens(factory, wallets).await,
        Stage::Gns => populate_gns(factory, wallets).await,
        Stage::Curation => populate_curation(factory, wallets, amounts).await,
        Stage::ServiceRegistry => populate_service_registry(factory, wallets).await,
        Stage::Staking => populate_staking(factory, wallets, &amounts.stake).await,
    }
}

fn ensure_aligned(stage: &str, wallets: usize, records: usize, what: &str) -> Result<()> {
    ensure!(
        wallets == records,
        "stage {stage}: {records} {what} records for {wallets} wallets; \
         the mock datasets must be index-aligned"
    );
    Ok(())
}

/// Check every mock dataset against the wallet count before the first
/// transaction goes out. Later stages would catch a mismatch too, but by then
/// the funding transfers have already been spent.
fn ensure_datasets_aligned(wallets: &WalletSet) -> Result<()> {
    let users = wallets.users.len();
    ensure_aligned("preflight", users, wallets.proxies.len(), "proxy wallet")?;
    ensure_aligned("preflight", users, account_metadatas().len(), "account metadata")?;
    ensure_aligned("preflight", users, subgraph_metadatas().len(), "subgraph metadata")?;
    ensure_aligned(
        "preflight",
        users,
        DEPLOYMENT_IDS_BASE58.len(),
        "deployment identifier",
    )?;
    ensure_aligned("preflight", users, CHANNEL_PUB_KEYS.len(), "channel key")?;
    ensure_aligned("preflight", users, GEOHASHES.len(), "geohash")?;
    ensure_aligned("preflight", users, SERVICE_URLS.len(), "service endpoint")?;
    Ok(())
}

/// Opt-in pre-stage: fund the non-governor wallets with ETH so they can pay
/// for gas. Only useful on a fresh deployment.
async fn send_eth(factory: &dyn ConnectorFactory, wallets: &WalletSet, amount: &str) -> Result<()> {
    info!(amount, "sending ETH to users and proxies");
    let governor = wallets.governor();
    factory.ensure_governor(governor.address())?;
    let payments = factory.payments(governor)?;
    for user in wallets.users.iter().skip(1) {
        payments.send_eth(user.address(), amount).await?;
    }
    for proxy in &wallets.proxies {
        payments.send_eth(proxy.address(), amount).await?;
    }
    Ok(())
}

/// Stage 1: the governor transfers GRT to every user and proxy wallet.
async fn populate_graph_token(
    factory: &dyn ConnectorFactory,
    wallets: &WalletSet,
    amount: &str,
) -> Result<()> {
    ensure_aligned(
        "graph-token",
        wallets.users.len(),
        wallets.proxies.len(),
        "proxy wallet",
    )?;
    info!(amount, "sending GRT to indexers, curators and proxies");
    let token = factory.token(wallets.governor())?;
    for (user, proxy) in wallets.users.iter().zip(wallets.proxies.iter()) {
        token.transfer(user.address(), amount).await?;
        token.transfer(proxy.address(), amount).await?;
    }
    Ok(())
}

/// Stage 2: pin each user's account profile and record it as a DID
/// attribute.
async fn populate_did_registry(factory: &dyn ConnectorFactory, wallets: &WalletSet) -> Result<()> {
    let metadatas = account_metadatas();
    ensure_aligned("did-registry", wallets.users.len(), metadatas.len(), "account metadata")?;
    for (user, metadata) in wallets.users.iter().zip(metadatas.iter()) {
        info!(
            name = %metadata.name,
            account = ?user.address(),
            "calling setAttribute on the DID registry"
        );
        let registry = factory.did_registry(user)?;
        registry
            .set_attribute_from_metadata(user.address(), metadata)
            .await?;
    }
    Ok(())
}

/// Stage 3: claim a `.test` name per user and point its text record back at
/// the graph account.
async fn populate_ens(factory: &dyn ConnectorFactory, wallets: &WalletSet) -> Result<()> {
    let metadatas = subgraph_metadatas();
    ensure_aligned("ens", wallets.users.len(), metadatas.len(), "subgraph metadata")?;
    for (user, metadata) in wallets.users.iter().zip(metadatas.iter()) {
        let name = canonical_subgraph_name(&metadata.subgraph_display_name);
        info!(name, account = ?user.address(), "setting ENS record");
        let ens = factory.ens(user)?;
        ens.set_test_record(name).await?;
        ens.set_text(name).await?;
    }
    Ok(())
}

/// Stage 4: publish one subgraph per user, immediately publish a version
/// update for each, then deprecate a single subgraph.
async fn populate_gns(factory: &dyn ConnectorFactory, wallets: &WalletSet) -> Result<()> {
    let metadatas = subgraph_metadatas();
    ensure_aligned("gns", wallets.users.len(), metadatas.len(), "subgraph metadata")?;
    ensure_aligned(
        "gns",
        wallets.users.len(),
        DEPLOYMENT_IDS_BASE58.len(),
        "deployment identifier",
    )?;
    for ((user, metadata), deployment_id) in wallets
        .users
        .iter()
        .zip(metadatas.iter())
        .zip(DEPLOYMENT_IDS_BASE58.iter())
    {
        let name = canonical_subgraph_name(&metadata.subgraph_display_name);
        let gns = factory.gns(user)?;
        info!(name, account = ?user.address(), "publishing subgraph on GNS");
        gns.publish_new_subgraph(user.address(), deployment_id, name, metadata)
            .await?;
        info!(name, account = ?user.address(), "publishing new subgraph version on GNS");
        // TODO: subgraph number 0 is only correct on the first run against a
        // deployment; re-running needs to read the account's subgraph count
        // back from the GNS instead.
        gns.publish_new_version(user.address(), 0, deployment_id, name, metadata)
            .await?;
    }

    ensure!(
        wallets.users.len() > DEPRECATED_SUBGRAPH_OWNER,
        "gns stage expects at least {} user wallets",
        DEPRECATED_SUBGRAPH_OWNER + 1
    );
    let owner = &wallets.users[DEPRECATED_SUBGRAPH_OWNER];
    info!(account = ?owner.address(), "deprecating one subgraph");
    let gns = factory.gns(owner)?;
    gns.deprecate(owner.address(), 0).await?;
    Ok(())
}

/// Stage 5: every user curates on their own deployment plus three shared
/// ones, then the first half redeem one share each.
async fn populate_curation(
    factory: &dyn ConnectorFactory,
    wallets: &WalletSet,
    amounts: &PopulationAmounts,
) -> Result<()> {
    let deployment_ids = deployment_ids_bytes32()?;
    ensure_aligned(
        "curation",
        wallets.users.len(),
        deployment_ids.len(),
        "deployment identifier",
    )?;
    ensure!(
        deployment_ids.len() >= 3,
        "curation stage expects at least 3 deployment identifiers"
    );
    let curation_address = factory.curation_address();
    for (user, own_id) in wallets.users.iter().zip(deployment_ids.iter()) {
        let token = factory.token(user)?;
        let curation = factory.curation(user)?;
        info!(account = ?user.address(), "approving curation to call transferFrom");
        token
            .approve(curation_address, &amounts.curation_allowance)
            .await?;
        info!(
            account = ?user.address(),
            deployment = %bytes32_to_base58(own_id),
            "signalling on curation"
        );
        curation.signal(*own_id, &amounts.signal).await?;
        curation.signal(deployment_ids[0], &amounts.signal).await?;
        curation.signal(deployment_ids[1], &amounts.signal).await?;
        curation
            .signal(deployment_ids[2], &amounts.signal_boost)
            .await?;
    }

    info!("running redeem transactions");
    for user in wallets.users.iter().take(wallets.users.len() / 2) {
        let curation = factory.curation(user)?;
        curation
            .redeem(deployment_ids[1], &amounts.redeem_shares)
            .await?;
    }
    Ok(())
}

/// Stage 6: register every user in the service registry; the first two also
/// exercise the unregister/re-register path.
async fn populate_service_registry(
    factory: &dyn ConnectorFactory,
    wallets: &WalletSet,
) -> Result<()> {
    ensure_aligned(
        "service-registry",
        wallets.users.len(),
        SERVICE_URLS.len(),
        "service endpoint",
    )?;
    for (i, user) in wallets.users.iter().enumerate() {
        let registry = factory.service_registry(user)?;
        info!(url = SERVICE_URLS[i], account = ?user.address(), "registering indexer");
        registry.register(SERVICE_URLS[i], GEOHASHES[i]).await?;
        if i < 2 {
            info!(account = ?user.address(), "unregistering and re-registering to exercise the path");
            registry.unregister().await?;
            registry.register(SERVICE_URLS[i], GEOHASHES[i]).await?;
        }
    }
    Ok(())
}

/// Stage 7: stake for every user, shrink the epoch and thawing windows so
/// withdraws and settlements are immediate, exercise unstake/withdraw and
/// allocate/settle, then restore the production defaults.
async fn populate_staking(
    factory: &dyn ConnectorFactory,
    wallets: &WalletSet,
    stake_amount: &str,
) -> Result<()> {
    let deployment_ids = deployment_ids_bytes32()?;
    ensure_aligned(
        "staking",
        wallets.users.len(),
        deployment_ids.len(),
        "deployment identifier",
    )?;
    ensure_aligned(
        "staking",
        wallets.users.len(),
        wallets.proxies.len(),
        "proxy wallet",
    )?;
    ensure_aligned(
        "staking",
        wallets.users.len(),
        CHANNEL_PUB_KEYS.len(),
        "channel key",
    )?;
    let governor = wallets.governor();
    factory.ensure_governor(governor.address())?;
    let staking_address = factory.staking_address();

    for user in &wallets.users {
        let token = factory.token(user)?;
        let staking = factory.staking(user)?;
        info!(account = ?user.address(), "approving staking to call transferFrom");
        token.approve(staking_address, stake_amount).await?;
        info!(account = ?user.address(), "staking");
        staking.stake(stake_amount).await?;
    }

    let epoch_manager = factory.epoch_manager(governor)?;
    let governor_staking = factory.staking(governor)?;
    info!("setting epoch length to 1");
    epoch_manager.set_epoch_length(1).await?;
    info!("setting thawing period to 0");
    governor_staking.set_thawing_period(0).await?;

    info!("approve, stake extra, unstake and withdraw for the first three users");
    for user in wallets.users.iter().take(3) {
        let token = factory.token(user)?;
        let staking = factory.staking(user)?;
        token.approve(staking_address, stake_amount).await?;
        staking.stake(stake_amount).await?;
        staking.unstake(stake_amount).await?;
        staking.withdraw().await?;
    }

    info!("creating allocations");
    for (i, user) in wallets.users.iter().enumerate() {
        let staking = factory.staking(user)?;
        info!(
            account = ?user.address(),
            deployment = %bytes32_to_base58(&deployment_ids[i]),
            "allocating stake"
        );
        staking
            .allocate(
                deployment_ids[i],
                stake_amount,
                wallets.proxies[i].address(),
                CHANNEL_PUB_KEYS[i],
            )
            .await?;
    }

    info!("running an epoch");
    epoch_manager.run_epoch().await?;

    info!("settling the first five allocations from the proxies");
    for proxy in wallets.proxies.iter().take(5) {
        let token = factory.token(proxy)?;
        let staking = factory.staking(proxy)?;
        token.approve(staking_address, stake_amount).await?;
        staking.settle(stake_amount).await?;
    }

    info!("restoring epoch length and thawing period to production defaults");
    epoch_manager.set_epoch_length(DEFAULT_EPOCH_LENGTH).await?;
    governor_staking
        .set_thawing_period(DEFAULT_THAWING_PERIOD)
        .await?;
    Ok(())
}
