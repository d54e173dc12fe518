//! Deterministic wallet provisioning from a seed phrase.
//!
//! Wallets are derived at sequential BIP-44 indices so that the mock
//! metadata and deployment identifier lists stay index-aligned across runs.
//! Roles are tagged here, at provisioning time, rather than inferred from
//! magic indices inside the stage functions.

use anyhow::{ensure, Context, Result};
use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};
use ethers::types::Address;

/// Role a provisioned wallet plays in the population sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletRole {
    /// Holds the protocol token supply and may call governor-only functions.
    Governor,
    /// Acts as indexer, curator and graph account owner.
    User,
    /// Acts as the channel proxy that settles allocations.
    Proxy,
}

/// A wallet derived from the seed phrase, tagged with its derivation index
/// and role. Created once per run, never persisted.
#[derive(Debug, Clone)]
pub struct ProvisionedWallet {
    pub index: u32,
    pub role: WalletRole,
    pub signer: LocalWallet,
}

impl ProvisionedWallet {
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

/// The full set of wallets for a run, split by role. The first user doubles
/// as the governor.
#[derive(Debug, Clone)]
pub struct WalletSet {
    pub users: Vec<ProvisionedWallet>,
    pub proxies: Vec<ProvisionedWallet>,
}

impl WalletSet {
    pub fn governor(&self) -> &ProvisionedWallet {
        &self.users[0]
    }
}

/// Derive a single wallet at the given BIP-44 index.
pub fn derive_wallet(mnemonic: &str, chain_id: u64, index: u32) -> Result<LocalWallet> {
    let wallet = MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .index(index)
        .with_context(|| format!("invalid derivation index {index}"))?
        .build()
        .context("failed deriving wallet from seed phrase")?;
    Ok(wallet.with_chain_id(chain_id))
}

/// Derive `count` wallets and split them half/half into users and proxies.
/// Index 0 is tagged as the governor.
pub fn provision_wallets(mnemonic: &str, chain_id: u64, count: u32) -> Result<WalletSet> {
    ensure!(
        count >= 2 && count % 2 == 0,
        "wallet count must be even and at least 2, got {count}"
    );
    let split = count / 2;
    let mut users = Vec::with_capacity(split as usize);
    let mut proxies = Vec::with_capacity(split as usize);
    for index in 0..count {
        let role = if index == 0 {
            WalletRole::Governor
        } else if index < split {
            WalletRole::User
        } else {
            WalletRole::Proxy
        };
        let signer = derive_wallet(mnemonic, chain_id, index)?;
        let wallet = ProvisionedWallet {
            index,
            role,
            signer,
        };
        if index < split {
            users.push(wallet);
        } else {
            proxies.push(wallet);
        }
    }
    Ok(WalletSet { users, proxies })
}
