//! Common helper functions for the population scripts and tests

pub mod connectors;
pub mod contracts;
pub mod executor;
pub mod ipfs;
pub mod metadata;
pub mod mock_data;
pub mod network;
pub mod stages;
pub mod wallet;

use anyhow::{Context, Result};
use ethers::types::U256;
use ethers::utils::{keccak256, parse_units};

/// Convert a human-readable decimal amount of GRT into base units (18 decimals).
pub fn grt_units(amount: &str) -> Result<U256> {
    let parsed =
        parse_units(amount, 18u32).with_context(|| format!("invalid GRT amount `{amount}`"))?;
    Ok(parsed.into())
}

/// EIP-137 namehash of a dot-separated ENS name.
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&label_hash);
        node = keccak256(buf);
    }
    node
}

/// Hash of a single ENS label, as used by the test registrar.
pub fn label_hash(label: &str) -> [u8; 32] {
    keccak256(label.as_bytes())
}

/// Right-pad a short ASCII attribute name into the bytes32 form the DID
/// registry expects.
pub fn attribute_name_bytes32(name: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    let bytes = name.as_bytes();
    let len = bytes.len().min(32);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}
