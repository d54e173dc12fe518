//! Fixed mock datasets consumed positionally by the population stages.
//!
//! Wallet i pairs with account record i, subgraph record i, deployment
//! identifier i and channel key i. The deployment identifiers are opaque
//! precomputed inputs, supplied in both encodings via
//! [`crate::ipfs::deployment_id_bytes32`].

use crate::ipfs::deployment_id_bytes32;
use crate::metadata::{AccountMetadata, SubgraphMetadata};
use anyhow::Result;

/// Base58 CIDv0 form of the mock deployment identifiers.
pub const DEPLOYMENT_IDS_BASE58: [&str; 10] = [
    "QmUD3uySqxGehHySzwj4LWbxjgxQMFNqWC5nVw1yKyZUvR",
    "QmY1iaXriReFxJxE86PzPGBVzHe2S1728N2JkkjnKsF9yM",
    "QmZvQrMuyGUVAbG6AzMn3vCGDnB3xExjrJakVZDgZRLbZh",
    "QmNs2VDVDXJ9tDha9WCNRuRSUUo1aeSi7M6HWcWmrFM9gM",
    "QmcsYY99PDqju2G8Sxx8gPoZFob5rpRiLf64fZACFm2L3B",
    "QmauZZWMEWMGRZotpZYdHzPRaQgJYdfTnMpFtvAZVWHpkM",
    "QmNzEJHPVZphcUtc9a1QhypeP2cRt2uRYYuC1mwYzyQAAD",
    "QmUkqCMT73Vsd52t9BzesFebzvk9UmJpNorJRvrtxQj3rh",
    "QmNjK78X8xtzEhHtcc5eKajqrYx541BiatAagwPKvke9gk",
    "Qmar9uDNS48QQ2SwKbGaxKj6FgD7LXtnyHG5nVF72dftFE",
];

/// Fixed-width 32-byte form of the same identifiers, in the same order.
pub fn deployment_ids_bytes32() -> Result<Vec<[u8; 32]>> {
    DEPLOYMENT_IDS_BASE58
        .iter()
        .map(|id| deployment_id_bytes32(id))
        .collect()
}

/// Uncompressed secp256k1 public keys for the allocation channels, one per
/// wallet index.
pub const CHANNEL_PUB_KEYS: [&str; 10] = [
    "0x04632a6c348fdbdb5f34396f53e3153686450f7df5670c3d9367b045f3061afc62f109e12be59553bfbfe759a17ca4d79d1d7b4fccbd2d246e6ea2249312cc87cc",
    "0x04f34fc20d66ce04e933dc44270b6d0e655c72a5cfd40a743bc742d3f55d1a202a60a13bc625e8efa420c218ba45430a3af6be65deb655f859d05845061d7d9af1",
    "0x048f420cd4346a07a2d9e6d3d4898d8cc1d3262f46080fbfa785b3b5254bac952debd3dfd86b073b01b6e92b677fa76b81feffbb4fc7dfe176f1753fb691ae75d2",
    "0x045c235b2a4bd41f741c4c3e358cce1a957373a25061be939c5d8aab3dd3f2b5107f3bb1e93b348b5f12dac18ff611343417aec4379d9e71d51618f35cc54cd08d",
    "0x0450f9eae70cd4a92bfbe42a1678be226743275c3e6b122b2c99b59a3d6e3a623f9421fcfb291d9363c6fecf8b5b3ba9069e3300106db393334815dbc84a444eff",
    "0x04c116a0e4a96bfc548c6ddc3865a01ffdbae47704ab230fc94159a38d9471e35df545f5b547f5d0a1a12cf7d8eecce6cf7c60ef969435175203dfa835878c55dc",
    "0x04273ac76acc139bbb1f7571e7cfbc940a399b1fb956668b7fb047eab9db0231268e1a280a6d628ea9dbd6d465d5579239ab45334f3adff061d27c84928a0b735d",
    "0x04e9905e15163013a081b44ecef1ba27d6471e31f2e9ef771f2a3388112ca59663be643b7abcd772c9f3f5b8f1fecd29fd97e86e8fc4b0e07c6ccf74ca022a8abb",
    "0x04a73ab90fa19b15abc4f1f481cce5a3624a60370f9de147b7eaa4d5dd02f3434dc1a22d66ab72f2bd483dd924ef0ce13de42943f5f50afd5161d7d5dbc3669869",
    "0x0423304499af5f0e84515be9ac07bfb26fdac7a0b7ff34ad6ed3ba049bb2f5066e4b3197c7ef2f2067db764fc5dfdf1838cf9ade8e955c20c8a2c639c1e0ae79a6",
];

// Lat 43.651, long -79.382 resolves to dpz83d (downtown Toronto); the rest
// are neighbouring cells.
pub const GEOHASHES: [&str; 10] = [
    "dpz83d", "dpz83a", "dpz83b", "dpz83c", "dpz83e", "dpz83f", "dpz83g", "dpz83h", "dpz83i",
    "dpz83j",
];

pub const SERVICE_URLS: [&str; 10] = [
    "https://indexer1.com",
    "https://indexer2.com",
    "https://indexer3.com",
    "https://indexer4.com",
    "https://indexer5.com",
    "https://indexer6.com",
    "https://indexer7.com",
    "https://indexer8.com",
    "https://indexer9.com",
    "https://indexer10.com",
];

const ACCOUNTS: [(&str, &str); 10] = [
    ("graph", "The Graph"),
    ("uniswap", "Uniswap"),
    ("compound", "Compound"),
    ("maker", "MakerDAO"),
    ("ens", "ENS"),
    ("livepeer", "Livepeer"),
    ("aave", "Aave"),
    ("synthetix", "Synthetix"),
    ("moloch", "MolochDAO"),
    ("decentraland", "Decentraland"),
];

/// One account record per user wallet, in iteration order.
pub fn account_metadatas() -> Vec<AccountMetadata> {
    ACCOUNTS
        .iter()
        .map(|(codename, name)| AccountMetadata {
            codename: codename.to_string(),
            name: name.to_string(),
            description: format!("Mock account profile for {name}"),
            image: format!("https://ipfs.io/ipfs/mock-account-{codename}.png"),
            website: format!("https://{codename}.example.com"),
        })
        .collect()
}

/// One subgraph record per user wallet, in iteration order. The first
/// record carries the reserved display name.
pub fn subgraph_metadatas() -> Vec<SubgraphMetadata> {
    ACCOUNTS
        .iter()
        .map(|(codename, name)| SubgraphMetadata {
            subgraph_display_name: name.to_string(),
            subtitle: format!("{name} protocol data"),
            description: format!("Indexes on-chain activity of {name}"),
            image: format!("https://ipfs.io/ipfs/mock-subgraph-{codename}.png"),
            code_repository: format!("https://github.com/{codename}/{codename}-subgraph"),
            website: format!("https://{codename}.example.com"),
        })
        .collect()
}
