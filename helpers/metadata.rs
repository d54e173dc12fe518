//! Descriptive metadata records pinned off-chain for accounts and subgraphs.

use serde::{Deserialize, Serialize};

/// The ENS display name that collides with a pre-existing reservation; it is
/// published under the canonical name below instead.
pub const RESERVED_DISPLAY_NAME: &str = "The Graph";
pub const RESERVED_CANONICAL_NAME: &str = "graphprotocol";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    pub codename: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphMetadata {
    pub subgraph_display_name: String,
    pub subtitle: String,
    pub description: String,
    pub image: String,
    pub code_repository: String,
    pub website: String,
}

/// The name a subgraph is actually registered and published under.
/// Display names map to themselves except for the reserved one.
pub fn canonical_subgraph_name(display_name: &str) -> &str {
    if display_name == RESERVED_DISPLAY_NAME {
        RESERVED_CANONICAL_NAME
    } else {
        display_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_display_name_is_substituted() {
        assert_eq!(canonical_subgraph_name("The Graph"), "graphprotocol");
        assert_eq!(canonical_subgraph_name("Uniswap"), "Uniswap");
    }

    #[test]
    fn subgraph_metadata_serializes_camel_case() {
        let meta = SubgraphMetadata {
            subgraph_display_name: "Uniswap".to_string(),
            subtitle: "t".to_string(),
            description: "d".to_string(),
            image: "i".to_string(),
            code_repository: "r".to_string(),
            website: "w".to_string(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("subgraphDisplayName"));
        assert!(json.contains("codeRepository"));
    }
}
