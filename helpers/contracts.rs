//! Generated bindings for the deployed protocol contracts.
//!
//! Only the functions the population sequence actually calls are declared;
//! the contracts themselves are deployed and maintained elsewhere.

use ethers::prelude::abigen;

abigen!(
    GraphToken,
    r#"[
        function transfer(address to, uint256 amount) external returns (bool)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);

abigen!(
    Curation,
    r#"[
        function signal(bytes32 subgraphDeploymentID, uint256 tokens) external
        function redeem(bytes32 subgraphDeploymentID, uint256 signal) external
    ]"#
);

abigen!(
    Gns,
    r#"[
        function publishNewSubgraph(address graphAccount, bytes32 subgraphDeploymentID, bytes32 nameIdentifier, string name, bytes32 metadataHash) external
        function publishNewVersion(address graphAccount, uint256 subgraphNumber, bytes32 subgraphDeploymentID, bytes32 nameIdentifier, string name, bytes32 metadataHash) external
        function deprecate(address graphAccount, uint256 subgraphNumber) external
    ]"#
);

abigen!(
    Staking,
    r#"[
        function stake(uint256 tokens) external
        function unstake(uint256 tokens) external
        function withdraw() external
        function allocate(bytes32 subgraphDeploymentID, uint256 tokens, bytes channelPubKey, address channelProxy, uint256 price) external
        function settle(uint256 tokens) external
        function setThawingPeriod(uint32 thawingPeriod) external
    ]"#
);

abigen!(
    EpochManager,
    r#"[
        function setEpochLength(uint256 epochLength) external
        function runEpoch() external
    ]"#
);

abigen!(
    ServiceRegistry,
    r#"[
        function register(string url, string geohash) external
        function unregister() external
    ]"#
);

abigen!(
    EthereumDidRegistry,
    r#"[
        function setAttribute(address identity, bytes32 name, bytes value, uint256 validity) external
    ]"#
);

abigen!(
    EnsTestRegistrar,
    r#"[
        function register(bytes32 label, address owner) external
    ]"#
);

abigen!(
    EnsPublicResolver,
    r#"[
        function setText(bytes32 node, string key, string value) external
    ]"#
);
