//! Static address book for the deployed protocol contracts, per network.

use anyhow::{anyhow, bail, Result};
use ethers::types::Address;

/// Raw address book entry. Empty strings mean the contract is not registered
/// on that network and resolution fails fast.
struct RawAddresses {
    governor: &'static str,
    graph_token: &'static str,
    curation: &'static str,
    gns: &'static str,
    staking: &'static str,
    epoch_manager: &'static str,
    service_registry: &'static str,
    did_registry: &'static str,
    ens_registrar: &'static str,
    ens_resolver: &'static str,
}

// The local entries match a deterministic deployment from the hardhat test
// mnemonic: the governor is derivation index 0.
const LOCAL: RawAddresses = RawAddresses {
    governor: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    graph_token: "0x5FbDB2315678afecb367f032d93F642f64180aa3",
    curation: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
    gns: "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
    staking: "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9",
    epoch_manager: "0xDc64a140Aa3E981100a9becA4E685f962f0cF6C9",
    service_registry: "0x5FC8d32690cc91D4c39d9d3abcBD16989F875707",
    did_registry: "0x0165878A594ca255338adfa4d48449f69242Eb8F",
    ens_registrar: "0xa513E6E4b8f2a923D98304ec87F64353C4D5C853",
    ens_resolver: "0x2279B7A0a67DB372996a5FaB50D91eAA73d2eBe6",
};

const SEPOLIA: RawAddresses = RawAddresses {
    governor: "0x76Fa75F569c594d1a4F0a0BDA9a3bD20d42a646b",
    graph_token: "0xCA59cCeb39bE1808d7aA607153f4A5062daF3a83",
    curation: "0x8bD3AF4bA2a3bc4b79DdA6c63D6fA412d2094BAf",
    gns: "0x065611D3515325aE6fe14f09AEe5Aa2C0a1f0CA7",
    staking: "0x35e3Cb6B317690d662160d5d02A5b364578F62c9",
    epoch_manager: "0x03FC9C4AEcE0f180cb9e6a1d91612524a1B01024",
    service_registry: "0x75bb75a3BdCA92DDdA4BD56971474bDbE93a6ABc",
    did_registry: "0xdCa7EF03e98e0DC2B855bE647C39ABe984fcF21B",
    ens_registrar: "0x794941f2a7A575a15bE155c262A42a4cf0827BE0",
    ens_resolver: "0x42D63ae25990889E35F215bC95884039Ba354115",
};

fn raw_addresses(network: &str) -> Result<&'static RawAddresses> {
    match network {
        "localhost" | "ganache" => Ok(&LOCAL),
        "sepolia" => Ok(&SEPOLIA),
        other => bail!("no contract addresses registered for network `{other}`"),
    }
}

/// Resolved addresses of every deployed contract the population sequence
/// talks to, plus the expected governor account.
#[derive(Debug, Clone, Copy)]
pub struct ContractAddresses {
    pub governor: Address,
    pub graph_token: Address,
    pub curation: Address,
    pub gns: Address,
    pub staking: Address,
    pub epoch_manager: Address,
    pub service_registry: Address,
    pub did_registry: Address,
    pub ens_registrar: Address,
    pub ens_resolver: Address,
}

fn parse_entry(network: &str, name: &str, raw: &'static str) -> Result<Address> {
    if raw.is_empty() {
        bail!("contract `{name}` is not registered on network `{network}`");
    }
    raw.parse()
        .map_err(|_| anyhow!("malformed address for `{name}` on network `{network}`: {raw}"))
}

/// Resolve the full address book for a network, failing fast on unknown
/// networks or unregistered contracts.
pub fn contract_addresses(network: &str) -> Result<ContractAddresses> {
    let raw = raw_addresses(network)?;
    Ok(ContractAddresses {
        governor: parse_entry(network, "governor", raw.governor)?,
        graph_token: parse_entry(network, "graph_token", raw.graph_token)?,
        curation: parse_entry(network, "curation", raw.curation)?,
        gns: parse_entry(network, "gns", raw.gns)?,
        staking: parse_entry(network, "staking", raw.staking)?,
        epoch_manager: parse_entry(network, "epoch_manager", raw.epoch_manager)?,
        service_registry: parse_entry(network, "service_registry", raw.service_registry)?,
        did_registry: parse_entry(network, "did_registry", raw.did_registry)?,
        ens_registrar: parse_entry(network, "ens_registrar", raw.ens_registrar)?,
        ens_resolver: parse_entry(network, "ens_resolver", raw.ens_resolver)?,
    })
}

impl ContractAddresses {
    /// Guard for governor-only calls: raised before anything touches the
    /// network.
    pub fn ensure_governor(&self, address: Address) -> Result<()> {
        if address != self.governor {
            bail!(
                "signer {address:?} is not the governor ({:?}) of this network",
                self.governor
            );
        }
        Ok(())
    }
}
