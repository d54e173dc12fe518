//! Per-contract connectors.
//!
//! Each deployed contract gets a fixed capability trait and one connected
//! implementation that binds a network and a single signer. Switching signer
//! means building a new connector. The stage functions only see the traits,
//! via [`ConnectorFactory`], so tests can substitute recording doubles.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::parse_ether;

use crate::contracts::{
    Curation, EnsPublicResolver, EnsTestRegistrar, EpochManager, EthereumDidRegistry, Gns,
    GraphToken, ServiceRegistry, Staking,
};
use crate::executor::{execute_payment, execute_transaction};
use crate::ipfs::{deployment_id_bytes32, IpfsClient};
use crate::metadata::{AccountMetadata, SubgraphMetadata};
use crate::network::{contract_addresses, ContractAddresses};
use crate::wallet::ProvisionedWallet;
use crate::{attribute_name_bytes32, grt_units, label_hash, namehash};

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// DID attribute under which the pinned account profile is recorded.
pub const DID_ATTRIBUTE_NAME: &str = "did/svc/GraphAccount";
/// Validity window for the DID attribute, in seconds (one year).
pub const DID_ATTRIBUTE_VALIDITY: u64 = 31_536_000;
/// Resolver text record key pointing a name back at its graph account.
pub const ENS_TEXT_KEY: &str = "vnd.graphprotocol";

#[async_trait]
pub trait PaymentOps: Send + Sync {
    async fn send_eth(&self, to: Address, amount_eth: &str) -> Result<()>;
}

#[async_trait]
pub trait TokenOps: Send + Sync {
    async fn transfer(&self, to: Address, amount: &str) -> Result<()>;
    async fn approve(&self, spender: Address, amount: &str) -> Result<()>;
}

#[async_trait]
pub trait CurationOps: Send + Sync {
    async fn signal(&self, deployment_id: [u8; 32], amount: &str) -> Result<()>;
    async fn redeem(&self, deployment_id: [u8; 32], shares: &str) -> Result<()>;
}

#[async_trait]
pub trait GnsOps: Send + Sync {
    async fn publish_new_subgraph(
        &self,
        graph_account: Address,
        deployment_id_base58: &str,
        name: &str,
        metadata: &SubgraphMetadata,
    ) -> Result<()>;
    async fn publish_new_version(
        &self,
        graph_account: Address,
        subgraph_number: u64,
        deployment_id_base58: &str,
        name: &str,
        metadata: &SubgraphMetadata,
    ) -> Result<()>;
    async fn deprecate(&self, graph_account: Address, subgraph_number: u64) -> Result<()>;
}

#[async_trait]
pub trait DidRegistryOps: Send + Sync {
    /// Pin the account profile and record its content identifier as a DID
    /// attribute of `identity`.
    async fn set_attribute_from_metadata(
        &self,
        identity: Address,
        metadata: &AccountMetadata,
    ) -> Result<()>;
}

#[async_trait]
pub trait EnsOps: Send + Sync {
    async fn set_test_record(&self, name: &str) -> Result<()>;
    async fn set_text(&self, name: &str) -> Result<()>;
}

#[async_trait]
pub trait ServiceRegistryOps: Send + Sync {
    async fn register(&self, url: &str, geohash: &str) -> Result<()>;
    async fn unregister(&self) -> Result<()>;
}

#[async_trait]
pub trait StakingOps: Send + Sync {
    async fn stake(&self, amount: &str) -> Result<()>;
    async fn unstake(&self, amount: &str) -> Result<()>;
    async fn withdraw(&self) -> Result<()>;
    async fn allocate(
        &self,
        deployment_id: [u8; 32],
        amount: &str,
        channel_proxy: Address,
        channel_pub_key: &str,
    ) -> Result<()>;
    async fn settle(&self, amount: &str) -> Result<()>;
    async fn set_thawing_period(&self, blocks: u32) -> Result<()>;
}

#[async_trait]
pub trait EpochManagerOps: Send + Sync {
    async fn set_epoch_length(&self, blocks: u64) -> Result<()>;
    async fn run_epoch(&self) -> Result<()>;
}

/// Creates single-signer connectors for the stage functions. The production
/// implementation is [`NetworkConnectors`]; tests substitute recording
/// doubles.
pub trait ConnectorFactory: Send + Sync {
    fn payments(&self, signer: &ProvisionedWallet) -> Result<Box<dyn PaymentOps>>;
    fn token(&self, signer: &ProvisionedWallet) -> Result<Box<dyn TokenOps>>;
    fn curation(&self, signer: &ProvisionedWallet) -> Result<Box<dyn CurationOps>>;
    fn gns(&self, signer: &ProvisionedWallet) -> Result<Box<dyn GnsOps>>;
    fn did_registry(&self, signer: &ProvisionedWallet) -> Result<Box<dyn DidRegistryOps>>;
    fn ens(&self, signer: &ProvisionedWallet) -> Result<Box<dyn EnsOps>>;
    fn service_registry(&self, signer: &ProvisionedWallet)
        -> Result<Box<dyn ServiceRegistryOps>>;
    fn staking(&self, signer: &ProvisionedWallet) -> Result<Box<dyn StakingOps>>;
    fn epoch_manager(&self, signer: &ProvisionedWallet) -> Result<Box<dyn EpochManagerOps>>;

    /// Approval target for curation signals.
    fn curation_address(&self) -> Address;
    /// Approval target for staking deposits and settlements.
    fn staking_address(&self) -> Address;
    /// Governor guard, checked before any governor-only call is submitted.
    fn ensure_governor(&self, address: Address) -> Result<()>;
}

/// Production factory: resolves the address book once, then binds signers to
/// the deployed contracts over a shared HTTP provider.
#[derive(Debug, Clone)]
pub struct NetworkConnectors {
    provider: Provider<Http>,
    ipfs: IpfsClient,
    addresses: ContractAddresses,
}

impl NetworkConnectors {
    pub fn new(network: &str, provider_url: &str, ipfs_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(provider_url)
            .with_context(|| format!("invalid provider url `{provider_url}`"))?;
        let addresses = contract_addresses(network)?;
        Ok(Self {
            provider,
            ipfs: IpfsClient::new(ipfs_url)?,
            addresses,
        })
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    fn client(&self, signer: &ProvisionedWallet) -> Arc<SignerClient> {
        Arc::new(SignerMiddleware::new(
            self.provider.clone(),
            signer.signer.clone(),
        ))
    }
}

impl ConnectorFactory for NetworkConnectors {
    fn payments(&self, signer: &ProvisionedWallet) -> Result<Box<dyn PaymentOps>> {
        Ok(Box::new(ConnectedPayments {
            client: self.client(signer),
        }))
    }

    fn token(&self, signer: &ProvisionedWallet) -> Result<Box<dyn TokenOps>> {
        Ok(Box::new(ConnectedGraphToken {
            contract: GraphToken::new(self.addresses.graph_token, self.client(signer)),
        }))
    }

    fn curation(&self, signer: &ProvisionedWallet) -> Result<Box<dyn CurationOps>> {
        Ok(Box::new(ConnectedCuration {
            contract: Curation::new(self.addresses.curation, self.client(signer)),
        }))
    }

    fn gns(&self, signer: &ProvisionedWallet) -> Result<Box<dyn GnsOps>> {
        Ok(Box::new(ConnectedGns {
            contract: Gns::new(self.addresses.gns, self.client(signer)),
            ipfs: self.ipfs.clone(),
        }))
    }

    fn did_registry(&self, signer: &ProvisionedWallet) -> Result<Box<dyn DidRegistryOps>> {
        Ok(Box::new(ConnectedDidRegistry {
            contract: EthereumDidRegistry::new(self.addresses.did_registry, self.client(signer)),
            ipfs: self.ipfs.clone(),
        }))
    }

    fn ens(&self, signer: &ProvisionedWallet) -> Result<Box<dyn EnsOps>> {
        let client = self.client(signer);
        Ok(Box::new(ConnectedEns {
            registrar: EnsTestRegistrar::new(self.addresses.ens_registrar, client.clone()),
            resolver: EnsPublicResolver::new(self.addresses.ens_resolver, client),
            signer_address: signer.address(),
        }))
    }

    fn service_registry(
        &self,
        signer: &ProvisionedWallet,
    ) -> Result<Box<dyn ServiceRegistryOps>> {
        Ok(Box::new(ConnectedServiceRegistry {
            contract: ServiceRegistry::new(self.addresses.service_registry, self.client(signer)),
        }))
    }

    fn staking(&self, signer: &ProvisionedWallet) -> Result<Box<dyn StakingOps>> {
        Ok(Box::new(ConnectedStaking {
            contract: Staking::new(self.addresses.staking, self.client(signer)),
        }))
    }

    fn epoch_manager(&self, signer: &ProvisionedWallet) -> Result<Box<dyn EpochManagerOps>> {
        Ok(Box::new(ConnectedEpochManager {
            contract: EpochManager::new(self.addresses.epoch_manager, self.client(signer)),
        }))
    }

    fn curation_address(&self) -> Address {
        self.addresses.curation
    }

    fn staking_address(&self) -> Address {
        self.addresses.staking
    }

    fn ensure_governor(&self, address: Address) -> Result<()> {
        self.addresses.ensure_governor(address)
    }
}

struct ConnectedPayments {
    client: Arc<SignerClient>,
}

#[async_trait]
impl PaymentOps for ConnectedPayments {
    async fn send_eth(&self, to: Address, amount_eth: &str) -> Result<()> {
        let wei: U256 =
            parse_ether(amount_eth).with_context(|| format!("invalid ETH amount `{amount_eth}`"))?;
        let tx = TransactionRequest::pay(to, wei);
        execute_payment("eth.transfer", self.client.as_ref(), tx).await?;
        Ok(())
    }
}

struct ConnectedGraphToken {
    contract: GraphToken<SignerClient>,
}

#[async_trait]
impl TokenOps for ConnectedGraphToken {
    async fn transfer(&self, to: Address, amount: &str) -> Result<()> {
        let call = self.contract.transfer(to, grt_units(amount)?);
        execute_transaction("GraphToken.transfer", call).await?;
        Ok(())
    }

    async fn approve(&self, spender: Address, amount: &str) -> Result<()> {
        let call = self.contract.approve(spender, grt_units(amount)?);
        execute_transaction("GraphToken.approve", call).await?;
        Ok(())
    }
}

struct ConnectedCuration {
    contract: Curation<SignerClient>,
}

#[async_trait]
impl CurationOps for ConnectedCuration {
    async fn signal(&self, deployment_id: [u8; 32], amount: &str) -> Result<()> {
        let call = self.contract.signal(deployment_id, grt_units(amount)?);
        execute_transaction("Curation.signal", call).await?;
        Ok(())
    }

    async fn redeem(&self, deployment_id: [u8; 32], shares: &str) -> Result<()> {
        // Shares, not tokens: one share can be worth a lot of tokens.
        let call = self.contract.redeem(deployment_id, grt_units(shares)?);
        execute_transaction("Curation.redeem", call).await?;
        Ok(())
    }
}

struct ConnectedGns {
    contract: Gns<SignerClient>,
    ipfs: IpfsClient,
}

impl ConnectedGns {
    async fn pinned_metadata_hash(&self, metadata: &SubgraphMetadata) -> Result<[u8; 32]> {
        let cid = self.ipfs.pin_json(metadata).await?;
        deployment_id_bytes32(&cid)
    }
}

#[async_trait]
impl GnsOps for ConnectedGns {
    async fn publish_new_subgraph(
        &self,
        graph_account: Address,
        deployment_id_base58: &str,
        name: &str,
        metadata: &SubgraphMetadata,
    ) -> Result<()> {
        let metadata_hash = self.pinned_metadata_hash(metadata).await?;
        let call = self.contract.publish_new_subgraph(
            graph_account,
            deployment_id_bytes32(deployment_id_base58)?,
            namehash(&format!("{name}.test")),
            name.to_string(),
            metadata_hash,
        );
        execute_transaction("GNS.publishNewSubgraph", call).await?;
        Ok(())
    }

    async fn publish_new_version(
        &self,
        graph_account: Address,
        subgraph_number: u64,
        deployment_id_base58: &str,
        name: &str,
        metadata: &SubgraphMetadata,
    ) -> Result<()> {
        let metadata_hash = self.pinned_metadata_hash(metadata).await?;
        let call = self.contract.publish_new_version(
            graph_account,
            U256::from(subgraph_number),
            deployment_id_bytes32(deployment_id_base58)?,
            namehash(&format!("{name}.test")),
            name.to_string(),
            metadata_hash,
        );
        execute_transaction("GNS.publishNewVersion", call).await?;
        Ok(())
    }

    async fn deprecate(&self, graph_account: Address, subgraph_number: u64) -> Result<()> {
        let call = self
            .contract
            .deprecate(graph_account, U256::from(subgraph_number));
        execute_transaction("GNS.deprecate", call).await?;
        Ok(())
    }
}

struct ConnectedDidRegistry {
    contract: EthereumDidRegistry<SignerClient>,
    ipfs: IpfsClient,
}

#[async_trait]
impl DidRegistryOps for ConnectedDidRegistry {
    async fn set_attribute_from_metadata(
        &self,
        identity: Address,
        metadata: &AccountMetadata,
    ) -> Result<()> {
        let cid = self.ipfs.pin_json(metadata).await?;
        let value = Bytes::from(deployment_id_bytes32(&cid)?.to_vec());
        let call = self.contract.set_attribute(
            identity,
            attribute_name_bytes32(DID_ATTRIBUTE_NAME),
            value,
            U256::from(DID_ATTRIBUTE_VALIDITY),
        );
        execute_transaction("EthereumDIDRegistry.setAttribute", call).await?;
        Ok(())
    }
}

struct ConnectedEns {
    registrar: EnsTestRegistrar<SignerClient>,
    resolver: EnsPublicResolver<SignerClient>,
    signer_address: Address,
}

#[async_trait]
impl EnsOps for ConnectedEns {
    async fn set_test_record(&self, name: &str) -> Result<()> {
        let call = self.registrar.register(label_hash(name), self.signer_address);
        execute_transaction("ENS.register", call).await?;
        Ok(())
    }

    async fn set_text(&self, name: &str) -> Result<()> {
        let node = namehash(&format!("{name}.test"));
        let value = format!("0x{}", hex::encode(self.signer_address.as_bytes()));
        let call = self
            .resolver
            .set_text(node, ENS_TEXT_KEY.to_string(), value);
        execute_transaction("ENS.setText", call).await?;
        Ok(())
    }
}

struct ConnectedServiceRegistry {
    contract: ServiceRegistry<SignerClient>,
}

#[async_trait]
impl ServiceRegistryOps for ConnectedServiceRegistry {
    async fn register(&self, url: &str, geohash: &str) -> Result<()> {
        let call = self
            .contract
            .register(url.to_string(), geohash.to_string());
        execute_transaction("ServiceRegistry.register", call).await?;
        Ok(())
    }

    async fn unregister(&self) -> Result<()> {
        let call = self.contract.unregister();
        execute_transaction("ServiceRegistry.unregister", call).await?;
        Ok(())
    }
}

struct ConnectedStaking {
    contract: Staking<SignerClient>,
}

fn decode_channel_key(key: &str) -> Result<Bytes> {
    let stripped = key.strip_prefix("0x").unwrap_or(key);
    let raw = hex::decode(stripped)
        .with_context(|| format!("invalid channel public key `{key}`"))?;
    Ok(Bytes::from(raw))
}

#[async_trait]
impl StakingOps for ConnectedStaking {
    async fn stake(&self, amount: &str) -> Result<()> {
        let call = self.contract.stake(grt_units(amount)?);
        execute_transaction("Staking.stake", call).await?;
        Ok(())
    }

    async fn unstake(&self, amount: &str) -> Result<()> {
        let call = self.contract.unstake(grt_units(amount)?);
        execute_transaction("Staking.unstake", call).await?;
        Ok(())
    }

    async fn withdraw(&self) -> Result<()> {
        let call = self.contract.withdraw();
        execute_transaction("Staking.withdraw", call).await?;
        Ok(())
    }

    async fn allocate(
        &self,
        deployment_id: [u8; 32],
        amount: &str,
        channel_proxy: Address,
        channel_pub_key: &str,
    ) -> Result<()> {
        let call = self.contract.allocate(
            deployment_id,
            grt_units(amount)?,
            decode_channel_key(channel_pub_key)?,
            channel_proxy,
            U256::zero(),
        );
        execute_transaction("Staking.allocate", call).await?;
        Ok(())
    }

    async fn settle(&self, amount: &str) -> Result<()> {
        let call = self.contract.settle(grt_units(amount)?);
        execute_transaction("Staking.settle", call).await?;
        Ok(())
    }

    async fn set_thawing_period(&self, blocks: u32) -> Result<()> {
        let call = self.contract.set_thawing_period(blocks);
        execute_transaction("Staking.setThawingPeriod", call).await?;
        Ok(())
    }
}

struct ConnectedEpochManager {
    contract: EpochManager<SignerClient>,
}

#[async_trait]
impl EpochManagerOps for ConnectedEpochManager {
    async fn set_epoch_length(&self, blocks: u64) -> Result<()> {
        let call = self.contract.set_epoch_length(U256::from(blocks));
        execute_transaction("EpochManager.setEpochLength", call).await?;
        Ok(())
    }

    async fn run_epoch(&self) -> Result<()> {
        let call = self.contract.run_epoch();
        execute_transaction("EpochManager.runEpoch", call).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::provision_wallets;

    const TEST_MNEMONIC: &str =
        "test test test test test test test test test test test junk";

    #[test]
    fn factory_fails_fast_on_unknown_network() {
        assert!(NetworkConnectors::new("mainnet", "http://localhost:8545", "http://localhost:5001")
            .is_err());
    }

    #[test]
    fn factory_resolves_addresses_once() {
        let factory =
            NetworkConnectors::new("localhost", "http://localhost:8545", "http://localhost:5001")
                .unwrap();
        assert_eq!(factory.curation_address(), factory.addresses().curation);
        assert_eq!(factory.staking_address(), factory.addresses().staking);
    }

    #[test]
    fn governor_guard_rejects_non_governor() {
        let factory =
            NetworkConnectors::new("localhost", "http://localhost:8545", "http://localhost:5001")
                .unwrap();
        let set = provision_wallets(TEST_MNEMONIC, 1337, 4).unwrap();
        assert!(factory.ensure_governor(set.governor().address()).is_ok());
        assert!(factory.ensure_governor(set.users[1].address()).is_err());
    }

    #[test]
    fn channel_keys_decode_to_bytes() {
        let bytes = decode_channel_key(crate::mock_data::CHANNEL_PUB_KEYS[0]).unwrap();
        assert_eq!(bytes.len(), 65);
        assert!(decode_channel_key("0xzz").is_err());
    }
}
