//! Recording doubles for the contract connectors.
//!
//! The mock factory hands out connectors that append every call to a shared
//! log instead of touching a network. Tests then assert on the exact call
//! sequence the population stages produced.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use ethers::types::Address;
use helpers::connectors::{
    ConnectorFactory, CurationOps, DidRegistryOps, EnsOps, EpochManagerOps, GnsOps, PaymentOps,
    ServiceRegistryOps, StakingOps, TokenOps,
};
use helpers::metadata::{AccountMetadata, SubgraphMetadata};
use helpers::wallet::ProvisionedWallet;

/// One entry per connector call, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    GovernorCheck {
        address: Address,
    },
    EthTransfer {
        from: Address,
        to: Address,
        amount: String,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: String,
    },
    Approve {
        from: Address,
        spender: Address,
        amount: String,
    },
    Signal {
        from: Address,
        deployment_id: [u8; 32],
        amount: String,
    },
    Redeem {
        from: Address,
        deployment_id: [u8; 32],
        shares: String,
    },
    PublishNewSubgraph {
        from: Address,
        graph_account: Address,
        deployment_id: String,
        name: String,
    },
    PublishNewVersion {
        from: Address,
        graph_account: Address,
        subgraph_number: u64,
        deployment_id: String,
        name: String,
    },
    Deprecate {
        from: Address,
        graph_account: Address,
        subgraph_number: u64,
    },
    SetAttribute {
        from: Address,
        identity: Address,
        account_name: String,
    },
    RegisterName {
        from: Address,
        name: String,
    },
    SetText {
        from: Address,
        name: String,
    },
    RegisterService {
        from: Address,
        url: String,
        geohash: String,
    },
    UnregisterService {
        from: Address,
    },
    Stake {
        from: Address,
        amount: String,
    },
    Unstake {
        from: Address,
        amount: String,
    },
    Withdraw {
        from: Address,
    },
    Allocate {
        from: Address,
        deployment_id: [u8; 32],
        amount: String,
        channel_proxy: Address,
        channel_pub_key: String,
    },
    Settle {
        from: Address,
        amount: String,
    },
    SetThawingPeriod {
        from: Address,
        blocks: u32,
    },
    SetEpochLength {
        from: Address,
        blocks: u64,
    },
    RunEpoch {
        from: Address,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    fn push(&self, call: RecordedCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

/// Factory whose connectors record instead of submitting transactions.
pub struct MockConnectors {
    log: CallLog,
    governor: Address,
    curation: Address,
    staking: Address,
}

impl MockConnectors {
    pub fn new(governor: Address) -> Self {
        Self {
            log: CallLog::default(),
            governor,
            curation: Address::from_low_u64_be(0xC0FFEE),
            staking: Address::from_low_u64_be(0x57A4E),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.calls()
    }
}

macro_rules! mock_connector {
    ($name:ident) => {
        pub struct $name {
            log: CallLog,
            signer: Address,
        }
    };
}

mock_connector!(MockPayments);
mock_connector!(MockToken);
mock_connector!(MockCuration);
mock_connector!(MockGns);
mock_connector!(MockDidRegistry);
mock_connector!(MockEns);
mock_connector!(MockServiceRegistry);
mock_connector!(MockStaking);
mock_connector!(MockEpochManager);

impl ConnectorFactory for MockConnectors {
    fn payments(&self, signer: &ProvisionedWallet) -> Result<Box<dyn PaymentOps>> {
        Ok(Box::new(MockPayments {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn token(&self, signer: &ProvisionedWallet) -> Result<Box<dyn TokenOps>> {
        Ok(Box::new(MockToken {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn curation(&self, signer: &ProvisionedWallet) -> Result<Box<dyn CurationOps>> {
        Ok(Box::new(MockCuration {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn gns(&self, signer: &ProvisionedWallet) -> Result<Box<dyn GnsOps>> {
        Ok(Box::new(MockGns {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn did_registry(&self, signer: &ProvisionedWallet) -> Result<Box<dyn DidRegistryOps>> {
        Ok(Box::new(MockDidRegistry {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn ens(&self, signer: &ProvisionedWallet) -> Result<Box<dyn EnsOps>> {
        Ok(Box::new(MockEns {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn service_registry(
        &self,
        signer: &ProvisionedWallet,
    ) -> Result<Box<dyn ServiceRegistryOps>> {
        Ok(Box::new(MockServiceRegistry {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn staking(&self, signer: &ProvisionedWallet) -> Result<Box<dyn StakingOps>> {
        Ok(Box::new(MockStaking {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn epoch_manager(&self, signer: &ProvisionedWallet) -> Result<Box<dyn EpochManagerOps>> {
        Ok(Box::new(MockEpochManager {
            log: self.log.clone(),
            signer: signer.address(),
        }))
    }

    fn curation_address(&self) -> Address {
        self.curation
    }

    fn staking_address(&self) -> Address {
        self.staking
    }

    fn ensure_governor(&self, address: Address) -> Result<()> {
        self.log.push(RecordedCall::GovernorCheck { address });
        if address != self.governor {
            bail!("signer {address:?} is not the governor");
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentOps for MockPayments {
    async fn send_eth(&self, to: Address, amount_eth: &str) -> Result<()> {
        self.log.push(RecordedCall::EthTransfer {
            from: self.signer,
            to,
            amount: amount_eth.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl TokenOps for MockToken {
    async fn transfer(&self, to: Address, amount: &str) -> Result<()> {
        self.log.push(RecordedCall::Transfer {
            from: self.signer,
            to,
            amount: amount.to_string(),
        });
        Ok(())
    }

    async fn approve(&self, spender: Address, amount: &str) -> Result<()> {
        self.log.push(RecordedCall::Approve {
            from: self.signer,
            spender,
            amount: amount.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl CurationOps for MockCuration {
    async fn signal(&self, deployment_id: [u8; 32], amount: &str) -> Result<()> {
        self.log.push(RecordedCall::Signal {
            from: self.signer,
            deployment_id,
            amount: amount.to_string(),
        });
        Ok(())
    }

    async fn redeem(&self, deployment_id: [u8; 32], shares: &str) -> Result<()> {
        self.log.push(RecordedCall::Redeem {
            from: self.signer,
            deployment_id,
            shares: shares.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl GnsOps for MockGns {
    async fn publish_new_subgraph(
        &self,
        graph_account: Address,
        deployment_id_base58: &str,
        name: &str,
        _metadata: &SubgraphMetadata,
    ) -> Result<()> {
        self.log.push(RecordedCall::PublishNewSubgraph {
            from: self.signer,
            graph_account,
            deployment_id: deployment_id_base58.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn publish_new_version(
        &self,
        graph_account: Address,
        subgraph_number: u64,
        deployment_id_base58: &str,
        name: &str,
        _metadata: &SubgraphMetadata,
    ) -> Result<()> {
        self.log.push(RecordedCall::PublishNewVersion {
            from: self.signer,
            graph_account,
            subgraph_number,
            deployment_id: deployment_id_base58.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn deprecate(&self, graph_account: Address, subgraph_number: u64) -> Result<()> {
        self.log.push(RecordedCall::Deprecate {
            from: self.signer,
            graph_account,
            subgraph_number,
        });
        Ok(())
    }
}

#[async_trait]
impl DidRegistryOps for MockDidRegistry {
    async fn set_attribute_from_metadata(
        &self,
        identity: Address,
        metadata: &AccountMetadata,
    ) -> Result<()> {
        self.log.push(RecordedCall::SetAttribute {
            from: self.signer,
            identity,
            account_name: metadata.name.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl EnsOps for MockEns {
    async fn set_test_record(&self, name: &str) -> Result<()> {
        self.log.push(RecordedCall::RegisterName {
            from: self.signer,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn set_text(&self, name: &str) -> Result<()> {
        self.log.push(RecordedCall::SetText {
            from: self.signer,
            name: name.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl ServiceRegistryOps for MockServiceRegistry {
    async fn register(&self, url: &str, geohash: &str) -> Result<()> {
        self.log.push(RecordedCall::RegisterService {
            from: self.signer,
            url: url.to_string(),
            geohash: geohash.to_string(),
        });
        Ok(())
    }

    async fn unregister(&self) -> Result<()> {
        self.log
            .push(RecordedCall::UnregisterService { from: self.signer });
        Ok(())
    }
}

#[async_trait]
impl StakingOps for MockStaking {
    async fn stake(&self, amount: &str) -> Result<()> {
        self.log.push(RecordedCall::Stake {
            from: self.signer,
            amount: amount.to_string(),
        });
        Ok(())
    }

    async fn unstake(&self, amount: &str) -> Result<()> {
        self.log.push(RecordedCall::Unstake {
            from: self.signer,
            amount: amount.to_string(),
        });
        Ok(())
    }

    async fn withdraw(&self) -> Result<()> {
        self.log.push(RecordedCall::Withdraw { from: self.signer });
        Ok(())
    }

    async fn allocate(
        &self,
        deployment_id: [u8; 32],
        amount: &str,
        channel_proxy: Address,
        channel_pub_key: &str,
    ) -> Result<()> {
        self.log.push(RecordedCall::Allocate {
            from: self.signer,
            deployment_id,
            amount: amount.to_string(),
            channel_proxy,
            channel_pub_key: channel_pub_key.to_string(),
        });
        Ok(())
    }

    async fn settle(&self, amount: &str) -> Result<()> {
        self.log.push(RecordedCall::Settle {
            from: self.signer,
            amount: amount.to_string(),
        });
        Ok(())
    }

    async fn set_thawing_period(&self, blocks: u32) -> Result<()> {
        self.log.push(RecordedCall::SetThawingPeriod {
            from: self.signer,
            blocks,
        });
        Ok(())
    }
}

#[async_trait]
impl EpochManagerOps for MockEpochManager {
    async fn set_epoch_length(&self, blocks: u64) -> Result<()> {
        self.log.push(RecordedCall::SetEpochLength {
            from: self.signer,
            blocks,
        });
        Ok(())
    }

    async fn run_epoch(&self) -> Result<()> {
        self.log.push(RecordedCall::RunEpoch { from: self.signer });
        Ok(())
    }
}
