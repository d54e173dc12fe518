//! Scenario tests driving the full population sequence against recording
//! doubles and asserting on the exact call sequence.

use anyhow::Result;
use ethers::types::Address;
use helpers::mock_data::{
    account_metadatas, deployment_ids_bytes32, CHANNEL_PUB_KEYS, DEPLOYMENT_IDS_BASE58, GEOHASHES,
    SERVICE_URLS,
};
use helpers::stages::{
    populate_all, PopulationAmounts, DEFAULT_EPOCH_LENGTH, DEFAULT_THAWING_PERIOD,
};
use helpers::wallet::{provision_wallets, WalletSet};
use integration::{MockConnectors, RecordedCall};

const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

async fn run_sequence(amounts: PopulationAmounts) -> Result<(WalletSet, Vec<RecordedCall>)> {
    let wallets = provision_wallets(TEST_MNEMONIC, 1337, 20)?;
    let mocks = MockConnectors::new(wallets.governor().address());
    populate_all(&mocks, &wallets, &amounts).await?;
    Ok((wallets, mocks.calls()))
}

fn position<F: Fn(&RecordedCall) -> bool>(calls: &[RecordedCall], pred: F) -> usize {
    calls
        .iter()
        .position(pred)
        .expect("expected call not recorded")
}

#[tokio::test]
async fn funding_covers_every_wallet() -> Result<()> {
    let (wallets, calls) = run_sequence(PopulationAmounts::default()).await?;
    let governor = wallets.governor().address();

    let transfers: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::Transfer { from, to, amount } => Some((*from, *to, amount.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(transfers.len(), 20);
    for (from, _, amount) in &transfers {
        assert_eq!(*from, governor);
        assert_eq!(amount, "100000");
    }
    let recipients: Vec<Address> = transfers.iter().map(|(_, to, _)| *to).collect();
    for wallet in wallets.users.iter().chain(wallets.proxies.iter()) {
        assert!(recipients.contains(&wallet.address()));
    }
    Ok(())
}

#[tokio::test]
async fn gns_publishes_versions_and_deprecates_exactly_once() -> Result<()> {
    let (wallets, calls) = run_sequence(PopulationAmounts::default()).await?;

    let publishes = calls
        .iter()
        .filter(|c| matches!(c, RecordedCall::PublishNewSubgraph { .. }))
        .count();
    let versions = calls
        .iter()
        .filter(|c| matches!(c, RecordedCall::PublishNewVersion { .. }))
        .count();
    assert_eq!(publishes, 10);
    assert_eq!(versions, 10);

    let deprecations: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::Deprecate {
                graph_account,
                subgraph_number,
                ..
            } => Some((*graph_account, *subgraph_number)),
            _ => None,
        })
        .collect();
    assert_eq!(deprecations, vec![(wallets.users[5].address(), 0)]);

    // Every publish is immediately followed by the matching version update.
    for (i, user) in wallets.users.iter().enumerate() {
        let publish = position(&calls, |c| {
            matches!(c, RecordedCall::PublishNewSubgraph { graph_account, .. }
                if *graph_account == user.address())
        });
        match &calls[publish + 1] {
            RecordedCall::PublishNewVersion {
                graph_account,
                subgraph_number,
                deployment_id,
                ..
            } => {
                assert_eq!(*graph_account, user.address());
                assert_eq!(*subgraph_number, 0);
                assert_eq!(deployment_id, DEPLOYMENT_IDS_BASE58[i]);
            }
            other => panic!("publish not followed by a version update: {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn approvals_confirm_before_dependent_calls() -> Result<()> {
    let (wallets, calls) = run_sequence(PopulationAmounts::default()).await?;

    for user in &wallets.users {
        let address = user.address();
        let curation_approve = position(&calls, |c| {
            matches!(c, RecordedCall::Approve { from, amount, .. }
                if *from == address && amount == "25000")
        });
        let first_signal = position(&calls, |c| {
            matches!(c, RecordedCall::Signal { from, .. } if *from == address)
        });
        assert!(curation_approve < first_signal);

        let staking_approve = position(&calls, |c| {
            matches!(c, RecordedCall::Approve { from, amount, .. }
                if *from == address && amount == "10000")
        });
        let stake = position(&calls, |c| {
            matches!(c, RecordedCall::Stake { from, .. } if *from == address)
        });
        assert!(staking_approve < stake);
    }

    for proxy in wallets.proxies.iter().take(5) {
        let address = proxy.address();
        let approve = position(&calls, |c| {
            matches!(c, RecordedCall::Approve { from, .. } if *from == address)
        });
        let settle = position(&calls, |c| {
            matches!(c, RecordedCall::Settle { from, .. } if *from == address)
        });
        assert!(approve < settle);
    }
    Ok(())
}

#[tokio::test]
async fn datasets_stay_index_aligned() -> Result<()> {
    let (wallets, calls) = run_sequence(PopulationAmounts::default()).await?;
    let metadatas = account_metadatas();
    let ids = deployment_ids_bytes32()?;

    let attributes: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::SetAttribute {
                identity,
                account_name,
                ..
            } => Some((*identity, account_name.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(attributes.len(), 10);
    for (i, (identity, account_name)) in attributes.iter().enumerate() {
        assert_eq!(*identity, wallets.users[i].address());
        assert_eq!(*account_name, metadatas[i].name);
    }

    let allocations: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::Allocate {
                from,
                deployment_id,
                channel_proxy,
                channel_pub_key,
                ..
            } => Some((*from, *deployment_id, *channel_proxy, channel_pub_key.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(allocations.len(), 10);
    for (i, (from, deployment_id, channel_proxy, channel_pub_key)) in
        allocations.iter().enumerate()
    {
        assert_eq!(*from, wallets.users[i].address());
        assert_eq!(*deployment_id, ids[i]);
        assert_eq!(*channel_proxy, wallets.proxies[i].address());
        assert_eq!(*channel_pub_key, CHANNEL_PUB_KEYS[i]);
    }
    Ok(())
}

#[tokio::test]
async fn reserved_display_name_is_substituted() -> Result<()> {
    let (_, calls) = run_sequence(PopulationAmounts::default()).await?;

    let registered: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::RegisterName { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(registered.len(), 10);
    assert!(registered.contains(&"graphprotocol".to_string()));
    assert!(!registered.contains(&"The Graph".to_string()));

    let published: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::PublishNewSubgraph { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert!(published.contains(&"graphprotocol".to_string()));
    assert!(!published.contains(&"The Graph".to_string()));
    Ok(())
}

#[tokio::test]
async fn service_registry_exercises_reregistration_for_first_two() -> Result<()> {
    let (wallets, calls) = run_sequence(PopulationAmounts::default()).await?;

    for (i, user) in wallets.users.iter().enumerate() {
        let address = user.address();
        let registers: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::RegisterService { from, url, geohash } if *from == address => {
                    Some((url.clone(), geohash.clone()))
                }
                _ => None,
            })
            .collect();
        let unregisters = calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::UnregisterService { from } if *from == address))
            .count();
        let expected_registers = if i < 2 { 2 } else { 1 };
        let expected_unregisters = if i < 2 { 1 } else { 0 };
        assert_eq!(registers.len(), expected_registers, "wallet {i}");
        assert_eq!(unregisters, expected_unregisters, "wallet {i}");
        for (url, geohash) in registers {
            assert_eq!(url, SERVICE_URLS[i]);
            assert_eq!(geohash, GEOHASHES[i]);
        }
    }

    // register -> unregister -> register, in that order, for wallet 0.
    let address = wallets.users[0].address();
    let first_register = position(&calls, |c| {
        matches!(c, RecordedCall::RegisterService { from, .. } if *from == address)
    });
    let unregister = position(&calls, |c| {
        matches!(c, RecordedCall::UnregisterService { from } if *from == address)
    });
    let re_register = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, RecordedCall::RegisterService { from, .. } if *from == address))
        .map(|(i, _)| i)
        .last()
        .unwrap();
    assert!(first_register < unregister);
    assert!(unregister < re_register);
    Ok(())
}

#[tokio::test]
async fn staking_restores_production_defaults() -> Result<()> {
    let (_, calls) = run_sequence(PopulationAmounts::default()).await?;

    let epoch_lengths: Vec<u64> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::SetEpochLength { blocks, .. } => Some(*blocks),
            _ => None,
        })
        .collect();
    assert_eq!(epoch_lengths, vec![1, DEFAULT_EPOCH_LENGTH]);

    let thawing_periods: Vec<u32> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::SetThawingPeriod { blocks, .. } => Some(*blocks),
            _ => None,
        })
        .collect();
    assert_eq!(thawing_periods, vec![0, DEFAULT_THAWING_PERIOD]);

    // The epoch runs after all allocations and before any settlement.
    let run_epoch = position(&calls, |c| matches!(c, RecordedCall::RunEpoch { .. }));
    let last_allocate = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, RecordedCall::Allocate { .. }))
        .map(|(i, _)| i)
        .last()
        .unwrap();
    let first_settle = position(&calls, |c| matches!(c, RecordedCall::Settle { .. }));
    assert!(last_allocate < run_epoch);
    assert!(run_epoch < first_settle);

    let settles = calls
        .iter()
        .filter(|c| matches!(c, RecordedCall::Settle { .. }))
        .count();
    assert_eq!(settles, 5);
    Ok(())
}

#[tokio::test]
async fn curation_signals_own_and_shared_deployments() -> Result<()> {
    let (wallets, calls) = run_sequence(PopulationAmounts::default()).await?;
    let ids = deployment_ids_bytes32()?;

    for (i, user) in wallets.users.iter().enumerate() {
        let address = user.address();
        let signals: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Signal {
                    from,
                    deployment_id,
                    amount,
                } if *from == address => Some((*deployment_id, amount.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            signals,
            vec![
                (ids[i], "5000".to_string()),
                (ids[0], "5000".to_string()),
                (ids[1], "5000".to_string()),
                (ids[2], "10000".to_string()),
            ]
        );
    }

    let redeems: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::Redeem {
                from,
                deployment_id,
                shares,
            } => Some((*from, *deployment_id, shares.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(redeems.len(), 5);
    for (i, (from, deployment_id, shares)) in redeems.iter().enumerate() {
        assert_eq!(*from, wallets.users[i].address());
        assert_eq!(*deployment_id, ids[1]);
        assert_eq!(shares, "1");
    }
    Ok(())
}

#[tokio::test]
async fn non_governor_aborts_staking_before_any_call() -> Result<()> {
    let wallets = provision_wallets(TEST_MNEMONIC, 1337, 20)?;
    let mocks = MockConnectors::new(Address::from_low_u64_be(0xDEAD));
    let result = populate_all(&mocks, &wallets, &PopulationAmounts::default()).await;
    assert!(result.is_err());

    // Stages 1-6 ran; the staking stage failed its guard before submitting.
    let calls = mocks.calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, RecordedCall::RegisterService { .. })));
    assert!(!calls.iter().any(|c| matches!(c, RecordedCall::Stake { .. })));
    Ok(())
}

#[tokio::test]
async fn misaligned_wallet_count_aborts_before_any_transaction() -> Result<()> {
    // Four wallets derive fine but cannot cover the ten-record datasets; the
    // run must fail before the funding stage spends anything.
    let wallets = provision_wallets(TEST_MNEMONIC, 1337, 4)?;
    let mocks = MockConnectors::new(wallets.governor().address());
    let amounts = PopulationAmounts {
        send_eth: Some("0.25".to_string()),
        ..PopulationAmounts::default()
    };
    let err = populate_all(&mocks, &wallets, &amounts)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("index-aligned"));
    assert!(mocks.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn send_eth_is_opt_in_and_runs_first() -> Result<()> {
    let (_, calls) = run_sequence(PopulationAmounts::default()).await?;
    assert!(!calls
        .iter()
        .any(|c| matches!(c, RecordedCall::EthTransfer { .. })));

    let amounts = PopulationAmounts {
        send_eth: Some("0.25".to_string()),
        ..PopulationAmounts::default()
    };
    let (wallets, calls) = run_sequence(amounts).await?;
    let governor = wallets.governor().address();

    let eth_transfers: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::EthTransfer { from, to, amount } => {
                Some((*from, *to, amount.clone()))
            }
            _ => None,
        })
        .collect();
    // Nine non-governor users plus ten proxies.
    assert_eq!(eth_transfers.len(), 19);
    for (from, to, amount) in &eth_transfers {
        assert_eq!(*from, governor);
        assert_ne!(*to, governor);
        assert_eq!(amount, "0.25");
    }

    let last_eth = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, RecordedCall::EthTransfer { .. }))
        .map(|(i, _)| i)
        .last()
        .unwrap();
    let first_grt = position(&calls, |c| matches!(c, RecordedCall::Transfer { .. }));
    assert!(last_eth < first_grt);
    Ok(())
}
