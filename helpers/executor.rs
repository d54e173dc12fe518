//! The single chokepoint every transaction goes through.
//!
//! Each call is sent and then awaited to confirmation before the caller may
//! issue the next one. The population stages have cross-transaction
//! dependencies (an approval must confirm before the transfer that spends
//! it), so this serialization is a correctness requirement. Failures
//! propagate unmodified; there is no retry.

use anyhow::{anyhow, bail, Result};
use ethers::abi::Detokenize;
use ethers::contract::ContractCall;
use ethers::providers::{JsonRpcClient, Middleware, PendingTransaction};
use ethers::types::{TransactionReceipt, TransactionRequest, U64};
use tracing::info;

/// Submit a contract call and wait for it to confirm.
pub async fn execute_transaction<M, D>(
    label: &str,
    call: ContractCall<M, D>,
) -> Result<TransactionReceipt>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    let pending = call
        .send()
        .await
        .map_err(|e| anyhow!("{label}: failed to send transaction: {e}"))?;
    await_receipt(label, pending).await
}

/// Submit a plain value transfer and wait for it to confirm.
pub async fn execute_payment<M>(
    label: &str,
    client: &M,
    tx: TransactionRequest,
) -> Result<TransactionReceipt>
where
    M: Middleware + 'static,
{
    let pending = client
        .send_transaction(tx, None)
        .await
        .map_err(|e| anyhow!("{label}: failed to send transaction: {e}"))?;
    await_receipt(label, pending).await
}

async fn await_receipt<'a, P>(
    label: &str,
    pending: PendingTransaction<'a, P>,
) -> Result<TransactionReceipt>
where
    P: JsonRpcClient,
{
    let tx_hash = *pending;
    let receipt = pending
        .await
        .map_err(|e| anyhow!("{label}: failed awaiting confirmation of {tx_hash:?}: {e}"))?
        .ok_or_else(|| anyhow!("{label}: transaction {tx_hash:?} dropped from the mempool"))?;
    if receipt.status != Some(U64::one()) {
        bail!("{label}: transaction {tx_hash:?} reverted");
    }
    info!(
        label,
        tx_hash = ?receipt.transaction_hash,
        block = ?receipt.block_number,
        "transaction confirmed"
    );
    Ok(receipt)
}
