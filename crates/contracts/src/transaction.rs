use crate::error::ContractsError;
use ethers::{
    abi::Detokenize,
    prelude::ContractCall,
    providers::Middleware,
    types::{TransactionReceipt, U64},
};
use tracing::trace;

/// Sends a state changing call and waits for a successful receipt
pub async fn send_and_wait<M: Middleware + 'static, D: Detokenize>(
    call: ContractCall<M, D>,
) -> Result<TransactionReceipt, ContractsError> {
    let pending = call.send().await.map_err(ContractsError::from_contract_error)?;
    let tx_hash = *pending;
    trace!(?tx_hash, "Transaction sent");

    let receipt = pending
        .await
        .map_err(|err| ContractsError::Provider { inner: err.to_string() })?
        .ok_or(ContractsError::TransactionDropped(tx_hash))?;

    if receipt.status == Some(U64::zero()) {
        return Err(ContractsError::TransactionReverted(tx_hash));
    }
    Ok(receipt)
}
