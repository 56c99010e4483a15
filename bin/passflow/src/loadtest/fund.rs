use crate::utils::{format_ether, transfer};
use ethers::{
    providers::Middleware,
    types::{Address, U256},
};
use passflow_primitives::constants::load_test::{FUNDING_BATCH_SIZE, FUNDING_DELAY_MS};
use std::time::Duration;
use tracing::{error, info};

/// Wei to send so that `balance` reaches `target`
pub fn top_up(balance: U256, target: U256) -> Option<U256> {
    (balance < target).then(|| target - balance)
}

/// Tops every sender up to `amount` from the client's signer
///
/// Senders are funded one at a time in sub-batches with a pause after each transfer. A failed
/// transfer is logged and the next sender is funded.
pub async fn fund_senders<M: Middleware + 'static>(
    client: &M,
    senders: &[Address],
    amount: U256,
) -> eyre::Result<()> {
    info!("Funding sender addresses with {} ETH", format_ether(amount));
    let total_batches = senders.len().div_ceil(FUNDING_BATCH_SIZE);

    for (batch, chunk) in senders.chunks(FUNDING_BATCH_SIZE).enumerate() {
        let first = batch * FUNDING_BATCH_SIZE;
        info!(
            "Funding batch {}/{total_batches} (senders {first} to {})",
            batch + 1,
            first + chunk.len() - 1
        );

        for (offset, sender) in chunk.iter().enumerate() {
            let i = first + offset;
            let balance = client.get_balance(*sender, None).await?;

            let Some(value) = top_up(balance, amount) else {
                info!(sender = ?sender, "Sender {i} already has sufficient funds");
                continue;
            };

            match transfer(client, *sender, value).await {
                Ok(receipt) => info!(
                    sender = ?sender,
                    tx_hash = ?receipt.transaction_hash,
                    "Sent {} ETH to sender {i}",
                    format_ether(value)
                ),
                Err(err) => error!(sender = ?sender, "Funding sender {i} failed: {err:?}"),
            }
            tokio::time::sleep(Duration::from_millis(FUNDING_DELAY_MS)).await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tops_up_the_difference() {
        assert_eq!(top_up(3.into(), 10.into()), Some(7.into()));
        assert_eq!(top_up(10.into(), 10.into()), None);
        assert_eq!(top_up(11.into(), 10.into()), None);
    }
}
