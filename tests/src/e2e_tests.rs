//! Runs against a live chain with the stack deployed, skipped unless `PASSFLOW_E2E_RPC` and
//! `PASSFLOW_E2E_REGISTRY` are set

use ethers::providers::Middleware;
use passflow::{
    deployment::Deployment,
    loadtest::{BatchSender, PaymentBatchSender, PaymentOptions},
    utils::create_http_provider,
};
use passflow_primitives::{DeploymentRegistry, PasskeyPair};
use std::sync::Arc;

/// First anvil development account
const DEFAULT_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcc4479ad8ee7c2ff80";

#[tokio::test]
async fn payment_batch_lands_on_chain() -> eyre::Result<()> {
    let (Ok(rpc), Ok(registry)) =
        (std::env::var("PASSFLOW_E2E_RPC"), std::env::var("PASSFLOW_E2E_REGISTRY"))
    else {
        return Ok(());
    };
    let key = std::env::var("PASSFLOW_E2E_PRIVATE_KEY").unwrap_or(DEFAULT_PRIVATE_KEY.into());

    let addresses = DeploymentRegistry::new(registry)
        .load()?
        .ok_or_else(|| eyre::eyre!("registry does not exist"))?;
    let eth_client = Arc::new(create_http_provider(&rpc).await?);
    let deployment = Arc::new(Deployment::connect(eth_client.clone(), addresses, &key).await?);
    let deployer = deployment.deployer.clone();

    let sender = PaymentBatchSender::new(
        deployment,
        PaymentOptions {
            passkey: PasskeyPair::development()?,
            min_balance: ethers::utils::parse_ether("0.000001")?,
            fee_per_gas: eth_client.get_gas_price().await?,
            calldata_log: None,
        },
    );

    let tx_hash = sender.send_batch(&deployer, 2).await?;
    let receipt = eth_client
        .get_transaction_receipt(tx_hash)
        .await?
        .ok_or_else(|| eyre::eyre!("no receipt for {tx_hash:?}"))?;
    assert_eq!(receipt.status, Some(1.into()));
    Ok(())
}
