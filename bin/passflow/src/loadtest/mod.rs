//! Concurrent load test against a deployed passkey account stack

mod config;
mod fund;
mod provision;
mod rate_limit;
mod runner;
mod sender;
mod stats;

pub use config::{LoadTestConfig, WorkPlan};
pub use fund::{fund_senders, top_up};
pub use provision::{provision_senders, RoleWhitelist};
pub use rate_limit::RateLimiter;
pub use runner::{BatchSender, Dispatcher, RunResults, TransactionResult};
pub use sender::{payment_call_data, CallDataLog, PaymentBatchSender, PaymentOptions};
pub use stats::{LatencyStats, LoadTestReport};

use crate::deployment::Deployment;
use ethers::{providers::Middleware, types::Address};
use passflow_primitives::Wallet;
use std::sync::Arc;
use tracing::info;

/// Deterministic sender wallets, one per worker
pub fn sender_wallets(seed: &str, count: usize, chain_id: u64) -> eyre::Result<Vec<Wallet>> {
    (0..count).map(|i| Wallet::deterministic(seed, i, chain_id)).collect()
}

fn log_senders(wallets: &[Wallet]) {
    if wallets.len() <= 5 {
        for (i, wallet) in wallets.iter().enumerate() {
            info!("Sender {i}: {:?}", wallet.address());
        }
        return;
    }

    for (i, wallet) in wallets.iter().enumerate().take(3) {
        info!("Sender {i}: {:?}", wallet.address());
    }
    info!("... ({} more senders) ...", wallets.len() - 5);
    for (i, wallet) in wallets.iter().enumerate().skip(wallets.len() - 2) {
        info!("Sender {i}: {:?}", wallet.address());
    }
}

/// Provisions and funds the senders, then dispatches the configured traffic
pub async fn launch_load_test<M: Middleware + 'static>(
    config: LoadTestConfig,
    deployment: Arc<Deployment<M>>,
    options: PaymentOptions,
) -> eyre::Result<LoadTestReport> {
    config.validate()?;
    info!("Load test config: {config:?}");

    info!(
        "Creating {} unique deterministic sender addresses (one per worker)",
        config.concurrency
    );
    let wallets = sender_wallets(&config.wallet_seed, config.concurrency, deployment.chain_id)?;
    log_senders(&wallets);
    let addresses: Vec<Address> = wallets.iter().map(Wallet::address).collect();

    provision_senders(&deployment.config(), &addresses).await?;
    fund_senders(deployment.deployer_client.as_ref(), &addresses, config.fund_amount).await?;

    let sender = Arc::new(PaymentBatchSender::new(deployment, options));
    let dispatcher = Dispatcher::new(sender, config.plan(), config.batch_size, config.rate_limit);
    let run = dispatcher.run(wallets).await;

    Ok(LoadTestReport::new(&run, config.batch_size))
}
