use crate::common::TestContext;
use async_trait::async_trait;
use ethers::types::{Address, H256};
use passflow::loadtest::{
    payment_call_data, sender_wallets, BatchSender, Dispatcher, LoadTestConfig, LoadTestReport,
};
use passflow_account::{
    mock::{MockChain, MOCK_CHAIN_ID},
    OperationRequest, SignatureScheme,
};
use passflow_primitives::{
    constants::{account::FACTORY_EXPIRE_TIME, load_test::BATCH_START_NONCE},
    random_salt, PasskeyPair, Wallet,
};
use std::{sync::Arc, time::Duration};

/// Builds real signed batches against the mock chain, one wallet is refused
struct MockPaymentSender {
    ctx: TestContext,
    deployer: Wallet,
    passkey: PasskeyPair,
    refused: Address,
}

#[async_trait]
impl BatchSender for MockPaymentSender {
    async fn send_batch(&self, signer: &Wallet, batch_size: usize) -> eyre::Result<H256> {
        if signer.address() == self.refused {
            eyre::bail!("insufficient funds for gas");
        }

        let derived = self
            .ctx
            .deriver
            .derive(&self.passkey, &self.deployer, random_salt(), FACTORY_EXPIRE_TIME)
            .await?;
        let request = OperationRequest {
            sender: derived.sender,
            start_nonce: BATCH_START_NONCE.into(),
            count: batch_size,
            call_data: payment_call_data(Address::repeat_byte(0x70), Address::repeat_byte(0x9a))?,
            init_code: derived.init_code,
        };
        let uos = self
            .ctx
            .builder
            .build_sequence(&request, signer, &SignatureScheme::passkey(self.passkey.clone()))
            .await?;
        eyre::ensure!(uos.len() == batch_size, "built {} of {batch_size} operations", uos.len());

        Ok(H256::from(uos[0].hash(&MockChain::entry_point(), MOCK_CHAIN_ID)))
    }
}

struct InstantSender;

#[async_trait]
impl BatchSender for InstantSender {
    async fn send_batch(&self, _signer: &Wallet, _batch_size: usize) -> eyre::Result<H256> {
        Ok(H256::random())
    }
}

fn config(total_uop: usize, batch_size: usize, concurrency: usize, rate_limit: u64) -> LoadTestConfig {
    LoadTestConfig {
        total_uop,
        batch_size,
        concurrency,
        rate_limit,
        fund_amount: 1.into(),
        wallet_seed: "passflow-tests".into(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_sender_does_not_stop_the_others() {
    let config = config(20, 2, 4, 0);
    config.validate().unwrap();
    let plan = config.plan();
    assert_eq!(plan.total_batches, 10);

    let wallets = sender_wallets(&config.wallet_seed, config.concurrency, MOCK_CHAIN_ID).unwrap();
    let sender = MockPaymentSender {
        ctx: TestContext::new(MockChain::default()).undeployed(plan.total_batches),
        deployer: Wallet::build_random(MOCK_CHAIN_ID),
        passkey: PasskeyPair::development().unwrap(),
        refused: wallets[1].address(),
    };

    let dispatcher = Dispatcher::new(Arc::new(sender), plan, config.batch_size, config.rate_limit);
    let run = dispatcher.run(wallets).await;
    assert_eq!(run.results.len(), plan.total_batches);

    let mut batches: Vec<_> = run.results.iter().map(|r| r.batch).collect();
    batches.sort_unstable();
    assert_eq!(batches, (0..10).collect::<Vec<_>>());

    // worker 1 owns batches 3..6
    let failed: Vec<_> = run.results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 3);
    assert!(failed.iter().all(|r| r.worker == 1));
    assert!(failed.iter().all(|r| r.error() == Some("insufficient funds for gas")));

    let report = LoadTestReport::new(&run, config.batch_size);
    assert_eq!(report.samples, 10);
    assert_eq!(report.successes, 7);
    assert_eq!(report.failures, 3);
    assert_eq!(report.errors.get("insufficient funds for gas"), Some(&3));
    assert!(report.latency.is_some());
    assert!(report.to_string().contains("insufficient funds for gas"));
}

#[tokio::test]
async fn rate_limit_paces_the_dispatch() {
    let config = config(4, 1, 1, 20);
    let wallets = sender_wallets(&config.wallet_seed, 1, 1).unwrap();

    let dispatcher =
        Dispatcher::new(Arc::new(InstantSender), config.plan(), config.batch_size, config.rate_limit);
    let run = dispatcher.run(wallets).await;

    // the 4th batch may start once 3 operations fit into 20 per second
    assert_eq!(run.results.len(), 4);
    assert!(run.results.iter().all(|r| r.is_success()));
    assert!(run.duration >= Duration::from_millis(140));
}

#[tokio::test]
async fn unlimited_dispatch_sends_everything() {
    let config = config(7, 3, 2, 0);
    let plan = config.plan();
    let wallets = sender_wallets(&config.wallet_seed, 2, 1).unwrap();

    let run = Dispatcher::new(Arc::new(InstantSender), plan, config.batch_size, 0)
        .run(wallets)
        .await;
    assert_eq!(run.results.len(), 3);
    assert!(run.started_at <= run.ended_at);

    let report = LoadTestReport::new(&run, config.batch_size);
    assert_eq!(report.successes, 3);
    assert!(report.errors.is_empty());
}
