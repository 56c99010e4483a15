use super::{config::WorkPlan, rate_limit::RateLimiter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::H256;
use futures::future::join_all;
use passflow_primitives::Wallet;
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, time::Instant};
use tracing::{error, info, warn};

/// A trait for sending one batch of user operations and waiting for it to be mined
#[async_trait]
pub trait BatchSender: Send + Sync + 'static {
    /// Builds `batch_size` operations signed by `signer`, submits them and returns the
    /// transaction hash once confirmed
    async fn send_batch(&self, signer: &Wallet, batch_size: usize) -> eyre::Result<H256>;
}

/// Outcome of one batch attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionResult {
    pub worker: usize,
    pub batch: usize,
    pub started_at: DateTime<Utc>,
    /// Confirmation or failure time
    pub ended_at: DateTime<Utc>,
    pub outcome: Result<H256, String>,
}

impl TransactionResult {
    /// Closes an attempt begun at `started_at`
    pub fn finish(
        worker: usize,
        batch: usize,
        started_at: DateTime<Utc>,
        outcome: Result<H256, String>,
    ) -> Self {
        Self { worker, batch, started_at, ended_at: Utc::now(), outcome }
    }

    pub fn latency(&self) -> Duration {
        (self.ended_at - self.started_at).to_std().unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

/// Every attempt of a run
#[derive(Clone, Debug)]
pub struct RunResults {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration: Duration,
    pub results: Vec<TransactionResult>,
}

/// Runs one worker per sender wallet against a shared rate limit
pub struct Dispatcher<S> {
    sender: Arc<S>,
    plan: WorkPlan,
    batch_size: usize,
    rate_limit: u64,
}

impl<S: BatchSender> Dispatcher<S> {
    pub fn new(sender: Arc<S>, plan: WorkPlan, batch_size: usize, rate_limit: u64) -> Self {
        Self { sender, plan, batch_size, rate_limit }
    }

    /// Worker `i` sends the batches the plan assigns it from `wallets[i]`
    ///
    /// Failed attempts are recorded and the worker moves on to its next batch.
    pub async fn run(&self, wallets: Vec<Wallet>) -> RunResults {
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();
        let started_at = Utc::now();
        let start = Instant::now();
        let limiter = RateLimiter::new(start, self.rate_limit);

        let mut workers = Vec::with_capacity(wallets.len());
        for (worker, wallet) in wallets.into_iter().enumerate() {
            let sender = self.sender.clone();
            let results_tx = results_tx.clone();
            let batches: Vec<usize> = self.plan.batches(worker).collect();
            let batch_size = self.batch_size;

            workers.push(tokio::spawn(async move {
                for (request, batch) in batches.into_iter().enumerate() {
                    limiter.wait((batch * batch_size) as u64).await;

                    let attempt = Utc::now();
                    let outcome = sender.send_batch(&wallet, batch_size).await;

                    let outcome = match outcome {
                        Ok(tx_hash) => {
                            info!(worker, request, ?tx_hash, "Batch confirmed");
                            Ok(tx_hash)
                        }
                        Err(err) => {
                            warn!(worker, request, "Batch failed: {err:#}");
                            Err(format!("{err:#}"))
                        }
                    };

                    // receiver lives until every worker is joined
                    let result = TransactionResult::finish(worker, batch, attempt, outcome);
                    let _ = results_tx.send(result);
                }
            }));
        }
        drop(results_tx);

        let mut results = Vec::new();
        for (worker, joined) in join_all(workers).await.into_iter().enumerate() {
            if let Err(err) = joined {
                error!(worker, "Worker stopped unexpectedly: {err}");
                results.push(TransactionResult::finish(
                    worker,
                    self.plan.batches(worker).next().unwrap_or_default(),
                    started_at,
                    Err(format!("worker {worker} stopped unexpectedly: {err}")),
                ));
            }
        }
        while let Some(result) = results_rx.recv().await {
            results.push(result);
        }

        RunResults { started_at, ended_at: Utc::now(), duration: start.elapsed(), results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    /// Fails every attempt of one sender and panics on another
    struct FlakySender {
        failing: ethers::types::Address,
        panicking: Option<ethers::types::Address>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BatchSender for FlakySender {
        async fn send_batch(&self, signer: &Wallet, batch_size: usize) -> eyre::Result<H256> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(signer.address()) == self.panicking {
                panic!("sender blew up");
            }
            if signer.address() == self.failing {
                return Err(eyre::eyre!("nonce too low"));
            }
            Ok(H256::from_low_u64_be(batch_size as u64))
        }
    }

    fn wallets(n: usize) -> Vec<Wallet> {
        (0..n).map(|i| Wallet::deterministic("runner", i, 1).unwrap()).collect()
    }

    #[tokio::test]
    async fn failing_worker_does_not_stop_others() {
        let wallets = wallets(3);
        let sender = Arc::new(FlakySender {
            failing: wallets[1].address(),
            panicking: None,
            calls: AtomicUsize::new(0),
        });
        let plan = WorkPlan::new(14, 2, 3);
        let run = Dispatcher::new(sender.clone(), plan, 2, 0).run(wallets).await;

        // 7 batches split 3/3/1
        assert_eq!(run.results.len(), 7);
        assert_eq!(sender.calls.load(Ordering::SeqCst), 7);

        let mut per_worker: HashMap<usize, Vec<&TransactionResult>> = HashMap::new();
        for result in &run.results {
            per_worker.entry(result.worker).or_default().push(result);
        }
        assert_eq!(per_worker[&0].len(), 3);
        assert!(per_worker[&0].iter().all(|r| r.is_success()));
        assert_eq!(per_worker[&1].len(), 3);
        assert!(per_worker[&1].iter().all(|r| r.error() == Some("nonce too low")));
        assert_eq!(per_worker[&2].len(), 1);
        assert_eq!(per_worker[&2][0].batch, 6);

        let mut batches: Vec<usize> = run.results.iter().map(|r| r.batch).collect();
        batches.sort_unstable();
        assert_eq!(batches, (0..7).collect::<Vec<_>>());
        assert!(run.ended_at >= run.started_at);
    }

    #[tokio::test]
    async fn panicking_worker_is_recorded_as_failure() {
        let wallets = wallets(2);
        let sender = Arc::new(FlakySender {
            failing: ethers::types::Address::zero(),
            panicking: Some(wallets[0].address()),
            calls: AtomicUsize::new(0),
        });
        let run = Dispatcher::new(sender, WorkPlan::new(4, 1, 2), 1, 0).run(wallets).await;

        let failures: Vec<_> = run.results.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].worker, 0);
        assert!(failures[0].error().unwrap().contains("stopped unexpectedly"));
        assert_eq!(run.results.iter().filter(|r| r.is_success()).count(), 2);
    }

    #[tokio::test]
    async fn attempts_carry_their_own_timestamps() {
        let wallets = wallets(2);
        let sender = Arc::new(FlakySender {
            failing: wallets[1].address(),
            panicking: None,
            calls: AtomicUsize::new(0),
        });
        let run = Dispatcher::new(sender, WorkPlan::new(6, 1, 2), 1, 20).run(wallets).await;

        assert_eq!(run.results.len(), 6);
        for result in &run.results {
            assert!(run.started_at <= result.started_at);
            assert!(result.started_at <= result.ended_at);
            assert!(result.ended_at <= run.ended_at);
        }

        // the rate limit holds batch 5 back until 5 operations fit into 20 per second
        let last = run.results.iter().find(|r| r.batch == 5).unwrap();
        assert!(last.started_at - run.started_at >= chrono::Duration::milliseconds(240));
    }
}
