use ethers::types::U256;

/// Parameters of one load test run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTestConfig {
    /// User operations to submit over the whole run
    pub total_uop: usize,
    /// User operations per `handleOps` transaction
    pub batch_size: usize,
    /// Workers, each with its own sender wallet
    pub concurrency: usize,
    /// User operations per second over all workers, 0 disables the limit
    pub rate_limit: u64,
    /// Wei every sender wallet is topped up to
    pub fund_amount: U256,
    pub wallet_seed: String,
}

impl LoadTestConfig {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.batch_size == 0 {
            return Err(eyre::eyre!("Batch size must be greater than zero"));
        }
        if self.concurrency == 0 {
            return Err(eyre::eyre!("Concurrency must be greater than zero"));
        }
        Ok(())
    }

    pub fn plan(&self) -> WorkPlan {
        WorkPlan::new(self.total_uop, self.batch_size, self.concurrency)
    }
}

/// Split of the batches over the workers
///
/// Worker `w` owns the contiguous batch indices `w * per_worker..(w + 1) * per_worker`, clipped to
/// `total_batches`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkPlan {
    pub total_batches: usize,
    pub per_worker: usize,
}

impl WorkPlan {
    pub fn new(total_uop: usize, batch_size: usize, concurrency: usize) -> Self {
        let total_batches = total_uop.div_ceil(batch_size.max(1));
        Self { total_batches, per_worker: total_batches.div_ceil(concurrency.max(1)) }
    }

    /// Global batch indices `worker` sends, in order
    pub fn batches(&self, worker: usize) -> impl Iterator<Item = usize> {
        let start = worker.saturating_mul(self.per_worker);
        let end = start.saturating_add(self.per_worker).min(self.total_batches);
        start..end.max(start)
    }
}
