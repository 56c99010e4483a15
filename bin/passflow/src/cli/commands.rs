use super::args::{BatchArgs, ClientArgs, ContractArgs, LoadTestArgs};
use crate::{
    deployment::Deployment,
    loadtest::{
        launch_load_test, BatchSender, LoadTestConfig, LoadTestReport, PaymentBatchSender,
        RunResults, TransactionResult,
    },
    utils::{create_http_provider, create_ws_provider, parse_h256},
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ethers::{
    providers::Middleware,
    types::{H256, U256},
    utils::to_checksum,
};
use expanded_pathbuf::ExpandedPathBuf;
use passflow_primitives::{
    constants::account::FACTORY_EXPIRE_TIME, random_salt, DeploymentRegistry, PasskeyPair,
};
use std::{sync::Arc, time::Instant};
use tracing::{error, info, warn};

/// Connects over http or ws depending on the endpoint and runs `$run` with the client
macro_rules! with_eth_client {
    ($address:expr, |$client:ident| $run:expr) => {
        if $address.starts_with("http") {
            let $client = Arc::new(create_http_provider(&$address).await?);
            $run
        } else {
            let $client = Arc::new(create_ws_provider(&$address).await?);
            $run
        }
    };
}

/// Provision deterministic senders and run the concurrent load test
#[derive(Debug, Parser)]
pub struct LoadTestCommand {
    #[clap(flatten)]
    client: ClientArgs,

    #[clap(flatten)]
    contracts: ContractArgs,

    #[clap(flatten)]
    batch: BatchArgs,

    #[clap(flatten)]
    load: LoadTestArgs,
}

impl LoadTestCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let address = self.client.eth_client_address.clone();
        with_eth_client!(address, |eth_client| self.run(eth_client).await)
    }

    async fn run<M: Middleware + 'static>(self, eth_client: Arc<M>) -> eyre::Result<()> {
        let deployment = Arc::new(
            Deployment::connect(eth_client, self.contracts.resolve()?, &self.client.private_key)
                .await?,
        );
        let options = self.batch.options()?;
        let report =
            launch_load_test(LoadTestConfig::from(self.load), deployment, options).await?;
        println!("\n{report}");
        Ok(())
    }
}

/// Send payment batches one after another from the deployer
#[derive(Debug, Parser)]
pub struct SendBatchCommand {
    #[clap(flatten)]
    client: ClientArgs,

    #[clap(flatten)]
    contracts: ContractArgs,

    #[clap(flatten)]
    batch: BatchArgs,

    /// Number of batches to send.
    #[clap(long, env = "CALLDATA_SIZE", default_value_t = 100)]
    calldata_size: usize,

    /// User operations per batch.
    #[clap(long, default_value_t = 1)]
    batch_size: usize,
}

impl SendBatchCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let address = self.client.eth_client_address.clone();
        with_eth_client!(address, |eth_client| self.run(eth_client).await)
    }

    async fn run<M: Middleware + 'static>(self, eth_client: Arc<M>) -> eyre::Result<()> {
        let deployment = Arc::new(
            Deployment::connect(eth_client, self.contracts.resolve()?, &self.client.private_key)
                .await?,
        );
        let options = self.batch.options()?;
        if let Some(log) = &options.calldata_log {
            if let Err(err) = log.clear() {
                warn!("Clearing call data file failed: {err:?}");
            }
        }

        let signer = deployment.deployer.clone();
        let sender = PaymentBatchSender::new(deployment, options);

        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(self.calldata_size);
        for batch in 0..self.calldata_size {
            let attempt = Utc::now();
            let outcome = sender.send_batch(&signer, self.batch_size).await;

            let outcome = match outcome {
                Ok(tx_hash) => {
                    info!(batch, ?tx_hash, "Batch sent");
                    Ok(tx_hash)
                }
                Err(err) => {
                    error!(batch, "Batch failed: {err:?}");
                    Err(format!("{err:#}"))
                }
            };
            results.push(TransactionResult::finish(0, batch, attempt, outcome));
        }

        let run = RunResults { started_at, ended_at: Utc::now(), duration: start.elapsed(), results };
        println!("\n{}", LoadTestReport::new(&run, self.batch_size));
        Ok(())
    }
}

/// Print the counterfactual address and init code of a new passkey account
#[derive(Debug, Parser)]
pub struct InitCodeCommand {
    #[clap(flatten)]
    client: ClientArgs,

    #[clap(flatten)]
    contracts: ContractArgs,

    #[clap(flatten)]
    batch: BatchArgs,

    /// Deployment salt, random if unset.
    #[clap(long, value_parser = parse_h256)]
    salt: Option<H256>,

    /// Expiry (unix seconds) of the deployer's factory authorization.
    #[clap(long, default_value_t = FACTORY_EXPIRE_TIME)]
    expire_time: u64,
}

impl InitCodeCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let address = self.client.eth_client_address.clone();
        with_eth_client!(address, |eth_client| self.run(eth_client).await)
    }

    async fn run<M: Middleware + 'static>(self, eth_client: Arc<M>) -> eyre::Result<()> {
        let deployment =
            Deployment::connect(eth_client, self.contracts.resolve()?, &self.client.private_key)
                .await?;
        let passkey = self.batch.passkey()?;
        let salt = self.salt.unwrap_or_else(random_salt);

        let derived = deployment
            .deriver()
            .derive(&passkey, &deployment.deployer, salt, self.expire_time)
            .await?;

        println!("sender: {}", to_checksum(&derived.sender, None));
        println!("salt: {:?}", derived.salt);
        println!("initCode: {}", derived.init_code);
        Ok(())
    }
}

/// Generate a P-256 passkey
#[derive(Debug, Parser)]
pub struct CreatePasskeyCommand {}

impl CreatePasskeyCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        let passkey = PasskeyPair::random();
        println!("privateKey: {:?}", passkey.private_key());
        println!("pubKeyX: {:?}", as_word(passkey.pub_key_x));
        println!("pubKeyY: {:?}", as_word(passkey.pub_key_y));
        Ok(())
    }
}

/// Deployment registry commands
#[derive(Debug, Subcommand)]
pub enum RegistryCommand {
    /// Print the registry as JSON
    #[command(name = "show")]
    Show {
        /// Registry file.
        #[clap(long, env = "REGISTRY")]
        registry: ExpandedPathBuf,
    },

    /// Print the registry as `NAME=address` lines
    #[command(name = "env")]
    Env {
        /// Registry file.
        #[clap(long, env = "REGISTRY")]
        registry: ExpandedPathBuf,
    },

    /// Write the given addresses over the stored record
    #[command(name = "save")]
    Save {
        #[clap(flatten)]
        contracts: ContractArgs,
    },
}

impl RegistryCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        match self {
            RegistryCommand::Show { registry } => {
                let addresses = load_registry(registry)?;
                println!("{}", serde_json::to_string_pretty(&addresses)?);
            }
            RegistryCommand::Env { registry } => {
                print!("{}", load_registry(registry)?.to_env());
            }
            RegistryCommand::Save { contracts } => {
                let path = contracts
                    .registry
                    .clone()
                    .ok_or_else(|| eyre::eyre!("--registry is required to save"))?;
                let registry = DeploymentRegistry::new(path.to_path_buf());

                let mut addresses = registry.load()?.unwrap_or_default();
                contracts.apply(&mut addresses);
                let missing = addresses.missing();
                if !missing.is_empty() {
                    warn!("Saving registry without: {}", missing.join(", "));
                }

                registry.save(&addresses)?;
                info!(path = ?registry.path(), "Saved deployment registry");
            }
        }
        Ok(())
    }
}

fn as_word(value: U256) -> H256 {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    H256(word)
}

fn load_registry(path: ExpandedPathBuf) -> eyre::Result<passflow_primitives::ContractAddresses> {
    DeploymentRegistry::new(path.to_path_buf())
        .load()?
        .ok_or_else(|| eyre::eyre!("Deployment registry {path:?} does not exist"))
}
