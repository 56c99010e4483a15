use crate::{
    loadtest::{CallDataLog, LoadTestConfig, PaymentOptions},
    utils::{parse_address, parse_ether, parse_u256, validate_private_key},
};
use clap::Parser;
use ethers::types::{Address, U256};
use expanded_pathbuf::ExpandedPathBuf;
use passflow_primitives::{
    constants::{
        load_test::{DEFAULT_CALLDATA_FILE, DEFAULT_WALLET_SEED},
        user_operation::DEFAULT_GAS_PRICE,
    },
    ContractAddresses, DeploymentRegistry, PasskeyPair,
};

/// Execution client connection and the deployer key
#[derive(Debug, Clone, Parser)]
pub struct ClientArgs {
    /// Ethereum execution client RPC endpoint (http or ws).
    #[clap(long, env = "ETH_CLIENT_ADDRESS", default_value = "http://127.0.0.1:8545")]
    pub eth_client_address: String,

    /// Hex encoded private key of the deployer (factory signer, token minter and deposit payer).
    #[clap(long, env = "PRIVATE_KEY", value_parser = validate_private_key, hide_env_values = true)]
    pub private_key: String,
}

/// Contract addresses, loaded from a registry and overridden per contract
#[derive(Debug, Clone, Default, Parser)]
pub struct ContractArgs {
    /// Deployment registry JSON file.
    #[clap(long, env = "REGISTRY")]
    pub registry: Option<ExpandedPathBuf>,

    #[clap(long, env = "ENTRYPOINT", value_parser = parse_address)]
    pub entry_point: Option<Address>,

    #[clap(long, env = "HELPER", value_parser = parse_address)]
    pub helper: Option<Address>,

    /// Fallback handler installed on new accounts.
    #[clap(long, env = "TOKEN_RECEIVER", value_parser = parse_address)]
    pub token_receiver: Option<Address>,

    #[clap(long, env = "CONFIG", value_parser = parse_address)]
    pub config: Option<Address>,

    #[clap(long, env = "WEBAUTHN_VALIDATOR", value_parser = parse_address)]
    pub webauthn_validator: Option<Address>,

    /// Account implementation new accounts are cloned from.
    #[clap(long, env = "PAYABLE_ACCOUNT", value_parser = parse_address)]
    pub payable_account: Option<Address>,

    #[clap(long, env = "ACCOUNT_FACTORY", value_parser = parse_address)]
    pub account_factory: Option<Address>,

    #[clap(long, env = "MOCK_RECOVERY_MODULE", value_parser = parse_address)]
    pub mock_recovery_module: Option<Address>,

    #[clap(long = "test-erc20", env = "TEST_ERC20", value_parser = parse_address)]
    pub test_erc20: Option<Address>,

    #[clap(long, env = "PAY", value_parser = parse_address)]
    pub pay: Option<Address>,
}

impl ContractArgs {
    /// Registry record with the flags applied on top
    pub fn resolve(&self) -> eyre::Result<ContractAddresses> {
        let mut addresses = match &self.registry {
            Some(path) => DeploymentRegistry::new(path.to_path_buf())
                .load()?
                .ok_or_else(|| eyre::eyre!("Deployment registry {path:?} does not exist"))?,
            None => ContractAddresses::default(),
        };
        self.apply(&mut addresses);
        Ok(addresses)
    }

    pub fn apply(&self, addresses: &mut ContractAddresses) {
        let overrides = [
            (self.entry_point, &mut addresses.entry_point),
            (self.helper, &mut addresses.helper),
            (self.token_receiver, &mut addresses.token_receiver),
            (self.config, &mut addresses.config),
            (self.webauthn_validator, &mut addresses.webauthn_validator),
            (self.payable_account, &mut addresses.payable_account),
            (self.account_factory, &mut addresses.account_factory),
            (self.mock_recovery_module, &mut addresses.mock_recovery_module),
            (self.test_erc20, &mut addresses.test_erc20),
            (self.pay, &mut addresses.pay),
        ];
        for (flag, address) in overrides {
            if let Some(flag) = flag {
                *address = flag;
            }
        }
    }
}

/// Payment batch args
#[derive(Debug, Clone, Parser)]
pub struct BatchArgs {
    /// Balance in ether the smart account and its entry point deposit are topped up to.
    #[clap(long, env = "SMART_ACCOUNT_BALANCE", default_value = "0.000001", value_parser = parse_ether)]
    pub smart_account_balance: U256,

    /// Max fee and priority fee per gas of the user operations in wei.
    #[clap(long, env = "GAS_PRICE", default_value_t = U256::from(DEFAULT_GAS_PRICE), value_parser = parse_u256)]
    pub gas_price: U256,

    /// Hex encoded P-256 private key owning the accounts, the development key if unset.
    #[clap(long, env = "PASSKEY_PRIVATE_KEY", value_parser = validate_private_key, hide_env_values = true)]
    pub passkey_private_key: Option<String>,

    /// File every batch appends `sender,callData` to.
    #[clap(long, env = "CALLDATA_FILE", default_value = DEFAULT_CALLDATA_FILE)]
    pub calldata_file: ExpandedPathBuf,
}

impl BatchArgs {
    pub fn passkey(&self) -> eyre::Result<PasskeyPair> {
        Ok(match &self.passkey_private_key {
            Some(key) => PasskeyPair::from_hex(key)?,
            None => PasskeyPair::development()?,
        })
    }

    pub fn options(&self) -> eyre::Result<PaymentOptions> {
        Ok(PaymentOptions {
            passkey: self.passkey()?,
            min_balance: self.smart_account_balance,
            fee_per_gas: self.gas_price,
            calldata_log: Some(CallDataLog::new(self.calldata_file.clone())),
        })
    }
}

/// Load test args
#[derive(Debug, Clone, Parser)]
pub struct LoadTestArgs {
    /// User operations to send in total.
    #[clap(long, env = "TOTAL_UOP")]
    pub total_uop: usize,

    /// User operations per `handleOps` transaction.
    #[clap(long, env = "BATCH_SIZE", default_value_t = 1)]
    pub batch_size: usize,

    /// Concurrent workers, each sending from its own wallet.
    #[clap(long, env = "CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// User operations per second over all workers, 0 disables the limit.
    #[clap(long, env = "RATE_LIMIT", default_value_t = 0)]
    pub rate_limit: u64,

    /// Balance in ether every sender wallet is topped up to.
    #[clap(long, env = "FUND_AMOUNT", default_value = "1", value_parser = parse_ether)]
    pub fund_amount: U256,

    /// Seed of the deterministic sender wallets.
    #[clap(long, env = "WALLET_SEED", default_value = DEFAULT_WALLET_SEED)]
    pub wallet_seed: String,
}

impl From<LoadTestArgs> for LoadTestConfig {
    fn from(args: LoadTestArgs) -> Self {
        Self {
            total_uop: args.total_uop,
            batch_size: args.batch_size,
            concurrency: args.concurrency,
            rate_limit: args.rate_limit,
            fund_amount: args.fund_amount,
            wallet_seed: args.wallet_seed,
        }
    }
}
