//! Connected contract handles of one deployment

use ethers::{
    middleware::{NonceManagerMiddleware, SignerMiddleware},
    providers::Middleware,
    signers::LocalWallet,
};
use passflow_account::{AccountTemplate, InitCodeDeriver};
use passflow_contracts::{AccountFactory, Config, EntryPoint, Helper, TestToken};
use passflow_primitives::{ContractAddresses, Wallet};
use std::sync::Arc;
use tracing::info;

/// Client sending transactions from one wallet
pub type SignerClient<M> = SignerMiddleware<Arc<M>, LocalWallet>;

/// Deployer client shared by concurrent workers, nonces are assigned locally
pub type DeployerClient<M> = NonceManagerMiddleware<SignerClient<M>>;

pub struct Deployment<M: Middleware + 'static> {
    pub eth_client: Arc<M>,
    /// Read from the connected network
    pub chain_id: u64,
    pub addresses: ContractAddresses,
    /// Factory signer, token minter and deposit payer
    pub deployer: Wallet,
    pub deployer_client: Arc<DeployerClient<M>>,
    pub entry_point: Arc<EntryPoint<M>>,
    pub helper: Arc<Helper<M>>,
    pub factory: Arc<AccountFactory<M>>,
}

impl<M: Middleware + 'static> Deployment<M> {
    pub async fn connect(
        eth_client: Arc<M>,
        addresses: ContractAddresses,
        deployer_key: &str,
    ) -> eyre::Result<Self> {
        let missing = addresses.missing();
        if !missing.is_empty() {
            return Err(eyre::eyre!("Missing contract addresses: {}", missing.join(", ")));
        }

        let chain_id = eth_client.get_chainid().await?.as_u64();
        let deployer = Wallet::from_private_key(deployer_key, chain_id)?;
        info!(chain_id, deployer = ?deployer.address(), "Connected to deployment");

        let signer = SignerMiddleware::new(eth_client.clone(), deployer.signer.clone());
        let deployer_client = Arc::new(NonceManagerMiddleware::new(signer, deployer.address()));

        Ok(Self {
            entry_point: Arc::new(EntryPoint::new(eth_client.clone(), addresses.entry_point)),
            helper: Arc::new(Helper::new(
                eth_client.clone(),
                addresses.helper,
                addresses.webauthn_validator,
            )),
            factory: Arc::new(AccountFactory::new(eth_client.clone(), addresses.account_factory)),
            eth_client,
            chain_id,
            addresses,
            deployer,
            deployer_client,
        })
    }

    /// Account implementation and modules new accounts are initialized with
    pub fn template(&self) -> AccountTemplate {
        AccountTemplate {
            implementation: self.addresses.payable_account,
            validator: self.addresses.webauthn_validator,
            recovery_module: self.addresses.mock_recovery_module,
            fallback_module: self.addresses.token_receiver,
        }
    }

    pub fn deriver(&self) -> InitCodeDeriver<AccountFactory<M>, Helper<M>> {
        InitCodeDeriver::new(self.factory.clone(), self.helper.clone(), self.template())
    }

    pub fn config(&self) -> Config<DeployerClient<M>> {
        Config::new(self.deployer_client.clone(), self.addresses.config)
    }

    pub fn token(&self) -> TestToken<DeployerClient<M>> {
        TestToken::new(self.deployer_client.clone(), self.addresses.test_erc20)
    }

    /// Entry point that the deployer pays deposits through
    pub fn deposits(&self) -> EntryPoint<DeployerClient<M>> {
        EntryPoint::new(self.deployer_client.clone(), self.addresses.entry_point)
    }

    pub fn signer_client(&self, wallet: &Wallet) -> Arc<SignerClient<M>> {
        Arc::new(SignerMiddleware::new(self.eth_client.clone(), wallet.signer.clone()))
    }
}
