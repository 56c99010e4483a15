use crate::{error::ContractsError, gen::ConfigAPI, transaction::send_and_wait};
use ethers::{providers::Middleware, types::Address};
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumIter};

/// Roles granted on the account configuration contract
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display, EnumIter)]
pub enum Role {
    #[strum(serialize = "bundler")]
    WhitelistedBundler,
    #[strum(serialize = "factory signer")]
    FactorySigner,
    #[strum(serialize = "pay signer")]
    PaySigner,
}

/// Account configuration contract holding the role whitelists
#[derive(Clone)]
pub struct Config<M: Middleware + 'static> {
    config_api: ConfigAPI<M>,
}

impl<M: Middleware + 'static> Config<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { config_api: ConfigAPI::new(address, eth_client) }
    }

    /// Grants `role` to every address in one transaction and waits for it
    pub async fn grant(&self, role: Role, accounts: Vec<Address>) -> Result<(), ContractsError> {
        let call = match role {
            Role::WhitelistedBundler => self.config_api.add_whitelisted_bundlers(accounts),
            Role::FactorySigner => self.config_api.add_factory_signers(accounts),
            Role::PaySigner => self.config_api.add_pay_signers(accounts),
        };
        send_and_wait(call).await.map(|_| ())
    }

    pub async fn has_role(&self, role: Role, account: Address) -> Result<bool, ContractsError> {
        let call = match role {
            Role::WhitelistedBundler => self.config_api.is_whitelisted_bundler(account),
            Role::FactorySigner => self.config_api.is_factory_signer(account),
            Role::PaySigner => self.config_api.is_pay_signer(account),
        };
        call.call().await.map_err(ContractsError::from_contract_error)
    }
}
