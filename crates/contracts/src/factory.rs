use crate::{error::ContractsError, gen::AccountFactoryAPI, traits::AddressComputer};
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, H256},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountFactory<M: Middleware + 'static> {
    account_factory_api: AccountFactoryAPI<M>,
}

impl<M: Middleware + 'static> AccountFactory<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { account_factory_api: AccountFactoryAPI::new(address, eth_client) }
    }
}

#[async_trait]
impl<M: Middleware + 'static> AddressComputer for AccountFactory<M> {
    fn factory(&self) -> Address {
        self.account_factory_api.address()
    }

    async fn compute_address(
        &self,
        template: Address,
        salt: H256,
    ) -> Result<Address, ContractsError> {
        self.account_factory_api
            .compute_address(template, salt.into())
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }
}
