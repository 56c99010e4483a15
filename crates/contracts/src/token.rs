use crate::{error::ContractsError, gen::TestTokenAPI, transaction::send_and_wait};
use ethers::{
    providers::Middleware,
    types::{Address, TransactionReceipt, U256},
};
use std::sync::Arc;

/// Mintable ERC-20 the payment flow moves
#[derive(Clone)]
pub struct TestToken<M: Middleware + 'static> {
    token_api: TestTokenAPI<M>,
}

impl<M: Middleware + 'static> TestToken<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { token_api: TestTokenAPI::new(address, eth_client) }
    }

    pub fn address(&self) -> Address {
        self.token_api.address()
    }

    pub async fn mint(
        &self,
        to: Address,
        amount: U256,
    ) -> Result<TransactionReceipt, ContractsError> {
        send_and_wait(self.token_api.mint(to, amount)).await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, ContractsError> {
        self.token_api.balance_of(account).call().await.map_err(ContractsError::from_contract_error)
    }
}
