use crate::{
    error::ContractsError,
    gen::{entry_point_api, EntryPointAPI},
    traits::UserOpHasher,
    transaction::send_and_wait,
};
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, TransactionReceipt, H256, U256},
};
use passflow_primitives::PackedUserOperation;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { entry_point_api: EntryPointAPI::new(address, eth_client) }
    }

    /// Submits the operations and waits for the bundle to be mined
    pub async fn handle_ops(
        &self,
        uos: Vec<PackedUserOperation>,
        beneficiary: Address,
    ) -> Result<TransactionReceipt, ContractsError> {
        let count = uos.len();
        let call = self
            .entry_point_api
            .handle_ops(uos.into_iter().map(entry_point_api::PackedUserOperation::from).collect(), beneficiary);
        let receipt = send_and_wait(call).await?;
        debug!(tx_hash = ?receipt.transaction_hash, count, "Handled user operations");
        Ok(receipt)
    }

    pub async fn balance_of(&self, addr: &Address) -> Result<U256, ContractsError> {
        self.entry_point_api
            .balance_of(*addr)
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    /// Adds `value` wei to the deposit of `account`
    pub async fn deposit_to(
        &self,
        account: &Address,
        value: U256,
    ) -> Result<TransactionReceipt, ContractsError> {
        send_and_wait(self.entry_point_api.deposit_to(*account).value(value)).await
    }
}

#[async_trait]
impl<M: Middleware + 'static> UserOpHasher for EntryPoint<M> {
    async fn get_user_op_hash(&self, uo: &PackedUserOperation) -> Result<H256, ContractsError> {
        self.entry_point_api
            .get_user_op_hash(uo.clone().into())
            .call()
            .await
            .map(H256::from)
            .map_err(ContractsError::from_contract_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{MockProvider, Provider};

    fn entry_point() -> (EntryPoint<Provider<MockProvider>>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let ep = EntryPoint::new(
            Arc::new(provider),
            "0x0000000071727De22E5E9d8BAf0edAc6f37da032".parse().unwrap(),
        );
        (ep, mock)
    }

    #[tokio::test]
    async fn user_op_hash_from_call_result() {
        let (ep, mock) = entry_point();
        let hash = H256::repeat_byte(0x5a);
        mock.push::<ethers::types::Bytes, ethers::types::Bytes>(hash.as_bytes().to_vec().into()).unwrap();

        let uo = PackedUserOperation::with_defaults(
            Address::repeat_byte(0x42),
            PackedUserOperation::default_gas_price(),
        )
        .unwrap();
        assert_eq!(ep.get_user_op_hash(&uo).await.unwrap(), hash);
    }

    #[tokio::test]
    async fn balance_of_decodes_uint() {
        let (ep, mock) = entry_point();
        let mut word = [0u8; 32];
        U256::from(1_000_000u64).to_big_endian(&mut word);
        mock.push::<ethers::types::Bytes, ethers::types::Bytes>(word.to_vec().into()).unwrap();

        assert_eq!(ep.balance_of(&Address::repeat_byte(1)).await.unwrap(), 1_000_000.into());
    }
}
