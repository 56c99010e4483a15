use crate::{
    error::ContractsError,
    gen::{validator_api, HelperAPI, ValidatorAPI},
    traits::{AccountInitializer, PasskeyHelper},
};
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, H256, U256},
};
use passflow_primitives::{P256Signature, PackedUserOperation};
use std::sync::Arc;

/// Helper contract together with the WebAuthn validator it encodes for
#[derive(Clone)]
pub struct Helper<M: Middleware + 'static> {
    helper_api: HelperAPI<M>,
    validator_api: ValidatorAPI<M>,
}

impl<M: Middleware + 'static> Helper<M> {
    pub fn new(eth_client: Arc<M>, helper: Address, validator: Address) -> Self {
        Self {
            helper_api: HelperAPI::new(helper, eth_client.clone()),
            validator_api: ValidatorAPI::new(validator, eth_client),
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> PasskeyHelper for Helper<M> {
    async fn get_validation_data(&self, expire_time: u64) -> Result<U256, ContractsError> {
        self.helper_api
            .get_validation_data(expire_time.into())
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    async fn encode_uop_hash(
        &self,
        user_op_hash: H256,
        validation_data: U256,
    ) -> Result<H256, ContractsError> {
        self.helper_api
            .encode_uop_hash(user_op_hash.into(), validation_data)
            .call()
            .await
            .map(H256::from)
            .map_err(ContractsError::from_contract_error)
    }

    async fn get_client_json(
        &self,
        pre: &str,
        post: &str,
        uop_hash: H256,
    ) -> Result<(String, Bytes), ContractsError> {
        self.helper_api
            .get_client_json(pre.into(), post.into(), uop_hash.into())
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    async fn passkey_verify(
        &self,
        uop_hash: H256,
        signature: P256Signature,
        pub_key: (U256, U256),
        verify_type: u8,
        client_json: &str,
    ) -> Result<bool, ContractsError> {
        self.helper_api
            .passkey_verify(
                uop_hash.into(),
                signature.r,
                signature.s,
                pub_key.0,
                pub_key.1,
                verify_type.into(),
                client_json.into(),
            )
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    async fn encode_passkey_sig(
        &self,
        signature: P256Signature,
        verify_type: u8,
        client_json: &str,
    ) -> Result<Bytes, ContractsError> {
        self.helper_api
            .encode_passkey_sig(signature.r, signature.s, verify_type.into(), client_json.into())
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    async fn get_signature(
        &self,
        pub_key: (U256, U256),
        passkey_sig: Bytes,
        eoa_sig: Bytes,
        validation_data: U256,
    ) -> Result<Bytes, ContractsError> {
        self.helper_api
            .method::<_, Bytes>(
                "getSignature2",
                (pub_key.0, pub_key.1, passkey_sig, eoa_sig, validation_data),
            )
            .map_err(|e| ContractsError::ABI { inner: e.to_string() })?
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    async fn recover_address(
        &self,
        signature: Bytes,
        hash: H256,
    ) -> Result<Address, ContractsError> {
        self.helper_api
            .recover_address(signature, hash.into())
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    async fn get_uop_hash(
        &self,
        entry_point: Address,
        uo: &PackedUserOperation,
    ) -> Result<H256, ContractsError> {
        self.validator_api
            .get_uop_hash(entry_point, validator_api::PackedUserOperation::from(uo.clone()))
            .call()
            .await
            .map(H256::from)
            .map_err(ContractsError::from_contract_error)
    }

    async fn get_account_initializer(
        &self,
        initializer: &AccountInitializer,
    ) -> Result<Bytes, ContractsError> {
        let AccountInitializer {
            pub_key_x,
            pub_key_y,
            validator,
            owner,
            sender,
            recovery_install,
            fallback_install,
        } = initializer.clone();
        self.helper_api
            .method::<_, Bytes>(
                "getAccountInitializer2",
                (
                    pub_key_x,
                    pub_key_y,
                    validator,
                    owner,
                    sender,
                    recovery_install,
                    fallback_install,
                ),
            )
            .map_err(|e| ContractsError::ABI { inner: e.to_string() })?
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }

    async fn get_factory_create_account_hash(
        &self,
        factory: Address,
        salt: H256,
        expire_time: U256,
        initializer: Bytes,
    ) -> Result<H256, ContractsError> {
        self.helper_api
            .get_factory_create_account_hash(factory, salt.into(), expire_time, initializer)
            .call()
            .await
            .map(H256::from)
            .map_err(ContractsError::from_contract_error)
    }

    async fn get_packed_sig(
        &self,
        expire_time: U256,
        signature: Bytes,
    ) -> Result<Bytes, ContractsError> {
        self.helper_api
            .get_packed_sig(expire_time, signature)
            .call()
            .await
            .map_err(ContractsError::from_contract_error)
    }
}
