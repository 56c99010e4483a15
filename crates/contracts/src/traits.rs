//! Views of the on-chain contracts the account pipeline depends on

use crate::error::ContractsError;
use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use passflow_primitives::{P256Signature, PackedUserOperation};

/// Computes the entry point hash of a user operation
#[async_trait]
pub trait UserOpHasher: Send + Sync {
    async fn get_user_op_hash(&self, uo: &PackedUserOperation) -> Result<H256, ContractsError>;
}

/// Predicts counterfactual account addresses
#[async_trait]
pub trait AddressComputer: Send + Sync {
    /// Address of the factory itself, the first 20 bytes of every init code
    fn factory(&self) -> Address;

    async fn compute_address(&self, template: Address, salt: H256)
        -> Result<Address, ContractsError>;
}

/// Arguments of the account initializer built by the helper
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountInitializer {
    pub pub_key_x: U256,
    pub pub_key_y: U256,
    pub validator: Address,
    /// Owner EOA of the account
    pub owner: Address,
    /// Counterfactual address the initializer is bound to
    pub sender: Address,
    pub recovery_install: Bytes,
    pub fallback_install: Bytes,
}

/// Encoding and verification routines of the helper and validator contracts
///
/// The passkey scheme composes its signature from these calls so that the bytes match what the
/// validator decodes on-chain.
#[async_trait]
pub trait PasskeyHelper: Send + Sync {
    /// Validation data expiring at `expire_time`
    async fn get_validation_data(&self, expire_time: u64) -> Result<U256, ContractsError>;

    /// Binds the entry point hash to the validation data
    async fn encode_uop_hash(
        &self,
        user_op_hash: H256,
        validation_data: U256,
    ) -> Result<H256, ContractsError>;

    /// `(clientDataJSON, message)` where `message` is what the passkey signs
    async fn get_client_json(
        &self,
        pre: &str,
        post: &str,
        uop_hash: H256,
    ) -> Result<(String, Bytes), ContractsError>;

    async fn passkey_verify(
        &self,
        uop_hash: H256,
        signature: P256Signature,
        pub_key: (U256, U256),
        verify_type: u8,
        client_json: &str,
    ) -> Result<bool, ContractsError>;

    async fn encode_passkey_sig(
        &self,
        signature: P256Signature,
        verify_type: u8,
        client_json: &str,
    ) -> Result<Bytes, ContractsError>;

    /// Final dual-factor blob placed into `UserOperation.signature`
    async fn get_signature(
        &self,
        pub_key: (U256, U256),
        passkey_sig: Bytes,
        eoa_sig: Bytes,
        validation_data: U256,
    ) -> Result<Bytes, ContractsError>;

    /// Signer recovered by the contract from an EIP-191 signature over `hash`
    async fn recover_address(&self, signature: Bytes, hash: H256)
        -> Result<Address, ContractsError>;

    /// Validator hash signed by the personal-sign scheme, the signature field carries the
    /// `sigType ‖ sigTime` prefix
    async fn get_uop_hash(
        &self,
        entry_point: Address,
        uo: &PackedUserOperation,
    ) -> Result<H256, ContractsError>;

    async fn get_account_initializer(
        &self,
        initializer: &AccountInitializer,
    ) -> Result<Bytes, ContractsError>;

    /// Hash the factory signer authorizes account creation with
    async fn get_factory_create_account_hash(
        &self,
        factory: Address,
        salt: H256,
        expire_time: U256,
        initializer: Bytes,
    ) -> Result<H256, ContractsError>;

    async fn get_packed_sig(
        &self,
        expire_time: U256,
        signature: Bytes,
    ) -> Result<Bytes, ContractsError>;
}
