use crate::{
    constants::user_operation::{
        DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_PRE_VERIFICATION_GAS,
    },
    packing::{pack_account_gas_limits, pack_gas_fees, unpack_uint128, PackError},
    utils::{as_checksum_addr, get_address},
};
use ethers::{
    abi::AbiEncode,
    contract::{EthAbiCodec, EthAbiType},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Packed user operation (ERC-4337 v0.7 layout)
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EthAbiCodec,
    EthAbiType,
)]
#[serde(rename_all = "camelCase")]
pub struct PackedUserOperation {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (anti replay protection)
    pub nonce: U256,

    /// Factory address followed by factory calldata, empty once the account is deployed
    pub init_code: Bytes,

    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,

    /// `verificationGasLimit ‖ callGasLimit`, 16 bytes each
    pub account_gas_limits: H256,

    /// The amount of gas to pay bundler to compensate for the pre-verification execution and
    /// calldata
    pub pre_verification_gas: U256,

    /// `maxPriorityFeePerGas ‖ maxFeePerGas`, 16 bytes each
    pub gas_fees: H256,

    /// Address of paymaster sponsoring the user operation, followed by extra data to send to the
    /// paymaster (can be empty)
    pub paymaster_and_data: Bytes,

    /// Scheme-tagged signature checked by the account's validator
    pub signature: Bytes,
}

/// User operation without signature (helper for packing user operation)
#[derive(EthAbiCodec, EthAbiType)]
struct UserOperationNoSignature {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: H256,
    pub call_data: H256,
    pub account_gas_limits: H256,
    pub pre_verification_gas: U256,
    pub gas_fees: H256,
    pub paymaster_and_data: H256,
}

impl From<&PackedUserOperation> for UserOperationNoSignature {
    fn from(value: &PackedUserOperation) -> Self {
        Self {
            sender: value.sender,
            nonce: value.nonce,
            init_code: keccak256(value.init_code.deref()).into(),
            call_data: keccak256(value.call_data.deref()).into(),
            account_gas_limits: value.account_gas_limits,
            pre_verification_gas: value.pre_verification_gas,
            gas_fees: value.gas_fees,
            paymaster_and_data: keccak256(value.paymaster_and_data.deref()).into(),
        }
    }
}

impl PackedUserOperation {
    /// Operation with the harness gas defaults and `fee_per_gas` for both fee fields
    pub fn with_defaults(sender: Address, fee_per_gas: U256) -> Result<Self, PackError> {
        Ok(Self::default()
            .sender(sender)
            .account_gas_limits(pack_account_gas_limits(
                DEFAULT_GAS_LIMIT.into(),
                DEFAULT_GAS_LIMIT.into(),
            )?)
            .pre_verification_gas(DEFAULT_PRE_VERIFICATION_GAS.into())
            .gas_fees(pack_gas_fees(fee_per_gas, fee_per_gas)?))
    }

    /// Default fee per gas when none is configured
    pub fn default_gas_price() -> U256 {
        DEFAULT_GAS_PRICE.into()
    }

    /// Packs the user operation into bytes
    pub fn pack(&self) -> Bytes {
        self.clone().encode().into()
    }

    /// Packs the user operation without signature to bytes (used for calculating the hash)
    pub fn pack_without_signature(&self) -> Bytes {
        UserOperationNoSignature::from(self).encode().into()
    }

    /// Calculates the hash the entry point assigns to the user operation
    pub fn hash(&self, entry_point: &Address, chain_id: u64) -> UserOperationHash {
        H256::from_slice(
            keccak256(
                [
                    keccak256(self.pack_without_signature().deref()).to_vec(),
                    entry_point.encode(),
                    U256::from(chain_id).encode(),
                ]
                .concat(),
            )
            .as_slice(),
        )
        .into()
    }

    /// `(verificationGasLimit, callGasLimit)`
    pub fn unpack_account_gas_limits(&self) -> (u128, u128) {
        unpack_uint128(self.account_gas_limits.as_bytes()).unwrap_or_default()
    }

    /// `(maxPriorityFeePerGas, maxFeePerGas)`
    pub fn unpack_gas_fees(&self) -> (u128, u128) {
        unpack_uint128(self.gas_fees.as_bytes()).unwrap_or_default()
    }

    /// Factory address if the operation deploys its sender
    pub fn factory(&self) -> Option<Address> {
        get_address(&self.init_code)
    }

    // Builder pattern helpers

    /// Sets the sender of the user operation
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    /// Sets the nonce of the user operation
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the init code of the user operation
    pub fn init_code(mut self, init_code: Bytes) -> Self {
        self.init_code = init_code;
        self
    }

    /// Sets the call data of the user operation
    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    /// Sets the packed account gas limits of the user operation
    pub fn account_gas_limits(mut self, account_gas_limits: H256) -> Self {
        self.account_gas_limits = account_gas_limits;
        self
    }

    /// Sets the pre-verification gas of the user operation
    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.pre_verification_gas = pre_verification_gas;
        self
    }

    /// Sets the packed gas fees of the user operation
    pub fn gas_fees(mut self, gas_fees: H256) -> Self {
        self.gas_fees = gas_fees;
        self
    }

    /// Sets the paymaster and data of the user operation
    pub fn paymaster_and_data(mut self, paymaster_and_data: Bytes) -> Self {
        self.paymaster_and_data = paymaster_and_data;
        self
    }

    /// Sets the signature of the user operation
    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }
}

/// User operation hash
#[derive(
    Eq, Hash, PartialEq, Debug, Serialize, Deserialize, Clone, Copy, Default, PartialOrd, Ord,
)]
pub struct UserOperationHash(pub H256);

impl From<H256> for UserOperationHash {
    fn from(value: H256) -> Self {
        Self(value)
    }
}

impl From<UserOperationHash> for H256 {
    fn from(value: UserOperationHash) -> Self {
        value.0
    }
}

impl From<[u8; 32]> for UserOperationHash {
    fn from(value: [u8; 32]) -> Self {
        Self(H256::from_slice(&value))
    }
}
