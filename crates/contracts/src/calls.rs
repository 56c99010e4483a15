//! Call data of the account, factory and payment contracts

pub use crate::gen::{
    account_factory_api::CreateAccountWithSignatureCall,
    pay_api::{Cheque, SendCall},
    payable_account_api::{ExecuteCall, InstallModuleCall, InstallRecoveryModuleCall},
    test_token_api::{ApproveCall, MintCall},
};
use ethers::{
    abi::{encode, AbiEncode, Token},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use passflow_primitives::{encode_executions, pack_uint128, Execution, PackError};

/// `createAccountWithSignature(template, initializer, salt, packedSig)`
pub fn create_account_with_signature(
    template: Address,
    initializer: Bytes,
    salt: H256,
    signature: Bytes,
) -> Bytes {
    CreateAccountWithSignatureCall { template, initializer, salt: salt.into(), signature }
        .encode()
        .into()
}

/// `execute(mode, abi.encode(executions))`
pub fn execute(mode: H256, executions: &[Execution]) -> Bytes {
    ExecuteCall { mode: mode.into(), execution_calldata: encode_executions(executions) }
        .encode()
        .into()
}

/// Installs the recovery module keyed by `keccak256(abi.encode(identifier))`
pub fn install_recovery_module(module: Address, identifier: &str) -> Bytes {
    let key = keccak256(encode(&[Token::String(identifier.into())]));
    InstallRecoveryModuleCall { module, data: encode(&[Token::FixedBytes(key.to_vec())]).into() }
        .encode()
        .into()
}

pub fn install_module(module_type_id: U256, module: Address, init_data: Bytes) -> Bytes {
    InstallModuleCall { module_type_id, module, init_data }.encode().into()
}

pub fn approve(spender: Address, amount: U256) -> Bytes {
    ApproveCall { spender, amount }.encode().into()
}

pub fn mint(to: Address, amount: U256) -> Bytes {
    MintCall { to, amount }.encode().into()
}

/// `send(cheque)` on the pay contract
pub fn pay_send(cheque: Cheque) -> Bytes {
    SendCall { cheque }.encode().into()
}

impl Cheque {
    /// Cheque paying `amount` of `token` that is identified by and expires at `expire_time`
    ///
    /// The recipient is left empty for the pay contract to fill in.
    pub fn single(token: Address, amount: U256, expire_time: u64) -> Result<Self, PackError> {
        Ok(Self {
            cheque_id: expire_time.into(),
            to: Address::zero(),
            token_address: token,
            amount,
            expiration: pack_uint128(expire_time.into(), expire_time.into())?,
        })
    }
}
