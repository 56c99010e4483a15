//! ERC-7579 style execution mode and batched execution encoding
//!
//! The account's `execute(bytes32 mode, bytes executionCalldata)` entry point takes a 32-byte mode
//! header followed by the calldata the mode describes. For [`CallType::Batch`] that calldata is the
//! ABI encoding of `(address,uint256,bytes)[]`, executed on-chain in array order.

use ethers::{
    abi::{self, ParamType, Token},
    types::{Address, Bytes, H256, U256},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the account dispatches the execution calldata
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum CallType {
    Single = 0x00,
    Batch = 0x01,
    DelegateCall = 0xff,
}

/// Whether a failing call reverts the whole execution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ExecType {
    Default = 0x00,
    Try = 0x01,
}

/// Mode selector (kept for ERC-7579 compliance, unused by the payable account)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeSelector {
    Default,
    Offset,
}

impl ModeSelector {
    pub fn to_bytes(self) -> [u8; 4] {
        match self {
            ModeSelector::Default => [0x00; 4],
            ModeSelector::Offset => [0xed, 0xa8, 0x6f, 0x9b],
        }
    }
}

/// ERC-7579 module type ids
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleType {
    Validator = 1,
    Executor = 2,
    Fallback = 3,
    Hook = 4,
    StatelessValidator = 7,
}

/// Length of the mode payload
pub const MODE_PAYLOAD_LENGTH: usize = 22;

/// Error when the mode payload does not fit
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("mode payload is {0} bytes, at most 22 allowed")]
pub struct ModePayloadTooLong(pub usize);

/// Packs `callType(1) ‖ execType(1) ‖ 0x00000000 ‖ modeSelector(4) ‖ payload(22, left-padded)`
pub fn encode_mode_type(
    call_type: CallType,
    exec_type: ExecType,
    mode_selector: ModeSelector,
    payload: &[u8],
) -> Result<H256, ModePayloadTooLong> {
    if payload.len() > MODE_PAYLOAD_LENGTH {
        return Err(ModePayloadTooLong(payload.len()));
    }
    let mut mode = [0u8; 32];
    mode[0] = call_type as u8;
    mode[1] = exec_type as u8;
    mode[6..10].copy_from_slice(&mode_selector.to_bytes());
    mode[32 - payload.len()..].copy_from_slice(payload);
    Ok(H256(mode))
}

/// Batch mode header with default execution and empty payload
pub fn batch_mode() -> H256 {
    let mut mode = [0u8; 32];
    mode[0] = CallType::Batch as u8;
    H256(mode)
}

/// One call of a batched execution
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Execution {
    pub fn new(target: Address, value: U256, data: Bytes) -> Self {
        Self { target, value, data }
    }

    fn into_token(self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.target),
            Token::Uint(self.value),
            Token::Bytes(self.data.to_vec()),
        ])
    }
}

fn executions_param() -> ParamType {
    ParamType::Array(Box::new(ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Bytes,
    ])))
}

/// ABI-encodes the executions as `(address,uint256,bytes)[]`, preserving order
pub fn encode_executions(executions: &[Execution]) -> Bytes {
    let tokens = executions.iter().cloned().map(Execution::into_token).collect();
    abi::encode(&[Token::Array(tokens)]).into()
}

/// Decodes `(address,uint256,bytes)[]`
pub fn decode_executions(data: &[u8]) -> Result<Vec<Execution>, abi::Error> {
    let mut tokens = abi::decode(&[executions_param()], data)?;
    let Some(Token::Array(items)) = tokens.pop() else {
        return Err(abi::Error::InvalidData);
    };
    items
        .into_iter()
        .map(|item| match item {
            Token::Tuple(fields) => match fields.as_slice() {
                [Token::Address(target), Token::Uint(value), Token::Bytes(data)] => {
                    Ok(Execution::new(*target, *value, data.clone().into()))
                }
                _ => Err(abi::Error::InvalidData),
            },
            _ => Err(abi::Error::InvalidData),
        })
        .collect()
}

/// Packs a single call as `target(20) ‖ value(32) ‖ data`
pub fn encode_single_execution(execution: &Execution) -> Bytes {
    let mut value = [0u8; 32];
    execution.value.to_big_endian(&mut value);
    [execution.target.as_bytes(), &value[..], &execution.data[..]].concat().into()
}
