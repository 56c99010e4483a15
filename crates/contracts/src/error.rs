use crate::gen::entry_point_api::{EntryPointAPIErrors, FailedOp};
use ethers::{
    abi::AbiDecode,
    prelude::ContractError,
    providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError},
    types::{Bytes, H256},
};
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Errors of contract calls and transactions
#[derive(Debug, Error, Clone)]
pub enum ContractsError {
    /// Failed user operation error
    #[error("{0}")]
    FailedOp(FailedOp),

    /// execution reverted
    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    /// Transaction was mined but reverted
    #[error("transaction {0:?} reverted")]
    TransactionReverted(H256),

    /// Transaction left the mempool without a receipt
    #[error("transaction {0:?} dropped")]
    TransactionDropped(H256),

    /// Provider error
    #[error("provider error: {inner}")]
    Provider {
        /// The inner error message
        inner: String,
    },

    /// ABI error
    #[error("abi error: {inner}")]
    ABI {
        /// The inner error message
        inner: String,
    },

    /// Data decoding error
    #[error("decode error: {inner}")]
    Decode {
        /// The inner error message
        inner: String,
    },

    /// Any other error
    #[error("other error: {inner}")]
    Other {
        /// The inner error message
        inner: String,
    },
}

impl ContractsError {
    /// Maps a failed contract call, decoding entry point reverts where possible
    pub fn from_contract_error<M: Middleware>(err: ContractError<M>) -> Self {
        let decoded = match err {
            ContractError::DecodingError(e) => return Self::Decode { inner: e.to_string() },
            ContractError::AbiError(e) => return Self::ABI { inner: e.to_string() },
            ContractError::MiddlewareError { e } => Self::from_middleware_error::<M>(e),
            ContractError::ProviderError { e } => Self::from_provider_error(&e),
            ContractError::Revert(data) => decode_revert_error(data),
            _ => return Self::Other { inner: err.to_string() },
        };

        match decoded {
            Ok(EntryPointAPIErrors::FailedOp(op)) => Self::FailedOp(op),
            Ok(EntryPointAPIErrors::FailedOpWithRevert(op)) => {
                Self::FailedOp(FailedOp { op_index: op.op_index, reason: op.reason })
            }
            Ok(EntryPointAPIErrors::RevertString(reason)) => Self::ExecutionReverted(reason),
            Ok(other) => Self::ExecutionReverted(format!("{other:?}")),
            Err(err) => err,
        }
    }

    pub fn from_provider_error(err: &ProviderError) -> Result<EntryPointAPIErrors, Self> {
        match err {
            ProviderError::JsonRpcClientError(err) => err
                .as_error_response()
                .map(Self::from_json_rpc_error)
                .unwrap_or(Err(ContractsError::Provider {
                    inner: format!("unknown json-rpc client error: {err:?}"),
                })),
            ProviderError::HTTPError(err) => {
                Err(ContractsError::Provider { inner: format!("HTTP error: {err:?}") })
            }
            _ => {
                Err(ContractsError::Provider { inner: format!("unknown provider error: {err:?}") })
            }
        }
    }

    pub fn from_json_rpc_error(err: &JsonRpcError) -> Result<EntryPointAPIErrors, Self> {
        let Some(ref value) = err.data else {
            // nodes that strip revert data still put the reason into the message
            return match err.message.strip_prefix("execution reverted: ") {
                Some(reason) => Ok(EntryPointAPIErrors::RevertString(reason.into())),
                None => Err(Self::Provider { inner: err.message.clone() }),
            };
        };

        let serde_json::Value::String(data) = value else {
            return Err(Self::Decode {
                inner: format!("json-rpc return data is not a string: {value:?}"),
            });
        };

        let re = Regex::new(r"0x[0-9a-fA-F]+")
            .map_err(|e| Self::Other { inner: format!("invalid revert data pattern: {e}") })?;
        let Some(hex) = re.find(data) else {
            return Err(Self::Decode { inner: format!("hex string not found in {data:?}") });
        };

        let bytes = Bytes::from_str(hex.as_str()).map_err(|e| Self::Decode {
            inner: format!("string {data:?} could not be converted to bytes: {e:?}"),
        })?;

        decode_revert_error(bytes)
    }

    pub fn from_middleware_error<M: Middleware>(
        err: M::Error,
    ) -> Result<EntryPointAPIErrors, Self> {
        if let Some(err) = err.as_error_response() {
            return Self::from_json_rpc_error(err);
        }

        if let Some(err) = err.as_provider_error() {
            return Self::from_provider_error(err);
        }

        Err(Self::Provider { inner: format!("middleware error: {err:?}") })
    }
}

// ethers-rs could not handle `require (true, "reason")` or `revert("test failed")` well in this
// case revert with `require` error would ends up with error event signature `0x08c379a0`
// we need to handle it manually
fn decode_revert_string(data: Bytes) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (error_sig, reason) = data.split_at(4);
    if error_sig == [0x08, 0xc3, 0x79, 0xa0] {
        <String as AbiDecode>::decode(reason).ok()
    } else {
        None
    }
}

pub fn decode_revert_error(data: Bytes) -> Result<EntryPointAPIErrors, ContractsError> {
    let decoded = EntryPointAPIErrors::decode(data.as_ref());
    match decoded {
        Ok(res) => Ok(res),
        Err(e) => {
            if let Some(error_str) = decode_revert_string(data) {
                return Ok(EntryPointAPIErrors::RevertString(error_str));
            };

            Err(ContractsError::Decode {
                inner: format!(
                    "data field can't be deserialized to EntryPointAPIErrors error: {e:?}",
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_error_msg() -> eyre::Result<()> {
        let err_msg = Bytes::from_str("0x0000000000000000000000000000000000000000000000000000000000000020000000000000000000000000000000000000000000000000000000000000001841413934206761732076616c756573206f766572666c6f770000000000000000")?;
        let res = EntryPointAPIErrors::decode(err_msg)?;
        match res {
            EntryPointAPIErrors::RevertString(s) => {
                assert_eq!(s, "AA94 gas values overflow")
            }
            _ => panic!("Invalid error message"),
        }

        let err_msg = Bytes::from_str("0x08c379a00000000000000000000000000000000000000000000000000000000000000020000000000000000000000000000000000000000000000000000000000000001841413934206761732076616c756573206f766572666c6f770000000000000000")?;
        match decode_revert_error(err_msg)? {
            EntryPointAPIErrors::RevertString(s) => assert_eq!(s, "AA94 gas values overflow"),
            _ => panic!("Invalid error message"),
        }
        Ok(())
    }

    #[test]
    fn deserialize_failed_op() -> eyre::Result<()> {
        let err_msg = Bytes::from_str("0x220266b600000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000040000000000000000000000000000000000000000000000000000000000000001e41413430206f76657220766572696669636174696f6e4761734c696d69740000")?;
        match decode_revert_error(err_msg)? {
            EntryPointAPIErrors::FailedOp(f) => {
                assert_eq!(f.reason, "AA40 over verificationGasLimit")
            }
            _ => panic!("Invalid error message"),
        }
        Ok(())
    }

    #[test]
    fn json_rpc_error_with_revert_data() {
        let err = JsonRpcError {
            code: 3,
            message: "execution reverted".into(),
            data: Some(serde_json::Value::String("Reverted 0x220266b600000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000040000000000000000000000000000000000000000000000000000000000000001e41413430206f76657220766572696669636174696f6e4761734c696d69740000".into())),
        };
        assert!(matches!(
            ContractsError::from_json_rpc_error(&err),
            Ok(EntryPointAPIErrors::FailedOp(_))
        ));
    }

    #[test]
    fn json_rpc_error_without_data() {
        let err = JsonRpcError {
            code: 3,
            message: "execution reverted: not a bundler".into(),
            data: None,
        };
        match ContractsError::from_json_rpc_error(&err) {
            Ok(EntryPointAPIErrors::RevertString(s)) => assert_eq!(s, "not a bundler"),
            other => panic!("unexpected {other:?}"),
        }

        let err = JsonRpcError { code: -32000, message: "nonce too low".into(), data: None };
        assert!(matches!(
            ContractsError::from_json_rpc_error(&err),
            Err(ContractsError::Provider { .. })
        ));
    }

    #[test]
    fn short_revert_data() {
        assert_eq!(decode_revert_string(Bytes::from(vec![0x08, 0xc3])), None);
        assert!(decode_revert_error(Bytes::from(vec![0x01, 0x02, 0x03, 0x04, 0x05])).is_err());
    }
}
