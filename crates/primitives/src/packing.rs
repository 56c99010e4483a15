//! Fixed-width packing used by packed user operations
//!
//! `accountGasLimits` and `gasFees` are both two `uint128` values concatenated big-endian into a
//! single 32-byte slot. `initCode` and `paymasterAndData` are tightly packed byte strings prefixed
//! by the address of the contract they target.

use crate::constants::paymaster::DEFAULT_SIG_TIME;
use ethers::types::{Address, Bytes, H256, U256};
use thiserror::Error;

/// Errors produced while packing or unpacking fixed-width fields
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackError {
    /// A value does not fit in the width reserved for it
    #[error("{field} does not fit in 128 bits: {value}")]
    Overflow {
        /// Name of the field being packed
        field: &'static str,
        /// The rejected value
        value: U256,
    },

    /// Slot has the wrong size
    #[error("expected a {expected}-byte slot, got {actual} bytes")]
    SlotLength { expected: usize, actual: usize },

    /// Buffer ends before all fixed-width fields are read
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Paymaster mode byte is not a known layout
    #[error("unknown paymaster mode {0}")]
    UnknownPaymasterMode(u8),
}

/// Narrows a `U256` to `u128`, rejecting anything wider
pub fn to_u128(field: &'static str, value: U256) -> Result<u128, PackError> {
    if value > U256::from(u128::MAX) {
        return Err(PackError::Overflow { field, value });
    }
    Ok(value.as_u128())
}

/// Concatenates the big-endian encodings of `hi` and `lo`
pub fn pack_u128_pair(hi: u128, lo: u128) -> [u8; 32] {
    let mut res = [0u8; 32];
    res[..16].copy_from_slice(&hi.to_be_bytes());
    res[16..].copy_from_slice(&lo.to_be_bytes());
    res
}

/// Packs two uint128 given as `U256`, failing if either is wider than 128 bits
pub fn pack_uint128(hi: U256, lo: U256) -> Result<[u8; 32], PackError> {
    Ok(pack_u128_pair(to_u128("hi", hi)?, to_u128("lo", lo)?))
}

/// Unpacks two uint128 from a 32-byte slot
pub fn unpack_uint128(buf: &[u8]) -> Result<(u128, u128), PackError> {
    if buf.len() != 32 {
        return Err(PackError::SlotLength { expected: 32, actual: buf.len() });
    }
    let mut hi = [0u8; 16];
    let mut lo = [0u8; 16];
    hi.copy_from_slice(&buf[..16]);
    lo.copy_from_slice(&buf[16..]);
    Ok((u128::from_be_bytes(hi), u128::from_be_bytes(lo)))
}

/// Packs `(verificationGasLimit, callGasLimit)` into `accountGasLimits`
pub fn pack_account_gas_limits(
    verification_gas_limit: U256,
    call_gas_limit: U256,
) -> Result<H256, PackError> {
    Ok(H256(pack_uint128(verification_gas_limit, call_gas_limit)?))
}

/// Packs `(maxPriorityFeePerGas, maxFeePerGas)` into `gasFees`
pub fn pack_gas_fees(
    max_priority_fee_per_gas: U256,
    max_fee_per_gas: U256,
) -> Result<H256, PackError> {
    Ok(H256(pack_uint128(max_priority_fee_per_gas, max_fee_per_gas)?))
}

/// Builds `initCode` as `factory ‖ factoryData`; empty when there is no factory
pub fn pack_factory_data(factory: Address, factory_data: &[u8]) -> Bytes {
    if factory.is_zero() {
        Bytes::default()
    } else {
        [factory.as_bytes(), factory_data].concat().into()
    }
}

/// Splits `initCode` into factory address and factory calldata
pub fn unpack_factory_data(init_code: &[u8]) -> Option<(Address, Bytes)> {
    if init_code.len() < 20 {
        return None;
    }
    Some((Address::from_slice(&init_code[..20]), Bytes::from(init_code[20..].to_vec())))
}

/// How the paymaster charges for the operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymasterMode {
    /// Gas is sponsored
    FreeGas,
    /// Gas is paid in an ERC-20 token at a signed exchange rate
    Token { token: Address, exchange_rate: U256 },
}

impl PaymasterMode {
    /// Mode byte written after the gas limits
    pub fn tag(&self) -> u8 {
        match self {
            PaymasterMode::FreeGas => 0,
            PaymasterMode::Token { .. } => 1,
        }
    }
}

/// Decoded `paymasterAndData`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymasterAndData {
    pub paymaster: Address,
    pub verification_gas_limit: u128,
    pub post_op_gas_limit: u128,
    pub mode: PaymasterMode,
    pub business_id: u64,
    pub sig_time: U256,
    pub signature: Bytes,
}

impl PaymasterAndData {
    /// Free-gas sponsorship with the far-future paymaster signature time
    pub fn free_gas(
        paymaster: Address,
        verification_gas_limit: u128,
        post_op_gas_limit: u128,
        signature: Bytes,
    ) -> Self {
        Self {
            paymaster,
            verification_gas_limit,
            post_op_gas_limit,
            mode: PaymasterMode::FreeGas,
            business_id: 0,
            sig_time: *DEFAULT_SIG_TIME,
            signature,
        }
    }

    /// `paymaster ‖ pmVerificationGas ‖ pmPostOpGas ‖ mode ‖ businessId ‖ sigTime [‖ token ‖ rate] ‖ sig`
    pub fn pack(&self) -> Bytes {
        let mut buf = Vec::with_capacity(93 + self.signature.len());
        buf.extend_from_slice(self.paymaster.as_bytes());
        buf.extend_from_slice(&pack_u128_pair(self.verification_gas_limit, self.post_op_gas_limit));
        buf.push(self.mode.tag());
        buf.extend_from_slice(&self.business_id.to_be_bytes());
        let mut word = [0u8; 32];
        self.sig_time.to_big_endian(&mut word);
        buf.extend_from_slice(&word);
        if let PaymasterMode::Token { token, exchange_rate } = self.mode {
            buf.extend_from_slice(token.as_bytes());
            exchange_rate.to_big_endian(&mut word);
            buf.extend_from_slice(&word);
        }
        buf.extend_from_slice(&self.signature);
        buf.into()
    }

    pub fn unpack(buf: &[u8]) -> Result<Self, PackError> {
        const HEADER: usize = 20 + 32 + 1 + 8 + 32;
        if buf.len() < HEADER {
            return Err(PackError::TooShort { expected: HEADER, actual: buf.len() });
        }
        let paymaster = Address::from_slice(&buf[..20]);
        let (verification_gas_limit, post_op_gas_limit) = unpack_uint128(&buf[20..52])?;
        let mut business_id = [0u8; 8];
        business_id.copy_from_slice(&buf[53..61]);
        let sig_time = U256::from_big_endian(&buf[61..93]);

        let (mode, rest) = match buf[52] {
            0 => (PaymasterMode::FreeGas, &buf[HEADER..]),
            1 => {
                if buf.len() < HEADER + 52 {
                    return Err(PackError::TooShort { expected: HEADER + 52, actual: buf.len() });
                }
                let token = Address::from_slice(&buf[HEADER..HEADER + 20]);
                let exchange_rate = U256::from_big_endian(&buf[HEADER + 20..HEADER + 52]);
                (PaymasterMode::Token { token, exchange_rate }, &buf[HEADER + 52..])
            }
            other => return Err(PackError::UnknownPaymasterMode(other)),
        };

        Ok(Self {
            paymaster,
            verification_gas_limit,
            post_op_gas_limit,
            mode,
            business_id: u64::from_be_bytes(business_id),
            sig_time,
            signature: Bytes::from(rest.to_vec()),
        })
    }
}
