//! Scheme-tagged user operation signatures
//!
//! The account validator dispatches on the first byte of `UserOperation.signature`:
//!
//! * `0x00 ‖ sigTime(32) ‖ ecdsa(65)`: EIP-712 typed data signature
//! * `0x01 ‖ sigTime(32) ‖ ecdsa(65)`: EIP-191 signature over the validator's user op hash
//! * anything else: the dual-factor passkey blob produced by the helper contract

use crate::{
    constants::signature::{
        DOMAIN_NAME, DOMAIN_VERSION, ECDSA_LENGTH, LEGACY_SIG_TIME_SHIFT, MAX_SIG_TIME,
        PREFIX_LENGTH, SIG_TYPE_PERSONAL_SIGN, SIG_TYPE_TYPED_DATA,
    },
    user_operation::PackedUserOperation,
};
use ethers::{
    abi::{encode, Token},
    types::{transaction::eip712::EIP712Domain, Address, Bytes, H256, U256},
    utils::keccak256,
};
use std::ops::Deref;
use thiserror::Error;

/// Errors of signature encoding and decoding
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is empty")]
    Empty,

    #[error("ECDSA signature must be 65 bytes, got {0}")]
    EcdsaLength(usize),
}

/// Signature time carried in the prefix of ECDSA schemes
///
/// `None` selects the far-future sentinel `2^48 - 1`. The legacy layout multiplies by `2^160` so
/// the timestamp lands where the older `validUntil ‖ validAfter` packing expected it.
pub fn sig_time(expiry: Option<u64>, legacy: bool) -> U256 {
    let sig_time = match expiry {
        Some(expiry) if expiry != 0 => U256::from(expiry),
        _ => *MAX_SIG_TIME,
    };
    if legacy {
        sig_time * *LEGACY_SIG_TIME_SHIFT
    } else {
        sig_time
    }
}

/// Signature of a user operation, tagged by validation scheme
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UopSignature {
    /// EIP-712 signature over the `SignMessage` struct
    TypedData { sig_time: U256, signature: Bytes },
    /// EIP-191 signature over the validator's user op hash
    PersonalSign { sig_time: U256, signature: Bytes },
    /// ABI blob combining passkey and EOA factors
    PasskeyDual(Bytes),
}

impl UopSignature {
    pub fn typed_data(sig_time: U256, signature: Bytes) -> Result<Self, SignatureError> {
        check_ecdsa(&signature)?;
        Ok(Self::TypedData { sig_time, signature })
    }

    pub fn personal_sign(sig_time: U256, signature: Bytes) -> Result<Self, SignatureError> {
        check_ecdsa(&signature)?;
        Ok(Self::PersonalSign { sig_time, signature })
    }

    pub fn passkey_dual(blob: Bytes) -> Result<Self, SignatureError> {
        if blob.is_empty() {
            return Err(SignatureError::Empty);
        }
        Ok(Self::PasskeyDual(blob))
    }

    /// `sigType(1) ‖ sigTime(32)` that precedes ECDSA signatures
    pub fn prefix(sig_type: u8, sig_time: U256) -> Bytes {
        let mut buf = Vec::with_capacity(PREFIX_LENGTH);
        buf.push(sig_type);
        let mut word = [0u8; 32];
        sig_time.to_big_endian(&mut word);
        buf.extend_from_slice(&word);
        buf.into()
    }

    /// Scheme tag, `None` for the passkey blob
    pub fn sig_type(&self) -> Option<u8> {
        match self {
            Self::TypedData { .. } => Some(SIG_TYPE_TYPED_DATA),
            Self::PersonalSign { .. } => Some(SIG_TYPE_PERSONAL_SIGN),
            Self::PasskeyDual(_) => None,
        }
    }

    /// Bytes placed into `UserOperation.signature`
    pub fn encode(&self) -> Bytes {
        match self {
            Self::TypedData { sig_time, signature } |
            Self::PersonalSign { sig_time, signature } => {
                let sig_type = self.sig_type().unwrap_or_default();
                [Self::prefix(sig_type, *sig_time).deref(), signature.deref()].concat().into()
            }
            Self::PasskeyDual(blob) => blob.clone(),
        }
    }

    /// Reads the scheme from the front byte
    ///
    /// Only a 98-byte value starting with `0x00` or `0x01` is an ECDSA scheme, everything else is
    /// treated as a passkey blob.
    pub fn decode(buf: &[u8]) -> Result<Self, SignatureError> {
        if buf.is_empty() {
            return Err(SignatureError::Empty);
        }
        if buf.len() == PREFIX_LENGTH + ECDSA_LENGTH {
            let sig_time = U256::from_big_endian(&buf[1..PREFIX_LENGTH]);
            let signature = Bytes::from(buf[PREFIX_LENGTH..].to_vec());
            match buf[0] {
                SIG_TYPE_TYPED_DATA => return Ok(Self::TypedData { sig_time, signature }),
                SIG_TYPE_PERSONAL_SIGN => return Ok(Self::PersonalSign { sig_time, signature }),
                _ => {}
            }
        }
        Ok(Self::PasskeyDual(buf.to_vec().into()))
    }
}

impl From<UopSignature> for Bytes {
    fn from(value: UopSignature) -> Self {
        value.encode()
    }
}

fn check_ecdsa(signature: &[u8]) -> Result<(), SignatureError> {
    if signature.len() != ECDSA_LENGTH {
        return Err(SignatureError::EcdsaLength(signature.len()));
    }
    Ok(())
}

/// Typed data domain of the account's `SignMessage` struct
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    pub verifying_contract: Option<Address>,
    /// Older accounts typed the two packed gas slots as `uint256`
    pub legacy_gas_types: bool,
}

impl Default for TypedDataDomain {
    fn default() -> Self {
        Self {
            name: DOMAIN_NAME.into(),
            version: DOMAIN_VERSION.into(),
            verifying_contract: None,
            legacy_gas_types: false,
        }
    }
}

impl TypedDataDomain {
    /// `SmartAccount`/`3.0.2` domain bound to the account contract
    pub fn legacy(verifying_contract: Address) -> Self {
        Self {
            name: "SmartAccount".into(),
            version: "3.0.2".into(),
            verifying_contract: Some(verifying_contract),
            legacy_gas_types: true,
        }
    }

    pub fn separator(&self, chain_id: u64) -> [u8; 32] {
        EIP712Domain {
            name: Some(self.name.clone()),
            version: Some(self.version.clone()),
            chain_id: Some(chain_id.into()),
            verifying_contract: self.verifying_contract,
            salt: None,
        }
        .separator()
    }

    fn type_hash(&self) -> [u8; 32] {
        let gas = if self.legacy_gas_types { "uint256" } else { "bytes32" };
        keccak256(format!(
            "SignMessage(address sender,uint256 nonce,bytes initCode,bytes callData,\
             {gas} accountGasLimits,uint256 preVerificationGas,{gas} gasFees,\
             bytes paymasterAndData,address EntryPoint,uint256 sigTime)"
        ))
    }

    /// Digest signed by the typed data scheme
    pub fn digest(
        &self,
        uo: &PackedUserOperation,
        entry_point: &Address,
        sig_time: U256,
        chain_id: u64,
    ) -> H256 {
        let struct_hash = keccak256(encode(&[
            Token::FixedBytes(self.type_hash().to_vec()),
            Token::Address(uo.sender),
            Token::Uint(uo.nonce),
            Token::FixedBytes(keccak256(uo.init_code.deref()).to_vec()),
            Token::FixedBytes(keccak256(uo.call_data.deref()).to_vec()),
            Token::FixedBytes(uo.account_gas_limits.as_bytes().to_vec()),
            Token::Uint(uo.pre_verification_gas),
            Token::FixedBytes(uo.gas_fees.as_bytes().to_vec()),
            Token::FixedBytes(keccak256(uo.paymaster_and_data.deref()).to_vec()),
            Token::Address(*entry_point),
            Token::Uint(sig_time),
        ]));
        let digest_input = [&[0x19, 0x01][..], &self.separator(chain_id)[..], &struct_hash[..]].concat();
        H256(keccak256(digest_input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PackedUserOperation {
        PackedUserOperation::with_defaults(
            "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap(),
            PackedUserOperation::default_gas_price(),
        )
        .unwrap()
        .nonce(1.into())
        .call_data("0x12345678".parse().unwrap())
    }

    fn entry_point() -> Address {
        "0x0000000071727De22E5E9d8BAf0edAc6f37da032".parse().unwrap()
    }

    #[test]
    fn sig_time_defaults() {
        assert_eq!(sig_time(None, false), U256::from(281_474_976_710_655u64));
        assert_eq!(sig_time(Some(0), false), U256::from(281_474_976_710_655u64));
        assert_eq!(sig_time(Some(1_700_000_000), false), U256::from(1_700_000_000u64));
        assert_eq!(
            sig_time(None, true),
            U256::from_big_endian(
                &ethers::utils::hex::decode(
                    "000000000000ffffffffffff0000000000000000000000000000000000000000"
                )
                .unwrap()
            )
        );
    }

    #[test]
    fn ecdsa_schemes_round_trip() {
        let sig: Bytes = vec![0x1b; 65].into();
        let typed = UopSignature::typed_data(*MAX_SIG_TIME, sig.clone()).unwrap();
        let encoded = typed.encode();
        assert_eq!(encoded.len(), 98);
        assert_eq!(encoded[0], 0);
        assert_eq!(&encoded[27..33], &[0xff; 6]);
        assert_eq!(UopSignature::decode(&encoded).unwrap(), typed);

        let personal = UopSignature::personal_sign(7.into(), sig).unwrap();
        let encoded = personal.encode();
        assert_eq!(encoded[0], 1);
        assert_eq!(encoded[32], 7);
        assert_eq!(UopSignature::decode(&encoded).unwrap(), personal);
    }

    #[test]
    fn other_shapes_decode_as_passkey() {
        // a 98-byte value with an unknown tag
        let mut buf = vec![0u8; 98];
        buf[0] = 2;
        assert!(matches!(UopSignature::decode(&buf), Ok(UopSignature::PasskeyDual(_))));
        // an ABI blob
        let blob = vec![0u8; 416];
        assert_eq!(UopSignature::decode(&blob).unwrap(), UopSignature::PasskeyDual(blob.into()));
        assert_eq!(UopSignature::decode(&[]), Err(SignatureError::Empty));
    }

    #[test]
    fn ecdsa_length_checked() {
        assert_eq!(
            UopSignature::typed_data(U256::zero(), vec![0u8; 64].into()),
            Err(SignatureError::EcdsaLength(64))
        );
        assert_eq!(UopSignature::passkey_dual(Bytes::default()), Err(SignatureError::Empty));
    }

    #[test]
    fn typed_data_digest() {
        let domain = TypedDataDomain::default();
        assert_eq!(
            H256(domain.separator(31337)),
            "0x88de26e1344eb12ccb9d8f2aa0fa51c249f46fb4dd867b0fbff2932a0ccb7e95"
                .parse::<H256>()
                .unwrap()
        );
        assert_eq!(
            domain.digest(&sample(), &entry_point(), *MAX_SIG_TIME, 31337),
            "0x2d5a75ad49cea4cbfd1ef296a928946afc8a015e8c5df6a93739614cf5707a79"
                .parse::<H256>()
                .unwrap()
        );
    }

    #[test]
    fn typed_data_digest_legacy_domain() {
        let domain = TypedDataDomain::legacy(Address::repeat_byte(0x11));
        assert_eq!(
            domain.digest(&sample(), &entry_point(), *MAX_SIG_TIME, 137),
            "0xa88e3a38b4c8e294330d3e6d9ed4a6c7e7e6ed5d66433f3cb580fc8a1c08b7a1"
                .parse::<H256>()
                .unwrap()
        );
    }
}
