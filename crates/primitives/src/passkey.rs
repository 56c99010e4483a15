//! P-256 passkey keys and ECDSA signatures
//!
//! The WebAuthn validator checks a secp256r1 signature over `sha256(authenticatorData ‖
//! sha256(clientDataJSON))`. The message bytes are produced on-chain by the helper contract, so
//! this module only signs opaque messages, decodes the DER envelope and canonicalizes `s`.

use crate::constants::passkey::{CURVE_ORDER, DEVELOPMENT_PRIVATE_KEY};
use ethers::{
    prelude::rand,
    types::{Bytes, H256, U256},
    utils::hex,
};
use lazy_static::lazy_static;
use p256::{
    ecdsa::{
        signature::{Signer, Verifier},
        Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
    EncodedPoint, FieldBytes,
};
use std::fmt;
use thiserror::Error;

lazy_static! {
    /// Order of the P-256 group
    pub static ref P256_ORDER: U256 = U256::from_big_endian(&CURVE_ORDER);
    static ref HALF_ORDER: U256 = *P256_ORDER / 2;
}

/// Errors of passkey key handling and signature decoding
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasskeyError {
    /// Private key is zero, out of range or not 32 bytes
    #[error("invalid P-256 private key")]
    InvalidKey,

    /// DER envelope could not be decoded
    #[error("malformed DER signature: {0}")]
    Der(String),

    /// r or s is zero or not below the curve order
    #[error("{0} is not in [1, n)")]
    ScalarRange(&'static str),
}

/// Decoded P-256 signature
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct P256Signature {
    pub r: U256,
    pub s: U256,
}

impl P256Signature {
    /// Same signature with `s` moved to the lower half of the curve order
    pub fn normalized(self) -> Self {
        Self { r: self.r, s: normalize_s(self.s) }
    }

    pub fn is_low_s(&self) -> bool {
        self.s <= *HALF_ORDER
    }

    fn to_signature(self) -> Result<Signature, PasskeyError> {
        let scalar = |name: &'static str, value: U256| {
            if value.is_zero() || value >= *P256_ORDER {
                return Err(PasskeyError::ScalarRange(name));
            }
            let mut buf = [0u8; 32];
            value.to_big_endian(&mut buf);
            Ok(FieldBytes::clone_from_slice(&buf))
        };
        Signature::from_scalars(scalar("r", self.r)?, scalar("s", self.s)?)
            .map_err(|_| PasskeyError::ScalarRange("r or s"))
    }
}

/// Replaces `s` with `n - s` when `s > n / 2`
pub fn normalize_s(s: U256) -> U256 {
    if s > *HALF_ORDER {
        *P256_ORDER - s
    } else {
        s
    }
}

/// Extracts `(r, s)` from a DER encoded ECDSA signature
///
/// Field boundaries come from the DER length bytes, so integers shorter than 32 bytes or carrying
/// a leading zero for a set high bit are decoded correctly.
pub fn parse_der(der: &[u8]) -> Result<P256Signature, PasskeyError> {
    let signature = Signature::from_der(der).map_err(|err| PasskeyError::Der(err.to_string()))?;
    let (r, s) = signature.split_bytes();
    Ok(P256Signature { r: U256::from_big_endian(&r), s: U256::from_big_endian(&s) })
}

/// Checks `(r, s)` over `sha256(message)` against the affine public key `(x, y)`
pub fn verify_with_public_key(
    pub_key: (U256, U256),
    message: &[u8],
    signature: &P256Signature,
) -> bool {
    let coordinate = |value: U256| {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        FieldBytes::clone_from_slice(&buf)
    };
    let point = EncodedPoint::from_affine_coordinates(
        &coordinate(pub_key.0),
        &coordinate(pub_key.1),
        false,
    );
    let Ok(key) = VerifyingKey::from_encoded_point(&point) else {
        return false;
    };
    signature.to_signature().map(|sig| key.verify(message, &sig).is_ok()).unwrap_or(false)
}

/// P-256 key pair owning a smart account
#[derive(Clone)]
pub struct PasskeyPair {
    signing_key: SigningKey,
    /// Affine X coordinate of the public key
    pub pub_key_x: U256,
    /// Affine Y coordinate of the public key
    pub pub_key_y: U256,
}

impl PasskeyPair {
    fn from_signing_key(signing_key: SigningKey) -> Self {
        let point = signing_key.verifying_key().as_affine().to_encoded_point(false);
        let coordinate = |c: Option<&FieldBytes>| c.map(|b| U256::from_big_endian(b));
        Self {
            pub_key_x: coordinate(point.x()).unwrap_or_default(),
            pub_key_y: coordinate(point.y()).unwrap_or_default(),
            signing_key,
        }
    }

    /// Key pair from a 32-byte big-endian scalar
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, PasskeyError> {
        let signing_key =
            SigningKey::from_slice(private_key).map_err(|_| PasskeyError::InvalidKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Key pair from a hex string, with or without `0x`
    pub fn from_hex(private_key: &str) -> Result<Self, PasskeyError> {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|_| PasskeyError::InvalidKey)?;
        Self::from_private_key(&bytes)
    }

    /// Fresh random key pair
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Fixed key the development account templates are deployed with
    pub fn development() -> Result<Self, PasskeyError> {
        Self::from_hex(DEVELOPMENT_PRIVATE_KEY)
    }

    pub fn private_key(&self) -> H256 {
        H256::from_slice(&self.signing_key.to_bytes())
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs `sha256(message)` and returns the DER encoded signature
    pub fn sign_der(&self, message: &[u8]) -> Bytes {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_der().as_bytes().to_vec().into()
    }

    /// Signs `sha256(message)` and returns the decoded, low-S signature
    pub fn sign(&self, message: &[u8]) -> Result<P256Signature, PasskeyError> {
        Ok(parse_der(&self.sign_der(message))?.normalized())
    }

    /// Checks `(r, s)` over `sha256(message)` against this public key
    pub fn verify(&self, message: &[u8], signature: &P256Signature) -> bool {
        signature
            .to_signature()
            .map(|sig| self.verifying_key().verify(message, &sig).is_ok())
            .unwrap_or(false)
    }
}

impl fmt::Debug for PasskeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasskeyPair")
            .field("pub_key_x", &self.pub_key_x)
            .field("pub_key_y", &self.pub_key_y)
            .finish_non_exhaustive()
    }
}

impl PartialEq for PasskeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.pub_key_x == other.pub_key_x && self.pub_key_y == other.pub_key_y
    }
}

impl Eq for PasskeyPair {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_key_coordinates() {
        let pair = PasskeyPair::development().unwrap();
        assert_eq!(
            pair.pub_key_x,
            U256::from_str_radix(
                "640c5cacef387563d0b105c7724c45ee19f8a952cb583de494a6a7ce5ed16760",
                16
            )
            .unwrap()
        );
        assert_eq!(
            pair.pub_key_y,
            U256::from_str_radix(
                "142b33cbf8255e9f0628ab9e250e179a3e7e8e24e0a2a4340f0b9fdeb29a1b48",
                16
            )
            .unwrap()
        );
        assert_eq!(hex::encode(pair.private_key()), DEVELOPMENT_PRIVATE_KEY);
    }

    #[test]
    fn invalid_private_keys() {
        assert_eq!(PasskeyPair::from_private_key(&[0u8; 32]), Err(PasskeyError::InvalidKey));
        assert_eq!(PasskeyPair::from_private_key(&CURVE_ORDER), Err(PasskeyError::InvalidKey));
        assert_eq!(PasskeyPair::from_private_key(&[1u8; 33]), Err(PasskeyError::InvalidKey));
        assert_eq!(PasskeyPair::from_hex("0xzz"), Err(PasskeyError::InvalidKey));
    }

    #[test]
    fn low_s_normalization_keeps_validity() {
        let pair = PasskeyPair::random();
        for i in 0u8..16 {
            let message = [i; 37];
            let parsed = parse_der(&pair.sign_der(&message)).unwrap();
            let high = P256Signature {
                r: parsed.r,
                s: if parsed.is_low_s() { *P256_ORDER - parsed.s } else { parsed.s },
            };
            assert!(!high.is_low_s());

            let low = high.normalized();
            assert!(low.is_low_s());
            assert_eq!(low.s, *P256_ORDER - high.s);
            assert!(pair.verify(&message, &high));
            assert!(pair.verify(&message, &low));
            // normalizing twice is a no-op
            assert_eq!(low.normalized(), low);
        }
    }

    #[test]
    fn sign_produces_low_s() {
        let pair = PasskeyPair::development().unwrap();
        let signature = pair.sign(b"client data").unwrap();
        assert!(signature.is_low_s());
        assert!(pair.verify(b"client data", &signature));
        assert!(!pair.verify(b"other data", &signature));
    }

    #[test]
    fn parse_der_with_padded_and_short_integers() {
        // r has its high bit set and needs a leading zero, s is only 31 bytes long
        let mut r = [0x11u8; 32];
        r[0] = 0x80;
        let s = [0x7fu8; 31];

        let mut der = vec![0x30, 0x44, 0x02, 0x21, 0x00];
        der.extend_from_slice(&r);
        der.extend_from_slice(&[0x02, 0x1f]);
        der.extend_from_slice(&s);

        let parsed = parse_der(&der).unwrap();
        assert_eq!(parsed.r, U256::from_big_endian(&r));
        assert_eq!(parsed.s, U256::from_big_endian(&s));
    }

    #[test]
    fn verify_against_coordinates() {
        let pair = PasskeyPair::random();
        let signature = pair.sign(b"challenge").unwrap();
        let pub_key = (pair.pub_key_x, pair.pub_key_y);
        assert!(verify_with_public_key(pub_key, b"challenge", &signature));
        assert!(!verify_with_public_key(pub_key, b"other", &signature));
        // not a point on the curve
        assert!(!verify_with_public_key((1.into(), 1.into()), b"challenge", &signature));
    }

    #[test]
    fn parse_der_rejects_garbage() {
        assert!(matches!(parse_der(&[0x30, 0x02, 0x02]), Err(PasskeyError::Der(_))));
        assert!(matches!(parse_der(&[0u8; 64]), Err(PasskeyError::Der(_))));
    }

    #[test]
    fn verify_rejects_out_of_range_scalars() {
        let pair = PasskeyPair::development().unwrap();
        let zero = P256Signature { r: U256::zero(), s: 1.into() };
        assert!(!pair.verify(b"m", &zero));
        let wide = P256Signature { r: 1.into(), s: *P256_ORDER };
        assert!(!pair.verify(b"m", &wide));
    }
}
