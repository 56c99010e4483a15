//! Signature schemes of the passkey account validator
//!
//! Typed data and personal-sign produce `sigType ‖ sigTime ‖ ecdsa`. The passkey scheme needs an
//! EOA signature and a P-256 signature over the same validator hash, combined by the helper
//! contract into the blob the validator decodes.

use crate::error::{AccountError, Stage, StageExt};
use ethers::types::{Address, Bytes, Signature, H256, U256};
use passflow_contracts::{PasskeyHelper, UserOpHasher};
use passflow_primitives::{
    constants::{
        passkey::{CLIENT_DATA_POST, CLIENT_DATA_PRE},
        signature::{SIG_TYPE_PERSONAL_SIGN, VALIDATION_WINDOW_SECS},
    },
    sig_time, PackedUserOperation, PasskeyPair, TypedDataDomain, UopSignature, Wallet,
};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::trace;

/// Validation scheme and its parameters
#[derive(Clone, Debug)]
pub enum SignatureScheme {
    TypedData { domain: TypedDataDomain, sig_time: U256 },
    PersonalSign { sig_time: U256 },
    Passkey { passkey: PasskeyPair, verify_type: u8 },
}

impl SignatureScheme {
    /// Typed data over the default domain, `expiry` of `None` never expires
    pub fn typed_data(expiry: Option<u64>) -> Self {
        Self::TypedData { domain: TypedDataDomain::default(), sig_time: sig_time(expiry, false) }
    }

    /// Typed data for the older account layout bound to `verifying_contract`
    pub fn legacy_typed_data(verifying_contract: Address, expiry: Option<u64>) -> Self {
        Self::TypedData {
            domain: TypedDataDomain::legacy(verifying_contract),
            sig_time: sig_time(expiry, true),
        }
    }

    pub fn personal_sign(expiry: Option<u64>) -> Self {
        Self::PersonalSign { sig_time: sig_time(expiry, false) }
    }

    pub fn passkey(passkey: PasskeyPair) -> Self {
        Self::Passkey { passkey, verify_type: 0 }
    }
}

/// Signs user operations against one entry point and chain
pub struct UopSigner<E, H> {
    entry_point: Address,
    chain_id: u64,
    hasher: Arc<E>,
    helper: Arc<H>,
    recover_on_chain: bool,
}

impl<E, H> UopSigner<E, H>
where
    E: UserOpHasher,
    H: PasskeyHelper,
{
    /// `chain_id` must come from the connected network
    pub fn new(entry_point: Address, chain_id: u64, hasher: Arc<E>, helper: Arc<H>) -> Self {
        Self { entry_point, chain_id, hasher, helper, recover_on_chain: false }
    }

    /// Also asks the helper contract to recover the EOA factor
    pub fn recover_on_chain(mut self, enabled: bool) -> Self {
        self.recover_on_chain = enabled;
        self
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub async fn sign(
        &self,
        uo: &PackedUserOperation,
        wallet: &Wallet,
        scheme: &SignatureScheme,
    ) -> Result<UopSignature, AccountError> {
        match scheme {
            SignatureScheme::TypedData { domain, sig_time } => {
                self.sign_typed_data(uo, wallet, domain, *sig_time)
            }
            SignatureScheme::PersonalSign { sig_time } => {
                self.sign_personal(uo, wallet, *sig_time).await
            }
            SignatureScheme::Passkey { passkey, verify_type } => {
                self.sign_passkey(uo, wallet, passkey, *verify_type).await
            }
        }
    }

    pub fn sign_typed_data(
        &self,
        uo: &PackedUserOperation,
        wallet: &Wallet,
        domain: &TypedDataDomain,
        sig_time: U256,
    ) -> Result<UopSignature, AccountError> {
        let digest = domain.digest(uo, &self.entry_point, sig_time, self.chain_id);
        let signature = wallet
            .sign_digest(digest)
            .map_err(|err| AccountError::at(Stage::EoaSignature, err))?;
        Ok(UopSignature::typed_data(sig_time, signature.to_vec().into())?)
    }

    /// EIP-191 signature over the validator hash of the operation carrying the prefix
    pub async fn sign_personal(
        &self,
        uo: &PackedUserOperation,
        wallet: &Wallet,
        sig_time: U256,
    ) -> Result<UopSignature, AccountError> {
        let prefixed = uo.clone().signature(UopSignature::prefix(SIG_TYPE_PERSONAL_SIGN, sig_time));
        let hash = self
            .helper
            .get_uop_hash(self.entry_point, &prefixed)
            .await
            .stage(Stage::ValidatorHash)?;
        let signature = self.sign_eoa(wallet, hash).await?;
        Ok(UopSignature::personal_sign(sig_time, signature.to_vec().into())?)
    }

    /// Dual-factor passkey signature
    pub async fn sign_passkey(
        &self,
        uo: &PackedUserOperation,
        wallet: &Wallet,
        passkey: &PasskeyPair,
        verify_type: u8,
    ) -> Result<UopSignature, AccountError> {
        let user_op_hash = self.hasher.get_user_op_hash(uo).await.stage(Stage::UserOpHash)?;

        let expire_time = unix_now() + VALIDATION_WINDOW_SECS;
        let validation_data = self
            .helper
            .get_validation_data(expire_time)
            .await
            .stage(Stage::ValidationData)?;
        let uop_hash = self
            .helper
            .encode_uop_hash(user_op_hash, validation_data)
            .await
            .stage(Stage::EncodeUopHash)?;

        let eoa_sig: Bytes = self.sign_eoa(wallet, uop_hash).await?.to_vec().into();

        let (client_json, message) = self
            .helper
            .get_client_json(CLIENT_DATA_PRE, CLIENT_DATA_POST, uop_hash)
            .await
            .stage(Stage::ClientJson)?;

        let passkey_sig = passkey.sign(&message)?;
        let pub_key = (passkey.pub_key_x, passkey.pub_key_y);

        let verified = self
            .helper
            .passkey_verify(uop_hash, passkey_sig, pub_key, verify_type, &client_json)
            .await
            .stage(Stage::PasskeyVerification)?;
        if !verified {
            return Err(AccountError::PasskeyRejected);
        }

        let encoded = self
            .helper
            .encode_passkey_sig(passkey_sig, verify_type, &client_json)
            .await
            .stage(Stage::PasskeyEncoding)?;
        let blob = self
            .helper
            .get_signature(pub_key, encoded, eoa_sig, validation_data)
            .await
            .stage(Stage::FinalEncoding)?;

        trace!(sender = ?uo.sender, nonce = ?uo.nonce, ?uop_hash, "Signed user operation with passkey");
        Ok(UopSignature::passkey_dual(blob)?)
    }

    /// EIP-191 signature over `hash` that is checked to recover to `wallet`
    async fn sign_eoa(&self, wallet: &Wallet, hash: H256) -> Result<Signature, AccountError> {
        let signature = wallet
            .sign_hash_message(hash)
            .await
            .map_err(|err| AccountError::at(Stage::EoaSignature, err))?;

        let recovered = signature
            .recover(hash.as_bytes())
            .map_err(|err| AccountError::at(Stage::EoaRecovery, err))?;
        if recovered != wallet.address() {
            return Err(AccountError::SignerMismatch { expected: wallet.address(), recovered });
        }

        if self.recover_on_chain {
            let recovered = self
                .helper
                .recover_address(signature.to_vec().into(), hash)
                .await
                .stage(Stage::EoaRecovery)?;
            if recovered != wallet.address() {
                return Err(AccountError::SignerMismatch { expected: wallet.address(), recovered });
            }
        }
        Ok(signature)
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}
