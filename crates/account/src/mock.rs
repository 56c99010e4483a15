//! In-memory stand-in for the entry point, factory and helper contracts

use crate::{deriver::AccountTemplate, error::Stage};
use async_trait::async_trait;
use ethers::{
    abi::{decode, encode, ParamType, Token},
    types::{Address, Bytes, Signature, H256, U256},
    utils::keccak256,
};
use passflow_contracts::{
    AccountInitializer, AddressComputer, ContractsError, PasskeyHelper, UserOpHasher,
};
use passflow_primitives::{
    predict_deterministic_address, verify_with_public_key, P256Signature, PackedUserOperation,
};

/// Chain id the mock hashes user operations with
pub const MOCK_CHAIN_ID: u64 = 31337;

/// Contract behavior computed locally with optional failure injection
#[derive(Clone, Debug, Default)]
pub struct MockChain {
    fail_at: Option<Stage>,
    failing_nonces: Vec<U256>,
    reject_passkeys: bool,
    recover_to: Option<Address>,
}

/// Fields of the dual-factor blob
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPasskeySignature {
    pub pub_key: (U256, U256),
    pub passkey: P256Signature,
    pub verify_type: u8,
    pub client_json: String,
    pub eoa_sig: Bytes,
    pub validation_data: U256,
}

impl MockChain {
    pub fn entry_point() -> Address {
        Address::repeat_byte(0xe0)
    }

    pub fn template() -> AccountTemplate {
        AccountTemplate {
            implementation: Address::repeat_byte(0xa0),
            validator: Address::repeat_byte(0xa1),
            recovery_module: Address::repeat_byte(0xa2),
            fallback_module: Address::repeat_byte(0xa3),
        }
    }

    /// Every call of `stage` fails
    pub fn fail_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Hashing fails for operations with `nonce`
    pub fn fail_nonce(mut self, nonce: U256) -> Self {
        self.failing_nonces.push(nonce);
        self
    }

    pub fn reject_passkeys(mut self) -> Self {
        self.reject_passkeys = true;
        self
    }

    /// `recoverAddress` answers with `address`
    pub fn recover_to(mut self, address: Address) -> Self {
        self.recover_to = Some(address);
        self
    }

    pub fn factory_hash(&self, salt: H256, expire_time: U256, initializer: &[u8]) -> H256 {
        H256(keccak256(encode(&[
            Token::Address(self.factory()),
            Token::FixedBytes(salt.as_bytes().to_vec()),
            Token::Uint(expire_time),
            Token::Bytes(initializer.to_vec()),
        ])))
    }

    /// `authenticatorData ‖ keccak256(clientDataJSON)`
    pub fn client_message(client_json: &str) -> Bytes {
        let mut message = vec![0u8; 32];
        message.extend_from_slice(&[0x05, 0, 0, 0, 0]);
        message.extend_from_slice(&keccak256(client_json.as_bytes()));
        message.into()
    }

    pub fn decode_signature(blob: &[u8]) -> Option<DecodedPasskeySignature> {
        let outer = decode(
            &[
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Bytes,
                ParamType::Bytes,
                ParamType::Uint(256),
            ],
            blob,
        )
        .ok()?;
        let [Token::Uint(x), Token::Uint(y), Token::Bytes(passkey_sig), Token::Bytes(eoa_sig), Token::Uint(validation_data)] =
            outer.as_slice()
        else {
            return None;
        };

        let inner = decode(
            &[ParamType::Uint(256), ParamType::Uint(256), ParamType::Uint(8), ParamType::String],
            passkey_sig,
        )
        .ok()?;
        let [Token::Uint(r), Token::Uint(s), Token::Uint(verify_type), Token::String(client_json)] =
            inner.as_slice()
        else {
            return None;
        };

        Some(DecodedPasskeySignature {
            pub_key: (*x, *y),
            passkey: P256Signature { r: *r, s: *s },
            verify_type: verify_type.low_u32() as u8,
            client_json: client_json.clone(),
            eoa_sig: eoa_sig.clone().into(),
            validation_data: *validation_data,
        })
    }

    fn check(&self, stage: Stage) -> Result<(), ContractsError> {
        if self.fail_at == Some(stage) {
            return Err(ContractsError::ExecutionReverted(format!("mock failure at {stage}")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserOpHasher for MockChain {
    async fn get_user_op_hash(&self, uo: &PackedUserOperation) -> Result<H256, ContractsError> {
        self.check(Stage::UserOpHash)?;
        if self.failing_nonces.contains(&uo.nonce) {
            return Err(ContractsError::ExecutionReverted(format!("nonce {} rejected", uo.nonce)));
        }
        Ok(uo.hash(&Self::entry_point(), MOCK_CHAIN_ID).into())
    }
}

#[async_trait]
impl AddressComputer for MockChain {
    fn factory(&self) -> Address {
        Address::repeat_byte(0xfa)
    }

    async fn compute_address(
        &self,
        template: Address,
        salt: H256,
    ) -> Result<Address, ContractsError> {
        self.check(Stage::ComputeAddress)?;
        Ok(predict_deterministic_address(&template, salt, &self.factory()))
    }
}

#[async_trait]
impl PasskeyHelper for MockChain {
    async fn get_validation_data(&self, expire_time: u64) -> Result<U256, ContractsError> {
        self.check(Stage::ValidationData)?;
        Ok(U256::from(expire_time) << 160)
    }

    async fn encode_uop_hash(
        &self,
        user_op_hash: H256,
        validation_data: U256,
    ) -> Result<H256, ContractsError> {
        self.check(Stage::EncodeUopHash)?;
        Ok(H256(keccak256(encode(&[
            Token::FixedBytes(user_op_hash.as_bytes().to_vec()),
            Token::Uint(validation_data),
        ]))))
    }

    async fn get_client_json(
        &self,
        pre: &str,
        post: &str,
        uop_hash: H256,
    ) -> Result<(String, Bytes), ContractsError> {
        self.check(Stage::ClientJson)?;
        let client_json = format!("{pre}{}{post}", ethers::utils::hex::encode(uop_hash));
        let message = Self::client_message(&client_json);
        Ok((client_json, message))
    }

    async fn passkey_verify(
        &self,
        _uop_hash: H256,
        signature: P256Signature,
        pub_key: (U256, U256),
        _verify_type: u8,
        client_json: &str,
    ) -> Result<bool, ContractsError> {
        self.check(Stage::PasskeyVerification)?;
        if self.reject_passkeys || !signature.is_low_s() {
            return Ok(false);
        }
        Ok(verify_with_public_key(pub_key, &Self::client_message(client_json), &signature))
    }

    async fn encode_passkey_sig(
        &self,
        signature: P256Signature,
        verify_type: u8,
        client_json: &str,
    ) -> Result<Bytes, ContractsError> {
        self.check(Stage::PasskeyEncoding)?;
        Ok(encode(&[
            Token::Uint(signature.r),
            Token::Uint(signature.s),
            Token::Uint(verify_type.into()),
            Token::String(client_json.into()),
        ])
        .into())
    }

    async fn get_signature(
        &self,
        pub_key: (U256, U256),
        passkey_sig: Bytes,
        eoa_sig: Bytes,
        validation_data: U256,
    ) -> Result<Bytes, ContractsError> {
        self.check(Stage::FinalEncoding)?;
        Ok(encode(&[
            Token::Uint(pub_key.0),
            Token::Uint(pub_key.1),
            Token::Bytes(passkey_sig.to_vec()),
            Token::Bytes(eoa_sig.to_vec()),
            Token::Uint(validation_data),
        ])
        .into())
    }

    async fn recover_address(
        &self,
        signature: Bytes,
        hash: H256,
    ) -> Result<Address, ContractsError> {
        self.check(Stage::EoaRecovery)?;
        if let Some(address) = self.recover_to {
            return Ok(address);
        }
        Signature::try_from(signature.as_ref())
            .and_then(|sig| sig.recover(hash.as_bytes()))
            .map_err(|err| ContractsError::ExecutionReverted(err.to_string()))
    }

    async fn get_uop_hash(
        &self,
        entry_point: Address,
        uo: &PackedUserOperation,
    ) -> Result<H256, ContractsError> {
        self.check(Stage::ValidatorHash)?;
        Ok(H256(keccak256(
            [uo.pack().to_vec(), entry_point.as_bytes().to_vec()].concat(),
        )))
    }

    async fn get_account_initializer(
        &self,
        initializer: &AccountInitializer,
    ) -> Result<Bytes, ContractsError> {
        self.check(Stage::AccountInitializer)?;
        Ok(encode(&[
            Token::Uint(initializer.pub_key_x),
            Token::Uint(initializer.pub_key_y),
            Token::Address(initializer.validator),
            Token::Address(initializer.owner),
            Token::Address(initializer.sender),
            Token::Bytes(initializer.recovery_install.to_vec()),
            Token::Bytes(initializer.fallback_install.to_vec()),
        ])
        .into())
    }

    async fn get_factory_create_account_hash(
        &self,
        factory: Address,
        salt: H256,
        expire_time: U256,
        initializer: Bytes,
    ) -> Result<H256, ContractsError> {
        self.check(Stage::FactoryHash)?;
        if factory != self.factory() {
            return Err(ContractsError::ExecutionReverted("unknown factory".into()));
        }
        Ok(self.factory_hash(salt, expire_time, &initializer))
    }

    async fn get_packed_sig(
        &self,
        expire_time: U256,
        signature: Bytes,
    ) -> Result<Bytes, ContractsError> {
        self.check(Stage::PackedFactorySignature)?;
        let mut packed = [0u8; 32];
        expire_time.to_big_endian(&mut packed);
        Ok([&packed[..], signature.as_ref()].concat().into())
    }
}
