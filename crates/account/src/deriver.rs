use crate::error::{AccountError, Stage, StageExt};
use ethers::types::{Address, Bytes, H256, U256};
use passflow_contracts::{calls, AccountInitializer, AddressComputer, PasskeyHelper};
use passflow_primitives::{
    constants::account::RECOVERY_IDENTIFIER,
    mode::ModuleType,
    packing::pack_factory_data,
    PasskeyPair, Wallet,
};
use std::sync::Arc;
use tracing::debug;

/// Contracts a new account is cloned from and initialized with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountTemplate {
    /// Account implementation the factory clones
    pub implementation: Address,
    pub validator: Address,
    pub recovery_module: Address,
    pub fallback_module: Address,
}

/// Counterfactual account and the init code deploying it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DerivedAccount {
    pub sender: Address,
    pub salt: H256,
    /// `factory ‖ createAccountWithSignature(..)`
    pub init_code: Bytes,
}

/// Derives account addresses and the factory calls that deploy them
pub struct InitCodeDeriver<F, H> {
    factory: Arc<F>,
    helper: Arc<H>,
    template: AccountTemplate,
}

impl<F, H> InitCodeDeriver<F, H>
where
    F: AddressComputer,
    H: PasskeyHelper,
{
    pub fn new(factory: Arc<F>, helper: Arc<H>, template: AccountTemplate) -> Self {
        Self { factory, helper, template }
    }

    pub fn template(&self) -> &AccountTemplate {
        &self.template
    }

    /// Address the factory will deploy for `salt`
    pub async fn compute_address(&self, salt: H256) -> Result<Address, AccountError> {
        self.factory
            .compute_address(self.template.implementation, salt)
            .await
            .stage(Stage::ComputeAddress)
    }

    /// Builds the init code of an account owned by `passkey` and `signer`
    ///
    /// `signer` must hold the factory signer role, its EIP-191 signature over the factory hash
    /// authorizes the deployment until `expire_time`.
    pub async fn derive(
        &self,
        passkey: &PasskeyPair,
        signer: &Wallet,
        salt: H256,
        expire_time: u64,
    ) -> Result<DerivedAccount, AccountError> {
        let sender = self.compute_address(salt).await?;

        let initializer = self
            .helper
            .get_account_initializer(&AccountInitializer {
                pub_key_x: passkey.pub_key_x,
                pub_key_y: passkey.pub_key_y,
                validator: self.template.validator,
                owner: signer.address(),
                sender,
                recovery_install: calls::install_recovery_module(
                    self.template.recovery_module,
                    RECOVERY_IDENTIFIER,
                ),
                fallback_install: calls::install_module(
                    U256::from(ModuleType::Fallback as u64),
                    self.template.fallback_module,
                    Bytes::default(),
                ),
            })
            .await
            .stage(Stage::AccountInitializer)?;

        let factory = self.factory.factory();
        let expire_time = U256::from(expire_time);
        let hash = self
            .helper
            .get_factory_create_account_hash(factory, salt, expire_time, initializer.clone())
            .await
            .stage(Stage::FactoryHash)?;

        let signature = signer
            .sign_hash_message(hash)
            .await
            .map_err(|err| AccountError::at(Stage::FactorySignature, err))?;
        let packed_sig = self
            .helper
            .get_packed_sig(expire_time, signature.to_vec().into())
            .await
            .stage(Stage::PackedFactorySignature)?;

        let call_data = calls::create_account_with_signature(
            self.template.implementation,
            initializer,
            salt,
            packed_sig,
        );
        debug!(?sender, ?salt, "Derived account init code");

        Ok(DerivedAccount { sender, salt, init_code: pack_factory_data(factory, &call_data) })
    }
}
