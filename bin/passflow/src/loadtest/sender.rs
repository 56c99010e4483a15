//! Payment batches against a live deployment
//!
//! Every batch deploys a fresh account: the init code is derived for a random salt, test tokens
//! are minted to the counterfactual sender and the operations approve the pay contract and send
//! it a one token cheque.

use super::runner::BatchSender;
use crate::{
    deployment::Deployment,
    utils::{format_ether, transfer},
};
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, H256, U256},
};
use expanded_pathbuf::ExpandedPathBuf;
use passflow_account::{
    AccountTemplate, InitCodeDeriver, OperationRequest, SignatureScheme, UopSigner,
    UserOperationBuilder,
};
use passflow_contracts::{calls, AccountFactory, Cheque, EntryPoint, Helper};
use passflow_primitives::{
    batch_mode,
    constants::{
        account::FACTORY_EXPIRE_TIME,
        load_test::{BATCH_START_NONCE, MINT_AMOUNT},
    },
    random_salt, Execution, PasskeyPair, Wallet,
};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    sync::Arc,
};
use tracing::{debug, error, info};

/// `execute(batch, [approve(pay, MAX), pay.send(cheque)])`
pub fn payment_call_data(token: Address, pay: Address) -> eyre::Result<Bytes> {
    let cheque = Cheque::single(token, U256::one(), FACTORY_EXPIRE_TIME)?;
    Ok(calls::execute(
        batch_mode(),
        &[
            Execution::new(token, U256::zero(), calls::approve(pay, U256::MAX)),
            Execution::new(pay, U256::zero(), calls::pay_send(cheque)),
        ],
    ))
}

/// Append-only `sender,callData` lines
#[derive(Clone, Debug)]
pub struct CallDataLog {
    path: ExpandedPathBuf,
}

impl CallDataLog {
    pub fn new(path: ExpandedPathBuf) -> Self {
        Self { path }
    }

    pub fn clear(&self) -> eyre::Result<()> {
        fs::write(self.path.to_path_buf(), "")?;
        Ok(())
    }

    pub fn append(&self, sender: Address, call_data: &Bytes) -> eyre::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(self.path.to_path_buf())?;
        file.write_all(format!("{sender:?},{call_data}\n").as_bytes())?;
        Ok(())
    }
}

/// Batch parameters that do not depend on the deployment
#[derive(Clone, Debug)]
pub struct PaymentOptions {
    pub passkey: PasskeyPair,
    /// Wei the account and its entry point deposit are topped up to before submission
    pub min_balance: U256,
    pub fee_per_gas: U256,
    pub calldata_log: Option<CallDataLog>,
}

/// Sends payment batches from freshly derived passkey accounts
pub struct PaymentBatchSender<M: Middleware + 'static> {
    deployment: Arc<Deployment<M>>,
    deriver: InitCodeDeriver<AccountFactory<M>, Helper<M>>,
    builder: UserOperationBuilder<M, EntryPoint<M>, Helper<M>>,
    scheme: SignatureScheme,
    options: PaymentOptions,
}

impl<M: Middleware + 'static> PaymentBatchSender<M> {
    pub fn new(deployment: Arc<Deployment<M>>, options: PaymentOptions) -> Self {
        let signer = UopSigner::new(
            deployment.addresses.entry_point,
            deployment.chain_id,
            deployment.entry_point.clone(),
            deployment.helper.clone(),
        );
        Self {
            deriver: deployment.deriver(),
            builder: UserOperationBuilder::new(
                deployment.eth_client.clone(),
                signer,
                options.fee_per_gas,
            ),
            scheme: SignatureScheme::passkey(options.passkey.clone()),
            deployment,
            options,
        }
    }

    pub fn template(&self) -> &AccountTemplate {
        self.deriver.template()
    }

    /// Tops the account and its entry point deposit up to the minimum balance
    async fn fund_account(&self, signer: &Wallet, account: Address) -> eyre::Result<()> {
        let min_balance = self.options.min_balance;

        let balance = self.deployment.eth_client.get_balance(account, None).await?;
        debug!(?account, balance = %format_ether(balance), "Smart account balance");
        if balance < min_balance {
            let signer_client = self.deployment.signer_client(signer);
            let receipt = transfer(signer_client.as_ref(), account, min_balance).await?;
            debug!(?account, tx_hash = ?receipt.transaction_hash, "Funded smart account");
        }

        let deposit = self.deployment.entry_point.balance_of(&account).await?;
        debug!(?account, deposit = %format_ether(deposit), "Entry point deposit");
        if deposit < min_balance {
            let receipt = self.deployment.deposits().deposit_to(&account, min_balance).await?;
            debug!(?account, tx_hash = ?receipt.transaction_hash, "Deposited to entry point");
        }
        Ok(())
    }
}

#[async_trait]
impl<M: Middleware + 'static> BatchSender for PaymentBatchSender<M> {
    async fn send_batch(&self, signer: &Wallet, batch_size: usize) -> eyre::Result<H256> {
        let deployment = &self.deployment;
        let derived = self
            .deriver
            .derive(&self.options.passkey, &deployment.deployer, random_salt(), FACTORY_EXPIRE_TIME)
            .await?;
        let sender = derived.sender;
        debug!(?sender, salt = ?derived.salt, "Derived account");

        let token = deployment.token();
        let mint_amount = U256::from_dec_str(MINT_AMOUNT)?;
        let receipt = token.mint(sender, mint_amount).await?;
        debug!(?sender, tx_hash = ?receipt.transaction_hash, "Minted test tokens");

        let pay = deployment.addresses.pay;
        let pay_balance_before = token.balance_of(pay).await?;

        let call_data = payment_call_data(token.address(), pay)?;
        if let Some(log) = &self.options.calldata_log {
            if let Err(err) = log.append(sender, &call_data) {
                error!(?sender, "Saving call data failed: {err:?}");
            }
        }

        let request = OperationRequest {
            sender,
            start_nonce: BATCH_START_NONCE.into(),
            count: batch_size,
            call_data,
            init_code: derived.init_code,
        };
        let uos = self.builder.build_sequence(&request, signer, &self.scheme).await?;
        if uos.is_empty() {
            return Err(eyre::eyre!("Generating user operations failed for {sender:?}"));
        }
        debug!(?sender, count = uos.len(), "Generated user operations");

        self.fund_account(signer, sender).await?;

        let entry_point =
            EntryPoint::new(deployment.signer_client(signer), deployment.addresses.entry_point);
        let receipt = entry_point.handle_ops(uos, signer.address()).await?;
        let tx_hash = receipt.transaction_hash;

        let pay_balance_after = token.balance_of(pay).await?;
        debug!(
            before = %pay_balance_before,
            after = %pay_balance_after,
            "Pay contract token balance"
        );
        if pay_balance_after <= pay_balance_before {
            return Err(eyre::eyre!(
                "Pay balance did not increase after {tx_hash:?} ({pay_balance_before} -> {pay_balance_after})"
            ));
        }

        info!(?sender, ?tx_hash, "Payment batch confirmed");
        Ok(tx_hash)
    }
}
