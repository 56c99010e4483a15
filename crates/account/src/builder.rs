use crate::{
    error::{AccountError, Stage},
    signer::{SignatureScheme, UopSigner},
};
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use passflow_contracts::{PasskeyHelper, UserOpHasher};
use passflow_primitives::{PackedUserOperation, Wallet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Operations to build for one sender
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationRequest {
    pub sender: Address,
    /// Nonce of the first operation, the rest follow consecutively
    pub start_nonce: U256,
    pub count: usize,
    pub call_data: Bytes,
    /// Used by the first operation only, and only while the sender has no code
    pub init_code: Bytes,
}

/// Builds signed user operations with the default gas parameters
pub struct UserOperationBuilder<M, E, H> {
    eth_client: Arc<M>,
    signer: UopSigner<E, H>,
    fee_per_gas: U256,
}

impl<M, E, H> UserOperationBuilder<M, E, H>
where
    M: Middleware + 'static,
    E: UserOpHasher,
    H: PasskeyHelper,
{
    pub fn new(eth_client: Arc<M>, signer: UopSigner<E, H>, fee_per_gas: U256) -> Self {
        Self { eth_client, signer, fee_per_gas }
    }

    pub fn signer(&self) -> &UopSigner<E, H> {
        &self.signer
    }

    pub async fn is_deployed(&self, sender: Address) -> Result<bool, AccountError> {
        let code = self
            .eth_client
            .get_code(sender, None)
            .await
            .map_err(|err| AccountError::at(Stage::DeploymentCheck, err))?;
        Ok(!code.is_empty())
    }

    /// Signed operations for nonces `start_nonce..start_nonce + count`
    ///
    /// Operations that fail to sign are logged and left out, so the result may be shorter than
    /// `count`.
    pub async fn build_sequence(
        &self,
        request: &OperationRequest,
        wallet: &Wallet,
        scheme: &SignatureScheme,
    ) -> Result<Vec<PackedUserOperation>, AccountError> {
        if request.count == 0 {
            return Ok(vec![]);
        }

        let needs_init = !self.is_deployed(request.sender).await?;
        let mut uos = Vec::with_capacity(request.count);

        for i in 0..request.count {
            let nonce = request.start_nonce + U256::from(i);
            let init_code =
                if i == 0 && needs_init { request.init_code.clone() } else { Bytes::default() };
            let uo = PackedUserOperation::with_defaults(request.sender, self.fee_per_gas)?
                .nonce(nonce)
                .init_code(init_code)
                .call_data(request.call_data.clone());

            match self.signer.sign(&uo, wallet, scheme).await {
                Ok(signature) => uos.push(uo.signature(signature.into())),
                Err(err) => warn!(
                    sender = ?request.sender,
                    ?nonce,
                    stage = ?err.stage(),
                    "Dropping user operation: {err}"
                ),
            }
        }

        debug!(
            sender = ?request.sender,
            built = uos.len(),
            requested = request.count,
            "Built user operations"
        );
        Ok(uos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockChain, MOCK_CHAIN_ID};
    use ethers::providers::{MockProvider, Provider};
    use passflow_primitives::PasskeyPair;

    fn builder(
        chain: MockChain,
        code: Bytes,
    ) -> UserOperationBuilder<Provider<MockProvider>, MockChain, MockChain> {
        let (provider, mock) = Provider::mocked();
        mock.push::<Bytes, _>(code).unwrap();
        let chain = Arc::new(chain);
        let signer = UopSigner::new(MockChain::entry_point(), MOCK_CHAIN_ID, chain.clone(), chain);
        UserOperationBuilder::new(Arc::new(provider), signer, 7_000_000_000u64.into())
    }

    fn request(count: usize) -> OperationRequest {
        OperationRequest {
            sender: Address::repeat_byte(0x42),
            start_nonce: 5.into(),
            count,
            call_data: Bytes::from(vec![0xca, 0xfe]),
            init_code: Bytes::from(vec![0xfa; 24]),
        }
    }

    #[tokio::test]
    async fn undeployed_sender_gets_init_code_once() {
        let builder = builder(MockChain::default(), Bytes::default());
        let uos = builder
            .build_sequence(
                &request(3),
                &Wallet::build_random(MOCK_CHAIN_ID),
                &SignatureScheme::passkey(PasskeyPair::development().unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(uos.len(), 3);
        assert_eq!(uos.iter().map(|uo| uo.nonce.as_u64()).collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(uos[0].init_code, request(3).init_code);
        assert!(uos[1..].iter().all(|uo| uo.init_code.is_empty()));
        for uo in &uos {
            assert_eq!(uo.unpack_account_gas_limits(), (1_000_000, 1_000_000));
            assert_eq!(uo.unpack_gas_fees(), (7_000_000_000, 7_000_000_000));
            assert_eq!(uo.pre_verification_gas, U256::zero());
            assert!(!uo.signature.is_empty());
        }
    }

    #[tokio::test]
    async fn deployed_sender_has_no_init_code() {
        let builder = builder(MockChain::default(), Bytes::from(vec![0x60, 0x80]));
        let uos = builder
            .build_sequence(
                &request(2),
                &Wallet::build_random(MOCK_CHAIN_ID),
                &SignatureScheme::typed_data(None),
            )
            .await
            .unwrap();
        assert_eq!(uos.len(), 2);
        assert!(uos.iter().all(|uo| uo.init_code.is_empty()));
    }

    #[tokio::test]
    async fn zero_count_is_empty() {
        // nothing is queried when no operations are requested
        let (provider, _mock) = Provider::mocked();
        let chain = Arc::new(MockChain::default());
        let signer = UopSigner::new(MockChain::entry_point(), MOCK_CHAIN_ID, chain.clone(), chain);
        let builder = UserOperationBuilder::new(Arc::new(provider), signer, U256::one());
        let uos = builder
            .build_sequence(&request(0), &Wallet::build_random(1), &SignatureScheme::typed_data(None))
            .await
            .unwrap();
        assert!(uos.is_empty());
    }

    #[tokio::test]
    async fn failed_signatures_are_dropped() {
        let builder = builder(MockChain::default().fail_nonce(6.into()), Bytes::default());
        let uos = builder
            .build_sequence(
                &request(3),
                &Wallet::build_random(MOCK_CHAIN_ID),
                &SignatureScheme::passkey(PasskeyPair::random()),
            )
            .await
            .unwrap();
        assert_eq!(uos.iter().map(|uo| uo.nonce.as_u64()).collect::<Vec<_>>(), vec![5, 7]);
        // the first operation still deploys the account
        assert!(!uos[0].init_code.is_empty());
    }
}
