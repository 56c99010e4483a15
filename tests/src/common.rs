use ethers::{
    providers::{MockProvider, Provider},
    types::{Bytes, U256},
};
use passflow_account::{
    mock::{MockChain, MOCK_CHAIN_ID},
    InitCodeDeriver, UopSigner, UserOperationBuilder,
};
use std::sync::Arc;

pub type MockBuilder = UserOperationBuilder<Provider<MockProvider>, MockChain, MockChain>;

/// Chain stand-in shared by the deriver and the builder
pub struct TestContext {
    pub deriver: InitCodeDeriver<MockChain, MockChain>,
    pub builder: MockBuilder,
    pub mock: MockProvider,
}

impl TestContext {
    pub fn new(chain: MockChain) -> Self {
        let chain = Arc::new(chain);
        let (provider, mock) = Provider::mocked();
        let signer =
            UopSigner::new(MockChain::entry_point(), MOCK_CHAIN_ID, chain.clone(), chain.clone());

        Self {
            deriver: InitCodeDeriver::new(chain.clone(), chain.clone(), MockChain::template()),
            builder: UserOperationBuilder::new(Arc::new(provider), signer, U256::exp10(9)),
            mock,
        }
    }

    /// Queues `eth_getCode` answers of undeployed senders
    pub fn undeployed(self, queries: usize) -> Self {
        for _ in 0..queries {
            let _ = self.mock.push::<Bytes, _>(Bytes::default());
        }
        self
    }
}
