use crate::common::TestContext;
use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, Signature, H256, U256},
    utils::{hex, keccak256},
};
use passflow::loadtest::payment_call_data;
use passflow_account::{
    mock::{MockChain, MOCK_CHAIN_ID},
    OperationRequest, SignatureScheme, Stage,
};
use passflow_primitives::{
    constants::{account::FACTORY_EXPIRE_TIME, passkey::CLIENT_DATA_PRE},
    packing::unpack_factory_data,
    verify_with_public_key, PasskeyPair, Wallet,
};

fn request(sender: Address, init_code: Bytes, count: usize) -> OperationRequest {
    OperationRequest {
        sender,
        start_nonce: U256::one(),
        count,
        call_data: payment_call_data(Address::repeat_byte(0x70), Address::repeat_byte(0x9a))
            .unwrap(),
        init_code,
    }
}

#[tokio::test]
async fn derived_account_signs_with_both_factors() {
    let ctx = TestContext::new(MockChain::default()).undeployed(1);
    let deployer = Wallet::build_random(MOCK_CHAIN_ID);
    let signer = Wallet::build_random(MOCK_CHAIN_ID);
    let passkey = PasskeyPair::development().unwrap();

    let derived = ctx
        .deriver
        .derive(&passkey, &deployer, H256::repeat_byte(0x5a), FACTORY_EXPIRE_TIME)
        .await
        .unwrap();
    let (factory, _) = unpack_factory_data(&derived.init_code).unwrap();
    assert_eq!(factory, Address::repeat_byte(0xfa));

    let uos = ctx
        .builder
        .build_sequence(
            &request(derived.sender, derived.init_code.clone(), 1),
            &signer,
            &SignatureScheme::passkey(passkey.clone()),
        )
        .await
        .unwrap();
    assert_eq!(uos.len(), 1);
    let uo = &uos[0];
    assert_eq!(uo.sender, derived.sender);
    assert_eq!(uo.init_code, derived.init_code);

    let parts = MockChain::decode_signature(&uo.signature).unwrap();
    assert_eq!(parts.pub_key, (passkey.pub_key_x, passkey.pub_key_y));
    assert_eq!(parts.verify_type, 0);
    assert!(parts.passkey.is_low_s());

    // both factors sign the hash bound to the validation data
    let user_op_hash = uo.hash(&MockChain::entry_point(), MOCK_CHAIN_ID);
    let uop_hash = H256(keccak256(encode(&[
        Token::FixedBytes(user_op_hash.0.as_bytes().to_vec()),
        Token::Uint(parts.validation_data),
    ])));
    assert!(parts.client_json.starts_with(CLIENT_DATA_PRE));
    assert!(parts.client_json.contains(&hex::encode(uop_hash)));
    assert!(verify_with_public_key(
        parts.pub_key,
        &MockChain::client_message(&parts.client_json),
        &parts.passkey
    ));

    let eoa_sig = Signature::try_from(parts.eoa_sig.as_ref()).unwrap();
    assert_eq!(eoa_sig.recover(uop_hash.as_bytes()).unwrap(), signer.address());
}

#[tokio::test]
async fn rejected_passkeys_build_nothing() {
    let ctx = TestContext::new(MockChain::default().reject_passkeys()).undeployed(1);
    let uos = ctx
        .builder
        .build_sequence(
            &request(Address::repeat_byte(0x42), Bytes::from(vec![0xfa; 20]), 3),
            &Wallet::build_random(MOCK_CHAIN_ID),
            &SignatureScheme::passkey(PasskeyPair::random()),
        )
        .await
        .unwrap();
    assert!(uos.is_empty());
}

#[tokio::test]
async fn unreachable_factory_stops_derivation() {
    let ctx = TestContext::new(MockChain::default().fail_at(Stage::ComputeAddress));
    let err = ctx
        .deriver
        .derive(&PasskeyPair::random(), &Wallet::build_random(1), H256::zero(), 1)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::ComputeAddress));
}

#[tokio::test]
async fn sequences_for_one_sender_share_the_deployment() {
    let ctx = TestContext::new(MockChain::default()).undeployed(1);
    let sender = ctx.deriver.compute_address(H256::repeat_byte(1)).await.unwrap();
    let init_code = Bytes::from(vec![0xfa; 40]);

    let uos = ctx
        .builder
        .build_sequence(
            &request(sender, init_code.clone(), 4),
            &Wallet::build_random(MOCK_CHAIN_ID),
            &SignatureScheme::personal_sign(None),
        )
        .await
        .unwrap();

    assert_eq!(uos.iter().map(|uo| uo.nonce.as_u64()).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_eq!(uos[0].init_code, init_code);
    assert!(uos[1..].iter().all(|uo| uo.init_code.is_empty()));

    // every operation hashes differently, so no signature is reused
    let mut signatures: Vec<_> = uos.iter().map(|uo| uo.signature.clone()).collect();
    signatures.dedup();
    assert_eq!(signatures.len(), 4);
}
