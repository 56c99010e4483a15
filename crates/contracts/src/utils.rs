use crate::gen::{entry_point_api, validator_api};
use passflow_primitives::PackedUserOperation;

impl From<PackedUserOperation> for entry_point_api::PackedUserOperation {
    fn from(uo: PackedUserOperation) -> Self {
        Self {
            sender: uo.sender,
            nonce: uo.nonce,
            init_code: uo.init_code,
            call_data: uo.call_data,
            account_gas_limits: uo.account_gas_limits.into(),
            pre_verification_gas: uo.pre_verification_gas,
            gas_fees: uo.gas_fees.into(),
            paymaster_and_data: uo.paymaster_and_data,
            signature: uo.signature,
        }
    }
}

impl From<PackedUserOperation> for validator_api::PackedUserOperation {
    fn from(uo: PackedUserOperation) -> Self {
        Self {
            sender: uo.sender,
            nonce: uo.nonce,
            init_code: uo.init_code,
            call_data: uo.call_data,
            account_gas_limits: uo.account_gas_limits.into(),
            pre_verification_gas: uo.pre_verification_gas,
            gas_fees: uo.gas_fees.into(),
            paymaster_and_data: uo.paymaster_and_data,
            signature: uo.signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        abi::{AbiDecode, AbiEncode},
        types::{Address, Bytes},
    };

    fn uo() -> PackedUserOperation {
        PackedUserOperation::with_defaults(
            Address::repeat_byte(0x42),
            PackedUserOperation::default_gas_price(),
        )
        .unwrap()
        .nonce(3.into())
        .init_code(Bytes::from(vec![0xfa; 24]))
        .signature(Bytes::from(vec![0xab; 98]))
    }

    #[test]
    fn handle_ops_call_carries_packed_fields() {
        let uo = uo();
        let call = entry_point_api::HandleOpsCall {
            ops: vec![uo.clone().into()],
            beneficiary: Address::repeat_byte(0x01),
        };

        let decoded = entry_point_api::HandleOpsCall::decode(call.encode()).unwrap();
        assert_eq!(decoded.beneficiary, Address::repeat_byte(0x01));
        let op = &decoded.ops[0];
        assert_eq!(op.sender, uo.sender);
        assert_eq!(op.nonce, uo.nonce);
        assert_eq!(op.init_code, uo.init_code);
        assert_eq!(op.account_gas_limits, uo.account_gas_limits.0);
        assert_eq!(op.gas_fees, uo.gas_fees.0);
        assert_eq!(op.signature, uo.signature);
    }

    #[test]
    fn validator_operation_matches_entry_point_operation() {
        let entry_point_op = entry_point_api::PackedUserOperation::from(uo());
        let validator_op = validator_api::PackedUserOperation::from(uo());
        assert_eq!(entry_point_op.encode(), validator_op.encode());
    }
}
