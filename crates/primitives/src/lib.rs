//! Account abstraction (ERC-4337) primitive types for passkey smart accounts
//!
//! This crate contains the packed user operation, the fixed-width packing helpers, the execution
//! mode encoder, signature scheme types, P-256 passkeys, wallets and the deployment registry.

pub mod constants;
pub mod deployment;
pub mod mode;
pub mod packing;
pub mod passkey;
pub mod signature;
mod user_operation;
mod utils;
mod wallet;

pub use deployment::{ContractAddresses, DeploymentRegistry};
pub use mode::{batch_mode, encode_executions, encode_mode_type, Execution};
pub use packing::{pack_uint128, unpack_uint128, PackError, PaymasterAndData, PaymasterMode};
pub use passkey::{verify_with_public_key, P256Signature, PasskeyError, PasskeyPair};
pub use signature::{sig_time, SignatureError, TypedDataDomain, UopSignature};
pub use user_operation::{PackedUserOperation, UserOperationHash};
pub use utils::{get_address, predict_deterministic_address, random_salt};
pub use wallet::{deterministic_key, Wallet};
