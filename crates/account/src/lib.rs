//! Counterfactual passkey accounts: init code derivation, user operation signing and building

mod builder;
mod deriver;
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod signer;

pub use builder::{OperationRequest, UserOperationBuilder};
pub use deriver::{AccountTemplate, DerivedAccount, InitCodeDeriver};
pub use error::{AccountError, Stage};
pub use signer::{SignatureScheme, UopSigner};
