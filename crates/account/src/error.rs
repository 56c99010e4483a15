use ethers::types::Address;
use passflow_contracts::ContractsError;
use passflow_primitives::{PackError, PasskeyError, SignatureError};
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Step of account derivation or signing that produced an error
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    ComputeAddress,
    AccountInitializer,
    FactoryHash,
    FactorySignature,
    PackedFactorySignature,
    DeploymentCheck,
    UserOpHash,
    ValidationData,
    EncodeUopHash,
    EoaSignature,
    EoaRecovery,
    ClientJson,
    PasskeySignature,
    PasskeyVerification,
    PasskeyEncoding,
    FinalEncoding,
    ValidatorHash,
}

/// Errors of the account pipeline
#[derive(Debug, Error)]
pub enum AccountError {
    /// A contract call failed
    #[error("{stage} failed: {source}")]
    Contract {
        stage: Stage,
        #[source]
        source: ContractsError,
    },

    /// Local signing or provider failure
    #[error("{stage} failed: {message}")]
    Stage { stage: Stage, message: String },

    /// The validator did not accept the passkey signature
    #[error("passkey signature rejected by the validator")]
    PasskeyRejected,

    /// The EOA factor does not recover to the signing wallet
    #[error("signature recovers to {recovered:?}, expected {expected:?}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error(transparent)]
    Passkey(#[from] PasskeyError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl AccountError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Contract { stage, .. } | Self::Stage { stage, .. } => Some(*stage),
            Self::PasskeyRejected => Some(Stage::PasskeyVerification),
            Self::SignerMismatch { .. } => Some(Stage::EoaRecovery),
            Self::Passkey(_) => Some(Stage::PasskeySignature),
            Self::Pack(_) | Self::Signature(_) => None,
        }
    }

    pub(crate) fn at(stage: Stage, err: impl ToString) -> Self {
        Self::Stage { stage, message: err.to_string() }
    }
}

/// Tags contract errors with the stage they happened in
pub(crate) trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T, AccountError>;
}

impl<T> StageExt<T> for Result<T, ContractsError> {
    fn stage(self, stage: Stage) -> Result<T, AccountError> {
        self.map_err(|source| AccountError::Contract { stage, source })
    }
}
