//! Constants of the passkey smart account protocol and the load harness

use ethers::types::U256;
use lazy_static::lazy_static;

/// User operation defaults
pub mod user_operation {
    /// Default verification and call gas limit of generated operations
    pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;
    /// Default pre-verification gas of generated operations
    pub const DEFAULT_PRE_VERIFICATION_GAS: u64 = 0;
    /// Default fee per gas (1 gwei) when `GAS_PRICE` is unset
    pub const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;
}

/// Signature schemes carried in `UserOperation.signature`
pub mod signature {
    use super::*;

    /// EIP-712 typed data signature
    pub const SIG_TYPE_TYPED_DATA: u8 = 0;
    /// EIP-191 personal message signature
    pub const SIG_TYPE_PERSONAL_SIGN: u8 = 1;
    /// `sigType(1) ‖ sigTime(32)`
    pub const PREFIX_LENGTH: usize = 33;
    /// Raw secp256k1 signature `r ‖ s ‖ v`
    pub const ECDSA_LENGTH: usize = 65;

    /// Typed data domain name of the payable account
    pub const DOMAIN_NAME: &str = "PayableAccount";
    /// Typed data domain version of the payable account
    pub const DOMAIN_VERSION: &str = "pay";

    /// Seconds added to the current time for passkey validation windows
    pub const VALIDATION_WINDOW_SECS: u64 = 10 * 60;

    lazy_static! {
        /// Far-future signature time (`2^48 - 1`)
        pub static ref MAX_SIG_TIME: U256 = U256::from((1u64 << 48) - 1);
        /// Multiplier placing the signature time in the upper bits for the legacy layout
        pub static ref LEGACY_SIG_TIME_SHIFT: U256 = U256::one() << 160;
    }
}

/// Paymaster data
pub mod paymaster {
    use super::*;

    lazy_static! {
        /// Default paymaster signature time (`(2^48 - 1) << 160`)
        pub static ref DEFAULT_SIG_TIME: U256 = U256::from((1u64 << 48) - 1) << 160;
    }
}

/// WebAuthn client data and P-256 curve parameters
pub mod passkey {
    /// Client data JSON before the challenge
    pub const CLIENT_DATA_PRE: &str = r#"{"type":"webauthn.get","challenge":""#;
    /// Client data JSON after the challenge
    pub const CLIENT_DATA_POST: &str = r#"","origin":"http://localhost:8000","crossOrigin":false}"#;

    /// Order of the P-256 group, big-endian
    pub const CURVE_ORDER: [u8; 32] = [
        0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63,
        0x25, 0x51,
    ];

    /// Development key used by the account templates
    pub const DEVELOPMENT_PRIVATE_KEY: &str =
        "42d2bd030a8a71ff2f9043adcfb46138a5d87287cefff37d18a638f956c33449";
}

/// Account creation
pub mod account {
    /// Recovery identifier hashed into the recovery module install data
    pub const RECOVERY_IDENTIFIER: &str = "123@gmail.com";
    /// Factory authorization expiry used by the batch sender
    pub const FACTORY_EXPIRE_TIME: u64 = 3_740_578_311;
}

/// Load test harness
pub mod load_test {
    /// Seed for deterministic sender wallets when `WALLET_SEED` is unset
    pub const DEFAULT_WALLET_SEED: &str = "loadtest-deterministic-seed";
    /// Number of senders funded per sub-batch
    pub const FUNDING_BATCH_SIZE: usize = 10;
    /// Delay between funding transactions in milliseconds
    pub const FUNDING_DELAY_MS: u64 = 500;
    /// Tokens minted to each counterfactual account before it pays (1e9 * 1e18)
    pub const MINT_AMOUNT: &str = "1000000000000000000000000000";
    /// Nonce of the first operation in every payment batch
    pub const BATCH_START_NONCE: u64 = 1;
    /// Default call data log file
    pub const DEFAULT_CALLDATA_FILE: &str = "calldata_file.ini";
}
