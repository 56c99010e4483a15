//! A `Wallet` is a wrapper around an ethers wallet used by the deployer and the load test senders
use ethers::{
    prelude::{k256::ecdsa::SigningKey, rand},
    signers::{LocalWallet, Signer},
    types::{Address, Signature, H256},
};
use expanded_pathbuf::ExpandedPathBuf;
use sha2::{Digest, Sha256};
use std::fs;

/// Private key of the `index`-th load test sender: `sha256("{seed}-{index}")`
pub fn deterministic_key(seed: &str, index: usize) -> [u8; 32] {
    Sha256::digest(format!("{seed}-{index}")).into()
}

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Builds a `Wallet` from a randomly generated key
    pub fn build_random(chain_id: u64) -> Self {
        let mut rng = rand::thread_rng();
        Self { signer: LocalWallet::new(&mut rng).with_chain_id(chain_id) }
    }

    /// Create a new wallet from a hex encoded private key (with or without `0x`)
    ///
    /// # Arguments
    /// * `private_key` - The hex encoded secp256k1 private key
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_private_key(private_key: &str, chain_id: u64) -> eyre::Result<Self> {
        let signer: LocalWallet = private_key.trim().trim_start_matches("0x").parse()?;
        Ok(Self { signer: signer.with_chain_id(chain_id) })
    }

    /// Create a new wallet from a file holding a hex encoded private key
    pub fn from_file(path: ExpandedPathBuf, chain_id: u64) -> eyre::Result<Self> {
        let private_key = fs::read_to_string(path.to_path_buf())?;
        Self::from_private_key(&private_key, chain_id)
    }

    /// Wallet of the `index`-th load test sender, reproducible across runs
    pub fn deterministic(seed: &str, index: usize, chain_id: u64) -> eyre::Result<Self> {
        let signer = LocalWallet::from_bytes(&deterministic_key(seed, index))?;
        Ok(Self { signer: signer.with_chain_id(chain_id) })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-191 signature over the 32 bytes of `hash`
    pub async fn sign_hash_message(&self, hash: H256) -> eyre::Result<Signature> {
        Ok(self.signer.sign_message(hash.as_bytes()).await?)
    }

    /// Raw signature over an already prefixed digest (EIP-712)
    pub fn sign_digest(&self, digest: H256) -> eyre::Result<Signature> {
        Ok(self.signer.sign_hash(digest)?)
    }
}
