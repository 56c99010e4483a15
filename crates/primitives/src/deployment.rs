//! Registry of deployed contract addresses
//!
//! Stored as pretty JSON under `<root>/<environment>/<name>.json`. Writes go through a temporary
//! file in the target directory that is renamed over the old record, so readers never observe a
//! partially written registry.

use crate::utils::as_checksum_addr;
use ethers::{types::Address, utils::to_checksum};
#[cfg(test)]
use expanded_pathbuf::ExpandedPathBuf;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

/// Addresses of every contract the harness talks to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ContractAddresses {
    #[serde(rename = "ENTRYPOINT", serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub helper: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub token_receiver: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub config: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub webauthn_validator: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub payable_account: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub account_factory: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub mock_recovery_module: Address,
    #[serde(rename = "TEST_ERC20", serialize_with = "as_checksum_addr")]
    pub test_erc20: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub pay: Address,
}

impl ContractAddresses {
    /// `(NAME, address)` pairs using the environment variable names
    pub fn entries(&self) -> [(&'static str, Address); 10] {
        [
            ("ENTRYPOINT", self.entry_point),
            ("HELPER", self.helper),
            ("TOKEN_RECEIVER", self.token_receiver),
            ("CONFIG", self.config),
            ("WEBAUTHN_VALIDATOR", self.webauthn_validator),
            ("PAYABLE_ACCOUNT", self.payable_account),
            ("ACCOUNT_FACTORY", self.account_factory),
            ("MOCK_RECOVERY_MODULE", self.mock_recovery_module),
            ("TEST_ERC20", self.test_erc20),
            ("PAY", self.pay),
        ]
    }

    /// Names of contracts still set to the zero address
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries().into_iter().filter(|(_, addr)| addr.is_zero()).map(|(name, _)| name).collect()
    }

    /// `NAME=0x..` lines, one per contract
    pub fn to_env(&self) -> String {
        self.entries()
            .iter()
            .map(|(name, addr)| format!("{name}={}\n", to_checksum(addr, None)))
            .collect()
    }
}

/// Location of one registry record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRegistry {
    path: PathBuf,
}

impl DeploymentRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<root>/<environment>/<name>.json`
    #[cfg(test)]
    pub fn in_dir(root: ExpandedPathBuf, environment: &str, name: &str) -> Self {
        Self::new(root.to_path_buf().join(environment).join(format!("{name}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, `None` if it was never written
    pub fn load(&self) -> eyre::Result<Option<ContractAddresses>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the record atomically
    pub fn save(&self, addresses: &ContractAddresses) -> eyre::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut file, addresses)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;

        debug!(path = ?self.path, "Saved deployment registry");
        Ok(())
    }
}
