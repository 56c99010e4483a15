//! Cross-crate tests of account derivation, signing, building and load dispatch

#[cfg(test)]
mod common;

#[cfg(test)]
mod account_tests;

#[cfg(test)]
mod e2e_tests;

#[cfg(test)]
mod loadtest_tests;
