//! Passflow command line: single batch sender, load tester and deployment registry tooling

pub mod cli;
pub mod deployment;
pub mod loadtest;
pub mod utils;
