//! Bindings and wrappers for the passkey smart account contracts

pub mod calls;
mod config;
mod entry_point;
mod error;
mod factory;
mod gen;
mod helper;
mod token;
pub mod traits;
mod transaction;
mod utils;

pub use config::{Config, Role};
pub use entry_point::EntryPoint;
pub use error::ContractsError;
pub use factory::AccountFactory;
pub use gen::{entry_point_api::FailedOp, pay_api::Cheque};
pub use helper::Helper;
pub use token::TestToken;
pub use traits::{AccountInitializer, AddressComputer, PasskeyHelper, UserOpHasher};
pub use transaction::send_and_wait;
