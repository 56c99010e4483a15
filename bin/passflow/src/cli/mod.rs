use crate::utils::run_until_ctrl_c;
use clap::{value_parser, Parser, Subcommand};
use std::panic;

pub mod args;
pub mod commands;

/// The main Passflow CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "Passflow", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, env = "LOG_LEVEL", default_value_t = 3, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "off",
            1 => "error",
            2 => "warn",
            3 => "info",
            _ => "debug",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision deterministic senders and run the concurrent load test
    #[command(name = "load-test")]
    LoadTest(Box<commands::LoadTestCommand>),

    /// Send payment batches one after another from the deployer
    #[command(name = "send-batch")]
    SendBatch(Box<commands::SendBatchCommand>),

    /// Print the counterfactual address and init code of a new passkey account
    #[command(name = "init-code")]
    InitCode(Box<commands::InitCodeCommand>),

    /// Generate a P-256 passkey
    #[command(name = "create-passkey")]
    CreatePasskey(commands::CreatePasskeyCommand),

    /// Deployment registry commands (show, env, save)
    #[command(subcommand, name = "registry")]
    Registry(commands::RegistryCommand),
}

pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();

    let rust_log = match std::env::var("RUST_LOG") {
        Ok(val) => format!("{val},passflow={}", cli.get_log_level()),
        Err(_) => format!("passflow={}", cli.get_log_level()),
    };
    std::env::set_var("RUST_LOG", rust_log);
    tracing_subscriber::fmt::init();

    std::thread::Builder::new()
        .spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

            let task = async move {
                match cli.command {
                    Commands::LoadTest(command) => command.execute().await,
                    Commands::SendBatch(command) => command.execute().await,
                    Commands::InitCode(command) => command.execute().await,
                    Commands::CreatePasskey(command) => command.execute(),
                    Commands::Registry(command) => command.execute(),
                }
            };

            rt.block_on(run_until_ctrl_c(task))?;
            Ok(())
        })?
        .join()
        .unwrap_or_else(|e| panic::resume_unwind(e))
}
