use async_trait::async_trait;
use ethers::{providers::Middleware, types::Address};
use passflow_contracts::{Config, ContractsError, Role};
use strum::IntoEnumIterator;
use tracing::info;

/// Role whitelists the senders must be on before they send traffic
#[async_trait]
pub trait RoleWhitelist: Send + Sync {
    async fn grant(&self, role: Role, accounts: Vec<Address>) -> Result<(), ContractsError>;

    async fn has_role(&self, role: Role, account: Address) -> Result<bool, ContractsError>;
}

#[async_trait]
impl<M: Middleware + 'static> RoleWhitelist for Config<M> {
    async fn grant(&self, role: Role, accounts: Vec<Address>) -> Result<(), ContractsError> {
        Config::grant(self, role, accounts).await
    }

    async fn has_role(&self, role: Role, account: Address) -> Result<bool, ContractsError> {
        Config::has_role(self, role, account).await
    }
}

/// Grants every role to every sender, then checks that each grant is in effect
pub async fn provision_senders<W: RoleWhitelist + ?Sized>(
    whitelist: &W,
    senders: &[Address],
) -> eyre::Result<()> {
    info!("Configuring {} senders", senders.len());

    for role in Role::iter() {
        whitelist
            .grant(role, senders.to_vec())
            .await
            .map_err(|err| eyre::eyre!("Granting {role} role failed: {err}"))?;
    }

    for (i, sender) in senders.iter().enumerate() {
        for role in Role::iter() {
            let granted = whitelist
                .has_role(role, *sender)
                .await
                .map_err(|err| eyre::eyre!("Checking {role} role of sender {i} failed: {err}"))?;
            if !granted {
                return Err(eyre::eyre!("Sender {i} ({sender:?}) is not a {role}"));
            }
        }
    }

    info!("Successfully configured all senders");
    Ok(())
}
