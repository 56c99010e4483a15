use ethers::{
    providers::{Http, Middleware, Provider, Ws},
    types::{Address, Chain, TransactionReceipt, TransactionRequest, H256, U256},
    utils::parse_ether as parse_ether_units,
};
use pin_utils::pin_mut;
use std::{future::Future, str::FromStr, time::Duration};
use tracing::{info, trace};

/// Parses address from string
pub fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("String {s} is not a valid address"))
}

/// Parses U256 from string
pub fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|_| format!("String {s} is not a valid U256"))
}

/// Parses a decimal ether amount ("0.5") into wei
pub fn parse_ether(s: &str) -> Result<U256, String> {
    parse_ether_units(s).map_err(|_| format!("String {s} is not a valid ether amount"))
}

/// Parses a 32 byte hex string
pub fn parse_h256(s: &str) -> Result<H256, String> {
    H256::from_str(s).map_err(|_| format!("String {s} is not a valid 32 byte hex value"))
}

pub fn validate_private_key(hex_string: &str) -> Result<String, String> {
    let stripped = hex_string.trim_start_matches("0x");

    if stripped.chars().count() != 64 {
        return Err(format!("{hex_string} is not a valid private key"));
    }

    if !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("{hex_string} is not a valid hexadecimal string"));
    }

    Ok(String::from(stripped))
}

/// Creates ethers provider with HTTP connection
pub async fn create_http_provider(addr: &str) -> eyre::Result<Provider<Http>> {
    let provider = Provider::<Http>::try_from(addr)?;

    let chain_id = provider.get_chainid().await?;

    Ok(provider.interval(if chain_id == Chain::Dev.into() || chain_id == Chain::AnvilHardhat.into()
    {
        Duration::from_millis(5u64)
    } else {
        Duration::from_millis(500u64)
    }))
}

/// Creates ethers provider with WebSockets connection
pub async fn create_ws_provider(addr: &str) -> eyre::Result<Provider<Ws>> {
    let provider = Provider::<Ws>::connect_with_reconnects(addr, usize::MAX).await?;
    Ok(provider)
}

/// Sends `value` wei from the client's signer and waits for the receipt
pub async fn transfer<M: Middleware + 'static>(
    client: &M,
    to: Address,
    value: U256,
) -> eyre::Result<TransactionReceipt> {
    let pending = client.send_transaction(TransactionRequest::pay(to, value), None).await?;
    let tx_hash = pending.tx_hash();
    trace!(?tx_hash, ?to, ?value, "Transfer sent");

    pending.await?.ok_or_else(|| eyre::eyre!("Transfer {tx_hash:?} was dropped"))
}

/// Formats wei as ether for logs
pub fn format_ether(wei: U256) -> String {
    ethers::utils::format_ether(wei)
}

/// Runs the future to completion or until:
/// - `ctrl-c` is received.
/// - `SIGTERM` is received (unix only).
pub async fn run_until_ctrl_c<F, E>(fut: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Send + Sync + 'static + From<std::io::Error>,
{
    let ctrl_c = tokio::signal::ctrl_c();

    let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let sigterm = stream.recv();
    pin_mut!(sigterm, ctrl_c, fut);

    tokio::select! {
        _ = ctrl_c => {
            info!("Received ctrl-c signal.");
        },
        _ = sigterm => {
            info!("Received SIGTERM signal.");
        },
        res = fut => res?,
    }

    Ok(())
}
