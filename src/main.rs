//! CLI entry point: wires a [`shield_core::Services`] instance against a
//! real JSON-RPC provider and the deterministic stub collaborators, then
//! runs one analysis from the command line.
//!
//! This binary is a thin demonstration harness, not the product surface —
//! front-ends talk to `Services` directly through whatever transport they
//! choose (HTTP, a message queue, an embedded call), which is explicitly
//! out of scope here.

use std::sync::Arc;

use anyhow::{bail, Result};

use shield_core::chain_provider::EvmJsonRpcProvider;
use shield_core::collaborators::stub::{
    StubAuthVerifier, StubEventLogger, StubIntentClassifier, StubReceiptRenderer, StubTextGenerator,
};
use shield_core::types::Chain;
use shield_core::{Config, Services};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = Config::from_env()?;

    let chain = Arc::new(EvmJsonRpcProvider::new(config.rpc_url_eth.clone(), config.explorer_api_key.clone()));
    let services = Services::new(
        chain,
        Arc::new(StubIntentClassifier),
        Arc::new(StubTextGenerator),
        Arc::new(StubEventLogger),
        Arc::new(StubAuthVerifier),
        Arc::new(StubReceiptRenderer),
        config.eth_price_usd,
    );

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_default();

    match command.as_str() {
        "tx" => {
            let Some(hash) = args.next() else {
                bail!("usage: shield-core tx <tx_hash>");
            };
            let result = services.analyze_transaction(Some(&hash), None, None, None, Chain::Ethereum).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "contract" => {
            let Some(address) = args.next() else {
                bail!("usage: shield-core contract <address>");
            };
            let result = services.analyze_contract(&address, Chain::Ethereum).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "revoke" => {
            let Some(wallet) = args.next() else {
                bail!("usage: shield-core revoke <wallet_address>");
            };
            let result = services.emergency_revoke(&wallet, 50, Chain::Ethereum).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "status" => {
            let Some(wallet) = args.next() else {
                bail!("usage: shield-core status <wallet_address>");
            };
            let result = services.shield_status(&wallet).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "chat" => {
            let message = args.collect::<Vec<_>>().join(" ");
            if message.is_empty() {
                bail!("usage: shield-core chat <message>");
            }
            let result = services.chat(&message, Chain::Ethereum).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            bail!("usage: shield-core <tx|contract|revoke|status|chat> <args...>");
        }
    }

    Ok(())
}
