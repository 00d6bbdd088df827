//! Process-wide configuration.
//!
//! `Config::from_env` reads everything at startup and fails fast on a bad
//! value; the field set follows `original_source/.../config.py::Settings`.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Primary Ethereum JSON-RPC endpoint.
    pub rpc_url_eth: String,

    /// Block-explorer API key (Etherscan-compatible). `None` disables
    /// source-verification/age enrichment and approval-log scanning.
    pub explorer_api_key: Option<String>,

    /// LLM collaborator API key. `None` means the stub collaborators are
    /// used (deterministic, no network calls).
    pub llm_api_key: Option<String>,

    /// LLM model identifier, passed through to whichever collaborator
    /// implementation is wired in.
    pub llm_model: String,

    /// Configured spot price used for all USD figures. Flagged at startup when left at the
    /// distilled default.
    pub eth_price_usd: f64,

    /// Rate limit, informational only — enforcement is a front-end
    /// collaborator's responsibility.
    pub rate_limit_per_minute: u32,

    /// CORS allow-list, informational only — CORS itself is out of core
    /// scope.
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let eth_price_usd: f64 = std::env::var("SHIELD_ETH_PRICE_USD")
            .unwrap_or_else(|_| "3500".into())
            .parse()
            .context("Invalid SHIELD_ETH_PRICE_USD")?;

        if eth_price_usd == 3500.0 {
            tracing::warn!(
                "eth_price_usd left at the distilled default (3500) — configure a real spot \
                 price before using USD-denominated figures in production"
            );
        }

        Ok(Config {
            rpc_url_eth: std::env::var("SHIELD_RPC_URL_ETH")
                .unwrap_or_else(|_| "https://eth-mainnet.g.alchemy.com/v2/demo".into()),
            explorer_api_key: std::env::var("SHIELD_EXPLORER_API_KEY").ok().filter(|s| !s.is_empty()),
            llm_api_key: std::env::var("SHIELD_LLM_API_KEY").ok().filter(|s| !s.is_empty()),
            llm_model: std::env::var("SHIELD_LLM_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into()),
            eth_price_usd,
            rate_limit_per_minute: std::env::var("SHIELD_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .context("Invalid SHIELD_RATE_LIMIT_PER_MINUTE")?,
            allowed_origins: std::env::var("SHIELD_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn allowed_origins_splits_and_trims() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("SHIELD_ALLOWED_ORIGINS", "https://a.test, https://b.test");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.allowed_origins, vec!["https://a.test", "https://b.test"]);
        std::env::remove_var("SHIELD_ALLOWED_ORIGINS");
    }

    #[test]
    fn missing_explorer_key_is_none() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("SHIELD_EXPLORER_API_KEY");
        let cfg = Config::from_env().unwrap();
        assert!(cfg.explorer_api_key.is_none());
    }
}
