//! Transaction-security gateway for EVM wallets.
//!
//! Fetches on-chain evidence, decodes ABI/selectors against a static
//! registry, walks contract bytecode for dangerous opcodes, and combines
//! the results into additive risk/trust scores and revoke-calldata
//! generation. HTTP framing, EVM execution, and the LLM/auth/event-log
//! backends are all out of scope for this core — see [`collaborators`] for
//! the trait seams those integrations plug into.

pub mod approval_scanner;
pub mod bytecode;
pub mod chain_provider;
pub mod collaborators;
pub mod config;
pub mod contract_analyzer;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod scoring;
pub mod tx_analyzer;
pub mod types;

pub use config::Config;
pub use error::{ShieldError, ShieldResult};
pub use orchestrator::Services;
pub use types::{Address, Chain, TxHash};
