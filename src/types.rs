//! Core data model.
//!
//! `Address`/`TxHash` are validating newtypes over a normalized lowercase
//! hex `String` — the Rust-native replacement for the Python source's
//! `Field(pattern=...)` regex validation (`original_source/.../models/schemas.py`).

use std::fmt;

use alloy_primitives::U256;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ShieldError;

lazy_static! {
    static ref ADDRESS_RE: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap();
    static ref TX_HASH_RE: Regex = Regex::new(r"^0x[a-fA-F0-9]{64}$").unwrap();
}

/// A 20-byte EVM address, always normalized to lowercase `0x`-hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(input: &str) -> Result<Self, ShieldError> {
        if !ADDRESS_RE.is_match(input) {
            return Err(ShieldError::InvalidInput(format!(
                "not a valid 20-byte address: {input}"
            )));
        }
        Ok(Self(input.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the 20-byte `alloy_primitives::Address` for ABI encoding.
    pub fn to_alloy(&self) -> alloy_primitives::Address {
        self.0.parse().expect("Address invariant: already validated hex")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = ShieldError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// A 32-byte transaction hash, always normalized to lowercase `0x`-hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    pub fn parse(input: &str) -> Result<Self, ShieldError> {
        if !TX_HASH_RE.is_match(input) {
            return Err(ShieldError::InvalidInput(format!(
                "not a valid 32-byte transaction hash: {input}"
            )));
        }
        Ok(Self(input.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TxHash {
    type Error = ShieldError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        TxHash::parse(&value)
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

/// EVM-family chain identifier. Only these seven are implemented;
/// the Python source's `Chain` enum additionally lists Solana/Ton/Bitcoin,
/// which the EVM-only non-goal excludes from this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Polygon,
    Arbitrum,
    Base,
    Optimism,
    Avalanche,
    Bsc,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Chain::Ethereum => "ethereum",
            Chain::Polygon => "polygon",
            Chain::Arbitrum => "arbitrum",
            Chain::Base => "base",
            Chain::Optimism => "optimism",
            Chain::Avalanche => "avalanche",
            Chain::Bsc => "bsc",
        };
        f.write_str(s)
    }
}

/// Transaction fetched from the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionData {
    pub hash: Option<String>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: U256,
    pub input: String,
    pub gas: u64,
    pub gas_price: u64,
    pub nonce: u64,
    pub block_number: Option<u64>,
    pub status: Option<u64>,
}

/// A decoded event log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<String>,
    pub data: String,
}

/// Transaction receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub gas_used: u64,
    pub status: Option<u64>,
    pub logs: Vec<LogEntry>,
}

/// Result of a remote `eth_call` + `eth_estimateGas` simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub success: bool,
    pub gas_used: u64,
    pub return_data: Option<String>,
    pub error: Option<String>,
}

/// Contract metadata fetched from chain + explorer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractMetadata {
    pub has_code: bool,
    pub balance_wei: U256,
    pub tx_count: u64,
    pub is_verified: bool,
    pub contract_name: Option<String>,
    pub source_code: Option<String>,
    pub age_days: Option<i64>,
    pub bytecode: String,
}

/// Result of walking bytecode for dangerous opcodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BytecodeAnalysis {
    pub has_selfdestruct: bool,
    pub has_delegatecall: bool,
    pub patterns: Vec<String>,
}

/// Decoded function call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedFunction {
    pub name: String,
    pub function_type: String,
    pub risk: String,
    pub selector: Option<String>,
    pub is_unlimited_approval: bool,
    pub params: Option<DecodedParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedParams {
    pub spender: String,
    pub amount: String,
}

/// One scored ERC-20 `Approval` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub token_address: Address,
    pub token_name: String,
    pub spender: Address,
    pub spender_name: Option<String>,
    pub amount: U256,
    pub is_unlimited: bool,
    pub risk_score: u8,
}

/// Generated `approve(spender, 0)` revoke calldata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeTransaction {
    pub to: Address,
    pub data: String,
    pub description: String,
}

/// Gas/value cost breakdown attached to a generated receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub gas_eth: String,
    pub gas_usd: String,
    pub value_eth: String,
    pub value_usd: String,
    pub total_eth: String,
    pub total_usd: String,
}

/// One decoded log event surfaced on a generated receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptEvent {
    pub name: String,
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

/// A user-facing warning emitted by the transaction analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub level: &'static str,
    pub message: String,
}

/// A red-flag record surfaced by the scoring engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RedFlag {
    pub score: i32,
    pub severity: &'static str,
    pub message: &'static str,
}

/// The closed bag of signals the scorer recognises.
///
/// A closed struct rather than an open map: missing fields default to
/// their falsy/zero/None identity, and the scorer becomes an exhaustive
/// sequence of pattern matches instead of dynamic key lookup.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub is_known_scam: bool,
    pub is_honeypot: bool,
    pub unlimited_approval: bool,
    pub set_approval_for_all: bool,
    pub unverified_contract: bool,
    pub verified_contract: bool,
    pub trusted_contract: bool,
    pub has_selfdestruct: bool,
    pub has_delegatecall: bool,
    pub contract_age_days: Option<i64>,
    pub tx_count: u64,
    pub value_usd: f64,
    pub function_risk: Option<String>,
    pub unknown_function: bool,
}
