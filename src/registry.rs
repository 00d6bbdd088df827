//! C1: static selector/event/known-contract/scam registry.
//!
//! Pure lookups over compile-time-equivalent tables, grounded on
//! `original_source/.../chains/abi_database.py` and
//! `original_source/.../security/scam_database.py`. Built as process-wide
//! `lazy_static` statics, never mutated after first access.

use std::collections::{HashMap, HashSet};

use alloy_primitives::U256;
use lazy_static::lazy_static;

use crate::types::RedFlag;

/// A known function selector record.
#[derive(Debug, Clone, Copy)]
pub struct SelectorInfo {
    pub name: &'static str,
    pub function_type: &'static str,
    pub risk: &'static str,
    pub description: &'static str,
}

/// A known event-topic record.
#[derive(Debug, Clone, Copy)]
pub struct EventInfo {
    pub name: &'static str,
    pub event_type: &'static str,
}

/// A known-contract record.
#[derive(Debug, Clone, Copy)]
pub struct ContractInfo {
    pub name: &'static str,
    pub contract_type: &'static str,
    pub trusted: bool,
}

lazy_static! {
    /// `FUNCTION_SIGNATURES` (abi_database.py), keyed by lowercase 4-byte selector.
    static ref FUNCTION_SIGNATURES: HashMap<&'static str, SelectorInfo> = {
        let mut m = HashMap::new();
        m.insert("0x095ea7b3", SelectorInfo { name: "approve", function_type: "ERC-20", risk: "medium", description: "Token spending approval" });
        m.insert("0xa9059cbb", SelectorInfo { name: "transfer", function_type: "ERC-20", risk: "low", description: "Token transfer" });
        m.insert("0x23b872dd", SelectorInfo { name: "transferFrom", function_type: "ERC-20", risk: "low", description: "Token transfer (delegated)" });
        m.insert("0xa22cb465", SelectorInfo { name: "setApprovalForAll", function_type: "ERC-721", risk: "high", description: "NFT collection approval" });
        m.insert("0x42842e0e", SelectorInfo { name: "safeTransferFrom", function_type: "ERC-721", risk: "low", description: "Safe NFT transfer" });
        m.insert("0x38ed1739", SelectorInfo { name: "swapExactTokensForTokens", function_type: "Uniswap V2", risk: "low", description: "DEX swap" });
        m.insert("0x7ff36ab5", SelectorInfo { name: "swapExactETHForTokens", function_type: "Uniswap V2", risk: "low", description: "ETH to token swap" });
        m.insert("0x18cbafe5", SelectorInfo { name: "swapExactTokensForETH", function_type: "Uniswap V2", risk: "low", description: "Token to ETH swap" });
        m.insert("0xe8e33700", SelectorInfo { name: "addLiquidity", function_type: "Uniswap V2", risk: "low", description: "Add LP" });
        m.insert("0xf305d719", SelectorInfo { name: "addLiquidityETH", function_type: "Uniswap V2", risk: "low", description: "Add LP with ETH" });
        m.insert("0x414bf389", SelectorInfo { name: "exactInputSingle", function_type: "Uniswap V3", risk: "low", description: "Single-hop swap" });
        m.insert("0xc04b8d59", SelectorInfo { name: "exactInput", function_type: "Uniswap V3", risk: "low", description: "Multi-hop swap" });
        m.insert("0xac9650d8", SelectorInfo { name: "multicall", function_type: "Uniswap V3", risk: "medium", description: "Batched calls" });
        m.insert("0xd0e30db0", SelectorInfo { name: "deposit", function_type: "WETH", risk: "low", description: "Wrap ETH" });
        m.insert("0x2e1a7d4d", SelectorInfo { name: "withdraw", function_type: "WETH", risk: "low", description: "Unwrap ETH" });
        m.insert("0x3593564c", SelectorInfo { name: "execute", function_type: "Universal Router", risk: "medium", description: "Universal router execution" });
        m
    };

    /// `EVENT_SIGNATURES` (abi_database.py), keyed by lowercase 32-byte topic0.
    static ref EVENT_SIGNATURES: HashMap<&'static str, EventInfo> = {
        let mut m = HashMap::new();
        m.insert("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef", EventInfo { name: "Transfer", event_type: "ERC-20/721" });
        m.insert("0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925", EventInfo { name: "Approval", event_type: "ERC-20" });
        m.insert("0x17307eab39ab6107e8899845ad3d59bd9653f200f220920489ca2b5937696c31", EventInfo { name: "ApprovalForAll", event_type: "ERC-721" });
        m.insert("0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822", EventInfo { name: "Swap", event_type: "Uniswap V2" });
        m.insert("0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67", EventInfo { name: "Swap", event_type: "Uniswap V3" });
        m.insert("0x1c411e9a96e071241c2f21f7726b17ae89e3cab4c78be50e062b03a9fffbbad1", EventInfo { name: "Sync", event_type: "Uniswap V2" });
        m
    };

    /// `KNOWN_CONTRACTS` (abi_database.py), keyed by lowercase address.
    static ref KNOWN_CONTRACTS: HashMap<&'static str, ContractInfo> = {
        let mut m = HashMap::new();
        m.insert("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", ContractInfo { name: "USDC", contract_type: "ERC-20", trusted: true });
        m.insert("0xdac17f958d2ee523a2206206994597c13d831ec", ContractInfo { name: "USDT", contract_type: "ERC-20", trusted: true });
        m.insert("0x6b175474e89094c44da98b954eedeac495271d0", ContractInfo { name: "DAI", contract_type: "ERC-20", trusted: true });
        m.insert("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", ContractInfo { name: "WETH", contract_type: "ERC-20", trusted: true });
        m.insert("0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", ContractInfo { name: "WBTC", contract_type: "ERC-20", trusted: true });
        m.insert("0x514910771af9ca656af840dff83e8264ecf986ca", ContractInfo { name: "LINK", contract_type: "ERC-20", trusted: true });
        m.insert("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984", ContractInfo { name: "UNI", contract_type: "ERC-20", trusted: true });
        m.insert("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", ContractInfo { name: "Uniswap V2 Router", contract_type: "DEX", trusted: true });
        m.insert("0xe592427a0aece92de3edee1f18e0157c05861564", ContractInfo { name: "Uniswap V3 Router", contract_type: "DEX", trusted: true });
        m.insert("0x68b3465833fb72a70ecdf485e0e4c7bd8665fc45", ContractInfo { name: "Uniswap V3 Router 02", contract_type: "DEX", trusted: true });
        m.insert("0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad", ContractInfo { name: "Uniswap Universal Router", contract_type: "DEX", trusted: true });
        m.insert("0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f", ContractInfo { name: "SushiSwap Router", contract_type: "DEX", trusted: true });
        m.insert("0x1111111254eeb25477b68fb85ed929f73a960582", ContractInfo { name: "1inch V5 Router", contract_type: "DEX", trusted: true });
        m.insert("0x00000000000000adc04c56bf30ac9d3c0aaf14dc", ContractInfo { name: "OpenSea Seaport 1.5", contract_type: "NFT", trusted: true });
        m.insert("0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9", ContractInfo { name: "Aave V2", contract_type: "Lending", trusted: true });
        m.insert("0x87870bca3f3fd6335c3f4ce8392d69350b4fa4e2", ContractInfo { name: "Aave V3", contract_type: "Lending", trusted: true });
        m.insert("0x3d9819210a31b4961b30ef54be2aed79b9c9cd3b", ContractInfo { name: "Compound Comptroller", contract_type: "Lending", trusted: true });
        m
    };

    /// `KNOWN_SCAM_ADDRESSES` (scam_database.py).
    static ref KNOWN_SCAM_ADDRESSES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("0x0000000000000000000000000000000000000000");
        s.insert("0x000000000000000000000000000000000000dead");
        s.insert("0xbad00000000000000000000000000000000bad01");
        s.insert("0xbad00000000000000000000000000000000bad02");
        s.insert("0xbad00000000000000000000000000000000bad03");
        s
    };

    /// `(2**256 - 1) / 2` — any `approve` amount strictly greater is "unlimited".
    pub static ref UNLIMITED_THRESHOLD: U256 = U256::MAX / U256::from(2u8);

    /// `RED_FLAGS` (scam_database.py) — keyed by internal flag name.
    static ref RED_FLAGS: HashMap<&'static str, RedFlag> = {
        let mut m = HashMap::new();
        m.insert("known_scam", RedFlag { score: 90, severity: "critical", message: "Address is on known scam/phishing list" });
        m.insert("unlimited_approval", RedFlag { score: 30, severity: "high", message: "Requesting unlimited token spending approval" });
        m.insert("set_approval_for_all", RedFlag { score: 25, severity: "high", message: "Requesting approval for entire NFT collection" });
        m.insert("unverified_contract", RedFlag { score: 20, severity: "medium", message: "Contract source code is not verified" });
        m.insert("new_contract", RedFlag { score: 15, severity: "medium", message: "Contract deployed less than 7 days ago" });
        m.insert("very_new_contract", RedFlag { score: 20, severity: "high", message: "Contract deployed less than 24 hours ago" });
        m.insert("low_activity", RedFlag { score: 15, severity: "medium", message: "Very few transactions with this contract" });
        m.insert("selfdestruct", RedFlag { score: 20, severity: "high", message: "Contract contains self-destruct capability" });
        m.insert("delegatecall", RedFlag { score: 15, severity: "medium", message: "Contract uses delegatecall (upgradeable/proxy)" });
        m.insert("high_value", RedFlag { score: 10, severity: "medium", message: "High-value transaction" });
        m.insert("unknown_function", RedFlag { score: 10, severity: "low", message: "Unknown function being called" });
        m
    };
}

/// Looks up a function selector — first 10 characters (`0x` + 4 bytes),
/// lowercased.
pub fn lookup_selector(data: &str) -> Option<SelectorInfo> {
    if data.len() < 10 {
        return None;
    }
    let selector = data[..10].to_lowercase();
    FUNCTION_SIGNATURES.get(selector.as_str()).copied()
}

/// Looks up an event by its lowercased 32-byte topic0.
pub fn lookup_event(topic0: &str) -> Option<EventInfo> {
    EVENT_SIGNATURES.get(topic0.to_lowercase().as_str()).copied()
}

/// Looks up a known contract by lowercased address.
pub fn lookup_contract(address: &str) -> Option<ContractInfo> {
    KNOWN_CONTRACTS.get(address.to_lowercase().as_str()).copied()
}

/// Checks whether an address is on the known-scam list.
///
/// By construction, mutually exclusive with `lookup_contract` returning a
/// trusted entry — no address appears in both tables.
pub fn is_known_scam(address: &str) -> bool {
    KNOWN_SCAM_ADDRESSES.contains(address.to_lowercase().as_str())
}

/// Looks up a red-flag record by its internal flag name.
pub fn red_flag(name: &str) -> Option<RedFlag> {
    RED_FLAGS.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_lookup_is_case_insensitive() {
        let sig = lookup_selector("0x095EA7B3ffffffff").unwrap();
        assert_eq!(sig.name, "approve");
    }

    #[test]
    fn unknown_selector_returns_none() {
        assert!(lookup_selector("0xdeadbeef00000000").is_none());
    }

    #[test]
    fn known_trusted_and_scam_are_mutually_exclusive() {
        for addr in KNOWN_CONTRACTS.keys() {
            assert!(!is_known_scam(addr));
        }
    }

    #[test]
    fn known_scam_address_detected() {
        assert!(is_known_scam("0xBAD00000000000000000000000000000000BAD01"));
    }

    #[test]
    fn unlimited_threshold_is_half_of_max_u256() {
        assert_eq!(*UNLIMITED_THRESHOLD, U256::MAX / U256::from(2u8));
    }
}
