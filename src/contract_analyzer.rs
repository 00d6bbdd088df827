//! C6: contract analyzer.
//!
//! Grounded on
//! `original_source/.../security/contract_analyzer.py::ContractAnalyzer`.

use std::sync::Arc;

use crate::bytecode::analyze_bytecode;
use crate::chain_provider::ChainProvider;
use crate::error::ShieldResult;
use crate::registry;
use crate::types::{RedFlag, Signals};

pub struct ContractAnalysis {
    pub trust_score: u8,
    pub trust_level: &'static str,
    pub trust_color: &'static str,
    pub contract_type: String,
    pub is_verified: bool,
    pub contract_name: Option<String>,
    pub age_days: Option<i64>,
    pub tx_count: u64,
    pub has_selfdestruct: bool,
    pub has_delegatecall: bool,
    pub red_flags: Vec<RedFlag>,
}

pub struct ContractAnalyzer {
    chain: Arc<dyn ChainProvider>,
}

impl ContractAnalyzer {
    pub fn new(chain: Arc<dyn ChainProvider>) -> Self {
        Self { chain }
    }

    pub async fn analyze(&self, address: &str) -> ShieldResult<ContractAnalysis> {
        // Known-scam fast path.
        if registry::is_known_scam(address) {
            return Ok(ContractAnalysis {
                trust_score: 0,
                trust_level: "dangerous",
                trust_color: crate::scoring::trust_color(0),
                contract_type: "Unknown".to_string(),
                is_verified: false,
                contract_name: None,
                age_days: None,
                tx_count: 0,
                has_selfdestruct: false,
                has_delegatecall: false,
                red_flags: vec![registry::red_flag("known_scam").expect("known_scam flag registered")],
            });
        }

        // Known-trusted fast path — skips the metadata
        // fetch and bytecode walk entirely.
        if let Some(known) = registry::lookup_contract(address) {
            if known.trusted {
                return Ok(ContractAnalysis {
                    trust_score: 95,
                    trust_level: "highly_trusted",
                    trust_color: crate::scoring::trust_color(95),
                    contract_type: known.contract_type.to_string(),
                    is_verified: true,
                    contract_name: Some(known.name.to_string()),
                    age_days: None,
                    tx_count: 0,
                    has_selfdestruct: false,
                    has_delegatecall: false,
                    red_flags: vec![],
                });
            }
        }

        let metadata = self.chain.get_contract_metadata(address).await?;
        let bytecode = analyze_bytecode(&metadata.bytecode);

        let signals = Signals {
            unverified_contract: metadata.has_code && !metadata.is_verified,
            verified_contract: metadata.is_verified,
            has_selfdestruct: bytecode.has_selfdestruct,
            has_delegatecall: bytecode.has_delegatecall,
            contract_age_days: metadata.age_days,
            tx_count: metadata.tx_count,
            ..Signals::default()
        };

        let trust_score = crate::scoring::calculate_trust(&signals);

        Ok(ContractAnalysis {
            trust_score,
            trust_level: crate::scoring::trust_level(trust_score),
            trust_color: crate::scoring::trust_color(trust_score),
            contract_type: infer_type(metadata.contract_name.as_deref(), metadata.source_code.as_deref()),
            is_verified: metadata.is_verified,
            contract_name: metadata.contract_name.clone(),
            age_days: metadata.age_days,
            tx_count: metadata.tx_count,
            has_selfdestruct: bytecode.has_selfdestruct,
            has_delegatecall: bytecode.has_delegatecall,
            red_flags: crate::scoring::get_red_flags(&signals),
        })
    }
}

/// Heuristic contract-type inference from the lowercase concatenation of
/// the verified source name and the first 500 characters of source code,
/// in the documented precedence order: DEX, Lending, NFT, Token, Bridge,
/// Staking, else "Smart Contract".
fn infer_type(contract_name: Option<&str>, source_code: Option<&str>) -> String {
    if contract_name.is_none() && source_code.is_none() {
        return "Smart Contract".to_string();
    }
    let name = contract_name.unwrap_or("");
    let source_excerpt: String = source_code.unwrap_or("").chars().take(500).collect();
    let lower = format!("{name} {source_excerpt}").to_lowercase();

    if lower.contains("swap") || lower.contains("router") || lower.contains("dex") || lower.contains("pool") {
        "DEX".to_string()
    } else if lower.contains("lend") || lower.contains("aave") || lower.contains("compound") || lower.contains("comptroller") {
        "Lending".to_string()
    } else if lower.contains("nft") || lower.contains("721") || lower.contains("1155") {
        "NFT".to_string()
    } else if lower.contains("token") || lower.contains("erc20") || lower.contains("coin") {
        "Token".to_string()
    } else if lower.contains("bridge") {
        "Bridge".to_string()
    } else if lower.contains("stak") || lower.contains("vault") {
        "Staking".to_string()
    } else {
        "Smart Contract".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_provider::testing::MockChainProvider;
    use crate::types::ContractMetadata;
    use std::sync::Arc;

    #[tokio::test]
    async fn known_trusted_contract_takes_fast_path() {
        let analyzer = ContractAnalyzer::new(Arc::new(MockChainProvider::default()));
        let result = analyzer
            .analyze("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48") // USDC
            .await
            .unwrap();
        assert_eq!(result.trust_score, 95);
        assert_eq!(result.trust_level, "highly_trusted");
        assert!(result.red_flags.is_empty());
        assert_eq!(result.contract_name.as_deref(), Some("USDC"));
    }

    #[tokio::test]
    async fn known_scam_contract_is_dangerous() {
        let analyzer = ContractAnalyzer::new(Arc::new(MockChainProvider::default()));
        let result = analyzer.analyze("0xbad00000000000000000000000000000000bad01").await.unwrap();
        assert_eq!(result.trust_score, 0);
        assert_eq!(result.trust_level, "dangerous");
        assert_eq!(result.red_flags[0].severity, "critical");
    }

    #[tokio::test]
    async fn unknown_unverified_contract_is_scored() {
        let provider = MockChainProvider::default();
        provider.metadata.lock().unwrap().insert(
            "0x1234567890123456789012345678901234567890".to_string(),
            ContractMetadata {
                has_code: true,
                is_verified: false,
                tx_count: 2,
                age_days: Some(0),
                bytecode: "0x60006000".to_string(),
                ..Default::default()
            },
        );
        let analyzer = ContractAnalyzer::new(Arc::new(provider));
        let result = analyzer.analyze("0x1234567890123456789012345678901234567890").await.unwrap();
        assert!(result.trust_score < 50);
        assert!(!result.red_flags.is_empty());
    }

    #[test]
    fn infer_type_follows_precedence_order() {
        assert_eq!(infer_type(Some("UniswapV2Router"), None), "DEX");
        assert_eq!(infer_type(Some("CompoundComptroller"), None), "Lending");
        assert_eq!(infer_type(Some("MyNFTCollection"), None), "NFT");
        assert_eq!(infer_type(Some("SomeToken"), None), "Token");
        assert_eq!(infer_type(Some("CrossChainBridge"), None), "Bridge");
        assert_eq!(infer_type(Some("StakingVault"), None), "Staking");
        assert_eq!(infer_type(Some("RandomContract"), None), "Smart Contract");
        assert_eq!(infer_type(None, None), "Smart Contract");
    }

    #[test]
    fn infer_type_reads_source_code_when_name_is_uninformative() {
        assert_eq!(
            infer_type(Some("Proxy"), Some("contract UniswapV2Pair is IUniswapV2Pair {")),
            "DEX"
        );
    }
}
