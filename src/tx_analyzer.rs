//! C5: transaction analyzer.
//!
//! Grounded on
//! `original_source/.../security/contract_analyzer.py::TransactionAnalyzer`.

use std::sync::Arc;

use alloy_primitives::U256;

use crate::chain_provider::ChainProvider;
use crate::error::ShieldResult;
use crate::registry::{self, UNLIMITED_THRESHOLD};
use crate::types::{DecodedFunction, DecodedParams, Signals, SimulationResult, Warning};

/// Output of a single-transaction analysis.
pub struct TransactionAnalysis {
    pub risk_score: u8,
    pub risk_level: &'static str,
    pub risk_color: &'static str,
    pub function: DecodedFunction,
    pub simulation: Option<SimulationResult>,
    pub warnings: Vec<Warning>,
    pub destination_trusted: bool,
    pub destination_name: Option<String>,
}

pub struct TransactionAnalyzer {
    chain: Arc<dyn ChainProvider>,
}

impl TransactionAnalyzer {
    pub fn new(chain: Arc<dyn ChainProvider>) -> Self {
        Self { chain }
    }

    pub async fn analyze(
        &self,
        tx_hash: Option<&str>,
        to: Option<&str>,
        data: Option<&str>,
        value: Option<&str>,
    ) -> ShieldResult<TransactionAnalysis> {
        let fetched = match tx_hash {
            Some(hash) => self.chain.get_transaction(hash).await?,
            None => None,
        };

        // Fetched values win over caller-provided ones when both exist.
        let resolved_to: Option<String> = fetched
            .as_ref()
            .and_then(|t| t.to.as_ref())
            .map(|a| a.as_str().to_string())
            .or_else(|| to.map(str::to_string));
        let resolved_data: String = fetched
            .as_ref()
            .map(|t| t.input.clone())
            .unwrap_or_else(|| data.unwrap_or("0x").to_string());
        let resolved_value: String = fetched
            .as_ref()
            .map(|t| t.value.to_string())
            .unwrap_or_else(|| value.unwrap_or("0").to_string());
        let resolved_from = fetched.as_ref().and_then(|t| t.from.as_ref()).map(|a| a.as_str().to_string());

        let function = decode_function(&resolved_data);

        let simulation = if let Some(to_addr) = &resolved_to {
            if !resolved_data.is_empty() {
                Some(
                    self.chain
                        .simulate_transaction(to_addr, &resolved_data, &resolved_value, resolved_from.as_deref())
                        .await?,
                )
            } else {
                None
            }
        } else {
            None
        };

        let dest_info = resolved_to.as_deref().and_then(registry::lookup_contract);
        let is_scam_dest = resolved_to.as_deref().map(registry::is_known_scam).unwrap_or(false);

        let signals = Signals {
            is_known_scam: is_scam_dest,
            trusted_contract: dest_info.map(|d| d.trusted).unwrap_or(false),
            unlimited_approval: function.is_unlimited_approval,
            set_approval_for_all: function.name == "setApprovalForAll",
            function_risk: Some(function.risk.clone()),
            unknown_function: function.name == "Unknown Function",
            ..Signals::default()
        };

        let risk_score = crate::scoring::calculate_risk(&signals);
        let warnings = detect_warnings(&signals, &resolved_value);

        Ok(TransactionAnalysis {
            risk_score,
            risk_level: crate::scoring::risk_level(risk_score),
            risk_color: crate::scoring::risk_color(risk_score),
            function,
            simulation,
            warnings,
            destination_trusted: signals.trusted_contract,
            destination_name: dest_info.map(|d| d.name.to_string()),
        })
    }
}

/// Decodes the called function.
fn decode_function(data: &str) -> DecodedFunction {
    if matches!(data, "0x" | "0x0" | "0x00" | "") {
        return DecodedFunction {
            name: "Native Transfer".to_string(),
            function_type: "Transfer".to_string(),
            risk: "low".to_string(),
            selector: None,
            is_unlimited_approval: false,
            params: None,
        };
    }

    let Some(sig) = registry::lookup_selector(data) else {
        return DecodedFunction {
            name: "Unknown Function".to_string(),
            function_type: "Unknown".to_string(),
            risk: "medium".to_string(),
            selector: Some(data[..data.len().min(10)].to_lowercase()),
            is_unlimited_approval: false,
            params: None,
        };
    };

    let mut decoded = DecodedFunction {
        name: sig.name.to_string(),
        function_type: sig.function_type.to_string(),
        risk: sig.risk.to_string(),
        selector: Some(data[..10].to_lowercase()),
        is_unlimited_approval: false,
        params: None,
    };

    // approve(address,uint256): amount = data[74:138], spender = last 40
    // hex chars of the first 32-byte parameter, data[34:74] (grounded on
    // contract_analyzer.py::_decode_function — see DESIGN.md Open Question 2).
    if sig.name == "approve" && data.len() >= 138 {
        if let Ok(amount) = U256::from_str_radix(&data[74..138], 16) {
            decoded.is_unlimited_approval = amount > *UNLIMITED_THRESHOLD;
            let spender = &data[34..74];
            decoded.params = Some(DecodedParams {
                spender: format!("0x{spender}"),
                amount: amount.to_string(),
            });
        }
    }

    decoded
}

/// Emits warnings in the fixed documented order.
fn detect_warnings(signals: &Signals, value_wei: &str) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if signals.is_known_scam {
        warnings.push(Warning {
            level: "critical",
            message: "Destination is a known scam address!".to_string(),
        });
    }
    if signals.unlimited_approval {
        warnings.push(Warning {
            level: "critical",
            message: "This grants UNLIMITED token spending to the spender.".to_string(),
        });
    }
    if signals.set_approval_for_all {
        warnings.push(Warning {
            level: "high",
            message: "This approves ALL NFTs in this collection.".to_string(),
        });
    }
    if signals.unknown_function {
        warnings.push(Warning {
            level: "medium",
            message: "Unknown function call — cannot determine intent.".to_string(),
        });
    }

    // High-value ETH transfer — a parse failure is silent.
    if let Ok(wei) = U256::from_str_radix(value_wei, 10) {
        let wei_f64: f64 = wei.to_string().parse().unwrap_or(0.0);
        let eth = wei_f64 / 1e18;
        if eth > 10.0 {
            warnings.push(Warning {
                level: "medium",
                message: format!("High-value transfer: {eth:.4} ETH"),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_provider::testing::MockChainProvider;
    use std::sync::Arc;

    fn analyzer() -> TransactionAnalyzer {
        TransactionAnalyzer::new(Arc::new(MockChainProvider::default()))
    }

    #[tokio::test]
    async fn native_transfer_with_empty_data() {
        let a = analyzer();
        let result = a
            .analyze(None, Some("0xabc0000000000000000000000000000000000a"), Some("0x"), Some("1000000000000000000"))
            .await
            .unwrap();
        assert_eq!(result.function.name, "Native Transfer");
        assert_eq!(result.function.function_type, "Transfer");
        assert!(!result.warnings.iter().any(|w| w.message.contains("UNLIMITED")));
    }

    /// Scenario A: unlimited approval to a known scam address.
    #[tokio::test]
    async fn unlimited_approval_to_known_scam_is_critical() {
        let a = analyzer();
        let data = format!("0x095ea7b3{}{}", "0".repeat(24) + "bad00000000000000000000000000000000bad01", "f".repeat(64));
        let result = a
            .analyze(
                None,
                Some("0xbad00000000000000000000000000000000bad01"),
                Some(&data),
                Some("0"),
            )
            .await
            .unwrap();
        assert_eq!(result.function.name, "approve");
        assert!(result.function.is_unlimited_approval);
        assert!(result.warnings.iter().any(|w| w.level == "critical" && w.message.contains("scam")));
        assert!(result.warnings.iter().any(|w| w.level == "critical" && w.message.contains("UNLIMITED")));
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.risk_level, "critical");
    }

    #[test]
    fn decode_native_transfer_variants() {
        for empty in ["0x", "0x0", "0x00"] {
            let d = decode_function(empty);
            assert_eq!(d.name, "Native Transfer");
        }
    }

    #[test]
    fn decode_unknown_function() {
        let d = decode_function("0xdeadbeef");
        assert_eq!(d.name, "Unknown Function");
        assert_eq!(d.risk, "medium");
    }

    #[test]
    fn decode_approve_extracts_spender_and_amount() {
        let data = format!("0x095ea7b3{}{}", "0".repeat(24) + "1111111111111111111111111111111111111111", "0".repeat(63) + "1");
        let d = decode_function(&data);
        assert_eq!(d.name, "approve");
        assert!(!d.is_unlimited_approval);
        let params = d.params.unwrap();
        assert_eq!(params.spender, "0x1111111111111111111111111111111111111111");
        assert_eq!(params.amount, "1");
    }
}
