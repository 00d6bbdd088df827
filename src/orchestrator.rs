//! C8: `Services` aggregate, per-RPC orchestration, and the chat intent
//! router.
//!
//! Grounded on `original_source/.../services/shield.py::ShieldOrchestrator`
//! and `original_source/.../services/receipt/generator.py`. No global
//! singletons — every collaborator and analyzer is an explicit field on
//! `Services`.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::approval_scanner::ApprovalScanner;
use crate::chain_provider::ChainProvider;
use crate::collaborators::{AuthVerifier, EventLogger, IntentClassifier, ReceiptRenderer, ShieldEvent, TextGenerator};
use crate::contract_analyzer::ContractAnalyzer;
use crate::error::ShieldResult;
use crate::registry;
use crate::types::{Approval, Chain, CostBreakdown, DecodedParams, ReceiptEvent, RedFlag, RevokeTransaction, SimulationResult, Warning};
use crate::tx_analyzer::TransactionAnalyzer;

lazy_static! {
    static ref HASH_EXTRACT_RE: Regex = Regex::new(r"0x[a-fA-F0-9]{64}").unwrap();
    static ref ADDRESS_EXTRACT_RE: Regex = Regex::new(r"0x[a-fA-F0-9]{40}").unwrap();
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionAnalysisResponse {
    pub risk_score: u8,
    pub risk_level: &'static str,
    pub risk_color: &'static str,
    pub function_name: String,
    pub function_type: String,
    pub decoded_params: Option<DecodedParams>,
    pub simulation: Option<SimulationResult>,
    pub warnings: Vec<Warning>,
    pub destination_trusted: bool,
    pub destination_name: Option<String>,
    pub ai_explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractAnalysisResponse {
    pub trust_score: u8,
    pub trust_level: &'static str,
    pub trust_color: &'static str,
    pub address: String,
    pub chain: Chain,
    pub contract_name: Option<String>,
    pub contract_type: String,
    pub is_verified: bool,
    pub is_known_scam: bool,
    pub age_days: Option<i64>,
    pub tx_count: u64,
    pub red_flags: Vec<RedFlag>,
    pub ai_explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptResponse {
    pub tx_hash: String,
    pub chain: Chain,
    pub action_summary: String,
    pub events: Vec<ReceiptEvent>,
    pub cost_breakdown: Option<CostBreakdown>,
    pub svg_card: String,
    pub ai_summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmergencyRevokeResponse {
    pub total_approvals: usize,
    pub risky_approvals: usize,
    pub total_at_risk_usd: String,
    pub approvals: Vec<Approval>,
    pub revoke_txs: Vec<RevokeTransaction>,
    pub ai_explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShieldStatusResponse {
    pub score: u8,
    pub level: &'static str,
    pub total_approvals: usize,
    pub risky_approvals: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub intent: String,
    pub message: String,
    pub data: Option<Value>,
}

/// Every collaborator and analyzer the Shield core depends on, wired
/// explicitly at construction — no process-wide globals (spec Design
/// Notes §9).
pub struct Services {
    pub chain: Arc<dyn ChainProvider>,
    pub tx_analyzer: TransactionAnalyzer,
    pub contract_analyzer: ContractAnalyzer,
    pub approval_scanner: ApprovalScanner,
    pub intent_classifier: Arc<dyn IntentClassifier>,
    pub text_generator: Arc<dyn TextGenerator>,
    pub event_logger: Arc<dyn EventLogger>,
    pub auth: Arc<dyn AuthVerifier>,
    pub receipt_renderer: Arc<dyn ReceiptRenderer>,
    pub eth_price_usd: f64,
}

impl Services {
    pub fn new(
        chain: Arc<dyn ChainProvider>,
        intent_classifier: Arc<dyn IntentClassifier>,
        text_generator: Arc<dyn TextGenerator>,
        event_logger: Arc<dyn EventLogger>,
        auth: Arc<dyn AuthVerifier>,
        receipt_renderer: Arc<dyn ReceiptRenderer>,
        eth_price_usd: f64,
    ) -> Self {
        Self {
            tx_analyzer: TransactionAnalyzer::new(chain.clone()),
            contract_analyzer: ContractAnalyzer::new(chain.clone()),
            approval_scanner: ApprovalScanner::new(chain.clone()),
            chain,
            intent_classifier,
            text_generator,
            event_logger,
            auth,
            receipt_renderer,
            eth_price_usd,
        }
    }

    pub async fn analyze_transaction(
        &self,
        tx_hash: Option<&str>,
        to: Option<&str>,
        data: Option<&str>,
        value: Option<&str>,
        chain: Chain,
    ) -> ShieldResult<TransactionAnalysisResponse> {
        let result = self.tx_analyzer.analyze(tx_hash, to, data, value).await?;

        let payload = serde_json::json!({
            "risk_score": result.risk_score,
            "risk_level": result.risk_level,
            "function_name": result.function.name,
        });
        let ai_explanation = self
            .text_generator
            .generate_explanation(&payload, "tx_analysis")
            .await
            .unwrap_or_default();

        self.event_logger
            .log(ShieldEvent {
                user_id: "anonymous".to_string(),
                event_type: "analyze_transaction",
                chain: chain.to_string(),
                target: to.map(str::to_string),
                tx_hash: tx_hash.map(str::to_string),
                risk: Some(result.risk_score),
                trust: None,
                result: Some(result.risk_level.to_string()),
            })
            .await;

        Ok(TransactionAnalysisResponse {
            risk_score: result.risk_score,
            risk_level: result.risk_level,
            risk_color: result.risk_color,
            function_name: result.function.name.clone(),
            function_type: result.function.function_type.clone(),
            decoded_params: result.function.params.clone(),
            simulation: result.simulation,
            warnings: result.warnings,
            destination_trusted: result.destination_trusted,
            destination_name: result.destination_name,
            ai_explanation,
        })
    }

    pub async fn analyze_contract(&self, address: &str, chain: Chain) -> ShieldResult<ContractAnalysisResponse> {
        let result = self.contract_analyzer.analyze(address).await?;

        let payload = serde_json::json!({
            "trust_score": result.trust_score,
            "trust_level": result.trust_level,
        });
        let ai_explanation = self
            .text_generator
            .generate_explanation(&payload, "contract_analysis")
            .await
            .unwrap_or_default();

        self.event_logger
            .log(ShieldEvent {
                user_id: "anonymous".to_string(),
                event_type: "analyze_contract",
                chain: chain.to_string(),
                target: Some(address.to_string()),
                tx_hash: None,
                risk: None,
                trust: Some(result.trust_score),
                result: Some(result.trust_level.to_string()),
            })
            .await;

        Ok(ContractAnalysisResponse {
            trust_score: result.trust_score,
            trust_level: result.trust_level,
            trust_color: result.trust_color,
            address: address.to_lowercase(),
            chain,
            contract_name: result.contract_name,
            contract_type: result.contract_type,
            is_verified: result.is_verified,
            is_known_scam: registry::is_known_scam(address),
            age_days: result.age_days,
            tx_count: result.tx_count,
            red_flags: result.red_flags,
            ai_explanation,
        })
    }

    pub async fn generate_receipt(&self, tx_hash: &str, chain: Chain) -> ShieldResult<ReceiptResponse> {
        let tx = self.chain.get_transaction(tx_hash).await?;
        let receipt = self.chain.get_receipt(tx_hash).await?;

        let (Some(tx), Some(receipt)) = (tx, receipt) else {
            return Ok(mock_receipt(tx_hash, chain));
        };

        let events: Vec<ReceiptEvent> = receipt
            .logs
            .iter()
            .map(|log| {
                let name = log
                    .topics
                    .first()
                    .and_then(|t| registry::lookup_event(t))
                    .map(|e| e.name.to_string())
                    .unwrap_or_else(|| "Unknown Event".to_string());
                ReceiptEvent {
                    name,
                    address: log.address.to_string(),
                    topics: log.topics.clone(),
                    data: log.data.clone(),
                }
            })
            .collect();

        let cost = calculate_cost_breakdown(tx.gas_price, receipt.gas_used, tx.value.to_string().as_str(), self.eth_price_usd);
        let action_summary = build_action_summary(&events, tx.value);

        let summary = format!("{action_summary} on {chain}");
        let svg_card = self.receipt_renderer.render_svg(&summary).await;

        let ai_payload = serde_json::json!({ "action_summary": action_summary, "tx_hash": tx_hash });
        let ai_summary = self
            .text_generator
            .generate_explanation(&ai_payload, "receipt")
            .await
            .unwrap_or_default();

        self.event_logger
            .log(ShieldEvent {
                user_id: "anonymous".to_string(),
                event_type: "generate_receipt",
                chain: chain.to_string(),
                target: None,
                tx_hash: Some(tx_hash.to_string()),
                risk: None,
                trust: None,
                result: Some(action_summary.clone()),
            })
            .await;

        Ok(ReceiptResponse {
            tx_hash: tx_hash.to_string(),
            chain,
            action_summary,
            events,
            cost_breakdown: Some(cost),
            svg_card,
            ai_summary,
        })
    }

    pub async fn emergency_revoke(
        &self,
        wallet_address: &str,
        risk_threshold: u8,
        chain: Chain,
    ) -> ShieldResult<EmergencyRevokeResponse> {
        let scored = self.approval_scanner.scan(wallet_address).await?;
        let risky: Vec<Approval> = scored
            .iter()
            .filter(|a| a.risk_score >= risk_threshold)
            .cloned()
            .collect();
        let risky_refs: Vec<&Approval> = risky.iter().collect();

        let revoke_txs: Vec<RevokeTransaction> = risky.iter().map(ApprovalScanner::build_revoke).collect();
        let total_at_risk_usd = ApprovalScanner::at_risk_usd_estimate(&risky_refs);

        let payload = serde_json::json!({ "risky_approvals": risky.len() });
        let ai_explanation = self
            .text_generator
            .generate_explanation(&payload, "revoke")
            .await
            .unwrap_or_default();

        self.event_logger
            .log(ShieldEvent {
                user_id: "anonymous".to_string(),
                event_type: "emergency_revoke",
                chain: chain.to_string(),
                target: Some(wallet_address.to_string()),
                tx_hash: None,
                risk: None,
                trust: None,
                result: Some(format!("{} risky of {}", risky.len(), scored.len())),
            })
            .await;

        Ok(EmergencyRevokeResponse {
            total_approvals: scored.len(),
            risky_approvals: risky.len(),
            total_at_risk_usd,
            approvals: scored,
            revoke_txs,
            ai_explanation,
        })
    }

    /// `shieldStatus` — always scans at a fixed threshold of 30, regardless
    /// of any caller-supplied threshold (grounded on `get_status`).
    pub async fn shield_status(&self, wallet_address: &str) -> ShieldResult<ShieldStatusResponse> {
        let scored = self.approval_scanner.scan(wallet_address).await?;
        let risky = scored.iter().filter(|a| a.risk_score >= 30).count();

        let (score, level) = match risky {
            0 => (95, "excellent"),
            1..=2 => (70, "good"),
            3..=5 => (40, "at_risk"),
            _ => (20, "critical"),
        };

        Ok(ShieldStatusResponse {
            score,
            level,
            total_approvals: scored.len(),
            risky_approvals: risky,
        })
    }

    /// Chat intent router: LLM classification first, falling
    /// back to regex hash/address extraction from the raw message, then
    /// dispatching to the matching RPC. Never fabricates a hash/address —
    /// absence of both always degrades to an input-request message.
    pub async fn chat(&self, message: &str, chain: Chain) -> ShieldResult<ChatResponse> {
        let intent = self.intent_classifier.classify_intent(message).await;

        match intent.category.as_str() {
            "analyze_tx" => {
                let hash = param_str(&intent.parameters, "tx_hash").or_else(|| extract_hash(message));
                match hash {
                    Some(h) => {
                        let r = self.analyze_transaction(Some(&h), None, None, None, chain).await?;
                        let message = if r.ai_explanation.is_empty() {
                            "Transaction analysis complete. See the detailed breakdown above.".to_string()
                        } else {
                            r.ai_explanation.clone()
                        };
                        Ok(ChatResponse {
                            intent: "analyze_tx".to_string(),
                            message,
                            data: serde_json::to_value(&r).ok(),
                        })
                    }
                    None => Ok(ChatResponse {
                        intent: "analyze_tx".to_string(),
                        message: "I'd be happy to analyze a transaction for you. Please provide the transaction hash (0x...).".to_string(),
                        data: None,
                    }),
                }
            }
            "analyze_contract" => {
                let address = param_str(&intent.parameters, "address").or_else(|| extract_address(message));
                match address {
                    Some(a) => {
                        let r = self.analyze_contract(&a, chain).await?;
                        let message = if r.ai_explanation.is_empty() {
                            "Contract analysis complete. Review the trust score and findings above.".to_string()
                        } else {
                            r.ai_explanation.clone()
                        };
                        Ok(ChatResponse {
                            intent: "analyze_contract".to_string(),
                            message,
                            data: serde_json::to_value(&r).ok(),
                        })
                    }
                    None => Ok(ChatResponse {
                        intent: "analyze_contract".to_string(),
                        message: "I can analyze any contract for you. Please provide the contract address (0x...).".to_string(),
                        data: None,
                    }),
                }
            }
            "revoke" => {
                let wallet = param_str(&intent.parameters, "wallet_address").or_else(|| extract_address(message));
                match wallet {
                    Some(w) => {
                        let r = self.emergency_revoke(&w, 50, chain).await?;
                        let message = if r.ai_explanation.is_empty() {
                            format!("Found {} approvals, {} are risky.", r.total_approvals, r.risky_approvals)
                        } else {
                            r.ai_explanation.clone()
                        };
                        Ok(ChatResponse {
                            intent: "revoke".to_string(),
                            message,
                            data: serde_json::to_value(&r).ok(),
                        })
                    }
                    None => Ok(ChatResponse {
                        intent: "revoke".to_string(),
                        message: "I can scan your wallet for risky token approvals. Please provide your wallet address or connect your wallet.".to_string(),
                        data: None,
                    }),
                }
            }
            "receipt" => {
                let hash = param_str(&intent.parameters, "tx_hash").or_else(|| extract_hash(message));
                match hash {
                    Some(h) => {
                        let r = self.generate_receipt(&h, chain).await?;
                        let message = if r.ai_summary.is_empty() {
                            "Your transaction receipt is ready!".to_string()
                        } else {
                            r.ai_summary.clone()
                        };
                        Ok(ChatResponse {
                            intent: "receipt".to_string(),
                            message,
                            data: serde_json::to_value(&r).ok(),
                        })
                    }
                    None => Ok(ChatResponse {
                        intent: "receipt".to_string(),
                        message: "I can generate a shareable receipt for any transaction. Please provide the transaction hash (0x...).".to_string(),
                        data: None,
                    }),
                }
            }
            "explain" => {
                let concept = param_str(&intent.parameters, "concept").unwrap_or_else(|| message.to_string());
                let explanation = self
                    .text_generator
                    .generate_explanation(&serde_json::json!({ "concept": concept }), "explain")
                    .await
                    .unwrap_or_else(|| format!("\"{concept}\" is a security concept I can't explain right now."));
                Ok(ChatResponse {
                    intent: "explain".to_string(),
                    message: explanation,
                    data: None,
                })
            }
            _ => {
                let agent_response = self.text_generator.agent_chat(message).await;
                Ok(ChatResponse {
                    intent: "general".to_string(),
                    message: agent_response.unwrap_or_else(help_message),
                    data: Some(serde_json::json!({ "suggested_actions": Vec::<String>::new() })),
                })
            }
        }
    }
}

fn param_str(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn extract_hash(text: &str) -> Option<String> {
    HASH_EXTRACT_RE.find(text).map(|m| m.as_str().to_string())
}

fn extract_address(text: &str) -> Option<String> {
    ADDRESS_EXTRACT_RE.find(text).map(|m| m.as_str().to_string())
}

fn help_message() -> String {
    "I'm Shield, your AI-powered crypto security guardian. Here's what I can help you with:\n\n\
     Analyze Transactions — paste any transaction hash and I'll break down exactly what it \
     does, flag risks, and tell you if it's safe.\n\
     Check Contracts — give me a contract address and I'll assess its trustworthiness and \
     identify red flags.\n\
     Generate Receipts — create shareable receipt cards for your transactions with cost \
     breakdowns and summaries.\n\
     Emergency Revoke — scan your wallet for dangerous token approvals and help you revoke \
     them before they drain your funds.\n\n\
     What would you like to do?"
        .to_string()
}

fn calculate_cost_breakdown(gas_price: u64, gas_used: u64, value_wei: &str, eth_price_usd: f64) -> CostBreakdown {
    let gas_cost_wei = gas_price as f64 * gas_used as f64;
    let gas_eth = gas_cost_wei / 1e18;
    let value_eth: f64 = value_wei.parse::<f64>().unwrap_or(0.0) / 1e18;
    let total_eth = gas_eth + value_eth;

    CostBreakdown {
        gas_eth: format!("{gas_eth:.6}"),
        gas_usd: format!("${:.2}", gas_eth * eth_price_usd),
        value_eth: format!("{value_eth:.6}"),
        value_usd: format!("${:.2}", value_eth * eth_price_usd),
        total_eth: format!("{total_eth:.6}"),
        total_usd: format!("${:.2}", total_eth * eth_price_usd),
    }
}

fn build_action_summary(events: &[ReceiptEvent], value: alloy_primitives::U256) -> String {
    let has_swap = events.iter().any(|e| e.name == "Swap");
    let transfers: Vec<&ReceiptEvent> = events.iter().filter(|e| e.name == "Transfer").collect();

    if has_swap && transfers.len() >= 2 {
        return "Token Swap".to_string();
    }
    if events.iter().any(|e| e.name == "Approval") {
        return "Token Approval".to_string();
    }
    if transfers.len() == 1 {
        return "Token Transfer".to_string();
    }
    if transfers.len() > 1 {
        return format!("Multi-Transfer ({} transfers)", transfers.len());
    }

    let value_eth: f64 = value.to_string().parse::<f64>().unwrap_or(0.0) / 1e18;
    if value_eth > 0.0 {
        format!("ETH Transfer ({value_eth:.4} ETH)")
    } else {
        "Contract Interaction".to_string()
    }
}

fn mock_receipt(tx_hash: &str, chain: Chain) -> ReceiptResponse {
    ReceiptResponse {
        tx_hash: tx_hash.to_string(),
        chain,
        action_summary: "Transaction".to_string(),
        events: vec![],
        cost_breakdown: Some(CostBreakdown {
            gas_eth: "0.000000".to_string(),
            gas_usd: "$0.00".to_string(),
            value_eth: "0.000000".to_string(),
            value_usd: "$0.00".to_string(),
            total_eth: "0.000000".to_string(),
            total_usd: "$0.00".to_string(),
        }),
        svg_card: String::new(),
        ai_summary: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_provider::testing::MockChainProvider;
    use crate::collaborators::stub::{
        StubAuthVerifier, StubEventLogger, StubIntentClassifier, StubReceiptRenderer, StubTextGenerator,
    };

    fn services() -> Services {
        Services::new(
            Arc::new(MockChainProvider::default()),
            Arc::new(StubIntentClassifier),
            Arc::new(StubTextGenerator),
            Arc::new(StubEventLogger),
            Arc::new(StubAuthVerifier),
            Arc::new(StubReceiptRenderer),
            3500.0,
        )
    }

    #[tokio::test]
    async fn chat_general_falls_back_to_help_message() {
        let svc = services();
        let response = svc.chat("hello there", Chain::Ethereum).await.unwrap();
        assert_eq!(response.intent, "general");
        assert!(response.message.contains("Shield"));
    }

    #[tokio::test]
    async fn chat_analyze_tx_without_hash_asks_for_input() {
        let svc = services();
        let response = svc.chat("can you check this transaction", Chain::Ethereum).await.unwrap();
        // StubIntentClassifier always returns "general"; extraction only
        // happens once a classifier actually yields analyze_tx, so this
        // exercises the general path's degrade, not the analyze_tx path.
        assert_eq!(response.intent, "general");
    }

    #[tokio::test]
    async fn shield_status_zero_risky_is_excellent() {
        let svc = services();
        let status = svc.shield_status("0xabc0000000000000000000000000000000000a").await.unwrap();
        assert_eq!(status.score, 95);
        assert_eq!(status.level, "excellent");
        assert_eq!(status.risky_approvals, 0);
    }

    #[test]
    fn extract_hash_finds_embedded_hash() {
        let text = format!("please check {}", "0x".to_string() + &"a".repeat(64));
        assert!(extract_hash(&text).is_some());
    }

    #[test]
    fn extract_address_finds_embedded_address() {
        let text = "revoke approvals for 0x1111111111111111111111111111111111111111 please";
        assert_eq!(extract_address(text).unwrap(), "0x1111111111111111111111111111111111111111");
    }

    #[test]
    fn action_summary_prefers_swap_over_transfer() {
        let events = vec![
            ReceiptEvent { name: "Swap".to_string(), address: String::new(), topics: vec![], data: "0x".to_string() },
            ReceiptEvent { name: "Transfer".to_string(), address: String::new(), topics: vec![], data: "0x".to_string() },
            ReceiptEvent { name: "Transfer".to_string(), address: String::new(), topics: vec![], data: "0x".to_string() },
        ];
        assert_eq!(build_action_summary(&events, alloy_primitives::U256::ZERO), "Token Swap");
    }

    #[test]
    fn action_summary_defaults_to_contract_interaction() {
        assert_eq!(build_action_summary(&[], alloy_primitives::U256::ZERO), "Contract Interaction");
    }
}
