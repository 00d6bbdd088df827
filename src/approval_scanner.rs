//! C7: approval scanner and revoke-calldata generation.
//!
//! Grounded on `original_source/.../revoke/scanner.py`.

use std::sync::Arc;

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};

use crate::chain_provider::ChainProvider;
use crate::error::ShieldResult;
use crate::registry;
use crate::types::{Address, Approval, RevokeTransaction, Signals};

sol! {
    function approve(address spender, uint256 amount) external returns (bool);
}

pub struct ApprovalScanner {
    chain: Arc<dyn ChainProvider>,
}

impl ApprovalScanner {
    pub fn new(chain: Arc<dyn ChainProvider>) -> Self {
        Self { chain }
    }

    /// Scans and scores every outstanding approval for `owner`, sorted
    /// descending by risk score.
    pub async fn scan(&self, owner: &str) -> ShieldResult<Vec<Approval>> {
        let raw = self.chain.scan_approval_logs(owner).await.unwrap_or_default();

        let mut approvals: Vec<Approval> = raw
            .into_iter()
            .map(|r| {
                let spender_info = registry::lookup_contract(r.spender.as_str());
                let signals = Signals {
                    is_known_scam: registry::is_known_scam(r.spender.as_str()),
                    unlimited_approval: r.is_unlimited,
                    trusted_contract: spender_info.map(|c| c.trusted).unwrap_or(false),
                    verified_contract: spender_info.is_some(),
                    ..Signals::default()
                };
                let risk_score = crate::scoring::calculate_risk(&signals);

                Approval {
                    token_name: registry::lookup_contract(r.token_address.as_str())
                        .map(|c| c.name.to_string())
                        .unwrap_or_else(|| "Unknown Token".to_string()),
                    spender_name: spender_info.map(|c| c.name.to_string()),
                    token_address: r.token_address,
                    spender: r.spender,
                    amount: r.amount,
                    is_unlimited: r.is_unlimited,
                    risk_score,
                }
            })
            .collect();

        approvals.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
        Ok(approvals)
    }

    /// Filters `approvals` down to those at or above `threshold`.
    pub fn risky(approvals: &[Approval], threshold: u8) -> Vec<&Approval> {
        approvals.iter().filter(|a| a.risk_score >= threshold).collect()
    }

    /// Builds the `approve(spender, 0)` revoke transaction for a single
    /// approval: a 4-byte selector plus two ABI-encoded
    /// 32-byte words, 68 bytes total.
    pub fn build_revoke(approval: &Approval) -> RevokeTransaction {
        let call = approveCall {
            spender: approval.spender.to_alloy(),
            amount: U256::ZERO,
        };
        let calldata = call.abi_encode();

        RevokeTransaction {
            to: approval.token_address.clone(),
            data: format!("0x{}", hex::encode(calldata)),
            description: format!(
                "Revoke {} approval for {}",
                approval.token_name,
                approval.spender_name.clone().unwrap_or_else(|| approval.spender.to_string())
            ),
        }
    }

    /// Placeholder at-risk USD estimate: `risky.len()
    /// * 1000`, never a priced figure — no live price feed in this core.
    pub fn at_risk_usd_estimate(risky: &[&Approval]) -> String {
        format!("${}", risky.len() * 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_provider::{testing::MockChainProvider, RawApproval};

    #[tokio::test]
    async fn scan_sorts_descending_by_risk() {
        let provider = MockChainProvider::default();
        provider.approvals.lock().unwrap().extend(vec![
            RawApproval {
                // WETH, trusted
                token_address: Address::parse("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap(),
                // Uniswap router, trusted
                spender: Address::parse("0x7a250d5630b4cf539739df2c5dacb4c659f2488d").unwrap(),
                amount: U256::from(100u64),
                is_unlimited: false,
            },
            RawApproval {
                token_address: Address::parse("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap(),
                // scam
                spender: Address::parse("0xbad00000000000000000000000000000000bad01").unwrap(),
                amount: U256::MAX,
                is_unlimited: true,
            },
        ]);

        let scanner = ApprovalScanner::new(Arc::new(provider));
        let approvals = scanner.scan("0xowner").await.unwrap();
        assert_eq!(approvals.len(), 2);
        assert!(approvals[0].risk_score >= approvals[1].risk_score);
        assert!(approvals[0].is_unlimited);
    }

    #[test]
    fn risky_filters_by_threshold() {
        let approvals = vec![
            Approval {
                token_address: Address::parse("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap(),
                token_name: "WETH".to_string(),
                spender: Address::parse("0x1111111111111111111111111111111111111111").unwrap(),
                spender_name: None,
                amount: U256::from(1u64),
                is_unlimited: false,
                risk_score: 10,
            },
            Approval {
                token_address: Address::parse("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap(),
                token_name: "WETH".to_string(),
                spender: Address::parse("0x2222222222222222222222222222222222222222").unwrap(),
                spender_name: None,
                amount: U256::MAX,
                is_unlimited: true,
                risk_score: 80,
            },
        ];
        let risky = ApprovalScanner::risky(&approvals, 30);
        assert_eq!(risky.len(), 1);
        assert_eq!(risky[0].risk_score, 80);
    }

    #[test]
    fn build_revoke_produces_68_byte_calldata_with_zero_amount() {
        let approval = Approval {
            token_address: Address::parse("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap(),
            token_name: "WETH".to_string(),
            spender: Address::parse("0x1111111111111111111111111111111111111111").unwrap(),
            spender_name: Some("Sketchy Router".to_string()),
            amount: U256::MAX,
            is_unlimited: true,
            risk_score: 90,
        };
        let revoke = ApprovalScanner::build_revoke(&approval);
        assert_eq!(revoke.to.as_str(), "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        assert!(revoke.data.starts_with("0x095ea7b3"));
        // 4-byte selector + 64 bytes of params = 68 bytes = 136 hex chars + "0x".
        assert_eq!(revoke.data.len(), 2 + 136);
        // Trailing 32-byte amount word is all zero.
        assert!(revoke.data.ends_with(&"0".repeat(64)));
        assert!(revoke.description.contains("Sketchy Router"));
    }

    #[test]
    fn at_risk_estimate_is_thousand_per_risky_approval() {
        let a = Approval {
            token_address: Address::parse("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap(),
            token_name: "WETH".to_string(),
            spender: Address::parse("0x1111111111111111111111111111111111111111").unwrap(),
            spender_name: None,
            amount: U256::MAX,
            is_unlimited: true,
            risk_score: 90,
        };
        let risky = vec![&a, &a];
        assert_eq!(ApprovalScanner::at_risk_usd_estimate(&risky), "$2000");
    }
}
