//! C2: JSON-RPC chain provider.
//!
//! `ChainProvider` is the trait boundary so `Services` can substitute a
//! test double; `EvmJsonRpcProvider` is the production implementation,
//! grounded call-for-call on `original_source/.../chains/evm.py::EVMProvider`.
//! Outbound calls use a plain `reqwest::Client` POSTing a JSON-RPC 2.0
//! envelope.

use std::time::Duration;

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{ShieldError, ShieldResult};
use crate::types::{Address, ContractMetadata, LogEntry, Receipt, SimulationResult, TransactionData};

const PRIMARY_TIMEOUT: Duration = Duration::from_secs(15);
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// A single deduplicated ERC-20 `Approval` log, prior to scoring.
#[derive(Debug, Clone)]
pub struct RawApproval {
    pub token_address: Address,
    pub spender: Address,
    pub amount: U256,
    pub is_unlimited: bool,
}

/// Chain-evidence fetcher. Every method may suspend on I/O;
/// "not found" is a `None`/empty return, never an `Err`.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn get_transaction(&self, hash: &str) -> ShieldResult<Option<TransactionData>>;

    async fn simulate_transaction(
        &self,
        to: &str,
        data: &str,
        value: &str,
        from: Option<&str>,
    ) -> ShieldResult<SimulationResult>;

    async fn get_contract_metadata(&self, address: &str) -> ShieldResult<ContractMetadata>;

    async fn get_receipt(&self, hash: &str) -> ShieldResult<Option<Receipt>>;

    async fn get_block(&self, number: u64) -> ShieldResult<Option<Value>>;

    async fn scan_approval_logs(&self, owner: &str) -> ShieldResult<Vec<RawApproval>>;
}

/// Production `ChainProvider` backed by a JSON-RPC endpoint and (optionally)
/// a block-explorer REST API.
pub struct EvmJsonRpcProvider {
    rpc_url: String,
    explorer_base: String,
    explorer_api_key: Option<String>,
    primary_client: reqwest::Client,
    metadata_client: reqwest::Client,
}

impl EvmJsonRpcProvider {
    pub fn new(rpc_url: String, explorer_api_key: Option<String>) -> Self {
        Self {
            rpc_url,
            explorer_base: "https://api.etherscan.io/api".to_string(),
            explorer_api_key,
            primary_client: reqwest::Client::builder()
                .timeout(PRIMARY_TIMEOUT)
                .build()
                .expect("reqwest client"),
            metadata_client: reqwest::Client::builder()
                .timeout(METADATA_TIMEOUT)
                .build()
                .expect("reqwest client"),
        }
    }

    async fn rpc(&self, client: &reqwest::Client, method: &str, params: Value) -> ShieldResult<Value> {
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
        let resp = client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ShieldError::Network(e.to_string()))?;
        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| ShieldError::Network(format!("invalid RPC response: {e}")))?;
        if let Some(err) = parsed.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("RPC error")
                .to_string();
            return Err(ShieldError::Rpc(message));
        }
        Ok(parsed.get("result").cloned().unwrap_or(Value::Null))
    }

    fn hex_to_u64(v: &Value) -> u64 {
        v.as_str()
            .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            .unwrap_or(0)
    }

    fn hex_to_u256(v: &Value) -> U256 {
        v.as_str()
            .and_then(|s| U256::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            .unwrap_or(U256::ZERO)
    }
}

#[async_trait]
impl ChainProvider for EvmJsonRpcProvider {
    async fn get_transaction(&self, hash: &str) -> ShieldResult<Option<TransactionData>> {
        let raw = self
            .rpc(&self.primary_client, "eth_getTransactionByHash", json!([hash]))
            .await?;
        if raw.is_null() {
            return Ok(None);
        }

        let from = raw
            .get("from")
            .and_then(|v| v.as_str())
            .and_then(|s| Address::parse(s).ok());
        let to = raw
            .get("to")
            .and_then(|v| v.as_str())
            .and_then(|s| Address::parse(s).ok());
        let block_number = raw
            .get("blockNumber")
            .filter(|v| !v.is_null())
            .map(Self::hex_to_u64);

        Ok(Some(TransactionData {
            hash: raw.get("hash").and_then(|v| v.as_str()).map(str::to_string),
            from,
            to,
            value: raw.get("value").map(Self::hex_to_u256).unwrap_or(U256::ZERO),
            input: raw
                .get("input")
                .and_then(|v| v.as_str())
                .unwrap_or("0x")
                .to_string(),
            gas: raw.get("gas").map(Self::hex_to_u64).unwrap_or(0),
            gas_price: raw.get("gasPrice").map(Self::hex_to_u64).unwrap_or(0),
            nonce: raw.get("nonce").map(Self::hex_to_u64).unwrap_or(0),
            block_number,
            status: None,
        }))
    }

    async fn simulate_transaction(
        &self,
        to: &str,
        data: &str,
        value: &str,
        from: Option<&str>,
    ) -> ShieldResult<SimulationResult> {
        let mut call_obj = json!({"to": to, "data": data});
        if let Some(from) = from {
            call_obj["from"] = json!(from);
        }
        if value != "0" && !value.is_empty() {
            if let Ok(v) = U256::from_str_radix(value, 10) {
                call_obj["value"] = json!(format!("0x{:x}", v));
            }
        }

        let call_result = self
            .rpc(&self.primary_client, "eth_call", json!([call_obj, "latest"]))
            .await;
        let call_result = match call_result {
            Ok(r) => r,
            Err(e) => {
                return Ok(SimulationResult {
                    success: false,
                    gas_used: 0,
                    return_data: None,
                    error: Some(e.to_string()),
                })
            }
        };

        let gas_result = self
            .rpc(&self.primary_client, "eth_estimateGas", json!([call_obj]))
            .await;
        match gas_result {
            Ok(gas) => Ok(SimulationResult {
                success: true,
                gas_used: Self::hex_to_u64(&gas),
                return_data: call_result.as_str().map(str::to_string),
                error: None,
            }),
            Err(e) => Ok(SimulationResult {
                success: false,
                gas_used: 0,
                return_data: None,
                error: Some(e.to_string()),
            }),
        }
    }

    async fn get_contract_metadata(&self, address: &str) -> ShieldResult<ContractMetadata> {
        let address = address.to_lowercase();

        let (code, balance, nonce) = tokio::try_join!(
            self.rpc(&self.metadata_client, "eth_getCode", json!([address, "latest"])),
            self.rpc(&self.metadata_client, "eth_getBalance", json!([address, "latest"])),
            self.rpc(
                &self.metadata_client,
                "eth_getTransactionCount",
                json!([address, "latest"])
            ),
        )?;

        let bytecode = code.as_str().unwrap_or("0x").to_string();
        let has_code = !matches!(bytecode.as_str(), "0x" | "0x0" | "");

        let mut meta = ContractMetadata {
            has_code,
            balance_wei: Self::hex_to_u256(&balance),
            tx_count: Self::hex_to_u64(&nonce),
            bytecode,
            ..Default::default()
        };

        if let Some(key) = &self.explorer_api_key {
            self.enrich_from_explorer(&address, key, &mut meta).await;
        }

        Ok(meta)
    }

    async fn get_receipt(&self, hash: &str) -> ShieldResult<Option<Receipt>> {
        let raw = self
            .rpc(&self.primary_client, "eth_getTransactionReceipt", json!([hash]))
            .await?;
        if raw.is_null() {
            return Ok(None);
        }

        let logs = raw
            .get("logs")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|log| {
                        let address = Address::parse(log.get("address")?.as_str()?).ok()?;
                        let topics = log
                            .get("topics")
                            .and_then(|t| t.as_array())
                            .map(|arr| {
                                arr.iter()
                                    .filter_map(|t| t.as_str().map(str::to_string))
                                    .collect()
                            })
                            .unwrap_or_default();
                        let data = log.get("data").and_then(|d| d.as_str()).unwrap_or("0x").to_string();
                        Some(LogEntry { address, topics, data })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(Receipt {
            gas_used: raw.get("gasUsed").map(Self::hex_to_u64).unwrap_or(0),
            status: raw.get("status").map(Self::hex_to_u64),
            logs,
        }))
    }

    async fn get_block(&self, number: u64) -> ShieldResult<Option<Value>> {
        let hex_block = format!("0x{number:x}");
        let raw = self
            .rpc(
                &self.primary_client,
                "eth_getBlockByNumber",
                json!([hex_block, false]),
            )
            .await?;
        if raw.is_null() {
            Ok(None)
        } else {
            Ok(Some(raw))
        }
    }

    async fn scan_approval_logs(&self, owner: &str) -> ShieldResult<Vec<RawApproval>> {
        let Some(key) = &self.explorer_api_key else {
            return Ok(Vec::new());
        };

        let approval_topic = "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925";
        let padded_owner = format!("0x{:0>64}", owner.trim_start_matches("0x").to_lowercase());

        let client = reqwest::Client::builder()
            .timeout(PRIMARY_TIMEOUT)
            .build()
            .map_err(|e| ShieldError::Network(e.to_string()))?;
        let resp = client
            .get(&self.explorer_base)
            .query(&[
                ("module", "logs"),
                ("action", "getLogs"),
                ("fromBlock", "0"),
                ("toBlock", "latest"),
                ("topic0", approval_topic),
                ("topic1", &padded_owner),
                ("apikey", key),
            ])
            .send()
            .await
            .map_err(|e| ShieldError::Network(e.to_string()))?;
        let data: Value = resp
            .json()
            .await
            .map_err(|e| ShieldError::Network(format!("invalid explorer response: {e}")))?;

        if data.get("status").and_then(|s| s.as_str()) != Some("1") {
            return Ok(Vec::new());
        }

        Ok(dedup_approval_logs(data.get("result")))
    }
}

/// Reduces a raw explorer `getLogs` result array of Approval events down to
/// one entry per `(token, spender)`. Logs arrive oldest-first; later events
/// for the same pair supersede earlier ones, including a zero-amount revoke
/// superseding an earlier nonzero approval and vice versa.
fn dedup_approval_logs(result: Option<&Value>) -> Vec<RawApproval> {
    let mut latest: std::collections::HashMap<(String, String), Option<RawApproval>> =
        std::collections::HashMap::new();
    let mut order: Vec<(String, String)> = Vec::new();
    let threshold = U256::from(2u8).pow(U256::from(255u8));

    for log in result.and_then(|r| r.as_array()).into_iter().flatten() {
        let Some(token_str) = log.get("address").and_then(|a| a.as_str()) else {
            continue;
        };
        let Ok(token) = Address::parse(token_str) else {
            continue;
        };
        let topics: Vec<&str> = log
            .get("topics")
            .and_then(|t| t.as_array())
            .map(|arr| arr.iter().filter_map(|t| t.as_str()).collect())
            .unwrap_or_default();
        if topics.len() <= 2 {
            continue;
        }
        let spender_hex = format!("0x{}", &topics[2][topics[2].len().saturating_sub(40)..]);
        let Ok(spender) = Address::parse(&spender_hex) else {
            continue;
        };

        let key = (token.as_str().to_string(), spender.as_str().to_string());
        if !latest.contains_key(&key) {
            order.push(key.clone());
        }

        let amount_hex = log.get("data").and_then(|d| d.as_str()).unwrap_or("0x0");
        let amount = U256::from_str_radix(amount_hex.trim_start_matches("0x"), 16).unwrap_or(U256::ZERO);

        if amount.is_zero() {
            latest.insert(key, None); // already revoked as of this log
        } else {
            latest.insert(
                key,
                Some(RawApproval {
                    token_address: token,
                    spender,
                    amount,
                    is_unlimited: amount > threshold,
                }),
            );
        }
    }

    order.into_iter().filter_map(|key| latest.remove(&key).flatten()).collect()
}

impl EvmJsonRpcProvider {
    async fn enrich_from_explorer(&self, address: &str, api_key: &str, meta: &mut ContractMetadata) {
        let client = match reqwest::Client::builder().timeout(METADATA_TIMEOUT).build() {
            Ok(c) => c,
            Err(_) => return,
        };

        match client
            .get(&self.explorer_base)
            .query(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address),
                ("apikey", api_key),
            ])
            .send()
            .await
        {
            Ok(resp) => {
                if let Ok(data) = resp.json::<Value>().await {
                    if data.get("status").and_then(|s| s.as_str()) == Some("1") {
                        if let Some(entry) = data.get("result").and_then(|r| r.as_array()).and_then(|a| a.first())
                        {
                            let abi = entry.get("ABI").and_then(|v| v.as_str()).unwrap_or("");
                            meta.is_verified = abi != "Contract source code not verified";
                            meta.contract_name = entry
                                .get("ContractName")
                                .and_then(|v| v.as_str())
                                .filter(|s| !s.is_empty())
                                .map(str::to_string);
                            meta.source_code = entry
                                .get("SourceCode")
                                .and_then(|v| v.as_str())
                                .filter(|s| !s.is_empty())
                                .map(str::to_string);
                        }
                    }
                }
            }
            Err(e) => tracing::debug!(%address, error = %e, "explorer source-code check failed"),
        }

        match client
            .get(&self.explorer_base)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", "1"),
                ("sort", "asc"),
                ("apikey", api_key),
            ])
            .send()
            .await
        {
            Ok(resp) => {
                if let Ok(data) = resp.json::<Value>().await {
                    if data.get("status").and_then(|s| s.as_str()) == Some("1") {
                        if let Some(first) = data.get("result").and_then(|r| r.as_array()).and_then(|a| a.first())
                        {
                            let first_ts: i64 = first
                                .get("timeStamp")
                                .and_then(|v| v.as_str())
                                .and_then(|s| s.parse().ok())
                                .unwrap_or(0);
                            if first_ts > 0 {
                                let now = chrono::Utc::now().timestamp();
                                meta.age_days = Some((now - first_ts) / 86_400);
                            }
                        }
                    }
                }
            }
            Err(e) => tracing::debug!(%address, error = %e, "explorer age check failed"),
        }
    }
}

/// In-memory `ChainProvider` double used by analyzer tests: analyzers must
/// be testable via substitution, not real RPC.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockChainProvider {
        pub transactions: Mutex<HashMap<String, TransactionData>>,
        pub metadata: Mutex<HashMap<String, ContractMetadata>>,
        pub approvals: Mutex<Vec<RawApproval>>,
        pub simulation: Mutex<Option<SimulationResult>>,
    }

    #[async_trait]
    impl ChainProvider for MockChainProvider {
        async fn get_transaction(&self, hash: &str) -> ShieldResult<Option<TransactionData>> {
            Ok(self.transactions.lock().unwrap().get(hash).cloned())
        }

        async fn simulate_transaction(
            &self,
            _to: &str,
            _data: &str,
            _value: &str,
            _from: Option<&str>,
        ) -> ShieldResult<SimulationResult> {
            Ok(self.simulation.lock().unwrap().clone().unwrap_or(SimulationResult {
                success: true,
                gas_used: 21_000,
                return_data: None,
                error: None,
            }))
        }

        async fn get_contract_metadata(&self, address: &str) -> ShieldResult<ContractMetadata> {
            Ok(self
                .metadata
                .lock()
                .unwrap()
                .get(&address.to_lowercase())
                .cloned()
                .unwrap_or_default())
        }

        async fn get_receipt(&self, _hash: &str) -> ShieldResult<Option<Receipt>> {
            Ok(None)
        }

        async fn get_block(&self, _number: u64) -> ShieldResult<Option<Value>> {
            Ok(None)
        }

        async fn scan_approval_logs(&self, _owner: &str) -> ShieldResult<Vec<RawApproval>> {
            Ok(self.approvals.lock().unwrap().clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockChainProvider;
    use super::*;

    #[tokio::test]
    async fn mock_provider_returns_configured_transaction() {
        let provider = MockChainProvider::default();
        provider.transactions.lock().unwrap().insert(
            "0xabc".to_string(),
            TransactionData {
                hash: Some("0xabc".to_string()),
                from: None,
                to: None,
                value: U256::ZERO,
                input: "0x".to_string(),
                gas: 0,
                gas_price: 0,
                nonce: 0,
                block_number: None,
                status: None,
            },
        );
        let tx = provider.get_transaction("0xabc").await.unwrap();
        assert!(tx.is_some());
    }

    /// Scenario E: a later zero-amount revoke log for the same (token,
    /// spender) supersedes an earlier unlimited-approval log — and, tested
    /// here in the opposite order, a later unlimited-approval log
    /// supersedes an earlier revoke.
    #[test]
    fn dedup_approval_logs_keeps_latest_per_spender() {
        let spender_topic = format!("0x{:0>64}", "1111111111111111111111111111111111111111");
        let owner_topic = format!("0x{:0>64}", "2222222222222222222222222222222222222222");
        let result = json!([
            {
                "address": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                "topics": [
                    "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925",
                    owner_topic,
                    spender_topic,
                ],
                "data": format!("0x{}", "0".repeat(64)),
            },
            {
                "address": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                "topics": [
                    "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925",
                    owner_topic,
                    spender_topic,
                ],
                "data": format!("0x{}", "f".repeat(64)),
            },
        ]);

        let approvals = dedup_approval_logs(Some(&result));
        assert_eq!(approvals.len(), 1);
        assert!(approvals[0].is_unlimited);
        assert_eq!(approvals[0].spender.as_str(), "0x1111111111111111111111111111111111111111");
    }
}
