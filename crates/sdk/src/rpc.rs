//! Lightweight Sui JSON-RPC client
//!
//! Implements `ChainQuery` with a handful of JSON-RPC methods instead of a
//! full Sui SDK: view functions run through `sui_devInspectTransactionBlock`
//! with a hand-encoded transaction, objects and balances through
//! `sui_getObject` / `suix_getBalance`.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use biblestudy_types::{
    CLOCK_INITIAL_SHARED_VERSION, FN_GET_PROGRESS_FOR_WEEK, FN_GET_WEEKLY_PROGRESS,
    FN_HAS_CLAIMED_TODAY, GAS_COIN_TYPE, MODULE_NAME,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::bcs_tx::{CallArg, MoveCall};
use crate::client::{Address, ChainQuery};
use crate::error::{SdkError, SdkResult};

/// Ledger objects the view functions read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerObjects {
    pub package_id: Address,
    pub claims_id: Address,
    pub progress_registry_id: Address,
    pub clock_id: Address,
}

/// JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

/// JSON-RPC error structure
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Sui JSON-RPC client for the claim ledger
pub struct SuiRpcClient {
    url: String,
    agent: ureq::Agent,
    objects: LedgerObjects,
    shared_versions: RwLock<HashMap<Address, u64>>,
}

impl SuiRpcClient {
    pub fn new(url: String, objects: LedgerObjects, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(timeout)
            .build();

        Self {
            url,
            agent,
            objects,
            shared_versions: RwLock::new(HashMap::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn objects(&self) -> &LedgerObjects {
        &self.objects
    }

    /// Make a JSON-RPC call and return its `result`
    async fn call(&self, method: &str, params: Value) -> SdkResult<Value> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        debug!(method, "RPC call");

        // ureq is blocking
        let response_body = tokio::task::spawn_blocking({
            let agent = self.agent.clone();
            let url = self.url.clone();
            let body = request_body.to_string();

            move || {
                let response = agent
                    .post(&url)
                    .set("Content-Type", "application/json")
                    .send_string(&body)
                    .map_err(|e| e.to_string())?;
                response.into_string().map_err(|e| e.to_string())
            }
        })
        .await
        .map_err(|e| SdkError::RpcError(format!("RPC task failed: {}", e)))?
        .map_err(SdkError::RpcError)?;

        let rpc_response: RpcResponse = serde_json::from_str(&response_body)?;

        if let Some(error) = rpc_response.error {
            return Err(SdkError::RpcResponse {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| SdkError::UnexpectedResponse(format!("no result for {}", method)))
    }

    /// Immutable shared-object input, resolving and caching its initial version
    async fn shared_object(&self, id: Address) -> SdkResult<CallArg> {
        if id == self.objects.clock_id {
            return Ok(CallArg::shared(id, CLOCK_INITIAL_SHARED_VERSION));
        }

        let cached = self
            .shared_versions
            .read()
            .ok()
            .and_then(|versions| versions.get(&id).copied());
        if let Some(version) = cached {
            return Ok(CallArg::shared(id, version));
        }

        let result = self
            .call(
                "sui_getObject",
                json!([id.to_string(), { "showOwner": true }]),
            )
            .await?;
        let version = parse_initial_shared_version(&result)?;
        if let Ok(mut versions) = self.shared_versions.write() {
            versions.insert(id, version);
        }
        Ok(CallArg::shared(id, version))
    }

    /// Run a view function and return the BCS bytes of its first return value
    async fn dev_inspect(&self, sender: &Address, call: MoveCall) -> SdkResult<Option<Vec<u8>>> {
        let tx_bytes = base64::engine::general_purpose::STANDARD.encode(call.to_transaction_kind_bytes());
        let result = self
            .call(
                "sui_devInspectTransactionBlock",
                json!([sender.to_string(), tx_bytes]),
            )
            .await?;
        extract_return_bytes(&result)
    }

    fn view_call(&self, function: &str) -> MoveCall {
        MoveCall::new(self.objects.package_id, MODULE_NAME, function)
    }
}

#[async_trait]
impl ChainQuery for SuiRpcClient {
    async fn has_claimed_today(&self, identity: &Address) -> SdkResult<bool> {
        let call = self
            .view_call(FN_HAS_CLAIMED_TODAY)
            .arg(self.shared_object(self.objects.claims_id).await?)
            .arg(self.shared_object(self.objects.clock_id).await?)
            .arg(CallArg::address(identity));

        let bytes = self.dev_inspect(identity, call).await?;
        Ok(matches!(bytes.as_deref(), Some([1, ..])))
    }

    async fn get_weekly_progress(&self, identity: &Address) -> SdkResult<Vec<u8>> {
        let call = self
            .view_call(FN_GET_WEEKLY_PROGRESS)
            .arg(self.shared_object(self.objects.progress_registry_id).await?)
            .arg(CallArg::address(identity))
            .arg(self.shared_object(self.objects.clock_id).await?);

        Ok(self.dev_inspect(identity, call).await?.unwrap_or_default())
    }

    async fn get_progress_for_week(&self, identity: &Address, week: u64) -> SdkResult<Vec<u8>> {
        let call = self
            .view_call(FN_GET_PROGRESS_FOR_WEEK)
            .arg(self.shared_object(self.objects.progress_registry_id).await?)
            .arg(CallArg::address(identity))
            .arg(CallArg::u64(week));

        Ok(self.dev_inspect(identity, call).await?.unwrap_or_default())
    }

    async fn get_clock_time(&self) -> SdkResult<u64> {
        let result = self
            .call(
                "sui_getObject",
                json!([self.objects.clock_id.to_string(), { "showContent": true }]),
            )
            .await?;
        parse_clock_timestamp(&result)
    }

    async fn get_gas_balance(&self, identity: &Address) -> SdkResult<u64> {
        let result = self
            .call(
                "suix_getBalance",
                json!([identity.to_string(), GAS_COIN_TYPE]),
            )
            .await?;
        parse_total_balance(&result)
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Sui encodes 64-bit integers as decimal strings; accept plain numbers too
fn value_as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// BCS bytes of the first return value of the first command.
///
/// `None` when the call returned nothing; an execution error is an `Err`.
pub fn extract_return_bytes(result: &Value) -> SdkResult<Option<Vec<u8>>> {
    let execution_error = result
        .get("error")
        .or_else(|| result.pointer("/effects/status/error"))
        .and_then(Value::as_str);
    if let Some(error) = execution_error {
        return Err(SdkError::RpcError(format!("dev-inspect failed: {}", error)));
    }

    let Some(value) = result.pointer("/results/0/returnValues/0/0") else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .ok_or_else(|| SdkError::UnexpectedResponse("return value is not a byte array".to_string()))?;

    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|byte| u8::try_from(byte).ok())
                .ok_or_else(|| SdkError::UnexpectedResponse(format!("invalid byte {} in return value", item)))
        })
        .collect::<SdkResult<Vec<u8>>>()
        .map(Some)
}

pub fn parse_clock_timestamp(result: &Value) -> SdkResult<u64> {
    result
        .pointer("/data/content/fields/timestamp_ms")
        .and_then(value_as_u64)
        .ok_or_else(|| SdkError::UnexpectedResponse("clock object has no timestamp_ms".to_string()))
}

pub fn parse_initial_shared_version(result: &Value) -> SdkResult<u64> {
    result
        .pointer("/data/owner/Shared/initial_shared_version")
        .and_then(value_as_u64)
        .ok_or_else(|| SdkError::UnexpectedResponse("object is not shared".to_string()))
}

pub fn parse_total_balance(result: &Value) -> SdkResult<u64> {
    result
        .get("totalBalance")
        .and_then(value_as_u64)
        .ok_or_else(|| SdkError::UnexpectedResponse("balance has no totalBalance".to_string()))
}
