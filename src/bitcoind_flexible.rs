// Bitcoin RPC client adapter for hosted endpoints (QuickNode and friends)
// Plain HTTP + JSON-RPC 2.0, one endpoint active at a time

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bitcoincore_rpc::{Error as RpcError, RpcApi};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::core::record::BlockStatsRecord;
use crate::core::source::{ChainInfo, ChainStatsSource};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Deserialize, Debug)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorDetail>,
}

#[derive(Deserialize, Debug)]
struct JsonRpcErrorDetail {
    code: i32,
    message: String,
}

fn rpc_error(code: i32, message: impl Into<String>) -> RpcError {
    RpcError::JsonRpc(bitcoincore_rpc::jsonrpc::Error::Rpc(
        bitcoincore_rpc::jsonrpc::error::RpcError { code, message: message.into(), data: None },
    ))
}

/// One provider URL. Credentials embedded as `user:pass@` move into an
/// `Authorization` header.
#[derive(Clone)]
pub struct Endpoint {
    url: Url,
    auth: Option<String>,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut url = Url::parse(raw.trim()).map_err(|e| anyhow!("invalid endpoint URL: {e}"))?;
        if url.host_str().is_none() {
            bail!("endpoint URL has no host");
        }
        let auth = if url.username().is_empty() {
            None
        } else {
            let credentials = format!("{}:{}", url.username(), url.password().unwrap_or(""));
            let _ = url.set_username("");
            let _ = url.set_password(None);
            Some(format!("Basic {}", BASE64.encode(credentials.as_bytes())))
        };
        Ok(Self { url, auth })
    }

    /// Host only; provider tokens live in the path and must stay out of logs.
    pub fn label(&self) -> &str {
        self.url.host_str().unwrap_or("<unknown>")
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").field("host", &self.label()).finish_non_exhaustive()
    }
}

pub struct FlexibleBitcoindClient {
    endpoints: Vec<Endpoint>,
    active: AtomicUsize,
    client: reqwest::blocking::Client,
    request_id: AtomicU32,
}

impl FlexibleBitcoindClient {
    /// `start` picks the endpoint used for the first call.
    pub fn new(endpoints: &[String], start: usize, timeout: Duration) -> Result<Self> {
        if endpoints.is_empty() {
            bail!("at least one endpoint is required");
        }
        let endpoints = endpoints
            .iter()
            .enumerate()
            .map(|(i, raw)| Endpoint::parse(raw).map_err(|e| anyhow!("endpoint #{}: {e}", i + 1)))
            .collect::<Result<Vec<_>>>()?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        let start = start % endpoints.len();
        Ok(Self { endpoints, active: AtomicUsize::new(start), client, request_id: AtomicU32::new(1) })
    }

    pub fn active_endpoint(&self) -> &Endpoint {
        &self.endpoints[self.active.load(Ordering::SeqCst) % self.endpoints.len()]
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Moves subsequent calls to the next endpoint. The failed call itself
    /// is not repeated.
    fn rotate_from(&self, failed: usize) {
        if self.endpoints.len() < 2 {
            return;
        }
        let next = (failed + 1) % self.endpoints.len();
        if self
            .active
            .compare_exchange(failed, next, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            warn!(
                from = self.endpoints[failed].label(),
                to = self.endpoints[next].label(),
                "switching provider endpoint"
            );
        }
    }

    fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let idx = self.active.load(Ordering::SeqCst) % self.endpoints.len();
        let endpoint = &self.endpoints[idx];
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest { jsonrpc: "2.0", id, method, params };

        let mut req = self
            .client
            .post(endpoint.url.clone())
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(ref auth) = endpoint.auth {
            req = req.header("Authorization", auth);
        }

        let response = match req.send() {
            Ok(r) => r,
            Err(e) => {
                self.rotate_from(idx);
                return Err(rpc_error(-1, format!("HTTP request failed: {}", e.without_url())));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            // bitcoind answers RPC errors with 500 and a JSON body; keep those.
            if let Ok(JsonRpcResponse::<Value> { error: Some(error), .. }) = serde_json::from_str(&body) {
                return Err(rpc_error(error.code, error.message));
            }
            self.rotate_from(idx);
            return Err(rpc_error(status.as_u16() as i32, format!("HTTP {}: {}", status, body)));
        }

        let rpc_response: JsonRpcResponse<T> = response
            .json()
            .map_err(|e| rpc_error(-2, format!("Failed to parse JSON-RPC response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(rpc_error(error.code, error.message));
        }

        match rpc_response.result {
            Some(result) => Ok(result),
            // `"result": null` is a legitimate answer for some methods.
            None => serde_json::from_value(Value::Null)
                .map_err(|_| rpc_error(-3, "Missing result field in response")),
        }
    }
}

impl RpcApi for FlexibleBitcoindClient {
    fn call<T: for<'a> serde::de::Deserialize<'a>>(
        &self,
        cmd: &str,
        args: &[serde_json::Value],
    ) -> Result<T, RpcError> {
        self.rpc_call(cmd, args.to_vec())
    }
}

impl ChainStatsSource for FlexibleBitcoindClient {
    fn chain_info(&self) -> Result<ChainInfo> {
        self.call("getblockchaininfo", &[])
            .map_err(|e| anyhow!("getblockchaininfo via {}: {e}", self.active_endpoint().label()))
    }

    fn block_stats(&self, height: u64) -> Result<Option<BlockStatsRecord>> {
        let raw: Value = self
            .call("getblockstats", &[json!(height)])
            .map_err(|e| anyhow!("getblockstats({height}): {e}"))?;
        BlockStatsRecord::from_response(raw)
            .map_err(|e| anyhow!("getblockstats({height}) returned an unusable payload: {e}"))
    }
}
