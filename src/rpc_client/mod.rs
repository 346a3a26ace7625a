use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tryhard::RetryPolicy;

mod chain;
mod contract;
mod events;
#[cfg(test)]
pub(crate) mod test_server;

const BACKOFF_BASE: Duration = Duration::from_millis(200);
const BACKOFF_MAX: Duration = Duration::from_secs(5);

pub use chain::BlockHeader;
pub use events::EventFilter;

/// Starknet JSON-RPC client. Transport failures are retried with exponential
/// backoff. JSON-RPC error replies are returned as is.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    retries: u32,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration, retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
            retries,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "sending rpc request");

        let response = tryhard::retry_fn(|| self.send(&body))
            .retries(self.retries)
            .custom_backoff(|attempt, error: &reqwest::Error| {
                if is_transient(error) {
                    RetryPolicy::Delay(backoff_delay(attempt))
                } else {
                    RetryPolicy::Break
                }
            })
            .on_retry(|attempt, _, error: &reqwest::Error| {
                tracing::warn!("rpc request `{method}` failed (attempt {attempt}): {error}");
                std::future::ready(())
            })
            .await
            .map_err(|e| RpcError::Transport(method.to_string(), e))?;

        response.into_result(method)
    }

    async fn send(&self, body: &Value) -> Result<JsonRpcResponse, reqwest::Error> {
        self.http
            .post(&self.url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Connection failures, timeouts and 5xx replies are worth another attempt.
/// Anything else (4xx, undecodable bodies) fails immediately.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect()
        || error.is_timeout()
        || error.status().map_or(false, |status| status.is_server_error())
}

fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    BACKOFF_BASE.saturating_mul(factor).min(BACKOFF_MAX)
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn into_result<R: DeserializeOwned>(self, method: &str) -> Result<R, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: match error.data {
                    Some(data) => format!("{}: {data}", error.message),
                    None => error.message,
                },
            });
        }

        let result = self
            .result
            .ok_or_else(|| RpcError::MissingResult(method.to_string()))?;
        serde_json::from_value(result).map_err(|e| RpcError::Decode(method.to_string(), e))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("Request `{0}` failed: {1}")]
    Transport(String, #[source] reqwest::Error),
    #[error("Node rejected `{method}` with code {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    #[error("Response to `{0}` has neither result nor error")]
    MissingResult(String),
    #[error("Failed to decode `{0}` response: {1}")]
    Decode(String, #[source] serde_json::Error),
}
