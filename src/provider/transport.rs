use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RpcConfig;
use crate::error::{ClientError, ConfigError, Result, RpcError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::retry::{RetryConfig, RetryManager};

/// Anything that can carry a JSON-RPC call to a node.
#[async_trait]
pub trait JsonRpcSender: Send + Sync {
    /// `params` is the positional parameter array.
    async fn send(&self, method: &str, params: Value) -> Result<Value>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
    #[serde(default)]
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    next_id: AtomicU64,
    retry: RetryConfig,
}

impl HttpTransport {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let context = LogContext::new("transport", "initialization")
            .with_metadata("endpoint", serde_json::json!(config.endpoint))
            .with_metadata("timeout_seconds", serde_json::json!(config.timeout_seconds));
        context.info("Initializing HTTP transport");

        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(config.endpoint.clone()).into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(RpcError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout_seconds: config.timeout_seconds,
            next_id: AtomicU64::new(1),
            retry: RetryConfig::from(config),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, method: &str, params: &Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        LogContext::new("transport", "request")
            .with_metadata("method", serde_json::json!(method))
            .with_metadata("id", serde_json::json!(id))
            .trace(&format!("Sending RPC request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcError::RateLimit { seconds: 60 }.into());
        }
        if !status.is_success() {
            let error_msg = format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
            return Err(RpcError::Connection(error_msg).into());
        }

        let rpc_response: JsonRpcResponse = response.json().await.map_err(RpcError::Http)?;

        if let Some(error) = rpc_response.error {
            let rpc_error = match error.code {
                -32700 => RpcError::InvalidResponse("Parse error".to_string()),
                -32600 => RpcError::InvalidResponse("Invalid request".to_string()),
                -32602 => RpcError::InvalidResponse(format!("Invalid params: {}", error.message)),
                code => RpcError::Method {
                    code,
                    message: error.message,
                },
            };
            return Err(rpc_error.into());
        }

        if rpc_response.id.map_or(false, |echoed| echoed != id) {
            LogContext::new("transport", "request")
                .with_metadata("method", serde_json::json!(method))
                .with_metadata("id", serde_json::json!(id))
                .warn("Response id does not match request id");
        }

        // A null result is a legitimate answer, e.g. an unknown receipt
        Ok(rpc_response.result.unwrap_or(Value::Null))
    }

    fn classify(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            RpcError::Timeout {
                seconds: self.timeout_seconds,
            }
            .into()
        } else if e.is_connect() {
            RpcError::Connection(e.to_string()).into()
        } else {
            RpcError::Http(e).into()
        }
    }
}

#[async_trait]
impl JsonRpcSender for HttpTransport {
    async fn send(&self, method: &str, params: Value) -> Result<Value> {
        let params = &params;
        RetryManager::new(method, self.retry.clone())
            .execute(move || async move {
                let monitor = PerformanceMonitor::new("rpc_request")
                    .with_metadata("method", serde_json::json!(method));
                let result = self.request(method, params).await;
                let duration = monitor.finish_with_result(&result);
                MetricsLogger::log_rpc_call(method, duration, result.is_ok());
                result
            })
            .await
    }
}
