use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::RpcConfig;
use crate::error::{ClientError, NetworkError};
use crate::logging::{ErrorLogger, LogContext, PerformanceMonitor};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A single attempt; failures surface immediately
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

impl From<&RpcConfig> for RetryConfig {
    fn from(config: &RpcConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay_ms: config.retry_delay_seconds * 1_000,
            max_delay_ms: config.max_retry_delay_seconds * 1_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Retry mechanism with exponential backoff and jitter
pub struct RetryManager {
    config: RetryConfig,
    operation_name: String,
}

impl RetryManager {
    pub fn new(operation_name: &str, config: RetryConfig) -> Self {
        Self {
            config,
            operation_name: operation_name.to_string(),
        }
    }

    /// Execute an operation, retrying recoverable failures
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let monitor = PerformanceMonitor::new(&format!("retry_{}", self.operation_name));
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        ErrorLogger::log_recovery_success(&self.operation_name, attempt, monitor.elapsed_ms());
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_recoverable() {
                        let context = LogContext::new("retry", &self.operation_name)
                            .with_retry_count(attempt)
                            .with_metadata("reason", serde_json::json!("non_recoverable"));
                        context.debug(&format!("Non-recoverable error, not retrying: {}", error));
                        return Err(error);
                    }

                    ErrorLogger::log_recovery_attempt(&error, attempt, max_attempts);

                    if attempt >= max_attempts {
                        last_error = Some(error);
                        break;
                    }

                    let delay = self.calculate_delay(attempt);
                    let context = LogContext::new("retry", &self.operation_name)
                        .with_retry_count(attempt)
                        .with_metadata("delay_ms", serde_json::json!(delay.as_millis() as u64))
                        .with_metadata("max_attempts", serde_json::json!(max_attempts));
                    context.info(&format!(
                        "Retrying in {}ms (attempt {} of {})",
                        delay.as_millis(),
                        attempt,
                        max_attempts
                    ));

                    sleep(delay).await;
                    last_error = Some(error);
                }
            }
        }

        let final_error = last_error.unwrap_or_else(|| {
            ClientError::Network(NetworkError::Transient("All retry attempts exhausted".to_string()))
        });

        let context = LogContext::new("retry", &self.operation_name)
            .with_metadata("max_attempts", serde_json::json!(max_attempts));
        context.error(&format!("All {} attempts failed: {}", max_attempts, final_error));

        Err(final_error)
    }

    /// Calculate delay for the given attempt number
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.config.initial_delay_ms as f64;
        let exponential_delay = base_delay * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let capped_delay = exponential_delay.min(self.config.max_delay_ms as f64);

        let final_delay = if self.config.jitter {
            let jitter_factor = 0.1; // 10% jitter
            let jitter = capped_delay * jitter_factor * (rand::random::<f64>() - 0.5);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, RpcError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_delay_ms, 1_000);
        assert!(config.jitter);

        let rpc = RpcConfig::default();
        let from_rpc = RetryConfig::from(&rpc);
        assert_eq!(from_rpc.max_attempts, rpc.max_retries);
        assert_eq!(from_rpc.initial_delay_ms, rpc.retry_delay_seconds * 1_000);
    }

    #[tokio::test]
    async fn test_retry_manager_success_on_first_attempt() {
        let retry_manager = RetryManager::new("test_operation", quick_config(3));
        let result = retry_manager.execute(|| async { Ok::<i32, ClientError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_manager_recovers_from_transient_errors() {
        let attempts = Arc::new(AtomicU32::new(0));
        let retry_manager = RetryManager::new("test_operation", quick_config(3));

        let result = retry_manager
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ClientError::Rpc(RpcError::Connection("refused".to_string())))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_manager_non_recoverable_error() {
        let attempts = Arc::new(AtomicU32::new(0));
        let retry_manager = RetryManager::new("test_operation", quick_config(3));

        let result = retry_manager
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, ClientError>(ClientError::Config(ConfigError::Parsing("bad".to_string())))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_manager_gives_up() {
        let retry_manager = RetryManager::new("test_operation", quick_config(2));
        let result = retry_manager
            .execute(|| async { Err::<i32, ClientError>(ClientError::Rpc(RpcError::Timeout { seconds: 1 })) })
            .await;
        assert!(matches!(result, Err(ClientError::Rpc(RpcError::Timeout { .. }))));
    }

    #[test]
    fn test_delay_calculation() {
        let retry_manager = RetryManager::new(
            "test",
            RetryConfig {
                max_attempts: 5,
                initial_delay_ms: 2_000,
                max_delay_ms: 30_000,
                backoff_multiplier: 2.0,
                jitter: false,
            },
        );

        assert_eq!(retry_manager.calculate_delay(1).as_millis(), 2_000);
        assert_eq!(retry_manager.calculate_delay(2).as_millis(), 4_000);
        assert_eq!(retry_manager.calculate_delay(3).as_millis(), 8_000);
        // 2s * 2^5 = 64s, capped at 30s
        assert_eq!(retry_manager.calculate_delay(6).as_millis(), 30_000);
    }
}
