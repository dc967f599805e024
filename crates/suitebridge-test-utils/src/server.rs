//! Test server plumbing: unique ports and a readiness-polling client.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum TestServerError {
    #[error("server startup timeout")]
    StartupTimeout,
    #[error("health check failed: {0}")]
    HealthCheckFailed(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

static PORT_COUNTER: AtomicU16 = AtomicU16::new(51100);

/// A unique port for this process, so parallel test binaries never collide.
pub fn get_test_port() -> u16 {
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub host: String,
    pub port: u16,
    pub startup_timeout_secs: u64,
    pub health_check_interval_ms: u64,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: get_test_port(),
            startup_timeout_secs: 10,
            health_check_interval_ms: 50,
        }
    }
}

impl TestServerConfig {
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port).parse().expect("invalid test server address")
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Poll `{base_url}/health` until it answers 2xx or `timeout_secs` elapses.
pub async fn wait_for_health(base_url: &str, timeout_secs: u64, interval_ms: u64) -> Result<(), TestServerError> {
    let client = reqwest::Client::new();
    let health_url = format!("{base_url}/health");

    let result = timeout(Duration::from_secs(timeout_secs), async {
        loop {
            match client.get(&health_url).send().await {
                Ok(response) if response.status().is_success() => return,
                Ok(response) => tracing::debug!(status = %response.status(), "stub server not healthy yet"),
                Err(e) => tracing::debug!(error = %e, "stub server health check failed"),
            }
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
    })
    .await;

    result.ok_or(TestServerError::StartupTimeout)
}

pub async fn is_healthy(base_url: &str) -> bool {
    let client = reqwest::Client::new();
    match client.get(format!("{base_url}/health")).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// A thin REST client for asserting against the stub server in tests.
pub struct TestHttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestHttpClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build test http client"),
            base_url: base_url.to_string(),
        }
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response, TestServerError> {
        let url = format!("{}{path}", self.base_url);
        self.client.get(&url).send().await.map_err(|e| TestServerError::RequestFailed(e.to_string()))
    }

    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, TestServerError> {
        let response = self.get(path).await?;
        response.json().await.map_err(|e| TestServerError::InvalidResponse(e.to_string()))
    }

    pub async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response, TestServerError> {
        let url = format!("{}{path}", self.base_url);
        self.client.post(&url).json(body).send().await.map_err(|e| TestServerError::RequestFailed(e.to_string()))
    }

    pub async fn post_json<T: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, TestServerError> {
        let response = self.post(path, body).await?;
        response.json().await.map_err(|e| TestServerError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_test_port_is_unique_per_call() {
        let a = get_test_port();
        let b = get_test_port();
        let c = get_test_port();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn default_config_has_a_high_port_and_local_host() {
        let config = TestServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.port >= 51100);
        assert_eq!(config.startup_timeout_secs, 10);
    }

    #[test]
    fn base_url_is_http_host_port() {
        let mut config = TestServerConfig::default();
        config.port = 4000;
        assert_eq!(config.base_url(), "http://127.0.0.1:4000");
    }
}
