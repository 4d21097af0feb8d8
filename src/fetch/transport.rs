//! HTTP transport abstraction
//!
//! The fetcher only needs "GET this URL and give me the body". Keeping that
//! behind a trait lets tests substitute canned responses.

use crate::error::{ScaffoldError, ScaffoldResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Largest response body accepted (template archives included)
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Minimal asynchronous HTTP GET
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, failing on transport errors and non-2xx statuses
    async fn get(&self, url: &str) -> ScaffoldResult<Vec<u8>>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body: u64,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(concat!("scaffold-cache/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            max_body: MAX_BODY_BYTES,
        }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn get(&self, url: &str) -> ScaffoldResult<Vec<u8>> {
        let agent = self.agent.clone();
        let owned_url = url.to_string();
        let limit = self.max_body;

        tokio::task::spawn_blocking(move || get_blocking(&agent, &owned_url, limit))
            .await
            .map_err(|e| ScaffoldError::Internal(format!("download task for {} failed: {}", url, e)))?
    }
}

fn get_blocking(agent: &ureq::Agent, url: &str, limit: u64) -> ScaffoldResult<Vec<u8>> {
    debug!("GET {}", url);

    let mut response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::StatusCode(status) => ScaffoldError::HttpStatus {
            url: url.to_string(),
            status,
        },
        other => ScaffoldError::transport(url, other.to_string()),
    })?;

    let body = response
        .body_mut()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| ScaffoldError::transport(url, format!("reading body: {}", e)))?;

    debug!("GET {} -> {} bytes", url, body.len());
    Ok(body)
}
