//! HTTP connection pool and CDN warm-up
//!
//! A [`ConnectionPoolManager`] owns the pooled client every SDK request goes
//! through. Warming up opens connections to the CDN hosts of the upcoming
//! media before the player needs them, so the first segment requests skip
//! the TCP and TLS handshakes.

use crate::config::ConnectionPoolConfig;
use crate::error::Result;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Outcome of one warm-up run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmUpReport {
    /// Requests sent
    pub attempted: usize,
    /// Requests that got a response
    pub succeeded: usize,
    pub failed: usize,
    /// Requests still pending at the deadline
    pub timed_out: usize,
}

/// Owner of the SDK's pooled HTTP client
#[derive(Debug, Clone)]
pub struct ConnectionPoolManager {
    config: ConnectionPoolConfig,
    client: Client,
}

impl ConnectionPoolManager {
    pub fn new(config: ConnectionPoolConfig) -> Result<Self> {
        config.validate()?;
        let client = client_builder(&config).redirect(Policy::none()).build()?;

        debug!(
            max_idle = config.max_idle_connections,
            keep_alive_secs = config.keep_alive_secs,
            "Connection pool created"
        );
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ConnectionPoolConfig {
        &self.config
    }

    /// Shared pooled client; redirects are not followed
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Client with the same pool settings that follows redirects
    pub fn redirecting_client(&self) -> Result<Client> {
        Ok(client_builder(&self.config).build()?)
    }

    /// Warm-up URL for a host
    pub fn warmup_url(&self, host: &str) -> String {
        format!("https://{}{}", host, self.config.warmup_path)
    }

    /// Open connections to each host
    ///
    /// Sends `warmup_times` requests per host and waits until all of them
    /// finish or the warm-up deadline passes. Failures are only counted.
    #[instrument(skip(self))]
    pub async fn warm_up(&self, hosts: &[String]) -> WarmUpReport {
        let mut report = WarmUpReport::default();
        if hosts.is_empty() {
            return report;
        }

        let mut requests = JoinSet::new();
        for host in hosts {
            let url = self.warmup_url(host);
            for _ in 0..self.config.warmup_times {
                let client = self.client.clone();
                let url = url.clone();
                let max_drain_bytes = self.config.max_drain_bytes;
                requests.spawn(async move {
                    let result = warm_up_once(&client, &url, max_drain_bytes).await;
                    if let Err(ref e) = result {
                        debug!(url = %url, error = %e, "Warm-up request failed");
                    }
                    result.is_ok()
                });
                report.attempted += 1;
            }
        }

        let deadline = Instant::now() + self.config.warmup_timeout();
        loop {
            match tokio::time::timeout_at(deadline, requests.join_next()).await {
                Ok(Some(Ok(true))) => report.succeeded += 1,
                Ok(Some(Ok(false))) | Ok(Some(Err(_))) => report.failed += 1,
                Ok(None) => break,
                Err(_) => {
                    report.timed_out = requests.len();
                    requests.abort_all();
                    warn!(pending = report.timed_out, "Warm-up deadline reached");
                    break;
                }
            }
        }

        info!(
            hosts = hosts.len(),
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            timed_out = report.timed_out,
            "Warm-up finished"
        );
        report
    }
}

fn client_builder(config: &ConnectionPoolConfig) -> ClientBuilder {
    Client::builder()
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(config.keep_alive())
        .http1_only()
        .user_agent(config.user_agent.clone())
}

async fn warm_up_once(client: &Client, url: &str, max_drain_bytes: u64) -> reqwest::Result<()> {
    let response = client.get(url).send().await?;
    // the connection only returns to the pool once the body is consumed
    if response.content_length().map_or(true, |len| len < max_drain_bytes) {
        response.bytes().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    #[test]
    fn test_warmup_url() {
        let manager = ConnectionPoolManager::new(ConnectionPoolConfig::default()).unwrap();
        assert_eq!(
            manager.warmup_url("cdn.example.com"),
            "https://cdn.example.com/playkit-warmup"
        );
        assert!(manager.redirecting_client().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ConnectionPoolConfig {
            warmup_path: "playkit-warmup".into(),
            ..Default::default()
        };
        assert!(matches!(
            ConnectionPoolManager::new(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_no_hosts_returns_immediately() {
        let manager = ConnectionPoolManager::new(ConnectionPoolConfig::default()).unwrap();
        let started = std::time::Instant::now();
        let report = manager.warm_up(&[]).await;
        assert_eq!(report, WarmUpReport::default());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_failures_are_counted() {
        let config = ConnectionPoolConfig {
            warmup_timeout_ms: 2_000,
            ..Default::default()
        };
        let manager = ConnectionPoolManager::new(config).unwrap();
        // nothing listens on port 1
        let report = manager.warm_up(&["127.0.0.1:1".to_string()]).await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed + report.timed_out, 2);
    }
}
