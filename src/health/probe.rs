//! Server readiness probing.
//!
//! # Responsibilities
//! - Poll the server's health path after it is spawned
//! - Report the first successful answer
//!
//! # Design Decisions
//! - Observational only: a probe never gates the worker and never kills
//!   the server
//! - Wildcard bind hosts are probed through loopback

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use axum::body::Body;
use hyper::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time::{self, Instant};
use url::Url;

use crate::config::ServerConfig;

/// Build the URL used to probe a server bound to `host:port`.
pub fn probe_url(host: &str, port: u16, path: &str) -> Result<Url, url::ParseError> {
    let host = match host.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() && ip.is_ipv4() => IpAddr::V4(Ipv4Addr::LOCALHOST).to_string(),
        Ok(ip) if ip.is_unspecified() => format!("[{}]", Ipv6Addr::LOCALHOST),
        Ok(IpAddr::V6(ip)) => format!("[{ip}]"),
        Ok(IpAddr::V4(ip)) => ip.to_string(),
        Err(_) => host.to_string(),
    };
    Url::parse(&format!("http://{host}:{port}"))?.join(path)
}

/// Polls the server's health path until it answers with a 2xx status.
pub struct ReadinessProbe {
    url: Url,
    interval: Duration,
    timeout: Duration,
    client: Client<HttpConnector, Body>,
}

impl ReadinessProbe {
    pub fn new(url: Url, interval: Duration, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            url,
            interval,
            timeout,
            client,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, url::ParseError> {
        let url = probe_url(&config.host, config.port, &config.health_path)?;
        Ok(Self::new(
            url,
            Duration::from_millis(config.probe_interval_ms),
            Duration::from_secs(config.readiness_timeout_secs),
        ))
    }

    /// Probe until the server answers or the timeout elapses. Returns
    /// whether the server became ready.
    pub async fn wait_ready(&self) -> bool {
        tracing::debug!(url = %self.url, timeout_secs = self.timeout.as_secs(), "Readiness probe starting");

        // `None` means the deadline lies beyond what `Instant` can represent.
        let deadline = Instant::now().checked_add(self.timeout);
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            if self.check_once().await {
                tracing::debug!(url = %self.url, attempts, "Readiness probe succeeded");
                return true;
            }
            let out_of_time = match (Instant::now().checked_add(self.interval), deadline) {
                (Some(next), Some(deadline)) => next >= deadline,
                (Some(_), None) => false,
                (None, _) => true,
            };
            if out_of_time {
                tracing::warn!(url = %self.url, attempts, "Server did not become ready in time");
                return false;
            }
            time::sleep(self.interval).await;
        }
    }

    /// A single probe request.
    pub async fn check_once(&self) -> bool {
        let request = match Request::builder()
            .method("GET")
            .uri(self.url.as_str())
            .header("user-agent", "duo-entrypoint-probe")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!("Failed to build readiness probe request: {}", e);
                return false;
            }
        };

        let per_request = self.interval.max(Duration::from_secs(1));
        match time::timeout(per_request, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::debug!(status = %response.status(), "Readiness probe: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::trace!(error = %e, "Readiness probe: connection error");
                false
            }
            Err(_) => {
                tracing::debug!("Readiness probe: timeout");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_hosts_use_loopback() {
        assert_eq!(probe_url("0.0.0.0", 8000, "/health").unwrap().as_str(), "http://127.0.0.1:8000/health");
        assert_eq!(probe_url("::", 8000, "/health").unwrap().as_str(), "http://[::1]:8000/health");
    }

    #[test]
    fn test_named_and_concrete_hosts_are_kept() {
        assert_eq!(probe_url("10.1.2.3", 80, "/ping").unwrap().as_str(), "http://10.1.2.3/ping");
        assert_eq!(probe_url("api.local", 8000, "/health").unwrap().as_str(), "http://api.local:8000/health");
        assert_eq!(probe_url("fe80::1", 9000, "/").unwrap().as_str(), "http://[fe80::1]:9000/");
    }

    #[tokio::test]
    async fn test_gives_up_when_nothing_listens() {
        // Reserve a port and release it so nothing is listening there.
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let probe = ReadinessProbe::new(
            probe_url("127.0.0.1", port, "/health").unwrap(),
            Duration::from_millis(50),
            Duration::from_millis(200),
        );
        assert!(!probe.wait_ready().await);
    }

    #[tokio::test]
    async fn test_unrepresentable_deadline_does_not_panic() {
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let probe = ReadinessProbe::new(
            probe_url("127.0.0.1", port, "/health").unwrap(),
            Duration::MAX,
            Duration::MAX,
        );
        // The next attempt could never be scheduled, so the probe gives up.
        let ready = time::timeout(Duration::from_secs(5), probe.wait_ready()).await;
        assert_eq!(ready, Ok(false));
    }
}
