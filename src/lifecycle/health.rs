//! Readiness probing.
//!
//! An instance counts as healthy once its port accepts TCP connections
//! and, when a health path is configured, that path answers an HTTP GET
//! with a success status. Probing repeats until it succeeds or the
//! timeout elapses; it never gives up early.

use crate::config::Timeouts;
use reqwest::blocking::Client;
use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound for a single connection or request attempt.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Where an instance is expected to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub path: Option<String>,
}

impl Endpoint {
    /// An endpoint on the loopback interface.
    pub fn local(port: u16, path: Option<&str>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            path: path.map(|p| {
                if p.starts_with('/') {
                    p.to_string()
                } else {
                    format!("/{}", p)
                }
            }),
        }
    }

    fn url(&self) -> Option<String> {
        self.path
            .as_ref()
            .map(|path| format!("http://{}:{}{}", self.host, self.port, path))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.url() {
            Some(url) => write!(f, "{}", url),
            None => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

/// Bounded, repeating readiness check.
#[derive(Debug, Clone, Copy)]
pub struct HealthProbe {
    timeout: Duration,
    interval: Duration,
}

impl HealthProbe {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn from_timeouts(timeouts: &Timeouts) -> Self {
        Self::new(timeouts.health(), timeouts.poll_interval())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll until `endpoint` is healthy. `false` only once the timeout has
    /// fully elapsed.
    pub fn wait_until_healthy(&self, endpoint: &Endpoint) -> bool {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let remaining = self.timeout.saturating_sub(started.elapsed());
            if self.check_once(endpoint, remaining.clamp(Duration::from_millis(100), ATTEMPT_TIMEOUT)) {
                tracing::debug!("{} healthy after {} attempt(s)", endpoint, attempts);
                return true;
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                tracing::debug!(
                    "{} not healthy after {} attempt(s) in {:?}",
                    endpoint,
                    attempts,
                    elapsed
                );
                return false;
            }
            thread::sleep(self.interval.min(self.timeout - elapsed));
        }
    }

    /// A single probe of `endpoint`.
    pub fn check_once(&self, endpoint: &Endpoint, attempt_timeout: Duration) -> bool {
        if !port_open(endpoint, attempt_timeout) {
            return false;
        }
        match endpoint.url() {
            Some(url) => http_ok(&url, attempt_timeout),
            None => true,
        }
    }
}

fn port_open(endpoint: &Endpoint, timeout: Duration) -> bool {
    let Ok(addrs) = (endpoint.host.as_str(), endpoint.port).to_socket_addrs() else {
        return false;
    };
    addrs
        .into_iter()
        .any(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok())
}

fn http_ok(url: &str, timeout: Duration) -> bool {
    let Ok(client) = Client::builder().timeout(timeout).build() else {
        return false;
    };
    client
        .get(url)
        .send()
        .map(|response| response.status().is_success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::net::TcpListener;

    /// A port that nothing is listening on.
    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[test]
    fn open_port_is_healthy_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = HealthProbe::new(Duration::from_secs(5), Duration::from_millis(50));
        let started = Instant::now();

        assert!(probe.wait_until_healthy(&Endpoint::local(port, None)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn closed_port_waits_out_the_timeout() {
        let port = closed_port();
        let timeout = Duration::from_millis(600);
        let probe = HealthProbe::new(timeout, Duration::from_millis(100));
        let started = Instant::now();

        assert!(!probe.wait_until_healthy(&Endpoint::local(port, None)));
        assert!(started.elapsed() >= timeout);
    }

    #[test]
    fn port_opening_later_is_detected() {
        let port = closed_port();
        let opener = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(listener);
        });
        let probe = HealthProbe::new(Duration::from_secs(3), Duration::from_millis(50));

        assert!(probe.wait_until_healthy(&Endpoint::local(port, None)));
        opener.join().unwrap();
    }

    #[test]
    fn health_path_must_succeed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200).body("ok");
        });
        server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(503);
        });
        let probe = HealthProbe::new(Duration::from_millis(500), Duration::from_millis(100));

        assert!(probe.wait_until_healthy(&Endpoint::local(server.port(), Some("/healthz"))));
        assert!(!probe.wait_until_healthy(&Endpoint::local(server.port(), Some("broken"))));
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::local(8080, None).to_string(), "127.0.0.1:8080");
        assert_eq!(
            Endpoint::local(8080, Some("health")).to_string(),
            "http://127.0.0.1:8080/health"
        );
    }
}
