//! Footer connectivity probe.
//!
//! A TCP connect with a short timeout against a well-known address. The
//! probe runs on the main loop between key presses, so the timeout bounds
//! how long the UI can stall.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::config::NetworkConfig;
use crate::tui::state::Connectivity;

/// Dial `addr` once; `Online` if any resolved address accepts.
pub fn probe_connectivity(addr: &str, timeout: Duration) -> Connectivity {
    let addrs = match addr.to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(err) => {
            tracing::debug!(addr, error = %err, "probe address did not resolve");
            return Connectivity::Offline;
        }
    };

    for socket in addrs {
        if TcpStream::connect_timeout(&socket, timeout).is_ok() {
            return Connectivity::Online;
        }
    }
    Connectivity::Offline
}

/// Rate-limited connectivity check.
#[derive(Debug, Clone)]
pub struct Probe {
    addr: String,
    interval: Duration,
    timeout: Duration,
    last: Option<Instant>,
}

impl Probe {
    pub fn new(addr: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Probe {
            addr: addr.into(),
            interval,
            timeout,
            last: None,
        }
    }

    /// `None` when probing is disabled (empty address).
    pub fn from_config(config: &NetworkConfig) -> Option<Self> {
        if config.probe_addr.is_empty() {
            return None;
        }
        Some(Probe::new(
            config.probe_addr.clone(),
            Duration::from_secs(config.probe_interval_secs),
            Duration::from_millis(config.probe_timeout_ms),
        ))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// True if the probe has never run or its interval has elapsed.
    pub fn due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn check(&mut self, now: Instant) -> Connectivity {
        self.last = Some(now);
        let state = probe_connectivity(&self.addr, self.timeout);
        tracing::debug!(addr = %self.addr, state = ?state, "connectivity probe");
        state
    }
}

// ============================================================================
// TESTS
// ============================================================================
