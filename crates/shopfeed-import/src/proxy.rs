//! CORS proxy selection with per-session health scoring.
//!
//! Marketplace pages block cross-origin fetches, so page HTML is pulled
//! through one of a small set of public relay prefixes. Candidates are
//! probed concurrently against a known-reachable reference page; a probe
//! only counts as alive when the relayed body carries an HTML doctype
//! marker, which filters out proxies that return error pages with HTTP 200.
//!
//! Liveness is re-probed for every import session. Within a session the
//! pool keeps success/failure counters per endpoint and ranks candidates
//! by success rate, so a flaky proxy is demoted on subsequent selections.

use std::sync::Mutex;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::ImportError;

/// Public CORS relay prefixes, tried in this order until health data says
/// otherwise. The target URL is appended percent-encoded.
pub const DEFAULT_PROXIES: &[&str] = &[
    "https://api.allorigins.win/raw?url=",
    "https://api.codetabs.com/v1/proxy?quest=",
    "https://corsproxy.io/?",
    "https://proxy.cors.sh/",
    "https://cors-anywhere.herokuapp.com/",
];

const DEFAULT_REFERENCE_URL: &str = "https://www.amazon.com";

#[derive(Debug, Clone)]
struct EndpointState {
    prefix: String,
    successes: u32,
    failures: u32,
}

impl EndpointState {
    /// Fraction of probes that succeeded; untried endpoints score 1.0 so the
    /// configured list order decides among them (ranking sort is stable).
    fn score(&self) -> f64 {
        let total = self.successes + self.failures;
        if total == 0 {
            return 1.0;
        }
        f64::from(self.successes) / f64::from(total)
    }
}

/// Ranked pool of CORS proxy prefixes.
///
/// Interior mutability lets one pool instance be shared across the worker
/// pool of a catalog import; counters are per-pool and never persisted.
pub struct ProxyPool {
    endpoints: Mutex<Vec<EndpointState>>,
    reference_url: String,
    probe_timeout: Duration,
}

impl Default for ProxyPool {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIES, DEFAULT_REFERENCE_URL, 5)
    }
}

impl ProxyPool {
    #[must_use]
    pub fn new(prefixes: &[&str], reference_url: &str, probe_timeout_secs: u64) -> Self {
        Self {
            endpoints: Mutex::new(
                prefixes
                    .iter()
                    .map(|p| EndpointState {
                        prefix: (*p).to_owned(),
                        successes: 0,
                        failures: 0,
                    })
                    .collect(),
            ),
            reference_url: reference_url.to_owned(),
            probe_timeout: Duration::from_secs(probe_timeout_secs),
        }
    }

    /// Current prefixes ordered by health score, best first. Ties keep the
    /// configured list position.
    #[must_use]
    pub fn ranked_prefixes(&self) -> Vec<String> {
        let endpoints = self.endpoints.lock().unwrap_or_else(|e| e.into_inner());
        let mut ranked: Vec<&EndpointState> = endpoints.iter().collect();
        ranked.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().map(|e| e.prefix.clone()).collect()
    }

    /// Probes every candidate concurrently and returns the first healthy
    /// prefix in rank order.
    ///
    /// The full probe set is awaited before selecting — when several proxies
    /// work, the winner is the best-ranked one, not the fastest responder.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::NoWorkingProxy`] when no candidate both
    /// answers within the probe timeout and relays HTML.
    pub async fn find_working_proxy(
        &self,
        client: &reqwest::Client,
    ) -> Result<String, ImportError> {
        let ranked = self.ranked_prefixes();
        let probes = ranked
            .iter()
            .map(|prefix| self.probe(client, prefix));
        let results = futures::future::join_all(probes).await;

        let mut winner = None;
        for (prefix, alive) in ranked.iter().zip(results) {
            self.record(prefix, alive);
            if alive && winner.is_none() {
                winner = Some(prefix.clone());
            }
        }

        winner.ok_or(ImportError::NoWorkingProxy {
            tried: ranked.len(),
        })
    }

    /// Issues one bounded-timeout GET through `prefix` at the reference page
    /// and checks the relayed body for a doctype marker.
    async fn probe(&self, client: &reqwest::Client, prefix: &str) -> bool {
        let url = proxied_url(prefix, &self.reference_url);
        let response = match client.get(&url).timeout(self.probe_timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(prefix, error = %e, "proxy probe failed");
                return false;
            }
        };
        if response.status() != reqwest::StatusCode::OK {
            return false;
        }
        match response.text().await {
            Ok(body) => body.to_ascii_lowercase().contains("<!doctype html"),
            Err(_) => false,
        }
    }

    fn record(&self, prefix: &str, alive: bool) {
        let mut endpoints = self.endpoints.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = endpoints.iter_mut().find(|e| e.prefix == prefix) {
            if alive {
                state.successes += 1;
            } else {
                state.failures += 1;
            }
        }
    }
}

/// Builds the relayed URL for `target` through a proxy `prefix`.
#[must_use]
pub fn proxied_url(prefix: &str, target: &str) -> String {
    format!("{prefix}{}", utf8_percent_encode(target, NON_ALPHANUMERIC))
}
