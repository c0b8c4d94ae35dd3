//! Console configuration.
//!
//! Defaults match the stock deployment (API and socket on localhost:8080).
//! `from_env` reads a `.env` file if present, then overrides from the
//! `CITIES_*` variables.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::api::CityApi;
use crate::error::{ConsoleError, Result};
use crate::realtime::{RealtimeChannel, ReconnectPolicy, WebSocketConnector};
use crate::transport::HttpTransport;

pub const ENV_API_BASE: &str = "CITIES_API_BASE";
pub const ENV_WS_URL: &str = "CITIES_WS_URL";
pub const ENV_PAGE_SIZE: &str = "CITIES_PAGE_SIZE";
pub const ENV_FILTER_DEBOUNCE_MS: &str = "CITIES_FILTER_DEBOUNCE_MS";
pub const ENV_RECONNECT_BASE_MS: &str = "CITIES_RECONNECT_BASE_MS";
pub const ENV_RECONNECT_MAX_ATTEMPTS: &str = "CITIES_RECONNECT_MAX_ATTEMPTS";
pub const ENV_POLL_INTERVAL_MS: &str = "CITIES_POLL_INTERVAL_MS";
pub const ENV_CHECK_TIMEZONE_BOUNDS: &str = "CITIES_CHECK_TIMEZONE_BOUNDS";

/// Accepted filter debounce window.
pub const DEBOUNCE_RANGE_MS: std::ops::RangeInclusive<u64> = 300..=1000;

/// Page sizes the server accepts.
pub const PAGE_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the cities REST resource.
    pub api_base: String,

    /// Realtime push endpoint.
    pub ws_url: String,

    pub page_size: u32,

    /// Quiet period after the last filter keystroke before the list refetches.
    pub filter_debounce: Duration,

    pub reconnect: ReconnectPolicy,

    /// Silent refetch cadence once the realtime channel has given up.
    pub poll_interval: Duration,

    pub request_timeout: Duration,

    /// Reject out-of-range timezone filters before calling the server.
    pub check_timezone_bounds: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/api/cities".to_string(),
            ws_url: "ws://localhost:8080/ws/cities".to_string(),
            page_size: 5,
            filter_debounce: Duration::from_millis(800),
            reconnect: ReconnectPolicy::default(),
            poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            check_timezone_bounds: true,
        }
    }
}

impl ConsoleConfig {
    /// Defaults overridden by `.env` and process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `CITIES_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_API_BASE) {
            config.api_base = v;
        }
        if let Some(v) = lookup(ENV_WS_URL) {
            config.ws_url = v;
        }
        if let Some(v) = parse_var::<u32>(&lookup, ENV_PAGE_SIZE)? {
            config.page_size = v;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_FILTER_DEBOUNCE_MS)? {
            config.filter_debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_RECONNECT_BASE_MS)? {
            config.reconnect.base_delay = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var::<u32>(&lookup, ENV_RECONNECT_MAX_ATTEMPTS)? {
            config.reconnect.max_attempts = v;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_POLL_INTERVAL_MS)? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var::<bool>(&lookup, ENV_CHECK_TIMEZONE_BOUNDS)? {
            config.check_timezone_bounds = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let debounce_ms = self.filter_debounce.as_millis() as u64;
        if !DEBOUNCE_RANGE_MS.contains(&debounce_ms) {
            return Err(ConsoleError::Config(format!(
                "filter debounce must be {}..={} ms, got {}",
                DEBOUNCE_RANGE_MS.start(),
                DEBOUNCE_RANGE_MS.end(),
                debounce_ms
            )));
        }
        if !PAGE_SIZE_RANGE.contains(&self.page_size) {
            return Err(ConsoleError::Config(format!(
                "page size must be {}..={}, got {}",
                PAGE_SIZE_RANGE.start(),
                PAGE_SIZE_RANGE.end(),
                self.page_size
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ConsoleError::Config("poll interval must be non-zero".into()));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    pub fn filter_debounce(mut self, delay: Duration) -> Self {
        self.filter_debounce = delay;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn check_timezone_bounds(mut self, enabled: bool) -> Self {
        self.check_timezone_bounds = enabled;
        self
    }

    // -------------------------------------------------------------------------
    // Wiring
    // -------------------------------------------------------------------------

    /// API client over a reqwest transport.
    pub fn build_api(&self) -> Result<CityApi> {
        let transport = HttpTransport::new(&self.api_base, self.request_timeout)?;
        Ok(CityApi::new(Arc::new(transport)))
    }

    /// Realtime channel over a tungstenite socket. Not yet connected.
    pub fn build_channel(&self) -> RealtimeChannel {
        RealtimeChannel::new(
            self.ws_url.clone(),
            Arc::new(WebSocketConnector),
            self.reconnect,
        )
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConsoleError::Config(format!("{} has invalid value '{}'", key, raw))),
    }
}
