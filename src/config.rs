// Configuration for the booking session, the snapshot vault and the catalog client

use crate::pricing::PricingPolicy;
use serde::{Deserialize, Serialize};

pub const SHARE_BASE_URL_ENV: &str = "SAFARI_SHARE_BASE_URL";
pub const SNAPSHOT_TTL_DAYS_ENV: &str = "SAFARI_SNAPSHOT_TTL_DAYS";
pub const CATALOG_URL_ENV: &str = "SAFARI_CATALOG_URL";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BookingConfig {
    // Origin prepended to share links. Empty yields a path-only link.
    pub share_base_url: String,
    pub booking_path: String,
    pub snapshot_ttl_days: i64,
    pub pricing: PricingPolicy,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            share_base_url: String::new(),
            booking_path: "/booking".to_string(),
            snapshot_ttl_days: 7,
            pricing: PricingPolicy::default(),
        }
    }
}

impl BookingConfig {
    // Defaults overlaid with SAFARI_* environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base_url) = lookup(SHARE_BASE_URL_ENV) {
            config.share_base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(SNAPSHOT_TTL_DAYS_ENV) {
            match raw.trim().parse::<i64>() {
                Ok(days) if days > 0 => config.snapshot_ttl_days = days,
                _ => tracing::warn!(
                    value = %raw,
                    default = config.snapshot_ttl_days,
                    "invalid {}, keeping default",
                    SNAPSHOT_TTL_DAYS_ENV
                ),
            }
        }

        config
    }

    pub fn share_url(&self, snapshot_id: &str) -> String {
        format!("{}{}/{}", self.share_base_url, self.booking_path, snapshot_id)
    }
}

#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub max_entries: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_config: RetryConfig,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 5000,
            retry_config: RetryConfig::default(),
        }
    }
}

impl CatalogClientConfig {
    // Some only when SAFARI_CATALOG_URL names a site to talk to
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = lookup(CATALOG_URL_ENV)?;
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return None;
        }
        Some(Self {
            base_url: base_url.to_string(),
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}
