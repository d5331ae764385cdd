// Async client for the site's catalog endpoints (`/api/rides`, `/api/availability`).
// Responses use the `{ success, data, count?, error? }` envelope.

use crate::catalog::{AvailabilityDate, Ride, RideFilter, RideId};
use crate::config::{CatalogClientConfig, RetryConfig};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use futures::future::join_all;
use parking_lot::Mutex;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Request unsuccessful: {0}")]
    Unsuccessful(String),

    #[error("Decode error: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ClientError {
    // Network failures, timeouts and 5xx are worth another attempt; 4xx never are
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::NetworkError(_) | ClientError::Timeout(_) => true,
            ClientError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

// Error body only, used for non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideAvailability {
    pub ride_id: RideId,
    pub availability: Vec<AvailabilityDate>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_retried: usize,
}

// Raw HTTP GET, returning status and body
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(&self, url: &Url) -> Result<(u16, Bytes), ClientError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    pub fn new(timeout_ms: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;
        Ok(Self { client, timeout_ms })
    }

    fn map_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout_ms)
        } else {
            ClientError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<(u16, Bytes), ClientError> {
        let response = self
            .client
            .get(url.clone())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok((status, body))
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync + 'static {
    async fn rides(&self, filter: &RideFilter) -> Result<Vec<Ride>, ClientError>;

    // There is no per-id route; this lists rides and picks the match
    async fn ride(&self, id: &str) -> Result<Option<Ride>, ClientError>;

    // The date range only applies when both bounds are given
    async fn availability(
        &self,
        ride_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RideAvailability, ClientError>;
}

pub struct HttpCatalogClient<T: Transport = ReqwestTransport> {
    base_url: Url,
    retry_config: RetryConfig,
    transport: T,
    stats: Mutex<ClientStats>,
}

impl HttpCatalogClient<ReqwestTransport> {
    pub fn new(config: CatalogClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.timeout_ms)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> HttpCatalogClient<T> {
    pub fn with_transport(config: CatalogClientConfig, transport: T) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::ConfigError(format!("invalid base url: {}", e)))?;
        Ok(Self {
            base_url,
            retry_config: config.retry_config,
            transport,
            stats: Mutex::new(ClientStats::default()),
        })
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    // Availability for several rides at once; one failure does not fail the others
    pub async fn prefetch_availability(
        &self,
        ride_ids: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<(String, Result<RideAvailability, ClientError>)> {
        let requests = ride_ids.iter().map(|id| async move {
            (id.clone(), self.availability(id, start, end).await)
        });
        join_all(requests).await
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn fetch_once(&self, url: &Url) -> Result<Bytes, ClientError> {
        self.stats.lock().requests_sent += 1;
        let (status, body) = self.transport.get(url).await?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| "An error occurred".to_string());
            return Err(ClientError::ApiError { status, message });
        }
        Ok(body)
    }

    async fn get_with_retry(&self, url: &Url) -> Result<Bytes, ClientError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    self.stats.lock().requests_succeeded += 1;
                    return Ok(body);
                }
                Err(err) if err.is_retryable() && attempt < self.retry_config.max_retries => {
                    let backoff = calculate_backoff(attempt, &self.retry_config);
                    tracing::warn!(
                        url = %url,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "catalog request failed, retrying"
                    );
                    self.stats.lock().requests_retried += 1;
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.stats.lock().requests_failed += 1;
                    return Err(err);
                }
            }
        }
    }

    async fn get_data<D: DeserializeOwned>(&self, url: Url) -> Result<D, ClientError> {
        let body = self.get_with_retry(&url).await?;
        decode_envelope(&body)
    }
}

#[async_trait]
impl<T: Transport> CatalogApi for HttpCatalogClient<T> {
    async fn rides(&self, filter: &RideFilter) -> Result<Vec<Ride>, ClientError> {
        let mut params = Vec::new();
        if let Some(category) = &filter.category {
            params.push(("category", category.clone()));
        }
        if let Some(min) = filter.min_price {
            params.push(("minPrice", min.to_string()));
        }
        if let Some(max) = filter.max_price {
            params.push(("maxPrice", max.to_string()));
        }
        if let Some(difficulty) = filter.difficulty {
            params.push(("difficulty", difficulty.as_str().to_string()));
        }

        let url = self.endpoint("/api/rides", &params)?;
        self.get_data(url).await
    }

    async fn ride(&self, id: &str) -> Result<Option<Ride>, ClientError> {
        let rides = self.rides(&RideFilter::default()).await?;
        Ok(rides.into_iter().find(|ride| ride.id == id))
    }

    async fn availability(
        &self,
        ride_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RideAvailability, ClientError> {
        let mut params = vec![("rideId", ride_id.to_string())];
        if let Some(start) = start {
            params.push(("startDate", start.to_string()));
        }
        if let Some(end) = end {
            params.push(("endDate", end.to_string()));
        }

        let url = self.endpoint("/api/availability", &params)?;
        self.get_data(url).await
    }
}

fn decode_envelope<D: DeserializeOwned>(body: &Bytes) -> Result<D, ClientError> {
    let envelope: Envelope<D> = serde_json::from_slice(body)?;
    if !envelope.success {
        return Err(ClientError::Unsuccessful(
            envelope
                .error
                .unwrap_or_else(|| "An error occurred".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Unsuccessful("response has no data".to_string()))
}

// Exponential backoff with jitter
pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
    let base_backoff_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powf(retry_attempt as f64))
    .min(config.max_backoff_ms as f64);

    let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
    let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

    Duration::from_millis(backoff_ms as u64)
}

#[cfg(test)]
pub mod mock_site {
    use super::*;
    use crate::catalog::Catalog;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // In-process stand-in for the site's API routes, backed by the sample catalog
    pub struct MockSite {
        catalog: Catalog,
        fail_next_requests: AtomicUsize,
        fail_status: AtomicUsize,
        request_count: AtomicUsize,
    }

    impl MockSite {
        pub fn new() -> Self {
            Self {
                catalog: Catalog::load_sample().unwrap(),
                fail_next_requests: AtomicUsize::new(0),
                fail_status: AtomicUsize::new(500),
                request_count: AtomicUsize::new(0),
            }
        }

        pub fn fail_next_requests(&self, count: usize, status: u16) {
            self.fail_next_requests.store(count, Ordering::SeqCst);
            self.fail_status.store(status as usize, Ordering::SeqCst);
        }

        pub fn request_count(&self) -> usize {
            self.request_count.load(Ordering::SeqCst)
        }

        fn respond(status: u16, body: serde_json::Value) -> (u16, Bytes) {
            (status, Bytes::from(body.to_string()))
        }

        fn handle_rides(&self, url: &Url) -> (u16, Bytes) {
            let mut filter = RideFilter::default();
            for (key, value) in url.query_pairs() {
                match key.as_ref() {
                    "category" => filter.category = Some(value.to_string()),
                    "minPrice" => filter.min_price = value.parse().ok(),
                    "maxPrice" => filter.max_price = value.parse().ok(),
                    "difficulty" => filter.difficulty = value.parse().ok(),
                    _ => {}
                }
            }
            let rides = self.catalog.filter_rides(&filter);
            Self::respond(
                200,
                json!({ "success": true, "data": rides, "count": rides.len() }),
            )
        }

        fn handle_availability(&self, url: &Url) -> (u16, Bytes) {
            let param = |name: &str| {
                url.query_pairs()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value.to_string())
            };

            let ride_id = match param("rideId") {
                Some(id) => id,
                None => {
                    return Self::respond(
                        400,
                        json!({ "success": false, "error": "rideId is required" }),
                    )
                }
            };
            let start = param("startDate").and_then(|d| d.parse().ok());
            let end = param("endDate").and_then(|d| d.parse().ok());

            match self.catalog.availability_for(&ride_id, start, end) {
                Some(availability) => Self::respond(
                    200,
                    json!({
                        "success": true,
                        "data": { "rideId": ride_id, "availability": availability }
                    }),
                ),
                None => Self::respond(404, json!({ "success": false, "error": "Ride not found" })),
            }
        }
    }

    #[async_trait]
    impl Transport for MockSite {
        async fn get(&self, url: &Url) -> Result<(u16, Bytes), ClientError> {
            self.request_count.fetch_add(1, Ordering::SeqCst);

            let pending = self.fail_next_requests.load(Ordering::SeqCst);
            if pending > 0 {
                self.fail_next_requests.store(pending - 1, Ordering::SeqCst);
                let status = self.fail_status.load(Ordering::SeqCst) as u16;
                if status == 0 {
                    return Err(ClientError::NetworkError("connection reset".to_string()));
                }
                return Ok(Self::respond(
                    status,
                    json!({ "success": false, "error": "Internal Server Error" }),
                ));
            }

            Ok(match url.path() {
                "/api/rides" => self.handle_rides(url),
                "/api/availability" => self.handle_availability(url),
                _ => Self::respond(404, json!({ "success": false, "error": "Not found" })),
            })
        }
    }
}
