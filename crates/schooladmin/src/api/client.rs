//! HTTP client for the school administration REST API.
//!
//! Every call carries the caller's bearer token. Transient failures are
//! retried with exponential backoff; repeated failures trip a circuit breaker
//! so a dead backend is not hammered by every editor on the dashboard.

use super::cache::{CacheStats, CircuitBreaker, DirectoryCache, SessionKey};
use super::error::ApiError;
use super::types::{ClassInfo, Envelope};
use crate::config::ApiConfig;
use crate::timetable::{Teacher, TimetableRecord, TimetableStore};
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

const CLASSES_PATH: &str = "classes";
const TEACHERS_PATH: &str = "teachers";
const TIMETABLES_PATH: &str = "timetables";

/// Upper bound for a single retry delay.
const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Client for the remote REST API.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    config: ApiConfig,
    directory: DirectoryCache,
    breaker: CircuitBreaker,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&config.base_url)?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            directory: DirectoryCache::new(Duration::from_secs(config.directory_cache_ttl_secs)),
            breaker: CircuitBreaker::new(
                config.breaker_threshold,
                Duration::from_secs(config.breaker_recovery_secs),
            ),
            config,
        })
    }

    /// Binds the client to one bearer token.
    pub fn authorized<'a>(&'a self, token: &'a str) -> AuthorizedClient<'a> {
        AuthorizedClient { api: self, token }
    }

    /// Lists the teachers of a school. Cached per token and school.
    pub async fn list_teachers(
        &self,
        token: &str,
        school_id: &str,
    ) -> Result<Vec<Teacher>, ApiError> {
        let key = SessionKey::for_school(token, school_id);
        if let Some(cached) = self.directory.teachers.get(&key) {
            debug!(school_id, session = %key, "Returning cached teacher directory");
            return Ok(cached);
        }

        let teachers: Vec<Teacher> = self
            .get_json(token, TEACHERS_PATH, &[("schoolId", school_id)])
            .await?;
        info!(
            school_id,
            teachers = teachers.len(),
            "Fetched teacher directory"
        );

        self.directory.teachers.insert(key, teachers.clone());
        Ok(teachers)
    }

    /// Lists the classes of a school with their subjects. Cached per token and school.
    pub async fn list_classes(
        &self,
        token: &str,
        school_id: &str,
    ) -> Result<Vec<ClassInfo>, ApiError> {
        let key = SessionKey::for_school(token, school_id);
        if let Some(cached) = self.directory.classes.get(&key) {
            debug!(school_id, session = %key, "Returning cached class directory");
            return Ok(cached);
        }

        let classes: Vec<ClassInfo> = self
            .get_json(token, CLASSES_PATH, &[("schoolId", school_id)])
            .await?;
        info!(school_id, classes = classes.len(), "Fetched class directory");

        self.directory.classes.insert(key, classes.clone());
        Ok(classes)
    }

    /// Subjects that can be timetabled for `class_id`; empty if the class is unknown.
    pub async fn class_subjects(
        &self,
        token: &str,
        school_id: &str,
        class_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let classes = self.list_classes(token, school_id).await?;
        Ok(classes
            .into_iter()
            .find(|c| c.id == class_id)
            .map(|c| c.subjects)
            .unwrap_or_default())
    }

    /// Fetches the stored per-day records of one class. A 404 means "none yet".
    pub async fn fetch_timetable(
        &self,
        token: &str,
        class_id: &str,
        school_id: &str,
    ) -> Result<Vec<TimetableRecord>, ApiError> {
        let result = self
            .get_json(
                token,
                TIMETABLES_PATH,
                &[("classId", class_id), ("schoolId", school_id)],
            )
            .await;

        match result {
            Err(ApiError::NotFound { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Creates or replaces the record for one class and day.
    pub async fn upsert_timetable(
        &self,
        token: &str,
        record: &TimetableRecord,
    ) -> Result<(), ApiError> {
        self.post_json(token, TIMETABLES_PATH, record).await
    }

    /// Drops cached directories for a token and school.
    pub fn invalidate_directory(&self, token: &str, school_id: &str) {
        self.directory
            .invalidate(&SessionKey::for_school(token, school_id));
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.directory.stats()
    }

    /// Evicts expired directory entries nobody asked for again.
    pub fn cleanup_cache(&self) {
        self.directory.cleanup_expired();
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let response = self
            .send(path, || {
                self.client
                    .get(url.clone())
                    .bearer_auth(token)
                    .query(query)
            })
            .await?;

        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.into_inner())
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        self.send(path, || {
            self.client
                .post(url.clone())
                .bearer_auth(token)
                .json(body)
        })
        .await?;
        Ok(())
    }

    /// Sends the request built by `build`, retrying transient failures.
    async fn send<F>(&self, path: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let correlation_id = generate_correlation_id();

        if self.breaker.is_open() {
            warn!(
                correlation_id = %correlation_id,
                path,
                "Circuit breaker is open, rejecting request"
            );
            return Err(ApiError::CircuitBreakerOpen);
        }

        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = match build().send().await {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    Err(ApiError::from_status(status, path, &body))
                }
                Err(e) => Err(ApiError::from(e)),
            };

            match result {
                Ok(response) => {
                    self.breaker.record_success();
                    debug!(
                        correlation_id = %correlation_id,
                        path,
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Request succeeded"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt <= self.config.max_retries => {
                    let delay = self.calculate_retry_delay(attempt);
                    warn!(
                        correlation_id = %correlation_id,
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        self.breaker.record_failure();
                    }
                    error!(
                        correlation_id = %correlation_id,
                        path,
                        attempt,
                        error = %e,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Request failed"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Exponential backoff with jitter: base * 2^(attempt-1), capped, plus up to 20%.
    fn calculate_retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_base_ms;
        let exponential = base.saturating_mul(2u64.pow(attempt.saturating_sub(1).min(5)));
        let capped = exponential.min(MAX_RETRY_DELAY_MS);
        let jitter = rand::thread_rng().gen_range(0..=(capped / 5));
        Duration::from_millis(capped + jitter)
    }
}

/// [`ApiClient`] bound to one caller's bearer token.
pub struct AuthorizedClient<'a> {
    api: &'a ApiClient,
    token: &'a str,
}

impl TimetableStore for AuthorizedClient<'_> {
    async fn fetch_timetable(
        &self,
        class_id: &str,
        school_id: &str,
    ) -> Result<Vec<TimetableRecord>, ApiError> {
        self.api
            .fetch_timetable(self.token, class_id, school_id)
            .await
    }

    async fn upsert_timetable(&self, record: &TimetableRecord) -> Result<(), ApiError> {
        self.api.upsert_timetable(self.token, record).await
    }
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("http://localhost:4000/api");
        assert_eq!(
            api.endpoint("timetables").unwrap().as_str(),
            "http://localhost:4000/api/timetables"
        );
        assert_eq!(
            api.endpoint("/teachers").unwrap().as_str(),
            "http://localhost:4000/api/teachers"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::new(ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::UrlError { .. }));
    }

    #[test]
    fn test_retry_delay_backoff() {
        let api = client("http://localhost:4000/api");

        let d1 = api.calculate_retry_delay(1);
        let d2 = api.calculate_retry_delay(2);
        let d3 = api.calculate_retry_delay(3);
        let d_max = api.calculate_retry_delay(30);

        // Each step at least doubles the base, jitter stays under 20%
        assert!(d2 > d1);
        assert!(d3 > d2);
        assert!(d_max <= Duration::from_millis(MAX_RETRY_DELAY_MS * 6 / 5));
    }

    #[test]
    fn test_correlation_ids_differ() {
        assert_ne!(generate_correlation_id(), generate_correlation_id());
    }
}
