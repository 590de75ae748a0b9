use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::observability::store_metrics;
use crate::store::StoreError;

/// Query pairs appended to a request URL; values are encoded by reqwest
pub type QueryPairs<'a> = &'a [(&'a str, String)];

/// Rate-limited HTTP client for the hosted backend (REST, auth and storage
/// endpoints all hang off the same project URL and share one quota).
#[derive(Debug)]
pub struct RateLimitedHttpClient {
    http: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    cache: Cache<String, Value>,
    /// Bumped on every invalidation; a GET only caches its response if no
    /// invalidation happened while it was in flight
    cache_generation: AtomicU64,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RateLimitedHttpClient {
    /// Create a new rate-limited HTTP client
    pub fn new(
        base_url: &str,
        api_key: &str,
        rate_limit: &RateLimitConfig,
        cache_ttl: Duration,
    ) -> Result<Self, StoreError> {
        if base_url.trim().is_empty() {
            return Err(StoreError::Config("store.url is empty".to_string()));
        }
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| StoreError::Config(format!("store.url is not a valid URL: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::Config(format!("store.url cannot be a base URL: {base_url}")));
        }
        if api_key.trim().is_empty() {
            return Err(StoreError::Config("store.anon_key is empty".to_string()));
        }

        let per_second = NonZeroU32::new(rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(rate_limit.burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let http = reqwest::Client::builder()
            .user_agent(concat!("complaint-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            http,
            rate_limiter,
            cache,
            cache_generation: AtomicU64::new(0),
            base_url: parsed,
            api_key: api_key.to_string(),
            access_token: None,
        })
    }

    /// Act on behalf of a signed-in user instead of the anonymous key
    pub fn with_access_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token;
        self
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Append path segments to the project URL, percent-encoding each one
    pub fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("store.url cannot be a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    async fn throttle(&self) {
        if self.rate_limiter.check().is_err() {
            store_metrics().record_rate_limit_wait();
            self.rate_limiter.until_ready().await;
        }
        store_metrics().record_request();
    }

    /// GET a JSON document, optionally served from and stored in the cache
    pub async fn get_json(
        &self,
        segments: &[&str],
        query: QueryPairs<'_>,
        cache_key: Option<String>,
    ) -> Result<Value, StoreError> {
        if let Some(ref key) = cache_key {
            if let Some(cached) = self.cache.get(key).await {
                store_metrics().record_cache_hit();
                debug!("Cache hit for key: {}", key);
                return Ok(cached);
            }
            store_metrics().record_cache_miss();
        }

        let url = self.url(segments)?;
        let generation = self.cache_generation.load(Ordering::Acquire);
        self.throttle().await;
        debug!(path = %url.path(), "GET");

        let response = self
            .authorize(self.http.get(url))
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .inspect_err(|_| store_metrics().record_error())?;
        let value = Self::into_json(response).await?;

        if let Some(key) = cache_key {
            if self.cache_generation.load(Ordering::Acquire) == generation {
                self.cache.insert(key, value.clone()).await;
                debug!("Cached response for future requests");
            } else {
                debug!("Not caching {}: a write invalidated the cache mid-flight", key);
            }
        }

        Ok(value)
    }

    /// Send a JSON body; an empty response body comes back as `Value::Null`
    pub async fn send_json(
        &self,
        method: Method,
        segments: &[&str],
        query: QueryPairs<'_>,
        body: &Value,
        prefer: Option<&str>,
    ) -> Result<Value, StoreError> {
        let url = self.url(segments)?;
        self.throttle().await;
        debug!(method = %method, path = %url.path(), "sending JSON");

        let mut builder = self
            .authorize(self.http.request(method, url))
            .query(query)
            .json(body);
        if let Some(prefer) = prefer {
            builder = builder.header("Prefer", prefer);
        }

        let response = builder
            .send()
            .await
            .inspect_err(|_| store_metrics().record_error())?;
        Self::into_json(response).await
    }

    /// Upload raw bytes (object storage)
    pub async fn send_bytes(
        &self,
        segments: &[&str],
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Value, StoreError> {
        let url = self.url(segments)?;
        self.throttle().await;
        debug!(path = %url.path(), size = bytes.len(), "uploading object");

        let response = self
            .authorize(self.http.post(url))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .inspect_err(|_| store_metrics().record_error())?;
        Self::into_json(response).await
    }

    async fn into_json(response: Response) -> Result<Value, StoreError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            store_metrics().record_error();
            return Err(StoreError::api(status.as_u16(), error_message(&text)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Invalidate cache entries whose key contains `pattern`
    pub async fn invalidate_cache_pattern(&self, pattern: &str) {
        self.cache_generation.fetch_add(1, Ordering::AcqRel);
        let keys_to_remove: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in keys_to_remove {
            self.cache.invalidate(&key).await;
        }

        debug!("Invalidated cache entries matching pattern: {}", pattern);
    }
}

/// Pull a readable message out of a PostgREST / GoTrue / storage error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|field| value.get(*field).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
