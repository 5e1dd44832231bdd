// src/github/client.rs
// =============================================================================
// HTTP access to the contents API and raw file URLs.
//
// One call = one request. Rate-limit responses come back as
// Error::RateLimited with whatever wait hint the server gave; the retry
// loop itself lives in the materializer so it can watch for Ctrl-C.
// =============================================================================

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, Proxy, StatusCode};
use tracing::debug;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Upper bound on random jitter added to computed back-off delays
const MAX_JITTER_MS: u64 = 250;

/// How often and how long to wait when the API says "slow down".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    // Wait before retry number `attempt` (1-based). A server hint wins over
    // exponential back-off; both are capped at max_delay.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_delay);
        }

        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let backoff = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if backoff.is_zero() {
            return backoff;
        }

        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS));
        backoff + jitter
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
}

impl ApiClient {
    pub fn new(proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT);

        if let Some(proxy) = proxy {
            let proxy_url = if proxy.contains("://") {
                proxy.to_string()
            } else {
                format!("http://{}", proxy)
            };
            let proxy = Proxy::all(&proxy_url).map_err(|source| Error::Transport {
                url: proxy_url.clone(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().map_err(|source| Error::Transport {
            url: String::new(),
            source,
        })?;

        Ok(Self { http })
    }

    // Fetches a contents API listing body
    pub async fn get_listing(&self, url: &str) -> Result<Vec<u8>> {
        self.get_bytes(url, "application/vnd.github+json").await
    }

    // Fetches raw file content
    pub async fn get_file(&self, url: &str) -> Result<Vec<u8>> {
        self.get_bytes(url, "*/*").await
    }

    async fn get_bytes(&self, url: &str, accept: &str) -> Result<Vec<u8>> {
        let transport = |source| Error::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "response received");

        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && limit_headers_present(response.headers()))
        {
            return Err(Error::RateLimited {
                url: url.to_string(),
                attempts: 1,
                retry_after: wait_hint(response.headers()),
            });
        }

        // A 403 without the headers may still be a secondary rate limit,
        // which GitHub only announces in the message body
        if status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            if mentions_rate_limit(&body) {
                return Err(Error::RateLimited {
                    url: url.to_string(),
                    attempts: 1,
                    retry_after: None,
                });
            }
            debug!(url, body = %body, "forbidden");
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

// 403 also means "no access"; it only counts as a rate limit when the
// server says so in its headers or body
fn limit_headers_present(headers: &HeaderMap) -> bool {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);
    exhausted || headers.contains_key(RETRY_AFTER)
}

fn mentions_rate_limit(body: &str) -> bool {
    body.to_ascii_lowercase().contains("rate limit")
}

// Reads Retry-After (seconds), then X-RateLimit-Reset (epoch seconds)
fn wait_hint(headers: &HeaderMap) -> Option<Duration> {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };

    if let Some(secs) = header_u64(RETRY_AFTER.as_str()) {
        return Some(Duration::from_secs(secs));
    }

    let remaining = header_u64("x-ratelimit-remaining");
    let reset = header_u64("x-ratelimit-reset");
    match (remaining, reset) {
        (Some(0), Some(reset)) => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            Some(Duration::from_secs(reset.saturating_sub(now)))
        }
        _ => None,
    }
}
