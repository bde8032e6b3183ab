//! Raw HTTP GET for JSON endpoints.
//!
//! [`Transport`] is the seam between the caching layer and the network;
//! [`HttpTransport`] is the reqwest-backed production implementation.

use common::{Error, QueryParams};
use serde_json::Value;
use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use common::error::DEFAULT_RETRY_AFTER_SECS;

/// Something that can GET a URL with query parameters and decode JSON.
///
/// Implementations classify failures: HTTP 429 must surface as
/// [`Error::RateLimited`] so the caller can apply its single retry.
pub trait Transport: Send + Sync + 'static {
    fn get_json(
        &self,
        url: &str,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Value, Error>> + Send;
}

pub(crate) fn format_reqwest_error(err: &reqwest::Error) -> String {
    // Keep chained causes so network failures (DNS/TLS/socket) are visible.
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}

pub(crate) fn summarize_response_body(raw: &str) -> String {
    const MAX_CHARS: usize = 500;
    let compact = raw.replace(['\n', '\r'], " ");
    if compact.chars().count() > MAX_CHARS {
        let cut: String = compact.chars().take(MAX_CHARS).collect();
        format!("{}…", cut)
    } else {
        compact
    }
}

/// `Retry-After` in milliseconds, when the upstream sent a delay in seconds.
fn parse_retry_after(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
        * 1000
}

/// Map a non-success status to the error taxonomy.
pub(crate) fn classify_status(status: u16, retry_after: Option<&str>, body: &str) -> Error {
    match status {
        429 => Error::RateLimited {
            retry_after_ms: parse_retry_after(retry_after),
        },
        401 | 403 => Error::Unauthorized(summarize_response_body(body)),
        _ => Error::Upstream {
            status,
            message: summarize_response_body(body),
        },
    }
}

/// reqwest-backed transport with connection pooling and a request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(4)
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, Error> {
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .query(&params.pairs())
            .send()
            .await
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after.as_deref(), &body));
        }

        let raw_body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;

        serde_json::from_str(&raw_body).map_err(|e| {
            Error::Json(format!(
                "{} for {}; body={}",
                e,
                url,
                summarize_response_body(&raw_body)
            ))
        })
    }
}
