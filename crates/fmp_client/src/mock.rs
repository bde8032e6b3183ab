//! Scripted in-memory transport for tests.
//!
//! Replies are queued per exact URL and consumed in order. Every call is
//! recorded with its parameters and dispatch instant.

use common::{Error, QueryParams};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub params: QueryParams,
    pub at: Instant,
}

#[derive(Debug, Default)]
pub struct StubTransport {
    replies: Mutex<HashMap<String, VecDeque<Result<Value, Error>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every reply for `latency` before returning it.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Queue a reply for `url`.
    pub async fn push(&self, url: &str, reply: Result<Value, Error>) {
        self.replies
            .lock()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub async fn push_json(&self, url: &str, payload: Value) {
        self.push(url, Ok(payload)).await;
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// URLs in dispatch order.
    pub async fn called_urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|c| c.url.clone())
            .collect()
    }
}

impl Transport for StubTransport {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, Error> {
        self.calls.lock().await.push(RecordedCall {
            url: url.to_string(),
            params: params.clone(),
            at: Instant::now(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = self
            .replies
            .lock()
            .await
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        reply.unwrap_or_else(|| {
            Err(Error::Upstream {
                status: 404,
                message: format!("no stubbed reply for {}", url),
            })
        })
    }
}
