use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::error::Result;
use crate::http::pool::create_http_client;

/// A single outbound HTTP call, fully described as data so transports can be
/// swapped out in tests.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the call and returns whatever status the server gave back.
    /// Only network-level failures (connect, timeout, protocol) are errors
    /// here; classifying the status code is the caller's job.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Production transport backed by the shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: create_http_client()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url.as_str())
            .timeout(request.timeout)
            .body(request.body);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, url = %request.url, "transport call completed");

        Ok(HttpResponse { status, body })
    }
}
