use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Method;
use tracing::{debug, info};

use crate::document::{
    CreateDocumentBody, ProductDocument, DOCUMENT_FORMAT_MANUAL, DOC_TYPE_INTRODUCE_GOODS,
};
use crate::error::{ClientError, Result};
use crate::http::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::limiter::RateLimiter;
use crate::utils::url::{normalize_base_url, normalize_bearer, url_encode};

const CREATE_DOCUMENT_PATH: &str = "/api/v3/lk/documents/create";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings that may change at runtime, swapped atomically as a unit so one
/// call always sees a single consistent snapshot.
#[derive(Debug, Clone, Default)]
struct ClientSettings {
    base_url: Option<String>,
    auth_token: Option<String>,
    product_group: Option<String>,
}

/// Rate-limited client for the CRPT document-creation API.
///
/// All submissions share one limiter, so the configured request limit is
/// global across every caller holding a reference to this client.
pub struct CrptClient {
    limiter: RateLimiter,
    transport: Arc<dyn Transport>,
    settings: ArcSwap<ClientSettings>,
}

impl CrptClient {
    /// Creates a client allowing `request_limit` submissions per `interval`.
    pub fn new(interval: Duration, request_limit: usize) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(interval, request_limit, transport)
    }

    /// Same as [`CrptClient::new`] but with every runtime setting supplied
    /// up front.
    pub fn with_settings(
        interval: Duration,
        request_limit: usize,
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        product_group: impl Into<String>,
    ) -> Result<Self> {
        let client = Self::new(interval, request_limit)?;
        client.set_base_url(base_url);
        client.set_auth_token(auth_token);
        client.set_product_group(product_group);
        Ok(client)
    }

    /// Injection seam: build the client around any [`Transport`].
    pub fn with_transport(
        interval: Duration,
        request_limit: usize,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            limiter: RateLimiter::new(interval, request_limit)?,
            transport,
            settings: ArcSwap::from_pointee(ClientSettings::default()),
        })
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        self.settings.rcu(|current| {
            let mut next = ClientSettings::clone(current);
            next.base_url = Some(base_url.clone());
            next
        });
    }

    pub fn set_auth_token(&self, auth_token: impl Into<String>) {
        let auth_token = auth_token.into();
        self.settings.rcu(|current| {
            let mut next = ClientSettings::clone(current);
            next.auth_token = Some(auth_token.clone());
            next
        });
    }

    pub fn set_product_group(&self, product_group: impl Into<String>) {
        let product_group = product_group.into();
        self.settings.rcu(|current| {
            let mut next = ClientSettings::clone(current);
            next.product_group = Some(product_group.clone());
            next
        });
    }

    /// Submits an "introduce goods" document.
    ///
    /// Blocks (asynchronously) while the current rate-limit window is
    /// exhausted; that wait is the only suspension on shared state. A 2xx
    /// response returns the body verbatim; anything else is
    /// [`ClientError::Api`]. Failed sends still cost a permit for the rest
    /// of the window, and no retry is attempted.
    pub async fn submit(&self, document: &ProductDocument, signature: &str) -> Result<String> {
        if self.limiter.is_closed() {
            return Err(ClientError::Closed);
        }

        // One snapshot per call; later set_* calls affect later submissions.
        let settings = self.settings.load_full();
        let base_url = required(&settings.base_url, "base url (set_base_url)")?;
        let auth_token = required(&settings.auth_token, "auth token (set_auth_token)")?;
        let product_group = required(&settings.product_group, "product group (set_product_group)")?;

        self.limiter.acquire().await?;

        let body = build_request_body(document, signature, product_group)?;
        let url = format!(
            "{}{}?pg={}",
            normalize_base_url(base_url),
            CREATE_DOCUMENT_PATH,
            url_encode(product_group)
        );
        debug!(%url, "submitting document");

        let request = HttpRequest {
            method: Method::POST,
            url,
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                ("Accept", "*/*".to_string()),
                ("Authorization", normalize_bearer(auth_token)),
            ],
            body,
            timeout: REQUEST_TIMEOUT,
        };

        let response = self.transport.send(request).await?;
        if (200..300).contains(&response.status) {
            info!(status = response.status, "document submitted");
            Ok(response.body)
        } else {
            Err(ClientError::Api {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Closes the client: stops the refill task and fails all current and
    /// future submissions. In-flight network sends are not cancelled.
    /// Idempotent.
    pub fn shutdown(&self) {
        self.limiter.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.limiter.is_closed()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ClientError::Config(format!("{what} is not set"))),
    }
}

/// Builds the JSON envelope: the document serialized, base64 encoded, and
/// wrapped with the fixed format/type tags and the detached signature.
fn build_request_body(
    document: &ProductDocument,
    signature: &str,
    product_group: &str,
) -> Result<Vec<u8>> {
    let doc_json = serde_json::to_vec(document)?;
    let body = CreateDocumentBody {
        document_format: DOCUMENT_FORMAT_MANUAL,
        product_document: BASE64.encode(doc_json),
        product_group: product_group.to_string(),
        signature: signature.to_string(),
        doc_type: DOC_TYPE_INTRODUCE_GOODS,
    };
    Ok(serde_json::to_vec(&body)?)
}
