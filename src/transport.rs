//! Conversion transport: ship the Document Source to the server.
//!
//! The controller talks to the server only through [`ConversionTransport`],
//! so it can be driven by the real [`HttpTransport`] or by a scripted fake in
//! tests. Requests are described by plain data ([`ConversionRequest`],
//! [`FormField`]) rather than a `reqwest::multipart::Form`, which cannot be
//! inspected after it is built.
//!
//! ## Wire contract
//!
//! ```text
//! POST /convert_text   multipart: markdown-text
//! POST /convert        multipart: markdown-text, file
//!   2xx → PDF bytes, optional Content-Disposition
//!   4xx/5xx → {"error": "..."}
//! GET  /health         {"status": "healthy"}
//! ```
//!
//! Both POSTs carry `X-Requested-With: XMLHttpRequest` so the server answers
//! with JSON errors instead of an HTML redirect.

use crate::config::ClientConfig;
use crate::document::DocumentSource;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Multipart field carrying the text buffer.
pub const MARKDOWN_FIELD: &str = "markdown-text";
/// Multipart field carrying the attached file.
pub const FILE_FIELD: &str = "file";
/// Request-identification header sent with every conversion.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// Server route for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// `/convert_text`: buffer only.
    ConvertText,
    /// `/convert`: attached file (plus buffer).
    ConvertFile,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ConvertText => "/convert_text",
            Endpoint::ConvertFile => "/convert",
        }
    }
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        bytes: Vec<u8>,
    },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

/// A conversion request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub endpoint: Endpoint,
    pub fields: Vec<FormField>,
}

impl ConversionRequest {
    /// Build the payload for the current Document Source.
    ///
    /// The buffer is always sent as `markdown-text`, even when a file is
    /// attached; the server decides which one wins.
    pub fn for_source(source: &DocumentSource) -> Self {
        let mut fields = vec![FormField::Text {
            name: MARKDOWN_FIELD.to_string(),
            value: source.text().to_string(),
        }];

        let endpoint = match source.file() {
            Some(file) => {
                fields.push(FormField::File {
                    name: FILE_FIELD.to_string(),
                    filename: file.name.clone(),
                    bytes: file.bytes.clone(),
                });
                Endpoint::ConvertFile
            }
            None => Endpoint::ConvertText,
        };

        Self { endpoint, fields }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    fn into_form(self) -> Form {
        self.fields
            .into_iter()
            .fold(Form::new(), |form, field| match field {
                FormField::Text { name, value } => form.text(name, value),
                FormField::File {
                    name,
                    filename,
                    bytes,
                } => form.part(name, Part::bytes(bytes).file_name(filename)),
            })
    }
}

/// Whatever the server answered, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResponse {
    pub status: u16,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl ConversionResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` string of a JSON error body, if the body is one.
    pub fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        value.get("error")?.as_str().map(str::to_string)
    }
}

/// Sends conversion requests.
///
/// Non-2xx answers are returned as `Ok(ConversionResponse)`; `Err` is
/// reserved for requests that never got an answer.
#[async_trait]
pub trait ConversionTransport: Send + Sync {
    async fn send(&self, request: ConversionRequest)
        -> Result<ConversionResponse, TransportError>;

    /// True when the server reports itself healthy.
    async fn health(&self) -> Result<bool, TransportError>;
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// [`ConversionTransport`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Network {
                endpoint: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Join an endpoint path onto the base URL, keeping any base path prefix.
    pub fn url_for(&self, path: &str) -> Result<reqwest::Url, TransportError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        reqwest::Url::parse(&joined).map_err(|_| TransportError::InvalidUrl { url: joined })
    }

    fn classify(&self, endpoint: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            TransportError::Network {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ConversionTransport for HttpTransport {
    async fn send(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResponse, TransportError> {
        let endpoint = request.endpoint.path();
        let url = self.url_for(endpoint)?;
        info!("Sending request to: {}", url);

        // `multipart` sets `Content-Type: multipart/form-data; boundary=…`.
        let response = self
            .client
            .post(url)
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
            .multipart(request.into_form())
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        let status = response.status().as_u16();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            // `to_str` rejects non-ASCII bytes; raw UTF-8 filenames must survive.
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(endpoint, e))?
            .to_vec();

        debug!(
            "Response from {}: HTTP {}, {} bytes, disposition {:?}",
            endpoint,
            status,
            body.len(),
            content_disposition
        );

        Ok(ConversionResponse {
            status,
            content_disposition,
            body,
        })
    }

    async fn health(&self) -> Result<bool, TransportError> {
        let endpoint = "/health";
        let response = self
            .client
            .get(self.url_for(endpoint)?)
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        if !response.status().is_success() {
            return Ok(false);
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        Ok(serde_json::from_slice::<HealthBody>(&body)
            .map(|h| h.status == "healthy")
            .unwrap_or(false))
    }
}
