//! Client configuration.
//!
//! Everything the controller and the HTTP transport need to know lives in
//! [`ClientConfig`], built via [`ClientConfigBuilder`]. Callers set only what
//! they care about and rely on the documented defaults for the rest.

use crate::error::ClientError;
use crate::filename::DEFAULT_FILENAME;
use crate::render::RenderOptions;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::controller::ConversionController`] and its
/// [`crate::transport::HttpTransport`].
///
/// # Example
/// ```rust
/// use md2pdf_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8080")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the conversion server. Default: `http://127.0.0.1:5000`.
    ///
    /// Endpoint paths (`/convert`, `/convert_text`, `/health`) are joined onto
    /// it, so a base with a path prefix (`https://host/tools/`) works too.
    pub base_url: String,

    /// Whole-request timeout in seconds. Default: 60.
    ///
    /// Conversion is synchronous on the server side; large documents with many
    /// tables can take a while, so keep this generous.
    pub timeout_secs: u64,

    /// Submit-control label while a request is in flight. Default: `Converting...`.
    pub busy_label: String,

    /// Download name when neither the server nor an attached file suggests
    /// one. Default: `document.pdf`.
    pub default_filename: String,

    /// Live-preview renderer options.
    pub render: RenderOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 60,
            busy_label: "Converting...".to_string(),
            default_filename: DEFAULT_FILENAME.to_string(),
            render: RenderOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn busy_label(mut self, label: impl Into<String>) -> Self {
        self.config.busy_label = label.into();
        self
    }

    pub fn default_filename(mut self, name: impl Into<String>) -> Self {
        self.config.default_filename = name.into();
        self
    }

    pub fn render(mut self, options: RenderOptions) -> Self {
        self.config.render = options;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let c = &self.config;
        match reqwest::Url::parse(&c.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ClientError::InvalidConfig(format!(
                    "base URL must be an http(s) URL, got '{}'",
                    c.base_url
                )))
            }
        }
        if c.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout must be ≥ 1 second".into(),
            ));
        }
        if c.default_filename.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "default filename must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
