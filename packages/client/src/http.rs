//! HTTP transport over reqwest.

use async_trait::async_trait;
use careboard_api::ApiRequest;

use crate::config::ClientConfig;
use crate::{ApiTransport, FetchError};

/// [`ApiTransport`] implementation talking to the live occurrence API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport with a fresh client.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Creates a transport reusing an existing client, so callers can
    /// supply their own timeout and TLS settings.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get_json(&self, request: &ApiRequest) -> Result<serde_json::Value, FetchError> {
        let url = format!("{}{}", self.base_url, request.path());
        log::debug!("{}: GET {url}", request.kind);

        let response = self
            .client
            .get(&url)
            .query(&request.params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Server {
                status: status.as_u16(),
            });
        }

        // A body that transfers but fails to decode is a payload
        // problem, not a transport one.
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FetchError::Malformed {
            message: format!("{}: {e}", request.kind),
        })
    }
}
