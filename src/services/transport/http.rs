use async_trait::async_trait;
use tracing::{debug, warn};

use super::CredentialTransport;
use crate::types::credential::{FillResponse, HttpFillRequest, HttpServiceResponse};
use crate::types::errors::RelayError;
use crate::types::settings::TransportKind;

/// POSTs `{action:"fill", url, token}` to the extension server on localhost.
pub struct HttpTransport {
    client: reqwest::Client,
    server_url: String,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), server_url)
    }

    pub fn with_client(client: reqwest::Client, server_url: &str) -> Self {
        Self {
            client,
            server_url: server_url.to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl CredentialTransport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    fn requires_token(&self) -> bool {
        true
    }

    async fn lookup(&self, url: &str, token: Option<&str>) -> Result<FillResponse, RelayError> {
        let token = token.ok_or(RelayError::AuthTokenMissing)?;

        let response = self
            .client
            .post(&self.server_url)
            .json(&HttpFillRequest::fill(url, token))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, server = %self.server_url, "error connecting to server");
                RelayError::TransportUnreachable(e.to_string())
            })?;

        let status = response.status();
        debug!(%status, "response from server");

        let body: HttpServiceResponse = response.json().await.map_err(|e| {
            if status.is_success() {
                RelayError::Protocol(e.to_string())
            } else {
                RelayError::ServiceError(format!("HTTP {}", status))
            }
        })?;

        FillResponse::try_from(body)
    }
}
