//! Transports to the local credential service.
//!
//! Each transport owns its wire format and normalizes the service's answer
//! into a [`FillResponse`] before returning it.

pub mod framing;
pub mod http;
pub mod native;

use async_trait::async_trait;

use crate::types::credential::FillResponse;
use crate::types::errors::RelayError;
use crate::types::settings::TransportKind;

pub use http::HttpTransport;
pub use native::NativeTransport;

#[async_trait]
pub trait CredentialTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Whether requests must carry the auth token.
    fn requires_token(&self) -> bool;

    /// Looks up credentials for a page URL.
    async fn lookup(&self, url: &str, token: Option<&str>) -> Result<FillResponse, RelayError>;
}
