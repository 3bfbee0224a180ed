//! URL helpers shared by the relay and the popup.

use url::Url;

use crate::types::errors::RelayError;

/// Reduces a page URL to `scheme://host` for lookups. Only http and https
/// pages can have stored logins.
pub fn normalize_origin(input: &str) -> Result<String, RelayError> {
    let url = Url::parse(input).map_err(|_| RelayError::InvalidUrl(input.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(RelayError::InvalidUrl(input.to_string())),
    }
    let host = url
        .host_str()
        .ok_or_else(|| RelayError::InvalidUrl(input.to_string()))?;
    Ok(format!("{}://{}", url.scheme(), host))
}

/// Hostname shown to the user, or the raw input when it does not parse.
pub fn domain_of(input: &str) -> String {
    Url::parse(input)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| input.to_string())
}
