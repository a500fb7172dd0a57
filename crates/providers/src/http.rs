//! Transport plumbing shared by the HTTP providers.

use kubeclaw_core::error::ProviderError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Used when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// An HTTP client with the provider request timeout applied.
pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a failed send to a timeout or a network error.
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Pass a 2xx response through; turn anything else into a [`ProviderError`].
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after_secs(response.headers());
    let body = response.text().await.unwrap_or_default();
    warn!(provider, status = status.as_u16(), body = %body, "Provider returned an error");
    Err(status_error(provider, status.as_u16(), retry_after, body))
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn status_error(provider: &str, status: u16, retry_after: Option<u64>, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        401 | 403 => ProviderError::AuthenticationFailed(format!(
            "{provider} rejected the API key (HTTP {status})"
        )),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}
