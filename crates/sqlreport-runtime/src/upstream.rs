//! Remote SQL executor endpoint and credential handling.

use crate::error::UpstreamError;
use sqlreport_core::UpstreamConfig;
use url::Url;

const MAX_URL_CHARS: usize = 2048;

/// Where and as whom a rendered query is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamContext {
    pub endpoint_url: String,
    /// Full `Authorization` header value, `Bearer <token>`.
    pub bearer: String,
}

impl UpstreamContext {
    pub fn new(endpoint_url: impl Into<String>, bearer: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            bearer: bearer.into(),
        }
    }

    /// Build a context from configuration and an optional caller-supplied
    /// `Authorization` header. The header wins over the configured token.
    pub fn from_config(
        config: &UpstreamConfig,
        authorization: Option<&str>,
    ) -> Result<Self, UpstreamError> {
        let endpoint = config
            .sql_exec_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                UpstreamError::InvalidEndpoint("no SQL executor URL configured".to_string())
            })?;
        validate_endpoint_url(endpoint, config.allow_localhost, config.path_suffix())?;

        let token = config.resolve_api_token();
        let bearer = resolve_bearer(authorization, token.as_deref())?;
        Ok(Self::new(endpoint, bearer))
    }
}

/// Check an executor URL before any request is made.
///
/// The URL must be at most 2048 characters, use http or https, name a host,
/// not point at localhost unless `allow_localhost`, and have a path ending
/// in `required_suffix` when one is given.
pub fn validate_endpoint_url(
    url: &str,
    allow_localhost: bool,
    required_suffix: Option<&str>,
) -> Result<Url, UpstreamError> {
    let invalid = |reason: String| UpstreamError::InvalidEndpoint(reason);

    if url.chars().count() > MAX_URL_CHARS {
        return Err(invalid("URL too long".to_string()));
    }
    let parsed = Url::parse(url).map_err(|e| invalid(format!("invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("URL must be http(s)".to_string()));
    }
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("URL has no host".to_string()))?;

    if !allow_localhost && (host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1") {
        return Err(invalid("localhost is blocked".to_string()));
    }

    if let Some(suffix) = required_suffix.filter(|s| !s.trim().is_empty())
        && !parsed.path().ends_with(suffix)
    {
        return Err(invalid(format!("path must end with {suffix}")));
    }

    Ok(parsed)
}

/// Pick the bearer credential for the executor.
///
/// A non-blank `authorization` header must use the Bearer scheme and is
/// preferred; otherwise `api_token` is used. Returns `Bearer <token>`.
pub fn resolve_bearer(
    authorization: Option<&str>,
    api_token: Option<&str>,
) -> Result<String, UpstreamError> {
    let auth = authorization.map(str::trim).unwrap_or_default();
    if !auth.is_empty() {
        let token = strip_bearer(auth).ok_or_else(|| {
            UpstreamError::MissingCredential("Authorization must use Bearer".to_string())
        })?;
        if token.is_empty() {
            return Err(UpstreamError::MissingCredential("empty Bearer token".to_string()));
        }
        return Ok(format!("Bearer {token}"));
    }

    let token = api_token.map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return Err(UpstreamError::MissingCredential(
            "no upstream token: send a Bearer authorization or configure an API token".to_string(),
        ));
    }
    Ok(format!("Bearer {token}"))
}

fn strip_bearer(header: &str) -> Option<&str> {
    const SCHEME: &str = "bearer ";
    let head = header.get(..SCHEME.len())?;
    head.eq_ignore_ascii_case(SCHEME)
        .then(|| header[SCHEME.len()..].trim())
}
