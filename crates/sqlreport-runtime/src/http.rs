//! HTTP client for the remote SQL executor.

use crate::error::{UpstreamError, preview};
use crate::executor::SqlExecutor;
use crate::upstream::{UpstreamContext, validate_endpoint_url};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response, StatusCode, redirect};
use serde::Serialize;
use serde_json::Value;
use sqlreport_core::UpstreamConfig;
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecRequest<'a> {
    query: &'a str,
    as_dict: bool,
    with_description: bool,
}

/// [`SqlExecutor`] that POSTs queries to an HTTP endpoint.
///
/// Redirects are not followed by the client; a 3xx answer is followed once
/// by re-sending the same POST to its `Location`, which must pass the same
/// endpoint checks as the configured URL.
#[derive(Debug, Clone)]
pub struct HttpSqlExecutor {
    client: Client,
    allow_localhost: bool,
    required_path_suffix: Option<String>,
}

impl HttpSqlExecutor {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            allow_localhost: true,
            required_path_suffix: None,
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        Ok(Self::new(Duration::from_millis(config.timeout_ms))?
            .with_endpoint_policy(config.allow_localhost, config.path_suffix()))
    }

    /// Endpoint checks applied to redirect targets.
    pub fn with_endpoint_policy(mut self, allow_localhost: bool, required_path_suffix: Option<&str>) -> Self {
        self.allow_localhost = allow_localhost;
        self.required_path_suffix = required_path_suffix.map(str::to_string);
        self
    }

    async fn post(&self, url: &str, bearer: &str, body: &ExecRequest<'_>) -> Result<Response, UpstreamError> {
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }
}

#[async_trait]
impl SqlExecutor for HttpSqlExecutor {
    async fn execute(&self, ctx: &UpstreamContext, sql: &str) -> Result<Value, UpstreamError> {
        let body = ExecRequest {
            query: sql,
            as_dict: true,
            with_description: true,
        };

        let mut response = self.post(&ctx.endpoint_url, &ctx.bearer, &body).await?;
        if response.status().is_redirection() {
            let location = response.headers().get(LOCATION).and_then(|v| v.to_str().ok());
            let target = self.redirect_target(&ctx.endpoint_url, response.status(), location)?;
            tracing::debug!(status = %response.status(), location = %target, "Following executor redirect");
            response = self.post(target.as_str(), &ctx.bearer, &body).await?;
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        decode_payload(status, content_type, &raw)
    }
}

impl HttpSqlExecutor {
    fn redirect_target(
        &self,
        endpoint: &str,
        status: StatusCode,
        location: Option<&str>,
    ) -> Result<Url, UpstreamError> {
        let location = location
            .ok_or_else(|| UpstreamError::Transport(format!("HTTP {} without Location", status.as_u16())))?;
        let base = Url::parse(endpoint).map_err(|e| UpstreamError::InvalidEndpoint(e.to_string()))?;
        let target = base
            .join(location)
            .map_err(|e| UpstreamError::Transport(format!("invalid redirect Location: {e}")))?;
        validate_endpoint_url(
            target.as_str(),
            self.allow_localhost,
            self.required_path_suffix.as_deref(),
        )
    }
}

/// Classify an executor response and parse its JSON body.
fn decode_payload(
    status: StatusCode,
    content_type: Option<String>,
    raw: &str,
) -> Result<Value, UpstreamError> {
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            content_type,
            preview: preview(raw),
        });
    }
    if raw.trim().is_empty() {
        return Err(UpstreamError::EmptyBody {
            status: status.as_u16(),
        });
    }

    let text = raw.trim_start();
    let looks_json = text.starts_with('{') || text.starts_with('[');
    if !looks_json && !content_type.as_deref().is_some_and(is_json_media_type) {
        return Err(UpstreamError::NotJson {
            content_type,
            preview: preview(text),
        });
    }

    serde_json::from_str(text).map_err(|e| UpstreamError::Decode(e.to_string()))
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
