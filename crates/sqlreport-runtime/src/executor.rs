use crate::error::UpstreamError;
use crate::upstream::UpstreamContext;
use async_trait::async_trait;

/// Executes rendered SQL somewhere else and returns its JSON payload,
/// typically `{"data": [...], "description": [...]}`.
///
/// Implementations must not retry; repeating a call is up to the caller.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(
        &self,
        ctx: &UpstreamContext,
        sql: &str,
    ) -> Result<serde_json::Value, UpstreamError>;
}
