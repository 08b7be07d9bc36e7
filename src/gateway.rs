pub mod file;
pub mod http;

pub use file::FileGateway;
pub use http::HttpGateway;

use crate::error::PipelineError;
use crate::model::{Model, RawResponse};
use async_trait::async_trait;

/// Source of raw ranking responses, one per model.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch_model(&self, model: Model) -> Result<RawResponse, PipelineError>;
}

/// Parses a response body; anything that is not JSON is a malformed response.
pub fn parse_body(origin: &str, bytes: &[u8]) -> Result<RawResponse, PipelineError> {
    let body = serde_json::from_slice(bytes).map_err(|err| {
        PipelineError::malformed(origin, format!("response body is not valid JSON: {err}"))
    })?;
    Ok(RawResponse {
        origin: origin.to_string(),
        body,
    })
}
