use crate::config::{Endpoints, Settings};
use crate::error::{PipelineError, describe_error};
use crate::model::{Model, RawResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{Gateway, parse_body};

/// Fetches a model's rankings from its configured endpoint. Failures are not
/// retried.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    endpoints: Endpoints,
}

impl HttpGateway {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(client, settings.endpoints.clone()))
    }

    pub const fn with_client(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_model(&self, model: Model) -> Result<RawResponse, PipelineError> {
        let url = self.endpoints.url(model);
        debug!(%model, url, "requesting rankings");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| PipelineError::transport(url, describe_error(&err)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                %model,
                url,
                status = status.as_u16(),
                "endpoint answered with an error status"
            );
            return Err(PipelineError::status(url, status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|err| {
            let detail = describe_error(&err);
            PipelineError::transport(url, format!("failed to read response body: {detail}"))
        })?;
        debug!(%model, bytes = bytes.len(), "received response body");
        parse_body(url, &bytes)
    }
}
