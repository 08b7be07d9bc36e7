use crate::error::PipelineError;
use crate::model::{Model, RawResponse};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{Gateway, parse_body};

/// Serves a previously saved response regardless of the requested model.
#[derive(Debug, Clone)]
pub struct FileGateway {
    path: PathBuf,
}

impl FileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Gateway for FileGateway {
    async fn fetch_model(&self, model: Model) -> Result<RawResponse, PipelineError> {
        let origin = self.path.display().to_string();
        debug!(%model, %origin, "reading saved response");
        let bytes = fs::read(&self.path)
            .await
            .map_err(|err| PipelineError::transport(&origin, format!("failed to read file: {err}")))?;
        parse_body(&origin, &bytes)
    }
}
