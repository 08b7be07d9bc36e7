use thiserror::Error;

/// Failures of a fetch-and-render cycle. Per-record field defects never end
/// up here; the normalizer absorbs them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {origin}: {detail}")]
    Transport {
        origin: String,
        status: Option<u16>,
        detail: String,
    },

    #[error("malformed response from {origin}: {reason}")]
    MalformedResponse { origin: String, reason: String },
}

impl PipelineError {
    pub fn transport(origin: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Transport {
            origin: origin.into(),
            status: None,
            detail: detail.into(),
        }
    }

    pub fn status(origin: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            origin: origin.into(),
            status: Some(status),
            detail: format!("HTTP status {status}"),
        }
    }

    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::MalformedResponse { .. } => None,
        }
    }
}

/// Flattens an error chain into one line, `caused by` between links.
pub fn describe_error(error: &(dyn std::error::Error + 'static)) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(cause) = current {
        let text = cause.to_string();
        if !text.is_empty() {
            if pieces.is_empty() {
                pieces.push(text);
            } else {
                pieces.push(format!("caused by {text}"));
            }
        }
        current = cause.source();
    }

    if pieces.is_empty() {
        format!("{error:?}")
    } else {
        pieces.join(" | ")
    }
}
