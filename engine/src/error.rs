use std::path::PathBuf;

use thiserror::Error;

use crate::{open_ai::OpenAIApiError, stages::Stage};

/// Failures a pipeline run can end with.
///
/// Engine functions return `color_eyre::Result`, so these travel inside an
/// `eyre::Report`. Use `report.downcast_ref::<PipelineError>()` to classify.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: TransportFailure,
    },

    #[error("Couldn't fetch image from {url}: {reason}")]
    ResourceFetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} stage produced empty output")]
    EmptyOutput { stage: Stage },
}

#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Api(#[from] OpenAIApiError),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl PipelineError {
    pub(crate) fn transport(endpoint: &'static str, failure: impl Into<TransportFailure>) -> Self {
        Self::Transport {
            endpoint,
            source: failure.into(),
        }
    }

    pub(crate) fn malformed(endpoint: &'static str, what: impl Into<String>) -> Self {
        Self::Transport {
            endpoint,
            source: TransportFailure::Malformed(what.into()),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
