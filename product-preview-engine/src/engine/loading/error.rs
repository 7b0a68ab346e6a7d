use crate::engine::assets::model_asset::ModelFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("failed to parse {format} asset {url}: {reason}")]
    Parse {
        url: String,
        format: ModelFormat,
        reason: String,
    },
    #[error("unsupported model format for {url}")]
    UnsupportedFormat { url: String },
}

impl LoadError {
    pub fn network(url: &str, reason: impl ToString) -> Self {
        LoadError::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(url: &str, format: ModelFormat, reason: impl ToString) -> Self {
        LoadError::Parse {
            url: url.to_string(),
            format,
            reason: reason.to_string(),
        }
    }
}
