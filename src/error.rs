//! Error types for submitting batches and consuming their results

use std::path::PathBuf;
use thiserror::Error;

/// Prefix of every banner shown for a failed submission
const SUBMIT_ERROR_PREFIX: &str = "测试代理时出错";

/// Banner shown when a submission failed without a usable error value
const UNKNOWN_SUBMIT_ERROR: &str = "测试代理时发生未知错误。";

/// Local rejection of user input, raised before any request is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("请输入代理列表。")]
    EmptyProxyList,
}

/// Failure of a whole batch submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The service answered with a non-2xx status
    #[error("{message}")]
    Service { status: u16, message: String },

    /// The request never completed or the response body could not be decoded
    #[error("{0}")]
    Transport(String),

    /// The submission ended without a recognizable error value
    #[error("unknown error")]
    Unknown,
}

impl SubmitError {
    /// Message shown to the operator for this failure
    pub fn banner(&self) -> String {
        match self {
            SubmitError::Unknown => UNKNOWN_SUBMIT_ERROR.to_string(),
            other => format!("{}: {}", SUBMIT_ERROR_PREFIX, other),
        }
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        SubmitError::Transport(err.to_string())
    }
}

/// Failure while writing a CSV export
#[derive(Error, Debug)]
pub enum ExportError {
    /// The runtime has nowhere to deliver the file
    #[error("无法保存导出文件到 {path:?}: {reason}")]
    DeliveryUnsupported { path: PathBuf, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to open the detail view for a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailError {
    #[error("no geolocation detail available for {proxy}")]
    NotAvailable { proxy: String },
}
