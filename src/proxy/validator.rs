//! Input validation run before a batch is submitted

use crate::error::ValidationError;
use crate::proxy::models::BatchRequest;

/// Thread count used when the operator gives none or a non-positive one
pub const DEFAULT_MAX_THREADS: u32 = 10;

/// Validated input, ready to become a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Raw proxy text, untouched
    pub proxies: String,
    pub max_threads: u32,
}

impl Submission {
    pub fn into_request(self) -> BatchRequest {
        BatchRequest::new(self.proxies, self.max_threads)
    }
}

/// Validate raw proxy text and a thread count.
///
/// The text is only checked for emptiness; splitting it into proxies is left
/// to the testing service.
pub fn validate(raw: &str, max_threads: Option<i64>) -> Result<Submission, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyProxyList);
    }

    Ok(Submission {
        proxies: raw.to_string(),
        max_threads: effective_max_threads(max_threads),
    })
}

/// Positive values pass through, anything else becomes the default
pub fn effective_max_threads(max_threads: Option<i64>) -> u32 {
    match max_threads {
        Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => DEFAULT_MAX_THREADS,
    }
}
