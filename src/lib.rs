//! Proxy Batch - batch proxy testing client
//!
//! Submits a list of proxies to a remote testing service and turns the
//! response into stats, a results table, a CSV export and per-proxy
//! geolocation details.

pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod tui;

pub use config::Config;
pub use error::{DetailError, ExportError, SubmitError, ValidationError};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
