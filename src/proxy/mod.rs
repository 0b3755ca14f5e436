//! Proxy batch testing pipeline
//!
//! This module provides functionality for:
//! - Validating raw proxy text before submission
//! - Submitting a batch to the remote tester and tracking its state
//! - Aggregating the response into a keyed result set with counts
//! - Exporting working proxies to CSV
//! - Showing geolocation detail for a single result

pub mod aggregator;
pub mod client;
pub mod detail;
pub mod export;
pub mod geo;
pub mod models;
pub mod orchestrator;
pub mod validator;

pub use aggregator::{aggregate, ResultSet};
pub use client::{BatchClient, DEFAULT_BACKEND_URL};
pub use detail::{DetailRow, DetailViewer};
pub use export::{CsvExporter, ExportOutcome};
pub use geo::GeoLocation;
pub use models::{BatchRequest, ProxyTestResult, RawTestEntry, TestStatus};
pub use orchestrator::{Orchestrator, SubmissionState};
pub use validator::{validate, Submission, DEFAULT_MAX_THREADS};
