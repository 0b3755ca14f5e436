//! Batch request and per-proxy result models

use crate::proxy::geo::{non_empty, GeoLocation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder rendered for an absent value
pub const PLACEHOLDER: &str = "-";

/// Placeholder rendered when a value was expected but the service had none
pub const NOT_AVAILABLE: &str = "N/A";

/// Cell text for a working proxy whose geolocation lookup failed
pub const GEO_ERROR_CELL: &str = "错误";

/// Body of a batch submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Raw newline-delimited proxy list, passed through verbatim
    pub proxies: String,
    pub max_threads: u32,
    pub get_geo_location: bool,
}

impl BatchRequest {
    pub fn new(proxies: String, max_threads: u32) -> Self {
        Self {
            proxies,
            max_threads,
            get_geo_location: true,
        }
    }
}

/// One element of the tester's response array, before it is keyed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawTestEntry {
    pub proxy: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_location: Option<GeoLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_location_error: Option<String>,
}

/// Outcome of testing a single proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Error,
    /// A status value outside the service contract, kept verbatim
    #[serde(untagged)]
    Unrecognized(String),
}

impl TestStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => TestStatus::Success,
            "error" => TestStatus::Error,
            other => TestStatus::Unrecognized(other.to_string()),
        }
    }

    /// Short label used in tables
    pub fn label(&self) -> &str {
        match self {
            TestStatus::Success => "成功",
            TestStatus::Error => "失败",
            TestStatus::Unrecognized(_) => "未知",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Success => write!(f, "success"),
            TestStatus::Error => write!(f, "error"),
            TestStatus::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// Keyed result for one submitted proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyTestResult {
    /// Unique within a result set: proxy plus its response index
    pub key: String,
    pub proxy: String,
    pub status: TestStatus,
    pub ip: Option<String>,
    pub response_time_ms: Option<f64>,
    pub error: Option<String>,
    pub geo_location: Option<GeoLocation>,
    /// Projection of the geolocation city, computed once at aggregation
    pub city: Option<String>,
    /// Projection of the geolocation country, computed once at aggregation
    pub country: Option<String>,
    pub geo_location_error: Option<String>,
}

impl ProxyTestResult {
    pub fn is_success(&self) -> bool {
        self.status == TestStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == TestStatus::Error
    }

    /// Whether the full geolocation detail can be shown for this record
    pub fn has_detail(&self) -> bool {
        self.is_success()
            && self
                .geo_location
                .as_ref()
                .is_some_and(GeoLocation::is_success)
    }

    /// Country used by exports: projected country, then geolocation, then "N/A"
    pub fn export_country(&self) -> &str {
        non_empty(self.country.as_deref())
            .or_else(|| self.geo_location.as_ref().and_then(GeoLocation::country_name))
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn export_ip(&self) -> &str {
        non_empty(self.ip.as_deref()).unwrap_or(NOT_AVAILABLE)
    }

    pub fn ip_cell(&self) -> &str {
        non_empty(self.ip.as_deref()).unwrap_or(PLACEHOLDER)
    }

    pub fn country_cell(&self) -> &str {
        self.geo_cell(self.export_country())
    }

    pub fn city_cell(&self) -> &str {
        let city = non_empty(self.city.as_deref())
            .or_else(|| self.geo_location.as_ref().and_then(GeoLocation::city_name))
            .unwrap_or(NOT_AVAILABLE);
        self.geo_cell(city)
    }

    fn geo_cell<'a>(&'a self, value: &'a str) -> &'a str {
        if !self.is_success() {
            PLACEHOLDER
        } else if self.geo_location_error.is_some() {
            GEO_ERROR_CELL
        } else {
            value
        }
    }

    pub fn response_time_cell(&self) -> String {
        self.response_time_ms
            .map_or_else(|| PLACEHOLDER.to_string(), |ms| format!("{:.2}", ms))
    }

    pub fn error_cell(&self) -> &str {
        non_empty(self.error.as_deref()).unwrap_or(PLACEHOLDER)
    }
}
