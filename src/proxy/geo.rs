//! Geolocation record attached by the tester to a working proxy's exit IP

use serde::{Deserialize, Serialize};

/// Status value ip-api.com reports for a successful lookup
pub const GEO_STATUS_SUCCESS: &str = "success";

/// Geographic and network information for an exit IP, as returned by ip-api.com
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoLocation {
    /// Lookup status ("success" or "fail")
    #[serde(default)]
    pub status: String,
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code (e.g., "US", "CN")
    #[serde(rename = "countryCode")]
    pub country_code: Option<String>,
    /// Region code (e.g., "CA")
    pub region: Option<String>,
    /// Region name (e.g., "California")
    #[serde(rename = "regionName")]
    pub region_name: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Timezone (e.g., "America/New_York")
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    /// Autonomous system, number and name (e.g., "AS15169 Google LLC")
    #[serde(rename = "as")]
    pub as_number: Option<String>,
    /// The IP address that was looked up
    pub query: Option<String>,
}

impl GeoLocation {
    /// Whether the lookup itself succeeded
    pub fn is_success(&self) -> bool {
        self.status == GEO_STATUS_SUCCESS
    }

    /// Country name, ignoring empty strings
    pub fn country_name(&self) -> Option<&str> {
        non_empty(self.country.as_deref())
    }

    /// City name, ignoring empty strings
    pub fn city_name(&self) -> Option<&str> {
        non_empty(self.city.as_deref())
    }
}

impl std::fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<&str> = [
            self.city_name(),
            non_empty(self.region_name.as_deref()),
            self.country_name(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            write!(f, "Unknown Location")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
