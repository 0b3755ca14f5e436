//! Turns the tester's response array into a keyed result set

use crate::proxy::geo::non_empty;
use crate::proxy::models::{ProxyTestResult, RawTestEntry, TestStatus};
use serde::Serialize;
use tracing::{debug, warn};

/// Aggregated results of one submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub records: Vec<ProxyTestResult>,
    pub success_count: usize,
    pub error_count: usize,
    /// Records whose status was outside the service contract
    pub unrecognized_count: usize,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Successful records in result order
    pub fn successes(&self) -> impl Iterator<Item = &ProxyTestResult> {
        self.records.iter().filter(|r| r.is_success())
    }

    pub fn get(&self, index: usize) -> Option<&ProxyTestResult> {
        self.records.get(index)
    }
}

/// Key each entry by its position and count outcomes
pub fn aggregate(entries: Vec<RawTestEntry>) -> ResultSet {
    let mut set = ResultSet {
        records: Vec::with_capacity(entries.len()),
        ..Default::default()
    };

    for (index, entry) in entries.into_iter().enumerate() {
        let record = into_record(index, entry);
        match &record.status {
            TestStatus::Success => set.success_count += 1,
            TestStatus::Error => set.error_count += 1,
            TestStatus::Unrecognized(raw) => {
                warn!(proxy = %record.proxy, status = %raw, "Unrecognized status from tester");
                set.unrecognized_count += 1;
            }
        }
        set.records.push(record);
    }

    debug!(
        total = set.len(),
        success = set.success_count,
        error = set.error_count,
        "Aggregated batch results"
    );
    set
}

fn into_record(index: usize, entry: RawTestEntry) -> ProxyTestResult {
    let key = format!("{}-{}", entry.proxy, index);
    let status = TestStatus::parse(&entry.status);

    if status != TestStatus::Success {
        if entry.ip.is_some() || entry.response_time_ms.is_some() || entry.geo_location.is_some() {
            debug!(proxy = %entry.proxy, "Dropping success-only fields from failed record");
        }
        return ProxyTestResult {
            key,
            proxy: entry.proxy,
            status,
            ip: None,
            response_time_ms: None,
            error: entry.error,
            geo_location: None,
            city: None,
            country: None,
            geo_location_error: entry.geo_location_error,
        };
    }

    // The geolocation record wins over the flat copies when the lookup succeeded
    let geo = entry.geo_location.as_ref().filter(|g| g.is_success());
    let city = geo
        .and_then(|g| g.city_name())
        .or_else(|| non_empty(entry.city.as_deref()))
        .map(String::from);
    let country = geo
        .and_then(|g| g.country_name())
        .or_else(|| non_empty(entry.country.as_deref()))
        .map(String::from);

    ProxyTestResult {
        key,
        proxy: entry.proxy,
        status,
        ip: entry.ip,
        response_time_ms: entry.response_time_ms,
        error: entry.error,
        geo_location: entry.geo_location,
        city,
        country,
        geo_location_error: entry.geo_location_error,
    }
}
