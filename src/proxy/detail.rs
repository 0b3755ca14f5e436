//! Geolocation detail for a single selected result

use crate::error::DetailError;
use crate::proxy::geo::GeoLocation;
use crate::proxy::models::{ProxyTestResult, PLACEHOLDER};

/// One labelled line of the detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

impl DetailRow {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

/// Holds at most one selected record
#[derive(Debug, Default)]
pub struct DetailViewer {
    selected: Option<ProxyTestResult>,
}

impl DetailViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a record. Only successful records with a successful lookup qualify.
    pub fn open(&mut self, record: &ProxyTestResult) -> Result<(), DetailError> {
        if !record.has_detail() {
            return Err(DetailError::NotAvailable {
                proxy: record.proxy.clone(),
            });
        }
        self.selected = Some(record.clone());
        Ok(())
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&ProxyTestResult> {
        self.selected.as_ref()
    }

    /// Rows for the selected record, empty when nothing is open
    pub fn rows(&self) -> Vec<DetailRow> {
        self.selected
            .as_ref()
            .and_then(|r| r.geo_location.as_ref())
            .map(detail_rows)
            .unwrap_or_default()
    }
}

/// Labelled geolocation fields, `-` for anything missing
pub fn detail_rows(geo: &GeoLocation) -> Vec<DetailRow> {
    vec![
        DetailRow::new("查询IP (Query IP)", text(&geo.query)),
        DetailRow::new("状态 (Status)", status_text(&geo.status)),
        DetailRow::new("国家 (Country)", with_code(&geo.country, &geo.country_code)),
        DetailRow::new("区域 (Region)", with_code(&geo.region_name, &geo.region)),
        DetailRow::new("城市 (City)", text(&geo.city)),
        DetailRow::new("邮编 (ZIP Code)", text(&geo.zip)),
        DetailRow::new("经度 (Longitude)", number(geo.lon)),
        DetailRow::new("纬度 (Latitude)", number(geo.lat)),
        DetailRow::new("时区 (Timezone)", text(&geo.timezone)),
        DetailRow::new("ISP", text(&geo.isp)),
        DetailRow::new("组织 (Organization)", text(&geo.org)),
        DetailRow::new("AS号码 (AS Number)", text(&geo.as_number)),
    ]
}

fn text(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

fn status_text(status: &str) -> String {
    match status {
        "" => PLACEHOLDER.to_string(),
        "success" => "成功".to_string(),
        other => other.to_string(),
    }
}

fn with_code(name: &Option<String>, code: &Option<String>) -> String {
    format!("{} ({})", text(name), text(code))
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::TestStatus;

    fn record(status: TestStatus, geo: Option<GeoLocation>) -> ProxyTestResult {
        ProxyTestResult {
            key: "p1-0".to_string(),
            proxy: "p1".to_string(),
            status,
            ip: Some("1.2.3.4".to_string()),
            response_time_ms: Some(10.0),
            error: None,
            geo_location: geo,
            city: None,
            country: None,
            geo_location_error: None,
        }
    }

    fn geo() -> GeoLocation {
        GeoLocation {
            status: "success".to_string(),
            country: Some("China".to_string()),
            country_code: Some("CN".to_string()),
            region: Some("BJ".to_string()),
            region_name: Some("Beijing".to_string()),
            city: Some("Beijing".to_string()),
            zip: None,
            lat: Some(39.9),
            lon: Some(116.4),
            timezone: Some("Asia/Shanghai".to_string()),
            isp: Some("China Unicom".to_string()),
            org: None,
            as_number: Some("AS4837".to_string()),
            query: Some("1.2.3.4".to_string()),
        }
    }

    #[test]
    fn test_open_and_close() {
        let mut viewer = DetailViewer::new();
        viewer.open(&record(TestStatus::Success, Some(geo()))).unwrap();
        assert!(viewer.is_open());
        assert_eq!(viewer.selected().unwrap().proxy, "p1");

        viewer.close();
        assert!(!viewer.is_open());
        assert!(viewer.selected().is_none());
        assert!(viewer.rows().is_empty());
    }

    #[test]
    fn test_open_rejects_ineligible_records() {
        let mut viewer = DetailViewer::new();

        let failed_lookup = GeoLocation {
            status: "fail".to_string(),
            ..geo()
        };
        for candidate in [
            record(TestStatus::Success, None),
            record(TestStatus::Success, Some(failed_lookup)),
            record(TestStatus::Error, Some(geo())),
        ] {
            assert_eq!(
                viewer.open(&candidate),
                Err(DetailError::NotAvailable {
                    proxy: "p1".to_string()
                })
            );
            assert!(!viewer.is_open());
        }
    }

    #[test]
    fn test_rows_use_placeholders() {
        let mut viewer = DetailViewer::new();
        viewer.open(&record(TestStatus::Success, Some(geo()))).unwrap();
        let rows = viewer.rows();

        let value = |label: &str| {
            rows.iter()
                .find(|r| r.label == label)
                .map(|r| r.value.clone())
                .unwrap()
        };
        assert_eq!(rows.len(), 12);
        assert_eq!(value("状态 (Status)"), "成功");
        assert_eq!(value("国家 (Country)"), "China (CN)");
        assert_eq!(value("区域 (Region)"), "Beijing (BJ)");
        assert_eq!(value("邮编 (ZIP Code)"), "-");
        assert_eq!(value("组织 (Organization)"), "-");
        assert_eq!(value("经度 (Longitude)"), "116.4");
    }

    #[test]
    fn test_reopen_replaces_selection() {
        let mut viewer = DetailViewer::new();
        viewer.open(&record(TestStatus::Success, Some(geo()))).unwrap();

        let mut other = record(TestStatus::Success, Some(geo()));
        other.proxy = "p2".to_string();
        viewer.open(&other).unwrap();
        assert_eq!(viewer.selected().unwrap().proxy, "p2");
    }
}
