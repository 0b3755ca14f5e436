//! CSV export of working proxies

use crate::error::ExportError;
use crate::proxy::aggregator::ResultSet;
use crate::proxy::models::ProxyTestResult;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Header row of the exported file
pub const CSV_HEADER: [&str; 3] = ["原始代理", "IP地址", "国家"];

/// Notice shown when there is nothing to export
pub const NOTHING_TO_EXPORT: &str = "当前没有通过测试的代理可供下载。";

/// Result of an export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// File written to the given path
    Written { path: PathBuf, rows: usize },
    /// No successful proxies; nothing was written
    NothingToExport,
}

/// Writes successful proxies to timestamped CSV files
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export using the current local time for the file name
    pub fn export(&self, results: &ResultSet) -> Result<ExportOutcome, ExportError> {
        self.export_at(results, Local::now())
    }

    pub fn export_at(
        &self,
        results: &ResultSet,
        now: DateTime<Local>,
    ) -> Result<ExportOutcome, ExportError> {
        let successes: Vec<&ProxyTestResult> = results.successes().collect();
        if successes.is_empty() {
            info!("No successful proxies to export");
            return Ok(ExportOutcome::NothingToExport);
        }

        if !self.output_dir.is_dir() {
            return Err(ExportError::DeliveryUnsupported {
                path: self.output_dir.clone(),
                reason: "export directory does not exist".to_string(),
            });
        }

        let content = render_csv(&successes)?;
        let path = self.output_dir.join(file_name(now));
        fs::write(&path, content)?;

        info!(path = %path.display(), rows = successes.len(), "Exported successful proxies");
        Ok(ExportOutcome::Written {
            path,
            rows: successes.len(),
        })
    }
}

/// `successful_proxies_<YYYYMMDDHHMMSS>.csv`
pub fn file_name(now: DateTime<Local>) -> String {
    format!("successful_proxies_{}.csv", now.format("%Y%m%d%H%M%S"))
}

/// Render the header and one row per record, rows joined by `\n`.
///
/// Fields are quoted only when they contain a delimiter, quote or line break.
pub fn render_csv(records: &[&ProxyTestResult]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.proxy.as_str(),
            record.export_ip(),
            record.export_country(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    let mut content = String::from_utf8_lossy(&bytes).into_owned();
    if content.ends_with('\n') {
        content.pop();
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::aggregator::aggregate;
    use crate::proxy::models::RawTestEntry;
    use chrono::TimeZone;

    fn entry(proxy: &str, status: &str) -> RawTestEntry {
        RawTestEntry {
            proxy: proxy.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("proxy-batch-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_single_success_row() {
        let set = aggregate(vec![RawTestEntry {
            ip: Some("1.2.3.4".to_string()),
            country: Some("China".to_string()),
            ..entry("http://1.2.3.4:8080", "success")
        }]);
        let records: Vec<_> = set.successes().collect();

        assert_eq!(
            render_csv(&records).unwrap(),
            "原始代理,IP地址,国家\nhttp://1.2.3.4:8080,1.2.3.4,China"
        );
    }

    #[test]
    fn test_missing_fields_render_not_available() {
        let set = aggregate(vec![entry("p1", "success")]);
        let records: Vec<_> = set.successes().collect();

        assert_eq!(render_csv(&records).unwrap(), "原始代理,IP地址,国家\np1,N/A,N/A");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let set = aggregate(vec![RawTestEntry {
            ip: Some("1.2.3.4".to_string()),
            country: Some("Korea, Republic of".to_string()),
            ..entry("p1", "success")
        }]);
        let records: Vec<_> = set.successes().collect();

        assert_eq!(
            render_csv(&records).unwrap(),
            "原始代理,IP地址,国家\np1,1.2.3.4,\"Korea, Republic of\""
        );
    }

    #[test]
    fn test_successful_geolocation_overrides_flat_country() {
        let raw: RawTestEntry = serde_json::from_value(serde_json::json!({
            "proxy": "p1",
            "status": "success",
            "country": "Flat",
            "geo_location": {"status": "success", "country": "Geo"}
        }))
        .unwrap();
        let set = aggregate(vec![raw]);
        let records: Vec<_> = set.successes().collect();

        assert_eq!(render_csv(&records).unwrap(), "原始代理,IP地址,国家\np1,N/A,Geo");
    }

    #[test]
    fn test_failed_geolocation_keeps_flat_country() {
        let raw: RawTestEntry = serde_json::from_value(serde_json::json!({
            "proxy": "p1",
            "status": "success",
            "country": "Flat",
            "geo_location": {"status": "fail", "country": "Geo"}
        }))
        .unwrap();
        let set = aggregate(vec![raw]);
        let records: Vec<_> = set.successes().collect();

        assert_eq!(render_csv(&records).unwrap(), "原始代理,IP地址,国家\np1,N/A,Flat");
    }

    #[test]
    fn test_file_name_is_zero_padded() {
        let now = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(file_name(now), "successful_proxies_20240307090502.csv");
    }

    #[test]
    fn test_export_writes_only_successes_in_order() {
        let dir = temp_dir();
        let set = aggregate(vec![
            RawTestEntry {
                ip: Some("1.1.1.1".to_string()),
                ..entry("a", "success")
            },
            entry("b", "error"),
            RawTestEntry {
                ip: Some("3.3.3.3".to_string()),
                ..entry("c", "success")
            },
        ]);
        let now = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap();

        let outcome = CsvExporter::new(&dir).export_at(&set, now).unwrap();
        let expected_path = dir.join("successful_proxies_20241231235958.csv");
        assert_eq!(
            outcome,
            ExportOutcome::Written {
                path: expected_path.clone(),
                rows: set.success_count,
            }
        );

        let content = fs::read_to_string(&expected_path).unwrap();
        assert_eq!(content, "原始代理,IP地址,国家\na,1.1.1.1,N/A\nc,3.3.3.3,N/A");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_nothing_to_export() {
        let dir = temp_dir();
        let set = aggregate(vec![entry("p1", "error")]);

        let outcome = CsvExporter::new(&dir).export(&set).unwrap();
        assert_eq!(outcome, ExportOutcome::NothingToExport);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_delivery_error() {
        let dir = std::env::temp_dir().join(format!("proxy-batch-missing-{}", uuid::Uuid::new_v4()));
        let set = aggregate(vec![entry("p1", "success")]);

        let err = CsvExporter::new(&dir).export(&set).unwrap_err();
        assert!(matches!(err, ExportError::DeliveryUnsupported { .. }));
    }
}
