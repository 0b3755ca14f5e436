//! Application configuration

use crate::proxy::client::{BatchClient, DEFAULT_BACKEND_URL};
use crate::proxy::export::CsvExporter;
use crate::proxy::validator::DEFAULT_MAX_THREADS;
use std::path::PathBuf;

/// Runtime configuration shared by the CLI and the TUI
#[derive(Debug, Clone)]
pub struct Config {
    /// Tester endpoint receiving batch submissions
    pub backend_url: String,
    /// Thread count pre-filled in the UI
    pub default_threads: u32,
    /// Directory CSV exports are written to
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            default_threads: DEFAULT_MAX_THREADS,
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend_url(mut self, url: String) -> Self {
        self.backend_url = url;
        self
    }

    pub fn with_default_threads(mut self, threads: u32) -> Self {
        self.default_threads = threads;
        self
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    pub fn client(&self) -> BatchClient {
        BatchClient::new(self.backend_url.clone())
    }

    pub fn exporter(&self) -> CsvExporter {
        CsvExporter::new(self.export_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.default_threads, 10);
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_backend_url("http://tester.internal/test_proxies".to_string())
            .with_default_threads(32)
            .with_export_dir(PathBuf::from("/tmp/exports"));

        assert_eq!(config.client().endpoint(), "http://tester.internal/test_proxies");
        assert_eq!(config.default_threads, 32);
        assert_eq!(config.exporter().output_dir(), PathBuf::from("/tmp/exports").as_path());
    }
}
