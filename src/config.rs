use crate::error::ReportError;
use crate::reports::Page;
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "report_config.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// CSV export of the published sheet.
    pub data_path: PathBuf,
    /// Where xlsx downloads and `summary.json` are written.
    pub output_dir: PathBuf,
    pub log_level: String,
    pub page: Page,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_path: PathBuf::from("eficiencia_operativa.csv"),
            output_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            page: Page::General,
        }
    }
}

impl AppConfig {
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
