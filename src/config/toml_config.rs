use crate::config::{
    validate_settings, SettingsView, DEFAULT_BUNDLE_NAME, DEFAULT_CITY_LOOKUP_URL,
    DEFAULT_TIMEOUT_SECONDS, DEFAULT_WORLD_GEOMETRY_URL,
};
use crate::core::ConfigProvider;
use crate::domain::model::{AnalysisOptions, ChartOptions, CleanOptions, ReportMetadata};
use crate::utils::error::{FluxError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    #[serde(default)]
    pub analysis: AnalysisOptions,
    #[serde(default)]
    pub charts: ChartOptions,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub report: ReportMetadata,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub input: String,
    /// 設為空字串可停用
    pub city_lookup: Option<String>,
    pub world_geometry: Option<String>,
    pub strict_lookup: bool,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input: "city_temperature.csv".to_string(),
            city_lookup: Some(DEFAULT_CITY_LOOKUP_URL.to_string()),
            world_geometry: Some(DEFAULT_WORLD_GEOMETRY_URL.to_string()),
            strict_lookup: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub min_year: i32,
    pub max_year: i32,
    pub drop_missing: bool,
    pub missing_sentinel: f64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        let defaults = CleanOptions::default();
        Self {
            min_year: defaults.min_year,
            max_year: defaults.max_year,
            drop_missing: true,
            missing_sentinel: defaults.missing_sentinel.unwrap_or(-99.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub bundle: bool,
    pub bundle_name: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            bundle: true,
            bundle_name: DEFAULT_BUNDLE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FluxError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 日誌層級，例如 "debug"
    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn input(&self) -> &str {
        &self.source.input
    }

    fn city_lookup(&self) -> Option<&str> {
        non_empty(&self.source.city_lookup)
    }

    fn world_geometry(&self) -> Option<&str> {
        non_empty(&self.source.world_geometry)
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn strict_lookup(&self) -> bool {
        self.source.strict_lookup
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    fn bundle_name(&self) -> Option<&str> {
        self.load.bundle.then_some(self.load.bundle_name.as_str())
    }

    fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            min_year: self.clean.min_year,
            max_year: self.clean.max_year,
            missing_sentinel: self.clean.drop_missing.then_some(self.clean.missing_sentinel),
        }
    }

    fn analysis_options(&self) -> AnalysisOptions {
        self.analysis.clone()
    }

    fn chart_options(&self) -> ChartOptions {
        self.charts.clone()
    }

    fn report_metadata(&self) -> ReportMetadata {
        self.report.clone()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        let clean = self.clean_options();
        validate_settings(&SettingsView {
            input: self.input(),
            city_lookup: self.city_lookup(),
            world_geometry: self.world_geometry(),
            output_path: self.output_path(),
            bundle_name: self.bundle_name(),
            clean: &clean,
            analysis: &self.analysis,
            charts: &self.charts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Extremum;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[source]
input = "data/city_temperature.csv"
city_lookup = "https://example.com/cities.csv"
world_geometry = ""
strict_lookup = true
timeout_seconds = 5

[clean]
min_year = 1995
max_year = 2020
drop_missing = false

[analysis]
regions = ["Asia", "Europe"]
cities = ["Cairo"]
year = 2019
extreme = "max"

[charts]
face_color = "F0F0F0"

[load]
output_path = "./flux-output"
bundle = false

[report]
author = "Jane Doe"

[monitoring]
enabled = true
log_level = "debug"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input(), "data/city_temperature.csv");
        assert_eq!(config.city_lookup(), Some("https://example.com/cities.csv"));
        assert_eq!(config.world_geometry(), None);
        assert!(config.strict_lookup());
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.clean_options().min_year, 1995);
        assert_eq!(config.clean_options().missing_sentinel, None);
        assert_eq!(config.analysis_options().extreme, Extremum::Max);
        assert_eq!(config.analysis_options().year, Some(2019));
        assert_eq!(config.analysis_options().region_count, 3);
        assert_eq!(config.chart_options().face_color, "F0F0F0");
        assert_eq!(config.chart_options().width, 1200);
        assert_eq!(config.bundle_name(), None);
        assert_eq!(config.report_metadata().author, "Jane Doe");
        assert_eq!(config.report_metadata().date, "6th December 2024");
        assert!(config.monitoring_enabled());
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.input(), "city_temperature.csv");
        assert_eq!(config.city_lookup(), Some(DEFAULT_CITY_LOOKUP_URL));
        assert_eq!(config.bundle_name(), Some(DEFAULT_BUNDLE_NAME));
        assert_eq!(config.clean_options(), CleanOptions::default());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("WORLD_IN_FLUX_TEST_INPUT", "/data/temps.csv");

        let toml_content = r#"
[source]
input = "${WORLD_IN_FLUX_TEST_INPUT}"
world_geometry = "${WORLD_IN_FLUX_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input(), "/data/temps.csv");
        assert_eq!(config.world_geometry(), Some("${WORLD_IN_FLUX_UNSET_VAR}"));

        std::env::remove_var("WORLD_IN_FLUX_TEST_INPUT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[source]
city_lookup = "ftp://example.com/cities.csv"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[analysis]\nextreme = \"median\"\n");
        assert!(matches!(
            config,
            Err(FluxError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[load]\noutput_path = \"./from-file\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_path(), "./from-file");
    }
}
