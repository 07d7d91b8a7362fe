#[cfg(feature = "cli")]
pub mod cli;
pub mod local;
pub mod toml_config;

use crate::domain::model::{AnalysisOptions, ChartOptions, CleanOptions};
use crate::utils::error::{FluxError, Result};
use crate::utils::validation;

/// 城市名稱 -> 州別對照表 (CSV 匯出)
pub const DEFAULT_CITY_LOOKUP_URL: &str =
    "https://docs.google.com/spreadsheets/d/1o47G_i5MTXnn5EFmhJIRuOLuxLCpUXwTFZDXO1V9YHE/export?format=csv";

/// Natural Earth 1:110m 國界
pub const DEFAULT_WORLD_GEOMETRY_URL: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_admin_0_countries.geojson";

pub const DEFAULT_BUNDLE_NAME: &str = "world_in_flux.zip";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// CLI 與 TOML 設定共用的參數
pub(crate) struct SettingsView<'a> {
    pub input: &'a str,
    pub city_lookup: Option<&'a str>,
    pub world_geometry: Option<&'a str>,
    pub output_path: &'a str,
    pub bundle_name: Option<&'a str>,
    pub clean: &'a CleanOptions,
    pub analysis: &'a AnalysisOptions,
    pub charts: &'a ChartOptions,
}

pub(crate) fn validate_settings(settings: &SettingsView<'_>) -> Result<()> {
    validation::validate_source("source.input", settings.input)?;
    validation::validate_file_extensions("source.input", &[settings.input.to_string()], &["csv"])?;

    if let Some(lookup) = settings.city_lookup {
        validation::validate_source("source.city_lookup", lookup)?;
    }
    if let Some(geometry) = settings.world_geometry {
        validation::validate_source("source.world_geometry", geometry)?;
    }

    validation::validate_path("load.output_path", settings.output_path)?;
    if let Some(name) = settings.bundle_name {
        validation::validate_non_empty_string("load.bundle_name", name)?;
        validation::validate_file_extensions("load.bundle_name", &[name.to_string()], &["zip"])?;
    }

    let clean = settings.clean;
    validation::validate_range("clean.min_year", clean.min_year, 1, 9999)?;
    validation::validate_range("clean.max_year", clean.max_year, 1, 9999)?;
    if clean.min_year > clean.max_year {
        return Err(FluxError::ConfigValidationError {
            field: "clean.min_year".to_string(),
            message: format!(
                "min_year ({}) must not exceed max_year ({})",
                clean.min_year, clean.max_year
            ),
        });
    }

    let analysis = settings.analysis;
    if analysis.regions.is_empty() {
        validation::validate_positive_number("analysis.region_count", analysis.region_count, 1)?;
    }
    for city in &analysis.cities {
        validation::validate_non_empty_string("analysis.cities", city)?;
    }

    let charts = settings.charts;
    validation::validate_hex_color("charts.face_color", &charts.face_color)?;
    validation::validate_range("charts.width", charts.width, 200, 10_000)?;
    validation::validate_range("charts.height", charts.height, 200, 10_000)?;
    validation::validate_range("charts.heatmap_width", charts.heatmap_width, 200, 10_000)?;
    validation::validate_range("charts.heatmap_height", charts.heatmap_height, 200, 10_000)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(
        input: &'a str,
        clean: &'a CleanOptions,
        analysis: &'a AnalysisOptions,
        charts: &'a ChartOptions,
    ) -> SettingsView<'a> {
        SettingsView {
            input,
            city_lookup: Some(DEFAULT_CITY_LOOKUP_URL),
            world_geometry: Some(DEFAULT_WORLD_GEOMETRY_URL),
            output_path: "./output",
            bundle_name: Some(DEFAULT_BUNDLE_NAME),
            clean,
            analysis,
            charts,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let (clean, analysis, charts) = (
            CleanOptions::default(),
            AnalysisOptions::default(),
            ChartOptions::default(),
        );
        assert!(validate_settings(&view("city_temperature.csv", &clean, &analysis, &charts)).is_ok());
    }

    #[test]
    fn test_rejects_inverted_year_range_and_non_csv_input() {
        let (analysis, charts) = (AnalysisOptions::default(), ChartOptions::default());
        let clean = CleanOptions {
            min_year: 2024,
            max_year: 1900,
            ..CleanOptions::default()
        };
        let err = validate_settings(&view("city_temperature.csv", &clean, &analysis, &charts)).unwrap_err();
        assert!(matches!(err, FluxError::ConfigValidationError { .. }));

        let clean = CleanOptions::default();
        assert!(validate_settings(&view("city_temperature.xlsx", &clean, &analysis, &charts)).is_err());
    }

    #[test]
    fn test_rejects_zero_region_count_without_explicit_regions() {
        let (clean, charts) = (CleanOptions::default(), ChartOptions::default());
        let mut analysis = AnalysisOptions {
            region_count: 0,
            ..AnalysisOptions::default()
        };
        assert!(validate_settings(&view("t.csv", &clean, &analysis, &charts)).is_err());

        analysis.regions = vec!["Asia".to_string()];
        assert!(validate_settings(&view("t.csv", &clean, &analysis, &charts)).is_ok());
    }
}
