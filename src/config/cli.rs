use crate::config::{
    validate_settings, SettingsView, DEFAULT_BUNDLE_NAME, DEFAULT_CITY_LOOKUP_URL,
    DEFAULT_TIMEOUT_SECONDS, DEFAULT_WORLD_GEOMETRY_URL,
};
use crate::core::ConfigProvider;
use crate::domain::model::{
    AnalysisOptions, ChartOptions, CleanOptions, Extremum, ReportMetadata, DEFAULT_CITIES,
};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "world-in-flux")]
#[command(about = "Unravel global temperature trends from daily city temperature data")]
pub struct CliConfig {
    /// Daily city temperature CSV (path or http(s) URL)
    #[arg(short, long, default_value = "city_temperature.csv")]
    pub input: String,

    /// City name -> state lookup CSV (path or http(s) URL)
    #[arg(long, default_value = DEFAULT_CITY_LOOKUP_URL)]
    pub city_lookup: String,

    /// Skip the city lookup and keep the states found in the input
    #[arg(long)]
    pub no_city_lookup: bool,

    /// Fail when the city lookup cannot be loaded
    #[arg(long)]
    pub strict_lookup: bool,

    /// Country polygons as GeoJSON (path or http(s) URL)
    #[arg(long, default_value = DEFAULT_WORLD_GEOMETRY_URL)]
    pub world_geometry: String,

    /// Draw the heatmap as a tile grid without country polygons
    #[arg(long)]
    pub no_geometry: bool,

    #[arg(short, long, default_value = "./output")]
    pub output_path: String,

    /// Do not package the outputs into a ZIP bundle
    #[arg(long)]
    pub no_zip: bool,

    /// Regions for the seasonal chart (default: first --region-count regions in the data)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    #[arg(long, default_value_t = 3)]
    pub region_count: usize,

    /// Cities for the daily trend chart
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_CITIES.map(String::from))]
    pub cities: Vec<String>,

    /// Year for the daily trend chart (default: first year recorded for the cities)
    #[arg(long)]
    pub year: Option<i32>,

    /// Annotate the coldest or the warmest region
    #[arg(long, value_enum, default_value_t = Extremum::Min)]
    pub extreme: Extremum,

    #[arg(long, default_value_t = 1900)]
    pub min_year: i32,

    #[arg(long, default_value_t = 2024)]
    pub max_year: i32,

    /// Fahrenheit value marking a missing reading
    #[arg(long, default_value_t = -99.0, allow_hyphen_values = true)]
    pub missing_sentinel: f64,

    /// Keep rows carrying the missing-value sentinel
    #[arg(long)]
    pub keep_missing: bool,

    /// Chart background color (hex)
    #[arg(long, default_value = "FFFFFF")]
    pub face_color: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    /// TOML configuration file; replaces the flags above
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    /// Extract and transform only; nothing is written
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    fn clean(&self) -> CleanOptions {
        CleanOptions {
            min_year: self.min_year,
            max_year: self.max_year,
            missing_sentinel: (!self.keep_missing).then_some(self.missing_sentinel),
        }
    }

    fn analysis(&self) -> AnalysisOptions {
        AnalysisOptions {
            regions: self.regions.clone(),
            region_count: self.region_count,
            cities: self.cities.clone(),
            year: self.year,
            extreme: self.extreme,
        }
    }

    fn charts(&self) -> ChartOptions {
        ChartOptions {
            face_color: self.face_color.clone(),
            ..ChartOptions::default()
        }
    }
}

impl ConfigProvider for CliConfig {
    fn input(&self) -> &str {
        &self.input
    }

    fn city_lookup(&self) -> Option<&str> {
        (!self.no_city_lookup).then_some(self.city_lookup.as_str())
    }

    fn world_geometry(&self) -> Option<&str> {
        (!self.no_geometry).then_some(self.world_geometry.as_str())
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn strict_lookup(&self) -> bool {
        self.strict_lookup
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn bundle_name(&self) -> Option<&str> {
        (!self.no_zip).then_some(DEFAULT_BUNDLE_NAME)
    }

    fn clean_options(&self) -> CleanOptions {
        self.clean()
    }

    fn analysis_options(&self) -> AnalysisOptions {
        self.analysis()
    }

    fn chart_options(&self) -> ChartOptions {
        self.charts()
    }

    fn report_metadata(&self) -> ReportMetadata {
        ReportMetadata::default()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let (clean, analysis, charts) = (self.clean(), self.analysis(), self.charts());
        validate_settings(&SettingsView {
            input: &self.input,
            city_lookup: self.city_lookup(),
            world_geometry: self.world_geometry(),
            output_path: &self.output_path,
            bundle_name: self.bundle_name(),
            clean: &clean,
            analysis: &analysis,
            charts: &charts,
        })
    }
}
