use crate::adapters::{fetch_remote, SourceLocation};
use crate::analysis::{
    available_years, city_trends, country_averages, default_regions, hottest_country,
    parse_city_lookup_csv, parse_temperature_csv, preprocess, regional_averages, regional_extreme,
    seasonal_trends, write_cleaned_csv,
};
use crate::core::{ConfigProvider, ExtractedData, Pipeline, Storage, TransformResult};
use crate::domain::model::{
    AnalysisSummary, Artifact, CityPeak, CityStateMapping, TemperatureRecord, WorldGeometry,
};
use crate::render::charts::{BAR_CHART_FILE, CITY_TREND_CHART_FILE, SEASONAL_CHART_FILE};
use crate::render::heatmap::HEATMAP_FILE;
use crate::render::report::REPORT_FILE;
use crate::render::{bar_chart, city_trend_chart, heatmap, render_report, seasonal_chart, Figure};
use crate::utils::error::{FluxError, Result};
use reqwest::Client;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const CLEANED_DATA_FILE: &str = "cleaned_data.csv";
pub const SUMMARY_FILE: &str = "summary.json";

const SVG: &str = "image/svg+xml";

pub struct FluxPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> FluxPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    async fn read_source(&self, location: &str) -> Result<Vec<u8>> {
        let source = SourceLocation::parse(location);
        tracing::debug!(
            "Reading {} source {}",
            if source.is_remote() { "remote" } else { "local" },
            source
        );
        match source {
            SourceLocation::Remote(url) => {
                fetch_remote(&self.client, &url, self.config.request_timeout()).await
            }
            SourceLocation::Local(path) => self.storage.read_file(&path).await,
        }
    }

    async fn load_city_lookup(&self) -> Result<Vec<CityStateMapping>> {
        let Some(location) = self.config.city_lookup() else {
            tracing::debug!("City lookup disabled");
            return Ok(Vec::new());
        };

        let loaded = match self.read_source(location).await {
            Ok(bytes) => parse_city_lookup_csv(&bytes),
            Err(e) => Err(e),
        };

        match loaded {
            Ok(mappings) => Ok(mappings),
            Err(e) if self.config.strict_lookup() => Err(e),
            Err(e) => {
                tracing::warn!(
                    "Could not load city lookup from {}: {}; keeping states from the input",
                    location,
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn load_world_geometry(&self) -> Option<WorldGeometry> {
        let location = self.config.world_geometry()?;

        let loaded = match self.read_source(location).await {
            Ok(bytes) => WorldGeometry::from_geojson(&bytes),
            Err(e) => Err(e),
        };

        match loaded {
            Ok(world) => Some(world),
            Err(e) => {
                tracing::warn!(
                    "Could not load world geometry from {}: {}; drawing the heatmap as a tile grid",
                    location,
                    e
                );
                None
            }
        }
    }

    fn render_charts(
        &self,
        records: &[TemperatureRecord],
        world: Option<&WorldGeometry>,
        summary: &mut AnalysisSummary,
    ) -> Result<Vec<Artifact>> {
        let analysis = self.config.analysis_options();
        let chart_options = self.config.chart_options();
        let figure = Figure::chart(&chart_options)?;

        let averages = regional_averages(records);
        let extreme = regional_extreme(&averages, analysis.extreme).cloned();
        let bar = bar_chart(&averages, extreme.as_ref(), analysis.extreme, &figure)?;

        let regions = if analysis.regions.is_empty() {
            default_regions(records, analysis.region_count)
        } else {
            analysis.regions.clone()
        };
        let seasonal = seasonal_trends(records, &regions);
        let seasonal_svg = seasonal_chart(&seasonal, &figure)?;

        let years = available_years(records, &analysis.cities);
        let selected_year = match analysis.year {
            Some(year) if !years.contains(&year) => {
                tracing::warn!("No data for {} in the selected cities", year);
                Some(year)
            }
            Some(year) => Some(year),
            None => years.first().copied(),
        };
        let trends = match selected_year {
            Some(year) => city_trends(records, &analysis.cities, year),
            None => Vec::new(),
        };
        let trend_svg = city_trend_chart(&trends, selected_year, &figure)?;

        let countries = country_averages(records);
        let hottest = hottest_country(&countries).cloned();
        let heatmap_svg = heatmap(
            &countries,
            hottest.as_ref(),
            world,
            &Figure::heatmap(&chart_options)?,
        )?;

        summary.regional_averages = averages;
        summary.extremum = analysis.extreme;
        summary.extreme_region = extreme;
        summary.seasonal = seasonal;
        summary.selected_year = selected_year;
        summary.city_peaks = trends
            .iter()
            .map(|t| CityPeak {
                city: t.city.clone(),
                date: t.peak.date,
                avg_temperature: t.peak.avg_temperature,
            })
            .collect();
        summary.country_count = countries.len();
        summary.hottest_country = hottest;

        let artifacts = vec![
            Artifact::new(BAR_CHART_FILE, SVG, bar.into_bytes()),
            Artifact::new(SEASONAL_CHART_FILE, SVG, seasonal_svg.into_bytes()),
            Artifact::new(CITY_TREND_CHART_FILE, SVG, trend_svg.into_bytes()),
            Artifact::new(HEATMAP_FILE, SVG, heatmap_svg.into_bytes()),
        ];
        summary.charts = artifacts.iter().map(|a| a.file_name.clone()).collect();

        Ok(artifacts)
    }

    fn output_file(&self, file_name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), file_name)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FluxPipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedData> {
        let input = self.config.input();
        tracing::debug!("Reading temperature data from {}", input);
        let bytes = self.read_source(input).await?;
        let records = parse_temperature_csv(&bytes)?;

        let city_lookup = self.load_city_lookup().await?;
        let world = self.load_world_geometry().await;

        Ok(ExtractedData {
            records,
            city_lookup,
            world,
        })
    }

    async fn transform(&self, data: ExtractedData) -> Result<TransformResult> {
        let rows_read = data.records.len();
        let records = preprocess(data.records, &data.city_lookup, &self.config.clean_options())?;
        if records.is_empty() {
            return Err(FluxError::processing(
                "no temperature records left to analyse after cleaning",
            ));
        }

        let mut summary = AnalysisSummary {
            rows_read,
            rows_kept: records.len(),
            rows_dropped: rows_read - records.len(),
            first_year: records.iter().map(|r| r.year).min(),
            last_year: records.iter().map(|r| r.year).max(),
            ..AnalysisSummary::default()
        };
        tracing::debug!(
            "Kept {} of {} rows ({} dropped)",
            summary.rows_kept,
            summary.rows_read,
            summary.rows_dropped
        );

        let mut artifacts = self.render_charts(&records, data.world.as_ref(), &mut summary)?;

        artifacts.push(Artifact::new(
            CLEANED_DATA_FILE,
            "text/csv",
            write_cleaned_csv(&records)?,
        ));
        artifacts.push(Artifact::new(
            SUMMARY_FILE,
            "application/json",
            serde_json::to_vec_pretty(&summary)?,
        ));
        artifacts.push(Artifact::new(
            REPORT_FILE,
            "text/markdown",
            render_report(&self.config.report_metadata(), &summary).into_bytes(),
        ));

        Ok(TransformResult {
            records,
            summary,
            artifacts,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        for artifact in &result.artifacts {
            let path = self.output_file(&artifact.file_name);
            tracing::debug!(
                "Writing {} ({}, {} bytes)",
                path,
                artifact.media_type,
                artifact.data.len()
            );
            self.storage.write_file(&path, &artifact.data).await?;
        }

        let Some(bundle_name) = self.config.bundle_name() else {
            return Ok(self.config.output_path().to_string());
        };

        tracing::debug!("Creating ZIP file with {} files", result.artifacts.len());
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for artifact in &result.artifacts {
                zip.start_file(artifact.file_name.as_str(), SimpleFileOptions::default())?;
                zip.write_all(&artifact.data)?;
            }
            zip.finish()?.into_inner()
        };

        let bundle_path = self.output_file(bundle_name);
        tracing::debug!("Writing ZIP file ({} bytes) to {}", zip_data.len(), bundle_path);
        self.storage.write_file(&bundle_path, &zip_data).await?;

        Ok(bundle_path)
    }
}
