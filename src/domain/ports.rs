use crate::domain::model::{
    AnalysisOptions, ChartOptions, CleanOptions, ExtractedData, ReportMetadata, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// 溫度 CSV：本機路徑或 http(s) URL
    fn input(&self) -> &str;
    fn city_lookup(&self) -> Option<&str>;
    fn world_geometry(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn strict_lookup(&self) -> bool;
    fn request_timeout(&self) -> Duration;
    fn bundle_name(&self) -> Option<&str>;
    fn clean_options(&self) -> CleanOptions;
    fn analysis_options(&self) -> AnalysisOptions;
    fn chart_options(&self) -> ChartOptions;
    fn report_metadata(&self) -> ReportMetadata;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedData>;
    async fn transform(&self, data: ExtractedData) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
