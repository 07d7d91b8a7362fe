use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 依序執行 extract、transform 與 load，回傳輸出位置
    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting ETL process");

        tracing::info!("📥 Extracting data...");
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} records, {} city mappings, geometry: {}",
            extracted.records.len(),
            extracted.city_lookup.len(),
            extracted.world.as_ref().map_or(0, |w| w.countries.len())
        );
        self.monitor.log_stats("Extract");

        tracing::info!("🔄 Transforming data...");
        let transformed = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "Transformed {} records into {} artifacts",
            transformed.records.len(),
            transformed.artifacts.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("💾 Loading data...");
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }

    /// 只做 extract 與 transform，回傳各產出檔名與大小
    pub async fn dry_run(&self) -> Result<Vec<(String, usize)>> {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");

        let extracted = self.pipeline.extract().await?;
        tracing::info!("Would process {} records", extracted.records.len());

        let transformed = self.pipeline.transform(extracted).await?;
        self.monitor.log_final_stats();

        Ok(transformed
            .artifacts
            .into_iter()
            .map(|a| {
                tracing::info!("Would write {} ({} bytes)", a.file_name, a.data.len());
                (a.file_name, a.data.len())
            })
            .collect())
    }
}
