use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives the three pipeline phases and reports progress. Phase failures
/// reaching this level are already whole-run failures; per-listing and
/// per-neighborhood errors were absorbed further down.
pub struct IndexEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> IndexEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Crawling listings...");
        let raw = self.pipeline.extract().await?;
        tracing::info!("Crawled {} raw listings", raw.len());
        self.monitor.log_phase("Extract");

        tracing::info!("Cleaning and aggregating...");
        let result = self.pipeline.transform(raw).await?;
        tracing::info!(
            "Kept {} cleaned listings, {} index rows",
            result.cleaned.len(),
            result.indices.len()
        );
        self.monitor.log_phase("Transform");

        tracing::info!("Persisting artifacts...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Historical index updated at: {}", output_path);
        self.monitor.log_final();

        Ok(output_path)
    }
}
