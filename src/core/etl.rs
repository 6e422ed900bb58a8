use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::ProcessMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: ProcessMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: ProcessMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting disclosure ETL");
        if self.monitor.is_enabled() {
            self.monitor.log_stats("Start");
        }

        tracing::info!("📥 Extracting disclosures...");
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} filings ({} listed corporations, {} skipped)",
            extracted.filings.len(),
            extracted.listed.len(),
            extracted.skipped.len()
        );
        self.monitor.log_stats("Extract");

        tracing::info!("🔧 Building executive and summary tables...");
        let transformed = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "🔧 Built {} executive rows and {} summary rows",
            transformed.executives.len(),
            transformed.summaries.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("💾 Loading tables...");
        let output_path = self.pipeline.load(transformed).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
