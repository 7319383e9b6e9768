use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    #[cfg_attr(not(feature = "cli"), allow(dead_code))]
    monitor_enabled: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor_enabled: false,
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor_enabled,
        }
    }

    pub async fn run(&self) -> Result<String> {
        #[cfg(feature = "cli")]
        let monitor = SystemMonitor::new(self.monitor_enabled);

        tracing::info!("Reading source documents...");
        let docs = self.pipeline.extract().await?;
        tracing::info!("Read {} document(s)", docs.len());

        tracing::info!("Extracting and consolidating records...");
        let result = self.pipeline.transform(docs).await?;

        let rejected = result.outcomes.iter().filter(|o| !o.report.valid).count();
        tracing::info!(
            "Consolidated {} record(s); {} document(s) with validation errors",
            result.consolidated.len(),
            rejected
        );

        tracing::info!("Writing receipt artifacts...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);

        #[cfg(feature = "cli")]
        monitor.log_summary();

        Ok(output_path)
    }
}
